//! k0 lexer implementation using logos

use super::token::{Token, TokenKind};
use crate::common::{CompileError, CompileResult, Diagnostic, Span};
use logos::Logos;

/// Lexer for k0 source code.
///
/// Malformed input never stops the stream: unterminated literals and stray
/// characters are recorded as [`Diagnostic`]s and scanning continues, so the
/// parser can still localize later errors in the same pass.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, TokenKind>,
    /// Buffer for peeked tokens (supports 2-token lookahead)
    peeked: Vec<Token>,
    at_eof: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            peeked: Vec::new(),
            at_eof: false,
            diagnostics: Vec::new(),
        }
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Token {
        if !self.peeked.is_empty() {
            return self.peeked.remove(0);
        }
        self.scan_token()
    }

    /// Scan a new token from source, skipping past lexical errors
    fn scan_token(&mut self) -> Token {
        loop {
            if self.at_eof {
                let len = self.inner.source().len();
                return Token::new(TokenKind::Eof, Span::new(len, len));
            }

            match self.inner.next() {
                Some(Ok(kind)) => {
                    let span = Span::from(self.inner.span());
                    match kind {
                        // A shebang is a comment only on the first line
                        TokenKind::Shebang if span.start == 0 => {}
                        TokenKind::Shebang => {
                            self.diagnostics.push(Diagnostic::lex(
                                "shebang is only permitted on the first line",
                                span,
                            ));
                        }
                        TokenKind::UnterminatedString => {
                            self.diagnostics
                                .push(Diagnostic::lex("unterminated string literal", span));
                        }
                        TokenKind::UnterminatedChar => {
                            self.diagnostics
                                .push(Diagnostic::lex("unterminated character literal", span));
                        }
                        TokenKind::UnterminatedBlockComment => {
                            self.diagnostics
                                .push(Diagnostic::lex("unterminated block comment", span));
                        }
                        other => return Token::new(other, span),
                    }
                }
                Some(Err(())) => {
                    let span = Span::from(self.inner.span());
                    let slice = self.inner.slice();
                    // An error slice starting with `"""` means the triple-quote
                    // callback found no closing quotes.
                    let message = if slice.starts_with("\"\"\"") {
                        "unterminated raw string literal".to_string()
                    } else {
                        format!("unrecognized character '{slice}'")
                    };
                    self.diagnostics.push(Diagnostic::lex(message, span));
                }
                None => {
                    self.at_eof = true;
                    let len = self.inner.source().len();
                    return Token::new(TokenKind::Eof, Span::new(len, len));
                }
            }
        }
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> &Token {
        if self.peeked.is_empty() {
            let token = self.scan_token();
            self.peeked.push(token);
        }
        &self.peeked[0]
    }

    /// Peek at the token at offset (0 = next, 1 = after next, etc.)
    pub fn peek_at(&mut self, offset: usize) -> &Token {
        while self.peeked.len() <= offset {
            let token = self.scan_token();
            self.peeked.push(token);
        }
        &self.peeked[offset]
    }

    /// Check if the next token matches the expected kind
    pub fn check(&mut self, expected: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(expected)
    }

    /// Check the token after the next one (2-token lookahead)
    pub fn check_lookahead(&mut self, expected: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek_at(1).kind) == std::mem::discriminant(expected)
    }

    /// Consume the next token if it matches, return true if consumed
    pub fn match_token(&mut self, expected: &TokenKind) -> bool {
        if self.check(expected) {
            self.next_token();
            true
        } else {
            false
        }
    }

    /// Expect a specific token kind, error if not found
    pub fn expect(&mut self, expected: TokenKind) -> CompileResult<Token> {
        let token = self.next_token();
        if std::mem::discriminant(&token.kind) == std::mem::discriminant(&expected) {
            Ok(token)
        } else {
            Err(CompileError::parser(
                format!("expected {}, found {}", expected, token.kind),
                token.span,
            ))
        }
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize_all(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.diagnostics)
    }

    /// Lexical errors collected so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Hand the collected lexical errors to the caller
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Get the source being lexed
    pub fn source(&self) -> &'a str {
        self.inner.source()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diags) = Lexer::new(source).tokenize_all();
        assert!(diags.is_empty(), "unexpected diagnostics: {diags:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords() {
        let source = "fun val var const if else while do for in when is sealed class";
        let mut lexer = Lexer::new(source);

        assert!(matches!(lexer.next_token().kind, TokenKind::Fun));
        assert!(matches!(lexer.next_token().kind, TokenKind::Val));
        assert!(matches!(lexer.next_token().kind, TokenKind::Var));
        assert!(matches!(lexer.next_token().kind, TokenKind::Const));
        assert!(matches!(lexer.next_token().kind, TokenKind::If));
        assert!(matches!(lexer.next_token().kind, TokenKind::Else));
        assert!(matches!(lexer.next_token().kind, TokenKind::While));
        assert!(matches!(lexer.next_token().kind, TokenKind::Do));
        assert!(matches!(lexer.next_token().kind, TokenKind::For));
        assert!(matches!(lexer.next_token().kind, TokenKind::In));
        assert!(matches!(lexer.next_token().kind, TokenKind::When));
        assert!(matches!(lexer.next_token().kind, TokenKind::Is));
        assert!(matches!(lexer.next_token().kind, TokenKind::Sealed));
        assert!(matches!(lexer.next_token().kind, TokenKind::Class));
    }

    #[test]
    fn test_identifiers_not_keywords() {
        let source = "value variable classic whenever";
        for kind in kinds(source) {
            if matches!(kind, TokenKind::Eof) {
                continue;
            }
            assert!(matches!(kind, TokenKind::Identifier(_)), "got {kind:?}");
        }
    }

    #[test]
    fn test_number_literals() {
        let mut lexer = Lexer::new("42 10.10 2.5f 10000000000");

        assert!(matches!(lexer.next_token().kind, TokenKind::IntLiteral(s) if s == "42"));
        assert!(matches!(lexer.next_token().kind, TokenKind::FloatLiteral(s) if s == "10.10"));
        assert!(matches!(lexer.next_token().kind, TokenKind::FloatLiteral(s) if s == "2.5f"));
        assert!(matches!(lexer.next_token().kind, TokenKind::IntLiteral(s) if s == "10000000000"));
    }

    #[test]
    fn test_greedy_operators() {
        let mut lexer = Lexer::new("=== == != <= >= && || ++ -- += -= ..< .. ?: ?. ->");

        assert!(matches!(lexer.next_token().kind, TokenKind::EqEqEq));
        assert!(matches!(lexer.next_token().kind, TokenKind::EqEq));
        assert!(matches!(lexer.next_token().kind, TokenKind::NotEq));
        assert!(matches!(lexer.next_token().kind, TokenKind::LtEq));
        assert!(matches!(lexer.next_token().kind, TokenKind::GtEq));
        assert!(matches!(lexer.next_token().kind, TokenKind::AmpAmp));
        assert!(matches!(lexer.next_token().kind, TokenKind::PipePipe));
        assert!(matches!(lexer.next_token().kind, TokenKind::PlusPlus));
        assert!(matches!(lexer.next_token().kind, TokenKind::MinusMinus));
        assert!(matches!(lexer.next_token().kind, TokenKind::PlusEq));
        assert!(matches!(lexer.next_token().kind, TokenKind::MinusEq));
        assert!(matches!(lexer.next_token().kind, TokenKind::DotDotLt));
        assert!(matches!(lexer.next_token().kind, TokenKind::DotDot));
        assert!(matches!(lexer.next_token().kind, TokenKind::Elvis));
        assert!(matches!(lexer.next_token().kind, TokenKind::QuestionDot));
        assert!(matches!(lexer.next_token().kind, TokenKind::Arrow));
    }

    #[test]
    fn test_range_in_for() {
        let kinds = kinds("for (i in 1..5)");
        assert!(matches!(kinds[0], TokenKind::For));
        assert!(matches!(kinds[3], TokenKind::In));
        assert!(matches!(kinds[4], TokenKind::IntLiteral(_)));
        assert!(matches!(kinds[5], TokenKind::DotDot));
        assert!(matches!(kinds[6], TokenKind::IntLiteral(_)));
    }

    #[test]
    fn test_string_literals() {
        let mut lexer = Lexer::new(r#""wow" "Sum: $c" '1' '\n'"#);

        assert!(matches!(lexer.next_token().kind, TokenKind::StringLiteral(s) if s == "\"wow\""));
        assert!(
            matches!(lexer.next_token().kind, TokenKind::StringLiteral(s) if s == "\"Sum: $c\"")
        );
        assert!(matches!(lexer.next_token().kind, TokenKind::CharLiteral(s) if s == "'1'"));
        assert!(matches!(lexer.next_token().kind, TokenKind::CharLiteral(s) if s == "'\\n'"));
    }

    #[test]
    fn test_triple_quoted_string() {
        let source = "\"\"\"\n    string\n    \"\"\"";
        let mut lexer = Lexer::new(source);

        let token = lexer.next_token();
        assert!(matches!(&token.kind, TokenKind::TripleStringLiteral(s) if s == source));
        assert!(matches!(lexer.next_token().kind, TokenKind::Eof));
        assert!(lexer.diagnostics().is_empty());
    }

    #[test]
    fn test_comments_skipped() {
        let kinds = kinds("val // line comment\nx /* block\n comment */ = 1");
        assert!(matches!(kinds[0], TokenKind::Val));
        assert!(matches!(&kinds[1], TokenKind::Identifier(s) if s == "x"));
        assert!(matches!(kinds[2], TokenKind::Eq));
        assert!(matches!(kinds[3], TokenKind::IntLiteral(_)));
    }

    #[test]
    fn test_shebang_first_line_only() {
        let (tokens, diags) = Lexer::new("#!/usr/bin/env kotlin\nfun").tokenize_all();
        assert!(diags.is_empty());
        assert!(matches!(tokens[0].kind, TokenKind::Fun));

        let (_, diags) = Lexer::new("fun\n#!/usr/bin/env kotlin").tokenize_all();
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_unterminated_string_recovers() {
        let (tokens, diags) = Lexer::new("val s = \"oops\nval t = 2").tokenize_all();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unterminated string"));
        // Lexing continued on the next line
        assert!(tokens.iter().any(|t| matches!(t.kind, TokenKind::Val)));
        assert!(
            tokens
                .iter()
                .any(|t| matches!(&t.kind, TokenKind::IntLiteral(s) if s == "2"))
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (_, diags) = Lexer::new("val x = 1 /* never closed").tokenize_all();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("unterminated block comment"));
    }

    #[test]
    fn test_unrecognized_character() {
        let (tokens, diags) = Lexer::new("val x = 1 @ 2").tokenize_all();
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains('@'));
        // The stream continued past the bad character
        assert!(
            tokens
                .iter()
                .any(|t| matches!(&t.kind, TokenKind::IntLiteral(s) if s == "2"))
        );
    }

    #[test]
    fn test_lexeme_round_trip() {
        // Token lexemes, joined in order, reproduce the source modulo whitespace
        let source = "val x : Int = 10 + 2 * 3";
        let (tokens, diags) = Lexer::new(source).tokenize_all();
        assert!(diags.is_empty());
        let rebuilt: Vec<String> = tokens
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Eof))
            .map(|t| t.kind.to_string())
            .collect();
        assert_eq!(rebuilt.join(" "), source);
    }

    #[test]
    fn test_spans_index_source() {
        let source = "val answer = 42";
        let (tokens, _) = Lexer::new(source).tokenize_all();
        for token in &tokens {
            if let TokenKind::Identifier(name) = &token.kind {
                assert_eq!(&source[token.span.start..token.span.end], name);
            }
        }
    }
}
