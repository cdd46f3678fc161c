//! k0 token definitions using logos

use crate::common::Span;
use logos::{FilterResult, Logos};
use std::fmt;

/// A k0 token with its kind and source location
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Block comments are not part of the skip regexes because an unterminated
/// one must surface as a lexical error rather than swallowing the file.
fn lex_block_comment(lex: &mut logos::Lexer<TokenKind>) -> FilterResult<(), ()> {
    if let Some(end) = lex.remainder().find("*/") {
        lex.bump(end + 2);
        FilterResult::Skip
    } else {
        lex.bump(lex.remainder().len());
        FilterResult::Emit(())
    }
}

/// Triple-quoted raw strings take their contents verbatim, newlines included,
/// until the matching `"""`. Regexes cannot express the closing search, so the
/// opening quotes carry a callback.
fn lex_triple_quoted(lex: &mut logos::Lexer<TokenKind>) -> Option<String> {
    let end = lex.remainder().find("\"\"\"")?;
    lex.bump(end + 3);
    Some(lex.slice().to_string())
}

/// k0 token kinds
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum TokenKind {
    // Keywords - Declarations
    #[token("fun")]
    Fun,
    #[token("val")]
    Val,
    #[token("var")]
    Var,
    #[token("const")]
    Const,
    #[token("class")]
    Class,
    #[token("sealed")]
    Sealed,

    // Keywords - Control Flow
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("when")]
    When,
    #[token("is")]
    Is,
    #[token("return")]
    Return,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,

    // Keywords - Literals
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // Literals
    #[regex(r"[0-9]+", priority = 2, callback = |lex| lex.slice().to_string())]
    IntLiteral(String),
    #[regex(r"[0-9]+\.[0-9]+[fF]?", priority = 3, callback = |lex| lex.slice().to_string())]
    FloatLiteral(String),
    #[regex(r"'([^'\\\n]|\\.)'", callback = |lex| lex.slice().to_string())]
    CharLiteral(String),
    #[regex(r#""([^"\\\n]|\\.)*""#, priority = 3, callback = |lex| lex.slice().to_string())]
    StringLiteral(String),
    #[token("\"\"\"", lex_triple_quoted)]
    TripleStringLiteral(String),

    // Malformed literals, kept as tokens so the stream can continue past them
    #[regex(r#""([^"\\\n]|\\.)*"#, priority = 2)]
    UnterminatedString,
    #[regex(r"'([^'\\\n]|\\.)?", priority = 1)]
    UnterminatedChar,
    #[token("/*", lex_block_comment)]
    UnterminatedBlockComment,

    // Shebang: a comment only when it starts the file; the scanner decides
    #[regex(r"#![^\n]*")]
    Shebang,

    // Identifiers
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", priority = 1, callback = |lex| lex.slice().to_string())]
    Identifier(String),

    // Multi-character operators (longest match first)
    #[token("===")]
    EqEqEq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("..<")]
    DotDotLt,
    #[token("..")]
    DotDot,
    #[token("?:")]
    Elvis,
    #[token("?.")]
    QuestionDot,
    #[token("->")]
    Arrow,

    // Single-character operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("=")]
    Eq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,

    // Delimiters
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,

    // Punctuation
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,

    // Special
    Eof,
}

impl TokenKind {
    /// Whether this token can begin a statement. Used by the parser's
    /// synchronization when recovering from a syntax error.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Fun
                | TokenKind::Val
                | TokenKind::Var
                | TokenKind::Const
                | TokenKind::Class
                | TokenKind::Sealed
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::When
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Fun => write!(f, "fun"),
            TokenKind::Val => write!(f, "val"),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Const => write!(f, "const"),
            TokenKind::Class => write!(f, "class"),
            TokenKind::Sealed => write!(f, "sealed"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::While => write!(f, "while"),
            TokenKind::Do => write!(f, "do"),
            TokenKind::For => write!(f, "for"),
            TokenKind::In => write!(f, "in"),
            TokenKind::When => write!(f, "when"),
            TokenKind::Is => write!(f, "is"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Break => write!(f, "break"),
            TokenKind::Continue => write!(f, "continue"),
            TokenKind::True => write!(f, "true"),
            TokenKind::False => write!(f, "false"),
            TokenKind::Null => write!(f, "null"),

            TokenKind::IntLiteral(s)
            | TokenKind::FloatLiteral(s)
            | TokenKind::CharLiteral(s)
            | TokenKind::StringLiteral(s)
            | TokenKind::TripleStringLiteral(s)
            | TokenKind::Identifier(s) => write!(f, "{s}"),

            TokenKind::UnterminatedString => write!(f, "unterminated string"),
            TokenKind::UnterminatedChar => write!(f, "unterminated character literal"),
            TokenKind::UnterminatedBlockComment => write!(f, "unterminated block comment"),
            TokenKind::Shebang => write!(f, "#!"),

            TokenKind::EqEqEq => write!(f, "==="),
            TokenKind::EqEq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::AmpAmp => write!(f, "&&"),
            TokenKind::PipePipe => write!(f, "||"),
            TokenKind::PlusPlus => write!(f, "++"),
            TokenKind::MinusMinus => write!(f, "--"),
            TokenKind::PlusEq => write!(f, "+="),
            TokenKind::MinusEq => write!(f, "-="),
            TokenKind::DotDotLt => write!(f, "..<"),
            TokenKind::DotDot => write!(f, ".."),
            TokenKind::Elvis => write!(f, "?:"),
            TokenKind::QuestionDot => write!(f, "?."),
            TokenKind::Arrow => write!(f, "->"),

            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Eq => write!(f, "="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Bang => write!(f, "!"),
            TokenKind::Question => write!(f, "?"),

            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),

            TokenKind::Semi => write!(f, ";"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Dot => write!(f, "."),

            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}
