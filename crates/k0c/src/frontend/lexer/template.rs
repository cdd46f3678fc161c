//! String template decomposition
//!
//! The lexer captures a whole string literal as one token; this module splits
//! its raw lexeme into literal text and embedded-expression fragments
//! (`$identifier` and `${expression}`). Each expression fragment carries the
//! byte offset of its source inside the compilation unit so the parser can
//! re-parse it with correct positions.

use crate::common::{Diagnostic, Span};

/// One fragment of a string template, in source order
#[derive(Debug, Clone, PartialEq)]
pub enum RawFragment {
    /// Literal text with escapes already decoded
    Text(String),
    /// Raw expression source to be re-parsed
    Expr { source: String, offset: usize },
}

/// Split the raw lexeme of a string token into template fragments.
///
/// `lexeme` includes the surrounding quotes; `span` is the token span. Escape
/// sequences are decoded in double-quoted strings only, triple-quoted strings
/// take their contents verbatim. Malformed templates (an unclosed `${`) are
/// reported through `diagnostics` and the rest of the string is kept as text.
pub fn split_template(
    lexeme: &str,
    span: Span,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<RawFragment> {
    let (body, quote_len, decode_escapes) = if let Some(inner) = lexeme
        .strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
    {
        (inner, 3, false)
    } else {
        let inner = lexeme
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or(lexeme);
        (inner, 1, true)
    };

    let base = span.start + quote_len;
    let mut fragments = Vec::new();
    let mut text = String::new();
    let mut chars = body.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' if decode_escapes => {
                let escaped = chars.next().map(|(_, e)| e);
                match escaped {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some('"') => text.push('"'),
                    Some('\\') => text.push('\\'),
                    Some('$') => text.push('$'),
                    Some('\'') => text.push('\''),
                    Some('0') => text.push('\0'),
                    Some(other) => {
                        diagnostics.push(Diagnostic::lex(
                            format!("unknown escape sequence '\\{other}'"),
                            Span::new(base + i, base + i + 2),
                        ));
                        text.push(other);
                    }
                    None => {}
                }
            }
            '$' => {
                let next = chars.peek().map(|&(_, c)| c);
                if next == Some('{') {
                    chars.next();
                    let expr_start = i + 2;
                    let mut depth = 1usize;
                    let mut expr_end = None;
                    for (j, c) in chars.by_ref() {
                        match c {
                            '{' => depth += 1,
                            '}' => {
                                depth -= 1;
                                if depth == 0 {
                                    expr_end = Some(j);
                                    break;
                                }
                            }
                            _ => {}
                        }
                    }
                    match expr_end {
                        Some(end) => {
                            flush_text(&mut fragments, &mut text);
                            fragments.push(RawFragment::Expr {
                                source: body[expr_start..end].to_string(),
                                offset: base + expr_start,
                            });
                        }
                        None => {
                            diagnostics.push(Diagnostic::lex(
                                "unterminated '${' in string template",
                                Span::new(base + i, span.end),
                            ));
                            text.push_str(&body[expr_start..]);
                        }
                    }
                } else if next.is_some_and(|c| c.is_ascii_alphabetic() || c == '_') {
                    let expr_start = i + 1;
                    let mut end = body.len();
                    while let Some(&(j, c)) = chars.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            chars.next();
                        } else {
                            end = j;
                            break;
                        }
                    }
                    flush_text(&mut fragments, &mut text);
                    fragments.push(RawFragment::Expr {
                        source: body[expr_start..end].to_string(),
                        offset: base + expr_start,
                    });
                } else {
                    // A lone dollar sign is literal text
                    text.push('$');
                }
            }
            _ => text.push(c),
        }
    }

    flush_text(&mut fragments, &mut text);
    fragments
}

fn flush_text(fragments: &mut Vec<RawFragment>, text: &mut String) {
    if !text.is_empty() {
        fragments.push(RawFragment::Text(std::mem::take(text)));
    }
}

/// Whether a string lexeme contains any template markers at all
pub fn has_template(lexeme: &str) -> bool {
    let mut chars = lexeme.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '$' => {
                if matches!(chars.peek(), Some(&n) if n == '{' || n.is_ascii_alphabetic() || n == '_')
                {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Decode a character literal lexeme (quotes included) into its char value
pub fn unescape_char(lexeme: &str) -> Option<char> {
    let inner = lexeme.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    match chars.next()? {
        '\\' => match chars.next()? {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            '0' => Some('\0'),
            '\'' => Some('\''),
            '"' => Some('"'),
            '\\' => Some('\\'),
            '$' => Some('$'),
            _ => None,
        },
        c if chars.next().is_none() => Some(c),
        _ => None,
    }
}
