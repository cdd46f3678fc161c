//! k0 lexer

mod scanner;
mod template;
mod token;

pub use scanner::Lexer;
pub use template::{RawFragment, has_template, split_template, unescape_char};
pub use token::{Token, TokenKind};
