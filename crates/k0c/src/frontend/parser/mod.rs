//! k0 parser

mod parser;

pub use parser::Parser;
