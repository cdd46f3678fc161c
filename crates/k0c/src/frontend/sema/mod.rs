//! Semantic analysis: scoping, type checking, mutability, nullability, and
//! sealed-match exhaustiveness

mod analyzer;
mod scope;
mod suggest;
mod types;

pub use analyzer::Analyzer;
pub use scope::{Mutability, ScopeArena, ScopeId, Symbol, SymbolKind};
pub use suggest::did_you_mean;
pub use types::TypeChecker;
