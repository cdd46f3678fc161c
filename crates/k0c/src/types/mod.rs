//! The k0 type system
//!
//! Types are value-compared by structural equality. `T?` and `T` are distinct
//! types: crossing from nullable to non-null requires a safe call, an elvis
//! default, or a diagnostic.

use std::fmt;

/// A resolved k0 type
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Boolean,
    Char,
    String,
    Unit,
    /// The `Any` top type. Only used by built-in signatures (e.g. `println`);
    /// every type is assignable to it.
    Any,
    /// The type of the `null` literal, assignable to any nullable type
    Null,
    /// `T?`
    Nullable(Box<Type>),
    /// `Array<T>`
    Array(Box<Type>),
    /// Iteration/membership type produced by `..` and `..<`
    Range(Box<Type>),
    /// A user-declared class or sealed hierarchy member, by name
    Class(std::string::String),
    /// Error sentinel substituted after a diagnosed mismatch; compatible with
    /// everything so one mistake does not cascade
    Unknown,
}

impl Type {
    pub fn nullable(inner: Type) -> Type {
        match inner {
            Type::Nullable(_) | Type::Null | Type::Unknown => inner,
            other => Type::Nullable(Box::new(other)),
        }
    }

    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Type::Nullable(_) | Type::Null)
    }

    /// The non-null counterpart of this type (`T?` -> `T`)
    pub fn strip_nullable(&self) -> &Type {
        match self {
            Type::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Widening order: Byte < Short < Int < Long < Float < Double
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            Type::Byte => Some(0),
            Type::Short => Some(1),
            Type::Int => Some(2),
            Type::Long => Some(3),
            Type::Float => Some(4),
            Type::Double => Some(5),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Byte | Type::Short | Type::Int | Type::Long)
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, Type::Float | Type::Double)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Byte => write!(f, "Byte"),
            Type::Short => write!(f, "Short"),
            Type::Int => write!(f, "Int"),
            Type::Long => write!(f, "Long"),
            Type::Float => write!(f, "Float"),
            Type::Double => write!(f, "Double"),
            Type::Boolean => write!(f, "Boolean"),
            Type::Char => write!(f, "Char"),
            Type::String => write!(f, "String"),
            Type::Unit => write!(f, "Unit"),
            Type::Any => write!(f, "Any"),
            Type::Null => write!(f, "Nothing?"),
            Type::Nullable(inner) => write!(f, "{inner}?"),
            Type::Array(element) => write!(f, "Array<{element}>"),
            Type::Range(element) => write!(f, "Range<{element}>"),
            Type::Class(name) => write!(f, "{name}"),
            Type::Unknown => write!(f, "<error>"),
        }
    }
}

/// Signature of a pre-resolved global function.
///
/// The standard-library bridge hands these to the frontend as opaque symbols;
/// the frontend checks calls against them but never looks inside.
#[derive(Debug, Clone, PartialEq)]
pub struct FnSignature {
    pub name: std::string::String,
    pub params: Vec<Type>,
    pub ret: Type,
}

impl FnSignature {
    pub fn new(name: impl Into<std::string::String>, params: Vec<Type>, ret: Type) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        assert_eq!(Type::array(Type::Int), Type::array(Type::Int));
        assert_ne!(Type::Int, Type::nullable(Type::Int));
        assert_ne!(Type::array(Type::Int), Type::array(Type::Double));
    }

    #[test]
    fn test_nullable_is_idempotent() {
        assert_eq!(
            Type::nullable(Type::nullable(Type::String)),
            Type::nullable(Type::String)
        );
    }

    #[test]
    fn test_widening_order() {
        let order = [
            Type::Byte,
            Type::Short,
            Type::Int,
            Type::Long,
            Type::Float,
            Type::Double,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].numeric_rank() < pair[1].numeric_rank());
        }
        assert_eq!(Type::Boolean.numeric_rank(), None);
    }
}
