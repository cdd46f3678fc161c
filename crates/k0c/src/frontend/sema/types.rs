//! Assignability and operator typing rules
//!
//! The rules here are pure functions over [`Type`]; the analyzer owns all
//! diagnostics and scope state. Numeric widening follows the platform order
//! Byte < Short < Int < Long < Float < Double and never narrows implicitly.

use crate::frontend::ast::{BinOp, UnaryOp};
use crate::types::Type;

pub struct TypeChecker;

impl TypeChecker {
    /// Whether a value of type `from` may be bound to a slot of type `to`
    pub fn is_assignable(to: &Type, from: &Type) -> bool {
        if to.is_unknown() || from.is_unknown() {
            return true;
        }
        if to == from {
            return true;
        }
        match (to, from) {
            // Everything satisfies the top type
            (Type::Any, _) => true,
            // null only fits nullable slots
            (Type::Nullable(_), Type::Null) => true,
            // T flows into T?, and widening applies inside the ?
            (Type::Nullable(inner), from) => Self::is_assignable(inner, from.strip_nullable()),
            // Numeric widening
            (to, from) if to.is_numeric() && from.is_numeric() => {
                from.numeric_rank() <= to.numeric_rank()
            }
            (Type::Array(a), Type::Array(b)) => a == b,
            _ => false,
        }
    }

    /// The wider of two numeric types
    pub fn promote(a: &Type, b: &Type) -> Option<Type> {
        let (ra, rb) = (a.numeric_rank()?, b.numeric_rank()?);
        Some(if ra >= rb { a.clone() } else { b.clone() })
    }

    /// Result type of a binary operation, or a description of why the operand
    /// types do not fit the operator.
    pub fn binary_result(op: BinOp, left: &Type, right: &Type) -> Result<Type, String> {
        if left.is_unknown() || right.is_unknown() {
            return Ok(Type::Unknown);
        }

        match op {
            BinOp::Add if *left == Type::String || *right == Type::String => {
                // String concatenation accepts any operand on either side
                Ok(Type::String)
            }
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
                Self::promote(left, right).ok_or_else(|| {
                    format!("operator '{op}' is not defined for '{left}' and '{right}'")
                })
            }
            BinOp::And | BinOp::Or => {
                if *left == Type::Boolean && *right == Type::Boolean {
                    Ok(Type::Boolean)
                } else {
                    Err(format!(
                        "operator '{op}' requires Boolean operands, found '{left}' and '{right}'"
                    ))
                }
            }
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let comparable = (left.is_numeric() && right.is_numeric())
                    || (*left == Type::Char && *right == Type::Char)
                    || (*left == Type::String && *right == Type::String);
                if comparable {
                    Ok(Type::Boolean)
                } else {
                    Err(format!(
                        "operator '{op}' cannot compare '{left}' and '{right}'"
                    ))
                }
            }
            BinOp::Eq | BinOp::Ne | BinOp::RefEq => {
                let compatible = Self::is_assignable(left, right)
                    || Self::is_assignable(right, left)
                    || (left.is_numeric() && right.is_numeric());
                if compatible {
                    Ok(Type::Boolean)
                } else {
                    Err(format!(
                        "operator '{op}' cannot compare unrelated types '{left}' and '{right}'"
                    ))
                }
            }
        }
    }

    /// Result type of a unary prefix operation
    pub fn unary_result(op: UnaryOp, operand: &Type) -> Result<Type, String> {
        if operand.is_unknown() {
            return Ok(Type::Unknown);
        }
        match op {
            UnaryOp::Neg if operand.is_numeric() => Ok(operand.clone()),
            UnaryOp::Neg => Err(format!("operator '-' is not defined for '{operand}'")),
            UnaryOp::Not if *operand == Type::Boolean => Ok(Type::Boolean),
            UnaryOp::Not => Err(format!("operator '!' requires Boolean, found '{operand}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_widening_assignment() {
        assert!(TypeChecker::is_assignable(&Type::Long, &Type::Int));
        assert!(TypeChecker::is_assignable(&Type::Double, &Type::Float));
        assert!(TypeChecker::is_assignable(&Type::Double, &Type::Byte));
        // Narrowing is never implicit
        assert!(!TypeChecker::is_assignable(&Type::Int, &Type::Long));
        assert!(!TypeChecker::is_assignable(&Type::Float, &Type::Double));
    }

    #[test]
    fn test_nullable_assignment() {
        let nullable_string = Type::nullable(Type::String);
        assert!(TypeChecker::is_assignable(&nullable_string, &Type::String));
        assert!(TypeChecker::is_assignable(&nullable_string, &Type::Null));
        assert!(TypeChecker::is_assignable(
            &nullable_string,
            &nullable_string
        ));
        // T? does not flow into T
        assert!(!TypeChecker::is_assignable(&Type::String, &nullable_string));
        assert!(!TypeChecker::is_assignable(&Type::String, &Type::Null));
    }

    #[test]
    fn test_any_accepts_everything() {
        assert!(TypeChecker::is_assignable(&Type::Any, &Type::Int));
        assert!(TypeChecker::is_assignable(&Type::Any, &Type::String));
        assert!(TypeChecker::is_assignable(
            &Type::Any,
            &Type::nullable(Type::Int)
        ));
    }

    #[test]
    fn test_arrays_are_invariant() {
        assert!(TypeChecker::is_assignable(
            &Type::array(Type::Int),
            &Type::array(Type::Int)
        ));
        assert!(!TypeChecker::is_assignable(
            &Type::array(Type::Long),
            &Type::array(Type::Int)
        ));
    }

    #[test]
    fn test_arithmetic_promotes() {
        assert_eq!(
            TypeChecker::binary_result(BinOp::Add, &Type::Int, &Type::Double),
            Ok(Type::Double)
        );
        // Integer division stays integral
        assert_eq!(
            TypeChecker::binary_result(BinOp::Div, &Type::Int, &Type::Int),
            Ok(Type::Int)
        );
        assert!(TypeChecker::binary_result(BinOp::Sub, &Type::String, &Type::Int).is_err());
    }

    #[test]
    fn test_string_concatenation_either_side() {
        assert_eq!(
            TypeChecker::binary_result(BinOp::Add, &Type::String, &Type::Int),
            Ok(Type::String)
        );
        assert_eq!(
            TypeChecker::binary_result(BinOp::Add, &Type::Boolean, &Type::String),
            Ok(Type::String)
        );
    }

    #[test]
    fn test_logical_requires_boolean() {
        assert_eq!(
            TypeChecker::binary_result(BinOp::And, &Type::Boolean, &Type::Boolean),
            Ok(Type::Boolean)
        );
        assert!(TypeChecker::binary_result(BinOp::Or, &Type::Int, &Type::Boolean).is_err());
    }

    #[test]
    fn test_equality_rejects_unrelated() {
        assert!(TypeChecker::binary_result(BinOp::Eq, &Type::Int, &Type::Double).is_ok());
        assert!(TypeChecker::binary_result(BinOp::Eq, &Type::String, &Type::Int).is_err());
    }

    #[test]
    fn test_unknown_never_cascades() {
        assert!(TypeChecker::is_assignable(&Type::Unknown, &Type::String));
        assert!(TypeChecker::is_assignable(&Type::Int, &Type::Unknown));
        assert_eq!(
            TypeChecker::binary_result(BinOp::Add, &Type::Unknown, &Type::Int),
            Ok(Type::Unknown)
        );
    }
}
