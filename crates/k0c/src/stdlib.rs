//! Built-in symbol signatures
//!
//! The frontend treats the standard library as a set of pre-resolved global
//! functions: it checks calls against these signatures but never looks behind
//! them. Dotted names resolve through call paths (`java.lang.Math.abs(n)`),
//! plain names through the ordinary function namespace.

use crate::types::{FnSignature, Type};

/// The default k0 standard-library surface
pub fn default_signatures() -> Vec<FnSignature> {
    vec![
        // Console I/O
        FnSignature::new("println", vec![Type::Any], Type::Unit),
        FnSignature::new("print", vec![Type::Any], Type::Unit),
        FnSignature::new("readLine", vec![], Type::nullable(Type::String)),
        // Math; integer arguments reach these through numeric widening
        FnSignature::new("java.lang.Math.abs", vec![Type::Double], Type::Double),
        FnSignature::new(
            "java.lang.Math.max",
            vec![Type::Double, Type::Double],
            Type::Double,
        ),
        FnSignature::new(
            "java.lang.Math.min",
            vec![Type::Double, Type::Double],
            Type::Double,
        ),
        FnSignature::new(
            "java.lang.Math.pow",
            vec![Type::Double, Type::Double],
            Type::Double,
        ),
        FnSignature::new("java.lang.Math.sqrt", vec![Type::Double], Type::Double),
        FnSignature::new("java.lang.Math.sin", vec![Type::Double], Type::Double),
        FnSignature::new("java.lang.Math.cos", vec![Type::Double], Type::Double),
        FnSignature::new("java.lang.Math.tan", vec![Type::Double], Type::Double),
        // Random
        FnSignature::new("java.util.Random.nextInt", vec![], Type::Int),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let signatures = default_signatures();
        for (i, sig) in signatures.iter().enumerate() {
            assert!(
                !signatures[i + 1..].iter().any(|s| s.name == sig.name),
                "duplicate signature '{}'",
                sig.name
            );
        }
    }

    #[test]
    fn test_console_signatures() {
        let signatures = default_signatures();
        let println = signatures.iter().find(|s| s.name == "println").unwrap();
        assert_eq!(println.params, vec![Type::Any]);
        assert_eq!(println.ret, Type::Unit);

        let read_line = signatures.iter().find(|s| s.name == "readLine").unwrap();
        assert!(read_line.params.is_empty());
        assert_eq!(read_line.ret, Type::nullable(Type::String));
    }
}
