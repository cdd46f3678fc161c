//! The k0 frontend pipeline
//!
//! Three stages run strictly in sequence per compilation unit:
//! 1. Lexing source text into tokens
//! 2. Parsing tokens into a `Program` AST
//! 3. Semantic analysis, annotating every expression with its resolved type
//!
//! Each stage recovers locally and keeps going, so a single [`check`] call
//! surfaces as many independent diagnostics as the source contains. The core
//! performs no I/O: source comes in as a string, diagnostics go out as values.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod sema;

use crate::common::Diagnostic;
use crate::types::FnSignature;
use ast::Program;
use lexer::{Lexer, Token};
use parser::Parser;
use sema::Analyzer;

/// The result of running the full pipeline over one compilation unit
pub struct Analysis {
    /// The type-annotated AST, usable by a backend when `has_errors` is false
    pub program: Program,
    /// Every finding from all three stages, in emission order
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Lex a source unit into its complete token sequence
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).tokenize_all()
}

/// Parse a source unit without semantic analysis
pub fn parse(source: &str) -> (Program, Vec<Diagnostic>) {
    Parser::new(source).parse_program()
}

/// Run the full pipeline: lex, parse, analyze.
///
/// `builtins` supplies the pre-resolved global signatures of the standard
/// library; [`crate::stdlib::default_signatures`] is the usual choice.
pub fn check(source: &str, builtins: &[FnSignature]) -> Analysis {
    let (mut program, mut diagnostics) = Parser::new(source).parse_program();
    let mut semantic = Analyzer::new(builtins).analyze(&mut program);
    diagnostics.append(&mut semantic);
    Analysis {
        program,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Stage;
    use crate::stdlib::default_signatures;

    fn run(source: &str) -> Analysis {
        check(source, &default_signatures())
    }

    #[test]
    fn test_complete_program_is_clean() {
        let analysis = run(
            "#!/usr/bin/env k0\n\
             const val LIMIT = 100\n\
             \n\
             sealed class Result\n\
             class Success(val value: String) : Result()\n\
             class Failure(val reason: String) : Result()\n\
             \n\
             fun describe(r: Result) {\n\
                 when (r) {\n\
                     is Success -> println(\"ok: ${r.value}\")\n\
                     is Failure -> println(\"failed: ${r.reason}\")\n\
                 }\n\
             }\n\
             \n\
             fun main() {\n\
                 val a = 10\n\
                 val b = 20\n\
                 var c: Int\n\
                 c = a + b\n\
                 println(\"Sum: $c\")\n\
                 var data: Array<Int>(8) { 0 }\n\
                 for (i in 0..<data.size) {\n\
                     data[i] = java.util.Random.nextInt()\n\
                 }\n\
                 var total = 0\n\
                 do { total += data[0]; c-- } while (c > LIMIT)\n\
                 describe(Success(\"done\"))\n\
             }",
        );
        assert!(
            analysis.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            analysis.diagnostics
        );
    }

    #[test]
    fn test_math_builtins_over_double() {
        let analysis = run(
            "fun main() {\n\
                 var a: Double = -4.0\n\
                 var b: Double = 2.0\n\
                 var ab: Double = java.lang.Math.abs(a)\n\
                 var mx: Double = java.lang.Math.max(a, b)\n\
                 var mn: Double = java.lang.Math.min(a, b)\n\
                 var pw: Double = java.lang.Math.pow(a, b)\n\
                 var sn: Double = java.lang.Math.sin(b)\n\
                 var cs: Double = java.lang.Math.cos(b)\n\
                 var tn: Double = java.lang.Math.tan(b)\n\
                 var r: Int = java.util.Random.nextInt()\n\
                 println(ab)\n\
                 println(mx)\n\
                 println(mn)\n\
                 println(pw)\n\
                 println(sn)\n\
                 println(cs)\n\
                 println(tn)\n\
                 println(r)\n\
             }",
        );
        assert!(
            analysis.diagnostics.is_empty(),
            "unexpected diagnostics: {:?}",
            analysis.diagnostics
        );
    }

    #[test]
    fn test_lex_diagnostics_come_first() {
        // A bad character and a syntax error in one unit: the lexical finding
        // is reported ahead of the grammar one.
        let analysis = run("fun main() { val x = 1 @ \n val = 2 }");
        assert!(analysis.has_errors());
        let stages: Vec<Stage> = analysis.diagnostics.iter().map(|d| d.stage).collect();
        let first_syntax = stages.iter().position(|s| *s == Stage::Syntax);
        let last_lex = stages.iter().rposition(|s| *s == Stage::Lex);
        if let (Some(first_syntax), Some(last_lex)) = (first_syntax, last_lex) {
            assert!(last_lex < first_syntax);
        }
    }

    #[test]
    fn test_all_stages_contribute() {
        let analysis = run("fun main() { val s = \"oops\n val = 2\n undeclared() }");
        let has = |stage: Stage| analysis.diagnostics.iter().any(|d| d.stage == stage);
        assert!(has(Stage::Lex));
        assert!(has(Stage::Syntax));
        assert!(has(Stage::Semantic));
    }

    #[test]
    fn test_tokenize_surface() {
        let (tokens, diags) = tokenize("val x = 1");
        assert!(diags.is_empty());
        assert_eq!(tokens.len(), 5); // val x = 1 EOF
    }
}
