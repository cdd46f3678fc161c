//! k0 compiler frontend driver
//!
//! Usage: k0c [OPTIONS] <input>

use anyhow::Context;
use clap::Parser as ClapParser;
use k0_frontend::common::DiagnosticReporter;
use k0_frontend::frontend;
use k0_frontend::stdlib;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(ClapParser, Debug)]
#[command(name = "k0c")]
#[command(version)]
#[command(about = "k0 compiler frontend: lex, parse, and type-check a source file", long_about = None)]
struct Args {
    /// Input source file (.k0 or .kt)
    #[arg(required = true)]
    input: PathBuf,

    /// Dump tokens (for debugging)
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST (for debugging)
    #[arg(long)]
    dump_ast: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    match run(&args) {
        Ok(clean) => {
            if !clean {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}

/// Returns Ok(false) when analysis produced error diagnostics
fn run(args: &Args) -> anyhow::Result<bool> {
    let source = fs::read_to_string(&args.input)
        .with_context(|| format!("cannot read {}", args.input.display()))?;
    let filename = args.input.display().to_string();

    let mut reporter = DiagnosticReporter::new();
    let file_id = reporter.add_file(&filename, &source);

    if args.dump_tokens {
        let (tokens, _) = frontend::tokenize(&source);
        eprintln!("=== Tokens ===");
        for token in &tokens {
            eprintln!("{:>5}..{:<5} {:?}", token.span.start, token.span.end, token.kind);
        }
        eprintln!("=== End Tokens ===\n");
    }

    if args.verbose {
        eprintln!("Checking {}", args.input.display());
    }

    let analysis = frontend::check(&source, &stdlib::default_signatures());

    if args.dump_ast {
        eprintln!("=== AST ===");
        eprintln!("{:#?}", analysis.program);
        eprintln!("=== End AST ===\n");
    }

    reporter.report_all(file_id, &analysis.diagnostics);

    let errors = analysis.diagnostics.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        eprintln!(
            "{filename}: {errors} error{} found",
            if errors == 1 { "" } else { "s" }
        );
        return Ok(false);
    }

    if args.verbose {
        eprintln!("{filename}: no errors");
    }
    Ok(true)
}
