//! CLI tool to parse Routix files and output the structured model as JSON
//!
//! Usage: cargo run --bin routix-parse <file.rtx> [--check]
//!
//! With `--check`, semantic diagnostics are printed as well and the exit
//! code is 1 if any of them is an error.

use routix_parser::{parse, to_model, validate_program, ErrorReporter, Severity};
use std::env;
use std::fs;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file.rtx> [--check]", args[0]);
        eprintln!("  Parses a Routix file and outputs its model as JSON to stdout");
        process::exit(1);
    }

    let filename = &args[1];
    let check = args.iter().skip(2).any(|a| a == "--check");

    let source = match fs::read_to_string(filename) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", filename, e);
            process::exit(1);
        }
    };

    let reporter = ErrorReporter::new(filename, &source);

    let program = match parse(&source) {
        Ok(program) => program,
        Err(err) => {
            if let Err(io) = reporter.report(&err) {
                eprintln!("{}", err);
                eprintln!("(failed to render report: {})", io);
            }
            process::exit(1);
        }
    };

    let mut failed = false;
    if check {
        for diagnostic in validate_program(&program) {
            failed |= diagnostic.severity == Severity::Error;
            if reporter.report_semantic_error(&diagnostic).is_err() {
                eprintln!("{}", diagnostic.message);
            }
        }
    }

    match serde_json::to_string_pretty(&to_model(&program)) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing model to JSON: {}", e);
            process::exit(1);
        }
    }

    if failed {
        process::exit(1);
    }
}
