use routix_parser::tokenize;
use std::env;
use std::fs;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file.rtx> [target_line]", args[0]);
        std::process::exit(1);
    }

    let filename = &args[1];
    let source = match fs::read_to_string(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Failed to read '{}': {}", filename, e);
            std::process::exit(1);
        }
    };

    // Get line from arg if provided
    let target_line: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);

    match tokenize(&source) {
        Ok(lexemes) => {
            for lexeme in &lexemes {
                // Print tokens around target line
                if target_line == 0
                    || (lexeme.line >= target_line.saturating_sub(5)
                        && lexeme.line <= target_line + 5)
                {
                    println!(
                        "Line {:4}:{:<3} {:?} {:?}",
                        lexeme.line, lexeme.column, lexeme.kind, lexeme.text
                    );
                }
            }
        }
        Err(e) => {
            eprintln!("Lexer error: {}", e);
            std::process::exit(1);
        }
    }
}
