//! Integration tests for parsing the Routix documents under `tests/fixtures`.
//!
//! Each fixture has its own test that MUST pass: it parses, has no semantic
//! errors, and survives a serialize/parse round trip unchanged.

use pretty_assertions::assert_eq;
use routix_parser::{parse, serialize, tokenize, validate_program, Severity, TokenKind};

/// Helper macro to generate a test for each fixture file.
macro_rules! fixture_test {
    ($test_name:ident, $path:expr) => {
        #[test]
        fn $test_name() {
            let source = include_str!($path);
            let program = match parse(source) {
                Ok(program) => program,
                Err(err) => panic!("Failed to parse {}: {}", $path, err),
            };

            let errors: Vec<_> = validate_program(&program)
                .into_iter()
                .filter(|d| d.severity == Severity::Error)
                .collect();
            assert!(errors.is_empty(), "Semantic errors in {}: {:?}", $path, errors);

            let text = serialize(&program);
            let reparsed = parse(&text).unwrap();
            assert_eq!(reparsed, program);
            assert_eq!(serialize(&reparsed), text);
        }
    };
}

fixture_test!(fixture_triage, "fixtures/triage.rtx");
fixture_test!(fixture_recursion, "fixtures/recursion.rtx");
fixture_test!(fixture_interleaved, "fixtures/interleaved.rtx");

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_triage_structure() {
        let program = parse(include_str!("fixtures/triage.rtx")).unwrap();
        assert_eq!(program.functions().count(), 2);
        let workflow = program.workflow("triage").unwrap();
        assert_eq!(workflow.phases.len(), 2);
        assert_eq!(workflow.phases[0].node.keyword(), "score");
        assert_eq!(workflow.phases[1].node.keyword(), "match");
    }

    #[test]
    fn test_triage_canonical_text() {
        let program = parse(include_str!("fixtures/triage.rtx")).unwrap();
        let text = serialize(&program);
        assert!(text.starts_with("function decay(age) = max(0, 10 - age)\n\nfunction weight"));
        assert!(text.contains("        when case.score >= 50 then assign to escalations\n"));
        assert!(!text.contains('#'));
    }

    #[test]
    fn test_tokenize_fixture() {
        let lexemes = tokenize(include_str!("fixtures/interleaved.rtx")).unwrap();
        assert_eq!(lexemes[0].kind, TokenKind::Keyword);
        assert_eq!((lexemes[0].line, lexemes[0].column), (1, 1));
        assert!(lexemes.iter().all(|l| l.kind != TokenKind::Comment));
        assert_eq!(lexemes.last().map(|l| l.kind), Some(TokenKind::EndOfInput));
    }
}
