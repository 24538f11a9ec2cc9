use regex::Regex;

use unitlang::analyzer;
use unitlang::error_formatting::format_error;
use unitlang::input::Input;
use unitlang::scanner::{self, LexerConfig};
use unitlang::{check_source, parse_source, run_source, Error};

fn run(source: &str) -> Vec<String> {
    run_source(source, LexerConfig::default(), false)
        .unwrap_or_else(|err| panic!("program failed: {}", err))
}

#[test]
fn surface_gravity_matches_reference_value() {
    let output = run(include_str!("programs/gravity.ul"));
    assert_eq!(output, vec!["9.791001719715803"]);
}

#[test]
fn earth_sun_force() {
    let output = run(include_str!("programs/force.ul"));
    assert_eq!(output, vec!["35590393248673648000000"]);
}

#[test]
fn named_and_expanded_units_are_interchangeable() {
    let output = run(include_str!("programs/equivalence.ul"));
    assert_eq!(output, vec!["36", "at least thirty joules"]);
}

#[test]
fn top_level_code_then_main() {
    let output = run(include_str!("programs/countdown.ul"));
    assert_eq!(output, vec!["launch sequence", "3", "2", "1", "liftoff"]);
}

#[test]
fn two_runs_are_independent() {
    let source = include_str!("programs/countdown.ul");
    let first = run(source);
    let second = run(source);
    assert_eq!(first, second);
}

#[test]
fn type_mismatch_is_reported_with_position() {
    let source = include_str!("programs/mismatch.ul");
    let err = run_source(source, LexerConfig::default(), false).unwrap_err();
    assert!(matches!(
        err,
        Error::Semantic(analyzer::Error::TypeMismatch { .. })
    ));

    let formatted = format_error(&err, &Input::literal(source));
    assert_eq!(
        formatted,
        "<input>:4:27: semantic error: expected type [m*s^-1] but found [m]"
    );
}

#[test]
fn diagnostics_have_a_stable_shape() {
    let shape = Regex::new(r"^<input>:\d+:\d+: (lexical|syntax|semantic) error: .+$").unwrap();
    let broken = [
        include_str!("programs/unterminated.ul"),
        include_str!("programs/mismatch.ul"),
        "main() -> void { let x: [] = 1; }",
        "let total: [kg] = 1 [kg] + 1 [s]",
        "unit N: [kg*m*s^-2]\nunit N: [kg]",
    ];
    for source in broken {
        let err = check_source(source, LexerConfig::default()).unwrap_err();
        let formatted = format_error(&err, &Input::literal(source));
        assert!(shape.is_match(&formatted), "{}", formatted);
    }
}

#[test]
fn unterminated_text_is_lexical() {
    let err = parse_source(
        include_str!("programs/unterminated.ul"),
        LexerConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Lexical(scanner::Error::TextEndingQuoteNotFound { .. })
    ));
}

#[test]
fn lexer_limits_come_from_config() {
    let config = LexerConfig {
        max_identifier_length: 4,
        ..LexerConfig::default()
    };
    let err = parse_source("let speed: [] = 1", config).unwrap_err();
    assert!(matches!(
        err,
        Error::Lexical(scanner::Error::IdentifierExceededLength { .. })
    ));
}

#[test]
fn runtime_errors_surface_through_the_pipeline() {
    let err = run_source("print(10 / (2 - 2))", LexerConfig::default(), false).unwrap_err();
    assert_eq!(err.stage(), "runtime");
    assert_eq!(err.to_string(), "division by zero");
}

#[test]
fn declarations_are_collected_by_name() {
    let program = parse_source(include_str!("programs/equivalence.ul"), LexerConfig::default())
        .unwrap();
    assert!(program.functions.contains_key("work"));
    assert!(program.units.contains_key("J"));
    analyzer::analyze(&program).unwrap();
}
