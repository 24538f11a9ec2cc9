use colored::Colorize;

use crate::input::Input;
use crate::Error;

fn location(err: &Error, input: &Input) -> String {
    match err.position() {
        Some(position) => format!("{}:{}:{}", input.name(), position.row, position.column),
        None => input.name(),
    }
}

/// `file:line:col: <stage> error: <message>`
pub fn format_error(err: &Error, input: &Input) -> String {
    format!(
        "{}: {} error: {}",
        location(err, input),
        err.stage(),
        err
    )
}

pub fn print_error(err: &Error, input: &Input) {
    println!(
        "{}: {} {}",
        location(err, input).dimmed(),
        format!("{} error:", err.stage()).red().bold(),
        err
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer;
    use crate::expr::SourceLocation;
    use crate::interpreter::InterpreterError;
    use crate::input::Source;
    use std::path::PathBuf;

    #[test]
    fn semantic_errors_carry_file_and_position() {
        let err = Error::Semantic(analyzer::Error::VariableUndeclared {
            name: "speed".to_string(),
            location: SourceLocation { line: 4, col: 9 },
        });
        let input = Input {
            source: Source::File(PathBuf::from("motion.ul")),
            content: String::new(),
        };
        assert_eq!(
            format_error(&err, &input),
            "motion.ul:4:9: semantic error: 'speed' is not declared"
        );
    }

    #[test]
    fn positionless_errors_name_only_the_input() {
        let err = Error::Runtime(InterpreterError::MissingReturnValue {
            function: "area".to_string(),
        });
        assert_eq!(
            format_error(&err, &Input::literal("")),
            "<input>: runtime error: 'area' finished without returning a value"
        );
    }
}
