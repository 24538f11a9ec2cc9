use std::path::PathBuf;
use std::process;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};

use unitlang::error_formatting;
use unitlang::input::{self, Input};
use unitlang::interpreter::Interpreter;
use unitlang::scanner::{self, LexerConfig};
use unitlang::{analyzer, parse_source, Error};

fn cli() -> Command<'static> {
    Command::new("unitlang")
        .version("0.1.0")
        .about("Runs programs whose numbers carry physical units")
        .arg(
            Arg::new("file")
                .value_name("FILE")
                .help("program to run")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("tokens")
                .long("tokens")
                .help("print the token stream and stop")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("ast")
                .long("ast")
                .help("print the parsed program and stop")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check")
                .long("check")
                .help("stop after unit checking")
                .action(ArgAction::SetTrue),
        )
}

fn flag(matches: &ArgMatches, name: &str) -> bool {
    matches.get_one::<bool>(name).copied().unwrap_or(false)
}

fn fail(err: Error, input: &Input) -> ! {
    error_formatting::print_error(&err, input);
    process::exit(1);
}

fn main() {
    let matches = cli().get_matches();

    let path = match matches.get_one::<PathBuf>("file") {
        Some(path) => path,
        None => unreachable!("clap enforces the required FILE argument"),
    };
    let input = match input::read_file(path) {
        Ok(input) => input,
        Err(err) => {
            println!("could not read '{}': {}", path.display(), err);
            process::exit(1);
        }
    };
    let config = LexerConfig::from_env();

    if flag(&matches, "tokens") {
        match scanner::scan_tokens(&input.content, config) {
            Ok(tokens) => {
                for token in tokens {
                    println!("{}", token);
                }
            }
            Err(err) => fail(err.into(), &input),
        }
        return;
    }

    let program = match parse_source(&input.content, config) {
        Ok(program) => program,
        Err(err) => fail(err, &input),
    };
    if flag(&matches, "ast") {
        print!("{}", program);
        return;
    }

    if let Err(err) = analyzer::analyze(&program) {
        fail(err.into(), &input);
    }
    if flag(&matches, "check") {
        return;
    }

    let mut interpreter = Interpreter::default();
    if let Err(err) = interpreter.run(&program) {
        fail(err.into(), &input);
    }
}
