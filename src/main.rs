use std::{cell::Cell, rc::Rc};

use colored::Colorize;
use miette::{IntoDiagnostic, Report, Result};
use rustyline::error::ReadlineError;

use ink_rs::{CommandLineInput, InkParser, ParseDiagnostic};

fn main() -> Result<()> {
    let mut args: Vec<_> = std::env::args().skip(1).collect();
    let print_tree = consume_arg(&mut args, |arg| (arg == "--tree").then_some(true)).unwrap_or(false);
    let file = consume_arg(&mut args, |arg| {
        if arg.starts_with("--") {
            None
        } else {
            Some(arg.to_string())
        }
    });
    if !args.is_empty() {
        eprintln!("Unrecognized arguments: {:?}", args);
        eprintln!("Usage: ink-rs [--tree] [file]");
        std::process::exit(1);
    }
    if let Some(file) = file {
        run_file(file, print_tree)?;
    } else {
        run_prompt()?;
    }

    Ok(())
}

fn consume_arg<T, F: Fn(&str) -> Option<T>>(args: &mut Vec<String>, predicate: F) -> Option<T> {
    let found = args
        .iter()
        .enumerate()
        .filter_map(|(idx, arg)| predicate(arg).map(|val| (idx, val)))
        .next();

    if let Some((idx, val)) = found {
        args.remove(idx);
        Some(val)
    } else {
        None
    }
}

#[derive(Default)]
struct Counts {
    errors: Cell<usize>,
    warnings: Cell<usize>,
}

fn reporting_parser(file_name: &str, source: &str, counts: Rc<Counts>) -> InkParser {
    InkParser::with_name(file_name, source).with_error_handler(move |diagnostic: ParseDiagnostic| {
        let count = if diagnostic.is_warning {
            &counts.warnings
        } else {
            &counts.errors
        };
        count.set(count.get() + 1);
        println!("{:?}", Report::new(diagnostic));
    })
}

fn run_file(file_name: String, print_tree: bool) -> Result<()> {
    let path = std::fs::canonicalize(file_name).into_diagnostic()?;
    let source = std::fs::read_to_string(&path).into_diagnostic()?;

    let counts = Rc::new(Counts::default());
    let mut parser = reporting_parser(&path.to_string_lossy(), &source, counts.clone());
    let story = parser.parse_story();

    if print_tree {
        if let Some(story) = &story {
            println!("{}", story);
        }
    }

    let summary = format!(
        "{} error(s), {} warning(s)",
        counts.errors.get(),
        counts.warnings.get()
    );
    if parser.had_error() || story.is_none() {
        eprintln!("{}", summary.red());
        std::process::exit(70);
    }
    eprintln!("{}", summary.green());

    Ok(())
}

fn run_prompt() -> Result<()> {
    let mut rl = rustyline::Editor::<()>::new();
    let mut repl_line: usize = 1;
    loop {
        match rl.readline(&format!("{}> ", repl_line)) {
            Ok(line) => {
                let counts = Rc::new(Counts::default());
                let mut parser =
                    reporting_parser(&format!("<repl-{}>", repl_line), &line, counts);
                match parser.parse_command_line_input() {
                    Some(CommandLineInput::Exit) => return Ok(()),
                    Some(CommandLineInput::Help) => print_help(),
                    Some(input) => println!("==> {}", input),
                    None if !parser.had_error() => println!("{}", "Unrecognised input".red()),
                    None => {}
                }
            }
            Err(ReadlineError::Interrupted) => return Ok(()),
            Err(ReadlineError::Eof) => return Ok(()),
            Err(err) => return Err(err).into_diagnostic(),
        }
        repl_line += 1;
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  <number>            pick a choice");
    println!("  -> target           divert");
    println!("  x = 5, temp y = 2   assign a variable");
    println!("  <expression>        evaluate an expression");
    println!("  DebugSource(n)      look up the source at character offset n");
    println!("  DebugPath path      look up content by runtime path");
    println!("  help, exit, quit");
}
