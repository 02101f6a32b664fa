use std::{
    collections::VecDeque,
    fs,
    path::{Path, PathBuf},
};

use colored::Colorize;
use lazy_static::lazy_static;
use libtest_mimic::{self, run_tests, Arguments, Outcome, Test};
use miette::{IntoDiagnostic, Result};
use regex::Regex;

fn main() {
    let tests = read_all_files("test_fixtures".to_string().into())
        .unwrap()
        .into_iter()
        .filter(|path| path.extension().map_or(false, |ext| ext == "ink"))
        .map(|path| Test {
            name: path.to_string_lossy().into(),
            kind: "fixture".into(),
            is_bench: false,
            is_ignored: false,
            data: path,
        })
        .collect::<Vec<_>>();

    run_tests(&Arguments::from_args(), tests, |test| {
        match run_fixture(&test.data) {
            Ok(outcome) => outcome,
            Err(err) => Outcome::Failed {
                msg: Some(format!("{:?}", err)),
            },
        }
    })
    .exit();
}

lazy_static! {
    static ref EXPECTED_TREE_RE: Regex = Regex::new("// expect: (.*)\n?").unwrap();
    static ref EXPECTED_DIAGNOSTIC_RE: Regex =
        Regex::new("// ((Error|Warning) on line \\d+: .*)\n?").unwrap();
}

/// Parses one `.ink` fixture and compares the tree, one top-level node per
/// line, with its `// expect:` comments, and the diagnostics with its
/// `// Error on line N: ...` comments. The comments themselves are stripped
/// before parsing.
fn run_fixture(path: &Path) -> Result<Outcome> {
    let test_source = fs::read_to_string(path).into_diagnostic()?;

    let expected_tree = EXPECTED_TREE_RE
        .captures_iter(&test_source)
        .map(|captures| format!("{}\n", &captures[1]))
        .collect::<String>();

    let mut expected_diagnostics = EXPECTED_DIAGNOSTIC_RE
        .captures_iter(&test_source)
        .map(|captures| captures[1].to_string())
        .collect::<VecDeque<_>>();

    let (story, diagnostics) = ink_rs::parse(&path.to_string_lossy(), &test_source);

    for diagnostic in diagnostics {
        if let Err(msg) = match_diagnostics(&diagnostic.summary(), &expected_diagnostics.pop_front())
        {
            return Ok(Outcome::Failed { msg: Some(msg) });
        }
    }

    if !expected_diagnostics.is_empty() {
        return Ok(Outcome::Failed {
            msg: Some(format!(
                "Expected diagnostics:\n{}",
                expected_diagnostics
                    .iter()
                    .map(|diagnostic| format!(" - {}\n", diagnostic))
                    .collect::<String>(),
            )),
        });
    }

    let actual_tree = match story {
        Some(story) => story.to_string(),
        None => "<no story>\n".to_string(),
    };

    Ok(compare_outputs(
        expected_tree.split('\n').map(String::from).collect(),
        actual_tree.split('\n').map(String::from).collect(),
    ))
}

fn match_diagnostics(actual: &str, expected: &Option<String>) -> Result<(), String> {
    match expected {
        Some(expected) if expected.trim() == actual.trim() => Ok(()),
        Some(expected) => Err(format!(
            "Diagnostics do not match.\nExpected: {}\n  Actual: {}",
            expected, actual
        )),
        None => Err(format!("Unexpected diagnostic:\n{}", actual)),
    }
}

fn compare_outputs(expected_lines: Vec<String>, actual_lines: Vec<String>) -> Outcome {
    const EXPECTED: &str = "expected";
    const ACTUAL: &str = "actual";
    const NONE: &str = "<None>";

    fn max_len(lines: &[String], label: &str) -> usize {
        lines
            .iter()
            .map(|line| line.len())
            .max()
            .unwrap_or(0)
            .max(label.len())
    }

    let max_expected_len = max_len(&expected_lines, EXPECTED);
    let max_actual_len = max_len(&actual_lines, ACTUAL);

    let mut output_str = format!(
        "   | {:max_expected_len$} | {:max_actual_len$} \n",
        EXPECTED.bold(),
        ACTUAL.bold()
    );
    let line_count = expected_lines.len().max(actual_lines.len());
    let mut unmatched_count = 0usize;
    for i in 0..line_count {
        let expected_line = expected_lines.get(i);
        let actual_line = actual_lines.get(i);

        let is_match = expected_line == actual_line;
        if !is_match {
            unmatched_count += 1;
        }

        let colorify = |string: &str| {
            if is_match {
                string.green()
            } else {
                string.red()
            }
        };

        let result_char = if is_match { "✓" } else { "✗" };
        let result_str = &format!(
            " {} | {:max_expected_len$} | {:max_actual_len$}",
            colorify(result_char),
            expected_line
                .map(|line| colorify(line))
                .unwrap_or_else(|| NONE.dimmed()),
            actual_line
                .map(|line| colorify(line))
                .unwrap_or_else(|| NONE.dimmed()),
        );
        output_str.push_str(result_str);
        output_str.push('\n');
    }

    if unmatched_count > 0 {
        Outcome::Failed {
            msg: Some(output_str),
        }
    } else {
        Outcome::Passed
    }
}

fn read_all_files(prefix: PathBuf) -> Result<Vec<PathBuf>> {
    let mut results = Vec::<PathBuf>::new();
    read_children(prefix, &mut results)?;
    results.sort();
    return Ok(results);

    fn read_children(prefix: PathBuf, results: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(prefix).into_diagnostic()? {
            let entry = entry.into_diagnostic()?;
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if entry.file_type().into_diagnostic()?.is_dir() {
                read_children(entry.path(), results)?;
            } else {
                results.push(entry.path())
            }
        }
        Ok(())
    }
}
