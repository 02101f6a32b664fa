//! A parser for the ink interactive-narrative scripting language.
//!
//! [`InkParser`] turns ink source into a [`Story`] tree. Problems are
//! reported as [`ParseDiagnostic`]s through an error handler while parsing
//! carries on, so a single pass finds as many problems as it can.

pub mod ast;
mod char_set;
mod comment_eliminator;
mod ink_parser;
mod source;
mod source_reference;
pub mod string_parser;
mod value;

use std::{cell::RefCell, rc::Rc};

pub use ast::Story;
pub use char_set::{CharacterSet, ScanStops};
pub use comment_eliminator::{normalise_line_endings, CommentEliminator};
pub use ink_parser::{CommandLineInput, InkParser, StatementLevel};
pub use source::{DebugMetadata, SourceOffset, SourceSpan};
pub use source_reference::SourceReference;
pub use string_parser::ParseDiagnostic;
pub use value::Value;

/// Parses a whole story, collecting every diagnostic instead of printing it.
pub fn parse(name: &str, source: &str) -> (Option<Story>, Vec<ParseDiagnostic>) {
    let diagnostics = Rc::new(RefCell::new(Vec::new()));
    let sink = diagnostics.clone();

    let story = InkParser::with_name(name, source)
        .with_error_handler(move |diagnostic| sink.borrow_mut().push(diagnostic))
        .parse_story();

    let diagnostics = diagnostics.take();
    (story, diagnostics)
}
