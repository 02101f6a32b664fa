use miette::{Diagnostic, LabeledSpan, Severity, SourceCode};
use thiserror::Error;

use crate::{SourceReference, SourceSpan};

/// One error or warning reported while parsing.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ParseDiagnostic {
    pub message: String,
    /// Character offset at which the problem was noticed.
    pub index: usize,
    /// Zero-based line number.
    pub line: usize,
    pub is_warning: bool,
    pub span: SourceSpan,
    pub source_code: Option<SourceReference>,
}

impl ParseDiagnostic {
    pub fn line_number(&self) -> usize {
        self.line + 1
    }

    /// The plain-text rendering used when no handler is installed.
    pub fn summary(&self) -> String {
        format!(
            "{} on line {}: {}",
            if self.is_warning { "Warning" } else { "Error" },
            self.line_number(),
            self.message
        )
    }
}

impl Diagnostic for ParseDiagnostic {
    fn severity(&self) -> Option<Severity> {
        Some(if self.is_warning {
            Severity::Warning
        } else {
            Severity::Error
        })
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source_code
            .as_ref()
            .map(|source| source as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        self.source_code.as_ref()?;
        let label = if self.is_warning { "here" } else { "found here" };
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(label.to_string()),
            self.span.start().byte_offset(),
            self.span.len(),
        ))))
    }
}

/// Receives every diagnostic in the order it was reported.
pub type ErrorHandler = Box<dyn FnMut(ParseDiagnostic)>;
