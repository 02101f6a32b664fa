use std::ops::Range;

use derive_new::new;

/// Byte offset into the pre-processed source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceOffset(usize);

impl SourceOffset {
    pub fn byte_offset(&self) -> usize {
        self.0
    }

    /// Converts a character index into a byte offset within `chars`.
    pub fn from_char_index(chars: &[char], index: usize) -> Self {
        Self(
            chars[..index.min(chars.len())]
                .iter()
                .map(|ch| ch.len_utf8())
                .sum(),
        )
    }
}

impl From<usize> for SourceOffset {
    fn from(offset: usize) -> Self {
        Self(offset)
    }
}

impl From<SourceOffset> for miette::SourceOffset {
    fn from(offset: SourceOffset) -> Self {
        offset.0.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, new)]
pub struct SourceSpan {
    offset: SourceOffset,
    length: usize,
}

impl SourceSpan {
    pub fn range(start: SourceOffset, end: SourceOffset) -> Self {
        Self {
            offset: start,
            length: end.0.saturating_sub(start.0),
        }
    }
    pub fn len(&self) -> usize {
        self.length
    }
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
    pub fn start(&self) -> SourceOffset {
        self.offset
    }
    pub fn end(&self) -> SourceOffset {
        (self.offset.0 + self.length).into()
    }
}

impl From<Range<usize>> for SourceSpan {
    fn from(range: Range<usize>) -> Self {
        Self::range(range.start.into(), range.end.into())
    }
}

impl From<SourceSpan> for miette::SourceSpan {
    fn from(span: SourceSpan) -> Self {
        Self::new(span.offset.into(), span.length.into())
    }
}

/// Where in the source a parsed node was found. Indices are character
/// indices, lines are one-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMetadata {
    pub start_index: usize,
    pub end_index: usize,
    pub start_line: usize,
    pub end_line: usize,
}
