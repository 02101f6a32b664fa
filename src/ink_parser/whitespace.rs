use std::any::Any;

use lazy_static::lazy_static;

use super::InkParser;
use crate::{char_set::CharacterSet, string_parser::Combinators};

lazy_static! {
    static ref INLINE_WHITESPACE: CharacterSet = CharacterSet::from(" \t");
}

impl InkParser {
    /// Spaces and tabs; fails if there are none.
    pub(super) fn whitespace(&mut self) -> Option<()> {
        self.parse_characters_from_set(&INLINE_WHITESPACE, true, None)
            .map(|_| ())
    }

    pub(super) fn newline(&mut self) -> Option<()> {
        self.parse(|p| {
            p.whitespace();
            p.parse_newline()
        })
    }

    pub(super) fn end_of_file(&mut self) -> Option<()> {
        self.parse(|p| {
            p.whitespace();
            p.end_of_input().then_some(())
        })
    }

    pub(super) fn end_of_line(&mut self) -> Option<()> {
        self.one_of(&[Self::newline, Self::end_of_file])
    }

    /// One or more (possibly blank) lines.
    pub(super) fn multiline_whitespace(&mut self) -> Option<()> {
        self.one_or_more(Self::newline).map(|_| ())
    }

    pub(super) fn any_whitespace(&mut self) -> Option<()> {
        let mut found = false;
        while self.whitespace().is_some() || self.multiline_whitespace().is_some() {
            found = true;
        }
        found.then_some(())
    }

    pub(super) fn spaced<T: Any>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        self.parse(|p| {
            p.whitespace();
            let result = p.parse(rule)?;
            p.whitespace();
            Some(result)
        })
    }

    /// `rule` followed by the end of the line. A missing line end is
    /// reported and the rest of the line skipped; `rule`'s result stands.
    pub(super) fn line<T: Any>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let result = self.parse(rule)?;
        self.expect_or_recover(Self::end_of_line, "end of line", Self::skip_to_next_line);
        Some(result)
    }

    pub(super) fn skip_to_next_line(&mut self) -> Option<()> {
        self.parse_until_characters_from_string("\n\r");
        self.parse_newline();
        Some(())
    }
}
