use lazy_static::lazy_static;

use crate::{
    char_set::{CharacterSet, ScanStops},
    string_parser::{Combinators, StringParser},
};

lazy_static! {
    static ref COMMENT_OR_NEWLINE_START: ScanStops =
        ScanStops::pausing_at(CharacterSet::from("/\r\n"));
    static ref COMMENT_BLOCK_END: ScanStops = ScanStops::pausing_at(CharacterSet::from("*"));
    static ref NEWLINES: CharacterSet = CharacterSet::from("\n\r");
}

/// Collapses `\r\n` and lone `\r` into `\n`.
pub fn normalise_line_endings(source: &str) -> String {
    source.replace("\r\n", "\n").replace('\r', "\n")
}

/// Strips `//` and `/* */` comments. Block comments are replaced by the
/// newlines they spanned so that line numbers survive.
pub struct CommentEliminator {
    parser: StringParser,
}

impl Combinators for CommentEliminator {
    fn engine(&self) -> &StringParser {
        &self.parser
    }
    fn engine_mut(&mut self) -> &mut StringParser {
        &mut self.parser
    }
}

impl CommentEliminator {
    pub fn new(input: &str) -> Self {
        Self {
            parser: StringParser::new(input),
        }
    }

    pub fn process(mut self) -> String {
        self.interleave_optional(
            |p| p.optional(Self::comments_and_newlines),
            |p| p.optional(Self::main_ink),
        )
        .map(|parts| parts.concat())
        .unwrap_or_default()
    }

    fn main_ink(&mut self) -> Option<String> {
        self.parse_until(Self::comments_and_newlines, &COMMENT_OR_NEWLINE_START)
    }

    fn comments_and_newlines(&mut self) -> Option<String> {
        self.interleave_optional(
            |p| p.optional(|p| p.parser.parse_newline().map(|_| "\n".to_string())),
            |p| p.optional(Self::single_comment),
        )
        .map(|parts| parts.concat())
    }

    fn single_comment(&mut self) -> Option<String> {
        self.one_of(&[Self::end_of_line_comment, Self::block_comment])
    }

    fn end_of_line_comment(&mut self) -> Option<String> {
        self.parser.parse_string("//")?;
        self.parser.parse_until_characters_from_set(&NEWLINES);
        Some(String::new())
    }

    fn block_comment(&mut self) -> Option<String> {
        self.parser.parse_string("/*")?;
        let start_line = self.parser.line_index();

        let comment = self.parse_until(|p| p.parser.parse_string("*/"), &COMMENT_BLOCK_END);
        if !self.parser.end_of_input() {
            self.parser.parse_string("*/");
        }

        match comment {
            Some(_) => Some("\n".repeat(self.parser.line_index() - start_line)),
            None => Some(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip(source: &str) -> String {
        CommentEliminator::new(source).process()
    }

    #[test]
    fn removes_line_comments() {
        assert_eq!(strip("hello // there\nworld"), "hello \nworld");
        assert_eq!(strip("// only a comment"), "");
    }

    #[test]
    fn block_comments_keep_their_newlines() {
        assert_eq!(strip("a /* one\ntwo\n */b\nc"), "a \n\nb\nc");
        assert_eq!(strip("x/**/y"), "xy");
    }

    #[test]
    fn keeps_lone_slashes_and_stars() {
        assert_eq!(strip("1 / 2 * 3\n"), "1 / 2 * 3\n");
    }

    #[test]
    fn unterminated_block_runs_to_end() {
        assert_eq!(strip("a /* b\nc"), "a \n");
    }

    #[test]
    fn normalises_line_endings() {
        assert_eq!(normalise_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }
}
