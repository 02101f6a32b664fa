use lazy_static::lazy_static;

use super::InkParser;
use crate::{
    ast::{trim_end_whitespace, Node, NodeKind},
    char_set::{CharacterSet, ScanStops},
    string_parser::Combinators,
};

lazy_static! {
    static ref CONTENT_TEXT_PAUSE: CharacterSet = CharacterSet::from("-<");
    static ref CONTENT_TEXT_END: CharacterSet = CharacterSet::from("{}|\n\r\\#");
    static ref CONTENT_TEXT_STOPS: ScanStops =
        ScanStops::new(CONTENT_TEXT_PAUSE.clone(), &CONTENT_TEXT_END);
    static ref CONTENT_TEXT_STOPS_IN_CHOICE: ScanStops = ScanStops::new(
        CONTENT_TEXT_PAUSE.clone(),
        &CONTENT_TEXT_END.union(&CharacterSet::from("[]"))
    );
    static ref CONTENT_TEXT_STOPS_IN_STRING: ScanStops = ScanStops::new(
        CONTENT_TEXT_PAUSE.clone(),
        &CONTENT_TEXT_END.union(&CharacterSet::from("\""))
    );
    static ref TAG_END: CharacterSet = CharacterSet::from("#\n\r\\");
}

impl InkParser {
    /// A full line of content: trailing whitespace goes, a line break is
    /// added, and the line must end here.
    pub(super) fn line_of_mixed_text_and_logic(&mut self) -> Option<Vec<Node>> {
        self.whitespace();
        let mut result = self.parse(Self::mixed_text_and_logic)?;

        if let Some(NodeKind::Text(text)) = result.first().map(|node| &node.kind) {
            if text.starts_with("return") {
                self.warning(
                    "Do you need a '~' before 'return'? If not, perhaps use a glue: <> \
                     (since it's lowercase) or rewrite somehow?",
                );
            }
        }

        let ends_with_divert = matches!(
            result.last().map(|node| &node.kind),
            Some(NodeKind::Divert(_) | NodeKind::TunnelOnwards(_))
        );
        if !ends_with_divert {
            trim_end_whitespace(&mut result, false);
        }

        let only_tags = !result.is_empty()
            && result
                .iter()
                .all(|node| matches!(node.kind, NodeKind::Tag(_)));
        if !only_tags {
            result.push(Node::text("\n"));
        }

        self.expect_or_recover(Self::end_of_line, "end of line", Self::skip_to_next_line);

        Some(result)
    }

    /// Text interleaved with inline logic, glue and tags, optionally ending
    /// in diverts.
    pub(super) fn mixed_text_and_logic(&mut self) -> Option<Vec<Node>> {
        self.whitespace();

        let results = self.interleave_optional(
            |p| p.optional(Self::content_text),
            |p| p.optional(Self::inline_logic_or_glue_or_tag),
        );

        // A choice's diverts are parsed by the choice itself.
        if self.parsing_choice == 0 {
            if let Some(diverts) = self.parse(Self::multi_divert) {
                let mut results = results.unwrap_or_default();
                trim_end_whitespace(&mut results, true);
                results.extend(diverts);
                return Some(results);
            }
        }

        results
    }

    fn content_text(&mut self) -> Option<Node> {
        let mut text = String::new();
        let mut matched = false;
        loop {
            let run = self.parse(Self::content_text_no_escape);
            let escaped = self.parse_string("\\").is_some();
            if run.is_none() && !escaped {
                break;
            }
            matched = true;
            text.extend(run);
            if escaped {
                text.extend(self.parse_single_character());
            }
        }
        matched.then(|| Node::text(text))
    }

    fn content_text_no_escape(&mut self) -> Option<String> {
        let stops: &ScanStops = if self.parsing_string_expression {
            &*CONTENT_TEXT_STOPS_IN_STRING
        } else if self.parsing_choice > 0 {
            &*CONTENT_TEXT_STOPS_IN_CHOICE
        } else {
            &*CONTENT_TEXT_STOPS
        };
        self.parse_until(Self::content_text_stop, stops)
    }

    fn content_text_stop(&mut self) -> Option<()> {
        self.one_of(&[
            Self::divert_arrow,
            Self::thread_arrow,
            Self::end_of_line,
            Self::glue_marker,
        ])
    }

    fn glue_marker(&mut self) -> Option<()> {
        self.parse_string("<>")
    }

    fn inline_logic_or_glue_or_tag(&mut self) -> Option<Node> {
        self.one_of(&[Self::inline_logic, Self::glue, Self::tag])
    }

    fn glue(&mut self) -> Option<Node> {
        self.glue_marker()?;
        Some(Node::new(NodeKind::Glue))
    }

    fn tag(&mut self) -> Option<Node> {
        self.tag_text().map(|tag| Node::new(NodeKind::Tag(tag)))
    }

    /// `# text`, up to the next tag or the end of the line.
    pub(super) fn tag_text(&mut self) -> Option<String> {
        self.whitespace();
        self.parse_string("#")?;
        self.whitespace();

        let mut text = String::new();
        loop {
            text.extend(self.parse_until_characters_from_set(&TAG_END));
            if self.parse_string("\\").is_none() {
                break;
            }
            text.extend(self.parse_single_character());
        }
        Some(text.trim().to_string())
    }

    pub(super) fn tags(&mut self) -> Option<Vec<String>> {
        self.one_or_more(Self::tag_text)
    }
}
