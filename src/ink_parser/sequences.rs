use itertools::Itertools;
use lazy_static::lazy_static;

use super::{InkParser, StatementLevel};
use crate::{
    ast::{arrange_weave, Node, NodeKind, Sequence, SequenceType},
    char_set::CharacterSet,
    string_parser::{Combinators, Either},
};

lazy_static! {
    static ref SEQUENCE_TYPE_SYMBOLS: CharacterSet = CharacterSet::from("!&~$ ");
}

impl InkParser {
    /// An unannotated `{a|b|c}`; a single alternative is not a sequence.
    pub(super) fn inner_sequence(&mut self) -> Option<Node> {
        self.whitespace();

        let types = self
            .parse(Self::sequence_type_annotation)
            .unwrap_or_else(|| vec![SequenceType::Stopping]);

        let alternatives = self.parse(Self::inner_sequence_objects)?;
        if alternatives.len() <= 1 {
            return None;
        }

        Some(Node::new(NodeKind::Sequence(Sequence {
            types,
            alternatives,
        })))
    }

    /// `!&~$` symbols, or words like `shuffle once:`.
    pub(super) fn sequence_type_annotation(&mut self) -> Option<Vec<SequenceType>> {
        self.parse(Self::sequence_type_symbol_annotation)
            .or_else(|| self.parse(Self::sequence_type_word_annotation))
    }

    fn sequence_type_symbol_annotation(&mut self) -> Option<Vec<SequenceType>> {
        let symbols = self.parse_characters_from_set(&SEQUENCE_TYPE_SYMBOLS, true, None)?;
        let types = symbols
            .chars()
            .filter_map(SequenceType::from_symbol)
            .unique()
            .collect_vec();
        (!types.is_empty()).then_some(types)
    }

    fn sequence_type_word_annotation(&mut self) -> Option<Vec<SequenceType>> {
        let types = self.interleave_separated(Self::sequence_type_single_word, Self::whitespace)?;
        self.parse_string(":")?;
        Some(types.into_iter().unique().collect())
    }

    fn sequence_type_single_word(&mut self) -> Option<SequenceType> {
        self.identifier()?.parse().ok()
    }

    /// The alternatives, inline (`a|b`) or one per `-` line.
    pub(super) fn inner_sequence_objects(&mut self) -> Option<Vec<Vec<Node>>> {
        if self.parse(Self::newline).is_some() {
            self.parse(Self::inner_multiline_sequence_objects)
        } else {
            self.parse(Self::inner_inline_sequence_objects)
        }
    }

    fn inner_inline_sequence_objects(&mut self) -> Option<Vec<Vec<Node>>> {
        let interleaved: Vec<Either<Option<Vec<Node>>, ()>> = self.interleave(
            |p| p.optional(Self::mixed_text_and_logic),
            |content, list| list.push(Either::Left(content)),
            |p| p.parse_string("|"),
            |pipe, list| list.push(Either::Right(pipe)),
            |_, _| true,
            None,
        )?;

        // Every pipe closes an alternative, so `{|x|}` has an empty one at
        // each end.
        let mut alternatives = Vec::new();
        let mut just_had_content = false;
        for item in interleaved {
            match item {
                Either::Left(Some(content)) => {
                    alternatives.push(content);
                    just_had_content = true;
                }
                Either::Left(None) => {}
                Either::Right(()) => {
                    if !just_had_content {
                        alternatives.push(Vec::new());
                    }
                    just_had_content = false;
                }
            }
        }
        if !just_had_content {
            alternatives.push(Vec::new());
        }

        Some(alternatives)
    }

    fn inner_multiline_sequence_objects(&mut self) -> Option<Vec<Vec<Node>>> {
        self.multiline_whitespace();
        self.one_or_more(Self::single_multiline_sequence_element)
    }

    fn single_multiline_sequence_element(&mut self) -> Option<Vec<Node>> {
        self.whitespace();
        if self.divert_arrow().is_some() {
            return None;
        }
        self.parse_string("-")?;
        self.whitespace();

        match self.statements_at_level(StatementLevel::InnerBlock) {
            Some(mut content) => {
                content.insert(0, Node::text("\n"));
                Some(arrange_weave(content))
            }
            None => {
                self.multiline_whitespace();
                Some(Vec::new())
            }
        }
    }
}
