//! The ink grammar, written as methods on [`InkParser`] on top of the
//! backtracking engine in [`crate::string_parser`].

mod choices;
mod command_line_input;
mod conditional;
mod content;
mod divert;
mod expressions;
mod knot;
mod logic;
mod sequences;
mod statements;
mod whitespace;

pub use command_line_input::CommandLineInput;
pub use statements::StatementLevel;

use std::{
    any::Any,
    ops::{Deref, DerefMut},
};

use lazy_static::lazy_static;

use crate::{
    ast::{ConditionalBranch, Node, Story},
    char_set::CharacterSet,
    comment_eliminator::{normalise_line_endings, CommentEliminator},
    source::DebugMetadata,
    string_parser::{Combinators, ParseDiagnostic, RuleObserver, StateElement, StringParser},
    SourceReference,
};

lazy_static! {
    static ref IDENTIFIER_CHARACTERS: CharacterSet = CharacterSet::new()
        .with_range('A', 'Z')
        .with_range('a', 'z')
        .with_range('0', '9')
        .with_chars("_")
        .with_range('\u{C0}', '\u{D6}')
        .with_range('\u{D8}', '\u{F6}')
        .with_range('\u{F8}', '\u{24F}');
}

pub struct InkParser {
    parser: StringParser,
    /// Non-zero while the content of a choice is being parsed.
    parsing_choice: usize,
    parsing_string_expression: bool,
}

impl Deref for InkParser {
    type Target = StringParser;

    fn deref(&self) -> &Self::Target {
        &self.parser
    }
}
impl DerefMut for InkParser {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.parser
    }
}

impl Combinators for InkParser {
    fn engine(&self) -> &StringParser {
        &self.parser
    }
    fn engine_mut(&mut self) -> &mut StringParser {
        &mut self.parser
    }
}

impl InkParser {
    pub fn new(source: &str) -> Self {
        Self::with_name("<input>", source)
    }

    /// Normalises line endings and strips comments before parsing. `name`
    /// labels the source in rendered diagnostics.
    pub fn with_name(name: &str, source: &str) -> Self {
        let source = CommentEliminator::new(&normalise_line_endings(source)).process();
        let mut parser = StringParser::new(&source)
            .with_source_reference(SourceReference::new(name, source.clone()));
        parser.set_rule_observer(Some(Box::new(DebugMetadataAttacher::default())));

        Self {
            parser,
            parsing_choice: 0,
            parsing_string_expression: false,
        }
    }

    pub fn with_error_handler(mut self, handler: impl FnMut(ParseDiagnostic) + 'static) -> Self {
        self.parser.set_error_handler(Some(Box::new(handler)));
        self
    }

    /// Installs `observer` to run after every successful rule, once debug
    /// metadata has been attached to the rule's result.
    pub fn with_rule_observer(mut self, observer: impl RuleObserver + 'static) -> Self {
        self.parser
            .set_rule_observer(Some(Box::new(DebugMetadataAttacher {
                next: Some(Box::new(observer)),
            })));
        self
    }

    /// Parses the whole input as a story.
    ///
    /// Lines that no statement can start with are reported and skipped so
    /// the rest of the file is still checked. Returns `None` only when the
    /// input has content but nothing in it could be parsed; a returned story
    /// may still contain placeholder content, so check `had_error()`.
    pub fn parse_story(&mut self) -> Option<Story> {
        let mut content = self
            .statements_at_level(StatementLevel::Top)
            .unwrap_or_default();

        self.any_whitespace();
        while !self.end_of_input() {
            if let Some(recovered) = self.parse(Self::skip_unexpected_line) {
                content.extend(recovered);
            }
            self.any_whitespace();
        }

        if content.is_empty() && !self.input_string().trim().is_empty() {
            return None;
        }
        Some(Story::new(content))
    }

    fn skip_unexpected_line(&mut self) -> Option<Vec<Node>> {
        let line = self.line_remainder().unwrap_or_default();
        self.error(&format!("Unexpected content: '{}'", line.trim_end()));
        self.skip_to_next_line();
        Some(
            self.statements_at_level(StatementLevel::Top)
                .unwrap_or_default(),
        )
    }

    /// A name made of identifier characters that is not only digits.
    pub(crate) fn identifier(&mut self) -> Option<String> {
        self.parse(|p| {
            let name = p.parse_characters_from_set(&IDENTIFIER_CHARACTERS, true, None)?;
            if name.chars().all(|ch| ch.is_ascii_digit()) {
                return None;
            }
            Some(name)
        })
    }

    /// Reports against the line a parsed object started on.
    fn error_at(&mut self, message: &str, metadata: Option<DebugMetadata>) {
        let line_number = metadata.map_or(self.line_index() + 1, |metadata| metadata.start_line);
        self.error_on_line(message, line_number, false);
    }
}

/// Records the source range of every node a rule produces, unless a more
/// specific inner rule already did.
#[derive(Default)]
struct DebugMetadataAttacher {
    next: Option<Box<dyn RuleObserver>>,
}

impl RuleObserver for DebugMetadataAttacher {
    fn rule_did_succeed(&mut self, result: &mut dyn Any, start: &StateElement, end: &StateElement) {
        let metadata = DebugMetadata {
            start_index: start.character_index,
            end_index: end.character_index,
            start_line: start.line_index + 1,
            end_line: end.line_index + 1,
        };

        if let Some(node) = result.downcast_mut::<Node>() {
            node.debug_metadata.get_or_insert(metadata);
        } else if let Some(nodes) = result.downcast_mut::<Vec<Node>>() {
            for node in nodes.iter_mut() {
                node.debug_metadata.get_or_insert(metadata);
            }
        } else if let Some(branch) = result.downcast_mut::<ConditionalBranch>() {
            branch.debug_metadata.get_or_insert(metadata);
        }

        if let Some(next) = self.next.as_mut() {
            next.rule_did_succeed(result, start, end);
        }
    }
}
