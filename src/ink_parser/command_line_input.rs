use std::fmt::Display;

use lazy_static::lazy_static;

use super::{InkParser, IDENTIFIER_CHARACTERS};
use crate::{
    ast::{Node, NodeKind},
    char_set::CharacterSet,
    string_parser::Combinators,
};

lazy_static! {
    static ref RUNTIME_PATH_CHARACTERS: CharacterSet =
        IDENTIFIER_CHARACTERS.union(&CharacterSet::from("-."));
}

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandLineInput {
    Help,
    Exit,
    /// `DebugSource(offset)`
    DebugSource(i32),
    /// `DebugPath path.to.content`
    DebugPath(String),
    ChoiceNumber(i32),
    /// A divert, assignment or expression to run right away.
    ImmediateModeStatement(Node),
}

impl Display for CommandLineInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Help => f.write_str("(help)"),
            Self::Exit => f.write_str("(exit)"),
            Self::DebugSource(offset) => write!(f, "(debug-source {})", offset),
            Self::DebugPath(path) => write!(f, "(debug-path {})", path),
            Self::ChoiceNumber(number) => write!(f, "(choice {})", number),
            Self::ImmediateModeStatement(node) => write!(f, "(immediate {})", node),
        }
    }
}

impl InkParser {
    pub fn parse_command_line_input(&mut self) -> Option<CommandLineInput> {
        self.parse(Self::command_line_user_input)
    }

    fn command_line_user_input(&mut self) -> Option<CommandLineInput> {
        self.whitespace();

        if self.parse_string("help").is_some() {
            return Some(CommandLineInput::Help);
        }
        if self.parse_string("exit").is_some() || self.parse_string("quit").is_some() {
            return Some(CommandLineInput::Exit);
        }

        self.one_of(&[
            Self::debug_source,
            Self::debug_path_lookup,
            Self::user_choice_number,
            Self::user_immediate_mode_statement,
        ])
    }

    fn debug_source(&mut self) -> Option<CommandLineInput> {
        self.whitespace();
        self.parse_string("DebugSource")?;
        self.whitespace();

        let expected = "character offset in parentheses, e.g. DebugSource(5)";
        self.expect(|p| p.parse_string("("), expected)?;
        self.whitespace();

        let offset = match self.parse_int() {
            Some(offset) => offset,
            None => {
                self.error(expected);
                return None;
            }
        };

        self.whitespace();
        self.expect(|p| p.parse_string(")"), "closing parenthesis");

        Some(CommandLineInput::DebugSource(offset))
    }

    fn debug_path_lookup(&mut self) -> Option<CommandLineInput> {
        self.whitespace();
        self.parse_string("DebugPath")?;
        self.whitespace()?;

        let path = self.expect(
            |p| p.parse_characters_from_set(&RUNTIME_PATH_CHARACTERS, true, None),
            "path to content",
        )?;
        Some(CommandLineInput::DebugPath(path))
    }

    fn user_choice_number(&mut self) -> Option<CommandLineInput> {
        self.whitespace();
        let number = self.parse_int()?;
        self.whitespace();
        self.end_of_line()?;
        Some(CommandLineInput::ChoiceNumber(number))
    }

    fn user_immediate_mode_statement(&mut self) -> Option<CommandLineInput> {
        let statement = self.one_of(&[
            Self::immediate_divert,
            Self::temp_declaration_or_assignment,
            Self::immediate_expression,
        ])?;
        Some(CommandLineInput::ImmediateModeStatement(statement))
    }

    fn immediate_divert(&mut self) -> Option<Node> {
        self.single_divert()
            .map(|divert| Node::new(NodeKind::Divert(divert)))
    }

    fn immediate_expression(&mut self) -> Option<Node> {
        self.expression()
            .map(|expression| Node::new(NodeKind::Output(expression)))
    }
}
