use num_enum::IntoPrimitive;

use super::InkParser;
use crate::{
    ast::{Node, NodeKind},
    string_parser::{Combinators, Rule},
};

/// How deeply nested a run of statements is. Each level accepts a subset of
/// the statements of the level above it and stops at the headers that
/// belong to an enclosing level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, IntoPrimitive)]
#[repr(usize)]
pub enum StatementLevel {
    /// Inside `{ ... }`, e.g. a branch of a multiline conditional.
    InnerBlock,
    Stitch,
    Knot,
    Top,
}

type StatementRule = Rule<InkParser, Vec<Node>>;
type BreakRule = Rule<InkParser, ()>;

const INNER_BLOCK_STATEMENTS: &[StatementRule] = &[
    InkParser::line_of_multi_divert,
    InkParser::line_of_choice,
    InkParser::line_of_author_warning,
    InkParser::line_of_variable_declaration,
    InkParser::line_of_const_declaration,
    InkParser::line_of_include,
    InkParser::logic_line,
    InkParser::line_of_mixed_text_and_logic,
];

const STITCH_STATEMENTS: &[StatementRule] = &[
    InkParser::line_of_multi_divert,
    InkParser::line_of_choice,
    InkParser::line_of_author_warning,
    InkParser::gather_statement,
    InkParser::line_of_variable_declaration,
    InkParser::line_of_const_declaration,
    InkParser::line_of_include,
    InkParser::logic_line,
    InkParser::line_of_mixed_text_and_logic,
];

const KNOT_STATEMENTS: &[StatementRule] = &[
    InkParser::line_of_multi_divert,
    InkParser::line_of_choice,
    InkParser::line_of_author_warning,
    InkParser::gather_statement,
    InkParser::stitch_statement,
    InkParser::line_of_variable_declaration,
    InkParser::line_of_const_declaration,
    InkParser::line_of_include,
    InkParser::logic_line,
    InkParser::line_of_mixed_text_and_logic,
];

const TOP_STATEMENTS: &[StatementRule] = &[
    InkParser::line_of_multi_divert,
    InkParser::knot_statement,
    InkParser::line_of_choice,
    InkParser::line_of_author_warning,
    InkParser::gather_statement,
    InkParser::stitch_statement,
    InkParser::line_of_variable_declaration,
    InkParser::line_of_const_declaration,
    InkParser::line_of_external_declaration,
    InkParser::line_of_include,
    InkParser::logic_line,
    InkParser::line_of_mixed_text_and_logic,
];

/// Indexed by `StatementLevel`.
const STATEMENT_RULES: [&[StatementRule]; 4] = [
    INNER_BLOCK_STATEMENTS,
    STITCH_STATEMENTS,
    KNOT_STATEMENTS,
    TOP_STATEMENTS,
];

const BREAK_RULES: [&[BreakRule]; 4] = [
    &[
        InkParser::knot_break,
        InkParser::stitch_break,
        InkParser::dash_not_arrow,
        InkParser::closing_brace,
    ],
    &[InkParser::knot_break, InkParser::stitch_break],
    &[InkParser::knot_break],
    &[],
];

impl InkParser {
    /// Statements, with blank lines between them, until a header belonging
    /// to an enclosing level (or anything unparseable) is reached.
    pub(super) fn statements_at_level(&mut self, level: StatementLevel) -> Option<Vec<Node>> {
        if level == StatementLevel::InnerBlock && self.parse(Self::gather_dashes).is_some() {
            self.error(
                "You can't use a gather (the dashes) within the { curly braces } context. \
                 For multi-line sequences and conditions, you should only use one dash.",
            );
        }

        let mut break_for_level = |p: &mut Self| p.statements_break_for_level(level);
        self.interleave(
            |p| p.optional(Self::multiline_whitespace),
            |_, _| {},
            |p| p.statement_at_level(level),
            |statement, list: &mut Vec<Node>| list.extend(statement),
            |_, _| true,
            Some(&mut break_for_level),
        )
    }

    fn statement_at_level(&mut self, level: StatementLevel) -> Option<Vec<Node>> {
        let statement = self.one_of(STATEMENT_RULES[usize::from(level)])?;

        if level == StatementLevel::Top {
            let misplaced_return = statement
                .iter()
                .find(|node| matches!(node.kind, NodeKind::Return(_)));
            if let Some(node) = misplaced_return {
                let metadata = node.debug_metadata;
                self.error_at("should not have return statement outside of a knot", metadata);
            }
        }

        Some(statement)
    }

    fn statements_break_for_level(&mut self, level: StatementLevel) -> Option<()> {
        self.whitespace();
        self.one_of(BREAK_RULES[usize::from(level)])
    }

    fn knot_break(&mut self) -> Option<()> {
        self.knot_header_start()
    }

    fn stitch_break(&mut self) -> Option<()> {
        self.stitch_declaration().map(|_| ())
    }

    fn closing_brace(&mut self) -> Option<()> {
        self.parse_string("}")
    }

    fn knot_statement(&mut self) -> Option<Vec<Node>> {
        self.knot_definition().map(|knot| vec![knot])
    }

    fn stitch_statement(&mut self) -> Option<Vec<Node>> {
        self.stitch_definition().map(|stitch| vec![stitch])
    }

    fn gather_statement(&mut self) -> Option<Vec<Node>> {
        self.gather().map(|gather| vec![gather])
    }

    fn line_of_multi_divert(&mut self) -> Option<Vec<Node>> {
        self.line(Self::multi_divert)
    }

    fn line_of_choice(&mut self) -> Option<Vec<Node>> {
        self.line(Self::choice).map(|choice| vec![choice])
    }

    fn line_of_author_warning(&mut self) -> Option<Vec<Node>> {
        self.line(Self::author_warning).map(|warning| vec![warning])
    }

    fn line_of_variable_declaration(&mut self) -> Option<Vec<Node>> {
        self.line(Self::variable_declaration)
            .map(|declaration| vec![declaration])
    }

    fn line_of_const_declaration(&mut self) -> Option<Vec<Node>> {
        self.line(Self::const_declaration)
            .map(|declaration| vec![declaration])
    }

    fn line_of_external_declaration(&mut self) -> Option<Vec<Node>> {
        self.line(Self::external_declaration)
            .map(|declaration| vec![declaration])
    }

    fn line_of_include(&mut self) -> Option<Vec<Node>> {
        self.line(Self::include_statement)
            .map(|include| vec![include])
    }

    /// `TODO: message`, kept in the tree and reported as a warning.
    fn author_warning(&mut self) -> Option<Node> {
        self.whitespace();
        if self.identifier()? != "TODO" {
            return None;
        }
        self.whitespace();
        self.parse_string(":");
        self.whitespace();

        let message = self
            .parse_until_characters_from_string("\n\r")
            .unwrap_or_default();
        self.warning(&format!("TODO: {}", message));

        Some(Node::new(NodeKind::AuthorWarning(message)))
    }
}
