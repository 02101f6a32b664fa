use lazy_static::lazy_static;

use super::{InkParser, StatementLevel};
use crate::{
    ast::{ExternalDeclaration, Flow, FlowArgument, FlowLevel, Node, NodeKind},
    char_set::{CharacterSet, ScanStops},
    string_parser::Combinators,
};

lazy_static! {
    static ref KNOT_TITLE_EQUALS: CharacterSet = CharacterSet::from("=");
    static ref KNOT_RECOVERY_STOPS: ScanStops = ScanStops::pausing_at(KNOT_TITLE_EQUALS.clone());
}

/// The header line of a knot or stitch.
pub(super) struct FlowDeclaration {
    name: Option<String>,
    arguments: Vec<FlowArgument>,
    is_function: bool,
}

impl InkParser {
    /// `== name`, `=== function name(a, b) ===`, ...
    pub(super) fn knot_declaration(&mut self) -> Option<FlowDeclaration> {
        self.whitespace();
        self.parse(Self::knot_title_equals)?;
        self.whitespace();

        let identifier = self.identifier();
        let is_function = identifier.as_deref() == Some("function");
        let name = if is_function {
            self.whitespace();
            self.identifier()
        } else {
            identifier
        };

        self.whitespace();
        let arguments = self
            .parse(Self::bracketed_knot_decl_arguments)
            .unwrap_or_default();
        self.whitespace();
        self.parse(Self::knot_title_equals);

        Some(FlowDeclaration {
            name,
            arguments,
            is_function,
        })
    }

    /// The `==` that opens a knot header. Used for lookahead, so it never
    /// reports anything.
    pub(super) fn knot_header_start(&mut self) -> Option<()> {
        self.whitespace();
        self.knot_title_equals()
    }

    fn knot_title_equals(&mut self) -> Option<()> {
        let equals = self.parse_characters_from_set(&KNOT_TITLE_EQUALS, true, None)?;
        (equals.len() > 1).then_some(())
    }

    pub(super) fn knot_definition(&mut self) -> Option<Node> {
        let declaration = self.parse(Self::knot_declaration)?;
        if declaration.name.is_none() {
            let kind = if declaration.is_function { "function" } else { "knot" };
            self.error(&format!("Expected the name of the {}", kind));
        }
        self.expect_or_recover(
            Self::end_of_line,
            "end of line after knot name definition",
            Self::skip_to_next_line,
        );

        let content = self
            .expect_or_recover(
                |p| p.statements_at_level(StatementLevel::Knot),
                "at least one line within the knot",
                Self::knot_stitch_no_content_recovery,
            )
            .unwrap_or_default();

        Some(declaration.into_flow(FlowLevel::Knot, content))
    }

    /// Skips ahead to the next knot header and stands in for the lost body.
    fn knot_stitch_no_content_recovery(&mut self) -> Option<Vec<Node>> {
        self.parse_until(Self::knot_header_start, &KNOT_RECOVERY_STOPS);
        Some(vec![Node::text("<ERROR IN FLOW>")])
    }

    /// `= name`; a second `=` makes it a knot header instead.
    pub(super) fn stitch_declaration(&mut self) -> Option<FlowDeclaration> {
        self.whitespace();
        self.parse_string("=")?;
        if self.parse_string("=").is_some() {
            return None;
        }
        self.whitespace();

        let is_function = self
            .parse(|p| {
                p.parse_string("function")?;
                p.whitespace()
            })
            .is_some();

        let name = Some(self.identifier()?);
        self.whitespace();
        let arguments = self
            .parse(Self::bracketed_knot_decl_arguments)
            .unwrap_or_default();
        self.whitespace();

        Some(FlowDeclaration {
            name,
            arguments,
            is_function,
        })
    }

    pub(super) fn stitch_definition(&mut self) -> Option<Node> {
        let declaration = self.parse(Self::stitch_declaration)?;
        self.expect_or_recover(
            Self::end_of_line,
            "end of line after stitch name",
            Self::skip_to_next_line,
        );

        let content = self
            .expect_or_recover(
                |p| p.statements_at_level(StatementLevel::Stitch),
                "at least one line within the stitch",
                Self::knot_stitch_no_content_recovery,
            )
            .unwrap_or_default();

        Some(declaration.into_flow(FlowLevel::Stitch, content))
    }

    /// `(a, ref b, -> c)`
    fn bracketed_knot_decl_arguments(&mut self) -> Option<Vec<FlowArgument>> {
        self.parse_string("(")?;
        let arguments = self
            .interleave_separated(
                |p| p.spaced(Self::flow_decl_argument),
                |p| p.parse_string(","),
            )
            .unwrap_or_default();
        self.expect(|p| p.parse_string(")"), "closing ')' for parameter list");
        Some(arguments)
    }

    fn flow_decl_argument(&mut self) -> Option<FlowArgument> {
        let first = self.identifier();
        self.whitespace();
        let is_divert_target = self.parse_string("->").is_some();
        self.whitespace();
        let second = self.identifier();

        if first.is_none() && second.is_none() {
            return None;
        }

        let is_by_reference = first.as_deref() == Some("ref");
        let name = match (is_by_reference, first, second) {
            (true, _, Some(name)) => name,
            (true, _, None) => {
                self.error("Expected an parameter name after 'ref'");
                String::new()
            }
            (false, _, Some(name)) if is_divert_target => name,
            (false, Some(name), _) => name,
            (false, None, _) => {
                self.error("Expected an parameter name");
                String::new()
            }
        };

        Some(FlowArgument {
            name,
            is_by_reference,
            is_divert_target,
        })
    }

    /// `EXTERNAL name(a, b)`
    pub(super) fn external_declaration(&mut self) -> Option<Node> {
        self.whitespace();
        if self.identifier()? != "EXTERNAL" {
            return None;
        }
        self.whitespace();

        let name = self
            .expect(Self::identifier, "name of external function")
            .unwrap_or_default();
        self.whitespace();

        let message = format!(
            "declaration of arguments for EXTERNAL, even if empty, i.e. 'EXTERNAL {}()'",
            name
        );
        let arguments = self
            .expect(Self::bracketed_knot_decl_arguments, &message)
            .unwrap_or_default();

        Some(Node::new(NodeKind::ExternalDeclaration(ExternalDeclaration {
            name,
            arguments: arguments.into_iter().map(|argument| argument.name).collect(),
        })))
    }
}

impl FlowDeclaration {
    fn into_flow(self, level: FlowLevel, content: Vec<Node>) -> Node {
        Node::new(NodeKind::Flow(Flow::new(
            level,
            self.name.unwrap_or_default(),
            self.arguments,
            self.is_function,
            content,
        )))
    }
}
