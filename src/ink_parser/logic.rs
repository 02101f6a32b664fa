use super::InkParser;
use crate::{
    ast::{Expression, Node, NodeKind, VariableAssignment},
    string_parser::{Combinators, Rule},
};

impl InkParser {
    /// `~ ...`: a return, a temporary declaration or assignment, or a bare
    /// expression that must be a function call or increment.
    pub(super) fn logic_line(&mut self) -> Option<Vec<Node>> {
        self.whitespace();
        self.parse_string("~")?;
        self.whitespace();

        let rules: [Rule<Self, Node>; 3] = [
            Self::return_statement,
            Self::temp_declaration_or_assignment,
            Self::logic_expression,
        ];
        let node = match self.expect(|p| p.one_of(&rules), "expression after '~'") {
            Some(node) => node,
            None => {
                self.skip_to_next_line();
                return Some(Vec::new());
            }
        };

        if let NodeKind::Logic(expression) = &node.kind {
            if !expression.is_function_call() && !expression.is_inc_dec() {
                if matches!(expression, Expression::Variable(path) if path == &["include"]) {
                    self.error(
                        "'~ include' is no longer the correct syntax - please use \
                         'INCLUDE your_filename.ink', without the tilda, and in block capitals.",
                    );
                } else {
                    self.error(
                        "Logic following a '~' can't be that type of expression. It can only be \
                         something like:\n\t~ return\n\t~ var x = blah\n\t~ x++\n\t~ myFunction()",
                    );
                }
            }
        }

        let calls_function = match &node.kind {
            NodeKind::Logic(expression) | NodeKind::Return(Some(expression)) => {
                expression.contains_function_call()
            }
            NodeKind::VariableAssignment(assignment) => assignment.value.contains_function_call(),
            _ => false,
        };

        let mut result = vec![node];
        if calls_function {
            result.push(Node::text("\n"));
        }

        self.expect_or_recover(Self::end_of_line, "end of logic line", Self::skip_to_next_line);
        Some(result)
    }

    fn logic_expression(&mut self) -> Option<Node> {
        self.expression()
            .map(|expression| Node::new(NodeKind::Logic(expression)))
    }

    /// `temp x = e`, `x = e`, `x += e`, `x -= e`
    pub(super) fn temp_declaration_or_assignment(&mut self) -> Option<Node> {
        self.whitespace();
        let is_new_temporary = self.parse(Self::temp_keyword).is_some();
        self.whitespace();

        let name = if is_new_temporary {
            self.expect(Self::identifier, "variable name")?
        } else {
            self.identifier()?
        };
        self.whitespace();

        let is_increment = self.parse_string("+").is_some();
        let is_decrement = self.parse_string("-").is_some();
        if is_increment && is_decrement {
            self.error("Unexpected sequence '+-'");
        }

        if self.parse_string("=").is_none() {
            if is_new_temporary {
                self.error("Expected '='");
            }
            return None;
        }

        let value = self.expect(Self::expression, "value expression to be assigned")?;

        let kind = if is_increment || is_decrement {
            NodeKind::Logic(Expression::IncDec {
                name,
                is_increment,
                amount: Some(Box::new(value)),
            })
        } else {
            NodeKind::VariableAssignment(VariableAssignment {
                name,
                value,
                is_new_temporary,
                is_global_declaration: false,
            })
        };
        Some(Node::new(kind))
    }

    fn temp_keyword(&mut self) -> Option<()> {
        (self.identifier()? == "temp").then_some(())
    }

    fn return_statement(&mut self) -> Option<Node> {
        self.whitespace();
        if self.identifier()? != "return" {
            return None;
        }
        self.whitespace();
        let value = self.parse(Self::expression);
        Some(Node::new(NodeKind::Return(value)))
    }

    /// `VAR name = value`
    pub(super) fn variable_declaration(&mut self) -> Option<Node> {
        self.whitespace();
        if self.identifier()? != "VAR" {
            return None;
        }
        self.whitespace();

        let name = self
            .expect(Self::identifier, "variable name")
            .unwrap_or_default();
        self.whitespace();
        self.expect(
            |p| p.parse_string("="),
            "the '=' for an assignment of a value, e.g. '= 5' (initial values are mandatory)",
        );
        self.whitespace();

        let value = self.expect(Self::expression, "initial value for ")?;
        match &value {
            Expression::Literal(_) | Expression::DivertTarget(_) | Expression::Variable(_) => {}
            Expression::String(_) => {
                if !value.is_single_string() {
                    self.error("Constant strings cannot contain any logic.");
                }
            }
            _ => self.error(
                "initial value for a variable must be a number, constant, list or divert target",
            ),
        }

        if self.parse(|p| p.spaced(|p| p.parse_string(","))).is_some() {
            self.error(
                "Unexpected ','. If you're trying to declare a new list, use the LIST keyword, not VAR",
            );
        }

        Some(Node::new(NodeKind::VariableAssignment(VariableAssignment {
            name,
            value,
            is_new_temporary: false,
            is_global_declaration: true,
        })))
    }

    /// `CONST name = value`
    pub(super) fn const_declaration(&mut self) -> Option<Node> {
        self.whitespace();
        if self.identifier()? != "CONST" {
            return None;
        }
        self.whitespace();

        let name = self
            .expect(Self::identifier, "constant name")
            .unwrap_or_default();
        self.whitespace();
        self.expect(
            |p| p.parse_string("="),
            "the '=' for an assignment of a value, e.g. '= 5' (initial values are mandatory)",
        );
        self.whitespace();

        let value = self.expect(Self::expression, "initial value for ")?;
        match &value {
            Expression::Literal(_) | Expression::DivertTarget(_) => {}
            Expression::String(_) => {
                if !value.is_single_string() {
                    self.error("Constant strings cannot contain any logic.");
                }
            }
            _ => self.error("initial value for a constant must be a number or divert target"),
        }

        Some(Node::new(NodeKind::ConstDeclaration { name, value }))
    }

    /// `INCLUDE filename`
    pub(super) fn include_statement(&mut self) -> Option<Node> {
        self.whitespace();
        self.parse_string("INCLUDE")?;
        self.whitespace();

        let filename = self
            .expect(
                |p| p.parse_until_characters_from_string("\n\r"),
                "filename for include statement",
            )
            .unwrap_or_default();
        let filename = filename.trim_end_matches(|ch: char| ch == ' ' || ch == '\t');

        Some(Node::new(NodeKind::Include(filename.to_string())))
    }
}
