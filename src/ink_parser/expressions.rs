use lazy_static::lazy_static;

use super::InkParser;
use crate::{
    ast::{BinaryOperator, Expression, Node, NodeKind, UnaryOperator},
    char_set::CharacterSet,
    string_parser::{Combinators, Rule},
};

lazy_static! {
    static ref PREFIX_SYMBOLS: CharacterSet = CharacterSet::from("-!");
}

struct InfixOperator {
    symbol: &'static str,
    precedence: u8,
    /// Word operators like `and` need whitespace after them.
    require_whitespace: bool,
}

const fn infix(symbol: &'static str, precedence: u8, require_whitespace: bool) -> InfixOperator {
    InfixOperator {
        symbol,
        precedence,
        require_whitespace,
    }
}

/// Tried in order, so `<=` has to come before `<`.
const INFIX_OPERATORS: &[InfixOperator] = &[
    infix("&&", 1, false),
    infix("||", 1, false),
    infix("and", 1, true),
    infix("or", 1, true),
    infix("==", 2, false),
    infix(">=", 2, false),
    infix("<=", 2, false),
    infix("<", 2, false),
    infix(">", 2, false),
    infix("!=", 2, false),
    infix("?", 3, false),
    infix("has", 3, true),
    infix("!?", 3, false),
    infix("hasnt", 3, true),
    infix("^", 3, false),
    infix("+", 4, false),
    infix("-", 5, false),
    infix("*", 6, false),
    infix("/", 7, false),
    infix("%", 8, false),
    infix("mod", 8, true),
];

const RESERVED_KEYWORDS: &[&str] = &[
    "true", "false", "not", "return", "else", "VAR", "CONST", "temp", "LIST", "function",
];

impl InkParser {
    pub(super) fn expression(&mut self) -> Option<Expression> {
        self.expression_with_precedence(0)
    }

    /// Precedence climbing: keeps absorbing infix operators that bind more
    /// tightly than `minimum_precedence`.
    fn expression_with_precedence(&mut self, minimum_precedence: u8) -> Option<Expression> {
        self.whitespace();
        let mut expression = self.expression_unary()?;
        self.whitespace();

        loop {
            let rule_id = self.begin_rule();

            let (operator, precedence) = match self.parse(Self::infix_operator) {
                Some((operator, precedence)) if precedence > minimum_precedence => {
                    (operator, precedence)
                }
                _ => {
                    self.fail_rule::<()>(rule_id);
                    break;
                }
            };

            let message = format!("right side of '{}' expression", operator);
            let left = expression;
            match self.expect(
                move |p| p.expression_infix_right(left, operator, precedence),
                &message,
            ) {
                Some(combined) => expression = self.succeed_rule(rule_id, combined)?,
                None => return self.fail_rule(rule_id),
            }
        }

        self.whitespace();
        Some(expression)
    }

    fn infix_operator(&mut self) -> Option<(BinaryOperator, u8)> {
        INFIX_OPERATORS.iter().find_map(|infix| {
            self.parse(|p| {
                p.parse_string(infix.symbol)?;
                if infix.require_whitespace {
                    p.whitespace()?;
                }
                let operator = infix.symbol.parse::<BinaryOperator>().ok()?;
                Some((operator, infix.precedence))
            })
        })
    }

    fn expression_infix_right(
        &mut self,
        left: Expression,
        operator: BinaryOperator,
        precedence: u8,
    ) -> Option<Expression> {
        self.whitespace();
        let right = self.parse(|p| p.expression_with_precedence(precedence))?;
        Some(Expression::binary(left, operator, right))
    }

    fn expression_unary(&mut self) -> Option<Expression> {
        if let Some(target) = self.parse(Self::expression_divert_target) {
            return Some(target);
        }

        let prefix = self.parse(Self::prefix_operator);
        self.whitespace();

        let rules: [Rule<Self, Expression>; 4] = [
            Self::expression_paren,
            Self::expression_function_call,
            Self::expression_variable_name,
            Self::expression_literal,
        ];
        let mut expression = self.one_of(&rules);

        // `- -x`, `not !x`
        if expression.is_none() && prefix.is_some() {
            expression = self.expression_unary();
        }
        let mut expression = expression?;

        if let Some(operator) = prefix {
            expression = Expression::unary(operator, expression);
        }

        self.whitespace();

        if let Some(is_increment) = self.parse(Self::postfix_operator) {
            match expression {
                Expression::Variable(path) => {
                    expression = Expression::IncDec {
                        name: path.join("."),
                        is_increment,
                        amount: None,
                    };
                }
                other => {
                    self.error(&format!(
                        "can only increment and decrement variables, but saw '{}'",
                        other
                    ));
                    expression = other;
                }
            }
        }

        Some(expression)
    }

    fn prefix_operator(&mut self) -> Option<UnaryOperator> {
        let symbol = self
            .parse_characters_from_set(&PREFIX_SYMBOLS, true, Some(1))
            .or_else(|| self.identifier())?;
        symbol.parse().ok()
    }

    fn postfix_operator(&mut self) -> Option<bool> {
        if self.parse_string("++").is_some() {
            Some(true)
        } else if self.parse_string("--").is_some() {
            Some(false)
        } else {
            None
        }
    }

    fn expression_divert_target(&mut self) -> Option<Expression> {
        self.whitespace();
        let divert = self.parse(Self::single_divert)?;
        if divert.is_thread {
            return None;
        }
        self.whitespace();
        Some(Expression::DivertTarget(Box::new(divert)))
    }

    fn expression_paren(&mut self) -> Option<Expression> {
        self.parse_string("(")?;
        let inner = self.parse(Self::expression)?;
        self.whitespace();
        self.expect(|p| p.parse_string(")"), "closing parenthesis ')' for expression");
        Some(inner)
    }

    fn expression_function_call(&mut self) -> Option<Expression> {
        let name = self.identifier()?;
        self.whitespace();
        let arguments = self.parse(Self::expression_function_call_arguments)?;
        Some(Expression::FunctionCall { name, arguments })
    }

    /// `(a, b + 1)`
    pub(super) fn expression_function_call_arguments(&mut self) -> Option<Vec<Expression>> {
        self.parse_string("(")?;
        let arguments = self
            .interleave_separated(Self::expression, |p| p.parse_string(","))
            .unwrap_or_default();
        self.whitespace();
        self.expect(|p| p.parse_string(")"), "closing ')' for function call");
        Some(arguments)
    }

    /// `name` or `a.b.c`; keywords are not variables.
    fn expression_variable_name(&mut self) -> Option<Expression> {
        let path = self.interleave_separated(Self::identifier, |p| p.parse_string("."))?;
        if RESERVED_KEYWORDS.contains(&path.first()?.as_str()) {
            return None;
        }
        Some(Expression::Variable(path))
    }

    fn expression_literal(&mut self) -> Option<Expression> {
        self.one_of(&[
            Self::expression_float,
            Self::expression_int,
            Self::expression_bool,
            Self::expression_string,
        ])
    }

    fn expression_float(&mut self) -> Option<Expression> {
        self.parse_float()
            .map(|value| Expression::Literal(value.into()))
    }

    fn expression_int(&mut self) -> Option<Expression> {
        self.parse_int()
            .map(|value| Expression::Literal(value.into()))
    }

    fn expression_bool(&mut self) -> Option<Expression> {
        match self.identifier()?.as_str() {
            "true" => Some(Expression::Literal(true.into())),
            "false" => Some(Expression::Literal(false.into())),
            _ => None,
        }
    }

    /// `"text {logic} text"`; diverts are not allowed inside.
    fn expression_string(&mut self) -> Option<Expression> {
        self.parse_string("\"")?;

        let was_parsing_string = self.parsing_string_expression;
        self.parsing_string_expression = true;
        let content = self.parse(Self::mixed_text_and_logic);
        self.expect(|p| p.parse_string("\""), "close quote for string expression");
        self.parsing_string_expression = was_parsing_string;

        let content = content.unwrap_or_else(|| vec![Node::text("")]);
        if content
            .iter()
            .any(|node| matches!(node.kind, NodeKind::Divert(_) | NodeKind::TunnelOnwards(_)))
        {
            self.error("String expressions cannot contain diverts (->)");
        }

        Some(Expression::String(content))
    }

    /// Increments only make sense as statements on a `~` line.
    pub(super) fn disallow_increment(&mut self, expression: &Expression) {
        if expression.is_inc_dec() {
            self.error("Can't use increment/decrement here. It can only be used on a ~ line");
        }
    }
}
