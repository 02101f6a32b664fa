use std::fmt::Display;

use itertools::Itertools;

use super::{Divert, Node};
use crate::value::Value;

#[derive(Debug, PartialEq, Eq, Clone, Copy, strum::Display, strum::EnumString)]
pub enum BinaryOperator {
    #[strum(to_string = "&&", serialize = "and")]
    And,
    #[strum(to_string = "||", serialize = "or")]
    Or,
    #[strum(to_string = "==")]
    Equal,
    #[strum(to_string = "!=")]
    NotEqual,
    #[strum(to_string = "<")]
    Less,
    #[strum(to_string = ">")]
    Greater,
    #[strum(to_string = "<=")]
    LessOrEqual,
    #[strum(to_string = ">=")]
    GreaterOrEqual,
    #[strum(to_string = "?", serialize = "has")]
    Has,
    #[strum(to_string = "!?", serialize = "hasnt")]
    Hasnt,
    #[strum(to_string = "^")]
    Intersect,
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "-")]
    Subtract,
    #[strum(to_string = "*")]
    Multiply,
    #[strum(to_string = "/")]
    Divide,
    #[strum(to_string = "%", serialize = "mod")]
    Modulo,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, strum::Display, strum::EnumString)]
pub enum UnaryOperator {
    #[strum(to_string = "-")]
    Negate,
    #[strum(to_string = "!", serialize = "not")]
    Not,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Expression {
    Literal(Value),
    /// A quoted string, which may interpolate inline logic.
    String(Vec<Node>),
    Variable(Vec<String>),
    FunctionCall {
        name: String,
        arguments: Vec<Expression>,
    },
    DivertTarget(Box<Divert>),
    Unary {
        operator: UnaryOperator,
        operand: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        operator: BinaryOperator,
        right: Box<Expression>,
    },
    /// `x++`, `x--`, `x += e` and `x -= e`.
    IncDec {
        name: String,
        is_increment: bool,
        amount: Option<Box<Expression>>,
    },
}

impl Expression {
    pub fn binary(left: Expression, operator: BinaryOperator, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    /// Wraps `operand`, folding negation straight into numeric literals.
    pub fn unary(operator: UnaryOperator, operand: Expression) -> Self {
        if let (UnaryOperator::Negate, Expression::Literal(value)) = (operator, &operand) {
            if let Some(negated) = value.negated() {
                return Expression::Literal(negated);
            }
        }
        Expression::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn is_function_call(&self) -> bool {
        matches!(self, Expression::FunctionCall { .. })
    }

    pub fn is_inc_dec(&self) -> bool {
        matches!(self, Expression::IncDec { .. })
    }

    /// Whether a function is called anywhere inside this expression.
    pub fn contains_function_call(&self) -> bool {
        match self {
            Expression::FunctionCall { .. } => true,
            Expression::Unary { operand, .. } => operand.contains_function_call(),
            Expression::Binary { left, right, .. } => {
                left.contains_function_call() || right.contains_function_call()
            }
            Expression::IncDec { amount, .. } => amount
                .as_ref()
                .map_or(false, |amount| amount.contains_function_call()),
            Expression::Literal(_)
            | Expression::String(_)
            | Expression::Variable(_)
            | Expression::DivertTarget(_) => false,
        }
    }

    /// A string literal without any interpolated logic.
    pub fn is_single_string(&self) -> bool {
        match self {
            Expression::String(content) => content.iter().all(|node| node.is_text()),
            _ => false,
        }
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(value) => Display::fmt(value, f),
            Self::String(content) => write!(f, "(str {})", content.iter().join(" ")),
            Self::Variable(path) => f.write_str(&path.join(".")),
            Self::FunctionCall { name, arguments } if arguments.is_empty() => {
                write!(f, "(call {})", name)
            }
            Self::FunctionCall { name, arguments } => {
                write!(f, "(call {} {})", name, arguments.iter().join(" "))
            }
            Self::DivertTarget(divert) => write!(f, "(-> {})", divert.target_name()),
            Self::Unary { operator, operand } => write!(f, "({} {})", operator, operand),
            Self::Binary {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", operator, left, right),
            Self::IncDec {
                name,
                is_increment,
                amount: None,
            } => write!(f, "({} {})", if *is_increment { "++" } else { "--" }, name),
            Self::IncDec {
                name,
                is_increment,
                amount: Some(amount),
            } => write!(
                f,
                "({} {} {})",
                if *is_increment { "+=" } else { "-=" },
                name,
                amount
            ),
        }
    }
}
