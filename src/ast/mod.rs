mod content;
mod expression;
mod weave;

pub use content::trim_end_whitespace;
pub use expression::{BinaryOperator, Expression, UnaryOperator};
pub use weave::arrange_weave;

use std::{
    fmt::{Debug, Display},
    ops::{Deref, DerefMut},
};

use itertools::Itertools;

use crate::source::DebugMetadata;

/// A parsed object together with where it came from.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub debug_metadata: Option<DebugMetadata>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            debug_metadata: None,
        }
    }
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text(text.into()))
    }
    pub fn is_text(&self) -> bool {
        matches!(self.kind, NodeKind::Text(_))
    }
    pub fn is_flow(&self) -> bool {
        matches!(self.kind, NodeKind::Flow(_))
    }

    /// Indentation depth of a choice or gather.
    pub fn weave_depth(&self) -> Option<usize> {
        match &self.kind {
            NodeKind::Choice(choice) => Some(choice.depth),
            NodeKind::Gather(gather) => Some(gather.depth),
            _ => None,
        }
    }

    /// The nested content owned by a choice or gather.
    pub fn weave_body_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.kind {
            NodeKind::Choice(choice) => Some(&mut choice.body),
            NodeKind::Gather(gather) => Some(&mut gather.body),
            _ => None,
        }
    }
}

impl From<NodeKind> for Node {
    fn from(kind: NodeKind) -> Self {
        Self::new(kind)
    }
}

impl Deref for Node {
    type Target = NodeKind;

    fn deref(&self) -> &Self::Target {
        &self.kind
    }
}
impl DerefMut for Node {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.kind
    }
}

// Source positions are annotations, not structure.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}
impl Eq for Node {}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.kind, f)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum NodeKind {
    Text(String),
    Glue,
    Tag(String),
    Divert(Divert),
    TunnelOnwards(Option<Divert>),
    Choice(Choice),
    Gather(Gather),
    Flow(Flow),
    Sequence(Sequence),
    Conditional(Conditional),
    /// `{expression}` inside content.
    Output(Expression),
    /// `~ expression` on a logic line.
    Logic(Expression),
    VariableAssignment(VariableAssignment),
    ConstDeclaration {
        name: String,
        value: Expression,
    },
    Return(Option<Expression>),
    Include(String),
    ExternalDeclaration(ExternalDeclaration),
    AuthorWarning(String),
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => {
                f.write_str("\"")?;
                f.write_str(&text.replace('\n', "\\n").replace('\"', "\\\""))?;
                f.write_str("\"")
            }
            Self::Glue => f.write_str("<>"),
            Self::Tag(tag) => write!(f, "(# {})", tag),
            Self::Divert(divert) => Display::fmt(divert, f),
            Self::TunnelOnwards(None) => f.write_str("(->->)"),
            Self::TunnelOnwards(Some(divert)) => write!(f, "(->-> {})", divert),
            Self::Choice(choice) => Display::fmt(choice, f),
            Self::Gather(gather) => Display::fmt(gather, f),
            Self::Flow(flow) => Display::fmt(flow, f),
            Self::Sequence(sequence) => Display::fmt(sequence, f),
            Self::Conditional(conditional) => Display::fmt(conditional, f),
            Self::Output(expression) => write!(f, "(out {})", expression),
            Self::Logic(expression) => write!(f, "(~ {})", expression),
            Self::VariableAssignment(assignment) => Display::fmt(assignment, f),
            Self::ConstDeclaration { name, value } => write!(f, "(CONST {} {})", name, value),
            Self::Return(None) => f.write_str("(return)"),
            Self::Return(Some(value)) => write!(f, "(return {})", value),
            Self::Include(filename) => write!(f, "(INCLUDE {})", filename),
            Self::ExternalDeclaration(external) => Display::fmt(external, f),
            Self::AuthorWarning(message) => write!(f, "(TODO {:?})", message),
        }
    }
}

fn write_list(f: &mut std::fmt::Formatter<'_>, parts: Vec<String>) -> std::fmt::Result {
    write!(f, "({})", parts.join(" "))
}

fn content_part(label: &str, content: &[Node]) -> String {
    if content.is_empty() {
        format!("({})", label)
    } else {
        format!("({} {})", label, content.iter().join(" "))
    }
}

/// The parsed top level of one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    pub content: Vec<Node>,
}

impl Story {
    pub fn new(content: Vec<Node>) -> Self {
        Self {
            content: arrange_weave(content),
        }
    }
}

impl Display for Story {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for node in self.content.iter() {
            writeln!(f, "{}", node)?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum FlowLevel {
    Knot,
    Stitch,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct FlowArgument {
    pub name: String,
    pub is_by_reference: bool,
    pub is_divert_target: bool,
}

impl Display for FlowArgument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_by_reference {
            f.write_str("ref ")?;
        }
        if self.is_divert_target {
            f.write_str("-> ")?;
        }
        f.write_str(&self.name)
    }
}

/// A knot or a stitch.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Flow {
    pub level: FlowLevel,
    pub name: String,
    pub arguments: Vec<FlowArgument>,
    pub is_function: bool,
    pub content: Vec<Node>,
}

impl Flow {
    pub fn new(
        level: FlowLevel,
        name: String,
        arguments: Vec<FlowArgument>,
        is_function: bool,
        content: Vec<Node>,
    ) -> Self {
        Self {
            level,
            name,
            arguments,
            is_function,
            content: arrange_weave(content),
        }
    }
}

impl Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec![self.level.to_string()];
        if self.is_function {
            parts.push("function".to_string());
        }
        parts.push(self.name.clone());
        if !self.arguments.is_empty() {
            parts.push(format!("[{}]", self.arguments.iter().join(", ")));
        }
        parts.extend(self.content.iter().map(|node| node.to_string()));
        write_list(f, parts)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Divert {
    /// Dotted path components; `None` for the empty divert `->`.
    pub target: Option<Vec<String>>,
    pub arguments: Vec<Expression>,
    pub is_tunnel: bool,
    pub is_thread: bool,
}

impl Divert {
    pub fn new(target: Vec<String>, arguments: Vec<Expression>) -> Self {
        Self {
            target: Some(target),
            arguments,
            is_tunnel: false,
            is_thread: false,
        }
    }
    pub fn empty() -> Self {
        Self {
            target: None,
            arguments: vec![],
            is_tunnel: false,
            is_thread: false,
        }
    }
    pub fn is_empty(&self) -> bool {
        self.target.is_none()
    }
    pub fn target_name(&self) -> String {
        self.target
            .as_ref()
            .map(|target| target.join("."))
            .unwrap_or_default()
    }
}

impl Display for Divert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let head = if self.is_thread {
            "thread"
        } else if self.is_tunnel {
            "tunnel"
        } else {
            "divert"
        };
        let mut parts = vec![head.to_string()];
        if let Some(target) = &self.target {
            parts.push(target.join("."));
        }
        parts.extend(self.arguments.iter().map(|arg| arg.to_string()));
        write_list(f, parts)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Choice {
    pub name: Option<String>,
    pub depth: usize,
    pub once_only: bool,
    pub condition: Option<Expression>,
    pub start_content: Option<Vec<Node>>,
    pub choice_only_content: Option<Vec<Node>>,
    pub inner_content: Option<Vec<Node>>,
    pub diverts: Vec<Node>,
    pub tags: Vec<String>,
    pub has_weave_style_inline_brackets: bool,
    pub is_invisible_default: bool,
    /// Content nested under the choice by indentation.
    pub body: Vec<Node>,
}

impl Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bullet = if self.once_only { "*" } else { "+" };
        let mut parts = vec![bullet.repeat(self.depth)];
        if let Some(name) = &self.name {
            parts.push(format!("(label {})", name));
        }
        if let Some(condition) = &self.condition {
            parts.push(format!("(if {})", condition));
        }
        if let Some(content) = &self.start_content {
            parts.push(content_part("start", content));
        }
        if let Some(content) = &self.choice_only_content {
            parts.push(content_part("option", content));
        }
        if let Some(content) = &self.inner_content {
            parts.push(content_part("inner", content));
        }
        parts.extend(self.diverts.iter().map(|divert| divert.to_string()));
        parts.extend(self.tags.iter().map(|tag| format!("(# {})", tag)));
        if self.is_invisible_default {
            parts.push("(default)".to_string());
        }
        parts.extend(self.body.iter().map(|node| node.to_string()));
        write_list(f, parts)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Gather {
    pub name: Option<String>,
    pub depth: usize,
    pub body: Vec<Node>,
}

impl Display for Gather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec!["-".repeat(self.depth)];
        if let Some(name) = &self.name {
            parts.push(format!("(label {})", name));
        }
        parts.extend(self.body.iter().map(|node| node.to_string()));
        write_list(f, parts)
    }
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SequenceType {
    Stopping,
    Cycle,
    Shuffle,
    Once,
}

impl SequenceType {
    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '!' => Some(SequenceType::Once),
            '&' => Some(SequenceType::Cycle),
            '~' => Some(SequenceType::Shuffle),
            '$' => Some(SequenceType::Stopping),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Sequence {
    /// Never empty; several types combine, e.g. `{&~ a|b}`.
    pub types: Vec<SequenceType>,
    pub alternatives: Vec<Vec<Node>>,
}

impl Display for Sequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec!["sequence".to_string(), self.types.iter().join("+")];
        parts.extend(
            self.alternatives
                .iter()
                .map(|alternative| format!("({})", alternative.iter().join(" "))),
        );
        write_list(f, parts)
    }
}

#[derive(Debug, Clone)]
pub struct ConditionalBranch {
    /// The branch's own condition (`- x > 2:`).
    pub condition: Option<Expression>,
    pub content: Vec<Node>,
    pub is_true_branch: bool,
    pub is_else: bool,
    pub is_inline: bool,
    /// Compared against the conditional's initial expression, switch style.
    pub matching_equality: bool,
    pub debug_metadata: Option<DebugMetadata>,
}

impl ConditionalBranch {
    pub fn new(condition: Option<Expression>, content: Vec<Node>) -> Self {
        Self {
            condition,
            content: arrange_weave(content),
            is_true_branch: false,
            is_else: false,
            is_inline: false,
            matching_equality: false,
            debug_metadata: None,
        }
    }
}

impl PartialEq for ConditionalBranch {
    fn eq(&self, other: &Self) -> bool {
        self.condition == other.condition
            && self.content == other.content
            && self.is_true_branch == other.is_true_branch
            && self.is_else == other.is_else
            && self.is_inline == other.is_inline
            && self.matching_equality == other.matching_equality
    }
}
impl Eq for ConditionalBranch {}

impl Display for ConditionalBranch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match (&self.condition, self.matching_equality) {
            _ if self.is_else => "else".to_string(),
            (Some(condition), true) => format!("case {}", condition),
            (Some(condition), false) => format!("when {}", condition),
            (None, _) if self.is_true_branch => "true".to_string(),
            (None, _) => "branch".to_string(),
        };
        f.write_str(&content_part(&label, &self.content))
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Conditional {
    pub initial_condition: Option<Expression>,
    pub branches: Vec<ConditionalBranch>,
}

impl Display for Conditional {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec!["cond".to_string()];
        if let Some(condition) = &self.initial_condition {
            parts.push(condition.to_string());
        }
        parts.extend(self.branches.iter().map(|branch| branch.to_string()));
        write_list(f, parts)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VariableAssignment {
    pub name: String,
    pub value: Expression,
    pub is_new_temporary: bool,
    pub is_global_declaration: bool,
}

impl Display for VariableAssignment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let head = if self.is_global_declaration {
            "VAR"
        } else if self.is_new_temporary {
            "temp"
        } else {
            "="
        };
        write!(f, "({} {} {})", head, self.name, self.value)
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ExternalDeclaration {
    pub name: String,
    pub arguments: Vec<String>,
}

impl Display for ExternalDeclaration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = vec!["EXTERNAL".to_string(), self.name.clone()];
        parts.extend(self.arguments.iter().cloned());
        write_list(f, parts)
    }
}
