use super::InkParser;
use crate::{
    ast::{trim_end_whitespace, BinaryOperator, Choice, Expression, Gather, Node, NodeKind},
    string_parser::Combinators,
};

impl InkParser {
    /// `* (label) {condition} start [choice only] inner -> divert # tag`
    pub(super) fn choice(&mut self) -> Option<Node> {
        self.whitespace();
        let (depth, once_only) = match self.choice_bullets("*") {
            Some(depth) => (depth, true),
            None => (self.choice_bullets("+")?, false),
        };

        if self.parsing_choice > 0 {
            self.error("Choices can't be nested inside the content of another choice");
            return None;
        }

        let name = self.parse(Self::bracketed_name);
        self.whitespace();
        let condition = self.parse(Self::choice_condition);
        self.whitespace();

        self.parsing_choice += 1;

        let mut start_content = self.parse(Self::mixed_text_and_logic);
        let mut choice_only_content = None;
        let mut inner_content = None;

        let has_weave_style_inline_brackets = self.parse_string("[").is_some();
        if has_weave_style_inline_brackets {
            choice_only_content = self.parse(Self::mixed_text_and_logic);
            self.expect(|p| p.parse_string("]"), "closing ']' for weave-style option");
            inner_content = self.parse(Self::mixed_text_and_logic);
        }

        let richest = if inner_content.is_some() {
            &mut inner_content
        } else if choice_only_content.is_some() {
            &mut choice_only_content
        } else {
            &mut start_content
        };
        trim_content_end(richest);

        if let Some(inner) = inner_content.as_mut() {
            inner.push(Node::text("\n"));
        }

        let is_invisible_default = start_content.is_none() && choice_only_content.is_none();

        self.whitespace();
        let divert = self.parse(|p| {
            p.single_divert()
                .map(|divert| Node::new(NodeKind::Divert(divert)))
        });
        self.parsing_choice -= 1;
        self.whitespace();

        if start_content.is_none()
            && choice_only_content.is_none()
            && inner_content.is_none()
            && divert.is_none()
        {
            self.warning(
                "Choice is completely empty. Interpretting as a default fallback choice. \
                 Add a divert arrow to remove this warning: * ->",
            );
        }
        if start_content.is_none() && has_weave_style_inline_brackets && choice_only_content.is_none() {
            self.warning("Blank choice - if you intended a default fallback choice, use the `* ->` syntax");
        }

        let diverts = divert
            .into_iter()
            .filter(|node| !matches!(&node.kind, NodeKind::Divert(divert) if divert.is_empty()))
            .collect();
        let tags = self.parse(Self::tags).unwrap_or_default();

        Some(Node::new(NodeKind::Choice(Choice {
            name,
            depth,
            once_only,
            condition,
            start_content,
            choice_only_content,
            inner_content,
            diverts,
            tags,
            has_weave_style_inline_brackets,
            is_invisible_default,
            body: Vec::new(),
        })))
    }

    /// Counts `*`s (or `+`s), which may be separated by spaces.
    fn choice_bullets(&mut self, bullet: &'static str) -> Option<usize> {
        self.interleave_separated(
            |p| p.parse_string(bullet),
            |p| p.optional_exclude(Self::whitespace),
        )
        .map(|bullets| bullets.len())
    }

    /// `(name)`
    pub(super) fn bracketed_name(&mut self) -> Option<String> {
        self.parse_string("(")?;
        self.whitespace();
        let name = self.identifier()?;
        self.whitespace();
        self.expect(|p| p.parse_string(")"), "closing ')' for bracketed name");
        Some(name)
    }

    /// One or more `{condition}`s, and-ed together.
    fn choice_condition(&mut self) -> Option<Expression> {
        let conditions =
            self.interleave_separated(Self::choice_single_condition, Self::choice_conditions_space)?;
        conditions
            .into_iter()
            .reduce(|left, right| Expression::binary(left, BinaryOperator::And, right))
    }

    fn choice_conditions_space(&mut self) -> Option<()> {
        self.newline();
        self.whitespace();
        Some(())
    }

    fn choice_single_condition(&mut self) -> Option<Expression> {
        self.parse_string("{")?;
        let condition = self.expect(Self::expression, "choice condition inside { }");
        if let Some(condition) = &condition {
            self.disallow_increment(condition);
        }
        self.expect(|p| p.parse_string("}"), "closing '}' for choice condition");
        condition
    }

    /// `-`, `- -`, `--(label)`
    pub(super) fn gather(&mut self) -> Option<Node> {
        let depth = self.parse(Self::gather_dashes)?;
        let name = self.parse(Self::bracketed_name);
        self.newline();

        Some(Node::new(NodeKind::Gather(Gather {
            name,
            depth,
            body: Vec::new(),
        })))
    }

    pub(super) fn gather_dashes(&mut self) -> Option<usize> {
        self.whitespace();
        let mut depth = 0;
        while self.dash_not_arrow().is_some() {
            depth += 1;
            self.whitespace();
        }
        (depth > 0).then_some(depth)
    }

    /// A `-` that does not start a `->`.
    pub(super) fn dash_not_arrow(&mut self) -> Option<()> {
        self.parse(|p| {
            if p.parse_string("->").is_some() {
                return None;
            }
            (p.parse_single_character()? == '-').then_some(())
        })
    }
}

fn trim_content_end(content: &mut Option<Vec<Node>>) {
    if let Some(nodes) = content {
        trim_end_whitespace(nodes, false);
        if nodes.is_empty() {
            *content = None;
        }
    }
}
