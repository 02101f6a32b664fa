use super::{InkParser, StatementLevel};
use crate::{
    ast::{Conditional, ConditionalBranch, Expression, Node, NodeKind, Sequence},
    string_parser::{Combinators, Rule},
};

impl InkParser {
    /// `{ ... }` inside content.
    pub(super) fn inline_logic(&mut self) -> Option<Node> {
        self.parse_string("{")?;
        self.whitespace();

        let logic = self.expect(
            Self::inner_logic,
            "some kind of logic, conditional or sequence within braces: { ... }",
        )?;
        if let NodeKind::Output(expression) = &logic.kind {
            self.disallow_increment(expression);
        }

        self.whitespace();
        self.expect(|p| p.parse_string("}"), "closing brace '}' for inline logic");

        Some(logic)
    }

    fn inner_logic(&mut self) -> Option<Node> {
        self.whitespace();

        // An explicit annotation commits to a sequence, even one with a
        // single element.
        if let Some(types) = self.parse(Self::sequence_type_annotation) {
            let alternatives = self.expect(
                Self::inner_sequence_objects,
                "sequence elements (for cycle/stoping etc)",
            )?;
            return Some(Node::new(NodeKind::Sequence(Sequence {
                types,
                alternatives,
            })));
        }

        if let Some(condition) = self.parse(Self::condition_expression) {
            return self.expect(
                move |p| p.inner_conditional_content_with_query(Some(condition)),
                "conditional content following query",
            );
        }

        // Without an explicit marker each reading only counts if the braces
        // close right after it.
        let rules: [Rule<Self, Node>; 3] = [
            Self::inner_conditional_content,
            Self::inner_sequence,
            Self::inner_expression,
        ];
        for rule in rules {
            let rule_id = self.begin_rule();
            if let Some(result) = self.parse(rule) {
                if self
                    .peek(|p| p.spaced(|p| p.parse_string("}")))
                    .is_some()
                {
                    return self.succeed_rule(rule_id, result);
                }
            }
            self.fail_rule::<()>(rule_id);
        }

        None
    }

    fn inner_expression(&mut self) -> Option<Node> {
        self.expression()
            .map(|expression| Node::new(NodeKind::Output(expression)))
    }

    /// `expression :`
    fn condition_expression(&mut self) -> Option<Expression> {
        let expression = self.parse(Self::expression)?;
        self.disallow_increment(&expression);
        self.whitespace();
        self.parse_string(":")?;
        Some(expression)
    }

    fn else_expression(&mut self) -> Option<()> {
        self.parse_string("else")?;
        self.whitespace();
        self.parse_string(":")
    }

    fn inner_conditional_content(&mut self) -> Option<Node> {
        let initial_condition = self.parse(Self::condition_expression);
        self.inner_conditional_content_with_query(initial_condition)
    }

    fn inner_conditional_content_with_query(
        &mut self,
        initial_condition: Option<Expression>,
    ) -> Option<Node> {
        let has_query = initial_condition.is_some();
        let is_inline = self.parse(Self::newline).is_none();

        // `{a|b}` without a query is a sequence.
        if is_inline && !has_query {
            return None;
        }

        let mut branches = if is_inline {
            self.inline_conditional_branches()?
        } else {
            let mut branches = match self.parse(Self::multiline_conditional_branches) {
                Some(mut branches) => {
                    if has_query && branches.len() == 1 && branches[0].is_else {
                        let mut empty_true_branch = ConditionalBranch::new(None, Vec::new());
                        empty_true_branch.is_true_branch = true;
                        branches.insert(0, empty_true_branch);
                    }
                    branches
                }
                None if has_query => self.sole_content_branches()?,
                None => return None,
            };
            self.resolve_branch_kinds(&mut branches, has_query);
            branches
        };

        for branch in branches.iter_mut() {
            branch.is_inline = is_inline;
        }

        Some(Node::new(NodeKind::Conditional(Conditional {
            initial_condition,
            branches,
        })))
    }

    /// `{x: a|b}`
    fn inline_conditional_branches(&mut self) -> Option<Vec<ConditionalBranch>> {
        let contents =
            self.interleave_separated(Self::mixed_text_and_logic, |p| p.parse_string("|"))?;

        if contents.len() > 2 {
            self.error("Expected one or two alternatives separated by '|' in inline conditional");
            return Some(Vec::new());
        }

        let mut contents = contents.into_iter();
        let mut branches = Vec::new();
        if let Some(content) = contents.next() {
            let mut true_branch = ConditionalBranch::new(None, content);
            true_branch.is_true_branch = true;
            branches.push(true_branch);
        }
        if let Some(content) = contents.next() {
            let mut else_branch = ConditionalBranch::new(None, content);
            else_branch.is_else = true;
            branches.push(else_branch);
        }
        Some(branches)
    }

    fn multiline_conditional_branches(&mut self) -> Option<Vec<ConditionalBranch>> {
        self.multiline_whitespace();
        let branches = self.one_or_more(Self::single_multiline_condition)?;
        self.multiline_whitespace();
        Some(branches)
    }

    /// `{x:` followed straight by content, then an optional `- else:`.
    fn sole_content_branches(&mut self) -> Option<Vec<ConditionalBranch>> {
        let content = self.statements_at_level(StatementLevel::InnerBlock)?;
        let mut true_branch = ConditionalBranch::new(None, content);
        true_branch.is_true_branch = true;
        let mut branches = vec![true_branch];

        if let Some(mut else_branch) = self.parse(Self::single_multiline_condition) {
            if !else_branch.is_else {
                self.error_at(
                    "Expected an '- else:' clause here rather than an extra condition",
                    else_branch.debug_metadata,
                );
                else_branch.is_else = true;
            }
            branches.push(else_branch);
        }

        Some(branches)
    }

    /// `- condition: content`, `- else: content` or `- content`.
    fn single_multiline_condition(&mut self) -> Option<ConditionalBranch> {
        self.whitespace();
        if self.divert_arrow().is_some() {
            return None;
        }
        self.parse_string("-")?;
        self.whitespace();

        let is_else = self.parse(Self::else_expression).is_some();
        let condition = if is_else {
            None
        } else {
            self.parse(Self::condition_expression)
        };

        let mut content = self.statements_at_level(StatementLevel::InnerBlock);
        if condition.is_none() && content.is_none() {
            self.error("expected content for the conditional branch following '-'");
            content = Some(vec![Node::text("")]);
        }

        self.multiline_whitespace();

        let mut branch = ConditionalBranch::new(condition, content.unwrap_or_default());
        branch.is_else = is_else;
        Some(branch)
    }

    /// Decides which branches are `true`, `else` or switch-style cases, and
    /// reports misplaced `else`s.
    fn resolve_branch_kinds(&mut self, branches: &mut [ConditionalBranch], has_query: bool) {
        let count = branches.len();

        if has_query {
            let mut earlier_branches_have_own_condition = false;
            for index in 0..count {
                let is_last = index + 1 == count;
                let branch = &mut branches[index];
                if branch.condition.is_some() {
                    branch.matching_equality = true;
                    earlier_branches_have_own_condition = true;
                } else if earlier_branches_have_own_condition && is_last {
                    branch.matching_equality = true;
                    branch.is_else = true;
                } else if !is_last && count > 2 {
                    let metadata = branch.debug_metadata;
                    self.error_at("Only final branch can be an 'else'. Did you miss a ':'?", metadata);
                } else if index == 0 {
                    branch.is_true_branch = true;
                } else {
                    branch.is_else = true;
                }
            }
            return;
        }

        for index in 0..count {
            let is_last = index + 1 == count;
            if branches[index].condition.is_some() {
                continue;
            }
            if is_last {
                branches[index].is_else = true;
            } else if branches[index].is_else {
                let last = &branches[count - 1];
                if last.is_else {
                    let metadata = last.debug_metadata;
                    self.error_at(
                        "Multiple 'else' cases. Can have a maximum of one, at the end.",
                        metadata,
                    );
                } else {
                    let metadata = branches[index].debug_metadata;
                    self.error_at("'else' case in conditional should always be the final one", metadata);
                }
            } else {
                let metadata = branches[index].debug_metadata;
                self.error_at("Branch doesn't have condition. Are you missing a ':'? ", metadata);
            }
        }
    }
}
