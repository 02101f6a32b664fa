/// Identifies the stack element pushed by one rule invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleId(usize);

/// One snapshot of the parse position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateElement {
    pub character_index: usize,
    pub line_index: usize,
    pub reported_error_in_scope: bool,
    pub custom_flags: u32,
    unique_id: usize,
}

impl StateElement {
    fn root() -> Self {
        Self {
            character_index: 0,
            line_index: 0,
            reported_error_in_scope: false,
            custom_flags: 0,
            unique_id: 0,
        }
    }

    /// Position and flags only; the rule identity is not part of a
    /// snapshot's observable state.
    pub fn same_position(&self, other: &StateElement) -> bool {
        self.character_index == other.character_index
            && self.line_index == other.line_index
            && self.reported_error_in_scope == other.reported_error_in_scope
            && self.custom_flags == other.custom_flags
    }
}

/// The rollback stack. The bottom element always exists; every rule pushes
/// one element on entry and either pops it (failure, lookahead) or squashes
/// it into its parent (success).
#[derive(Debug)]
pub struct ParserState {
    stack: Vec<StateElement>,
    id_counter: usize,
}

impl ParserState {
    pub fn new() -> Self {
        Self {
            stack: vec![StateElement::root()],
            id_counter: 0,
        }
    }

    pub fn height(&self) -> usize {
        self.stack.len()
    }

    pub fn current(&self) -> &StateElement {
        self.stack.last().expect("parser state stack is never empty")
    }

    pub fn current_mut(&mut self) -> &mut StateElement {
        self.stack
            .last_mut()
            .expect("parser state stack is never empty")
    }

    pub fn push(&mut self) -> RuleId {
        self.id_counter += 1;
        let element = StateElement {
            unique_id: self.id_counter,
            reported_error_in_scope: false,
            ..*self.current()
        };
        self.stack.push(element);
        RuleId(self.id_counter)
    }

    pub fn pop(&mut self, expected: RuleId) {
        assert!(
            self.stack.len() > 1,
            "Attempting to remove final stack element is illegal! Mismatched Begin/Succeed/Fail?"
        );
        self.check_rule_id(expected);
        self.stack.pop();
    }

    pub fn peek(&self, expected: RuleId) -> &StateElement {
        self.check_rule_id(expected);
        self.current()
    }

    pub fn peek_penultimate(&self) -> Option<&StateElement> {
        self.stack.len().checked_sub(2).map(|idx| &self.stack[idx])
    }

    /// Collapses the top two elements into one that keeps the top element's
    /// position, flags and error state under the parent's identity.
    pub fn squash(&mut self) {
        assert!(
            self.stack.len() > 1,
            "Attempting to remove final stack element is illegal! Mismatched Begin/Succeed/Fail?"
        );
        if let Some(last) = self.stack.pop() {
            let parent = self.current_mut();
            parent.character_index = last.character_index;
            parent.line_index = last.line_index;
            parent.reported_error_in_scope = last.reported_error_in_scope;
            parent.custom_flags = last.custom_flags;
        }
    }

    /// Marks every open scope as having reported an error, so enclosing
    /// rules stay quiet until a fresh scope is opened.
    pub fn note_error_reported(&mut self) {
        for element in self.stack.iter_mut() {
            element.reported_error_in_scope = true;
        }
    }

    pub fn error_reported_already_in_scope(&self) -> bool {
        self.current().reported_error_in_scope
    }

    fn check_rule_id(&self, expected: RuleId) {
        assert_eq!(
            self.current().unique_id,
            expected.0,
            "Mismatched rule IDs - do you have mismatched Begin/Succeed/Fail?"
        );
    }
}

impl Default for ParserState {
    fn default() -> Self {
        Self::new()
    }
}
