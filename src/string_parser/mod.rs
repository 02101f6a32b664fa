//! Backtracking string parser.
//!
//! Every rule is a function from the parser to `Option<T>`: `None` means the
//! rule did not match and all of its side effects have been rolled back. A
//! rule that may match without producing anything returns `Option<Option<T>>`
//! and reports "matched, nothing produced" as `Some(None)`.
//!
//! Rules must be invoked through [`Combinators::parse`] (or a combinator built
//! on it) so that every attempt begins with a snapshot of the parse state and
//! ends by either restoring it or merging it into the caller's snapshot.

mod diagnostic;
mod either;
mod state;
#[cfg(test)]
mod tests;

pub use diagnostic::{ErrorHandler, ParseDiagnostic};
pub use either::Either;
pub use state::{ParserState, RuleId, StateElement};

use std::any::{type_name, Any};

use lazy_static::lazy_static;

use crate::{
    char_set::{CharacterSet, ScanStops},
    SourceOffset, SourceReference, SourceSpan,
};

lazy_static! {
    static ref NUMBER_CHARACTERS: CharacterSet = CharacterSet::new().with_range('0', '9');
    static ref NEWLINE_CHARACTERS: CharacterSet = CharacterSet::from("\n\r");
}

/// A rule that can live in a table, e.g. the candidates handed to `one_of`.
pub type Rule<P, T> = fn(&mut P) -> Option<T>;

/// Called after every successful rule with the value it produced and the
/// parse state at the start and end of the rule.
pub trait RuleObserver {
    fn rule_did_succeed(&mut self, result: &mut dyn Any, start: &StateElement, end: &StateElement);
}

impl<F: FnMut(&mut dyn Any, &StateElement, &StateElement)> RuleObserver for F {
    fn rule_did_succeed(&mut self, result: &mut dyn Any, start: &StateElement, end: &StateElement) {
        self(result, start, end)
    }
}

pub struct StringParser {
    chars: Vec<char>,
    state: ParserState,
    had_error: bool,
    error_handler: Option<ErrorHandler>,
    observer: Option<Box<dyn RuleObserver>>,
    source_reference: Option<SourceReference>,
}

impl StringParser {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            state: ParserState::new(),
            had_error: false,
            error_handler: None,
            observer: None,
            source_reference: None,
        }
    }

    /// Attaches the source that diagnostics will point into.
    pub fn with_source_reference(mut self, source_reference: SourceReference) -> Self {
        self.source_reference = Some(source_reference);
        self
    }

    pub fn set_error_handler(&mut self, handler: Option<ErrorHandler>) {
        self.error_handler = handler;
    }

    pub fn set_rule_observer(&mut self, observer: Option<Box<dyn RuleObserver>>) {
        self.observer = observer;
    }

    pub fn state(&self) -> &ParserState {
        &self.state
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn index(&self) -> usize {
        self.state.current().character_index
    }

    pub fn line_index(&self) -> usize {
        self.state.current().line_index
    }

    fn set_position(&mut self, index: usize, line_index: usize) {
        let current = self.state.current_mut();
        current.character_index = index;
        current.line_index = line_index;
    }

    pub fn end_of_input(&self) -> bool {
        self.index() >= self.chars.len()
    }

    pub fn remaining_length(&self) -> usize {
        self.chars.len().saturating_sub(self.index())
    }

    pub fn current_character(&self) -> Option<char> {
        self.chars.get(self.index()).copied()
    }

    pub fn remaining_string(&self) -> String {
        self.chars[self.index().min(self.chars.len())..].iter().collect()
    }

    pub fn input_string(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn set_flag(&mut self, flag: u32, value: bool) {
        let current = self.state.current_mut();
        if value {
            current.custom_flags |= flag;
        } else {
            current.custom_flags &= !flag;
        }
    }

    pub fn get_flag(&self, flag: u32) -> bool {
        self.state.current().custom_flags & flag != 0
    }

    //--------------------------------
    // Rule bookkeeping
    //--------------------------------

    pub fn begin_rule(&mut self) -> RuleId {
        self.state.push()
    }

    pub fn fail_rule<T>(&mut self, rule_id: RuleId) -> Option<T> {
        if cfg!(feature = "debug_rules") {
            eprintln!(
                "{}✗ {} at {}",
                "  ".repeat(self.state.height()),
                type_name::<T>(),
                self.index()
            );
        }
        self.state.pop(rule_id);
        None
    }

    /// Restores the state like `fail_rule`, for lookahead that is not a failure.
    pub fn cancel_rule(&mut self, rule_id: RuleId) {
        self.state.pop(rule_id);
    }

    pub fn succeed_rule<T: Any>(&mut self, rule_id: RuleId, mut result: T) -> Option<T> {
        let end = *self.state.peek(rule_id);
        let start = self.state.peek_penultimate().copied().unwrap_or(end);

        if cfg!(feature = "debug_rules") {
            eprintln!(
                "{}✓ {} {}..{}",
                "  ".repeat(self.state.height()),
                type_name::<T>(),
                start.character_index,
                end.character_index
            );
        }

        if let Some(observer) = self.observer.as_mut() {
            observer.rule_did_succeed(&mut result, &start, &end);
        }

        self.state.squash();
        Some(result)
    }

    //--------------------------------
    // Diagnostics
    //--------------------------------

    pub fn error(&mut self, message: &str) {
        self.error_on_line(message, self.line_index() + 1, false);
    }

    pub fn warning(&mut self, message: &str) {
        self.error_on_line(message, self.line_index() + 1, true);
    }

    /// Reports at most one diagnostic per open rule scope. Errors (but not
    /// warnings) mark the whole parse as failed even when suppressed.
    pub fn error_on_line(&mut self, message: &str, line_number: usize, is_warning: bool) {
        if !self.state.error_reported_already_in_scope() {
            let index = self.index();
            let length = self.chars.get(index).map_or(0, |ch| ch.len_utf8());
            let diagnostic = ParseDiagnostic {
                message: message.to_string(),
                index,
                line: line_number.saturating_sub(1),
                is_warning,
                span: SourceSpan::new(SourceOffset::from_char_index(&self.chars, index), length),
                source_code: self.source_reference.clone(),
            };
            match self.error_handler.as_mut() {
                Some(handler) => handler(diagnostic),
                None => println!("{}", diagnostic.summary()),
            }
            self.state.note_error_reported();
        }

        if !is_warning {
            self.had_error = true;
        }
    }

    /// The rest of the current line, without consuming it.
    pub fn line_remainder(&mut self) -> Option<String> {
        self.peek(|parser| parser.parse_until_characters_from_set(&NEWLINE_CHARACTERS))
    }

    //--------------------------------
    // Primitive scanners
    //--------------------------------

    pub fn parse_string(&mut self, literal: &str) -> Option<()> {
        if literal.chars().count() > self.remaining_length() {
            return None;
        }

        let rule_id = self.begin_rule();

        let mut index = self.index();
        let mut line_index = self.line_index();
        let mut success = true;
        for ch in literal.chars() {
            if self.chars[index] != ch {
                success = false;
                break;
            }
            if ch == '\n' {
                line_index += 1;
            }
            index += 1;
        }
        self.set_position(index, line_index);

        if success {
            self.succeed_rule(rule_id, ())
        } else {
            self.fail_rule(rule_id)
        }
    }

    /// Consumes one character unconditionally; `None` only at end of input.
    pub fn parse_single_character(&mut self) -> Option<char> {
        let ch = self.current_character()?;
        let line_index = self.line_index() + usize::from(ch == '\n');
        self.set_position(self.index() + 1, line_index);
        Some(ch)
    }

    /// Consumes the longest run of characters that are (or, with
    /// `should_include == false`, are not) in `char_set`.
    pub fn parse_characters_from_set(
        &mut self,
        char_set: &CharacterSet,
        should_include: bool,
        max_count: Option<usize>,
    ) -> Option<String> {
        let max_count = max_count.unwrap_or(usize::MAX);
        let start_index = self.index();

        let mut index = start_index;
        let mut line_index = self.line_index();
        let mut count = 0;
        while index < self.chars.len()
            && char_set.contains(self.chars[index]) == should_include
            && count < max_count
        {
            if self.chars[index] == '\n' {
                line_index += 1;
            }
            index += 1;
            count += 1;
        }
        self.set_position(index, line_index);

        if index > start_index {
            Some(self.chars[start_index..index].iter().collect())
        } else {
            None
        }
    }

    pub fn parse_characters_from_string(&mut self, chars: &str) -> Option<String> {
        self.parse_characters_from_set(&CharacterSet::from(chars), true, None)
    }

    pub fn parse_until_characters_from_string(&mut self, chars: &str) -> Option<String> {
        self.parse_characters_from_set(&CharacterSet::from(chars), false, None)
    }

    pub fn parse_until_characters_from_set(&mut self, char_set: &CharacterSet) -> Option<String> {
        self.parse_characters_from_set(char_set, false, None)
    }

    pub fn parse_int(&mut self) -> Option<i32> {
        let rule_id = self.begin_rule();

        let negative = self.parse_string("-").is_some();
        self.parse_characters_from_string(" \t");

        let parsed = self
            .parse_characters_from_set(&NUMBER_CHARACTERS, true, None)
            .and_then(|digits| digits.parse::<i32>().ok());
        match parsed {
            Some(value) => self.succeed_rule(rule_id, if negative { -value } else { value }),
            None => self.fail_rule(rule_id),
        }
    }

    pub fn parse_float(&mut self) -> Option<f32> {
        let rule_id = self.begin_rule();
        let start_index = self.index();

        if self.parse_int().is_some() && self.parse_string(".").is_some() {
            self.parse_characters_from_set(&NUMBER_CHARACTERS, true, None);
            let literal: String = self.chars[start_index..self.index()]
                .iter()
                .filter(|ch| !ch.is_whitespace())
                .collect();
            if let Ok(value) = literal.parse::<f32>() {
                return self.succeed_rule(rule_id, value);
            }
        }

        self.fail_rule(rule_id)
    }

    /// An optional `\r` followed by a mandatory `\n`.
    pub fn parse_newline(&mut self) -> Option<()> {
        let rule_id = self.begin_rule();

        self.parse_string("\r");

        match self.parse_string("\n") {
            Some(()) => self.succeed_rule(rule_id, ()),
            None => self.fail_rule(rule_id),
        }
    }
}

impl Combinators for StringParser {
    fn engine(&self) -> &StringParser {
        self
    }
    fn engine_mut(&mut self) -> &mut StringParser {
        self
    }
}

/// The structuring combinators. Implemented by anything that owns a
/// [`StringParser`], so that grammar rules written as methods of the owner
/// can be passed straight into them.
pub trait Combinators: Sized {
    fn engine(&self) -> &StringParser;
    fn engine_mut(&mut self) -> &mut StringParser;

    /// Runs `rule` inside its own snapshot: restored on failure, merged into
    /// the caller's on success.
    fn parse<T: Any>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let rule_id = self.engine_mut().begin_rule();
        let stack_height_before = self.engine().state().height();

        let result = rule(self);

        assert_eq!(
            stack_height_before,
            self.engine().state().height(),
            "Mismatched Begin/Fail/Succeed rules"
        );

        match result {
            Some(result) => self.engine_mut().succeed_rule(rule_id, result),
            None => self.engine_mut().fail_rule(rule_id),
        }
    }

    /// The first of `rules` to match, tried in order.
    fn one_of<T: Any>(&mut self, rules: &[Rule<Self, T>]) -> Option<T> {
        rules.iter().find_map(|rule| self.parse(*rule))
    }

    fn one_or_more<T: Any>(
        &mut self,
        mut rule: impl FnMut(&mut Self) -> Option<T>,
    ) -> Option<Vec<T>> {
        let mut results = Vec::new();
        while let Some(result) = self.parse(&mut rule) {
            results.push(result);
        }

        if results.is_empty() {
            None
        } else {
            Some(results)
        }
    }

    /// Never fails.
    fn optional<T: Any>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<Option<T>> {
        Some(self.parse(rule))
    }

    /// Matches `rule` but drops its value, so it stays out of result lists.
    fn exclude<T: Any>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<()> {
        self.parse(rule).map(|_| ())
    }

    fn optional_exclude<T: Any>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<Option<()>> {
        self.parse(rule);
        Some(None)
    }

    /// Runs `rule` and rolls back whatever it did, matched or not.
    fn peek<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let rule_id = self.engine_mut().begin_rule();
        let result = rule(self);
        self.engine_mut().cancel_rule(rule_id);
        result
    }

    fn expect<T: Any>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Option<T>,
        message: &str,
    ) -> Option<T> {
        self.expect_or_recover(rule, message, |_| None)
    }

    /// Like `parse`, but a non-match is reported as "Expected {message} but
    /// saw ..." and `recovery` gets to produce a stand-in result.
    fn expect_or_recover<T: Any>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> Option<T>,
        message: &str,
        recovery: impl FnOnce(&mut Self) -> Option<T>,
    ) -> Option<T> {
        let result = self.parse(rule);
        if result.is_some() {
            return result;
        }

        let but_saw = match self.engine_mut().line_remainder() {
            Some(remainder) if !remainder.is_empty() => format!("'{}'", remainder),
            _ => "end of line".to_string(),
        };
        self.engine_mut()
            .error(&format!("Expected {} but saw {}", message, but_saw));

        recovery(self)
    }

    /// Parses `A (B A)*`, merging each result into one list.
    ///
    /// Stops when `terminator` matches (checked by lookahead before each B),
    /// when B or the following A fails, when `should_continue` says so, or
    /// at end of input. Fails only if the first A fails or nothing at all was
    /// merged.
    fn interleave<A: Any, B: Any, J: Any>(
        &mut self,
        mut rule_a: impl FnMut(&mut Self) -> Option<A>,
        mut merge_a: impl FnMut(A, &mut Vec<J>),
        mut rule_b: impl FnMut(&mut Self) -> Option<B>,
        mut merge_b: impl FnMut(B, &mut Vec<J>),
        mut should_continue: impl FnMut(&A, &B) -> bool,
        mut terminator: Option<&mut dyn FnMut(&mut Self) -> Option<()>>,
    ) -> Option<Vec<J>> {
        let rule_id = self.engine_mut().begin_rule();

        let mut results = Vec::new();

        match self.parse(&mut rule_a) {
            Some(first) => merge_a(first, &mut results),
            None => return self.engine_mut().fail_rule(rule_id),
        }

        loop {
            if let Some(terminator) = terminator.as_mut() {
                if self.peek(|parser| (**terminator)(parser)).is_some() {
                    break;
                }
            }

            let inner = match self.parse(&mut rule_b) {
                Some(inner) => inner,
                None => break,
            };

            let outer = self.parse(&mut rule_a);
            let keep_going = outer
                .as_ref()
                .map_or(false, |outer| should_continue(outer, &inner));

            merge_b(inner, &mut results);
            match outer {
                Some(outer) => merge_a(outer, &mut results),
                None => break,
            }

            if !keep_going || self.engine().remaining_length() == 0 {
                break;
            }
        }

        if results.is_empty() {
            return self.engine_mut().fail_rule(rule_id);
        }

        self.engine_mut().succeed_rule(rule_id, results)
    }

    /// `A (B A)*` keeping every result of both rules.
    fn interleave_list<T: Any>(
        &mut self,
        rule_a: impl FnMut(&mut Self) -> Option<T>,
        rule_b: impl FnMut(&mut Self) -> Option<T>,
    ) -> Option<Vec<T>> {
        self.interleave(
            rule_a,
            |a, list| list.push(a),
            rule_b,
            |b, list| list.push(b),
            |_, _| true,
            None,
        )
    }

    /// `A (separator A)*` keeping only the A results.
    fn interleave_separated<T: Any, S: Any>(
        &mut self,
        rule: impl FnMut(&mut Self) -> Option<T>,
        separator: impl FnMut(&mut Self) -> Option<S>,
    ) -> Option<Vec<T>> {
        self.interleave(
            rule,
            |a, list| list.push(a),
            separator,
            |_, _| {},
            |_, _| true,
            None,
        )
    }

    /// Both sides may match without producing anything; present values are
    /// flattened into the list and iteration stops once a full round
    /// produced nothing on either side.
    fn interleave_optional<T: Any>(
        &mut self,
        rule_a: impl FnMut(&mut Self) -> Option<Option<T>>,
        rule_b: impl FnMut(&mut Self) -> Option<Option<T>>,
    ) -> Option<Vec<T>> {
        self.interleave(
            rule_a,
            |a, list| list.extend(a),
            rule_b,
            |b, list| list.extend(b),
            |a, b| a.is_some() || b.is_some(),
            None,
        )
    }

    /// Scans text in large runs up to the next pause or end character, and at
    /// each pause tries `stop_rule` by lookahead. A failed stop rule at a
    /// pause character keeps the character as text and carries on; an end
    /// character or end of input finishes the scan.
    fn parse_until<T>(
        &mut self,
        mut stop_rule: impl FnMut(&mut Self) -> Option<T>,
        stops: &ScanStops,
    ) -> Option<String> {
        let rule_id = self.engine_mut().begin_rule();

        let mut parsed = String::new();
        loop {
            if let Some(partial) = self
                .engine_mut()
                .parse_until_characters_from_set(stops.pause_and_end())
            {
                parsed.push_str(&partial);
            }

            if self.peek(&mut stop_rule).is_some() {
                break;
            }

            if self.engine().end_of_input() {
                break;
            }

            match self.engine().current_character() {
                Some(ch) if stops.is_pause(ch) => {
                    parsed.push(ch);
                    self.engine_mut().parse_single_character();
                }
                _ => break,
            }
        }

        if parsed.is_empty() {
            self.engine_mut().fail_rule(rule_id)
        } else {
            self.engine_mut().succeed_rule(rule_id, parsed)
        }
    }
}
