use std::{cell::RefCell, rc::Rc};

use super::*;

fn collecting(parser: &mut StringParser) -> Rc<RefCell<Vec<ParseDiagnostic>>> {
    let diagnostics = Rc::new(RefCell::new(Vec::new()));
    let sink = diagnostics.clone();
    parser.set_error_handler(Some(Box::new(move |diagnostic| {
        sink.borrow_mut().push(diagnostic)
    })));
    diagnostics
}

fn word(parser: &mut StringParser) -> Option<String> {
    parser.parse_characters_from_set(&CharacterSet::new().with_range('a', 'z'), true, None)
}

#[test]
fn failed_rule_restores_position() {
    let mut parser = StringParser::new("hello\nworld");
    let result: Option<()> = parser.parse(|p| {
        p.parse_string("hello\n")?;
        p.parse_string("planet")
    });
    assert_eq!(result, None);
    assert_eq!(parser.index(), 0);
    assert_eq!(parser.line_index(), 0);
    assert_eq!(parser.state().height(), 1);
}

#[test]
fn successful_rule_keeps_position_and_line() {
    let mut parser = StringParser::new("hello\nworld");
    let result = parser.parse(|p| {
        p.parse_string("hello")?;
        p.parse_newline()?;
        word(p)
    });
    assert_eq!(result.as_deref(), Some("world"));
    assert_eq!(parser.index(), 11);
    assert_eq!(parser.line_index(), 1);
    assert!(parser.end_of_input());
}

#[test]
fn one_of_takes_first_match_in_order() {
    fn short(p: &mut StringParser) -> Option<&'static str> {
        p.parse_string("ab").map(|_| "short")
    }
    fn long(p: &mut StringParser) -> Option<&'static str> {
        p.parse_string("abc").map(|_| "long")
    }
    let mut parser = StringParser::new("abc");
    assert_eq!(parser.one_of(&[short, long]), Some("short"));
    assert_eq!(parser.index(), 2);

    let mut parser = StringParser::new("abc");
    assert_eq!(parser.one_of(&[long, short]), Some("long"));

    let mut parser = StringParser::new("xyz");
    assert_eq!(parser.one_of(&[long, short]), None);
    assert_eq!(parser.index(), 0);
}

#[test]
fn one_or_more_needs_one_match() {
    let mut parser = StringParser::new("***x");
    assert_eq!(
        parser.one_or_more(|p| p.parse_string("*")).map(|v| v.len()),
        Some(3)
    );
    assert_eq!(parser.current_character(), Some('x'));
    assert_eq!(parser.one_or_more(|p| p.parse_string("*")), None);
}

#[test]
fn optional_distinguishes_nothing_from_failure() {
    let mut parser = StringParser::new("x");
    assert_eq!(parser.optional(|p| p.parse_string("y")), Some(None));
    assert_eq!(parser.optional(|p| p.parse_string("x")), Some(Some(())));
}

#[test]
fn peek_never_consumes() {
    let mut parser = StringParser::new("abc");
    assert_eq!(parser.peek(word).as_deref(), Some("abc"));
    assert_eq!(parser.index(), 0);
    assert_eq!(parser.peek(|p| p.parse_string("z")), None);
    assert_eq!(parser.index(), 0);
}

#[test]
fn expect_reports_line_remainder() {
    let mut parser = StringParser::new("foo bar\nbaz");
    let diagnostics = collecting(&mut parser);
    assert_eq!(parser.expect(|p| p.parse_string("="), "an equals sign"), None);
    assert!(parser.had_error());
    let diagnostics = diagnostics.borrow();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].summary(),
        "Error on line 1: Expected an equals sign but saw 'foo bar'"
    );
    assert_eq!(diagnostics[0].index, 0);
    assert_eq!(diagnostics[0].line, 0);
}

#[test]
fn expect_at_end_of_line_and_recovery() {
    let mut parser = StringParser::new("\nnext");
    let diagnostics = collecting(&mut parser);
    let recovered = parser.expect_or_recover(
        |p| p.parse_string("x").map(|_| "x"),
        "x",
        |p| {
            p.parse_newline()?;
            Some("recovered")
        },
    );
    assert_eq!(recovered, Some("recovered"));
    assert_eq!(parser.line_index(), 1);
    assert_eq!(
        diagnostics.borrow()[0].message,
        "Expected x but saw end of line"
    );
}

#[test]
fn one_error_per_scope() {
    let mut parser = StringParser::new("abc");
    let diagnostics = collecting(&mut parser);
    let _: Option<()> = parser.parse(|p| {
        p.error("first");
        p.error("second");
        None
    });
    parser.error("third");
    // Fresh scope, so reporting is allowed again.
    let _: Option<()> = parser.parse(|p| {
        p.warning("fourth");
        None
    });
    let messages: Vec<String> = diagnostics
        .borrow()
        .iter()
        .map(|d| d.summary())
        .collect();
    assert_eq!(
        messages,
        vec!["Error on line 1: first", "Warning on line 1: fourth"]
    );
    assert!(parser.had_error());
}

#[test]
fn warnings_do_not_set_had_error() {
    let mut parser = StringParser::new("");
    let _diagnostics = collecting(&mut parser);
    parser.warning("careful");
    assert!(!parser.had_error());
}

#[test]
#[should_panic(expected = "Mismatched Begin/Fail/Succeed rules")]
fn unbalanced_rule_aborts() {
    let mut parser = StringParser::new("abc");
    let _: Option<()> = parser.parse(|p| {
        p.begin_rule();
        Some(())
    });
}

#[test]
fn interleave_list_alternates() {
    let mut parser = StringParser::new("a,b,c;");
    let letters = parser.interleave_list(
        |p| p.parse_single_character().filter(|c| c.is_alphabetic()),
        |p| p.parse_string(",").map(|_| ','),
    );
    assert_eq!(letters, Some(vec!['a', ',', 'b', ',', 'c']));
    assert_eq!(parser.current_character(), Some(';'));
}

#[test]
fn interleave_separated_drops_dangling_separator() {
    let mut parser = StringParser::new("a,b,");
    let letters = parser.interleave_separated(word, |p| p.parse_string(","));
    assert_eq!(letters, Some(vec!["a".to_string(), "b".to_string()]));
    // The trailing separator had no element after it, so it is consumed by
    // the loop but its element never merged.
    assert_eq!(parser.index(), 4);
}

#[test]
fn interleave_optional_stops_when_nothing_is_produced() {
    let mut parser = StringParser::new("x..y");
    let result = parser.interleave_optional(
        |p| p.optional(|p| p.parse_string("x").map(|_| 'x')),
        |p| p.optional(|p| p.parse_string(".").map(|_| '.')),
    );
    assert_eq!(result, Some(vec!['x', '.', '.']));
    assert_eq!(parser.current_character(), Some('y'));
}

#[test]
fn interleave_terminator_stops_before_inner_rule() {
    let mut parser = StringParser::new("a b c|d");
    let mut terminator = |p: &mut StringParser| p.parse_string(" c");
    let result = parser.interleave(
        word,
        |a, list: &mut Vec<String>| list.push(a),
        |p| p.parse_string(" "),
        |_, _| {},
        |_, _| true,
        Some(&mut terminator),
    );
    assert_eq!(result, Some(vec!["a".to_string(), "b".to_string()]));
    assert_eq!(parser.index(), 3);
}

#[test]
fn interleave_fails_cleanly_without_first_element() {
    let mut parser = StringParser::new("123");
    assert_eq!(
        parser.interleave_separated(word, |p| p.parse_string(",")),
        None
    );
    assert_eq!(parser.index(), 0);
    assert_eq!(parser.state().height(), 1);
}

#[test]
fn parse_until_pauses_at_stop_rule() {
    let mut parser = StringParser::new("one - two -> three");
    let stops = ScanStops::new(CharacterSet::from("-"), &CharacterSet::from("\n"));
    let text = parser.parse_until(|p| p.parse_string("->"), &stops);
    assert_eq!(text.as_deref(), Some("one - two "));
    assert_eq!(parser.remaining_string(), "-> three");
}

#[test]
fn parse_until_stops_at_end_character() {
    let mut parser = StringParser::new("text{logic}");
    let stops = ScanStops::ending_at(CharacterSet::from("{"));
    let text = parser.parse_until(|p| p.parse_string("->"), &stops);
    assert_eq!(text.as_deref(), Some("text"));
    assert_eq!(parser.parse_until(|p| p.parse_string("{"), &stops), None);
}

#[test]
fn scan_stops_pause_only_on_pause_characters() {
    let stops = ScanStops::new(CharacterSet::from("-"), &CharacterSet::from("{"));
    assert!(stops.pause_and_end().contains('-'));
    assert!(stops.pause_and_end().contains('{'));
    assert!(stops.is_pause('-'));
    assert!(!stops.is_pause('{'));
}

#[test]
fn numbers() {
    let mut parser = StringParser::new("-42 rest");
    assert_eq!(parser.parse_int(), Some(-42));

    let mut parser = StringParser::new("- 3.25");
    assert_eq!(parser.parse_float(), Some(-3.25));

    let mut parser = StringParser::new("5.");
    assert_eq!(parser.parse_float(), Some(5.0));

    let mut parser = StringParser::new("12abc");
    assert_eq!(parser.parse_float(), None);
    assert_eq!(parser.index(), 0);

    let mut parser = StringParser::new("-x");
    assert_eq!(parser.parse_int(), None);
    assert_eq!(parser.index(), 0);

    let mut parser = StringParser::new("99999999999");
    assert_eq!(parser.parse_int(), None);
    assert_eq!(parser.index(), 0);
}

#[test]
fn newline_requires_line_feed() {
    let mut parser = StringParser::new("\r\n");
    assert_eq!(parser.parse_newline(), Some(()));
    assert_eq!(parser.line_index(), 1);

    let mut parser = StringParser::new("\rx");
    assert_eq!(parser.parse_newline(), None);
    assert_eq!(parser.index(), 0);
}

#[test]
fn flags_roll_back_with_the_rule() {
    let mut parser = StringParser::new("ab");
    let _: Option<()> = parser.parse(|p| {
        p.set_flag(0b10, true);
        None
    });
    assert!(!parser.get_flag(0b10));
    let _ = parser.parse(|p| {
        p.set_flag(0b10, true);
        Some(())
    });
    assert!(parser.get_flag(0b10));
}

#[test]
fn observer_sees_every_success() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    let mut parser = StringParser::new("abc def");
    parser.set_rule_observer(Some(Box::new(
        move |result: &mut dyn Any, start: &StateElement, end: &StateElement| {
            if let Some(text) = result.downcast_ref::<String>() {
                sink.borrow_mut()
                    .push((text.clone(), start.character_index, end.character_index));
            }
        },
    )));
    parser.parse(word);
    parser.parse_string(" ");
    parser.parse(word);
    assert_eq!(
        *seen.borrow(),
        vec![("abc".to_string(), 0, 3), ("def".to_string(), 4, 7)]
    );
}
