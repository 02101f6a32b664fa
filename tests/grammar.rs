use ink_rs::{ast::NodeKind, CommandLineInput, InkParser, Story};
use pretty_assertions::assert_eq;

fn parse_clean(source: &str) -> Story {
    let (story, diagnostics) = ink_rs::parse("test.ink", source);
    let messages: Vec<String> = diagnostics.iter().map(|d| d.summary()).collect();
    assert_eq!(messages, Vec::<String>::new());
    story.expect("story")
}

fn lines(story: &Story) -> Vec<String> {
    story.content.iter().map(|node| node.to_string()).collect()
}

#[test]
fn knot_with_weave() {
    let story = parse_clean("=== knot1\n* choice one\n  text\n- gather\n-> END\n");
    assert_eq!(
        lines(&story),
        vec!["(knot knot1 (* (start \"choice one\") \"text\" \"\\n\") (- \"gather\" \"\\n\" (divert END)))"]
    );
}

#[test]
fn gathers_split_the_weave() {
    let story = parse_clean("* a\n- g\n* b\n");
    assert_eq!(
        lines(&story),
        vec!["(* (start \"a\"))", "(- \"g\" \"\\n\")", "(* (start \"b\"))"]
    );
}

#[test]
fn dash_before_an_arrow_is_a_gather() {
    for source in ["--> end\n", "- -> end\n"] {
        let story = parse_clean(source);
        assert_eq!(lines(&story), vec!["(- (divert end))"], "{:?}", source);
    }
}

#[test]
fn stitches_belong_to_the_preceding_knot() {
    let story = parse_clean("== a\n= one\nx\n== b\ny\n");
    assert_eq!(
        lines(&story),
        vec![
            "(knot a (stitch one \"x\" \"\\n\"))",
            "(knot b \"y\" \"\\n\")",
        ]
    );
    assert!(matches!(&story.content[0].kind, NodeKind::Flow(flow) if flow.name == "a"));
}

#[test]
fn unclosed_brace_is_reported_and_skipped() {
    let (story, diagnostics) = ink_rs::parse("test.ink", "{x\nmore\n");
    let messages: Vec<String> = diagnostics.iter().map(|d| d.summary()).collect();
    assert_eq!(messages.len(), 2, "{:?}", messages);
    assert!(messages[0].starts_with(
        "Error on line 1: Expected some kind of logic, conditional or sequence within braces"
    ));
    assert_eq!(messages[1], "Error on line 1: Unexpected content: '{x'");
    assert_eq!(lines(&story.unwrap()), vec!["\"more\"", "\"\\n\""]);
}

#[test]
fn block_comments_keep_line_numbers() {
    let (_, diagnostics) = ink_rs::parse("test.ink", "/*\n\n*/ -> \n");
    let messages: Vec<String> = diagnostics.iter().map(|d| d.summary()).collect();
    assert_eq!(
        messages,
        vec!["Error on line 3: Empty diverts (->) are only valid on choices"]
    );
}

#[test]
fn invalid_variable_values() {
    let (_, diagnostics) = ink_rs::parse("test.ink", "VAR x = a + 1\n");
    assert_eq!(
        diagnostics[0].summary(),
        "Error on line 1: initial value for a variable must be a number, constant, list or divert target"
    );

    let (_, diagnostics) = ink_rs::parse("test.ink", "VAR list = a, b\n");
    assert_eq!(
        diagnostics[0].message,
        "Unexpected ','. If you're trying to declare a new list, use the LIST keyword, not VAR"
    );
}

#[test]
fn command_line_input() {
    let parse = |source: &str| InkParser::new(source).parse_command_line_input();

    assert_eq!(parse("help"), Some(CommandLineInput::Help));
    assert_eq!(parse("exit"), Some(CommandLineInput::Exit));
    assert_eq!(parse("DebugSource(42)"), Some(CommandLineInput::DebugSource(42)));
    assert_eq!(
        parse("DebugPath knot.stitch.0"),
        Some(CommandLineInput::DebugPath("knot.stitch.0".to_string()))
    );
    assert_eq!(parse("7"), Some(CommandLineInput::ChoiceNumber(7)));
    assert_eq!(
        parse("x + 1").map(|input| input.to_string()).as_deref(),
        Some("(immediate (out (+ x 1)))")
    );
    assert_eq!(parse(""), None);
}

#[test]
fn unnamed_knot_is_reported_once() {
    let (story, diagnostics) = ink_rs::parse("test.ink", "=== k\nHello\n== 5\nWorld\n");
    let messages: Vec<String> = diagnostics.iter().map(|d| d.summary()).collect();
    assert_eq!(messages, vec!["Error on line 3: Expected the name of the knot"]);
    assert_eq!(
        lines(&story.unwrap()),
        vec!["(knot k \"Hello\" \"\\n\")", "(knot  \"World\" \"\\n\")"]
    );
}

#[test]
fn choice_with_two_diverts_is_reported() {
    let (story, diagnostics) = ink_rs::parse("test.ink", "* a -> t -> u\n");
    let messages: Vec<String> = diagnostics.iter().map(|d| d.summary()).collect();
    assert_eq!(messages, vec!["Error on line 1: Expected end of line but saw '-> t -> u'"]);
    assert_eq!(lines(&story.unwrap()), vec!["(* (start \"a\"))"]);
}
