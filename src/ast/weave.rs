use std::mem;

use super::Node;

/// Nests a flat run of statements by choice and gather depth.
///
/// Each choice or gather at the shallowest depth present owns everything
/// after it up to the next choice or gather at that depth; what it owns is
/// arranged the same way. Knots and stitches are never owned and end the
/// current owner's run.
pub fn arrange_weave(content: Vec<Node>) -> Vec<Node> {
    let base_depth = match content.iter().filter_map(Node::weave_depth).min() {
        Some(depth) => depth,
        None => return content,
    };

    let mut arranged = Vec::new();
    let mut owner: Option<Node> = None;
    let mut loose = Vec::new();

    for node in content {
        let is_flow = node.is_flow();
        let is_weave_point = node
            .weave_depth()
            .map_or(false, |depth| depth <= base_depth);

        if !is_flow && !is_weave_point {
            loose.push(node);
            continue;
        }

        flush(&mut arranged, owner.take(), mem::take(&mut loose));
        if is_flow {
            arranged.push(node);
        } else {
            owner = Some(node);
        }
    }
    flush(&mut arranged, owner, loose);

    arranged
}

fn flush(arranged: &mut Vec<Node>, owner: Option<Node>, loose: Vec<Node>) {
    let loose = arrange_weave(loose);
    match owner {
        Some(mut owner) => {
            if let Some(body) = owner.weave_body_mut() {
                body.extend(loose);
            }
            arranged.push(owner);
        }
        None => arranged.extend(loose),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Choice, Flow, FlowLevel, Gather, NodeKind};

    fn choice(depth: usize, text: &str) -> Node {
        Node::new(NodeKind::Choice(Choice {
            name: None,
            depth,
            once_only: true,
            condition: None,
            start_content: Some(vec![Node::text(text)]),
            choice_only_content: None,
            inner_content: None,
            diverts: vec![],
            tags: vec![],
            has_weave_style_inline_brackets: false,
            is_invisible_default: false,
            body: vec![],
        }))
    }

    fn gather(depth: usize) -> Node {
        Node::new(NodeKind::Gather(Gather {
            name: None,
            depth,
            body: vec![],
        }))
    }

    fn render(content: &[Node]) -> Vec<String> {
        content.iter().map(|node| node.to_string()).collect()
    }

    #[test]
    fn flat_content_is_untouched() {
        let content = vec![Node::text("a"), Node::text("b")];
        assert_eq!(arrange_weave(content.clone()), content);
    }

    #[test]
    fn choices_own_following_content() {
        let content = vec![
            Node::text("intro"),
            choice(1, "one"),
            Node::text("after one"),
            choice(1, "two"),
            gather(1),
            Node::text("joined"),
        ];
        assert_eq!(
            render(&arrange_weave(content)),
            vec![
                "\"intro\"",
                "(* (start \"one\") \"after one\")",
                "(* (start \"two\"))",
                "(- \"joined\")",
            ]
        );
    }

    #[test]
    fn deeper_choices_nest() {
        let content = vec![
            choice(1, "outer"),
            choice(2, "inner a"),
            Node::text("a"),
            choice(2, "inner b"),
            gather(2),
            Node::text("rejoin"),
            gather(1),
        ];
        assert_eq!(
            render(&arrange_weave(content)),
            vec![
                "(* (start \"outer\") (** (start \"inner a\") \"a\") (** (start \"inner b\")) (-- \"rejoin\"))",
                "(-)",
            ]
        );
    }

    #[test]
    fn leading_deep_choices_arrange_among_themselves() {
        let content = vec![choice(2, "deep"), Node::text("x"), choice(1, "shallow")];
        assert_eq!(
            render(&arrange_weave(content)),
            vec!["(** (start \"deep\") \"x\")", "(* (start \"shallow\"))"]
        );
    }

    #[test]
    fn flows_end_the_run() {
        let stitch = Node::new(NodeKind::Flow(Flow::new(
            FlowLevel::Stitch,
            "s".to_string(),
            vec![],
            false,
            vec![Node::text("in stitch")],
        )));
        let content = vec![choice(1, "c"), Node::text("owned"), stitch];
        assert_eq!(
            render(&arrange_weave(content)),
            vec![
                "(* (start \"c\") \"owned\")",
                "(stitch s \"in stitch\")",
            ]
        );
    }
}
