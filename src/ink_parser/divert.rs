use super::InkParser;
use crate::{
    ast::{Divert, Node, NodeKind},
    string_parser::{Combinators, Either},
};

enum DivertArrow {
    Divert,
    TunnelOnwards,
}

impl InkParser {
    /// `-> a`, `-> a -> b`, `-> a ->->`, `->-> b`, `<- thread`, or a lone
    /// `->` which only a choice may use.
    pub(super) fn multi_divert(&mut self) -> Option<Vec<Node>> {
        self.whitespace();

        if let Some(thread) = self.parse(Self::start_thread) {
            return Some(vec![thread]);
        }

        let arrows_and_diverts = self.interleave_list(
            |p| p.divert_arrow_or_tunnel_onwards().map(Either::Left),
            |p| p.divert_identifier_with_arguments().map(Either::Right),
        )?;

        let count = arrows_and_diverts.len();
        let mut diverts = Vec::new();
        let mut items = arrows_and_diverts.into_iter().enumerate();
        while let Some((index, item)) = items.next() {
            match item {
                Either::Left(DivertArrow::Divert) => {}
                Either::Left(DivertArrow::TunnelOnwards) => {
                    if index != 0 && index + 1 != count && index + 2 != count {
                        self.error(
                            "Tunnel onwards '->->' must only come at the begining or the start of a divert",
                        );
                    }
                    let target = match items.next() {
                        Some((_, Either::Right(divert))) => Some(divert),
                        _ => None,
                    };
                    diverts.push(Node::new(NodeKind::TunnelOnwards(target)));
                    break;
                }
                Either::Right(mut divert) => {
                    // Anything diverted through on the way to the last
                    // target must come back.
                    if index + 1 < count {
                        divert.is_tunnel = true;
                    }
                    diverts.push(Node::new(NodeKind::Divert(divert)));
                }
            }
        }

        if diverts.is_empty() && count == 1 {
            diverts.push(Node::new(NodeKind::Divert(Divert::empty())));
            if self.parsing_choice == 0 {
                self.error("Empty diverts (->) are only valid on choices");
            }
        }

        Some(diverts)
    }

    fn start_thread(&mut self) -> Option<Node> {
        self.whitespace();
        self.thread_arrow()?;
        self.whitespace();

        let mut divert = self.expect_or_recover(
            Self::divert_identifier_with_arguments,
            "target for new thread",
            |_| Some(Divert::empty()),
        )?;
        divert.is_thread = true;
        Some(Node::new(NodeKind::Divert(divert)))
    }

    pub(super) fn divert_arrow(&mut self) -> Option<()> {
        self.parse_string("->")
    }

    pub(super) fn thread_arrow(&mut self) -> Option<()> {
        self.parse_string("<-")
    }

    fn divert_arrow_or_tunnel_onwards(&mut self) -> Option<DivertArrow> {
        let mut arrows = 0;
        while self.divert_arrow().is_some() {
            arrows += 1;
        }

        match arrows {
            0 => None,
            1 => Some(DivertArrow::Divert),
            2 => Some(DivertArrow::TunnelOnwards),
            _ => {
                self.error("Unexpected number of arrows in divert. Should only have '->' or '->->'");
                Some(DivertArrow::TunnelOnwards)
            }
        }
    }

    /// `knot.stitch(arg, ...)`
    fn divert_identifier_with_arguments(&mut self) -> Option<Divert> {
        self.whitespace();
        let target = self.interleave_separated(
            |p| p.spaced(Self::identifier),
            |p| p.parse_string("."),
        )?;
        self.whitespace();
        let arguments = self
            .parse(Self::expression_function_call_arguments)
            .unwrap_or_default();
        self.whitespace();
        Some(Divert::new(target, arguments))
    }

    /// Exactly one divert that goes somewhere without coming back.
    pub(super) fn single_divert(&mut self) -> Option<Divert> {
        let mut diverts = self.parse(Self::multi_divert)?;
        if diverts.len() != 1 {
            return None;
        }
        match diverts.pop()?.kind {
            NodeKind::Divert(divert) if !divert.is_tunnel => Some(divert),
            _ => None,
        }
    }
}
