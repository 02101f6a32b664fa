use super::{Node, NodeKind};

/// Strips trailing spaces and tabs from the final text of `content`,
/// dropping texts that end up empty. With `terminate_with_space` the final
/// text is kept and ends in exactly one space instead.
pub fn trim_end_whitespace(content: &mut Vec<Node>, terminate_with_space: bool) {
    let Some(last) = content.last_mut() else {
        return;
    };
    let NodeKind::Text(text) = &mut last.kind else {
        return;
    };

    let trimmed_len = text.trim_end_matches(|ch: char| ch == ' ' || ch == '\t').len();
    text.truncate(trimmed_len);

    if terminate_with_space {
        text.push(' ');
    } else if text.is_empty() {
        content.pop();
        trim_end_whitespace(content, false);
    }
}
