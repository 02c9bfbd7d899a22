use super::CursorPointer;
use super::structure::{span_mut_in, spans_mut};
use tdoc::{Document, InlineStyle, Span};

pub(crate) fn insert_char_at(
    document: &mut Document,
    pointer: &CursorPointer,
    offset: usize,
    ch: char,
) -> bool {
    let Some(spans) = spans_mut(document, &pointer.paragraph_path) else {
        return false;
    };
    let Some(span) = span_mut_in(spans, pointer.span_path.indices()) else {
        return false;
    };
    let char_len = span.text.chars().count();
    let clamped_offset = offset.min(char_len);
    let byte_idx = char_to_byte_idx(&span.text, clamped_offset);
    span.text.insert(byte_idx, ch);
    true
}

pub(crate) fn remove_char_at(document: &mut Document, pointer: &CursorPointer, offset: usize) -> bool {
    let Some(spans) = spans_mut(document, &pointer.paragraph_path) else {
        return false;
    };
    let Some(span) = span_mut_in(spans, pointer.span_path.indices()) else {
        return false;
    };
    remove_char_from_text(&mut span.text, offset)
}

fn remove_char_from_text(text: &mut String, offset: usize) -> bool {
    let char_len = text.chars().count();
    if offset >= char_len {
        return false;
    }
    let start = char_to_byte_idx(text, offset);
    let end = char_to_byte_idx(text, offset + 1);
    if start >= end || end > text.len() {
        return false;
    }
    text.drain(start..end);
    true
}

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

/// How the characters `[start, end)` of a leaf span should be restyled.
#[derive(Clone, Copy, Debug)]
pub(crate) enum LinkEdit<'a> {
    Link(&'a str),
    Unlink,
}

/// Splits the leaf span at `path` around `[start, end)` and applies `edit` to
/// the middle part. Returns whether anything changed.
pub(crate) fn edit_link_in_leaf_span(
    spans: &mut Vec<Span>,
    path: &[usize],
    start: usize,
    end: usize,
    edit: LinkEdit<'_>,
) -> bool {
    let Some((&idx, rest)) = path.split_first() else {
        return false;
    };
    if idx >= spans.len() {
        return false;
    }
    if !rest.is_empty() {
        return edit_link_in_leaf_span(&mut spans[idx].children, rest, start, end, edit);
    }

    let original = spans[idx].clone();
    let len = original.text.chars().count();
    if len == 0 {
        return false;
    }
    let clamped_end = end.min(len);
    let clamped_start = start.min(clamped_end);
    if clamped_start >= clamped_end {
        return false;
    }
    if !edit_changes_span(&original, edit) {
        return false;
    }

    let (before_end, right_text) = split_text(&original.text, clamped_end);
    let (left_text, mid_text) = split_text(&before_end, clamped_start);

    let mut replacements = Vec::new();

    if !left_text.is_empty() {
        let mut left_span = original.clone();
        left_span.text = left_text;
        left_span.children.clear();
        replacements.push(left_span);
    }

    let mut mid_span = original.clone();
    mid_span.text = mid_text;
    mid_span.children.clear();
    apply_edit(&mut mid_span, edit);
    replacements.push(mid_span);

    // Children trail the span's own text, so they stay with the rightmost part.
    if !right_text.is_empty() || !original.children.is_empty() {
        let mut right_span = original;
        right_span.text = right_text;
        replacements.push(right_span);
    }

    spans.remove(idx);
    for (offset, span) in replacements.into_iter().enumerate() {
        spans.insert(idx + offset, span);
    }

    true
}

fn edit_changes_span(span: &Span, edit: LinkEdit<'_>) -> bool {
    match edit {
        LinkEdit::Link(url) => {
            span.style != InlineStyle::Link || span.link_target.as_deref() != Some(url)
        }
        LinkEdit::Unlink => span.style == InlineStyle::Link,
    }
}

pub(crate) fn apply_edit(span: &mut Span, edit: LinkEdit<'_>) {
    match edit {
        LinkEdit::Link(url) => {
            span.style = InlineStyle::Link;
            span.link_target = Some(url.to_string());
        }
        LinkEdit::Unlink => {
            span.style = InlineStyle::None;
            span.link_target = None;
        }
    }
}

pub(crate) fn prune_and_merge_spans(spans: &mut Vec<Span>) {
    let mut idx = 0;
    while idx < spans.len() {
        prune_and_merge_spans(&mut spans[idx].children);
        if spans[idx].text.is_empty() && spans[idx].children.is_empty() && spans.len() > 1 {
            spans.remove(idx);
        } else {
            idx += 1;
        }
    }

    let mut i = 0;
    while i + 1 < spans.len() {
        if can_merge_spans(&spans[i], &spans[i + 1]) {
            let right = spans.remove(i + 1);
            spans[i].text.push_str(&right.text);
        } else {
            i += 1;
        }
    }
}

fn can_merge_spans(left: &Span, right: &Span) -> bool {
    left.style == right.style
        && left.link_target == right.link_target
        && left.children.is_empty()
        && right.children.is_empty()
}

pub(crate) fn split_text(text: &str, offset: usize) -> (String, String) {
    let byte_idx = char_to_byte_idx(text, offset);
    let left = text[..byte_idx].to_string();
    let right = text[byte_idx..].to_string();
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_to_byte_idx_handles_multibyte_text() {
        let text = "añb";
        assert_eq!(char_to_byte_idx(text, 0), 0);
        assert_eq!(char_to_byte_idx(text, 2), 3);
        assert_eq!(char_to_byte_idx(text, 10), text.len());
    }

    #[test]
    fn merge_joins_neighbours_with_the_same_target() {
        let mut left = Span::new_text("exa");
        apply_edit(&mut left, LinkEdit::Link("https://example.com"));
        let mut right = Span::new_text("mple");
        apply_edit(&mut right, LinkEdit::Link("https://example.com"));
        let mut spans = vec![left, right, Span::new_text(" tail")];
        prune_and_merge_spans(&mut spans);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "example");
        assert_eq!(spans[0].style, InlineStyle::Link);
    }

    #[test]
    fn merge_keeps_neighbours_with_different_targets() {
        let mut left = Span::new_text("one");
        apply_edit(&mut left, LinkEdit::Link("https://one.example"));
        let mut right = Span::new_text("two");
        apply_edit(&mut right, LinkEdit::Link("https://two.example"));
        let mut spans = vec![left, right];
        prune_and_merge_spans(&mut spans);
        assert_eq!(spans.len(), 2);
    }

    #[test]
    fn unlink_of_plain_text_is_a_no_op() {
        let mut spans = vec![Span::new_text("plain")];
        assert!(!edit_link_in_leaf_span(&mut spans, &[0], 0, 5, LinkEdit::Unlink));
        assert_eq!(spans.len(), 1);
    }
}
