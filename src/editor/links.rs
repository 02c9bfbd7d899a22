use tdoc::{InlineStyle, ParagraphType, Span};

use super::content::{LinkEdit, apply_edit, edit_link_in_leaf_span, prune_and_merge_spans, split_text};
use super::inspect::{paragraph_type_at, span_ref_at};
use super::structure::{span_mut_in, spans_mut};
use super::{CursorPointer, DocumentEditor, ParagraphPath, PointerKey, SegmentRef};
use crate::error::LinkError;
use crate::locator::{LinkLookup, find_enclosing_link, links_in_range};
use crate::selection::SelectionRange;

impl DocumentEditor {
    pub fn link_at(&self, pointer: &CursorPointer) -> LinkLookup {
        find_enclosing_link(&self.document, Some(pointer))
    }

    pub fn range_has_link(&self, range: &SelectionRange) -> bool {
        match self.ordered_keys(range) {
            Ok((start, end)) => !links_in_range(&self.document, &self.segments, start, end).is_empty(),
            Err(_) => false,
        }
    }

    /// Links `range` to `url`.
    ///
    /// A collapsed range inside a link retargets that link. A collapsed range
    /// elsewhere inserts the URL as new linked text.
    pub fn apply_link_to_range(
        &mut self,
        range: &SelectionRange,
        url: &str,
    ) -> Result<bool, LinkError> {
        let (start, end) = self.ordered_keys(range)?;
        let start_pointer = self
            .pointer_for_key(start)
            .ok_or(LinkError::UnknownPosition)?;
        if paragraph_type_at(&self.document, &start_pointer) == Some(ParagraphType::CodeBlock) {
            return Err(LinkError::UnsupportedContext);
        }

        if start == end {
            if let LinkLookup::Found(link) = self.link_at(&start_pointer) {
                return Ok(self.retarget_link(&link.paragraph_path, link.span_path.indices(), url));
            }
            if url.is_empty() {
                return Err(LinkError::EmptyTarget);
            }
            return self.insert_link_text(&start_pointer, url);
        }

        let cursor = self.paragraph_offset(&self.cursor.clone());
        let pieces = self.pieces_in_range(start, end);
        let mut touched: Vec<ParagraphPath> = Vec::new();
        let mut changed = false;
        for (segment, from, to) in pieces.into_iter().rev() {
            if paragraph_type_at(&self.document, &segment.start()) == Some(ParagraphType::CodeBlock) {
                continue;
            }
            let Some(spans) = spans_mut(&mut self.document, &segment.paragraph_path) else {
                continue;
            };
            if edit_link_in_leaf_span(spans, segment.span_path.indices(), from, to, LinkEdit::Link(url)) {
                changed = true;
                if !touched.contains(&segment.paragraph_path) {
                    touched.push(segment.paragraph_path.clone());
                }
            }
        }
        self.finish_edit(&touched, cursor);
        Ok(changed)
    }

    /// Strips link annotations from `range`. A collapsed range removes the
    /// whole enclosing link.
    pub fn remove_link_from_range(&mut self, range: &SelectionRange) -> Result<bool, LinkError> {
        let (start, end) = self.ordered_keys(range)?;
        let cursor = self.paragraph_offset(&self.cursor.clone());

        if start == end {
            let position = self
                .pointer_for_key(start)
                .ok_or(LinkError::UnknownPosition)?;
            let LinkLookup::Found(link) = self.link_at(&position) else {
                return Ok(false);
            };
            let changed = self.unwrap_link(&link.paragraph_path, link.span_path.indices());
            self.finish_edit(&[link.paragraph_path], cursor);
            return Ok(changed);
        }

        let pieces = self.pieces_in_range(start, end);
        let mut touched: Vec<ParagraphPath> = Vec::new();
        let mut changed = false;
        for (segment, from, to) in pieces.into_iter().rev() {
            let LinkLookup::Found(link) = self.link_at(&segment.start()) else {
                continue;
            };
            let edited = if link.span_path == segment.span_path {
                match spans_mut(&mut self.document, &segment.paragraph_path) {
                    Some(spans) => edit_link_in_leaf_span(
                        spans,
                        segment.span_path.indices(),
                        from,
                        to,
                        LinkEdit::Unlink,
                    ),
                    None => false,
                }
            } else {
                // A link wrapping other spans carries a single style, so the
                // whole wrapper is unlinked.
                self.unwrap_link(&link.paragraph_path, link.span_path.indices())
            };
            if edited {
                changed = true;
                if !touched.contains(&segment.paragraph_path) {
                    touched.push(segment.paragraph_path.clone());
                }
            }
        }
        self.finish_edit(&touched, cursor);
        Ok(changed)
    }

    /// Text covered by `range`, with a newline between paragraphs.
    pub fn text_in_range(&self, range: &SelectionRange) -> Result<String, LinkError> {
        let (start, end) = self.ordered_keys(range)?;
        let mut text = String::new();
        let mut previous: Option<ParagraphPath> = None;
        for (segment, from, to) in self.pieces_in_range(start, end) {
            if previous.as_ref().is_some_and(|path| *path != segment.paragraph_path) {
                text.push('\n');
            }
            if let Some(span) = span_ref_at(&self.document, &segment.paragraph_path, &segment.span_path) {
                text.extend(span.text.chars().skip(from).take(to - from));
            }
            previous = Some(segment.paragraph_path);
        }
        Ok(text)
    }

    /// Paragraph-relative character offset of `pointer`, stable across span
    /// splits and merges inside the paragraph.
    pub fn paragraph_offset(&self, pointer: &CursorPointer) -> Option<(ParagraphPath, usize)> {
        let key = self.pointer_key(pointer)?;
        let before: usize = self.segments[..key.segment_index]
            .iter()
            .filter(|segment| segment.paragraph_path == pointer.paragraph_path)
            .map(|segment| segment.len)
            .sum();
        Some((pointer.paragraph_path.clone(), before + key.offset))
    }

    pub fn pointer_at_paragraph_offset(
        &self,
        paragraph_path: &ParagraphPath,
        offset: usize,
    ) -> Option<CursorPointer> {
        let mut remaining = offset;
        let mut last: Option<&SegmentRef> = None;
        for segment in self
            .segments
            .iter()
            .filter(|segment| &segment.paragraph_path == paragraph_path)
        {
            if remaining <= segment.len {
                let mut pointer = segment.start();
                pointer.offset = remaining;
                return Some(pointer);
            }
            remaining -= segment.len;
            last = Some(segment);
        }
        last.map(SegmentRef::end)
    }

    fn ordered_keys(&self, range: &SelectionRange) -> Result<(PointerKey, PointerKey), LinkError> {
        let start = self
            .pointer_key(&range.start)
            .ok_or(LinkError::UnknownPosition)?;
        let end = self
            .pointer_key(&range.end)
            .ok_or(LinkError::UnknownPosition)?;
        Ok(if end < start { (end, start) } else { (start, end) })
    }

    /// Segments covered by `[start, end)` with the covered character range of each.
    fn pieces_in_range(&self, start: PointerKey, end: PointerKey) -> Vec<(SegmentRef, usize, usize)> {
        let mut pieces = Vec::new();
        for index in start.segment_index..=end.segment_index {
            let Some(segment) = self.segments.get(index) else {
                break;
            };
            let from = if index == start.segment_index { start.offset } else { 0 };
            let to = if index == end.segment_index { end.offset } else { segment.len };
            if from < to {
                pieces.push((segment.clone(), from, to));
            }
        }
        pieces
    }

    fn retarget_link(&mut self, paragraph_path: &ParagraphPath, span_path: &[usize], url: &str) -> bool {
        let Some(spans) = spans_mut(&mut self.document, paragraph_path) else {
            return false;
        };
        let Some(span) = span_mut_in(spans, span_path) else {
            return false;
        };
        if span.link_target.as_deref() == Some(url) {
            return false;
        }
        span.link_target = Some(url.to_string());
        true
    }

    fn unwrap_link(&mut self, paragraph_path: &ParagraphPath, span_path: &[usize]) -> bool {
        let Some(spans) = spans_mut(&mut self.document, paragraph_path) else {
            return false;
        };
        let Some(span) = span_mut_in(spans, span_path) else {
            return false;
        };
        if span.style != InlineStyle::Link {
            return false;
        }
        apply_edit(span, LinkEdit::Unlink);
        true
    }

    fn insert_link_text(&mut self, at: &CursorPointer, url: &str) -> Result<bool, LinkError> {
        let (paragraph_path, offset) = self
            .paragraph_offset(at)
            .ok_or(LinkError::UnknownPosition)?;
        let spans =
            spans_mut(&mut self.document, &at.paragraph_path).ok_or(LinkError::UnknownPosition)?;
        if !insert_link_span(spans, at.span_path.indices(), at.offset, url) {
            return Err(LinkError::UnknownPosition);
        }
        self.rebuild_segments();
        let end = offset + url.chars().count();
        if let Some(pointer) = self.pointer_at_paragraph_offset(&paragraph_path, end) {
            self.move_to_pointer(&pointer);
        }
        Ok(true)
    }

    fn finish_edit(&mut self, touched: &[ParagraphPath], cursor: Option<(ParagraphPath, usize)>) {
        for path in touched {
            if let Some(spans) = spans_mut(&mut self.document, path) {
                prune_and_merge_spans(spans);
            }
        }
        self.rebuild_segments();
        if let Some((path, offset)) = cursor
            && let Some(pointer) = self.pointer_at_paragraph_offset(&path, offset)
        {
            self.move_to_pointer(&pointer);
        }
    }
}

/// Splits the leaf at `path` and puts a new link span carrying `url` as its
/// text between the two halves.
fn insert_link_span(spans: &mut Vec<Span>, path: &[usize], offset: usize, url: &str) -> bool {
    let Some((&idx, rest)) = path.split_first() else {
        return false;
    };
    if idx >= spans.len() {
        return false;
    }
    if !rest.is_empty() {
        return insert_link_span(&mut spans[idx].children, rest, offset, url);
    }

    let original = spans.remove(idx);
    let (left_text, right_text) = split_text(&original.text, offset);
    let mut replacements = Vec::new();
    if !left_text.is_empty() {
        let mut left = original.clone();
        left.text = left_text;
        left.children.clear();
        replacements.push(left);
    }
    let mut link = Span::new_text(url);
    apply_edit(&mut link, LinkEdit::Link(url));
    replacements.push(link);
    if !right_text.is_empty() || !original.children.is_empty() {
        let mut right = original;
        right.text = right_text;
        replacements.push(right);
    }
    for (shift, span) in replacements.into_iter().enumerate() {
        spans.insert(idx + shift, span);
    }
    true
}
