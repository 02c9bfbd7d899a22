use super::{CursorPointer, ParagraphPath, PathStep, SegmentRef, SpanPath};
use tdoc::{ChecklistItem, Document, Paragraph, ParagraphType, Span};

pub fn collect_segments(document: &Document) -> Vec<SegmentRef> {
    let mut result = Vec::new();
    for (idx, paragraph) in document.paragraphs.iter().enumerate() {
        let mut path = ParagraphPath::new_root(idx);
        collect_paragraph_segments(paragraph, &mut path, &mut result);
    }
    result
}

pub fn paragraph_ref<'a>(document: &'a Document, path: &ParagraphPath) -> Option<&'a Paragraph> {
    let mut iter = path.steps().iter();
    let first = iter.next()?;
    let mut paragraph = match first {
        PathStep::Root(idx) => document.paragraphs.get(*idx)?,
        _ => return None,
    };
    for step in iter {
        paragraph = match step {
            PathStep::Child(idx) => match paragraph {
                Paragraph::Quote { children } => children.get(*idx)?,
                _ => return None,
            },
            PathStep::Entry {
                entry_index,
                paragraph_index,
            } => match paragraph {
                Paragraph::OrderedList { entries } | Paragraph::UnorderedList { entries } => {
                    let entry = entries.get(*entry_index)?;
                    entry.get(*paragraph_index)?
                }
                _ => return None,
            },
            PathStep::ChecklistItem { .. } => return None,
            PathStep::Root(_) => return None,
        };
    }
    Some(paragraph)
}

pub fn checklist_item_ref<'a>(
    document: &'a Document,
    path: &ParagraphPath,
) -> Option<&'a ChecklistItem> {
    let steps = path.steps();
    let (checklist_step_idx, checklist_step) = steps
        .iter()
        .enumerate()
        .find(|(_, s)| matches!(s, PathStep::ChecklistItem { .. }))?;

    let PathStep::ChecklistItem { indices } = checklist_step else {
        return None;
    };

    let paragraph_path = ParagraphPath::from_steps(steps[..checklist_step_idx].to_vec());
    let paragraph = paragraph_ref(document, &paragraph_path)?;

    let mut item: &ChecklistItem = paragraph.checklist_items().get(*indices.first()?)?;
    for &idx in &indices[1..] {
        item = item.children.get(idx)?;
    }
    Some(item)
}

/// The inline content addressed by a paragraph path, whether it belongs to a
/// paragraph or to a checklist item.
pub fn spans_at<'a>(document: &'a Document, path: &ParagraphPath) -> Option<&'a [Span]> {
    if let Some(item) = checklist_item_ref(document, path) {
        return Some(&item.content);
    }
    let paragraph = paragraph_ref(document, path)?;
    Some(paragraph.content())
}

pub fn span_ref_at<'a>(
    document: &'a Document,
    paragraph_path: &ParagraphPath,
    span_path: &SpanPath,
) -> Option<&'a Span> {
    let spans = spans_at(document, paragraph_path)?;
    let mut iter = span_path.indices().iter();
    let first = iter.next()?;
    let mut span = spans.get(*first)?;
    for idx in iter {
        span = span.children.get(*idx)?;
    }
    Some(span)
}

pub fn paragraph_type_at(document: &Document, pointer: &CursorPointer) -> Option<ParagraphType> {
    if checklist_item_ref(document, &pointer.paragraph_path).is_some() {
        return Some(ParagraphType::Checklist);
    }
    paragraph_ref(document, &pointer.paragraph_path).map(|paragraph| paragraph.paragraph_type())
}

/// Whether a span produces its own text segment.
pub fn emits_segment(span: &Span) -> bool {
    span.children.is_empty() || !span.text.is_empty()
}

/// Path of the first text segment inside the subtree rooted at `path`.
pub fn first_text_span_path(span: &Span, path: &SpanPath) -> Option<SpanPath> {
    if emits_segment(span) {
        return Some(path.clone());
    }
    for (idx, child) in span.children.iter().enumerate() {
        let mut child_path = path.clone();
        child_path.push(idx);
        if let Some(found) = first_text_span_path(child, &child_path) {
            return Some(found);
        }
    }
    None
}

/// Path of the last text segment inside the subtree rooted at `path`.
pub fn last_text_span_path(span: &Span, path: &SpanPath) -> Option<SpanPath> {
    for (idx, child) in span.children.iter().enumerate().rev() {
        let mut child_path = path.clone();
        child_path.push(idx);
        if let Some(found) = last_text_span_path(child, &child_path) {
            return Some(found);
        }
    }
    if emits_segment(span) {
        Some(path.clone())
    } else {
        None
    }
}

fn collect_paragraph_segments(
    paragraph: &Paragraph,
    path: &mut ParagraphPath,
    segments: &mut Vec<SegmentRef>,
) {
    if paragraph.paragraph_type().is_leaf() {
        collect_span_segments(paragraph.content(), path, segments);
    }
    for (child_index, child) in paragraph.children().iter().enumerate() {
        path.push_child(child_index);
        collect_paragraph_segments(child, path, segments);
        path.pop();
    }
    for (entry_index, entry) in paragraph.entries().iter().enumerate() {
        for (child_index, child) in entry.iter().enumerate() {
            path.push_entry(entry_index, child_index);
            collect_paragraph_segments(child, path, segments);
            path.pop();
        }
    }
    if paragraph.paragraph_type() == ParagraphType::Checklist {
        for (item_index, item) in paragraph.checklist_items().iter().enumerate() {
            collect_checklist_item_segments(item, path, &[item_index], segments);
        }
    }
}

fn collect_checklist_item_segments(
    item: &ChecklistItem,
    path: &mut ParagraphPath,
    indices: &[usize],
    segments: &mut Vec<SegmentRef>,
) {
    path.push_checklist_item(indices.to_vec());
    collect_span_segments(&item.content, path, segments);
    path.pop();

    for (child_index, child) in item.children.iter().enumerate() {
        let mut child_indices = indices.to_vec();
        child_indices.push(child_index);
        collect_checklist_item_segments(child, path, &child_indices, segments);
    }
}

fn collect_span_segments(spans: &[Span], path: &ParagraphPath, segments: &mut Vec<SegmentRef>) {
    for (index, span) in spans.iter().enumerate() {
        let mut span_path = SpanPath::new(vec![index]);
        collect_span_rec(span, path, &mut span_path, segments);
    }
}

fn collect_span_rec(
    span: &Span,
    paragraph_path: &ParagraphPath,
    span_path: &mut SpanPath,
    segments: &mut Vec<SegmentRef>,
) {
    if emits_segment(span) {
        segments.push(SegmentRef {
            paragraph_path: paragraph_path.clone(),
            span_path: span_path.clone(),
            len: span.text.chars().count(),
        });
    }

    for (child_index, child) in span.children.iter().enumerate() {
        span_path.push(child_index);
        collect_span_rec(child, paragraph_path, span_path, segments);
        span_path.pop();
    }
}
