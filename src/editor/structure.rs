use tdoc::{ChecklistItem, Document, Paragraph, Span};

use super::{ParagraphPath, PathStep};

pub(crate) fn ensure_document_initialized(document: &mut Document) {
    if document.paragraphs.is_empty() {
        document
            .paragraphs
            .push(Paragraph::new_text().with_content(vec![Span::new_text("")]));
    } else if let Some(first) = document.paragraphs.get_mut(0)
        && first.paragraph_type().is_leaf()
        && first.content().is_empty()
    {
        first.content_mut().push(Span::new_text(""));
    }
}

pub(crate) fn paragraph_mut<'a>(
    document: &'a mut Document,
    path: &ParagraphPath,
) -> Option<&'a mut Paragraph> {
    let mut iter = path.steps().iter();
    let first = iter.next()?;
    let mut paragraph = match first {
        PathStep::Root(idx) => document.paragraphs.get_mut(*idx)?,
        _ => return None,
    };
    for step in iter {
        paragraph = match step {
            PathStep::Child(idx) => {
                let Paragraph::Quote { children } = paragraph else {
                    return None;
                };
                children.get_mut(*idx)?
            }
            PathStep::Entry {
                entry_index,
                paragraph_index,
            } => match paragraph {
                Paragraph::OrderedList { entries } | Paragraph::UnorderedList { entries } => {
                    let entry = entries.get_mut(*entry_index)?;
                    entry.get_mut(*paragraph_index)?
                }
                _ => return None,
            },
            PathStep::ChecklistItem { .. } => return None,
            PathStep::Root(_) => return None,
        };
    }
    Some(paragraph)
}

pub(crate) fn checklist_item_mut<'a>(
    document: &'a mut Document,
    path: &ParagraphPath,
) -> Option<&'a mut ChecklistItem> {
    let steps = path.steps();
    let (checklist_step_idx, checklist_step) = steps
        .iter()
        .enumerate()
        .find(|(_, s)| matches!(s, PathStep::ChecklistItem { .. }))?;

    let PathStep::ChecklistItem { indices } = checklist_step else {
        return None;
    };

    let paragraph_path = ParagraphPath::from_steps(steps[..checklist_step_idx].to_vec());
    let paragraph = paragraph_mut(document, &paragraph_path)?;

    let Paragraph::Checklist { items } = paragraph else {
        return None;
    };

    let mut item: &mut ChecklistItem = items.get_mut(*indices.first()?)?;
    for &idx in &indices[1..] {
        item = item.children.get_mut(idx)?;
    }
    Some(item)
}

/// Mutable inline content of the paragraph or checklist item at `path`.
pub(crate) fn spans_mut<'a>(
    document: &'a mut Document,
    path: &ParagraphPath,
) -> Option<&'a mut Vec<Span>> {
    let is_checklist_item = path
        .steps()
        .iter()
        .any(|step| matches!(step, PathStep::ChecklistItem { .. }));
    if is_checklist_item {
        return checklist_item_mut(document, path).map(|item| &mut item.content);
    }
    let paragraph = paragraph_mut(document, path)?;
    if !paragraph.paragraph_type().is_leaf() {
        return None;
    }
    Some(paragraph.content_mut())
}

pub(crate) fn span_mut_in<'a>(spans: &'a mut [Span], path: &[usize]) -> Option<&'a mut Span> {
    let (first, rest) = path.split_first()?;
    let mut span = spans.get_mut(*first)?;
    for idx in rest {
        span = span.children.get_mut(*idx)?;
    }
    Some(span)
}
