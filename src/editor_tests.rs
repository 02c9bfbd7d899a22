use pretty_assertions::assert_eq;
use tdoc::{ChecklistItem, InlineStyle, Paragraph, Span, ftml};

use super::*;

fn pointer_to_root_span(root_index: usize) -> CursorPointer {
    CursorPointer::new(ParagraphPath::new_root(root_index), SpanPath::new(vec![0]), 0)
}

fn pointer_to_child_span(root_index: usize, child_index: usize) -> CursorPointer {
    let mut path = ParagraphPath::new_root(root_index);
    path.push_child(child_index);
    CursorPointer::new(path, SpanPath::new(vec![0]), 0)
}

fn pointer_to_checklist_item_span(root_index: usize, item_index: usize) -> CursorPointer {
    let mut path = ParagraphPath::new_root(root_index);
    path.push_checklist_item(vec![item_index]);
    CursorPointer::new(path, SpanPath::new(vec![0]), 0)
}

fn text_paragraph(text: &str) -> Paragraph {
    Paragraph::new_text().with_content(vec![Span::new_text(text)])
}

fn link(text: &str, target: &str) -> Span {
    let mut span = Span::new_text(text);
    span.style = InlineStyle::Link;
    span.link_target = Some(target.to_string());
    span
}

#[test]
fn empty_document_gets_an_editable_paragraph() {
    let editor = DocumentEditor::new(Document::new());
    assert_eq!(editor.document().paragraphs.len(), 1);
    assert_eq!(editor.segments().len(), 1);
    assert_eq!(editor.cursor_pointer(), pointer_to_root_span(0));
}

#[test]
fn typing_inserts_at_the_cursor() {
    let document = Document::new().with_paragraphs(vec![text_paragraph("Hello")]);
    let mut editor = DocumentEditor::new(document);
    let mut pointer = pointer_to_root_span(0);
    pointer.offset = 5;
    assert!(editor.move_to_pointer(&pointer));

    assert!(editor.insert_text(", world"));
    assert_eq!(editor.document().paragraphs[0].content()[0].text, "Hello, world");
    assert_eq!(editor.cursor_pointer().offset, 12);
}

#[test]
fn backspace_at_span_start_deletes_from_previous_span() {
    let paragraph = Paragraph::new_text()
        .with_content(vec![Span::new_text("Visit "), link("docs", "https://docs.rs")]);
    let mut editor = DocumentEditor::new(Document::new().with_paragraphs(vec![paragraph]));
    let pointer = CursorPointer::new(ParagraphPath::new_root(0), SpanPath::new(vec![1]), 0);
    assert!(editor.move_to_pointer(&pointer));

    assert!(editor.backspace());
    let content = editor.document().paragraphs[0].content();
    assert_eq!(content[0].text, "Visit");
    assert_eq!(content[1].text, "docs");
    assert_eq!(editor.cursor_pointer(), pointer);
}

#[test]
fn backspace_does_not_join_paragraphs() {
    let document =
        Document::new().with_paragraphs(vec![text_paragraph("One"), text_paragraph("Two")]);
    let mut editor = DocumentEditor::new(document);
    assert!(editor.move_to_pointer(&pointer_to_root_span(1)));
    assert!(!editor.backspace());
    assert_eq!(editor.document().paragraphs.len(), 2);
}

#[test]
fn movement_skips_duplicate_spot_between_spans() {
    let paragraph = Paragraph::new_text()
        .with_content(vec![Span::new_text("ab"), link("cd", "https://example.com")]);
    let mut editor = DocumentEditor::new(Document::new().with_paragraphs(vec![paragraph]));

    assert!(editor.move_right());
    assert!(editor.move_right());
    assert!(editor.move_right());
    let cursor = editor.cursor_pointer();
    assert_eq!(cursor.span_path, SpanPath::new(vec![1]));
    assert_eq!(cursor.offset, 1);

    assert!(editor.move_left());
    assert!(editor.move_left());
    let cursor = editor.cursor_pointer();
    assert_eq!(cursor.span_path, SpanPath::new(vec![0]));
    assert_eq!(cursor.offset, 1);
}

#[test]
fn paragraph_start_and_end() {
    let paragraph = Paragraph::new_text()
        .with_content(vec![Span::new_text("Visit "), link("docs", "https://docs.rs")]);
    let mut editor = DocumentEditor::new(Document::new().with_paragraphs(vec![paragraph]));
    editor.move_to_paragraph_end();
    let end = editor.cursor_pointer();
    assert_eq!(end.span_path, SpanPath::new(vec![1]));
    assert_eq!(end.offset, 4);

    editor.move_to_paragraph_start();
    assert_eq!(editor.cursor_pointer(), pointer_to_root_span(0));
}

#[test]
fn pointers_compare_in_document_order() {
    let document = ftml! {
        p { "First" }
        quote {
            p { "Quoted" }
        }
    };
    let editor = DocumentEditor::new(document);
    let first = pointer_to_root_span(0);
    let quoted = pointer_to_child_span(1, 0);
    assert_eq!(
        editor.compare_pointers(&first, &quoted),
        Some(std::cmp::Ordering::Less)
    );

    let stale = pointer_to_root_span(7);
    assert_eq!(editor.compare_pointers(&first, &stale), None);
}

#[test]
fn pointer_key_round_trips_through_segments() {
    let document = ftml! {
        ul {
            li { p { "Alpha" } }
            li { p { "Beta" } }
        }
    };
    let editor = DocumentEditor::new(document);
    let key = PointerKey {
        segment_index: 1,
        offset: 2,
    };
    let pointer = editor.pointer_for_key(key).unwrap();
    assert_eq!(editor.pointer_key(&pointer), Some(key));
}

#[test]
fn checklist_items_are_editable() {
    let item = ChecklistItem::new(false).with_content(vec![Span::new_text("Task")]);
    let checklist = Paragraph::new_checklist().with_checklist_items(vec![item]);
    let mut editor = DocumentEditor::new(Document::new().with_paragraphs(vec![checklist]));
    let mut pointer = pointer_to_checklist_item_span(0, 0);
    pointer.offset = 4;
    assert!(editor.move_to_pointer(&pointer));
    assert!(editor.insert_char('s'));
    assert_eq!(
        editor.document().paragraphs[0].checklist_items()[0].content[0].text,
        "Tasks"
    );
}

#[test]
fn paragraph_offset_spans_segments() {
    let paragraph = Paragraph::new_text().with_content(vec![
        Span::new_text("Visit "),
        link("docs", "https://docs.rs"),
        Span::new_text(" today"),
    ]);
    let editor = DocumentEditor::new(Document::new().with_paragraphs(vec![paragraph]));
    let pointer = CursorPointer::new(ParagraphPath::new_root(0), SpanPath::new(vec![2]), 3);
    let (path, offset) = editor.paragraph_offset(&pointer).unwrap();
    assert_eq!(path, ParagraphPath::new_root(0));
    assert_eq!(offset, 13);
    assert_eq!(editor.pointer_at_paragraph_offset(&path, 13), Some(pointer));
}
