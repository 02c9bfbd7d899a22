use std::cmp::Ordering;

use tdoc::Document;

mod content;
mod cursor;
mod inspect;
mod links;
mod structure;

pub(crate) use inspect::{
    emits_segment, first_text_span_path, last_text_span_path, paragraph_type_at, span_ref_at,
};

pub(crate) use content::char_to_byte_idx;
use content::{insert_char_at, remove_char_at};
use inspect::collect_segments;
use structure::ensure_document_initialized;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParagraphPath {
    steps: Vec<PathStep>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum PathStep {
    Root(usize),
    Child(usize),
    Entry {
        entry_index: usize,
        paragraph_index: usize,
    },
    ChecklistItem {
        indices: Vec<usize>,
    },
}

impl ParagraphPath {
    pub fn new_root(idx: usize) -> Self {
        Self {
            steps: vec![PathStep::Root(idx)],
        }
    }

    pub(crate) fn from_steps(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn push_child(&mut self, idx: usize) {
        self.steps.push(PathStep::Child(idx));
    }

    pub fn push_entry(&mut self, entry_index: usize, paragraph_index: usize) {
        self.steps.push(PathStep::Entry {
            entry_index,
            paragraph_index,
        });
    }

    pub fn push_checklist_item(&mut self, indices: Vec<usize>) {
        self.steps.push(PathStep::ChecklistItem { indices });
    }

    fn pop(&mut self) {
        if self.steps.len() > 1 {
            self.steps.pop();
        }
    }

    pub(crate) fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for ParagraphPath {
    fn default() -> Self {
        Self { steps: Vec::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct SpanPath {
    indices: Vec<usize>,
}

impl SpanPath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    pub fn push(&mut self, idx: usize) {
        self.indices.push(idx);
    }

    pub fn pop(&mut self) {
        self.indices.pop();
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// The path of the enclosing span, if any.
    pub fn parent(&self) -> Option<SpanPath> {
        if self.indices.len() <= 1 {
            return None;
        }
        Some(SpanPath::new(self.indices[..self.indices.len() - 1].to_vec()))
    }
}

/// A logical position in the document: a character offset inside the text
/// of the span addressed by `paragraph_path` and `span_path`.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct CursorPointer {
    pub paragraph_path: ParagraphPath,
    pub span_path: SpanPath,
    pub offset: usize,
}

impl CursorPointer {
    pub fn new(paragraph_path: ParagraphPath, span_path: SpanPath, offset: usize) -> Self {
        Self {
            paragraph_path,
            span_path,
            offset,
        }
    }

    fn update_from_segment(&mut self, segment: &SegmentRef) {
        self.paragraph_path = segment.paragraph_path.clone();
        self.span_path = segment.span_path.clone();
    }

    fn is_valid(&self) -> bool {
        !self.paragraph_path.is_empty() && !self.span_path.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct SegmentRef {
    pub paragraph_path: ParagraphPath,
    pub span_path: SpanPath,
    pub len: usize,
}

impl SegmentRef {
    fn matches_pointer(&self, pointer: &CursorPointer) -> bool {
        self.paragraph_path == pointer.paragraph_path && self.span_path == pointer.span_path
    }

    pub fn start(&self) -> CursorPointer {
        CursorPointer::new(self.paragraph_path.clone(), self.span_path.clone(), 0)
    }

    pub fn end(&self) -> CursorPointer {
        CursorPointer::new(
            self.paragraph_path.clone(),
            self.span_path.clone(),
            self.len,
        )
    }
}

/// Total order over positions: index of the text segment in document order,
/// then the character offset inside it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PointerKey {
    pub segment_index: usize,
    pub offset: usize,
}

#[derive(Debug)]
pub struct DocumentEditor {
    document: Document,
    segments: Vec<SegmentRef>,
    cursor: CursorPointer,
    cursor_segment: usize,
}

impl DocumentEditor {
    pub fn new(mut document: Document) -> Self {
        ensure_document_initialized(&mut document);
        let mut editor = Self {
            document,
            segments: Vec::new(),
            cursor: CursorPointer::default(),
            cursor_segment: 0,
        };
        editor.rebuild_segments();
        editor.ensure_cursor_selectable();
        editor
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn segments(&self) -> &[SegmentRef] {
        &self.segments
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let pointer = self.cursor.clone();
        if !pointer.is_valid() {
            return false;
        }
        if insert_char_at(&mut self.document, &pointer, pointer.offset, ch) {
            self.cursor.offset += 1;
            self.rebuild_segments();
            true
        } else {
            false
        }
    }

    pub fn insert_text(&mut self, text: &str) -> bool {
        let mut changed = false;
        for ch in text.chars() {
            changed |= self.insert_char(ch);
        }
        changed
    }

    pub fn backspace(&mut self) -> bool {
        if self.segments.is_empty() {
            return false;
        }
        if self.cursor.offset == 0 {
            // Delete the last character of the previous segment in the same paragraph.
            let Some(previous) = self.cursor_segment.checked_sub(1) else {
                return false;
            };
            let segment = self.segments[previous].clone();
            if segment.paragraph_path != self.cursor.paragraph_path || segment.len == 0 {
                return false;
            }
            let pointer = segment.end();
            if remove_char_at(&mut self.document, &pointer, segment.len - 1) {
                self.rebuild_segments();
                return true;
            }
            return false;
        }
        let pointer = self.cursor.clone();
        if remove_char_at(&mut self.document, &pointer, pointer.offset - 1) {
            self.cursor.offset -= 1;
            self.rebuild_segments();
            true
        } else {
            false
        }
    }

    pub fn compare_pointers(&self, a: &CursorPointer, b: &CursorPointer) -> Option<Ordering> {
        let key_a = self.pointer_key(a)?;
        let key_b = self.pointer_key(b)?;
        Some(key_a.cmp(&key_b))
    }

    pub fn pointer_key(&self, pointer: &CursorPointer) -> Option<PointerKey> {
        for (index, segment) in self.segments.iter().enumerate() {
            if segment.matches_pointer(pointer) {
                let offset = pointer.offset.min(segment.len);
                return Some(PointerKey {
                    segment_index: index,
                    offset,
                });
            }
        }
        None
    }

    pub fn pointer_for_key(&self, key: PointerKey) -> Option<CursorPointer> {
        let segment = self.segments.get(key.segment_index)?;
        Some(CursorPointer::new(
            segment.paragraph_path.clone(),
            segment.span_path.clone(),
            key.offset.min(segment.len),
        ))
    }

    pub(crate) fn rebuild_segments(&mut self) {
        self.segments = collect_segments(&self.document);
        if self.segments.is_empty() {
            ensure_document_initialized(&mut self.document);
            self.segments = collect_segments(&self.document);
        }
        if self.segments.is_empty() {
            self.cursor = CursorPointer::default();
            self.cursor_segment = 0;
            return;
        }
        self.sync_cursor_segment();
        self.clamp_cursor_offset();
    }

    fn sync_cursor_segment(&mut self) {
        if let Some(index) = self
            .segments
            .iter()
            .position(|segment| segment.matches_pointer(&self.cursor))
        {
            self.cursor_segment = index;
        } else {
            let index = self.cursor_segment.min(self.segments.len() - 1);
            let segment = self.segments[index].clone();
            self.cursor_segment = index;
            self.cursor.update_from_segment(&segment);
        }
    }

    fn clamp_cursor_offset(&mut self) {
        let len = self.current_segment_len();
        if self.cursor.offset > len {
            self.cursor.offset = len;
        }
    }

    fn current_segment_len(&self) -> usize {
        self.segments
            .get(self.cursor_segment)
            .map(|segment| segment.len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
