use std::cmp::Ordering;
use std::ops::{Deref, DerefMut};

use ratatui::layout::{Position, Rect};
use tdoc::Document;

use crate::editor::{CursorPointer, DocumentEditor, ParagraphPath};
use crate::error::LinkError;
use crate::render::{CursorDisplay, CursorVisualPosition, RenderOptions, RenderResult, render_document};
use crate::selection::{Selection, SelectionRange};
use crate::surface::{EditingSurface, EditingView, MutationEngine};
use crate::theme::Theme;

/// EditorDisplay wraps a DocumentEditor and manages all visual concerns:
/// selection, focus, wrapping, and the mapping between document positions
/// and screen cells.
#[derive(Debug)]
pub struct EditorDisplay {
    editor: DocumentEditor,
    visual_positions: Vec<CursorDisplay>,
    last_cursor_visual: Option<CursorVisualPosition>,
    preferred_column: Option<u16>,
    cursor_following: bool,
    selection_anchor: Option<CursorPointer>,
    focused: bool,
    revision: u64,
    last_view_height: usize,
    last_total_lines: usize,
    last_text_area: Rect,
    scroll_top: usize,
}

impl EditorDisplay {
    pub fn new(editor: DocumentEditor) -> Self {
        Self {
            editor,
            visual_positions: Vec::new(),
            last_cursor_visual: None,
            preferred_column: None,
            cursor_following: true,
            selection_anchor: None,
            focused: true,
            revision: 0,
            last_view_height: 1,
            last_total_lines: 0,
            last_text_area: Rect::default(),
            scroll_top: 0,
        }
    }

    pub fn visual_positions(&self) -> &[CursorDisplay] {
        &self.visual_positions
    }

    pub fn last_cursor_visual(&self) -> Option<CursorVisualPosition> {
        self.last_cursor_visual
    }

    pub fn set_preferred_column(&mut self, column: Option<u16>) {
        self.preferred_column = column;
    }

    pub fn cursor_following(&self) -> bool {
        self.cursor_following
    }

    pub fn set_cursor_following(&mut self, following: bool) {
        self.cursor_following = following;
    }

    pub fn last_view_height(&self) -> usize {
        self.last_view_height
    }

    pub fn last_total_lines(&self) -> usize {
        self.last_total_lines
    }

    /// Bumped by every link mutation that changed the document.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    /// Start or drop the selection anchor before a cursor move.
    pub fn prepare_selection(&mut self, extend: bool) {
        if extend {
            if self.selection_anchor.is_none() {
                self.selection_anchor = Some(self.editor.cursor_pointer());
            }
        } else {
            self.selection_anchor = None;
        }
    }

    pub fn selection_anchor(&self) -> Option<&CursorPointer> {
        self.selection_anchor.as_ref()
    }

    pub fn set_selection_anchor(&mut self, anchor: Option<CursorPointer>) {
        self.selection_anchor = anchor;
    }

    pub fn clear_selection(&mut self) {
        self.selection_anchor = None;
    }

    /// The selection in document order. A stale anchor collapses it to the caret.
    pub fn current_selection(&self) -> Selection {
        let focus = self.editor.cursor_pointer();
        let Some(anchor) = self.selection_anchor.clone() else {
            return Selection::caret(focus);
        };
        match self.editor.compare_pointers(&anchor, &focus) {
            Some(Ordering::Less) => Selection::new(anchor, focus),
            Some(Ordering::Greater) => Selection::new(focus, anchor),
            Some(Ordering::Equal) | None => Selection::caret(focus),
        }
    }

    pub fn render_document(&mut self, wrap_width: usize, theme: &Theme) -> RenderResult {
        let selection = self.current_selection();
        let selection_keys = if selection.is_collapsed() {
            None
        } else {
            self.editor
                .pointer_key(selection.first_position())
                .zip(self.editor.pointer_key(selection.last_position()))
        };
        let options = RenderOptions {
            width: wrap_width,
            cursor: self.editor.pointer_key(&self.editor.cursor_pointer()),
            selection: selection_keys,
            theme,
        };
        let result = render_document(self.editor.document(), self.editor.segments(), &options);

        self.visual_positions = result.cursor_map.clone();
        self.last_cursor_visual = result.cursor;
        if self.preferred_column.is_none() {
            self.preferred_column = result.cursor.map(|p| p.column);
        }
        result
    }

    /// Record where the last render landed on screen.
    pub fn update_after_render(&mut self, text_area: Rect, total_lines: usize, scroll_top: usize) {
        self.last_text_area = text_area;
        self.last_total_lines = total_lines;
        self.last_view_height = (text_area.height as usize).max(1);
        self.scroll_top = scroll_top;
    }

    pub fn move_cursor_vertical(&mut self, delta: i32) {
        if self.visual_positions.is_empty() || delta == 0 {
            return;
        }

        let pointer = self.editor.cursor_pointer();
        let Some(current) = self
            .visual_positions
            .iter()
            .find(|entry| entry.pointer == pointer)
            .map(|entry| entry.position)
            .or(self.last_cursor_visual)
        else {
            return;
        };

        let desired_column = self.preferred_column.unwrap_or(current.column);
        let max_line = self.max_line();
        let target_line = (current.line as i64 + delta as i64).clamp(0, max_line as i64) as usize;

        let destination = self
            .closest_pointer_on_line(target_line, desired_column)
            .filter(|dest| dest.position.line != current.line)
            .or_else(|| self.search_nearest_line(target_line, delta, desired_column));

        if let Some(dest) = destination
            && dest.pointer != pointer
            && self.editor.move_to_pointer(&dest.pointer)
        {
            self.preferred_column = Some(desired_column);
            self.last_cursor_visual = Some(dest.position);
        }
    }

    pub fn page_jump_distance(&self) -> i32 {
        let viewport = self.last_view_height.max(1);
        let approx = ((viewport as f32) * 0.9).round() as usize;
        approx.max(1) as i32
    }

    pub fn move_page(&mut self, direction: i32) {
        if direction == 0 {
            return;
        }
        let distance = self.page_jump_distance();
        self.move_cursor_vertical(distance * direction);
    }

    pub fn move_to_visual_line_start(&mut self) {
        self.move_along_visual_line(true);
    }

    pub fn move_to_visual_line_end(&mut self) {
        self.move_along_visual_line(false);
    }

    fn move_along_visual_line(&mut self, to_start: bool) {
        self.preferred_column = None;
        let pointer = self.editor.cursor_pointer();
        let current = self
            .visual_positions
            .iter()
            .find(|entry| entry.pointer == pointer)
            .map(|entry| entry.position);

        let destination = current.and_then(|position| {
            let on_line = self
                .visual_positions
                .iter()
                .filter(|entry| entry.position.line == position.line);
            if to_start {
                on_line.min_by_key(|entry| (entry.position.column, entry.key)).cloned()
            } else {
                on_line.max_by_key(|entry| (entry.position.column, entry.key)).cloned()
            }
        });

        match destination {
            Some(target) => {
                self.editor.move_to_pointer(&target.pointer);
                self.last_cursor_visual = Some(target.position);
            }
            None if to_start => self.editor.move_to_paragraph_start(),
            None => self.editor.move_to_paragraph_end(),
        }
    }

    fn max_line(&self) -> usize {
        self.visual_positions
            .iter()
            .map(|entry| entry.position.line)
            .max()
            .unwrap_or(0)
    }

    fn closest_pointer_on_line(&self, line: usize, column: u16) -> Option<CursorDisplay> {
        self.visual_positions
            .iter()
            .filter(|entry| entry.position.line == line)
            .min_by_key(|entry| entry.position.column.abs_diff(column))
            .cloned()
    }

    /// Nearest line with content, starting at `start_line` and moving in the
    /// direction of `delta`.
    fn search_nearest_line(&self, start_line: usize, delta: i32, column: u16) -> Option<CursorDisplay> {
        let max_line = self.max_line();
        let mut distance = 1usize;
        loop {
            let line = if delta < 0 {
                start_line.checked_sub(distance)?
            } else {
                let line = start_line + distance;
                if line > max_line {
                    return None;
                }
                line
            };
            if let Some(found) = self.closest_pointer_on_line(line, column) {
                return Some(found);
            }
            distance += 1;
        }
    }

    fn closest_pointer_near_line(&self, line: usize, column: u16) -> Option<CursorDisplay> {
        if let Some(hit) = self.closest_pointer_on_line(line, column) {
            return Some(hit);
        }
        let max_line = self.max_line();
        let mut distance = 1usize;
        while line.checked_sub(distance).is_some() || line + distance <= max_line {
            if let Some(prev) = line.checked_sub(distance)
                && let Some(hit) = self.closest_pointer_on_line(prev, column)
            {
                return Some(hit);
            }
            if let Some(hit) = self.closest_pointer_on_line(line + distance, column) {
                return Some(hit);
            }
            distance += 1;
        }
        None
    }

    /// Convert mouse coordinates to the nearest document position
    pub fn pointer_from_mouse(&self, column: u16, row: u16) -> Option<CursorDisplay> {
        if self.visual_positions.is_empty() {
            return None;
        }
        let area = self.last_text_area;
        if !area.contains(Position::new(column, row)) {
            return None;
        }
        let line = self.scroll_top.saturating_add((row - area.y) as usize);
        self.closest_pointer_near_line(line, column - area.x)
    }

    pub fn focus_display(&mut self, display: &CursorDisplay) {
        if self.editor.move_to_pointer(&display.pointer) {
            self.last_cursor_visual = Some(display.position);
            self.preferred_column = Some(display.position.column);
            self.cursor_following = true;
        }
    }

    fn visual_position_of(&self, pointer: &CursorPointer, prefer_last: bool) -> Option<CursorVisualPosition> {
        let key = self.editor.pointer_key(pointer)?;
        let mut matches = self.visual_positions.iter().filter(|entry| entry.key == key);
        let found = if prefer_last {
            matches.next_back()
        } else {
            matches.next()
        };
        found.map(|entry| entry.position)
    }

    /// Screen rectangle covering `range`, clipped to the visible text area.
    pub fn region_for(&self, range: &SelectionRange) -> Option<Rect> {
        let start = self.visual_position_of(&range.start, false)?;
        let end = self.visual_position_of(&range.end, true)?;
        let (start, end) = if (end.line, end.column) < (start.line, start.column) {
            (end, start)
        } else {
            (start, end)
        };

        let area = self.last_text_area;
        let first_visible = self.scroll_top;
        let last_visible = self.scroll_top + area.height as usize;
        if end.line < first_visible || start.line >= last_visible {
            return None;
        }
        let top = start.line.max(first_visible);
        let bottom = end.line.min(last_visible.saturating_sub(1));
        let y = area.y + (top - first_visible) as u16;
        let height = (bottom - top + 1) as u16;

        if start.line == end.line {
            let x = area.x + start.column.min(area.width.saturating_sub(1));
            let width = end.column.saturating_sub(start.column).max(1);
            Some(Rect::new(x, y, width.min(area.right().saturating_sub(x)), height))
        } else {
            Some(Rect::new(area.x, y, area.width, height))
        }
    }

    /// Runs a link mutation while keeping the caret and the selection anchor
    /// on the same characters.
    fn mutate<F>(&mut self, mutation: F) -> Result<bool, LinkError>
    where
        F: FnOnce(&mut DocumentEditor) -> Result<bool, LinkError>,
    {
        let anchor: Option<(ParagraphPath, usize)> = self
            .selection_anchor
            .as_ref()
            .and_then(|anchor| self.editor.paragraph_offset(anchor));
        let changed = mutation(&mut self.editor)?;
        if changed {
            self.revision += 1;
            self.selection_anchor =
                anchor.and_then(|(path, offset)| self.editor.pointer_at_paragraph_offset(&path, offset));
            self.preferred_column = None;
        }
        Ok(changed)
    }
}

impl EditingView for EditorDisplay {
    fn current_document(&self) -> &Document {
        self.editor.document()
    }

    fn selection(&self) -> Selection {
        self.current_selection()
    }

    fn selection_region(&self, range: &SelectionRange) -> Option<Rect> {
        self.region_for(range)
    }

    fn surface_area(&self) -> Rect {
        self.last_text_area
    }

    fn surface_contains(&self, column: u16, row: u16) -> bool {
        self.last_text_area.contains(Position::new(column, row))
    }

    fn has_focus(&self) -> bool {
        self.focused
    }

    fn range_has_link(&self, range: &SelectionRange) -> bool {
        self.editor.range_has_link(range)
    }
}

impl MutationEngine for EditorDisplay {
    fn apply_link(&mut self, range: &SelectionRange, url: &str) -> Result<bool, LinkError> {
        self.mutate(|editor| editor.apply_link_to_range(range, url))
    }

    fn remove_link(&mut self, range: &SelectionRange) -> Result<bool, LinkError> {
        self.mutate(|editor| editor.remove_link_from_range(range))
    }
}

impl EditingSurface for EditorDisplay {
    fn restore_focus(&mut self) {
        self.focused = true;
    }

    fn release_focus(&mut self) {
        self.focused = false;
    }
}

impl Deref for EditorDisplay {
    type Target = DocumentEditor;

    fn deref(&self) -> &Self::Target {
        &self.editor
    }
}

impl DerefMut for EditorDisplay {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.editor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::SpanPath;
    use pretty_assertions::assert_eq;
    use tdoc::{InlineStyle, Paragraph, Span, ftml};

    fn pointer(root: usize, span: Vec<usize>, offset: usize) -> CursorPointer {
        CursorPointer::new(ParagraphPath::new_root(root), SpanPath::new(span), offset)
    }

    fn rendered(document: Document, width: u16) -> EditorDisplay {
        let mut display = EditorDisplay::new(DocumentEditor::new(document));
        let result = display.render_document(width as usize, &Theme::default());
        display.update_after_render(Rect::new(0, 0, width, 20), result.total_lines, 0);
        display
    }

    fn create_test_display() -> EditorDisplay {
        rendered(
            ftml! {
                p { "First line of text" }
                p { "Second line that is longer" }
                p { "Third line" }
            },
            40,
        )
    }

    #[test]
    fn move_cursor_vertical_down_skips_blank_lines() {
        let mut display = create_test_display();
        display.move_cursor_vertical(1);
        assert_eq!(display.cursor_pointer().paragraph_path, ParagraphPath::new_root(1));
    }

    #[test]
    fn move_cursor_vertical_up_keeps_column() {
        let mut display = create_test_display();
        assert!(display.move_to_pointer(&pointer(2, vec![0], 5)));
        display.render_document(40, &Theme::default());
        display.set_preferred_column(None);
        display.render_document(40, &Theme::default());

        display.move_cursor_vertical(-1);
        assert_eq!(display.cursor_pointer(), pointer(1, vec![0], 5));
    }

    #[test]
    fn visual_line_start_and_end() {
        let mut display = create_test_display();
        assert!(display.move_to_pointer(&pointer(1, vec![0], 4)));
        display.render_document(40, &Theme::default());
        display.move_to_visual_line_end();
        assert_eq!(display.cursor_pointer().offset, 26);
        display.move_to_visual_line_start();
        assert_eq!(display.cursor_pointer().offset, 0);
    }

    #[test]
    fn mouse_maps_to_nearest_position() {
        let display = create_test_display();
        let hit = display.pointer_from_mouse(3, 2).unwrap();
        assert_eq!(hit.pointer, pointer(1, vec![0], 3));
        assert!(display.pointer_from_mouse(50, 2).is_none());
    }

    #[test]
    fn selection_is_ordered() {
        let mut display = create_test_display();
        assert!(display.move_to_pointer(&pointer(1, vec![0], 4)));
        display.prepare_selection(true);
        assert!(display.move_to_pointer(&pointer(0, vec![0], 2)));

        let selection = display.selection();
        assert!(!selection.is_collapsed());
        assert_eq!(selection.first_position(), &pointer(0, vec![0], 2));
        assert_eq!(selection.last_position(), &pointer(1, vec![0], 4));

        display.clear_selection();
        assert!(display.selection().is_collapsed());
    }

    #[test]
    fn region_for_single_line_range() {
        let display = create_test_display();
        let range = SelectionRange::new(pointer(0, vec![0], 6), pointer(0, vec![0], 10));
        assert_eq!(display.region_for(&range), Some(Rect::new(6, 0, 4, 1)));
    }

    #[test]
    fn region_for_multi_line_range_spans_the_area() {
        let display = create_test_display();
        let range = SelectionRange::new(pointer(0, vec![0], 6), pointer(1, vec![0], 3));
        assert_eq!(display.region_for(&range), Some(Rect::new(0, 0, 40, 3)));
    }

    #[test]
    fn region_for_scrolled_out_range_is_none() {
        let mut display = create_test_display();
        display.update_after_render(Rect::new(0, 0, 40, 2), 5, 3);
        let range = SelectionRange::new(pointer(0, vec![0], 0), pointer(0, vec![0], 4));
        assert_eq!(display.region_for(&range), None);
    }

    #[test]
    fn applying_a_link_keeps_the_selection_on_its_text() {
        let mut display = rendered(ftml! { p { "Read the docs today" } }, 40);
        assert!(display.move_to_pointer(&pointer(0, vec![0], 9)));
        display.prepare_selection(true);
        assert!(display.move_to_pointer(&pointer(0, vec![0], 13)));

        let range = display.selection().range().clone();
        assert_eq!(display.apply_link(&range, "https://docs.rs"), Ok(true));
        assert_eq!(display.revision(), 1);

        let selection = display.selection();
        assert_eq!(selection.first_position(), &pointer(0, vec![0], 9));
        assert_eq!(selection.last_position(), &pointer(0, vec![1], 4));
        let link = &display.document().paragraphs[0].content()[1];
        assert_eq!(link.style, InlineStyle::Link);
    }

    #[test]
    fn failed_mutation_leaves_revision_alone() {
        let paragraph = Paragraph::new_text().with_content(vec![Span::new_text("abc")]);
        let mut display = rendered(Document::new().with_paragraphs(vec![paragraph]), 40);
        let range = SelectionRange::collapsed(pointer(0, vec![0], 1));
        assert_eq!(display.apply_link(&range, ""), Err(LinkError::EmptyTarget));
        assert_eq!(display.revision(), 0);
    }

    #[test]
    fn debug_output_includes_the_editor() {
        let display = create_test_display();
        let output = format!("{display:?}");
        assert!(output.contains("DocumentEditor"));
        assert!(output.contains("First line of text"));
    }

    #[test]
    fn focus_follows_release_and_restore() {
        let mut display = create_test_display();
        assert!(display.has_focus());
        display.release_focus();
        assert!(!display.is_focused());
        display.restore_focus();
        assert!(display.has_focus());
    }
}
