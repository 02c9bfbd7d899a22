use super::{CursorPointer, DocumentEditor, SegmentRef};

impl DocumentEditor {
    pub fn ensure_cursor_selectable(&mut self) {
        if let Some(first) = self.segments.first() {
            self.cursor = CursorPointer {
                paragraph_path: first.paragraph_path.clone(),
                span_path: first.span_path.clone(),
                offset: self.cursor.offset.min(first.len),
            };
            self.cursor_segment = 0;
        } else {
            self.cursor = CursorPointer::default();
            self.cursor_segment = 0;
        }
    }

    pub fn cursor_pointer(&self) -> CursorPointer {
        self.cursor.clone()
    }

    pub fn move_to_pointer(&mut self, pointer: &CursorPointer) -> bool {
        if let Some(index) = self
            .segments
            .iter()
            .position(|segment| segment.matches_pointer(pointer))
        {
            let mut new_pointer = pointer.clone();
            let len = self.segments[index].len;
            if new_pointer.offset > len {
                new_pointer.offset = len;
            }
            self.cursor = new_pointer;
            self.cursor_segment = index;
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) -> bool {
        if self.segments.is_empty() {
            return false;
        }
        if self.cursor.offset > 0 {
            self.cursor.offset -= 1;
            return true;
        }
        let Some(previous) = self.cursor_segment.checked_sub(1) else {
            return false;
        };
        let segment = self.segments[previous].clone();
        // The end of the previous segment and the start of this one are the
        // same visual spot inside a paragraph, so step one character further.
        let offset = if segment.paragraph_path == self.cursor.paragraph_path {
            segment.len.saturating_sub(1)
        } else {
            segment.len
        };
        self.place_cursor(previous, &segment, offset);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.segments.is_empty() {
            return false;
        }
        if self.cursor.offset < self.current_segment_len() {
            self.cursor.offset += 1;
            return true;
        }
        let next = self.cursor_segment + 1;
        let Some(segment) = self.segments.get(next).cloned() else {
            return false;
        };
        let offset = if segment.paragraph_path == self.cursor.paragraph_path {
            1.min(segment.len)
        } else {
            0
        };
        self.place_cursor(next, &segment, offset);
        true
    }

    pub fn move_to_paragraph_start(&mut self) {
        let path = self.cursor.paragraph_path.clone();
        if let Some((index, segment)) = self
            .segments
            .iter()
            .enumerate()
            .find(|(_, segment)| segment.paragraph_path == path)
            .map(|(index, segment)| (index, segment.clone()))
        {
            self.place_cursor(index, &segment, 0);
        }
    }

    pub fn move_to_paragraph_end(&mut self) {
        let path = self.cursor.paragraph_path.clone();
        if let Some((index, segment)) = self
            .segments
            .iter()
            .enumerate()
            .rev()
            .find(|(_, segment)| segment.paragraph_path == path)
            .map(|(index, segment)| (index, segment.clone()))
        {
            self.place_cursor(index, &segment, segment.len);
        }
    }

    fn place_cursor(&mut self, index: usize, segment: &SegmentRef, offset: usize) {
        self.cursor_segment = index;
        self.cursor.update_from_segment(segment);
        self.cursor.offset = offset.min(segment.len);
    }
}
