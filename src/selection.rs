use crate::editor::CursorPointer;

/// A pair of document positions in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: CursorPointer,
    pub end: CursorPointer,
}

impl SelectionRange {
    pub fn new(start: CursorPointer, end: CursorPointer) -> Self {
        Self { start, end }
    }

    pub fn collapsed(position: CursorPointer) -> Self {
        Self {
            start: position.clone(),
            end: position,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The editing surface's live selection, as observed at one point in time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    range: SelectionRange,
}

impl Selection {
    pub fn new(start: CursorPointer, end: CursorPointer) -> Self {
        Self {
            range: SelectionRange::new(start, end),
        }
    }

    pub fn caret(position: CursorPointer) -> Self {
        Self {
            range: SelectionRange::collapsed(position),
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.is_collapsed()
    }

    pub fn first_position(&self) -> &CursorPointer {
        &self.range.start
    }

    pub fn last_position(&self) -> &CursorPointer {
        &self.range.end
    }

    pub fn range(&self) -> &SelectionRange {
        &self.range
    }
}

impl From<SelectionRange> for Selection {
    fn from(range: SelectionRange) -> Self {
        Self { range }
    }
}
