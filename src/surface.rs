//! Interfaces the link UI drives: the live view of the editing surface and
//! the engine that applies link mutations to the document.

use ratatui::layout::Rect;
use tdoc::Document;

use crate::error::LinkError;
use crate::selection::{Selection, SelectionRange};

/// Read side of the editing surface.
pub trait EditingView {
    fn current_document(&self) -> &Document;

    /// The one live selection, in document order.
    fn selection(&self) -> Selection;

    /// Screen cells covered by `range` as of the last render, if any of it
    /// is visible.
    fn selection_region(&self, range: &SelectionRange) -> Option<Rect>;

    /// The area the panel must stay inside.
    fn surface_area(&self) -> Rect;

    fn surface_contains(&self, column: u16, row: u16) -> bool;

    fn has_focus(&self) -> bool;

    fn range_has_link(&self, range: &SelectionRange) -> bool;
}

pub trait MutationEngine {
    fn apply_link(&mut self, range: &SelectionRange, url: &str) -> Result<bool, LinkError>;

    fn remove_link(&mut self, range: &SelectionRange) -> Result<bool, LinkError>;
}

/// Everything the link UI needs from the host's editor.
pub trait EditingSurface: EditingView + MutationEngine {
    /// Gives keyboard focus back to the document.
    fn restore_focus(&mut self);

    /// Moves keyboard focus away from the document, e.g. into the panel.
    fn release_focus(&mut self);
}
