use ratatui::layout::{Margin, Position, Rect};

use crate::locator::{LinkLookup, LinkSpan, find_enclosing_link};
use crate::selection::SelectionRange;
use crate::surface::EditingView;

/// Visibility notification reported by a positioning collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityChange {
    Shown,
    Hidden,
    Unchanged,
}

/// Places the panel on screen. Geometry is entirely up to the implementation;
/// callers only say which region the panel belongs to.
pub trait PanelPositioning {
    fn attach_to(&mut self, region: Rect, container: Rect) -> VisibilityChange;

    fn hide(&mut self) -> VisibilityChange;

    fn is_visible(&self) -> bool;

    fn bounds(&self) -> Option<Rect>;

    fn contains(&self, column: u16, row: u16) -> bool {
        self.bounds()
            .is_some_and(|bounds| bounds.contains(Position::new(column, row)))
    }

    /// Area inside the panel's one-cell border.
    fn content_area(&self) -> Option<Rect> {
        self.bounds().map(|bounds| bounds.inner(Margin::new(1, 1)))
    }
}

/// The logical region the panel is anchored to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Anchor {
    Link(LinkSpan),
    Selection(SelectionRange),
}

impl Anchor {
    pub fn range(&self) -> SelectionRange {
        match self {
            Anchor::Link(link) => link.range(),
            Anchor::Selection(range) => range.clone(),
        }
    }

    pub fn link(&self) -> Option<&LinkSpan> {
        match self {
            Anchor::Link(link) => Some(link),
            Anchor::Selection(_) => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    Attached {
        anchor: Anchor,
        change: VisibilityChange,
    },
    /// Nothing on screen to anchor to; the panel was left alone.
    NoTarget,
}

#[derive(Debug)]
pub struct PanelAttachment<P> {
    panel: P,
    attached_link: Option<LinkSpan>,
}

impl<P: PanelPositioning> PanelAttachment<P> {
    pub fn new(panel: P) -> Self {
        Self {
            panel,
            attached_link: None,
        }
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn attached_link(&self) -> Option<&LinkSpan> {
        self.attached_link.as_ref()
    }

    /// Anchors the panel to `explicit_anchor`, or to the link enclosing the
    /// start of the selection, or to the selection itself.
    pub fn attach<V>(&mut self, view: &V, explicit_anchor: Option<&LinkSpan>) -> AttachOutcome
    where
        V: EditingView + ?Sized,
    {
        let selection = view.selection();
        let anchor = match explicit_anchor {
            Some(link) => Anchor::Link(link.clone()),
            None => match find_enclosing_link(
                view.current_document(),
                Some(selection.first_position()),
            ) {
                LinkLookup::Found(link) => Anchor::Link(link),
                LinkLookup::NotFound => Anchor::Selection(selection.range().clone()),
            },
        };

        let Some(region) = view.selection_region(&anchor.range()) else {
            return AttachOutcome::NoTarget;
        };
        let change = self.panel.attach_to(region, view.surface_area());
        self.attached_link = anchor.link().cloned();
        AttachOutcome::Attached { anchor, change }
    }

    pub fn detach(&mut self) -> VisibilityChange {
        self.attached_link = None;
        self.panel.hide()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{CursorPointer, DocumentEditor, ParagraphPath, SpanPath};
    use crate::editor_display::EditorDisplay;
    use crate::link_ui::panel::LinkPanel;
    use crate::theme::Theme;
    use pretty_assertions::assert_eq;
    use tdoc::{Document, InlineStyle, Paragraph, Span};

    fn pointer(root: usize, span: Vec<usize>, offset: usize) -> CursorPointer {
        CursorPointer::new(ParagraphPath::new_root(root), SpanPath::new(span), offset)
    }

    fn rendered_display() -> EditorDisplay {
        let mut docs = Span::new_text("docs");
        docs.style = InlineStyle::Link;
        docs.link_target = Some("https://docs.rs".to_string());
        let paragraph = Paragraph::new_text().with_content(vec![
            Span::new_text("See "),
            docs,
            Span::new_text(" now"),
        ]);
        let mut display =
            EditorDisplay::new(DocumentEditor::new(Document::new().with_paragraphs(vec![paragraph])));
        let result = display.render_document(80, &Theme::default());
        display.update_after_render(Rect::new(0, 0, 80, 20), result.total_lines, 0);
        display
    }

    #[test]
    fn caret_inside_a_link_attaches_to_the_link() {
        let mut display = rendered_display();
        assert!(display.move_to_pointer(&pointer(0, vec![1], 2)));
        let mut attachment = PanelAttachment::new(LinkPanel::default());

        let AttachOutcome::Attached { anchor, change } = attachment.attach(&display, None) else {
            panic!("caret is on screen");
        };
        assert_eq!(change, VisibilityChange::Shown);
        assert_eq!(anchor.link().map(|link| &link.span_path), Some(&SpanPath::new(vec![1])));
        assert_eq!(attachment.attached_link(), anchor.link());
        assert!(attachment.panel().is_visible());

        assert_eq!(attachment.detach(), VisibilityChange::Hidden);
        assert_eq!(attachment.attached_link(), None);
        assert!(!attachment.panel().is_visible());
    }

    #[test]
    fn plain_text_attaches_to_the_selection() {
        let mut display = rendered_display();
        assert!(display.move_to_pointer(&pointer(0, vec![0], 1)));
        let mut attachment = PanelAttachment::new(LinkPanel::default());

        let outcome = attachment.attach(&display, None);
        let expected = Anchor::Selection(SelectionRange::collapsed(pointer(0, vec![0], 1)));
        assert!(matches!(outcome, AttachOutcome::Attached { ref anchor, .. } if *anchor == expected));
        assert_eq!(attachment.attached_link(), None);
    }

    #[test]
    fn scrolled_out_anchor_is_no_target() {
        let mut display = rendered_display();
        display.update_after_render(Rect::new(0, 0, 80, 2), 5, 3);
        let mut attachment = PanelAttachment::new(LinkPanel::default());

        assert_eq!(attachment.attach(&display, None), AttachOutcome::NoTarget);
        assert_eq!(attachment.attached_link(), None);
        assert!(!attachment.panel().is_visible());
    }
}
