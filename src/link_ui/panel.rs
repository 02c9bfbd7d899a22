use ratatui::{
    Frame,
    layout::{Position, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use serde::{Deserialize, Serialize};

use super::attach::{PanelPositioning, VisibilityChange};
use super::form::{FormFocus, LinkForm};
use crate::config::LinkPanelConfig;
use crate::theme::Theme;

/// Borders plus the URL row and the button row.
pub const PANEL_HEIGHT: u16 = 4;
/// Narrowest panel that still fits all three buttons.
pub const MIN_PANEL_WIDTH: u16 = 32;

/// Preferred side of the anchor region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Below,
    Above,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonStates {
    pub save_enabled: bool,
    pub unlink_enabled: bool,
}

impl ButtonStates {
    pub fn is_enabled(&self, focus: FormFocus) -> bool {
        match focus {
            FormFocus::Save => self.save_enabled,
            FormFocus::Unlink => self.unlink_enabled,
            FormFocus::Url | FormFocus::Cancel => true,
        }
    }
}

/// Balloon drawn next to the anchored text.
#[derive(Clone, Debug)]
pub struct LinkPanel {
    width: u16,
    placement: Placement,
    bounds: Option<Rect>,
}

impl Default for LinkPanel {
    fn default() -> Self {
        Self::from_config(&LinkPanelConfig::default())
    }
}

impl LinkPanel {
    pub fn new(width: u16, placement: Placement) -> Self {
        Self {
            width: width.max(MIN_PANEL_WIDTH),
            placement,
            bounds: None,
        }
    }

    pub fn from_config(config: &LinkPanelConfig) -> Self {
        Self::new(config.width, config.placement)
    }

    /// Where the panel goes for `region`, kept inside `container`. Flips to
    /// the other side when the preferred one has no room.
    pub fn place(&self, region: Rect, container: Rect) -> Rect {
        let width = self.width.min(container.width);
        let height = PANEL_HEIGHT.min(container.height);

        let max_x = container.right().saturating_sub(width);
        let x = region.x.clamp(container.x, max_x.max(container.x));

        let below = region.bottom();
        let fits_below = below.saturating_add(height) <= container.bottom();
        let fits_above = region.y >= container.y.saturating_add(height);
        let above = region.y.saturating_sub(height);

        let y = match (self.placement, fits_below, fits_above) {
            (Placement::Below, true, _) | (Placement::Above, true, false) => below,
            (Placement::Above, _, true) | (Placement::Below, false, true) => above,
            _ => container.bottom().saturating_sub(height).max(container.y),
        };
        Rect::new(x, y, width, height)
    }

    pub fn render(
        &self,
        frame: &mut Frame,
        form: &LinkForm,
        buttons: ButtonStates,
        focused: bool,
        theme: &Theme,
    ) {
        let Some(bounds) = self.bounds else {
            return;
        };
        let block = Block::default()
            .title(" Link ")
            .borders(Borders::ALL)
            .style(theme.panel_style())
            .border_style(theme.panel_border_style());
        let inner = block.inner(bounds);

        frame.render_widget(Clear, bounds);
        frame.render_widget(block, bounds);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let field = LinkForm::field_area(inner);
        let url_focused = focused && form.focus() == FormFocus::Url;
        let visible = form.visible_value(field.width);
        let padding = (field.width as usize).saturating_sub(visible.chars().count());
        let field_line = Line::from(Span::styled(
            format!("{visible}{}", " ".repeat(padding)),
            theme.input_style(url_focused),
        ));
        frame.render_widget(Paragraph::new(field_line), field);

        for (control, area) in LinkForm::button_layout(inner) {
            let Some(label) = control.label() else {
                continue;
            };
            let style = theme.button_style(
                focused && form.focus() == control,
                buttons.is_enabled(control),
            );
            frame.render_widget(Paragraph::new(Line::from(Span::styled(label, style))), area);
        }

        if url_focused {
            let column = (form.caret() - form.scroll_offset(field.width)) as u16;
            let x = field.x + column.min(field.width.saturating_sub(1));
            frame.set_cursor_position(Position::new(x, field.y));
        }
    }
}

impl PanelPositioning for LinkPanel {
    fn attach_to(&mut self, region: Rect, container: Rect) -> VisibilityChange {
        let was_visible = self.bounds.is_some();
        self.bounds = Some(self.place(region, container));
        if was_visible {
            VisibilityChange::Unchanged
        } else {
            VisibilityChange::Shown
        }
    }

    fn hide(&mut self) -> VisibilityChange {
        match self.bounds.take() {
            Some(_) => VisibilityChange::Hidden,
            None => VisibilityChange::Unchanged,
        }
    }

    fn is_visible(&self) -> bool {
        self.bounds.is_some()
    }

    fn bounds(&self) -> Option<Rect> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ratatui::{Terminal, backend::TestBackend};

    const CONTAINER: Rect = Rect {
        x: 0,
        y: 0,
        width: 80,
        height: 24,
    };

    #[test]
    fn sits_below_the_region_by_default() {
        let panel = LinkPanel::new(40, Placement::Below);
        let placed = panel.place(Rect::new(10, 5, 4, 1), CONTAINER);
        assert_eq!(placed, Rect::new(10, 6, 40, PANEL_HEIGHT));
    }

    #[test]
    fn flips_above_near_the_bottom() {
        let panel = LinkPanel::new(40, Placement::Below);
        let placed = panel.place(Rect::new(10, 22, 4, 1), CONTAINER);
        assert_eq!(placed.y, 18);
    }

    #[test]
    fn above_placement_flips_below_at_the_top() {
        let panel = LinkPanel::new(40, Placement::Above);
        assert_eq!(panel.place(Rect::new(0, 10, 4, 1), CONTAINER).y, 6);
        assert_eq!(panel.place(Rect::new(0, 1, 4, 1), CONTAINER).y, 2);
    }

    #[test]
    fn clamps_to_the_right_edge() {
        let panel = LinkPanel::new(40, Placement::Below);
        let placed = panel.place(Rect::new(70, 5, 4, 1), CONTAINER);
        assert_eq!(placed.x, 40);
    }

    #[test]
    fn width_is_never_below_the_button_row() {
        let panel = LinkPanel::new(10, Placement::Below);
        assert_eq!(panel.place(Rect::new(0, 0, 1, 1), CONTAINER).width, MIN_PANEL_WIDTH);
    }

    #[test]
    fn reports_visibility_changes() {
        let mut panel = LinkPanel::default();
        let region = Rect::new(2, 2, 3, 1);
        assert_eq!(panel.attach_to(region, CONTAINER), VisibilityChange::Shown);
        assert_eq!(panel.attach_to(region, CONTAINER), VisibilityChange::Unchanged);
        assert!(panel.contains(3, 4));
        assert_eq!(panel.hide(), VisibilityChange::Hidden);
        assert_eq!(panel.hide(), VisibilityChange::Unchanged);
        assert!(!panel.contains(3, 4));
    }

    #[test]
    fn renders_field_and_buttons() {
        let mut panel = LinkPanel::new(40, Placement::Below);
        panel.attach_to(Rect::new(0, 0, 4, 1), CONTAINER);
        let form = LinkForm::new("https://docs.rs");
        let buttons = ButtonStates {
            save_enabled: true,
            unlink_enabled: false,
        };

        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|frame| panel.render(frame, &form, buttons, true, &Theme::default()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String { (0..40).map(|x| buffer[(x, y)].symbol()).collect() };

        assert!(row(2).contains("https://docs.rs"));
        assert!(row(3).contains("[ Save ] [ Unlink ] [ Cancel ]"));
        assert_eq!(
            buffer[(11, 3)].fg,
            Theme::default().button_disabled_fg,
            "unlink is drawn disabled"
        );
    }
}
