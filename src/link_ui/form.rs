use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Position, Rect};

use crate::editor::char_to_byte_idx;

pub const SAVE_LABEL: &str = "[ Save ]";
pub const UNLINK_LABEL: &str = "[ Unlink ]";
pub const CANCEL_LABEL: &str = "[ Cancel ]";
const BUTTON_GAP: u16 = 1;

/// Which control of the panel has keyboard focus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormFocus {
    #[default]
    Url,
    Save,
    Unlink,
    Cancel,
}

impl FormFocus {
    const ORDER: [FormFocus; 4] = [
        FormFocus::Url,
        FormFocus::Save,
        FormFocus::Unlink,
        FormFocus::Cancel,
    ];

    fn index(self) -> usize {
        Self::ORDER
            .iter()
            .position(|focus| *focus == self)
            .unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn previous(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn label(self) -> Option<&'static str> {
        match self {
            FormFocus::Url => None,
            FormFocus::Save => Some(SAVE_LABEL),
            FormFocus::Unlink => Some(UNLINK_LABEL),
            FormFocus::Cancel => Some(CANCEL_LABEL),
        }
    }
}

/// What the panel should do after the form consumed a key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormAction {
    None,
    Edited,
    Submit,
    Unlink,
    Cancel,
}

impl FormAction {
    pub fn for_button(focus: FormFocus) -> Self {
        match focus {
            FormFocus::Url | FormFocus::Save => FormAction::Submit,
            FormFocus::Unlink => FormAction::Unlink,
            FormFocus::Cancel => FormAction::Cancel,
        }
    }
}

/// The URL field and the button row. The caret counts characters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinkForm {
    value: String,
    caret: usize,
    focus: FormFocus,
}

impl LinkForm {
    pub fn new(value: &str) -> Self {
        let mut form = Self::default();
        form.reset(value);
        form
    }

    pub fn reset(&mut self, value: &str) {
        self.value = value.to_string();
        self.caret = self.value.chars().count();
        self.focus = FormFocus::Url;
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn focus(&self) -> FormFocus {
        self.focus
    }

    pub fn set_focus(&mut self, focus: FormFocus) {
        self.focus = focus;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Tab => {
                self.focus = self.focus.next();
                FormAction::None
            }
            KeyCode::BackTab => {
                self.focus = self.focus.previous();
                FormAction::None
            }
            KeyCode::Enter => FormAction::for_button(self.focus),
            KeyCode::Esc => FormAction::Cancel,
            _ if self.focus == FormFocus::Url => self.edit_field(key),
            _ => FormAction::None,
        }
    }

    fn edit_field(&mut self, key: KeyEvent) -> FormAction {
        let len = self.value.chars().count();
        match key.code {
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.value.clear();
                self.caret = 0;
                FormAction::Edited
            }
            KeyCode::Char(ch)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                let byte_idx = char_to_byte_idx(&self.value, self.caret);
                self.value.insert(byte_idx, ch);
                self.caret += 1;
                FormAction::Edited
            }
            KeyCode::Backspace if self.caret > 0 => {
                let byte_idx = char_to_byte_idx(&self.value, self.caret - 1);
                self.value.remove(byte_idx);
                self.caret -= 1;
                FormAction::Edited
            }
            KeyCode::Delete if self.caret < len => {
                let byte_idx = char_to_byte_idx(&self.value, self.caret);
                self.value.remove(byte_idx);
                FormAction::Edited
            }
            KeyCode::Left => {
                self.caret = self.caret.saturating_sub(1);
                FormAction::None
            }
            KeyCode::Right => {
                self.caret = (self.caret + 1).min(len);
                FormAction::None
            }
            KeyCode::Home => {
                self.caret = 0;
                FormAction::None
            }
            KeyCode::End => {
                self.caret = len;
                FormAction::None
            }
            _ => FormAction::None,
        }
    }

    /// First character shown in a field `width` cells wide, so the caret
    /// stays visible.
    pub fn scroll_offset(&self, width: u16) -> usize {
        let width = width.max(1) as usize;
        self.caret.saturating_sub(width - 1)
    }

    pub fn visible_value(&self, width: u16) -> String {
        self.value
            .chars()
            .skip(self.scroll_offset(width))
            .take(width as usize)
            .collect()
    }

    pub fn field_area(inner: Rect) -> Rect {
        Rect::new(inner.x, inner.y, inner.width, inner.height.min(1))
    }

    /// Buttons on the second row of `inner`, left to right.
    pub fn button_layout(inner: Rect) -> Vec<(FormFocus, Rect)> {
        if inner.height < 2 {
            return Vec::new();
        }
        let y = inner.y + 1;
        let mut x = inner.x;
        let mut layout = Vec::new();
        for focus in [FormFocus::Save, FormFocus::Unlink, FormFocus::Cancel] {
            let Some(label) = focus.label() else {
                continue;
            };
            let width = (label.chars().count() as u16).min(inner.right().saturating_sub(x));
            if width == 0 {
                break;
            }
            layout.push((focus, Rect::new(x, y, width, 1)));
            x = x.saturating_add(width + BUTTON_GAP);
        }
        layout
    }

    /// Control under the given cell, if any.
    pub fn hit_test(inner: Rect, column: u16, row: u16) -> Option<FormFocus> {
        let position = Position::new(column, row);
        if Self::field_area(inner).contains(position) {
            return Some(FormFocus::Url);
        }
        Self::button_layout(inner)
            .into_iter()
            .find(|(_, area)| area.contains(position))
            .map(|(focus, _)| focus)
    }

    /// Moves the caret to the character shown at `column` of the field.
    pub fn place_caret(&mut self, inner: Rect, column: u16) {
        let relative = column.saturating_sub(inner.x) as usize;
        let len = self.value.chars().count();
        self.caret = (self.scroll_offset(inner.width) + relative).min(len);
        self.focus = FormFocus::Url;
    }
}
