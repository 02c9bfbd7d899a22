use ratatui::style::{Color, Modifier, Style};

/// Colors used by the editing surface, the link panel and the host chrome
#[derive(Clone, Debug)]
pub struct Theme {
    /// Background color for the editor
    pub background: Color,

    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the current file name in the status bar
    pub filename_color: Color,

    /// Foreground color for active selection
    pub selection_fg: Color,

    /// Background color for active selection
    pub selection_bg: Color,

    /// Foreground color for highlighted text (InlineStyle::Highlight)
    pub highlight_fg: Color,

    /// Background color for highlighted text (InlineStyle::Highlight)
    pub highlight_bg: Color,

    /// Color for links
    pub link_color: Color,

    /// Foreground color of the link panel
    pub panel_fg: Color,

    /// Background color of the link panel
    pub panel_bg: Color,

    /// Border color of the link panel
    pub panel_border: Color,

    /// Background of the URL field while it has focus
    pub input_focused_bg: Color,

    /// Background of the URL field without focus
    pub input_bg: Color,

    /// Foreground color for the focused panel button
    pub button_focused_fg: Color,

    /// Background color for the focused panel button
    pub button_focused_bg: Color,

    /// Foreground color for disabled panel buttons
    pub button_disabled_fg: Color,

    /// Foreground color for menu items
    pub menu_fg: Color,

    /// Background color for menu
    pub menu_bg: Color,

    /// Foreground color for disabled menu items
    pub menu_disabled_fg: Color,

    /// Foreground color for selected menu entry
    pub menu_selected_fg: Color,

    /// Background color for selected menu entry
    pub menu_selected_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::Reset,
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            filename_color: Color::LightYellow,
            selection_fg: Color::White,
            selection_bg: Color::LightBlue,
            highlight_fg: Color::Black,
            highlight_bg: Color::LightYellow,
            link_color: Color::Blue,
            panel_fg: Color::White,
            panel_bg: Color::Black,
            panel_border: Color::LightBlue,
            input_focused_bg: Color::DarkGray,
            input_bg: Color::Black,
            button_focused_fg: Color::White,
            button_focused_bg: Color::LightBlue,
            button_disabled_fg: Color::DarkGray,
            menu_fg: Color::White,
            menu_bg: Color::Black,
            menu_disabled_fg: Color::DarkGray,
            menu_selected_fg: Color::White,
            menu_selected_bg: Color::LightBlue,
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    pub fn filename_style(&self) -> Style {
        Style::default().fg(self.filename_color)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    pub fn highlight_style(&self) -> Style {
        Style::default().fg(self.highlight_fg).bg(self.highlight_bg)
    }

    /// Links render underlined in the link color
    pub fn link_style(&self) -> Style {
        Style::default()
            .fg(self.link_color)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn panel_style(&self) -> Style {
        Style::default().fg(self.panel_fg).bg(self.panel_bg)
    }

    pub fn panel_border_style(&self) -> Style {
        Style::default().fg(self.panel_border).bg(self.panel_bg)
    }

    pub fn input_style(&self, focused: bool) -> Style {
        let bg = if focused {
            self.input_focused_bg
        } else {
            self.input_bg
        };
        Style::default().fg(self.panel_fg).bg(bg)
    }

    pub fn button_style(&self, focused: bool, enabled: bool) -> Style {
        match (focused, enabled) {
            (_, false) => Style::default()
                .fg(self.button_disabled_fg)
                .bg(self.panel_bg),
            (true, true) => Style::default()
                .fg(self.button_focused_fg)
                .bg(self.button_focused_bg)
                .add_modifier(Modifier::BOLD),
            (false, true) => self.panel_style(),
        }
    }

    pub fn menu_style(&self) -> Style {
        Style::default().fg(self.menu_fg).bg(self.menu_bg)
    }

    pub fn menu_disabled_style(&self) -> Style {
        Style::default().fg(self.menu_disabled_fg)
    }

    pub fn menu_selected_style(&self) -> Style {
        Style::default()
            .fg(self.menu_selected_fg)
            .bg(self.menu_selected_bg)
    }
}
