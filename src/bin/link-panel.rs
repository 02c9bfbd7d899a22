use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{info, warn};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::Modifier,
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tdoc::{Document, markdown, parse, writer::Writer};

use link_panel::config::Config;
use link_panel::editor::DocumentEditor;
use link_panel::editor_display::EditorDisplay;
use link_panel::link_ui::{Command, LinkCommand, LinkUi, ShowTrigger, UnlinkCommand};
use link_panel::locator::find_enclosing_link;
use link_panel::render::RenderResult;
use link_panel::surface::EditingView;
use link_panel::theme::Theme;

const STATUS_TIMEOUT: Duration = Duration::from_secs(4);
const MOUSE_SCROLL_LINES: usize = 3;
const LOG_ENV: &str = "LINK_PANEL_LOG";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DocumentFormat {
    Ftml,
    Markdown,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("md") | Some("markdown") | Some("mkd") | Some("mdown") | Some("mdtxt") => {
                DocumentFormat::Markdown
            }
            _ => DocumentFormat::Ftml,
        }
    }
}

fn main() -> Result<()> {
    init_logging()?;
    run()
}

/// Logs go to the file named by `LINK_PANEL_LOG`; the terminal belongs to the UI.
fn init_logging() -> Result<()> {
    let Some(path) = env::var_os(LOG_ENV) else {
        return Ok(());
    };
    let file = fs::File::create(&path)
        .with_context(|| format!("failed to create log file {}", PathBuf::from(&path).display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn editor_wrap_configuration(width: usize) -> (usize, usize) {
    if width == 0 {
        return (1, 0);
    }
    if width < 60 {
        let wrap_width = width.saturating_sub(1).max(1);
        return (wrap_width, 0);
    }
    if width < 100 {
        let padding = 2.min(width / 2);
        let wrap_width = width.saturating_sub(padding.saturating_mul(2)).max(1);
        return (wrap_width, padding);
    }
    let mut left_padding = width.saturating_sub(100) / 2 + 4;
    let max_padding = width.saturating_sub(1) / 2;
    if left_padding > max_padding {
        left_padding = max_padding;
    }
    let wrap_width = width.saturating_sub(left_padding.saturating_mul(2)).max(1);
    (wrap_width, left_padding)
}

fn run() -> Result<()> {
    let mut args = env::args().skip(1);
    let Some(path_arg) = args.next() else {
        eprintln!("Usage: link-panel <file.ftml|file.md>");
        return Ok(());
    };
    let path = PathBuf::from(path_arg);

    let (config, config_status) = match Config::load() {
        Ok(config) => (config, None),
        Err(err) => {
            warn!("{err}");
            (Config::default(), Some(format!("{err}. Using defaults.")))
        }
    };
    let (document, format, document_status) = load_document(&path)?;
    info!("opened {} as {format:?}", path.display());
    let mut app = App::new(
        document,
        path,
        format,
        &config,
        config_status.or(document_status),
    );

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("failed to initialize terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().ok();

    let res = run_app(&mut terminal, &mut app).context("application error");

    disable_raw_mode().ok();
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .ok();
    terminal.show_cursor().ok();

    res
}

fn load_document(path: &PathBuf) -> Result<(Document, DocumentFormat, Option<String>)> {
    let format = DocumentFormat::from_path(path);
    if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let parsed = match format {
            DocumentFormat::Ftml => parse(std::io::Cursor::new(content))
                .map_err(|err| -> Box<dyn std::error::Error + Send + Sync> { Box::new(err) }),
            DocumentFormat::Markdown => markdown::parse(std::io::Cursor::new(content)),
        };
        match parsed {
            Ok(doc) => Ok((doc, format, None)),
            Err(err) => {
                let message = format!("Parse error: {err}. Starting with empty document.");
                Ok((Document::new(), format, Some(message)))
            }
        }
    } else {
        Ok((Document::new(), format, Some("New document".to_string())))
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();
    let mut needs_redraw = true;

    while !app.should_quit() {
        if needs_redraw {
            terminal
                .draw(|frame| app.draw(frame))
                .context("failed to draw frame")?;
            needs_redraw = false;
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout).context("event poll failed")? {
            let evt = event::read().context("failed to read event")?;
            app.handle_event(evt)?;
            needs_redraw = true;
        }

        if last_tick.elapsed() >= tick_rate {
            let had_message_before = app.has_status_message();
            app.on_tick();
            last_tick = Instant::now();
            if had_message_before && !app.has_status_message() {
                needs_redraw = true;
            }
        }
    }

    Ok(())
}

#[derive(Clone, Copy)]
enum MenuAction {
    EditLink,
    LinkSelectionText,
    RemoveLink,
}

#[derive(Clone, Copy)]
struct MenuItem {
    label: &'static str,
    action: Option<MenuAction>,
    shortcut: char,
}

impl MenuItem {
    fn new(label: &'static str, action: MenuAction, enabled: bool, shortcut: char) -> Self {
        Self {
            label,
            action: enabled.then_some(action),
            shortcut,
        }
    }

    fn is_enabled(&self) -> bool {
        self.action.is_some()
    }
}

enum MenuEntry {
    Section(&'static str),
    Item(MenuItem),
}

struct ContextMenuState {
    entries: Vec<MenuEntry>,
    selected_index: usize,
}

impl ContextMenuState {
    fn new(entries: Vec<MenuEntry>) -> Self {
        let selected_index = entries
            .iter()
            .position(|entry| matches!(entry, MenuEntry::Item(item) if item.is_enabled()))
            .unwrap_or(0);
        Self {
            entries,
            selected_index,
        }
    }

    fn move_selection(&mut self, delta: i32) {
        if self.entries.is_empty() {
            return;
        }

        let len = self.entries.len() as i32;
        let mut idx = self.selected_index as i32;

        for _ in 0..len {
            idx = (idx + delta).rem_euclid(len);
            if matches!(self.entries[idx as usize], MenuEntry::Item(_)) {
                self.selected_index = idx as usize;
                break;
            }
        }
    }

    fn current_action(&self) -> Option<MenuAction> {
        match self.entries.get(self.selected_index) {
            Some(MenuEntry::Item(item)) => item.action,
            _ => None,
        }
    }

    fn shortcut_action(&mut self, ch: char) -> (bool, Option<MenuAction>) {
        for (idx, entry) in self.entries.iter().enumerate() {
            if let MenuEntry::Item(item) = entry
                && item.shortcut == ch
            {
                self.selected_index = idx;
                return (true, item.action);
            }
        }
        (false, None)
    }
}

fn is_context_menu_shortcut(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Esc => modifiers.is_empty(),
        KeyCode::Char(' ') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

struct App {
    display: EditorDisplay,
    link_ui: LinkUi,
    theme: Theme,
    file_path: PathBuf,
    document_format: DocumentFormat,
    scroll_top: usize,
    should_quit: bool,
    dirty: bool,
    status_message: Option<(String, Instant)>,
    context_menu: Option<ContextMenuState>,
    mouse_drag_anchor: Option<link_panel::editor::CursorPointer>,
    /// Set by a press in the document, consumed by the matching release.
    pending_document_click: bool,
}

impl App {
    fn new(
        document: Document,
        path: PathBuf,
        format: DocumentFormat,
        config: &Config,
        initial_status: Option<String>,
    ) -> Self {
        let mut editor = DocumentEditor::new(document);
        editor.ensure_cursor_selectable();

        Self {
            display: EditorDisplay::new(editor),
            link_ui: LinkUi::from_config(&config.link_panel),
            theme: Theme::default(),
            file_path: path,
            document_format: format,
            scroll_top: 0,
            should_quit: false,
            dirty: false,
            status_message: initial_status.map(|msg| (msg, Instant::now())),
            context_menu: None,
            mouse_drag_anchor: None,
            pending_document_click: false,
        }
    }

    fn should_quit(&self) -> bool {
        self.should_quit
    }

    fn has_status_message(&self) -> bool {
        self.status_message.is_some()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        if area.height == 0 || area.width == 0 {
            return;
        }

        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);
        let editor_area = vertical[0];
        let status_area = vertical[1];

        let (wrap_width, left_padding) = editor_wrap_configuration(editor_area.width as usize);
        let left_padding = left_padding as u16;
        let text_area = Rect::new(
            editor_area.x + left_padding,
            editor_area.y,
            editor_area.width.saturating_sub(left_padding).max(1),
            editor_area.height,
        );

        let render = self.display.render_document(wrap_width, &self.theme);
        let viewport_height = text_area.height as usize;
        self.adjust_scroll(&render, viewport_height);
        self.display
            .update_after_render(text_area, render.total_lines, self.scroll_top);

        let total_lines = render.total_lines;
        let paragraph = Paragraph::new(Text::from(render.lines))
            .block(Block::default().borders(Borders::NONE))
            .scroll((self.scroll_top as u16, 0));
        frame.render_widget(paragraph, text_area);

        if self.display.is_focused()
            && let Some(cursor) = self.display.last_cursor_visual()
            && cursor.line >= self.scroll_top
            && cursor.line < self.scroll_top + viewport_height
        {
            let cursor_y = text_area.y + (cursor.line - self.scroll_top) as u16;
            let cursor_x = text_area.x + cursor.column.min(text_area.width - 1);
            frame.set_cursor_position(Position::new(cursor_x, cursor_y));
        }

        self.link_ui.handle_render(&mut self.display);
        self.link_ui.render(frame, &self.display, &self.theme);

        let status_line = self.status_line(total_lines, status_area.width as usize);
        let status_widget = Paragraph::new(status_line).style(self.theme.status_bar_style());
        frame.render_widget(status_widget, status_area);

        if self.context_menu.is_some() {
            self.render_context_menu(frame, area);
        }
    }

    fn render_context_menu(&self, frame: &mut Frame, area: Rect) {
        let Some(menu) = &self.context_menu else {
            return;
        };
        if area.width < 3 || area.height < 3 {
            return;
        }

        let label_width = menu
            .entries
            .iter()
            .map(|entry| match entry {
                MenuEntry::Item(item) => item.label.chars().count() + 3,
                MenuEntry::Section(title) => title.chars().count(),
            })
            .max()
            .unwrap_or(0) as u16;
        let width = (label_width + 4).min(area.width).max(10.min(area.width));
        let height = (menu.entries.len() as u16 + 2).min(area.height);
        let popup_area = Rect::new(
            area.x + (area.width.saturating_sub(width)) / 2,
            area.y + (area.height.saturating_sub(height)) / 2,
            width,
            height,
        );

        frame.render_widget(Clear, popup_area);

        let item_width = label_width.saturating_sub(3) as usize;
        let items: Vec<ListItem> = menu
            .entries
            .iter()
            .map(|entry| match entry {
                MenuEntry::Section(title) => ListItem::new(Line::from(Span::styled(
                    *title,
                    self.theme.menu_style().add_modifier(Modifier::BOLD),
                ))),
                MenuEntry::Item(item) => {
                    let content = format!(
                        "{label:<item_width$}  {shortcut}",
                        label = item.label,
                        shortcut = item.shortcut,
                    );
                    let style = if item.is_enabled() {
                        self.theme.menu_style()
                    } else {
                        self.theme.menu_disabled_style()
                    };
                    ListItem::new(Line::from(Span::styled(content, style)))
                }
            })
            .collect();

        let mut state = ListState::default();
        state.select(Some(menu.selected_index));

        let list = List::new(items)
            .highlight_style(self.theme.menu_selected_style())
            .style(self.theme.menu_style())
            .block(
                Block::default()
                    .title("Context Menu")
                    .borders(Borders::ALL)
                    .style(self.theme.menu_style()),
            );
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn open_context_menu(&mut self) {
        let link = self.link_ui.link_state(&self.display);
        let unlink = self.link_ui.unlink_state(&self.display);
        let label = if link.value.is_some() {
            "Edit Link..."
        } else {
            "Add Link..."
        };
        self.context_menu = Some(ContextMenuState::new(vec![
            MenuEntry::Section("Link"),
            MenuEntry::Item(MenuItem::new(label, MenuAction::EditLink, link.is_enabled, 'l')),
            MenuEntry::Item(MenuItem::new(
                "Link Selection as URL",
                MenuAction::LinkSelectionText,
                link.is_enabled && !self.display.selection().is_collapsed(),
                'a',
            )),
            MenuEntry::Item(MenuItem::new(
                "Remove Link",
                MenuAction::RemoveLink,
                unlink.is_enabled,
                'u',
            )),
        ]));
    }

    fn close_context_menu(&mut self) {
        self.context_menu = None;
    }

    fn handle_context_menu_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        if self.context_menu.is_none() {
            return false;
        }

        match code {
            KeyCode::Esc => self.close_context_menu(),
            KeyCode::Up => {
                if let Some(menu) = self.context_menu.as_mut() {
                    menu.move_selection(-1);
                }
            }
            KeyCode::Down => {
                if let Some(menu) = self.context_menu.as_mut() {
                    menu.move_selection(1);
                }
            }
            KeyCode::Enter => {
                if let Some(action) = self
                    .context_menu
                    .as_ref()
                    .and_then(|menu| menu.current_action())
                {
                    self.close_context_menu();
                    self.execute_menu_action(action);
                }
            }
            KeyCode::Char(' ') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.close_context_menu();
            }
            KeyCode::Char(ch) => {
                let Some(menu) = self.context_menu.as_mut() else {
                    return false;
                };
                let (handled, action) = menu.shortcut_action(ch);
                if let Some(action) = action {
                    self.close_context_menu();
                    self.execute_menu_action(action);
                }
                return handled;
            }
            _ => return false,
        }
        true
    }

    fn execute_menu_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::EditLink => {
                if !self.link_ui.show(&mut self.display, ShowTrigger::Toolbar) {
                    self.set_status("Nothing to link here");
                }
            }
            MenuAction::LinkSelectionText => self.link_selection_text(),
            MenuAction::RemoveLink => match UnlinkCommand.execute(&mut self.display, None) {
                Ok(true) => self.set_status("Link removed"),
                Ok(false) => {}
                Err(err) => {
                    warn!("remove link failed: {err}");
                    self.set_status(format!("Cannot remove link: {err}"));
                }
            },
        }
    }

    /// Links the selected text to itself, for selections that already hold a URL.
    fn link_selection_text(&mut self) {
        let range = self.display.selection().range().clone();
        let url = match self.display.text_in_range(&range) {
            Ok(text) => text.trim().to_string(),
            Err(err) => {
                warn!("cannot read selection: {err}");
                return;
            }
        };
        if url.is_empty() || url.contains(char::is_whitespace) {
            self.set_status("Selection is not a URL");
            return;
        }
        match LinkCommand.execute(&mut self.display, Some(&url)) {
            Ok(true) => self.set_status(format!("Linked to {url}")),
            Ok(false) => {}
            Err(err) => {
                warn!("link selection failed: {err}");
                self.set_status(format!("Cannot link: {err}"));
            }
        }
    }

    fn status_line(&mut self, content_lines: usize, terminal_width: usize) -> Line<'static> {
        self.prune_status_message();

        let position = self.cursor_position_text();
        if let Some((message, _)) = &self.status_message {
            return Line::from(vec![
                Span::raw(format!("{} ", position)),
                Span::raw(message.clone()),
            ]);
        }

        let filename = self.file_path.display().to_string();
        let marker = if self.dirty { "*" } else { "" };

        let mut spans = vec![
            Span::raw(position),
            Span::raw(" "),
            Span::styled(format!("{}{}", filename, marker), self.theme.filename_style()),
            Span::raw(format!(", {} lines", content_lines)),
        ];
        if let Some(target) = self.link_target_at_cursor() {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("→ {target}"), self.theme.link_style()));
        }

        let shortcuts = format!("{}:Link ^S:Save ^Q:Quit", self.link_ui.keystroke());
        let left_width: usize = spans.iter().map(|span| span.content.chars().count()).sum();
        let shortcuts_width = shortcuts.chars().count();
        if left_width + 1 + shortcuts_width <= terminal_width {
            let padding = terminal_width - left_width - shortcuts_width;
            spans.push(Span::raw(" ".repeat(padding)));
            spans.push(Span::raw(shortcuts));
        }

        Line::from(spans)
    }

    fn link_target_at_cursor(&self) -> Option<String> {
        let cursor = self.display.cursor_pointer();
        find_enclosing_link(self.display.current_document(), Some(&cursor))
            .found()
            .and_then(|link| link.target)
    }

    fn cursor_position_text(&self) -> String {
        match self.display.last_cursor_visual() {
            Some(position) => format!("{}:{}", position.line + 1, usize::from(position.column) + 1),
            None => "?:?".to_string(),
        }
    }

    fn prune_status_message(&mut self) {
        if let Some((_, instant)) = &self.status_message
            && instant.elapsed() > STATUS_TIMEOUT
        {
            self.status_message = None;
        }
    }

    fn adjust_scroll(&mut self, render: &RenderResult, viewport_height: usize) {
        let viewport = viewport_height.max(1);
        let max_scroll = render
            .total_lines
            .saturating_sub(viewport)
            .min(render.total_lines);
        if self.scroll_top > max_scroll {
            self.scroll_top = max_scroll;
        }
        if self.display.cursor_following()
            && let Some(cursor) = self.display.last_cursor_visual()
        {
            self.scroll_top = self.scroll_top_for_cursor(cursor.line, viewport, max_scroll);
        }
    }

    fn scroll_top_for_cursor(&self, cursor_line: usize, viewport: usize, max_scroll: usize) -> usize {
        let mut scroll = self.scroll_top.min(max_scroll);
        if viewport == 0 {
            return scroll;
        }

        let margin = if viewport >= 3 { 1 } else { 0 };
        let top_limit = scroll.saturating_add(margin);
        let bottom_offset = viewport.saturating_sub(1).saturating_sub(margin);
        let bottom_limit = scroll.saturating_add(bottom_offset);
        if cursor_line < top_limit {
            scroll = cursor_line.saturating_sub(margin);
        } else if cursor_line > bottom_limit {
            scroll = cursor_line.saturating_sub(bottom_offset);
        }

        scroll.min(max_scroll)
    }

    fn scroll_by_lines(&mut self, delta: isize) {
        if delta == 0 {
            return;
        }
        self.display.set_cursor_following(false);
        let viewport = self.display.last_view_height().max(1);
        let max_scroll = self
            .display
            .last_total_lines()
            .saturating_sub(viewport) as isize;
        let new_scroll = (self.scroll_top as isize + delta).clamp(0, max_scroll.max(0));
        self.scroll_top = new_scroll as usize;
    }

    fn handle_mouse_event(&mut self, event: MouseEvent) {
        if self.context_menu.is_some() {
            if matches!(event.kind, MouseEventKind::Down(MouseButton::Left)) {
                self.close_context_menu();
            }
            return;
        }

        match event.kind {
            MouseEventKind::ScrollUp => self.scroll_by_lines(-(MOUSE_SCROLL_LINES as isize)),
            MouseEventKind::ScrollDown => self.scroll_by_lines(MOUSE_SCROLL_LINES as isize),
            MouseEventKind::Down(MouseButton::Left) => self.handle_mouse_down(event),
            MouseEventKind::Drag(MouseButton::Left) => self.handle_mouse_drag(event),
            MouseEventKind::Up(MouseButton::Left) => self.handle_mouse_up(event),
            _ => {}
        }
    }

    fn handle_mouse_down(&mut self, event: MouseEvent) {
        self.pending_document_click = false;
        if self
            .link_ui
            .handle_mouse_down(&mut self.display, event.column, event.row)
        {
            self.mouse_drag_anchor = None;
            return;
        }

        let extend = event.modifiers.contains(KeyModifiers::SHIFT);
        let Some(display) = self.display.pointer_from_mouse(event.column, event.row) else {
            if !extend {
                self.display.clear_selection();
            }
            self.mouse_drag_anchor = None;
            return;
        };

        if extend {
            self.display.prepare_selection(true);
            self.mouse_drag_anchor = None;
        } else {
            self.display.clear_selection();
            self.mouse_drag_anchor = Some(display.pointer.clone());
        }
        self.display.focus_display(&display);
        self.pending_document_click = true;
    }

    fn handle_mouse_drag(&mut self, event: MouseEvent) {
        let Some(anchor) = self.mouse_drag_anchor.clone() else {
            return;
        };
        let Some(display) = self.display.pointer_from_mouse(event.column, event.row) else {
            return;
        };
        if self.display.selection_anchor().is_none() {
            self.display.set_selection_anchor(Some(anchor));
        }
        self.display.focus_display(&display);
    }

    /// The link UI sees the release before the click notification, so a
    /// click that opens the panel is never taken for an outside click.
    fn handle_mouse_up(&mut self, event: MouseEvent) {
        self.mouse_drag_anchor = None;
        let clicked_document = std::mem::take(&mut self.pending_document_click);
        if self
            .link_ui
            .handle_mouse_up(&mut self.display, event.column, event.row)
        {
            return;
        }
        if clicked_document {
            self.link_ui.handle_document_click(&mut self.display);
        }
    }

    fn handle_event(&mut self, event: Event) -> Result<()> {
        let revision = self.display.revision();
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key)?,
            Event::Mouse(mouse_event) => self.handle_mouse_event(mouse_event),
            _ => {}
        }
        if self.display.revision() != revision {
            self.mark_dirty();
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let KeyEvent {
            code, modifiers, ..
        } = key;

        if self.handle_context_menu_key(code, modifiers) || self.context_menu.is_some() {
            return Ok(());
        }

        match (code, modifiers) {
            (KeyCode::Char('q'), m) if m.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Ok(());
            }
            (KeyCode::Char('s'), m) if m.contains(KeyModifiers::CONTROL) => {
                return self.save();
            }
            _ => {}
        }

        if self.link_ui.handle_key(&mut self.display, key) {
            return Ok(());
        }

        if is_context_menu_shortcut(code, modifiers) {
            self.open_context_menu();
            return Ok(());
        }

        let previous_cursor = self.display.cursor_pointer();
        let shift = modifiers.contains(KeyModifiers::SHIFT);

        match (code, modifiers) {
            (KeyCode::Left, _) => {
                self.display.prepare_selection(shift);
                if self.display.move_left() {
                    self.display.set_preferred_column(None);
                }
            }
            (KeyCode::Right, _) => {
                self.display.prepare_selection(shift);
                if self.display.move_right() {
                    self.display.set_preferred_column(None);
                }
            }
            (KeyCode::Up, _) => {
                self.display.prepare_selection(shift);
                self.display.move_cursor_vertical(-1);
            }
            (KeyCode::Down, _) => {
                self.display.prepare_selection(shift);
                self.display.move_cursor_vertical(1);
            }
            (KeyCode::Home, _) => {
                self.display.prepare_selection(shift);
                self.display.move_to_visual_line_start();
            }
            (KeyCode::End, _) => {
                self.display.prepare_selection(shift);
                self.display.move_to_visual_line_end();
            }
            (KeyCode::PageUp, _) => {
                self.display.prepare_selection(shift);
                self.display.move_page(-1);
            }
            (KeyCode::PageDown, _) => {
                self.display.prepare_selection(shift);
                self.display.move_page(1);
            }
            (KeyCode::Backspace, _) => {
                self.display.clear_selection();
                if self.display.backspace() {
                    self.mark_dirty();
                    self.display.set_preferred_column(None);
                }
            }
            (KeyCode::Enter, _) => {
                self.display.clear_selection();
                if self.display.insert_char('\n') {
                    self.mark_dirty();
                    self.display.set_preferred_column(None);
                }
            }
            (KeyCode::Char(ch), m)
                if !m.contains(KeyModifiers::CONTROL) && !m.contains(KeyModifiers::ALT) =>
            {
                self.display.clear_selection();
                if self.display.insert_char(ch) {
                    self.mark_dirty();
                    self.display.set_preferred_column(None);
                }
            }
            _ => {}
        }

        if self.display.cursor_pointer() != previous_cursor {
            self.display.set_cursor_following(true);
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        self.prune_status_message();
    }

    fn save(&mut self) -> Result<()> {
        match self.document_format {
            DocumentFormat::Ftml => {
                let writer = Writer::new();
                let contents = writer
                    .write_to_string(self.display.document())
                    .context("failed to render FTML")?;
                fs::write(&self.file_path, contents)
                    .with_context(|| format!("failed to write {}", self.file_path.display()))?;
            }
            DocumentFormat::Markdown => {
                let mut contents = Vec::new();
                markdown::write(&mut contents, self.display.document())
                    .context("failed to render Markdown")?;
                fs::write(&self.file_path, contents)
                    .with_context(|| format!("failed to write {}", self.file_path.display()))?;
            }
        }

        info!("saved {}", self.file_path.display());
        self.dirty = false;
        self.set_status("Saved");
        Ok(())
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}
