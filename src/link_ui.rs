//! Floating link editor.
//!
//! `LinkUi` decides when the link panel is shown, where it is anchored and
//! what happens to the document when the user is done with it. It owns the
//! panel and its event subscriptions; the editing surface is passed in with
//! every call.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, warn};
use ratatui::Frame;

use crate::config::LinkPanelConfig;
use crate::keymap::KeyBinding;
use crate::locator::{LinkSpan, find_enclosing_link};
use crate::selection::{Selection, SelectionRange};
use crate::surface::{EditingSurface, EditingView};
use crate::theme::Theme;

mod attach;
mod commands;
mod form;
mod panel;
mod subscriptions;

pub use attach::{Anchor, AttachOutcome, PanelAttachment, PanelPositioning, VisibilityChange};
pub use commands::{Command, CommandState, LinkCommand, UnlinkCommand};
pub use form::{FormAction, FormFocus, LinkForm};
pub use panel::{ButtonStates, LinkPanel, MIN_PANEL_WIDTH, PANEL_HEIGHT, Placement};
pub use subscriptions::{EventSource, Handler, SubscriptionId, Subscriptions};

/// How an explicit show request was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowTrigger {
    Toolbar,
    Keystroke,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PanelState {
    #[default]
    Hidden,
    Shown {
        anchor: Anchor,
        /// Range handed to the mutation engine on submit or removal.
        target: SelectionRange,
    },
}

#[derive(Clone, Copy, Debug)]
struct CloseHandles {
    escape: SubscriptionId,
    outside_click: SubscriptionId,
}

pub struct LinkUi<P = LinkPanel> {
    attachment: PanelAttachment<P>,
    state: PanelState,
    subscriptions: Subscriptions,
    close_handles: Option<CloseHandles>,
    tracking: Option<SubscriptionId>,
    form: LinkForm,
    panel_focused: bool,
    keystroke: KeyBinding,
    link_command: LinkCommand,
    unlink_command: UnlinkCommand,
}

impl LinkUi<LinkPanel> {
    pub fn from_config(config: &LinkPanelConfig) -> Self {
        Self::new(LinkPanel::from_config(config), config.keystroke)
    }

    pub fn render<V: EditingView + ?Sized>(&self, frame: &mut Frame, view: &V, theme: &Theme) {
        if !self.is_visible() {
            return;
        }
        let buttons = self.button_states(view);
        self.attachment
            .panel()
            .render(frame, &self.form, buttons, self.panel_focused, theme);
    }
}

impl<P: PanelPositioning> LinkUi<P> {
    pub fn new(panel: P, keystroke: KeyBinding) -> Self {
        Self {
            attachment: PanelAttachment::new(panel),
            state: PanelState::Hidden,
            subscriptions: Subscriptions::new(),
            close_handles: None,
            tracking: None,
            form: LinkForm::default(),
            panel_focused: false,
            keystroke,
            link_command: LinkCommand,
            unlink_command: UnlinkCommand,
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        matches!(self.state, PanelState::Shown { .. })
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        match &self.state {
            PanelState::Shown { anchor, .. } => Some(anchor),
            PanelState::Hidden => None,
        }
    }

    /// The URL being edited; only exists while the panel is shown.
    pub fn pending_url(&self) -> Option<&str> {
        self.is_visible().then(|| self.form.value())
    }

    pub fn form(&self) -> &LinkForm {
        &self.form
    }

    pub fn panel(&self) -> &P {
        self.attachment.panel()
    }

    pub fn is_panel_focused(&self) -> bool {
        self.panel_focused
    }

    pub fn keystroke(&self) -> KeyBinding {
        self.keystroke
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    /// Live escape and outside-click subscriptions.
    pub fn active_close_subscriptions(&self) -> usize {
        self.subscriptions.count_matching(Handler::is_close_handler)
    }

    pub fn is_tracking(&self) -> bool {
        self.tracked_link().is_some()
    }

    pub fn tracked_link(&self) -> Option<&LinkSpan> {
        self.subscriptions
            .handlers_for(EventSource::RenderCompleted)
            .find_map(|handler| match handler {
                Handler::TrackLink(link) => Some(link),
                _ => None,
            })
    }

    pub fn link_state<V: EditingView + ?Sized>(&self, view: &V) -> CommandState {
        self.link_command.state(view)
    }

    pub fn unlink_state<V: EditingView + ?Sized>(&self, view: &V) -> CommandState {
        self.unlink_command.state(view)
    }

    pub fn button_states<V: EditingView + ?Sized>(&self, view: &V) -> ButtonStates {
        ButtonStates {
            save_enabled: self.link_state(view).is_enabled,
            unlink_enabled: self.unlink_state(view).is_enabled,
        }
    }

    /// Opens the panel for the current selection and moves keyboard focus
    /// into its URL field. Showing again while shown re-anchors the panel.
    pub fn show<S: EditingSurface + ?Sized>(&mut self, surface: &mut S, trigger: ShowTrigger) -> bool {
        if trigger == ShowTrigger::Toolbar && !surface.has_focus() {
            debug!("link panel: toolbar request ignored, document is not focused");
            return false;
        }
        let AttachOutcome::Attached { anchor, change } = self.attachment.attach(&*surface, None) else {
            debug!("link panel: nothing to anchor to");
            return false;
        };

        self.stop_tracking();
        let value = anchor
            .link()
            .and_then(LinkSpan::target)
            .unwrap_or_default()
            .to_string();
        self.form.reset(&value);
        let target = mutation_target(&anchor, &surface.selection());
        self.enter_shown(anchor, target, change);
        self.panel_focused = true;
        surface.release_focus();
        true
    }

    /// Called after a click in the document has moved the caret. A caret
    /// inside a link opens the panel on that link and follows it across
    /// renders.
    pub fn handle_document_click<S: EditingSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        let selection = surface.selection();
        if !selection.is_collapsed() {
            return false;
        }
        let Some(link) =
            find_enclosing_link(surface.current_document(), Some(selection.first_position())).found()
        else {
            return false;
        };
        let AttachOutcome::Attached { anchor, change } = self.attachment.attach(&*surface, Some(&link))
        else {
            return false;
        };

        self.form.reset(link.target().unwrap_or_default());
        let target = mutation_target(&anchor, &selection);
        self.enter_shown(anchor, target, change);
        self.track(link);
        if self.panel_focused {
            self.panel_focused = false;
            surface.restore_focus();
        }
        true
    }

    /// Called after every render of the editing surface.
    pub fn handle_render<S: EditingSurface + ?Sized>(&mut self, surface: &mut S) {
        let Some(tracked) = self.tracked_link().cloned() else {
            return;
        };
        let selection = surface.selection();
        let current = if selection.is_collapsed() {
            find_enclosing_link(surface.current_document(), Some(selection.first_position())).found()
        } else {
            None
        };

        match current {
            Some(link) if link.is_same_span(&tracked) => {
                match self.attachment.attach(&*surface, Some(&link)) {
                    AttachOutcome::Attached { anchor, change } => {
                        let target = mutation_target(&anchor, &selection);
                        self.enter_shown(anchor, target, change);
                        if let Some(id) = self.tracking
                            && let Some(handler) = self.subscriptions.handler_mut(id)
                        {
                            *handler = Handler::TrackLink(link);
                        }
                    }
                    AttachOutcome::NoTarget => debug!("link panel: tracked link is off screen"),
                }
            }
            _ => {
                debug!("link panel: caret left the tracked link");
                self.hide_panel();
            }
        }
    }

    /// Returns true when the key was consumed by the panel.
    pub fn handle_key<S: EditingSurface + ?Sized>(&mut self, surface: &mut S, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            && key.modifiers == KeyModifiers::NONE
            && self
                .subscriptions
                .handlers_for(EventSource::KeyDown)
                .any(|handler| *handler == Handler::CloseOnEscape)
        {
            self.close(surface);
            return true;
        }
        if self.keystroke.matches(&key) {
            self.show(surface, ShowTrigger::Keystroke);
            return true;
        }
        if !self.is_visible() || !self.panel_focused {
            return false;
        }
        let action = self.form.handle_key(key);
        self.perform(surface, action);
        true
    }

    /// Presses inside the panel move focus to the control under the mouse.
    pub fn handle_mouse_down<S: EditingSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        column: u16,
        row: u16,
    ) -> bool {
        if !self.is_visible() || !self.attachment.panel().contains(column, row) {
            return false;
        }
        let Some(inner) = self.attachment.panel().content_area() else {
            return true;
        };
        match LinkForm::hit_test(inner, column, row) {
            Some(FormFocus::Url) => self.form.place_caret(inner, column),
            Some(control) => self.form.set_focus(control),
            None => {}
        }
        if !self.panel_focused {
            self.panel_focused = true;
            surface.release_focus();
        }
        true
    }

    /// Releases inside the panel activate buttons; anywhere else they close
    /// the panel. Returns true when the release happened inside the panel.
    pub fn handle_mouse_up<S: EditingSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        column: u16,
        row: u16,
    ) -> bool {
        if !self.is_visible() {
            return false;
        }
        if self.attachment.panel().contains(column, row) {
            let control = self
                .attachment
                .panel()
                .content_area()
                .and_then(|inner| LinkForm::hit_test(inner, column, row));
            if let Some(control) = control
                && control != FormFocus::Url
            {
                self.perform(surface, FormAction::for_button(control));
            }
            return true;
        }

        let closes = self
            .subscriptions
            .handlers_for(EventSource::MouseUp)
            .any(|handler| *handler == Handler::CloseOnOutsideClick);
        if closes {
            self.hide_panel();
            if surface.surface_contains(column, row) {
                surface.restore_focus();
            }
        }
        false
    }

    /// Applies the pending URL to the anchored range. The panel closes even
    /// when the mutation fails.
    pub fn submit<S: EditingSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        let PanelState::Shown { target, .. } = &self.state else {
            return false;
        };
        let target = target.clone();
        let url = self.form.value().to_string();
        debug!("link panel: applying {url:?}");
        if let Err(err) = surface.apply_link(&target, &url) {
            warn!("link panel: failed to apply link: {err}");
        }
        self.close(surface);
        true
    }

    pub fn remove_link<S: EditingSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        let PanelState::Shown { target, .. } = &self.state else {
            return false;
        };
        let target = target.clone();
        debug!("link panel: removing link");
        if let Err(err) = surface.remove_link(&target) {
            warn!("link panel: failed to remove link: {err}");
        }
        self.close(surface);
        true
    }

    pub fn cancel<S: EditingSurface + ?Sized>(&mut self, surface: &mut S) -> bool {
        if !self.is_visible() {
            return false;
        }
        self.close(surface);
        true
    }

    fn perform<S: EditingSurface + ?Sized>(&mut self, surface: &mut S, action: FormAction) {
        match action {
            FormAction::None | FormAction::Edited => {}
            FormAction::Submit => {
                if self.link_state(&*surface).is_enabled {
                    self.submit(surface);
                }
            }
            FormAction::Unlink => {
                if self.unlink_state(&*surface).is_enabled {
                    self.remove_link(surface);
                }
            }
            FormAction::Cancel => {
                self.cancel(surface);
            }
        }
    }

    fn close<S: EditingSurface + ?Sized>(&mut self, surface: &mut S) {
        self.hide_panel();
        surface.restore_focus();
    }

    fn hide_panel(&mut self) {
        let change = self.attachment.detach();
        if change == VisibilityChange::Hidden {
            debug!("link panel: hidden");
        }
        self.state = PanelState::Hidden;
        self.remove_subscriptions();
        self.form.reset("");
        self.panel_focused = false;
    }

    fn enter_shown(&mut self, anchor: Anchor, target: SelectionRange, change: VisibilityChange) {
        match change {
            VisibilityChange::Shown => debug!("link panel: shown on {anchor:?}"),
            VisibilityChange::Unchanged => debug!("link panel: re-anchored"),
            VisibilityChange::Hidden => warn!("link panel: positioning reported hidden on attach"),
        }
        self.state = PanelState::Shown { anchor, target };
        self.install_close_handlers();
    }

    fn install_close_handlers(&mut self) {
        if self.close_handles.is_some() {
            return;
        }
        let escape = self
            .subscriptions
            .subscribe(EventSource::KeyDown, Handler::CloseOnEscape);
        let outside_click = self
            .subscriptions
            .subscribe(EventSource::MouseUp, Handler::CloseOnOutsideClick);
        debug!("link panel: installed close subscriptions {escape:?} {outside_click:?}");
        self.close_handles = Some(CloseHandles {
            escape,
            outside_click,
        });
    }

    fn remove_subscriptions(&mut self) {
        if let Some(handles) = self.close_handles.take() {
            self.subscriptions.unsubscribe(handles.escape);
            self.subscriptions.unsubscribe(handles.outside_click);
            debug!("link panel: removed close subscriptions");
        }
        self.stop_tracking();
    }

    fn track(&mut self, link: LinkSpan) {
        self.stop_tracking();
        self.tracking = Some(
            self.subscriptions
                .subscribe(EventSource::RenderCompleted, Handler::TrackLink(link)),
        );
    }

    fn stop_tracking(&mut self) {
        if let Some(id) = self.tracking.take() {
            self.subscriptions.unsubscribe(id);
        }
    }
}

/// A caret on a link targets the whole link; anything else targets the
/// selection as it was when the panel opened.
fn mutation_target(anchor: &Anchor, selection: &Selection) -> SelectionRange {
    match anchor {
        Anchor::Link(link) if selection.is_collapsed() => SelectionRange::collapsed(link.start.clone()),
        Anchor::Link(_) => selection.range().clone(),
        Anchor::Selection(range) => range.clone(),
    }
}

#[cfg(test)]
#[path = "link_ui_tests.rs"]
mod link_ui_tests;
