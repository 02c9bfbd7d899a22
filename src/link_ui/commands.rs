use tdoc::ParagraphType;

use crate::editor::paragraph_type_at;
use crate::error::LinkError;
use crate::locator::find_enclosing_link;
use crate::surface::{EditingSurface, EditingView};

/// Availability of a command, read at the moment it is observed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandState {
    pub is_enabled: bool,
    pub value: Option<String>,
}

pub trait Command {
    fn state<V: EditingView + ?Sized>(&self, view: &V) -> CommandState;

    fn execute<S: EditingSurface + ?Sized>(
        &self,
        surface: &mut S,
        value: Option<&str>,
    ) -> Result<bool, LinkError>;
}

/// Applies a link to the selection, or retargets the link under the caret.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinkCommand;

impl Command for LinkCommand {
    fn state<V: EditingView + ?Sized>(&self, view: &V) -> CommandState {
        let selection = view.selection();
        let document = view.current_document();
        let is_enabled = matches!(
            paragraph_type_at(document, selection.first_position()),
            Some(kind) if kind != ParagraphType::CodeBlock
        );
        let value = find_enclosing_link(document, Some(selection.first_position()))
            .found()
            .and_then(|link| link.target);
        CommandState { is_enabled, value }
    }

    fn execute<S: EditingSurface + ?Sized>(
        &self,
        surface: &mut S,
        value: Option<&str>,
    ) -> Result<bool, LinkError> {
        let range = surface.selection().range().clone();
        surface.apply_link(&range, value.unwrap_or_default())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct UnlinkCommand;

impl Command for UnlinkCommand {
    fn state<V: EditingView + ?Sized>(&self, view: &V) -> CommandState {
        let selection = view.selection();
        CommandState {
            is_enabled: view.range_has_link(selection.range()),
            value: None,
        }
    }

    fn execute<S: EditingSurface + ?Sized>(
        &self,
        surface: &mut S,
        _value: Option<&str>,
    ) -> Result<bool, LinkError> {
        let range = surface.selection().range().clone();
        surface.remove_link(&range)
    }
}
