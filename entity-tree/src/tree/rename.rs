//! Inline rename editor
//!
//! Clicking a node's name swaps the label for a text input. Enter and loss of
//! focus both commit through [`TreeView::commit_name`]; the first commit swaps
//! the input back to a label, so a second trigger for the same session finds
//! nothing to commit and the rename is sent once.

use serde_json::Value;
use tracing::info;

use super::node::NameLabel;
use super::{Effect, NodeHandle, TreeView};
use crate::error::ConsoleResult;

/// Extra input width beyond the current name
const INPUT_PADDING: usize = 4;

/// An open name input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameSession {
    original: String,
    buffer: String,
    size: usize,
    selected_all: bool,
}

impl RenameSession {
    fn start(current: &str) -> Self {
        let original = current.trim().to_string();
        Self {
            size: original.chars().count() + INPUT_PADDING,
            buffer: original.clone(),
            original,
            selected_all: true,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Input width in characters
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whole text selected, as on entering edit mode
    pub fn selected_all(&self) -> bool {
        self.selected_all
    }
}

/// Keys the name input reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Enter,
    Other,
}

impl TreeView {
    /// Enter edit mode for a node's name. Already editing is a no-op.
    pub fn make_name_editable(&mut self, handle: NodeHandle) -> ConsoleResult<bool> {
        let node = self.node_mut(handle)?;
        let current = match &node.name {
            NameLabel::Label(name) => name.clone(),
            NameLabel::Editing(_) => return Ok(false),
        };
        node.name = NameLabel::Editing(RenameSession::start(&current));
        node.buttons_visible = false;
        node.click_suspended = true;
        Ok(true)
    }

    /// Replace the input text
    pub fn edit_name(&mut self, handle: NodeHandle, text: &str) -> ConsoleResult<()> {
        if let NameLabel::Editing(session) = &mut self.node_mut(handle)?.name {
            session.buffer = text.to_string();
            session.selected_all = false;
        }
        Ok(())
    }

    pub fn name_key_press(
        &mut self,
        handle: NodeHandle,
        key: EditKey,
    ) -> ConsoleResult<Option<String>> {
        match key {
            EditKey::Enter => self.commit_name(handle),
            EditKey::Other => Ok(None),
        }
    }

    pub fn name_blur(&mut self, handle: NodeHandle) -> ConsoleResult<Option<String>> {
        self.commit_name(handle)
    }

    /// Click on a name label re-enters edit mode
    pub fn click_name(&mut self, handle: NodeHandle) -> ConsoleResult<bool> {
        self.make_name_editable(handle)
    }

    /// Commit the open input, if any. Queues the `name` update and a preview
    /// reload and returns the committed name.
    pub fn commit_name(&mut self, handle: NodeHandle) -> ConsoleResult<Option<String>> {
        let node = self.node_mut(handle)?;
        let new_name = match &node.name {
            NameLabel::Editing(session) => session.buffer.clone(),
            NameLabel::Label(_) => return Ok(None),
        };
        node.name = NameLabel::Label(new_name.clone());
        node.click_suspended = false;
        node.buttons_visible = true;
        let entity_id = node.entity_id.clone();

        info!(entity = %entity_id, name = %new_name, "rename committed");
        self.push_effect(Effect::SetProperty {
            entity_id,
            key: "name".to_string(),
            value: Value::String(new_name.clone()),
        });
        self.push_effect(Effect::ReloadPreviews);
        Ok(Some(new_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, EntityKind};

    fn view_with(name: &str) -> (TreeView, NodeHandle) {
        let mut view = TreeView::default();
        let entity = Entity::new("id", EntityKind::Content).with_name(name);
        let handle = view.render(&entity, None, None, false, false).handle();
        (view, handle)
    }

    #[test]
    fn edit_mode_prefills_trimmed_name() {
        let (mut view, handle) = view_with("  Foo ");
        assert!(view.make_name_editable(handle).unwrap());

        let node = view.node(handle).unwrap();
        match &node.name {
            NameLabel::Editing(session) => {
                assert_eq!(session.buffer(), "Foo");
                assert_eq!(session.size(), 7);
                assert!(session.selected_all());
            }
            other => panic!("expected editing, got {:?}", other),
        }
        assert!(node.click_suspended);
        assert!(!node.buttons_visible);
        assert!(!view.make_name_editable(handle).unwrap());
    }

    #[test]
    fn blur_commits_once() {
        let (mut view, handle) = view_with("Foo");
        view.make_name_editable(handle).unwrap();
        view.edit_name(handle, "Bar").unwrap();

        assert_eq!(view.name_blur(handle).unwrap().as_deref(), Some("Bar"));
        assert_eq!(view.node(handle).unwrap().name, NameLabel::Label("Bar".into()));
        assert_eq!(
            view.take_effects(),
            vec![
                Effect::SetProperty {
                    entity_id: "id".into(),
                    key: "name".into(),
                    value: Value::String("Bar".into()),
                },
                Effect::ReloadPreviews,
            ]
        );
    }

    #[test]
    fn enter_then_blur_sends_one_rename() {
        let (mut view, handle) = view_with("Foo");
        view.make_name_editable(handle).unwrap();
        view.edit_name(handle, "Baz").unwrap();

        assert_eq!(view.name_key_press(handle, EditKey::Other).unwrap(), None);
        assert!(view.name_key_press(handle, EditKey::Enter).unwrap().is_some());
        assert!(view.name_blur(handle).unwrap().is_none());

        let renames = view
            .take_effects()
            .into_iter()
            .filter(|e| matches!(e, Effect::SetProperty { .. }))
            .count();
        assert_eq!(renames, 1);
    }

    #[test]
    fn clicks_are_suspended_while_editing() {
        let (mut view, handle) = view_with("Foo");
        view.make_name_editable(handle).unwrap();
        assert!(!view.click_node(handle).unwrap());
        assert_eq!(view.selected(), None);

        view.name_blur(handle).unwrap();
        assert!(view.click_node(handle).unwrap());
        assert_eq!(view.selected(), Some(handle));

        assert!(view.click_name(handle).unwrap());
        assert!(view.node(handle).unwrap().name.is_editing());
    }
}
