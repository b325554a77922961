use crate::{Message, ProjectId};

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct ChatState {
    pub(crate) project_id: Option<ProjectId>,
    pub(crate) messages: Vec<Message>,
    pub(crate) input: String,
    pub(crate) sending: bool,
    /// Set while the log is being reloaded after a send.
    pub(crate) awaiting_reload: bool,
    /// The project's log has been fetched at least once.
    pub(crate) history_loaded: bool,
}

impl ChatState {
    /// Trimmed input if a send is currently possible.
    ///
    /// Sending waits for the history so the reload baseline counts real messages.
    pub(crate) fn sendable(&self) -> Option<(&str, &str)> {
        if self.sending || !self.history_loaded {
            return None;
        }
        let project_id = self.project_id.as_deref()?;
        let text = self.input.trim();
        if text.is_empty() {
            return None;
        }
        Some((project_id, text))
    }

    pub(crate) fn switch_project(&mut self, project_id: Option<ProjectId>) {
        self.project_id = project_id;
        self.messages.clear();
        self.awaiting_reload = false;
        self.history_loaded = false;
    }

    pub(crate) fn is_project(&self, project_id: &str) -> bool {
        self.project_id.as_deref() == Some(project_id)
    }
}
