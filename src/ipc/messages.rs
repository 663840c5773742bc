//! IPC message types for overlay ↔ editor process communication

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::Profile;
use crate::editor::EditorEvent;

/// Sent from the overlay process to the editor child
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum EditorRequest {
    /// Start editing; `profile` is stored as `filename` inside `dir`
    Init {
        dir: PathBuf,
        filename: String,
        profile: Profile,
    },
}

/// Sent from the editor child to the overlay process
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum EditorMessage {
    /// Preview the working copy on screen
    LiveApply(Profile),

    /// Save and adopt the working copy
    Commit { filename: String, profile: Profile },

    /// Discard all edits
    Cancel,
}

impl From<EditorMessage> for EditorEvent {
    fn from(msg: EditorMessage) -> Self {
        match msg {
            EditorMessage::LiveApply(profile) => EditorEvent::LiveApply(profile),
            EditorMessage::Commit { filename, profile } => {
                EditorEvent::Commit { filename, profile }
            }
            EditorMessage::Cancel => EditorEvent::Cancel,
        }
    }
}
