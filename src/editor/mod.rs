//! Settings editor boundary
//!
//! The manager hands a copy of the active profile to a [`SettingsEditor`] and
//! later receives [`EditorEvent`]s back through the main loop. The concrete
//! editor runs the egui window in a child process (see [`process`]).

use anyhow::Result;
use std::path::Path;

use crate::config::Profile;

pub mod process;

pub use process::ProcessEditor;

/// Outcome messages from an open editor session
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Preview without persisting
    LiveApply(Profile),
    /// Adopt `profile` as the active profile stored under `filename`
    Commit { filename: String, profile: Profile },
    /// Discard everything since the session opened
    Cancel,
}

pub trait SettingsEditor {
    /// Start a session on `profile`, whose file lives in `dir`
    fn open(&mut self, dir: &Path, profile: &Profile) -> Result<()>;

    /// Release the session once it has ended
    fn close(&mut self);
}
