use std::io;

use thiserror::Error;

use crate::config::ButtonId;

/// Failures of the profile store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Profile '{0}' not found")]
    NotFound(String),
    #[error("Profile '{0}' already exists")]
    AlreadyExists(String),
    #[error("Profile '{file}' is corrupt: {source}")]
    Corrupt {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Cannot delete '{0}': at least one profile must remain")]
    LastProfile(String),
    #[error("Invalid profile name '{0}'")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Failures while replaying a shortcut
#[derive(Error, Debug)]
pub enum ShortcutError {
    #[error("Invalid shortcut '{0}'")]
    Invalid(String),
    #[error("Shortcut execution failed: {0}")]
    Execution(String),
}

/// Failures of in-memory profile edits
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    /// The id is no longer part of the active profile (replaced while an event was in flight)
    #[error("Button {0} is not in the active profile")]
    StaleButton(ButtonId),
    #[error("Font family must not be blank")]
    BlankFontFamily,
}
