//! Editor session state, independent of egui
//!
//! Holds the working copy the window edits. Nothing here talks to the overlay;
//! the app turns [`EditorState::live_snapshot`] and [`EditorState::commit`]
//! into IPC messages.

use tracing::{info, warn};

use crate::config::{ButtonDefinition, ButtonId, ConfigStore, Profile};
use crate::error::StoreError;

/// Transient message shown under the toolbar
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Info(String),
    Error(String),
}

pub struct EditorState {
    store: ConfigStore,
    filename: String,
    working: Profile,
    selected: Option<ButtonId>,
    profiles: Vec<String>,
    status: Option<Status>,
}

impl EditorState {
    pub fn new(store: ConfigStore, filename: String, mut profile: Profile) -> Self {
        profile.filename = filename.clone();
        let selected = profile.buttons.first().map(|b| b.id.clone());
        let profiles = store.list_profiles();
        Self {
            store,
            filename,
            working: profile,
            selected,
            profiles,
            status: None,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn profile(&self) -> &Profile {
        &self.working
    }

    pub fn profiles(&self) -> &[String] {
        &self.profiles
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    pub fn selected(&self) -> Option<&ButtonId> {
        self.selected.as_ref()
    }

    pub fn select(&mut self, id: ButtonId) {
        if self.working.button(&id).is_some() {
            self.selected = Some(id);
        }
    }

    pub fn selected_button(&self) -> Option<&ButtonDefinition> {
        self.selected.as_ref().and_then(|id| self.working.button(id))
    }

    pub fn selected_button_mut(&mut self) -> Option<&mut ButtonDefinition> {
        let id = self.selected.clone()?;
        self.working.button_mut(&id)
    }

    pub fn add_button(&mut self) -> ButtonId {
        let id = self.working.add_button();
        self.selected = Some(id.clone());
        id
    }

    pub fn duplicate_selected(&mut self) -> Option<ButtonId> {
        let Some(source) = self.selected.clone() else {
            self.status = Some(Status::Info("Select a button to duplicate first".to_string()));
            return None;
        };
        match self.working.duplicate_button(&source) {
            Ok(id) => {
                self.selected = Some(id.clone());
                Some(id)
            }
            Err(e) => {
                self.status = Some(Status::Error(e.to_string()));
                None
            }
        }
    }

    /// Remove the selected button; the selection moves to whichever button takes its slot,
    /// or the new last one when the removed button was last
    pub fn delete_selected(&mut self) -> Option<ButtonId> {
        let id = self.selected.take()?;
        let index = match self.working.remove_button(&id) {
            Ok(index) => index,
            Err(e) => {
                self.status = Some(Status::Error(e.to_string()));
                return None;
            }
        };
        let neighbour = index.min(self.working.buttons.len().saturating_sub(1));
        self.selected = self.working.buttons.get(neighbour).map(|b| b.id.clone());
        info!(id = %id, "Deleted button");
        Some(id)
    }

    pub fn apply_font_to_all(&mut self, family: &str) {
        self.status = Some(match self.working.apply_font_to_all(family) {
            Ok(count) => Status::Info(format!("Applied '{}' to {count} buttons", family.trim())),
            Err(e) => Status::Error(e.to_string()),
        });
    }

    /// Load another profile into the editor; on failure the working copy is kept
    pub fn switch_file(&mut self, filename: &str) -> Result<(), StoreError> {
        if filename == self.filename {
            return Ok(());
        }
        match self.store.load_profile(filename) {
            Ok(profile) => {
                self.filename = profile.filename.clone();
                self.selected = profile.buttons.first().map(|b| b.id.clone());
                self.working = profile;
                self.status = None;
                info!(file = %self.filename, "Editing profile");
                Ok(())
            }
            Err(e) => {
                warn!(file = %filename, error = %e, "Failed to load profile in editor");
                self.status = Some(Status::Error(format!("Failed to load {filename}: {e}")));
                Err(e)
            }
        }
    }

    /// Create an empty profile and start editing it
    pub fn create_profile(&mut self, name: &str) -> Result<(), StoreError> {
        let filename = self.report(self.store.create_profile(name))?;
        self.refresh_profiles();
        self.switch_file(&filename)?;
        self.status = Some(Status::Info(format!("Created {filename}")));
        Ok(())
    }

    /// Copy the current profile's file to `name` and start editing the copy
    pub fn copy_profile(&mut self, name: &str) -> Result<(), StoreError> {
        let filename = self.report(self.store.copy_profile(&self.filename, name))?;
        self.refresh_profiles();
        self.switch_file(&filename)?;
        self.status = Some(Status::Info(format!("Copied to {filename}")));
        Ok(())
    }

    /// Delete the edited profile and move on to the first remaining one
    pub fn delete_profile(&mut self) -> Result<(), StoreError> {
        let deleted = self.filename.clone();
        self.report(self.store.delete_profile(&deleted))?;
        self.refresh_profiles();

        let next = self
            .profiles
            .first()
            .cloned()
            .unwrap_or_else(|| crate::constants::config::DEFAULT_PROFILE.to_string());
        match self.store.load_profile(&next) {
            Ok(profile) => {
                self.selected = profile.buttons.first().map(|b| b.id.clone());
                self.working = profile;
            }
            Err(e) => {
                warn!(
                    file = %next,
                    error = %e,
                    "Remaining profile unreadable, editing an empty one"
                );
                self.selected = None;
                self.working = Profile::empty(next.clone());
            }
        }
        self.filename = next;
        self.status = Some(Status::Info(format!("Deleted {deleted}")));
        Ok(())
    }

    pub fn refresh_profiles(&mut self) {
        self.profiles = self.store.list_profiles();
    }

    /// Copy of the working profile for a live preview
    pub fn live_snapshot(&self) -> Profile {
        self.working.clone()
    }

    /// Final `(filename, profile)` pair handed back on save
    pub fn commit(&self) -> (String, Profile) {
        (self.filename.clone(), self.working.clone())
    }

    fn report<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if let Err(e) = &result {
            self.status = Some(Status::Error(e.to_string()));
        }
        result
    }
}
