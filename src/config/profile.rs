//! Profile: an ordered set of button definitions persisted as one file
//!
//! The file body is `{ "buttons": [...] }`. The filename is the profile's
//! identity and is carried alongside the buttons but never written into the file.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

use super::button::{ButtonDefinition, ButtonId};
use crate::error::ModelError;
use crate::types::Position;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(skip)]
    pub filename: String,
    #[serde(default)]
    pub buttons: Vec<ButtonDefinition>,
}

impl Profile {
    /// A profile with no buttons (valid, renders nothing)
    pub fn empty(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            buttons: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn index_of(&self, id: &ButtonId) -> Option<usize> {
        self.buttons.iter().position(|b| &b.id == id)
    }

    pub fn button(&self, id: &ButtonId) -> Option<&ButtonDefinition> {
        self.buttons.iter().find(|b| &b.id == id)
    }

    pub fn button_mut(&mut self, id: &ButtonId) -> Option<&mut ButtonDefinition> {
        self.buttons.iter_mut().find(|b| &b.id == id)
    }

    /// Record a dragged position for `id`
    pub fn update_position(&mut self, id: &ButtonId, position: Position) -> Result<(), ModelError> {
        let button = self
            .button_mut(id)
            .ok_or_else(|| ModelError::StaleButton(id.clone()))?;
        button.position = position;
        Ok(())
    }

    pub fn set_all_locks(&mut self, locked: bool) {
        for button in &mut self.buttons {
            button.position_lock = locked;
        }
    }

    /// Lock state shown in the tray: locked only when every button is locked
    pub fn all_locked(&self) -> bool {
        !self.buttons.is_empty() && self.buttons.iter().all(|b| b.position_lock)
    }

    /// Append a new default button and return its id
    pub fn add_button(&mut self) -> ButtonId {
        let button = ButtonDefinition::new_default();
        let id = button.id.clone();
        self.buttons.push(button);
        id
    }

    /// Append a duplicate of `id` (new id, "copy" label, offset position)
    pub fn duplicate_button(&mut self, id: &ButtonId) -> Result<ButtonId, ModelError> {
        let source = self
            .button(id)
            .ok_or_else(|| ModelError::StaleButton(id.clone()))?;
        let copy = source.duplicate();
        let new_id = copy.id.clone();
        info!(source = %id, id = %new_id, label = %copy.label, "Duplicated button");
        self.buttons.push(copy);
        Ok(new_id)
    }

    /// Remove `id`, returning its former index
    pub fn remove_button(&mut self, id: &ButtonId) -> Result<usize, ModelError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| ModelError::StaleButton(id.clone()))?;
        self.buttons.remove(index);
        Ok(index)
    }

    /// Set the same font family on every button, returning how many were touched
    pub fn apply_font_to_all(&mut self, family: &str) -> Result<usize, ModelError> {
        let family = family.trim();
        if family.is_empty() {
            return Err(ModelError::BlankFontFamily);
        }
        for button in &mut self.buttons {
            button.font_family = family.to_string();
        }
        Ok(self.buttons.len())
    }

    /// Clamp every definition and make ids unique
    /// Returns true if anything was corrected
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;
        let mut seen = HashSet::new();

        for button in &mut self.buttons {
            changed |= button.normalize();
            if !seen.insert(button.id.clone()) {
                let fresh = ButtonId::generate();
                warn!(
                    file = %self.filename,
                    duplicate = %button.id,
                    replacement = %fresh,
                    "Duplicate button id, assigning a new one"
                );
                button.id = fresh.clone();
                seen.insert(fresh);
                changed = true;
            }
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with(count: usize) -> Profile {
        let mut profile = Profile::empty("test.json");
        for _ in 0..count {
            profile.add_button();
        }
        profile
    }

    #[test]
    fn test_missing_buttons_key_is_empty_profile() {
        let profile: Profile = serde_json::from_str("{}").unwrap();
        assert!(profile.is_empty());
    }

    #[test]
    fn test_filename_is_not_serialized() {
        let profile = Profile::empty("secret.json");
        let json = serde_json::to_string(&profile).unwrap();
        assert_eq!(json, r#"{"buttons":[]}"#);
    }

    #[test]
    fn test_update_position_known_id() {
        let mut profile = profile_with(2);
        let id = profile.buttons[1].id.clone();
        profile.update_position(&id, Position::new(7, 9)).unwrap();
        assert_eq!(profile.buttons[1].position, Position::new(7, 9));
    }

    #[test]
    fn test_update_position_stale_id() {
        let mut profile = profile_with(1);
        let err = profile
            .update_position(&ButtonId::from("gone"), Position::new(1, 1))
            .unwrap_err();
        assert_eq!(err, ModelError::StaleButton(ButtonId::from("gone")));
    }

    #[test]
    fn test_duplicate_appends_with_new_id() {
        let mut profile = profile_with(1);
        let source = profile.buttons[0].id.clone();
        let first = profile.duplicate_button(&source).unwrap();
        let second = profile.duplicate_button(&first).unwrap();

        assert_eq!(profile.buttons.len(), 3);
        assert_ne!(first, source);
        assert_ne!(second, first);
        assert_eq!(profile.buttons[1].label, "New Button copy");
        assert_eq!(profile.buttons[2].label, "New Button copy2");
        assert_eq!(profile.buttons[2].position, Position::new(240, 240));
    }

    #[test]
    fn test_remove_button_reports_index() {
        let mut profile = profile_with(3);
        let id = profile.buttons[1].id.clone();
        assert_eq!(profile.remove_button(&id), Ok(1));
        assert_eq!(profile.buttons.len(), 2);
        assert!(profile.button(&id).is_none());
    }

    #[test]
    fn test_set_all_locks() {
        let mut profile = profile_with(3);
        assert!(!profile.all_locked());
        profile.set_all_locks(true);
        assert!(profile.all_locked());
        profile.set_all_locks(false);
        assert!(profile.buttons.iter().all(|b| !b.position_lock));
    }

    #[test]
    fn test_empty_profile_is_never_locked() {
        assert!(!Profile::empty("e.json").all_locked());
    }

    #[test]
    fn test_apply_font_to_all() {
        let mut profile = profile_with(2);
        assert_eq!(profile.apply_font_to_all("  Noto Sans "), Ok(2));
        assert!(profile.buttons.iter().all(|b| b.font_family == "Noto Sans"));
        assert_eq!(profile.apply_font_to_all(" "), Err(ModelError::BlankFontFamily));
    }

    #[test]
    fn test_normalize_repairs_duplicate_ids() {
        let mut profile = profile_with(2);
        profile.buttons[1].id = profile.buttons[0].id.clone();

        assert!(profile.normalize());
        assert_ne!(profile.buttons[0].id, profile.buttons[1].id);
    }
}
