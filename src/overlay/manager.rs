//! Owns the active profile and its live buttons
//!
//! Everything here runs on the main loop thread. Buttons report through an
//! mpsc channel that is drained right after each pointer event is dispatched;
//! dragged positions are saved through a single-slot debounce driven by [`OverlayManager::tick`].

use std::fmt::Display;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::button::{ButtonEvent, ButtonSurface, OverlayButton, PointerEvent, SurfaceFactory};
use super::debounce::Debouncer;
use crate::config::{ButtonDefinition, ButtonId, ConfigStore, Profile};
use crate::constants::interaction;
use crate::editor::{EditorEvent, SettingsEditor};
use crate::error::StoreError;
use crate::notify::Notifier;
use crate::shortcut::ShortcutInvoker;
use crate::types::Position;

pub struct OverlayManager<F: SurfaceFactory> {
    store: ConfigStore,
    factory: F,
    invoker: Box<dyn ShortcutInvoker>,
    notifier: Box<dyn Notifier>,
    editor: Box<dyn SettingsEditor>,

    profile: Profile,
    buttons: Vec<OverlayButton<F::Surface>>,
    events_tx: Sender<ButtonEvent>,
    events_rx: Receiver<ButtonEvent>,
    save: Debouncer,
    /// Pre-edit snapshot while an editor session is open
    session: Option<Profile>,
    /// Active file failed to load; left untouched until the editor commits over it
    unreadable: bool,
}

impl<F: SurfaceFactory> OverlayManager<F> {
    pub fn new(
        store: ConfigStore,
        factory: F,
        invoker: Box<dyn ShortcutInvoker>,
        notifier: Box<dyn Notifier>,
        editor: Box<dyn SettingsEditor>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            store,
            factory,
            invoker,
            notifier,
            editor,
            profile: Profile::default(),
            buttons: Vec::new(),
            events_tx,
            events_rx,
            save: Debouncer::new(Duration::from_millis(interaction::SAVE_DEBOUNCE_MS)),
            session: None,
            unreadable: false,
        }
    }

    /// Load the last-used profile and show its buttons
    pub fn start(&mut self) {
        let filename = self.store.load_last_used();
        info!(file = %filename, "Starting with profile");
        let profile = self.load_or_create(&filename);
        self.activate_profile(profile);
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn active_filename(&self) -> &str {
        &self.profile.filename
    }

    pub fn buttons(&self) -> &[OverlayButton<F::Surface>] {
        &self.buttons
    }

    pub fn list_profiles(&self) -> Vec<String> {
        self.store.list_profiles()
    }

    pub fn all_locked(&self) -> bool {
        self.profile.all_locked()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_pending_save(&self) -> bool {
        self.save.is_pending()
    }

    /// Replace every live button with one per definition in `profile`
    pub fn activate_profile(&mut self, profile: Profile) {
        self.buttons.clear();
        let stale = self.events_rx.try_iter().count();
        if stale > 0 {
            debug!(count = stale, "Discarded events from previous buttons");
        }

        for definition in &profile.buttons {
            match self.create_button(definition) {
                Ok(button) => self.buttons.push(button),
                Err(e) => {
                    error!(
                        id = %definition.id,
                        label = %definition.label,
                        error = %format!("{e:#}"),
                        "Failed to create button"
                    );
                    self.notifier
                        .error(&format!("Could not show button '{}': {e}", definition.label));
                }
            }
        }

        info!(file = %profile.filename, buttons = self.buttons.len(), "Activated profile");
        self.profile = profile;
    }

    fn create_button(
        &mut self,
        definition: &ButtonDefinition,
    ) -> anyhow::Result<OverlayButton<F::Surface>> {
        let mut surface = self.factory.create(definition)?;
        surface.make_non_activating()?;
        surface.apply_style(definition)?;
        Ok(OverlayButton::new(definition, surface, self.events_tx.clone()))
    }

    /// Route a pointer event to the button owning `handle`
    /// Returns false when no live button owns it.
    pub fn handle_pointer(
        &mut self,
        handle: <F::Surface as ButtonSurface>::Handle,
        event: PointerEvent,
        now: Instant,
    ) -> bool {
        let Some(button) = self.buttons.iter_mut().find(|b| b.surface().handle() == handle) else {
            return false;
        };
        if let Err(e) = button.handle_pointer(event) {
            warn!(id = %button.id(), error = %format!("{e:#}"), "Pointer handling failed");
        }
        self.process_button_events(now);
        true
    }

    /// Redraw the button owning `handle`
    pub fn repaint(&mut self, handle: <F::Surface as ButtonSurface>::Handle) {
        if let Some(button) = self.buttons.iter_mut().find(|b| b.surface().handle() == handle)
            && let Err(e) = button.surface_mut().repaint()
        {
            warn!(id = %button.id(), error = %format!("{e:#}"), "Repaint failed");
        }
    }

    pub fn process_button_events(&mut self, now: Instant) {
        let events: Vec<ButtonEvent> = self.events_rx.try_iter().collect();
        for event in events {
            match event {
                ButtonEvent::PositionChanged { id, position } => {
                    self.on_position_changed(&id, position, now)
                }
                ButtonEvent::Activated(id) => self.on_activated(&id),
            }
        }
    }

    pub fn on_position_changed(&mut self, id: &ButtonId, position: Position, now: Instant) {
        if let Err(e) = self.profile.update_position(id, position) {
            debug!(error = %e, "Ignoring position for replaced button");
            return;
        }
        if self.session.is_some() {
            debug!(id = %id, "Editor open, position kept in memory only");
            return;
        }
        self.save.schedule(now);
    }

    pub fn on_activated(&mut self, id: &ButtonId) {
        let Some(button) = self.profile.button(id) else {
            debug!(id = %id, "Ignoring activation for replaced button");
            return;
        };
        if button.shortcut.trim().is_empty() {
            debug!(id = %id, label = %button.label, "Button has no shortcut");
            return;
        }

        let shortcut = button.shortcut.clone();
        let label = button.label.clone();
        match self.invoker.send(&shortcut) {
            Ok(()) => debug!(id = %id, shortcut = %shortcut, "Shortcut sent"),
            Err(e) => {
                warn!(id = %id, shortcut = %shortcut, error = %e, "Shortcut failed");
                self.notifier.error(&format!("{label}: {e}"));
            }
        }
    }

    /// Make `filename` the active profile, creating it if missing
    pub fn switch_profile(&mut self, filename: &str) {
        let filename = match ConfigStore::normalize_filename(filename) {
            Ok(f) => f,
            Err(e) => return self.report("Cannot switch profile", &e),
        };
        if filename == self.profile.filename {
            debug!(file = %filename, "Profile already active");
            return;
        }
        if self.session.is_some() {
            self.notifier.info("Close the button editor before switching profiles");
            return;
        }

        self.flush_pending();
        self.store.save_last_used(&filename);
        let profile = self.load_or_create(&filename);
        self.activate_profile(profile);
        info!(file = %filename, "Switched profile");
    }

    fn load_or_create(&mut self, filename: &str) -> Profile {
        self.unreadable = false;
        match self.store.load_profile(filename) {
            Ok(profile) => profile,
            Err(StoreError::NotFound(_)) => {
                info!(file = %filename, "Profile missing, creating it");
                let profile = Profile::empty(filename);
                if let Err(e) = self.store.save_profile(filename, &profile) {
                    self.report("Could not create profile", &e);
                }
                profile
            }
            Err(e) => {
                self.report("Could not load profile", &e);
                self.unreadable = true;
                Profile::empty(filename)
            }
        }
    }

    pub fn toggle_all_locks(&mut self, locked: bool) {
        if self.session.is_some() {
            self.notifier.info("Close the button editor before changing locks");
            return;
        }
        self.profile.set_all_locks(locked);
        for button in &mut self.buttons {
            button.set_locked(locked);
        }
        self.save.cancel();
        self.persist_active();
        info!(locked, buttons = self.buttons.len(), "Updated position locks");
        self.notifier.info(if locked {
            "All positions locked"
        } else {
            "All positions unlocked"
        });
    }

    pub fn open_editor(&mut self) {
        if self.session.is_some() {
            self.notifier.info("The button editor is already open");
            return;
        }
        self.flush_pending();

        let snapshot = self.profile.clone();
        match self.editor.open(self.store.dir(), &snapshot) {
            Ok(()) => {
                info!(file = %snapshot.filename, "Editor session opened");
                self.session = Some(snapshot);
            }
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to open editor");
                self.notifier.error(&format!("Could not open the button editor: {e}"));
            }
        }
    }

    pub fn editor_event(&mut self, event: EditorEvent) {
        if self.session.is_none() {
            warn!(event = ?event, "Editor event without an open session");
            return;
        }
        match event {
            EditorEvent::LiveApply(profile) => self.live_apply(profile),
            EditorEvent::Commit { filename, profile } => self.commit_edit(&filename, profile),
            EditorEvent::Cancel => self.cancel_edit(),
        }
    }

    /// Preview `profile` on screen without touching storage
    pub fn live_apply(&mut self, mut profile: Profile) {
        if self.session.is_none() {
            warn!("Live apply without an open session");
            return;
        }
        self.save.cancel();
        profile.filename = self.profile.filename.clone();
        profile.normalize();
        self.activate_profile(profile);
        debug!("Applied editor preview");
    }

    pub fn commit_edit(&mut self, filename: &str, mut profile: Profile) {
        let Some(snapshot) = self.session.take() else {
            warn!("Commit without an open session");
            return;
        };
        self.editor.close();
        self.save.cancel();

        let filename = match ConfigStore::normalize_filename(filename) {
            Ok(f) => f,
            Err(e) => {
                self.report("Changes not saved", &e);
                self.activate_profile(snapshot);
                return;
            }
        };

        profile.filename = filename.clone();
        profile.normalize();
        self.unreadable = false;
        match self.store.save_profile(&filename, &profile) {
            Ok(()) => self.notifier.info(&format!("Saved {filename}")),
            Err(e) => self.report("Could not save profile", &e),
        }
        self.store.save_last_used(&filename);
        self.activate_profile(profile);
        info!(file = %filename, "Editor changes committed");
    }

    /// Restore the pre-edit profile exactly
    pub fn cancel_edit(&mut self) {
        let Some(snapshot) = self.session.take() else {
            warn!("Cancel without an open session");
            return;
        };
        self.editor.close();
        self.save.cancel();
        self.activate_profile(snapshot);
        info!("Editor changes discarded");
    }

    /// Create a uniquely named empty profile, switch to it and edit it
    pub fn new_profile(&mut self) {
        if self.session.is_some() {
            self.notifier.info("The button editor is already open");
            return;
        }
        let filename = self.store.new_profile_name();
        if let Err(e) = self.store.create_profile(&filename) {
            return self.report("Could not create profile", &e);
        }
        info!(file = %filename, "Created profile");
        self.notifier.info(&format!("Created {filename}"));
        self.switch_profile(&filename);
        self.open_editor();
    }

    /// Fire the debounced save once its deadline has passed
    pub fn tick(&mut self, now: Instant) {
        if self.save.poll(now) {
            self.persist_active();
        }
    }

    /// Write a pending debounced save immediately
    pub fn flush_pending(&mut self) {
        if self.save.cancel() {
            self.persist_active();
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(snapshot) = self.session.take() {
            info!("Closing editor session without saving");
            self.editor.close();
            self.save.cancel();
            self.profile = snapshot;
        }
        self.flush_pending();
        self.store.save_last_used(&self.profile.filename);
        self.buttons.clear();
        info!(file = %self.profile.filename, "Overlay shut down");
    }

    fn persist_active(&mut self) {
        if self.unreadable {
            warn!(file = %self.profile.filename, "Profile could not be read, not overwriting it");
            self.notifier.info(&format!(
                "{} could not be read; changes are kept until it is saved from the button editor",
                self.profile.filename
            ));
            return;
        }
        if let Err(e) = self.store.save_profile(&self.profile.filename, &self.profile) {
            self.report("Could not save profile", &e);
        }
    }

    fn report(&mut self, what: &str, err: &dyn Display) {
        error!(file = %self.profile.filename, error = %err, "{what}");
        self.notifier.error(&format!("{what}: {err}"));
    }
}
