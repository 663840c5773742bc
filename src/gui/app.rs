//! The settings window (eframe app) running in the editor child process

use eframe::egui;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::gui::components::button_list::ButtonList;
use crate::gui::components::button_settings::{self, ButtonSettingsState};
use crate::gui::components::profile_selector::ProfileSelector;
use crate::gui::constants::*;
use crate::gui::state::{EditorState, Status};
use crate::ipc::{EditorConnection, EditorMessage};

pub struct EditorApp {
    state: EditorState,
    conn: EditorConnection,
    overlay_gone: Arc<AtomicBool>,
    button_list: ButtonList,
    profile_selector: ProfileSelector,
    settings: ButtonSettingsState,
    dirty: bool,
    finished: bool,
}

impl EditorApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        state: EditorState,
        conn: EditorConnection,
        watch: EditorConnection,
    ) -> Self {
        let overlay_gone = Arc::new(AtomicBool::new(false));
        spawn_watcher(watch, cc.egui_ctx.clone(), overlay_gone.clone());

        Self {
            state,
            conn,
            overlay_gone,
            button_list: ButtonList::new(),
            profile_selector: ProfileSelector::new(),
            settings: ButtonSettingsState::new(),
            dirty: false,
            finished: false,
        }
    }

    fn send(&mut self, msg: &EditorMessage) -> bool {
        match self.conn.send(msg) {
            Ok(()) => true,
            Err(e) => {
                error!(error = %format!("{e:#}"), "Failed to reach overlay");
                self.state
                    .set_status(Status::Error(format!("Overlay not reachable: {e}")));
                false
            }
        }
    }

    fn refresh(&mut self) {
        let snapshot = self.state.live_snapshot();
        let count = snapshot.buttons.len();
        if self.send(&EditorMessage::LiveApply(snapshot)) {
            debug!(buttons = count, "Sent live preview");
            self.state
                .set_status(Status::Info("Preview applied (not saved yet)".to_string()));
        }
    }

    fn save(&mut self, ctx: &egui::Context) {
        let (filename, profile) = self.state.commit();
        info!(file = %filename, buttons = profile.buttons.len(), "Saving from editor");
        if self.send(&EditorMessage::Commit { filename, profile }) {
            self.finished = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }

    fn cancel(&mut self, ctx: &egui::Context) {
        info!("Editor cancelled");
        self.send(&EditorMessage::Cancel);
        self.finished = true;
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    fn status_ui(&self, ui: &mut egui::Ui) {
        match self.state.status() {
            Some(Status::Info(text)) => {
                ui.colored_label(STATUS_OK, text);
            }
            Some(Status::Error(text)) => {
                ui.colored_label(STATUS_ERROR, text);
            }
            None if self.dirty => {
                ui.weak("Unsaved changes");
            }
            None => {}
        }
    }
}

impl eframe::App for EditorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.overlay_gone.load(Ordering::SeqCst) && !self.finished {
            warn!("Overlay connection closed, exiting editor");
            self.finished = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::TopBottomPanel::top("profile_panel").show(ctx, |ui| {
            ui.add_space(ITEM_SPACING);
            let action = self.profile_selector.ui(ui, &mut self.state);
            if action.replaced_profile() {
                self.dirty = true;
            }
            ui.add_space(ITEM_SPACING);
        });

        egui::TopBottomPanel::bottom("action_panel").show(ctx, |ui| {
            ui.add_space(ITEM_SPACING);
            self.status_ui(ui);
            ui.add_space(ITEM_SPACING);
            ui.horizontal(|ui| {
                if ui
                    .button("🔄 Refresh")
                    .on_hover_text("Show the changes on screen without saving")
                    .clicked()
                {
                    self.refresh();
                }
                if ui.button("💾 Save").clicked() {
                    self.save(ctx);
                }
                if ui.button("Cancel").clicked() {
                    self.cancel(ctx);
                }
            });
            ui.add_space(ITEM_SPACING);
        });

        egui::SidePanel::left("button_list")
            .resizable(false)
            .exact_width(LIST_WIDTH)
            .show(ctx, |ui| {
                ui.add_space(ITEM_SPACING);
                if self.button_list.ui(ui, &mut self.state) {
                    self.dirty = true;
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                if button_settings::ui(ui, &mut self.state, &mut self.settings) {
                    self.dirty = true;
                }
            });
        });

        ctx.request_repaint_after(Duration::from_millis(CONNECTION_CHECK_INTERVAL_MS));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // Closing the window without Save discards the session
        if !self.finished && !self.overlay_gone.load(Ordering::SeqCst) {
            let _ = self.conn.send(&EditorMessage::Cancel);
        }
        info!("Editor exiting");
    }
}

/// Block on the overlay side of the socket; EOF means the overlay went away
fn spawn_watcher(mut watch: EditorConnection, ctx: egui::Context, gone: Arc<AtomicBool>) {
    thread::spawn(move || {
        loop {
            match watch.recv::<serde_json::Value>() {
                Ok(msg) => debug!(?msg, "Ignoring unexpected message from overlay"),
                Err(e) => {
                    debug!(error = %format!("{e:#}"), "Overlay connection ended");
                    break;
                }
            }
        }
        gone.store(true, Ordering::SeqCst);
        ctx.request_repaint();
    });
}
