//! Left-hand list of the profile's buttons with add/duplicate/delete

use eframe::egui;

use crate::gui::constants::*;
use crate::gui::state::EditorState;

pub struct ButtonList {
    show_delete_confirm: bool,
}

impl ButtonList {
    pub fn new() -> Self {
        Self {
            show_delete_confirm: false,
        }
    }

    /// Returns true if the profile changed
    pub fn ui(&mut self, ui: &mut egui::Ui, state: &mut EditorState) -> bool {
        let mut changed = false;

        ui.label(egui::RichText::new("Buttons").strong());
        ui.add_space(ITEM_SPACING);

        let mut clicked = None;
        egui::ScrollArea::vertical()
            .max_height(ui.available_height() - 80.0)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                if state.profile().is_empty() {
                    ui.weak("No buttons yet");
                }
                for button in &state.profile().buttons {
                    let selected = state.selected() == Some(&button.id);
                    let text = button.label.replace('\n', " ");
                    let text = if text.trim().is_empty() { "(no label)".to_string() } else { text };
                    if ui.selectable_label(selected, text).clicked() {
                        clicked = Some(button.id.clone());
                    }
                }
            });
        if let Some(id) = clicked {
            state.select(id);
        }

        ui.add_space(ITEM_SPACING);
        ui.horizontal(|ui| {
            if ui.button("➕ New").clicked() {
                state.add_button();
                changed = true;
            }
            if ui
                .add_enabled(state.selected().is_some(), egui::Button::new("📋 Duplicate"))
                .clicked()
                && state.duplicate_selected().is_some()
            {
                changed = true;
            }
        });
        if ui
            .add_enabled(state.selected().is_some(), egui::Button::new("🗑 Delete"))
            .clicked()
        {
            self.show_delete_confirm = true;
        }

        if self.show_delete_confirm {
            changed |= self.delete_confirm_dialog(ui.ctx(), state);
        }

        changed
    }

    fn delete_confirm_dialog(&mut self, ctx: &egui::Context, state: &mut EditorState) -> bool {
        let mut deleted = false;
        let Some(label) = state.selected_button().map(|b| b.label.clone()) else {
            self.show_delete_confirm = false;
            return false;
        };

        egui::Window::new("Confirm Delete")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Delete button '{label}'?"));
                ui.colored_label(DANGER, "This cannot be undone!");

                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        deleted = state.delete_selected().is_some();
                        self.show_delete_confirm = false;
                    }
                    if ui.button("Cancel").clicked() {
                        self.show_delete_confirm = false;
                    }
                });
            });

        deleted
    }
}

impl Default for ButtonList {
    fn default() -> Self {
        Self::new()
    }
}
