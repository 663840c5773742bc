use eframe::egui;

use crate::gui::constants::*;
use crate::gui::state::EditorState;

pub struct ProfileSelector {
    edit_profile_name: String,
    show_new_dialog: bool,
    show_copy_dialog: bool,
    show_delete_confirm: bool,
}

impl ProfileSelector {
    pub fn new() -> Self {
        Self {
            edit_profile_name: String::new(),
            show_new_dialog: false,
            show_copy_dialog: false,
            show_delete_confirm: false,
        }
    }

    pub fn ui(&mut self, ui: &mut egui::Ui, state: &mut EditorState) -> ProfileAction {
        let mut action = ProfileAction::None;

        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Profile:").strong());

                let mut chosen = None;
                egui::ComboBox::from_id_salt("profile_selector")
                    .selected_text(state.filename())
                    .show_ui(ui, |ui| {
                        for filename in state.profiles() {
                            let selected = filename == state.filename();
                            if ui.selectable_label(selected, filename).clicked() && !selected {
                                chosen = Some(filename.clone());
                            }
                        }
                    });
                if let Some(filename) = chosen
                    && state.switch_file(&filename).is_ok()
                {
                    action = ProfileAction::SwitchProfile;
                }

                ui.add_space(ITEM_SPACING);

                if ui.button("➕ New").clicked() {
                    self.show_new_dialog = true;
                    self.edit_profile_name.clear();
                }

                if ui.button("📋 Copy").clicked() {
                    self.show_copy_dialog = true;
                    let stem = state.filename().trim_end_matches(".json");
                    self.edit_profile_name = format!("{stem}_copy");
                }

                let can_delete = state.profiles().len() > 1;
                if ui
                    .add_enabled(can_delete, egui::Button::new("🗑 Delete"))
                    .on_disabled_hover_text("Cannot delete the last profile")
                    .clicked()
                {
                    state.refresh_profiles();
                    self.show_delete_confirm = true;
                }
            });
        });

        // Modal dialogs
        if self.show_new_dialog {
            action = action.or(self.new_profile_dialog(ui.ctx(), state));
        }

        if self.show_copy_dialog {
            action = action.or(self.copy_profile_dialog(ui.ctx(), state));
        }

        if self.show_delete_confirm {
            action = action.or(self.delete_confirm_dialog(ui.ctx(), state));
        }

        action
    }

    fn new_profile_dialog(
        &mut self,
        ctx: &egui::Context,
        state: &mut EditorState,
    ) -> ProfileAction {
        let mut action = ProfileAction::None;

        egui::Window::new("New Profile")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Profile Name:");
                ui.text_edit_singleline(&mut self.edit_profile_name);

                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    if ui.button("Create").clicked()
                        && !self.edit_profile_name.trim().is_empty()
                        && state.create_profile(&self.edit_profile_name).is_ok()
                    {
                        action = ProfileAction::ProfileCreated;
                        self.show_new_dialog = false;
                    }

                    if ui.button("Cancel").clicked() {
                        self.show_new_dialog = false;
                    }
                });
            });

        action
    }

    fn copy_profile_dialog(
        &mut self,
        ctx: &egui::Context,
        state: &mut EditorState,
    ) -> ProfileAction {
        let mut action = ProfileAction::None;

        egui::Window::new("Copy Profile")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(format!("Copy '{}' to:", state.filename()));
                ui.text_edit_singleline(&mut self.edit_profile_name);
                ui.label(
                    egui::RichText::new("The saved file is copied; unsaved edits are not.")
                        .small()
                        .weak(),
                );

                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    if ui.button("Copy").clicked()
                        && !self.edit_profile_name.trim().is_empty()
                        && state.copy_profile(&self.edit_profile_name).is_ok()
                    {
                        action = ProfileAction::ProfileCreated;
                        self.show_copy_dialog = false;
                    }

                    if ui.button("Cancel").clicked() {
                        self.show_copy_dialog = false;
                    }
                });
            });

        action
    }

    fn delete_confirm_dialog(
        &mut self,
        ctx: &egui::Context,
        state: &mut EditorState,
    ) -> ProfileAction {
        let mut action = ProfileAction::None;

        egui::Window::new("Confirm Delete")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(format!("Delete profile '{}'?", state.filename()));
                ui.colored_label(DANGER, "This cannot be undone!");

                ui.add_space(ITEM_SPACING);

                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        if state.delete_profile().is_ok() {
                            action = ProfileAction::ProfileDeleted;
                        }
                        self.show_delete_confirm = false;
                    }

                    if ui.button("Cancel").clicked() {
                        self.show_delete_confirm = false;
                    }
                });
            });

        action
    }
}

impl Default for ProfileSelector {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProfileAction {
    None,
    SwitchProfile,
    ProfileCreated,
    ProfileDeleted,
}

impl ProfileAction {
    fn or(self, other: ProfileAction) -> ProfileAction {
        match self {
            ProfileAction::None => other,
            action => action,
        }
    }

    /// The edited profile was replaced by a different file
    pub fn replaced_profile(self) -> bool {
        self != ProfileAction::None
    }
}
