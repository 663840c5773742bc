//! Attribute editor for the selected button

use eframe::egui;
use tracing::warn;

use crate::color::HexColor;
use crate::config::ButtonDefinition;
use crate::constants::button::*;
use crate::font_discovery;
use crate::gui::constants::*;
use crate::gui::state::EditorState;
use crate::shortcut::parse_shortcut;

pub struct ButtonSettingsState {
    available_fonts: Vec<String>,
    font_load_error: Option<String>,
    recording_shortcut: bool,
    show_font_confirm: bool,
}

impl ButtonSettingsState {
    pub fn new() -> Self {
        let (available_fonts, font_load_error) = match font_discovery::list_families() {
            Ok(fonts) if !fonts.is_empty() => (fonts, None),
            Ok(_) => (
                vec![DEFAULT_FONT_FAMILY.to_string()],
                Some("No fonts installed".to_string()),
            ),
            Err(e) => {
                warn!(error = ?e, "Failed to load font list from fontconfig");
                (vec![DEFAULT_FONT_FAMILY.to_string()], Some(e.to_string()))
            }
        };

        Self {
            available_fonts,
            font_load_error,
            recording_shortcut: false,
            show_font_confirm: false,
        }
    }
}

impl Default for ButtonSettingsState {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if the selected button changed
pub fn ui(ui: &mut egui::Ui, editor: &mut EditorState, state: &mut ButtonSettingsState) -> bool {
    let mut changed = false;
    let button_count = editor.profile().buttons.len();

    let Some(def) = editor.selected_button_mut() else {
        ui.centered_and_justified(|ui| {
            ui.weak("Select a button or create a new one");
        });
        return false;
    };

    ui.group(|ui| {
        ui.label(egui::RichText::new("Content").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Label:");
            changed |= ui
                .add(egui::TextEdit::multiline(&mut def.label).desired_rows(2).desired_width(240.0))
                .changed();
        });

        changed |= shortcut_row(ui, def, state);
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Geometry").strong());
        ui.add_space(ITEM_SPACING);

        ui.horizontal(|ui| {
            ui.label("Position:");
            ui.label("X:");
            changed |= ui
                .add(egui::DragValue::new(&mut def.position.x).range(0..=MAX_COORDINATE))
                .changed();
            ui.label("Y:");
            changed |= ui
                .add(egui::DragValue::new(&mut def.position.y).range(0..=MAX_COORDINATE))
                .changed();
        });

        ui.horizontal(|ui| {
            ui.label("Size:");
            ui.label("W:");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut def.size.width)
                        .range(MIN_SIZE..=MAX_SIZE)
                        .suffix(" px"),
                )
                .changed();
            ui.label("H:");
            changed |= ui
                .add(
                    egui::DragValue::new(&mut def.size.height)
                        .range(MIN_SIZE..=MAX_SIZE)
                        .suffix(" px"),
                )
                .changed();
        });

        changed |= ui
            .checkbox(&mut def.position_lock, "Lock position")
            .changed();
    });

    ui.add_space(SECTION_SPACING);

    ui.group(|ui| {
        ui.label(egui::RichText::new("Appearance").strong());
        ui.add_space(ITEM_SPACING);

        changed |= color_row(ui, "Background:", &mut def.color);
        changed |= color_row(ui, "Text:", &mut def.text_color);
        changed |= color_row(ui, "Border:", &mut def.border_color);

        ui.horizontal(|ui| {
            ui.label("Opacity:");
            changed |= ui
                .add(
                    egui::Slider::new(&mut def.opacity, MIN_OPACITY..=MAX_OPACITY)
                        .fixed_decimals(2),
                )
                .changed();
        });

        ui.horizontal(|ui| {
            ui.label("Font Size:");
            changed |= ui
                .add(
                    egui::Slider::new(&mut def.font_size, MIN_FONT_SIZE..=MAX_FONT_SIZE)
                        .suffix(" px"),
                )
                .changed();
        });

        ui.horizontal(|ui| {
            ui.label("Font:");

            if let Some(ref error) = state.font_load_error {
                ui.colored_label(egui::Color32::RED, "⚠")
                    .on_hover_text(format!("Failed to load fonts: {}", error));
            }

            egui::ComboBox::from_id_salt("button_font_family")
                .selected_text(&def.font_family)
                .width(200.0)
                .show_ui(ui, |ui| {
                    for family in &state.available_fonts {
                        changed |= ui
                            .selectable_value(&mut def.font_family, family.clone(), family)
                            .changed();
                    }
                });

            if ui
                .add_enabled(button_count > 1, egui::Button::new("Apply to all"))
                .clicked()
            {
                state.show_font_confirm = true;
            }
        });
    });

    if state.show_font_confirm {
        changed |= font_confirm_dialog(ui.ctx(), editor, state, button_count);
    }

    changed
}

fn shortcut_row(
    ui: &mut egui::Ui,
    def: &mut ButtonDefinition,
    state: &mut ButtonSettingsState,
) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        ui.label("Shortcut:");
        changed |= ui
            .add(
                egui::TextEdit::singleline(&mut def.shortcut)
                    .hint_text("ctrl+shift+a")
                    .desired_width(160.0),
            )
            .changed();

        let record_label = if state.recording_shortcut { "⏺ Press keys…" } else { "Record" };
        if ui.selectable_label(state.recording_shortcut, record_label).clicked() {
            state.recording_shortcut = !state.recording_shortcut;
        }
    });

    if state.recording_shortcut {
        let captured = ui.ctx().input(|input| {
            input.events.iter().find_map(|event| match event {
                egui::Event::Key { key, pressed: true, modifiers, .. } => {
                    shortcut_from_key(*modifiers, *key)
                }
                _ => None,
            })
        });
        if let Some(shortcut) = captured {
            def.shortcut = shortcut;
            state.recording_shortcut = false;
            changed = true;
        }
    }

    if !def.shortcut.trim().is_empty() && parse_shortcut(&def.shortcut).is_err() {
        ui.colored_label(STATUS_ERROR, "Unrecognised key name");
    } else if def.shortcut.trim().is_empty() {
        ui.weak("Empty shortcut: the button does nothing");
    }

    changed
}

fn color_row(ui: &mut egui::Ui, label: &str, value: &mut String) -> bool {
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        let text_edit = egui::TextEdit::singleline(value).desired_width(100.0);
        if ui.add(text_edit).changed() {
            changed = true;
        }

        match HexColor::parse(value) {
            Some(color) => {
                let mut rgb = [color.r, color.g, color.b];
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    *value = HexColor::rgb(rgb[0], rgb[1], rgb[2]).to_hex_string();
                    changed = true;
                }
            }
            None => {
                ui.colored_label(STATUS_ERROR, "⚠").on_hover_text("Expected #RRGGBB");
            }
        }
    });
    changed
}

fn font_confirm_dialog(
    ctx: &egui::Context,
    editor: &mut EditorState,
    state: &mut ButtonSettingsState,
    button_count: usize,
) -> bool {
    let mut applied = false;
    let Some(family) = editor.selected_button().map(|b| b.font_family.clone()) else {
        state.show_font_confirm = false;
        return false;
    };

    egui::Window::new("Apply Font")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(format!("Use '{family}' for all {button_count} buttons?"));
            ui.add_space(ITEM_SPACING);

            ui.horizontal(|ui| {
                if ui.button("Apply").clicked() {
                    editor.apply_font_to_all(&family);
                    applied = true;
                    state.show_font_confirm = false;
                }
                if ui.button("Cancel").clicked() {
                    state.show_font_confirm = false;
                }
            });
        });

    applied
}

/// Shortcut string for a key press captured by the editor, if the key can be replayed
pub fn shortcut_from_key(modifiers: egui::Modifiers, key: egui::Key) -> Option<String> {
    use egui::Key;

    let name = match key {
        Key::Space => "space".to_string(),
        Key::Enter => "enter".to_string(),
        Key::Escape => "esc".to_string(),
        Key::Tab => "tab".to_string(),
        Key::Backspace => "backspace".to_string(),
        Key::Delete => "delete".to_string(),
        Key::Insert => "insert".to_string(),
        Key::Home => "home".to_string(),
        Key::End => "end".to_string(),
        Key::PageUp => "pageup".to_string(),
        Key::PageDown => "pagedown".to_string(),
        Key::ArrowUp => "up".to_string(),
        Key::ArrowDown => "down".to_string(),
        Key::ArrowLeft => "left".to_string(),
        Key::ArrowRight => "right".to_string(),
        Key::Minus => "minus".to_string(),
        Key::Equals => "equal".to_string(),
        Key::Comma => "comma".to_string(),
        Key::Period => "period".to_string(),
        Key::Slash => "slash".to_string(),
        Key::Semicolon => "semicolon".to_string(),
        Key::F1 => "f1".to_string(),
        Key::F2 => "f2".to_string(),
        Key::F3 => "f3".to_string(),
        Key::F4 => "f4".to_string(),
        Key::F5 => "f5".to_string(),
        Key::F6 => "f6".to_string(),
        Key::F7 => "f7".to_string(),
        Key::F8 => "f8".to_string(),
        Key::F9 => "f9".to_string(),
        Key::F10 => "f10".to_string(),
        Key::F11 => "f11".to_string(),
        Key::F12 => "f12".to_string(),
        other => {
            let name = other.name();
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii_alphanumeric() => c.to_ascii_lowercase().to_string(),
                _ => return None,
            }
        }
    };

    let mut parts = Vec::new();
    if modifiers.ctrl {
        parts.push("ctrl");
    }
    if modifiers.shift {
        parts.push("shift");
    }
    if modifiers.alt {
        parts.push("alt");
    }
    parts.push(&name);
    let shortcut = parts.join("+");

    parse_shortcut(&shortcut).ok().map(|_| shortcut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::{Key, Modifiers};

    #[test]
    fn test_shortcut_from_letter_with_modifiers() {
        let modifiers = Modifiers {
            ctrl: true,
            shift: true,
            ..Default::default()
        };
        assert_eq!(shortcut_from_key(modifiers, Key::A).as_deref(), Some("ctrl+shift+a"));
    }

    #[test]
    fn test_shortcut_from_named_keys() {
        let alt = Modifiers {
            alt: true,
            ..Default::default()
        };
        assert_eq!(shortcut_from_key(alt, Key::F4).as_deref(), Some("alt+f4"));
        assert_eq!(shortcut_from_key(Modifiers::default(), Key::Space).as_deref(), Some("space"));
        assert_eq!(
            shortcut_from_key(Modifiers::default(), Key::ArrowLeft).as_deref(),
            Some("left")
        );
    }

    #[test]
    fn test_shortcut_from_digit() {
        assert_eq!(shortcut_from_key(Modifiers::default(), Key::Num7).as_deref(), Some("7"));
    }

    #[test]
    fn test_unreplayable_key_is_ignored() {
        assert_eq!(shortcut_from_key(Modifiers::default(), Key::F20), None);
    }
}
