//! GUI-specific constants for layout, status colors and intervals

use egui;

/// Editor window dimensions
pub const WINDOW_WIDTH: f32 = 720.0;
pub const WINDOW_HEIGHT: f32 = 640.0;
pub const WINDOW_MIN_WIDTH: f32 = 560.0;
pub const WINDOW_MIN_HEIGHT: f32 = 480.0;

/// Width of the button list on the left
pub const LIST_WIDTH: f32 = 200.0;

/// Layout spacing
pub const SECTION_SPACING: f32 = 15.0;
pub const ITEM_SPACING: f32 = 8.0;

/// Status colors
pub const STATUS_OK: egui::Color32 = egui::Color32::from_rgb(0, 200, 0);
pub const STATUS_ERROR: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);
pub const DANGER: egui::Color32 = egui::Color32::from_rgb(200, 0, 0);

/// Upper bound on button positions offered by the drag values
pub const MAX_COORDINATE: i32 = 10_000;

/// Check for a closed overlay connection at least this often
pub const CONNECTION_CHECK_INTERVAL_MS: u64 = 250;
