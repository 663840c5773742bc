//! egui settings editor, run as `touchbutton --editor <socket>`

use anyhow::{Context, Result, anyhow};
use eframe::{NativeOptions, egui};
use std::path::Path;
use tracing::info;

use crate::config::ConfigStore;
use crate::ipc::{EditorConnection, EditorRequest};

mod app;
pub mod components;
pub mod constants;
pub mod state;

use app::EditorApp;
use constants::*;
use state::EditorState;

pub fn run_editor(socket: &Path) -> Result<()> {
    let mut conn = EditorConnection::connect_to(socket)?;
    let EditorRequest::Init {
        dir,
        filename,
        profile,
    } = conn
        .recv()
        .context("Failed to receive profile from overlay")?;
    info!(
        dir = %dir.display(),
        file = %filename,
        buttons = profile.buttons.len(),
        "Editor session started"
    );

    let store = ConfigStore::open(&dir)
        .with_context(|| format!("Failed to open profile directory {}", dir.display()))?;
    let state = EditorState::new(store, filename, profile);
    let watch = conn.try_clone()?;

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([WINDOW_WIDTH, WINDOW_HEIGHT])
            .with_min_inner_size([WINDOW_MIN_WIDTH, WINDOW_MIN_HEIGHT])
            .with_title("TouchButton Settings"),
        ..Default::default()
    };

    eframe::run_native(
        "TouchButton Settings",
        options,
        Box::new(|cc| Ok(Box::new(EditorApp::new(cc, state, conn, watch)))),
    )
    .map_err(|err| anyhow!("Failed to launch settings window: {err}"))
}
