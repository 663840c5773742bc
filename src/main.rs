#![forbid(unsafe_code)]

mod app;
mod color;
mod config;
mod constants;
mod editor;
mod error;
mod event_handler;
mod font;
mod font_discovery;
mod gui;
mod ipc;
mod notify;
mod overlay;
mod shortcut;
mod surface;
mod tray;
mod types;
mod x11_utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{Level as TraceLevel, info};
use tracing_subscriber::FmtSubscriber;

use config::ConfigStore;

/// Draggable on-screen buttons that replay keyboard shortcuts
#[derive(Parser, Debug)]
#[command(name = "touchbutton", version, about)]
struct Args {
    /// Profile directory (default: `config/` next to the executable)
    #[arg(long, value_name = "PATH")]
    config_dir: Option<PathBuf>,

    /// trace, debug, info, warn or error (falls back to $LOG_LEVEL, then info)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Run without X11: no buttons are drawn and shortcuts are only logged
    #[arg(long)]
    headless: bool,

    /// Internal: run the settings editor connected to this socket
    #[arg(long, value_name = "SOCKET", hide = true)]
    editor: Option<PathBuf>,
}

fn parse_level(name: &str) -> TraceLevel {
    match name.to_lowercase().as_str() {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    }
}

fn open_store(config_dir: Option<&Path>) -> Result<ConfigStore> {
    match config_dir {
        Some(dir) => ConfigStore::open(dir)
            .with_context(|| format!("Failed to open profile directory {}", dir.display())),
        None => {
            let exe = std::env::current_exe().context("Failed to resolve executable path")?;
            let base = exe
                .parent()
                .context("Executable path has no parent directory")?;
            ConfigStore::open_in(base)
                .with_context(|| format!("Failed to open profile directory in {}", base.display()))
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = args
        .log_level
        .clone()
        .or_else(|| std::env::var("LOG_LEVEL").ok())
        .unwrap_or_else(|| "info".to_string());
    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Some(socket) = args.editor.as_deref() {
        gui::run_editor(socket)?;
        return Ok(());
    }

    let store = open_store(args.config_dir.as_deref())?;
    info!(path = %store.dir().display(), "Using profile directory");

    if args.headless {
        app::run_headless(store)?;
    } else {
        app::run(store)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_defaults_to_info() {
        assert_eq!(parse_level("DEBUG"), TraceLevel::DEBUG);
        assert_eq!(parse_level("warn"), TraceLevel::WARN);
        assert_eq!(parse_level("bogus"), TraceLevel::INFO);
    }

    #[test]
    fn test_args_parse_editor_mode() {
        let args = Args::parse_from([
            "touchbutton",
            "--editor",
            "/tmp/s.sock",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.editor.as_deref(), Some(Path::new("/tmp/s.sock")));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
        assert!(!args.headless);
    }

    #[test]
    fn test_explicit_config_dir_is_used_as_is() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("profiles");
        let store = open_store(Some(&target)).unwrap();
        assert_eq!(store.dir(), target.as_path());
        assert!(target.is_dir());
    }
}
