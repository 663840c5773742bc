//! Overlay main loop: X11 events, tray commands, editor messages and signals
//!
//! Everything that touches the profile happens on this thread. The tray and the
//! editor reader run on their own threads and only send messages here.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use x11rb::connection::Connection;

use crate::config::ConfigStore;
use crate::constants::interaction::IDLE_POLL_MS;
use crate::editor::{EditorEvent, ProcessEditor, SettingsEditor};
use crate::event_handler::handle_event;
use crate::notify::{DesktopNotifier, LogNotifier};
use crate::overlay::{NullSurfaceFactory, OverlayManager, SurfaceFactory};
use crate::shortcut::{self, LogInvoker, ShortcutInvoker};
use crate::surface::X11SurfaceFactory;
use crate::tray::{self, TrayCommand, TrayHandle, TrayState};
use crate::types::ScreenArea;
use crate::x11_utils::{AppContext, CachedAtoms};

/// Screen assumed by the headless manager
const HEADLESS_AREA: ScreenArea = ScreenArea::new(1920, 1080);

/// Profiles can appear or vanish on disk while the editor runs
const TRAY_REFRESH_MS: u64 = 1000;

struct Inputs {
    tray_rx: Receiver<TrayCommand>,
    editor_rx: Receiver<EditorEvent>,
    shutdown: Arc<AtomicBool>,
}

/// Run the overlay on the X server until Exit or a termination signal
pub fn run(store: ConfigStore) -> Result<()> {
    let (conn, screen_num) = x11rb::connect(None).context("Failed to connect to X server")?;
    let screen = &conn.setup().roots[screen_num];
    info!(
        screen = screen_num,
        width = screen.width_in_pixels,
        height = screen.height_in_pixels,
        "Connected to X11"
    );

    // Pre-cache atoms once at startup (eliminates roundtrip overhead)
    let atoms = CachedAtoms::new(&conn)?;
    let ctx = AppContext {
        conn: &conn,
        screen,
        atoms: &atoms,
    };

    let (editor, inputs, tray_tx) = setup_inputs()?;
    let notifier = DesktopNotifier::spawn().context("Failed to start notification thread")?;
    let mut manager = OverlayManager::new(
        store,
        X11SurfaceFactory::new(ctx),
        shortcut::default_invoker(),
        Box::new(notifier),
        editor,
    );
    manager.start();
    let tray = spawn_tray(&manager, tray_tx)?;

    run_loop(&mut manager, &inputs, tray, |manager, now| {
        let mut handled = false;
        while let Some(event) = conn.poll_for_event().context("X11 connection lost")? {
            handle_event(manager, event, now);
            handled = true;
        }
        Ok(handled)
    })
}

/// Run the manager with no windows; shortcuts are only logged
pub fn run_headless(store: ConfigStore) -> Result<()> {
    info!("Running headless: no buttons are drawn");
    let (editor, inputs, tray_tx) = setup_inputs()?;
    let invoker: Box<dyn ShortcutInvoker> = Box::new(LogInvoker);
    let mut manager = OverlayManager::new(
        store,
        NullSurfaceFactory::new(HEADLESS_AREA),
        invoker,
        Box::new(LogNotifier),
        editor,
    );
    manager.start();
    let tray = spawn_tray(&manager, tray_tx)?;

    run_loop(&mut manager, &inputs, tray, |_, _| Ok(false))
}

fn setup_inputs() -> Result<(Box<dyn SettingsEditor>, Inputs, Sender<TrayCommand>)> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        signal_hook::flag::register(signal, Arc::clone(&shutdown))
            .context(format!("Failed to register handler for signal {signal}"))?;
    }

    let (editor_tx, editor_rx) = mpsc::channel();
    let editor = ProcessEditor::new(editor_tx)?;
    let (tray_tx, tray_rx) = mpsc::channel();

    let inputs = Inputs {
        tray_rx,
        editor_rx,
        shutdown,
    };
    Ok((Box::new(editor), inputs, tray_tx))
}

fn spawn_tray<F: SurfaceFactory>(
    manager: &OverlayManager<F>,
    commands: Sender<TrayCommand>,
) -> Result<TrayHandle> {
    tray::spawn(tray_state(manager), commands)
}

fn run_loop<F, P>(
    manager: &mut OverlayManager<F>,
    inputs: &Inputs,
    mut tray: TrayHandle,
    mut poll_events: P,
) -> Result<()>
where
    F: SurfaceFactory,
    P: FnMut(&mut OverlayManager<F>, Instant) -> Result<bool>,
{
    info!("Overlay running");
    let mut last_tray_refresh = Instant::now();
    let result = loop {
        if inputs.shutdown.load(Ordering::SeqCst) {
            info!("Termination signal received");
            break Ok(());
        }

        let now = Instant::now();
        let busy = match poll_events(manager, now) {
            Ok(busy) => busy,
            Err(e) => break Err(e),
        };

        let mut exit = false;
        let mut changed = false;
        for command in inputs.tray_rx.try_iter() {
            changed = true;
            if !apply_tray_command(manager, command) {
                exit = true;
            }
        }
        for event in inputs.editor_rx.try_iter() {
            changed = true;
            manager.editor_event(event);
        }
        if exit {
            info!("Exit requested from tray");
            break Ok(());
        }

        manager.tick(Instant::now());
        if changed || last_tray_refresh.elapsed() >= Duration::from_millis(TRAY_REFRESH_MS) {
            tray.update(tray_state(manager));
            last_tray_refresh = Instant::now();
        }

        if !busy {
            thread::sleep(Duration::from_millis(IDLE_POLL_MS));
        }
    };

    manager.shutdown();
    result
}

/// Carry out one tray action; false means the user asked to exit
pub fn apply_tray_command<F: SurfaceFactory>(
    manager: &mut OverlayManager<F>,
    command: TrayCommand,
) -> bool {
    debug!(?command, "Applying tray command");
    match command {
        TrayCommand::SwitchProfile(filename) => manager.switch_profile(&filename),
        TrayCommand::NewProfile => manager.new_profile(),
        TrayCommand::ManageButtons => manager.open_editor(),
        TrayCommand::SetLocked(locked) => manager.toggle_all_locks(locked),
        TrayCommand::Exit => return false,
    }
    true
}

fn tray_state<F: SurfaceFactory>(manager: &OverlayManager<F>) -> TrayState {
    TrayState {
        profiles: manager.list_profiles(),
        active: manager.active_filename().to_string(),
        locked: manager.all_locked(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Profile;
    use crate::editor::testing::ScriptedEditor;
    use crate::notify::testing::RecordingNotifier;
    use crate::shortcut::testing::RecordingInvoker;
    use tempfile::TempDir;

    fn manager_with(buttons: usize) -> (TempDir, OverlayManager<NullSurfaceFactory>) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::open(dir.path()).unwrap();
        let mut profile = Profile::empty("default.json");
        for _ in 0..buttons {
            profile.add_button();
        }
        store.save_profile("default.json", &profile).unwrap();
        store.save_profile("other.json", &Profile::empty("other.json")).unwrap();

        let mut manager = OverlayManager::new(
            store,
            NullSurfaceFactory::new(HEADLESS_AREA),
            Box::new(RecordingInvoker::default()),
            Box::new(RecordingNotifier::default()),
            Box::new(ScriptedEditor::default()),
        );
        manager.start();
        (dir, manager)
    }

    #[test]
    fn test_exit_command_stops_loop() {
        let (_dir, mut manager) = manager_with(1);
        assert!(!apply_tray_command(&mut manager, TrayCommand::Exit));
    }

    #[test]
    fn test_lock_command_updates_tray_state() {
        let (_dir, mut manager) = manager_with(2);
        assert!(apply_tray_command(&mut manager, TrayCommand::SetLocked(true)));
        let state = tray_state(&manager);
        assert!(state.locked);
        assert_eq!(state.active, "default.json");
        assert_eq!(
            state.profiles,
            vec!["default.json".to_string(), "other.json".to_string()]
        );
    }

    #[test]
    fn test_switch_and_manage_commands() {
        let (_dir, mut manager) = manager_with(1);
        apply_tray_command(&mut manager, TrayCommand::SwitchProfile("other.json".to_string()));
        assert_eq!(manager.active_filename(), "other.json");
        assert!(manager.buttons().is_empty());

        apply_tray_command(&mut manager, TrayCommand::ManageButtons);
        assert!(manager.is_editing());
    }
}
