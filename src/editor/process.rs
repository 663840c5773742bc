//! Editor running as a child process (`touchbutton --editor <socket>`)
//!
//! A reader thread owns the child and the socket: it waits for the child to
//! connect, sends the initial profile, then forwards every message to the main
//! loop. A connection that ends without Commit or Cancel is reported as Cancel.

use anyhow::{Context, Result};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::{EditorEvent, SettingsEditor};
use crate::config::Profile;
use crate::ipc::{EditorConnection, EditorMessage, EditorRequest, EditorServer};

const ACCEPT_POLL: Duration = Duration::from_millis(50);

struct Session {
    pid: Pid,
    closed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

pub struct ProcessEditor {
    exe: PathBuf,
    events: Sender<EditorEvent>,
    session: Option<Session>,
}

impl ProcessEditor {
    pub fn new(events: Sender<EditorEvent>) -> Result<Self> {
        let exe = std::env::current_exe().context("Failed to locate own executable")?;
        Ok(Self {
            exe,
            events,
            session: None,
        })
    }
}

impl SettingsEditor for ProcessEditor {
    fn open(&mut self, dir: &Path, profile: &Profile) -> Result<()> {
        self.close();

        let server = EditorServer::bind().context("Failed to create editor socket")?;
        server.set_nonblocking(true)?;

        let child = Command::new(&self.exe)
            .arg("--editor")
            .arg(server.path())
            .spawn()
            .context(format!("Failed to start editor process {}", self.exe.display()))?;
        let pid = Pid::from_raw(child.id() as i32);
        info!(pid = child.id(), socket = %server.path().display(), "Editor process started");

        let init = EditorRequest::Init {
            dir: dir.to_path_buf(),
            filename: profile.filename.clone(),
            profile: profile.clone(),
        };
        let closed = Arc::new(AtomicBool::new(false));
        let reader = spawn_reader(server, child, init, self.events.clone(), closed.clone());

        self.session = Some(Session {
            pid,
            closed,
            reader,
        });
        Ok(())
    }

    fn close(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.closed.store(true, Ordering::SeqCst);
        if session.reader.is_finished() {
            return;
        }
        match signal::kill(session.pid, Signal::SIGTERM) {
            Ok(()) => debug!(pid = %session.pid, "Sent SIGTERM to editor process"),
            Err(e) => debug!(pid = %session.pid, error = %e, "Editor process already gone"),
        }
    }
}

impl Drop for ProcessEditor {
    fn drop(&mut self) {
        self.close();
    }
}

fn spawn_reader(
    server: EditorServer,
    child: Child,
    init: EditorRequest,
    events: Sender<EditorEvent>,
    closed: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        if let Err(e) = run_reader(server, child, init, &events, &closed) {
            error!(error = ?e, "Editor reader thread failed");
            if !closed.load(Ordering::SeqCst) {
                let _ = events.send(EditorEvent::Cancel);
            }
        }
    })
}

fn run_reader(
    server: EditorServer,
    mut child: Child,
    init: EditorRequest,
    events: &Sender<EditorEvent>,
    closed: &AtomicBool,
) -> Result<()> {
    let mut conn = loop {
        if let Some(conn) = server.try_accept()? {
            break conn;
        }
        if let Some(status) = child.try_wait().context("Failed to poll editor process")? {
            warn!(status = %status, "Editor exited before connecting");
            if !closed.load(Ordering::SeqCst) {
                let _ = events.send(EditorEvent::Cancel);
            }
            return Ok(());
        }
        thread::sleep(ACCEPT_POLL);
    };
    drop(server);

    conn.send(&init).context("Failed to send profile to editor")?;
    let finished = forward_messages(&mut conn, events, closed);
    if !finished && !closed.load(Ordering::SeqCst) {
        info!("Editor connection dropped, treating as cancel");
        let _ = events.send(EditorEvent::Cancel);
    }

    let status = child.wait().context("Failed to wait for editor process")?;
    info!(status = %status, "Editor process exited");
    Ok(())
}

/// Forward messages until Commit/Cancel (true) or the connection ends (false)
fn forward_messages(
    conn: &mut EditorConnection,
    events: &Sender<EditorEvent>,
    closed: &AtomicBool,
) -> bool {
    loop {
        let msg = match conn.recv::<EditorMessage>() {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %format!("{e:#}"), "Editor connection closed");
                return false;
            }
        };
        if closed.load(Ordering::SeqCst) {
            return false;
        }

        let terminal = !matches!(msg, EditorMessage::LiveApply(_));
        debug!(terminal, "Message from editor");
        if events.send(msg.into()).is_err() {
            warn!("Main loop gone, dropping editor message");
            return false;
        }
        if terminal {
            return true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::net::UnixStream;
    use std::sync::mpsc;

    #[test]
    fn test_forward_stops_at_commit() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut overlay = EditorConnection::from_stream(a);
        let mut editor = EditorConnection::from_stream(b);
        let (tx, rx) = mpsc::channel();
        let closed = AtomicBool::new(false);

        editor.send(&EditorMessage::LiveApply(Profile::empty("x.json"))).unwrap();
        editor
            .send(&EditorMessage::Commit {
                filename: "x.json".to_string(),
                profile: Profile::default(),
            })
            .unwrap();

        assert!(forward_messages(&mut overlay, &tx, &closed));
        let received: Vec<EditorEvent> = rx.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert!(matches!(received[1], EditorEvent::Commit { .. }));
    }

    #[test]
    fn test_forward_reports_dropped_connection() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut overlay = EditorConnection::from_stream(a);
        let (tx, rx) = mpsc::channel();
        drop(b);

        assert!(!forward_messages(&mut overlay, &tx, &AtomicBool::new(false)));
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn test_forward_ignores_messages_after_close() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut overlay = EditorConnection::from_stream(a);
        let mut editor = EditorConnection::from_stream(b);
        let (tx, rx) = mpsc::channel();

        editor.send(&EditorMessage::Cancel).unwrap();
        assert!(!forward_messages(&mut overlay, &tx, &AtomicBool::new(true)));
        assert!(rx.try_iter().next().is_none());
    }
}
