//! IPC between the overlay process and the editor child via Unix sockets
//!
//! Uses length-prefixed JSON over a per-process Unix domain socket.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use crate::constants::paths;

mod messages;
pub use messages::{EditorMessage, EditorRequest};

/// Maximum message size (10 MB) to prevent DoS via memory exhaustion
const MAX_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

static SESSION_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Fresh socket path per editor session (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    let session = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    let name = format!("editor-{}-{session}.sock", std::process::id());
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(paths::RUNTIME_SUBDIR).join(name));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(paths::RUNTIME_SUBDIR).join(name))
}

/// One end of an established editor connection
pub struct EditorConnection {
    stream: UnixStream,
}

impl EditorConnection {
    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .context(format!("Failed to connect to overlay at {}", path.display()))?;
        Ok(Self { stream })
    }

    pub fn from_stream(stream: UnixStream) -> Self {
        Self { stream }
    }

    pub fn send<T: Serialize>(&mut self, msg: &T) -> Result<()> {
        write_message(&mut self.stream, msg)
    }

    /// Blocking receive
    pub fn recv<T: for<'de> Deserialize<'de>>(&mut self) -> Result<T> {
        read_message(&mut self.stream)
    }

    pub fn try_clone(&self) -> Result<Self> {
        let stream = self
            .stream
            .try_clone()
            .context("Failed to clone IPC stream")?;
        Ok(Self { stream })
    }
}

/// Listener owned by the overlay process
pub struct EditorServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl EditorServer {
    pub fn bind() -> Result<Self> {
        let socket_path = default_socket_path()?;
        Self::bind_to(socket_path)
    }

    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Remove stale socket if exists
        if socket_path.exists() {
            std::fs::remove_file(&socket_path)
                .context(format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .context(format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner only
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<()> {
        self.listener
            .set_nonblocking(nonblocking)
            .context("Failed to set listener mode")
    }

    /// Accept without blocking (listener must be non-blocking); `None` when nobody is waiting
    pub fn try_accept(&self) -> Result<Option<EditorConnection>> {
        match self.listener.accept() {
            Ok((stream, _addr)) => {
                stream
                    .set_nonblocking(false)
                    .context("Failed to make IPC stream blocking")?;
                Ok(Some(EditorConnection { stream }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e).context("Failed to accept IPC connection"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for EditorServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write length-prefixed message to stream
fn write_message<T: Serialize>(stream: &mut impl Write, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;

    // Write length prefix (u32 little-endian)
    let len = u32::try_from(json.len()).context("Message too large to send")?;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;

    stream
        .write_all(&json)
        .context("Failed to write message payload")?;

    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
fn read_message<T: for<'de> Deserialize<'de>>(stream: &mut impl Read) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    // Sanity check (prevent DoS via huge allocation)
    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ButtonDefinition, Profile};
    use std::io::Cursor;

    #[test]
    fn test_messages_cross_a_socket_pair() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut overlay = EditorConnection::from_stream(a);
        let mut editor = EditorConnection::from_stream(b);

        let mut profile = Profile::empty("ignored.json");
        profile.buttons.push(ButtonDefinition::new_default());
        let request = EditorRequest::Init {
            dir: PathBuf::from("/tmp/config"),
            filename: "default.json".to_string(),
            profile: profile.clone(),
        };
        overlay.send(&request).unwrap();
        let EditorRequest::Init { filename, profile: p, .. } = editor.recv().unwrap();
        assert_eq!(filename, "default.json");
        assert_eq!(p.buttons, profile.buttons);

        editor.send(&EditorMessage::Cancel).unwrap();
        assert_eq!(overlay.recv::<EditorMessage>().unwrap(), EditorMessage::Cancel);
    }

    #[test]
    fn test_closed_peer_is_an_error() {
        let (a, b) = UnixStream::pair().unwrap();
        let mut overlay = EditorConnection::from_stream(a);
        drop(b);
        assert!(overlay.recv::<EditorMessage>().is_err());
    }

    #[test]
    fn test_oversized_length_is_rejected() {
        let mut bytes = ((MAX_MESSAGE_SIZE + 1) as u32).to_le_bytes().to_vec();
        bytes.extend_from_slice(b"{}");
        let result: Result<EditorMessage> = read_message(&mut Cursor::new(bytes));
        assert!(result.is_err());
    }

    #[test]
    fn test_try_accept_without_client() {
        let tmp = tempfile::TempDir::new().unwrap();
        let server = EditorServer::bind_to(tmp.path().join("editor.sock")).unwrap();
        server.set_nonblocking(true).unwrap();
        assert!(server.try_accept().unwrap().is_none());

        let _client = EditorConnection::connect_to(server.path()).unwrap();
        assert!(server.try_accept().unwrap().is_some());
    }

    #[test]
    fn test_server_removes_socket_on_drop() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("sub").join("editor.sock");
        {
            let server = EditorServer::bind_to(path.clone()).unwrap();
            assert!(server.path().exists());
        }
        assert!(!path.exists());
    }
}
