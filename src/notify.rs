//! Transient user notifications
//!
//! [`DesktopNotifier`] hands notices to a background thread that talks to the
//! session's `org.freedesktop.Notifications` service, so reporting never blocks
//! the main loop. Every notice is also logged.

use std::collections::HashMap;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::{debug, error, info, warn};
use zbus::zvariant::Value;

use crate::constants::notify::*;

/// Non-blocking channel for reporting outcomes to the user
pub trait Notifier {
    fn info(&mut self, message: &str);
    fn error(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    fn body(&self) -> &str {
        match self {
            Notice::Info(message) | Notice::Error(message) => message,
        }
    }

    fn urgency(&self) -> u8 {
        match self {
            Notice::Info(_) => URGENCY_NORMAL,
            Notice::Error(_) => URGENCY_CRITICAL,
        }
    }
}

/// Notifications go to the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn info(&mut self, message: &str) {
        info!(notice = %message, "Notification");
    }

    fn error(&mut self, message: &str) {
        error!(notice = %message, "Notification");
    }
}

#[zbus::proxy(
    interface = "org.freedesktop.Notifications",
    default_service = "org.freedesktop.Notifications",
    default_path = "/org/freedesktop/Notifications",
    gen_blocking = false
)]
trait Notifications {
    fn notify(
        &self,
        app_name: &str,
        replaces_id: u32,
        app_icon: &str,
        summary: &str,
        body: &str,
        actions: &[&str],
        hints: &HashMap<&str, &Value<'_>>,
        expire_timeout: i32,
    ) -> zbus::Result<u32>;
}

/// Desktop popups through the notification daemon, plus the log
pub struct DesktopNotifier {
    log: LogNotifier,
    queue: UnboundedSender<Notice>,
    _thread: Option<JoinHandle<()>>,
}

impl DesktopNotifier {
    /// Start the sender thread; without a session bus notices are only logged
    pub fn spawn() -> anyhow::Result<Self> {
        let (queue, mut rx) = unbounded_channel::<Notice>();

        let thread = thread::Builder::new()
            .name("notify".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        error!(error = %e, "Failed to build notification runtime");
                        return;
                    }
                };

                runtime.block_on(async move {
                    let proxy = match connect().await {
                        Ok(proxy) => proxy,
                        Err(e) => {
                            warn!(error = %e, "Desktop notifications unavailable");
                            return;
                        }
                    };
                    debug!("Connected to notification service");

                    while let Some(notice) = rx.recv().await {
                        if let Err(e) = show(&proxy, &notice).await {
                            debug!(error = %e, "Notification not delivered");
                        }
                    }
                });
            })?;

        Ok(Self {
            log: LogNotifier,
            queue,
            _thread: Some(thread),
        })
    }

    fn push(&self, notice: Notice) {
        if self.queue.send(notice).is_err() {
            debug!("Notification thread gone, notice only logged");
        }
    }
}

impl Notifier for DesktopNotifier {
    fn info(&mut self, message: &str) {
        self.log.info(message);
        self.push(Notice::Info(message.to_string()));
    }

    fn error(&mut self, message: &str) {
        self.log.error(message);
        self.push(Notice::Error(message.to_string()));
    }
}

async fn connect() -> zbus::Result<NotificationsProxy<'static>> {
    let connection = zbus::Connection::session().await?;
    NotificationsProxy::new(&connection).await
}

async fn show(proxy: &NotificationsProxy<'_>, notice: &Notice) -> zbus::Result<u32> {
    let urgency = Value::from(notice.urgency());
    let hints = HashMap::from([("urgency", &urgency)]);
    proxy
        .notify(
            APP_NAME,
            0,
            crate::constants::tray::ICON_NAME,
            APP_NAME,
            notice.body(),
            &[],
            &hints,
            EXPIRE_MS,
        )
        .await
}

#[cfg(test)]
pub mod testing {
    use super::Notifier;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub use super::Notice;

    #[derive(Debug, Clone, Default)]
    pub struct RecordingNotifier {
        pub notices: Rc<RefCell<Vec<Notice>>>,
    }

    impl RecordingNotifier {
        pub fn errors(&self) -> usize {
            self.notices
                .borrow()
                .iter()
                .filter(|n| matches!(n, Notice::Error(_)))
                .count()
        }
    }

    impl Notifier for RecordingNotifier {
        fn info(&mut self, message: &str) {
            self.notices.borrow_mut().push(Notice::Info(message.to_string()));
        }

        fn error(&mut self, message: &str) {
            self.notices.borrow_mut().push(Notice::Error(message.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_are_critical() {
        assert_eq!(Notice::Error("x".to_string()).urgency(), URGENCY_CRITICAL);
        assert_eq!(Notice::Info("x".to_string()).urgency(), URGENCY_NORMAL);
        assert_eq!(Notice::Info("Saved a.json".to_string()).body(), "Saved a.json");
    }

    #[test]
    fn test_desktop_notifier_queues_every_notice() {
        let (queue, mut rx) = unbounded_channel();
        let mut notifier = DesktopNotifier {
            log: LogNotifier,
            queue,
            _thread: None,
        };

        notifier.info("All positions locked");
        notifier.error("Could not save profile: disk full");

        assert_eq!(rx.try_recv().ok(), Some(Notice::Info("All positions locked".to_string())));
        assert_eq!(
            rx.try_recv().ok(),
            Some(Notice::Error("Could not save profile: disk full".to_string()))
        );
    }

    #[test]
    fn test_closed_queue_does_not_panic() {
        let (queue, rx) = unbounded_channel();
        drop(rx);
        let mut notifier = DesktopNotifier {
            log: LogNotifier,
            queue,
            _thread: None,
        };
        notifier.error("still logged");
    }
}
