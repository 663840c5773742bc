//! StatusNotifier tray icon (ksni) on its own thread
//!
//! Menu callbacks only send [`TrayCommand`]s to the main loop; the main loop
//! pushes a fresh [`TrayState`] back whenever the profile list, active profile
//! or lock state changes.

use anyhow::{Context, Result};
use ksni::TrayMethods;
use ksni::menu::{CheckmarkItem, RadioGroup, RadioItem, StandardItem, SubMenu};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tracing::{debug, error, info, warn};

use crate::constants::tray;

/// Menu actions, one per manager operation
#[derive(Debug, Clone, PartialEq)]
pub enum TrayCommand {
    SwitchProfile(String),
    NewProfile,
    ManageButtons,
    SetLocked(bool),
    Exit,
}

/// What the menu shows
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrayState {
    pub profiles: Vec<String>,
    pub active: String,
    pub locked: bool,
}

struct ButtonTray {
    state: TrayState,
    commands: Sender<TrayCommand>,
}

impl ButtonTray {
    fn send(&self, command: TrayCommand) {
        debug!(?command, "Tray command");
        if self.commands.send(command).is_err() {
            warn!("Main loop gone, tray command dropped");
        }
    }
}

impl ksni::Tray for ButtonTray {
    fn id(&self) -> String {
        tray::ID.to_string()
    }

    fn title(&self) -> String {
        tray::TITLE.to_string()
    }

    fn icon_name(&self) -> String {
        tray::ICON_NAME.to_string()
    }

    fn icon_pixmap(&self) -> Vec<ksni::Icon> {
        vec![render_icon(tray::ICON_SIZE)]
    }

    fn tool_tip(&self) -> ksni::ToolTip {
        ksni::ToolTip {
            title: tray::TITLE.to_string(),
            description: format!("Profile: {}", self.state.active),
            ..Default::default()
        }
    }

    fn activate(&mut self, _x: i32, _y: i32) {
        self.send(TrayCommand::ManageButtons);
    }

    fn menu(&self) -> Vec<ksni::MenuItem<Self>> {
        let selected = self
            .state
            .profiles
            .iter()
            .position(|p| *p == self.state.active)
            .unwrap_or(usize::MAX);

        let mut profile_items: Vec<ksni::MenuItem<Self>> = vec![
            RadioGroup {
                selected,
                select: Box::new(|this: &mut Self, index| {
                    if let Some(filename) = this.state.profiles.get(index).cloned() {
                        this.send(TrayCommand::SwitchProfile(filename));
                    }
                }),
                options: self
                    .state
                    .profiles
                    .iter()
                    .map(|p| RadioItem {
                        label: p.clone(),
                        ..Default::default()
                    })
                    .collect(),
            }
            .into(),
        ];
        profile_items.push(ksni::MenuItem::Separator);
        profile_items.push(
            StandardItem {
                label: "New profile…".to_string(),
                icon_name: "document-new".to_string(),
                activate: Box::new(|this: &mut Self| this.send(TrayCommand::NewProfile)),
                ..Default::default()
            }
            .into(),
        );

        vec![
            SubMenu {
                label: "Switch profile".to_string(),
                submenu: profile_items,
                ..Default::default()
            }
            .into(),
            StandardItem {
                label: "Manage buttons".to_string(),
                icon_name: "preferences-system".to_string(),
                activate: Box::new(|this: &mut Self| this.send(TrayCommand::ManageButtons)),
                ..Default::default()
            }
            .into(),
            CheckmarkItem {
                label: "Lock all positions".to_string(),
                checked: self.state.locked,
                activate: Box::new(|this: &mut Self| {
                    let locked = !this.state.locked;
                    this.send(TrayCommand::SetLocked(locked));
                }),
                ..Default::default()
            }
            .into(),
            ksni::MenuItem::Separator,
            StandardItem {
                label: "Exit".to_string(),
                icon_name: "application-exit".to_string(),
                activate: Box::new(|this: &mut Self| this.send(TrayCommand::Exit)),
                ..Default::default()
            }
            .into(),
        ]
    }
}

/// Main-loop side of the tray
pub struct TrayHandle {
    updates: UnboundedSender<TrayState>,
    last: TrayState,
    _thread: Option<JoinHandle<()>>,
}

impl TrayHandle {
    /// Push `state` to the tray if it differs from what is shown
    pub fn update(&mut self, state: TrayState) {
        if state == self.last {
            return;
        }
        if self.updates.send(state.clone()).is_err() {
            debug!("Tray thread gone, skipping update");
        }
        self.last = state;
    }
}

/// Start the tray service on a dedicated thread with a current-thread tokio runtime
pub fn spawn(initial: TrayState, commands: Sender<TrayCommand>) -> Result<TrayHandle> {
    let (updates, mut rx) = unbounded_channel::<TrayState>();
    let last = initial.clone();

    let thread = thread::Builder::new()
        .name("tray".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    error!(error = %e, "Failed to build tray runtime");
                    return;
                }
            };

            runtime.block_on(async move {
                let tray = ButtonTray {
                    state: initial,
                    commands,
                };
                let handle = match tray.spawn().await {
                    Ok(handle) => handle,
                    Err(e) => {
                        warn!(error = %e, "System tray unavailable (no StatusNotifier host?)");
                        return;
                    }
                };
                info!("Tray icon registered");

                while let Some(state) = rx.recv().await {
                    handle
                        .update(move |tray: &mut ButtonTray| tray.state = state)
                        .await;
                }
                debug!("Tray update channel closed");
            });
        })
        .context("Failed to spawn tray thread")?;

    Ok(TrayHandle {
        updates,
        last,
        _thread: Some(thread),
    })
}

/// Procedural icon: a rounded blue key cap with a lighter face, ARGB32 big-endian
fn render_icon(size: i32) -> ksni::Icon {
    let n = size.max(1) as usize;
    let radius = n as f32 * 0.2;
    let inset = (n as f32 * 0.06).max(1.0);
    let mut data = Vec::with_capacity(n * n * 4);

    for y in 0..n {
        for x in 0..n {
            let outer = inside_rounded(x as f32, y as f32, 0.0, n as f32, radius);
            let face = inside_rounded(
                x as f32,
                y as f32,
                inset * 2.0,
                n as f32 - inset * 2.0,
                radius * 0.6,
            );
            let (a, r, g, b) = if face {
                (0xFF, 0x21, 0x96, 0xF3)
            } else if outer {
                (0xFF, 0x19, 0x76, 0xD2)
            } else {
                (0x00, 0x00, 0x00, 0x00)
            };
            data.extend_from_slice(&[a, r, g, b]);
        }
    }

    ksni::Icon {
        width: size,
        height: size,
        data,
    }
}

fn inside_rounded(x: f32, y: f32, min: f32, max: f32, radius: f32) -> bool {
    let px = x + 0.5;
    let py = y + 0.5;
    if px < min || py < min || px > max || py > max {
        return false;
    }
    let cx = px.clamp(min + radius, max - radius);
    let cy = py.clamp(min + radius, max - radius);
    let dx = px - cx;
    let dy = py - cy;
    dx * dx + dy * dy <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icon_dimensions_and_corners() {
        let icon = render_icon(32);
        assert_eq!(icon.width, 32);
        assert_eq!(icon.data.len(), 32 * 32 * 4);
        // Rounded corner is transparent, centre is opaque
        assert_eq!(icon.data[0], 0);
        let centre = (16 * 32 + 16) * 4;
        assert_eq!(icon.data[centre], 0xFF);
    }

    #[test]
    fn test_update_skips_unchanged_state() {
        let (updates, mut rx) = unbounded_channel();
        let state = TrayState {
            profiles: vec!["default.json".to_string()],
            active: "default.json".to_string(),
            locked: false,
        };
        let mut handle = TrayHandle {
            updates,
            last: state.clone(),
            _thread: None,
        };

        handle.update(state.clone());
        assert!(rx.try_recv().is_err());

        let locked = TrayState {
            locked: true,
            ..state
        };
        handle.update(locked.clone());
        assert_eq!(rx.try_recv().ok(), Some(locked));
    }
}
