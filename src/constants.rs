//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the application, providing a single source of truth for constant values.

/// X11 protocol constants
pub mod x11 {
    /// Override redirect flag for unmanaged windows
    pub const OVERRIDE_REDIRECT: u32 = 1;

    /// WM_HINTS flags bit for the `input` field
    pub const WM_HINTS_INPUT_FLAG: u32 = 1;

    /// Number of CARD32 fields in a WM_HINTS property
    pub const WM_HINTS_LEN: usize = 9;

    /// WM_CLASS value (instance\0class\0)
    pub const WM_CLASS: &[u8] = b"touchbutton\0touchbutton\0";

    /// Width of the painted border in pixels
    pub const BORDER_WIDTH: u32 = 2;
}

/// Mouse button constants
pub mod mouse {
    /// Left mouse button number
    pub const BUTTON_LEFT: u8 = 1;

    /// Right mouse button number
    pub const BUTTON_RIGHT: u8 = 3;
}

/// Pointer interaction tuning
pub mod interaction {
    /// Press/release pairs closer than this (Manhattan, px) count as a click
    pub const CLICK_THRESHOLD: u32 = 2;

    /// Quiet period before a dragged position is written to disk
    pub const SAVE_DEBOUNCE_MS: u64 = 100;

    /// Main loop sleep when no events are pending
    pub const IDLE_POLL_MS: u64 = 8;
}

/// Button definition defaults and limits
pub mod button {
    pub const DEFAULT_LABEL: &str = "New Button";
    pub const DEFAULT_FONT_FAMILY: &str = "DejaVu Sans";
    pub const DEFAULT_POSITION: (i32, i32) = (200, 200);
    pub const DEFAULT_SIZE: (u32, u32) = (150, 100);
    pub const DEFAULT_OPACITY: f32 = 0.8;
    pub const DEFAULT_COLOR: &str = "#2196F3";
    pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";
    pub const DEFAULT_BORDER_COLOR: &str = "#1976D2";
    pub const DEFAULT_FONT_SIZE: u32 = 20;

    pub const MIN_SIZE: u32 = 20;
    pub const MAX_SIZE: u32 = 1000;
    pub const MIN_OPACITY: f32 = 0.1;
    pub const MAX_OPACITY: f32 = 1.0;
    pub const MIN_FONT_SIZE: u32 = 8;
    pub const MAX_FONT_SIZE: u32 = 200;

    /// Suffix appended to a duplicated button's label
    pub const COPY_SUFFIX: &str = "copy";

    /// Offset applied to a duplicate so it does not sit exactly on its source
    pub const DUPLICATE_OFFSET: i32 = 20;
}

/// Configuration file layout
pub mod config {
    /// Profile directory, relative to the executable
    pub const DIR_NAME: &str = "config";

    /// Profile file extension (without dot)
    pub const PROFILE_EXTENSION: &str = "json";

    /// Profile used when nothing else is known
    pub const DEFAULT_PROFILE: &str = "default.json";

    /// Last-used profile pointer, lives next to the profiles
    pub const PREFERENCES_FILE: &str = "preferences.json";

    /// Single-file config from before profiles existed (sits beside `config/`)
    pub const LEGACY_FILE: &str = "config.json";

    /// Where the legacy file goes when `config/` already has content
    pub const LEGACY_BACKUP: &str = "old_config_backup.json";

    /// Prefix for profiles created from the tray
    pub const NEW_PROFILE_PREFIX: &str = "config_";
}

/// Filesystem paths
pub mod paths {
    /// uinput device used for shortcut injection
    pub const DEV_UINPUT: &str = "/dev/uinput";

    /// Runtime subdirectory for the editor socket
    pub const RUNTIME_SUBDIR: &str = "touchbutton";
}

/// Permission hints printed when uinput is not accessible
pub mod permissions {
    pub const INPUT_GROUP: &str = "input";
    pub const ADD_TO_INPUT_GROUP: &str = "sudo usermod -aG input $USER";
    pub const UDEV_RULE: &str =
        "echo 'KERNEL==\"uinput\", GROUP=\"input\", MODE=\"0660\"' | sudo tee /etc/udev/rules.d/99-uinput.rules";
}

/// Tray identity
pub mod tray {
    pub const ID: &str = "touchbutton";
    pub const TITLE: &str = "TouchButton";
    pub const ICON_NAME: &str = "input-keyboard";
    pub const ICON_SIZE: i32 = 32;
}

/// Desktop notifications (org.freedesktop.Notifications)
pub mod notify {
    pub const APP_NAME: &str = "TouchButton";
    pub const EXPIRE_MS: i32 = 4000;
    pub const URGENCY_NORMAL: u8 = 1;
    pub const URGENCY_CRITICAL: u8 = 2;
}
