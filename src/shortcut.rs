//! Keyboard shortcut replay through a uinput virtual keyboard

use evdev::uinput::VirtualDevice;
use evdev::{AttributeSet, EventType, InputEvent, KeyCode};
use std::fs::OpenOptions;
use tracing::{debug, error, info, warn};

use crate::constants::{paths, permissions};
use crate::error::ShortcutError;

const KEY_RELEASE: i32 = 0;
const KEY_PRESS: i32 = 1;

/// Performs the key presses and releases for a shortcut string
pub trait ShortcutInvoker {
    fn send(&mut self, shortcut: &str) -> Result<(), ShortcutError>;
}

/// Parse `ctrl+shift+a` style strings into the keys to press, in order
pub fn parse_shortcut(shortcut: &str) -> Result<Vec<KeyCode>, ShortcutError> {
    let trimmed = shortcut.trim();
    if trimmed.is_empty() {
        return Err(ShortcutError::Invalid(shortcut.to_string()));
    }

    trimmed
        .split('+')
        .map(|part| {
            let name = part.trim().to_ascii_lowercase();
            key_for_name(&name).ok_or_else(|| ShortcutError::Invalid(shortcut.to_string()))
        })
        .collect()
}

fn key_for_name(name: &str) -> Option<KeyCode> {
    let key = match name {
        "ctrl" | "control" | "lctrl" => KeyCode::KEY_LEFTCTRL,
        "rctrl" => KeyCode::KEY_RIGHTCTRL,
        "shift" | "lshift" => KeyCode::KEY_LEFTSHIFT,
        "rshift" => KeyCode::KEY_RIGHTSHIFT,
        "alt" | "lalt" => KeyCode::KEY_LEFTALT,
        "ralt" | "altgr" => KeyCode::KEY_RIGHTALT,
        "win" | "super" | "meta" | "cmd" => KeyCode::KEY_LEFTMETA,

        "space" => KeyCode::KEY_SPACE,
        "enter" | "return" => KeyCode::KEY_ENTER,
        "esc" | "escape" => KeyCode::KEY_ESC,
        "tab" => KeyCode::KEY_TAB,
        "backspace" => KeyCode::KEY_BACKSPACE,
        "delete" | "del" => KeyCode::KEY_DELETE,
        "insert" | "ins" => KeyCode::KEY_INSERT,
        "home" => KeyCode::KEY_HOME,
        "end" => KeyCode::KEY_END,
        "pageup" | "pgup" => KeyCode::KEY_PAGEUP,
        "pagedown" | "pgdn" => KeyCode::KEY_PAGEDOWN,
        "up" => KeyCode::KEY_UP,
        "down" => KeyCode::KEY_DOWN,
        "left" => KeyCode::KEY_LEFT,
        "right" => KeyCode::KEY_RIGHT,
        "capslock" => KeyCode::KEY_CAPSLOCK,
        "printscreen" | "print" => KeyCode::KEY_SYSRQ,
        "pause" => KeyCode::KEY_PAUSE,

        "-" | "minus" => KeyCode::KEY_MINUS,
        "=" | "equal" => KeyCode::KEY_EQUAL,
        "," | "comma" => KeyCode::KEY_COMMA,
        "." | "period" => KeyCode::KEY_DOT,
        "/" | "slash" => KeyCode::KEY_SLASH,
        ";" | "semicolon" => KeyCode::KEY_SEMICOLON,
        "'" | "apostrophe" => KeyCode::KEY_APOSTROPHE,
        "[" => KeyCode::KEY_LEFTBRACE,
        "]" => KeyCode::KEY_RIGHTBRACE,
        "\\" | "backslash" => KeyCode::KEY_BACKSLASH,
        "`" | "grave" => KeyCode::KEY_GRAVE,

        "volumeup" => KeyCode::KEY_VOLUMEUP,
        "volumedown" => KeyCode::KEY_VOLUMEDOWN,
        "mute" => KeyCode::KEY_MUTE,
        "playpause" => KeyCode::KEY_PLAYPAUSE,

        _ => return single_char_key(name).or_else(|| function_key(name)),
    };
    Some(key)
}

fn single_char_key(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return None;
    };

    let key = match c {
        'a' => KeyCode::KEY_A,
        'b' => KeyCode::KEY_B,
        'c' => KeyCode::KEY_C,
        'd' => KeyCode::KEY_D,
        'e' => KeyCode::KEY_E,
        'f' => KeyCode::KEY_F,
        'g' => KeyCode::KEY_G,
        'h' => KeyCode::KEY_H,
        'i' => KeyCode::KEY_I,
        'j' => KeyCode::KEY_J,
        'k' => KeyCode::KEY_K,
        'l' => KeyCode::KEY_L,
        'm' => KeyCode::KEY_M,
        'n' => KeyCode::KEY_N,
        'o' => KeyCode::KEY_O,
        'p' => KeyCode::KEY_P,
        'q' => KeyCode::KEY_Q,
        'r' => KeyCode::KEY_R,
        's' => KeyCode::KEY_S,
        't' => KeyCode::KEY_T,
        'u' => KeyCode::KEY_U,
        'v' => KeyCode::KEY_V,
        'w' => KeyCode::KEY_W,
        'x' => KeyCode::KEY_X,
        'y' => KeyCode::KEY_Y,
        'z' => KeyCode::KEY_Z,
        '0' => KeyCode::KEY_0,
        '1' => KeyCode::KEY_1,
        '2' => KeyCode::KEY_2,
        '3' => KeyCode::KEY_3,
        '4' => KeyCode::KEY_4,
        '5' => KeyCode::KEY_5,
        '6' => KeyCode::KEY_6,
        '7' => KeyCode::KEY_7,
        '8' => KeyCode::KEY_8,
        '9' => KeyCode::KEY_9,
        _ => return None,
    };
    Some(key)
}

fn function_key(name: &str) -> Option<KeyCode> {
    let n: u8 = name.strip_prefix('f')?.parse().ok()?;
    let key = match n {
        1 => KeyCode::KEY_F1,
        2 => KeyCode::KEY_F2,
        3 => KeyCode::KEY_F3,
        4 => KeyCode::KEY_F4,
        5 => KeyCode::KEY_F5,
        6 => KeyCode::KEY_F6,
        7 => KeyCode::KEY_F7,
        8 => KeyCode::KEY_F8,
        9 => KeyCode::KEY_F9,
        10 => KeyCode::KEY_F10,
        11 => KeyCode::KEY_F11,
        12 => KeyCode::KEY_F12,
        _ => return None,
    };
    Some(key)
}

/// Key events for a chord: press in order, release in reverse
pub fn chord_events(keys: &[KeyCode]) -> Vec<InputEvent> {
    let press = keys
        .iter()
        .map(|key| InputEvent::new(EventType::KEY.0, key.code(), KEY_PRESS));
    let release = keys
        .iter()
        .rev()
        .map(|key| InputEvent::new(EventType::KEY.0, key.code(), KEY_RELEASE));
    press.chain(release).collect()
}

/// Every key `parse_shortcut` can produce, registered on the virtual device
fn supported_keys() -> AttributeSet<KeyCode> {
    let mut keys = AttributeSet::<KeyCode>::new();
    let names = [
        "ctrl", "rctrl", "shift", "rshift", "alt", "ralt", "win", "space", "enter", "esc", "tab",
        "backspace", "delete", "insert", "home", "end", "pageup", "pagedown", "up", "down",
        "left", "right", "capslock", "print", "pause", "-", "=", ",", ".", "/", ";", "'", "[",
        "]", "\\", "`", "volumeup", "volumedown", "mute", "playpause",
    ];
    for name in names {
        if let Some(key) = key_for_name(name) {
            keys.insert(key);
        }
    }
    for c in ('a'..='z').chain('0'..='9') {
        if let Some(key) = single_char_key(&c.to_string()) {
            keys.insert(key);
        }
    }
    for n in 1..=12 {
        if let Some(key) = function_key(&format!("f{n}")) {
            keys.insert(key);
        }
    }
    keys
}

/// Injects shortcuts through a uinput virtual keyboard
pub struct UinputInvoker {
    device: VirtualDevice,
}

impl UinputInvoker {
    pub fn new() -> anyhow::Result<Self> {
        use anyhow::Context;

        let device = VirtualDevice::builder()
            .context("Failed to open uinput")?
            .name("touchbutton virtual keyboard")
            .with_keys(&supported_keys())
            .context("Failed to register keys on virtual keyboard")?
            .build()
            .context("Failed to create virtual keyboard")?;
        info!(path = %paths::DEV_UINPUT, "Virtual keyboard ready");
        Ok(Self { device })
    }
}

impl ShortcutInvoker for UinputInvoker {
    fn send(&mut self, shortcut: &str) -> Result<(), ShortcutError> {
        let keys = parse_shortcut(shortcut)?;
        debug!(shortcut = %shortcut, keys = ?keys, "Sending shortcut");
        self.device
            .emit(&chord_events(&keys))
            .map_err(|e| ShortcutError::Execution(e.to_string()))
    }
}

/// Used when no virtual keyboard is available; shortcuts are validated and reported as failed
#[derive(Debug, Default)]
pub struct LogInvoker;

impl ShortcutInvoker for LogInvoker {
    fn send(&mut self, shortcut: &str) -> Result<(), ShortcutError> {
        let keys = parse_shortcut(shortcut)?;
        warn!(shortcut = %shortcut, keys = keys.len(), "No virtual keyboard, shortcut not sent");
        Err(ShortcutError::Execution(format!(
            "{} is not available",
            paths::DEV_UINPUT
        )))
    }
}

/// Check if /dev/uinput can be opened for writing
pub fn check_permissions() -> bool {
    OpenOptions::new().write(true).open(paths::DEV_UINPUT).is_ok()
}

/// Print helpful error message if permissions missing
pub fn print_permission_error() {
    error!(path = %paths::DEV_UINPUT, "Cannot open uinput device");
    error!(group = %permissions::INPUT_GROUP, "Shortcut injection requires write access");
    error!(command = %permissions::ADD_TO_INPUT_GROUP, "Add user to input group");
    error!(command = %permissions::UDEV_RULE, "Grant the group access to uinput");
    error!("  Then log out and back in");
    warn!(continuing = true, "Continuing without shortcut support...");
}

/// Best available invoker for this session
pub fn default_invoker() -> Box<dyn ShortcutInvoker> {
    if !check_permissions() {
        print_permission_error();
        return Box::new(LogInvoker);
    }
    match UinputInvoker::new() {
        Ok(invoker) => Box::new(invoker),
        Err(e) => {
            error!(error = %format!("{e:#}"), "Virtual keyboard unavailable");
            Box::new(LogInvoker)
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every shortcut it is asked to send; parse errors still surface
    #[derive(Debug, Clone, Default)]
    pub struct RecordingInvoker {
        pub sent: Rc<RefCell<Vec<String>>>,
        pub fail_execution: bool,
    }

    impl ShortcutInvoker for RecordingInvoker {
        fn send(&mut self, shortcut: &str) -> Result<(), ShortcutError> {
            parse_shortcut(shortcut)?;
            self.sent.borrow_mut().push(shortcut.to_string());
            if self.fail_execution {
                return Err(ShortcutError::Execution("simulated".to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modifier_chord() {
        let keys = parse_shortcut("ctrl+shift+a").unwrap();
        assert_eq!(keys, vec![KeyCode::KEY_LEFTCTRL, KeyCode::KEY_LEFTSHIFT, KeyCode::KEY_A]);
    }

    #[test]
    fn test_parse_is_case_and_space_insensitive() {
        assert_eq!(
            parse_shortcut(" Alt + F4 ").unwrap(),
            vec![KeyCode::KEY_LEFTALT, KeyCode::KEY_F4]
        );
        assert_eq!(parse_shortcut("SPACE").unwrap(), vec![KeyCode::KEY_SPACE]);
        assert_eq!(parse_shortcut("win+d").unwrap(), vec![KeyCode::KEY_LEFTMETA, KeyCode::KEY_D]);
    }

    #[test]
    fn test_parse_rejects_unknown_and_empty() {
        for bad in ["", "   ", "ctrl+", "ctrl+banana", "f13", "+"] {
            assert!(
                matches!(parse_shortcut(bad), Err(ShortcutError::Invalid(_))),
                "{bad:?} should be invalid"
            );
        }
    }

    #[test]
    fn test_chord_releases_in_reverse() {
        let events = chord_events(&[KeyCode::KEY_LEFTCTRL, KeyCode::KEY_C]);
        let summary: Vec<(u16, i32)> = events.iter().map(|e| (e.code(), e.value())).collect();
        assert_eq!(
            summary,
            vec![
                (KeyCode::KEY_LEFTCTRL.code(), KEY_PRESS),
                (KeyCode::KEY_C.code(), KEY_PRESS),
                (KeyCode::KEY_C.code(), KEY_RELEASE),
                (KeyCode::KEY_LEFTCTRL.code(), KEY_RELEASE),
            ]
        );
    }

    #[test]
    fn test_supported_keys_cover_parser() {
        let keys = supported_keys();
        for shortcut in ["ctrl+z", "alt+tab", "f12", "shift+9", "volumeup"] {
            for key in parse_shortcut(shortcut).unwrap() {
                assert!(keys.contains(key), "{key:?} not registered");
            }
        }
    }

    #[test]
    fn test_log_invoker_reports_execution_error() {
        let mut invoker = LogInvoker;
        assert!(matches!(invoker.send("ctrl+c"), Err(ShortcutError::Execution(_))));
        assert!(matches!(invoker.send("nope+x"), Err(ShortcutError::Invalid(_))));
    }
}
