//! Button definition: the persisted attribute set of one overlay button

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::constants::button::*;
use crate::types::{Dimensions, Position};

/// Opaque, immutable identifier; the only key shared by live buttons and the saved list
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonId(String);

static ID_COUNTER: AtomicU32 = AtomicU32::new(0);

impl ButtonId {
    /// Mint a fresh id (time + pid + per-process counter, hex encoded)
    pub fn generate() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        let count = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:016x}{:08x}{:08x}", nanos, std::process::id(), count))
    }
}

impl From<&str> for ButtonId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for ButtonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One overlay button as stored in a profile file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonDefinition {
    pub id: ButtonId,
    pub label: String,
    #[serde(rename = "fontFamily", default = "default_font_family")]
    pub font_family: String,
    pub shortcut: String,
    pub position: Position,
    pub size: Dimensions,
    pub color: String,
    #[serde(rename = "textColor")]
    pub text_color: String,
    #[serde(rename = "borderColor")]
    pub border_color: String,
    pub opacity: f32,
    /// Font size in pixels (accepts integer or float)
    #[serde(rename = "fontSize", deserialize_with = "deserialize_font_size")]
    pub font_size: u32,
    #[serde(default)]
    pub position_lock: bool,
}

fn default_font_family() -> String {
    DEFAULT_FONT_FAMILY.to_string()
}

/// Custom deserializer that accepts both integer and float for fontSize
fn deserialize_font_size<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrFloat {
        Int(u32),
        Float(f64),
    }

    match IntOrFloat::deserialize(deserializer)? {
        IntOrFloat::Int(i) => Ok(i),
        IntOrFloat::Float(f) if f.is_finite() && f >= 0.0 => Ok(f.round() as u32),
        IntOrFloat::Float(f) => Err(serde::de::Error::custom(format!("invalid fontSize {f}"))),
    }
}

impl ButtonDefinition {
    /// A fresh button with the editor's defaults and a new id
    pub fn new_default() -> Self {
        Self {
            id: ButtonId::generate(),
            label: DEFAULT_LABEL.to_string(),
            font_family: default_font_family(),
            shortcut: String::new(),
            position: Position::new(DEFAULT_POSITION.0, DEFAULT_POSITION.1),
            size: Dimensions::new(DEFAULT_SIZE.0, DEFAULT_SIZE.1),
            color: DEFAULT_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            border_color: DEFAULT_BORDER_COLOR.to_string(),
            opacity: DEFAULT_OPACITY,
            font_size: DEFAULT_FONT_SIZE,
            position_lock: false,
        }
    }

    /// Copy with a new id, a "copy" label and a small offset so both stay visible
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = ButtonId::generate();
        copy.label = next_copy_label(&self.label);
        copy.position = self.position.offset(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
        copy
    }

    /// Font family to render with; blank values fall back to the default
    pub fn effective_font_family(&self) -> &str {
        if self.font_family.trim().is_empty() {
            DEFAULT_FONT_FAMILY
        } else {
            &self.font_family
        }
    }

    /// Clamp values into their valid ranges after loading
    /// Returns true if anything was corrected
    pub fn normalize(&mut self) -> bool {
        let mut changed = false;

        if self.font_family.trim().is_empty() {
            warn!(id = %self.id, "fontFamily is blank, using default");
            self.font_family = default_font_family();
            changed = true;
        }

        // X11 window coordinates are 16-bit
        let x = self.position.x.clamp(i16::MIN as i32, i16::MAX as i32);
        let y = self.position.y.clamp(i16::MIN as i32, i16::MAX as i32);
        if x != self.position.x || y != self.position.y {
            warn!(
                id = %self.id,
                x = self.position.x,
                y = self.position.y,
                "position out of range, clamping"
            );
            self.position = Position::new(x, y);
            changed = true;
        }

        let width = self.size.width.clamp(MIN_SIZE, MAX_SIZE);
        let height = self.size.height.clamp(MIN_SIZE, MAX_SIZE);
        if width != self.size.width || height != self.size.height {
            warn!(
                id = %self.id,
                width = self.size.width,
                height = self.size.height,
                min = MIN_SIZE,
                max = MAX_SIZE,
                "size out of range, clamping"
            );
            self.size = Dimensions::new(width, height);
            changed = true;
        }

        if !self.opacity.is_finite() {
            warn!(id = %self.id, "opacity is not a number, using default");
            self.opacity = DEFAULT_OPACITY;
            changed = true;
        } else if !(MIN_OPACITY..=MAX_OPACITY).contains(&self.opacity) {
            warn!(id = %self.id, opacity = self.opacity, "opacity out of range, clamping");
            self.opacity = self.opacity.clamp(MIN_OPACITY, MAX_OPACITY);
            changed = true;
        }

        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&self.font_size) {
            warn!(id = %self.id, font_size = self.font_size, "fontSize out of range, clamping");
            self.font_size = self.font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
            changed = true;
        }

        changed
    }
}

/// "Btn" -> "Btn copy" -> "Btn copy2" -> "Btn copy3"
pub fn next_copy_label(label: &str) -> String {
    let stem = label.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &label[stem.len()..];

    let is_copy = stem == COPY_SUFFIX || stem.ends_with(&format!(" {COPY_SUFFIX}"));
    if is_copy {
        let next = digits.parse::<u32>().map(|n| n.saturating_add(1)).unwrap_or(2);
        format!("{stem}{next}")
    } else if label.is_empty() {
        COPY_SUFFIX.to_string()
    } else {
        format!("{label} {COPY_SUFFIX}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_json() -> &'static str {
        r##"{
            "id": "abc",
            "label": "Save",
            "fontFamily": "Noto Sans",
            "shortcut": "ctrl+s",
            "position": [10, 20],
            "size": [150, 100],
            "color": "#2196F3",
            "textColor": "#ffffff",
            "borderColor": "#1976D2",
            "opacity": 0.8,
            "fontSize": 20,
            "position_lock": true
        }"##
    }

    #[test]
    fn test_deserialize_full_definition() {
        let def: ButtonDefinition = serde_json::from_str(sample_json()).unwrap();
        assert_eq!(def.id, ButtonId::from("abc"));
        assert_eq!(def.position, Position::new(10, 20));
        assert_eq!(def.size, Dimensions::new(150, 100));
        assert_eq!(def.font_family, "Noto Sans");
        assert!(def.position_lock);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r##"{
            "id": "x", "label": "L", "shortcut": "", "position": [0, 0], "size": [50, 50],
            "color": "#000000", "textColor": "#ffffff", "borderColor": "#000000",
            "opacity": 1.0, "fontSize": 12
        }"##;
        let def: ButtonDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(def.font_family, DEFAULT_FONT_FAMILY);
        assert!(!def.position_lock);
    }

    #[test]
    fn test_font_size_accepts_float() {
        let json = sample_json().replace("\"fontSize\": 20", "\"fontSize\": 18.0");
        let def: ButtonDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(def.font_size, 18);
    }

    #[test]
    fn test_missing_required_field_is_an_error() {
        let json = r#"{ "id": "x", "label": "L" }"#;
        assert!(serde_json::from_str::<ButtonDefinition>(json).is_err());
    }

    #[test]
    fn test_serialized_keys_match_file_format() {
        let def = ButtonDefinition::new_default();
        let value = serde_json::to_value(&def).unwrap();
        for key in ["id", "label", "fontFamily", "shortcut", "position", "size", "color",
                    "textColor", "borderColor", "opacity", "fontSize", "position_lock"] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ButtonId::generate();
        let b = ButtonId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_copy_label_sequence() {
        assert_eq!(next_copy_label("Btn"), "Btn copy");
        assert_eq!(next_copy_label("Btn copy"), "Btn copy2");
        assert_eq!(next_copy_label("Btn copy2"), "Btn copy3");
        assert_eq!(next_copy_label("Btn copy9"), "Btn copy10");
    }

    #[test]
    fn test_copy_label_plain_trailing_digits() {
        assert_eq!(next_copy_label("F5"), "F5 copy");
        assert_eq!(next_copy_label(""), "copy");
        assert_eq!(next_copy_label("Recopy"), "Recopy copy");
    }

    #[test]
    fn test_duplicate_offsets_and_renames() {
        let source = ButtonDefinition::new_default();
        let dup = source.duplicate();
        assert_ne!(dup.id, source.id);
        assert_eq!(dup.label, "New Button copy");
        assert_eq!(dup.position, Position::new(220, 220));
        assert_eq!(dup.shortcut, source.shortcut);
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        let mut def = ButtonDefinition::new_default();
        def.size = Dimensions::new(5, 5000);
        def.opacity = 0.0;
        def.font_size = 0;
        def.font_family = "   ".to_string();

        assert!(def.normalize());
        assert_eq!(def.size, Dimensions::new(MIN_SIZE, MAX_SIZE));
        assert_eq!(def.opacity, MIN_OPACITY);
        assert_eq!(def.font_size, MIN_FONT_SIZE);
        assert_eq!(def.font_family, DEFAULT_FONT_FAMILY);
    }

    #[test]
    fn test_normalize_clamps_position_to_window_range() {
        let mut def = ButtonDefinition::new_default();
        def.position = Position::new(i32::MIN, 70_000);

        assert!(def.normalize());
        assert_eq!(def.position, Position::new(-32768, 32767));
    }

    #[test]
    fn test_normalize_leaves_valid_definition_alone() {
        let mut def = ButtonDefinition::new_default();
        let before = def.clone();
        assert!(!def.normalize());
        assert_eq!(def, before);
    }

    #[test]
    fn test_effective_font_family_fallback() {
        let mut def = ButtonDefinition::new_default();
        def.font_family = String::new();
        assert_eq!(def.effective_font_family(), DEFAULT_FONT_FAMILY);
    }
}
