//! Hex color parsing for button styling

/// An opaque RGB color parsed from `#RRGGBB`
///
/// `#AARRGGBB` is accepted too; the alpha byte is dropped because button
/// translucency comes from the definition's `opacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `RRGGBB`, `#AARRGGBB` or `AARRGGBB` (case-insensitive)
    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let rgb = match hex.len() {
            6 => hex,
            8 => &hex[2..],
            _ => return None,
        };
        let value = u32::from_str_radix(rgb, 16).ok()?;
        Some(Self::from_rgb24(value))
    }

    pub const fn from_rgb24(value: u32) -> Self {
        Self {
            r: ((value >> 16) & 0xFF) as u8,
            g: ((value >> 8) & 0xFF) as u8,
            b: (value & 0xFF) as u8,
        }
    }

    /// Packed 0x00RRGGBB, the pixel layout of a 24/32-bit TrueColor visual
    pub const fn rgb24(&self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    pub fn to_hex_string(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// Linear blend toward `over` by `coverage` (0.0..=1.0)
    pub fn blend(&self, over: HexColor, coverage: f32) -> HexColor {
        let mix = |a: u8, b: u8| -> u8 {
            let c = coverage.clamp(0.0, 1.0);
            (a as f32 * (1.0 - c) + b as f32 * c).round() as u8
        };
        HexColor::rgb(mix(self.r, over.r), mix(self.g, over.g), mix(self.b, over.b))
    }
}

/// Convert a 0.0..=1.0 opacity into the `_NET_WM_WINDOW_OPACITY` cardinal
pub fn opacity_to_cardinal(opacity: f32) -> u32 {
    (opacity.clamp(0.0, 1.0) as f64 * u32::MAX as f64).round() as u32
}
