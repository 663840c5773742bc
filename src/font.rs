//! TrueType label rasterization using fontdue (pure Rust)

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::font_discovery::find_font_path;

/// Rendered text as an 8-bit coverage mask (0 = transparent, 255 = solid)
#[derive(Debug, Default)]
pub struct TextMask {
    pub width: usize,
    pub height: usize,
    pub coverage: Vec<u8>,
}

impl TextMask {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn at(&self, x: usize, y: usize) -> u8 {
        self.coverage[y * self.width + x]
    }
}

#[derive(Debug)]
pub struct FontRenderer {
    font: Font,
    size: f32,
}

impl FontRenderer {
    /// Load a TrueType font from a file path
    pub fn from_path(path: PathBuf, size: f32) -> Result<Self> {
        let font_data = fs::read(&path)
            .with_context(|| format!("Failed to read font file: {}", path.display()))?;

        let font = Font::from_bytes(font_data, FontSettings::default())
            .map_err(|e| anyhow::anyhow!("Failed to parse font: {}", e))?;

        debug!(path = %path.display(), size = size, "Loaded font");
        Ok(Self { font, size })
    }

    /// Load font from a family (or "Family Style") name via fontconfig
    pub fn from_font_name(font_name: &str, size: f32) -> Result<Self> {
        let font_path = find_font_path(font_name)
            .with_context(|| format!("Failed to resolve font '{}'", font_name))?;
        Self::from_path(font_path, size)
    }

    /// Try to find and load a common system font
    pub fn from_system_font(size: f32) -> Result<Self> {
        // Compile-time font path (set by packaged builds via FONT_PATH)
        const FONT_PATH: Option<&str> = option_env!("FONT_PATH");
        if let Some(font_path) = FONT_PATH
            && let Ok(renderer) = Self::from_path(PathBuf::from(font_path), size)
        {
            return Ok(renderer);
        }

        if let Ok(renderer) = Self::from_font_name("Sans", size) {
            return Ok(renderer);
        }

        let font_paths = [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation/LiberationSans-Regular.ttf",
        ];

        for path in &font_paths {
            if let Ok(renderer) = Self::from_path(PathBuf::from(path), size) {
                return Ok(renderer);
            }
        }

        Err(anyhow::anyhow!(
            "Could not find any system fonts. Tried FONT_PATH ({:?}), fontconfig 'Sans' and {:?}",
            FONT_PATH,
            font_paths
        ))
    }

    /// Requested family, falling back to any system font
    pub fn resolve(family: &str, size: f32) -> Result<Self> {
        match Self::from_font_name(family, size) {
            Ok(renderer) => Ok(renderer),
            Err(e) => {
                warn!(
                    family = %family,
                    error = %format!("{e:#}"),
                    "Font unavailable, using system font"
                );
                let renderer = Self::from_system_font(size)?;
                info!(family = %family, "Loaded fallback font");
                Ok(renderer)
            }
        }
    }

    /// Rasterize `text`; lines split on '\n' are stacked and centered horizontally
    pub fn render_mask(&self, text: &str) -> TextMask {
        let line_metrics = self.font.horizontal_line_metrics(self.size);
        let (ascent, line_height) = match line_metrics {
            Some(m) => (m.ascent.ceil() as i32, m.new_line_size.ceil() as i32),
            None => (self.size.ceil() as i32, (self.size * 1.2).ceil() as i32),
        };

        let lines: Vec<&str> = text.lines().collect();
        if lines.is_empty() || line_height <= 0 {
            return TextMask::default();
        }

        let laid_out: Vec<(f32, Vec<(f32, fontdue::Metrics, Vec<u8>)>)> = lines
            .iter()
            .map(|line| {
                let mut x = 0.0f32;
                let glyphs = line
                    .chars()
                    .map(|ch| {
                        let (metrics, bitmap) = self.font.rasterize(ch, self.size);
                        let glyph = (x, metrics, bitmap);
                        x += metrics.advance_width;
                        glyph
                    })
                    .collect();
                (x, glyphs)
            })
            .collect();

        let width = laid_out
            .iter()
            .map(|(w, _)| w.ceil() as usize)
            .max()
            .unwrap_or(0);
        let height = line_height as usize * lines.len();
        if width == 0 || height == 0 {
            return TextMask::default();
        }

        let mut coverage = vec![0u8; width * height];
        for (row, (line_width, glyphs)) in laid_out.iter().enumerate() {
            let line_left = ((width as f32 - line_width) / 2.0).floor() as i32;
            let baseline = row as i32 * line_height + ascent;

            for (x, metrics, bitmap) in glyphs {
                let left = line_left + x.round() as i32 + metrics.xmin;
                let top = baseline - (metrics.height as i32 + metrics.ymin);
                for gy in 0..metrics.height {
                    for gx in 0..metrics.width {
                        let px = left + gx as i32;
                        let py = top + gy as i32;
                        if px < 0 || py < 0 || px >= width as i32 || py >= height as i32 {
                            continue;
                        }
                        let idx = py as usize * width + px as usize;
                        coverage[idx] = coverage[idx].max(bitmap[gy * metrics.width + gx]);
                    }
                }
            }
        }

        TextMask {
            width,
            height,
            coverage,
        }
    }
}
