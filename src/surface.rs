//! X11 window backing one overlay button
//!
//! Each button is an override-redirect window painted with a client-side
//! image: background, border and the fontdue-rendered label.

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::xproto::*;

use crate::color::{HexColor, opacity_to_cardinal};
use crate::config::ButtonDefinition;
use crate::constants::{button, x11};
use crate::font::FontRenderer;
use crate::overlay::{ButtonSurface, SurfaceFactory};
use crate::types::{Dimensions, Position, ScreenArea};
use crate::x11_utils::{self, AppContext};

/// Keep individual PutImage requests well under the core protocol limit
const MAX_IMAGE_CHUNK_BYTES: usize = 200_000;

#[derive(Debug)]
struct Style {
    label: String,
    background: HexColor,
    text: HexColor,
    border: HexColor,
    font_family: String,
    font_size: u32,
}

impl Style {
    fn from_definition(def: &ButtonDefinition) -> Self {
        Self {
            label: def.label.clone(),
            background: parse_or_default(&def.color, button::DEFAULT_COLOR, "color"),
            text: parse_or_default(&def.text_color, button::DEFAULT_TEXT_COLOR, "textColor"),
            border: parse_or_default(
                &def.border_color,
                button::DEFAULT_BORDER_COLOR,
                "borderColor",
            ),
            font_family: def.effective_font_family().to_string(),
            font_size: def.font_size,
        }
    }
}

fn parse_or_default(value: &str, default: &str, field: &str) -> HexColor {
    HexColor::parse(value).unwrap_or_else(|| {
        error!(field = field, value = %value, fallback = default, "Invalid color, using default");
        HexColor::parse(default).unwrap_or(HexColor::rgb(0, 0, 0))
    })
}

pub struct X11Surface<'a> {
    window: Window,
    gc: Gcontext,
    dimensions: Dimensions,
    mapped: bool,
    style: Option<Style>,
    font: Option<FontRenderer>,
    ctx: AppContext<'a>,
}

impl<'a> X11Surface<'a> {
    pub fn new(ctx: AppContext<'a>, def: &ButtonDefinition) -> Result<Self> {
        let window = ctx.conn.generate_id().context("Failed to generate X11 window ID")?;
        ctx.conn
            .create_window(
                ctx.screen.root_depth,
                window,
                ctx.screen.root,
                def.position.x as i16,
                def.position.y as i16,
                def.size.width as u16,
                def.size.height as u16,
                0,
                WindowClass::INPUT_OUTPUT,
                ctx.screen.root_visual,
                &CreateWindowAux::new()
                    .override_redirect(x11::OVERRIDE_REDIRECT)
                    .background_pixel(ctx.screen.black_pixel)
                    .event_mask(
                        EventMask::EXPOSURE
                            | EventMask::BUTTON_PRESS
                            | EventMask::BUTTON_RELEASE
                            | EventMask::POINTER_MOTION,
                    ),
            )
            .context(format!("Failed to create window for button '{}'", def.label))?;

        let gc = match ctx.conn.generate_id() {
            Ok(gc) => gc,
            Err(e) => {
                let _ = ctx.conn.destroy_window(window);
                return Err(e).context("Failed to generate ID for graphics context");
            }
        };
        if let Err(e) = ctx.conn.create_gc(gc, window, &CreateGCAux::new()) {
            let _ = ctx.conn.destroy_window(window);
            return Err(e).context(format!("Failed to create graphics context for '{}'", def.label));
        }

        debug!(window = window, id = %def.id, "Created button window");
        Ok(Self {
            window,
            gc,
            dimensions: def.size,
            mapped: false,
            style: None,
            font: None,
            ctx,
        })
    }

    fn load_font(&mut self, family: &str, size: u32) {
        let reuse = self.style.as_ref().is_some_and(|s| {
            s.font_family == family && s.font_size == size
        }) && self.font.is_some();
        if reuse {
            return;
        }
        self.font = match FontRenderer::resolve(family, size as f32) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!(
                    family = %family,
                    error = %format!("{e:#}"),
                    "No font available, label not drawn"
                );
                None
            }
        };
    }

    /// Compose background, border and label into a 0x00RRGGBB pixel buffer
    fn compose(&self, style: &Style) -> Vec<u32> {
        let width = self.dimensions.width as usize;
        let height = self.dimensions.height as usize;
        let border = x11::BORDER_WIDTH as usize;

        let mut pixels = vec![style.background.rgb24(); width * height];
        for y in 0..height {
            for x in 0..width {
                if x < border || y < border || x + border >= width || y + border >= height {
                    pixels[y * width + x] = style.border.rgb24();
                }
            }
        }

        let Some(font) = &self.font else {
            return pixels;
        };
        let mask = font.render_mask(&style.label);
        if mask.is_empty() {
            return pixels;
        }

        // Center the label; anything beyond the border is clipped
        let left = (width as i64 - mask.width as i64) / 2;
        let top = (height as i64 - mask.height as i64) / 2;
        for my in 0..mask.height {
            for mx in 0..mask.width {
                let coverage = mask.at(mx, my);
                if coverage == 0 {
                    continue;
                }
                let x = left + mx as i64;
                let y = top + my as i64;
                if x < border as i64
                    || y < border as i64
                    || x >= (width - border) as i64
                    || y >= (height - border) as i64
                {
                    continue;
                }
                let idx = y as usize * width + x as usize;
                pixels[idx] = style
                    .background
                    .blend(style.text, coverage as f32 / 255.0)
                    .rgb24();
            }
        }
        pixels
    }

    fn paint(&self) -> Result<()> {
        let Some(style) = &self.style else {
            return Ok(());
        };
        let pixels = self.compose(style);
        let width = self.dimensions.width as usize;
        if width == 0 {
            return Ok(());
        }

        // Z_PIXMAP, 32 bits per pixel, little-endian BGRx
        let rows_per_chunk = (MAX_IMAGE_CHUNK_BYTES / (width * 4)).max(1);
        for (chunk_index, rows) in pixels.chunks(width * rows_per_chunk).enumerate() {
            let mut image_data = Vec::with_capacity(rows.len() * 4);
            for pixel in rows {
                image_data.extend_from_slice(&pixel.to_le_bytes());
            }
            let chunk_height = rows.len() / width;
            self.ctx
                .conn
                .put_image(
                    ImageFormat::Z_PIXMAP,
                    self.window,
                    self.gc,
                    width as u16,
                    chunk_height as u16,
                    0,
                    (chunk_index * rows_per_chunk) as i16,
                    0,
                    self.ctx.screen.root_depth,
                    &image_data,
                )
                .context(format!("Failed to upload image for '{}'", style.label))?;
        }
        self.ctx.conn.flush().context("Failed to flush X11 connection after paint")?;
        Ok(())
    }
}

impl ButtonSurface for X11Surface<'_> {
    type Handle = Window;

    fn handle(&self) -> Window {
        self.window
    }

    fn move_to(&mut self, position: Position) -> Result<()> {
        self.ctx
            .conn
            .configure_window(self.window, &ConfigureWindowAux::new().x(position.x).y(position.y))
            .context(format!(
                "Failed to move window {} to ({}, {})",
                self.window, position.x, position.y
            ))?;
        self.ctx
            .conn
            .flush()
            .context("Failed to flush X11 connection after move")?;
        Ok(())
    }

    fn apply_style(&mut self, definition: &ButtonDefinition) -> Result<()> {
        self.load_font(definition.effective_font_family(), definition.font_size);
        self.dimensions = definition.size;
        self.style = Some(Style::from_definition(definition));

        self.ctx
            .conn
            .configure_window(
                self.window,
                &ConfigureWindowAux::new()
                    .x(definition.position.x)
                    .y(definition.position.y)
                    .width(definition.size.width)
                    .height(definition.size.height),
            )
            .context(format!("Failed to configure window for '{}'", definition.label))?;
        x11_utils::set_opacity(&self.ctx, self.window, opacity_to_cardinal(definition.opacity))?;

        if !self.mapped {
            self.ctx
                .conn
                .map_window(self.window)
                .context(format!("Failed to map window for '{}'", definition.label))?;
            self.mapped = true;
            info!(window = self.window, label = %definition.label, "Mapped button window");
        }
        self.paint()
    }

    fn repaint(&mut self) -> Result<()> {
        self.paint()
    }

    fn available_area(&self) -> ScreenArea {
        x11_utils::available_area(&self.ctx)
    }

    fn make_non_activating(&mut self) -> Result<()> {
        x11_utils::make_non_activating(&self.ctx, self.window)
    }
}

impl Drop for X11Surface<'_> {
    fn drop(&mut self) {
        // Clean up each resource independently so one failure does not leak the rest
        if let Err(e) = self.ctx.conn.free_gc(self.gc) {
            error!("Failed to free GC {}: {}", self.gc, e);
        }
        if let Err(e) = self.ctx.conn.destroy_window(self.window) {
            error!("Failed to destroy window {}: {}", self.window, e);
        }
        if let Err(e) = self.ctx.conn.flush() {
            error!("Failed to flush X11 connection during cleanup: {}", e);
        }
    }
}

pub struct X11SurfaceFactory<'a> {
    ctx: AppContext<'a>,
}

impl<'a> X11SurfaceFactory<'a> {
    pub fn new(ctx: AppContext<'a>) -> Self {
        Self { ctx }
    }
}

impl<'a> SurfaceFactory for X11SurfaceFactory<'a> {
    type Surface = X11Surface<'a>;

    fn create(&mut self, definition: &ButtonDefinition) -> Result<X11Surface<'a>> {
        X11Surface::new(self.ctx, definition)
    }
}
