use anyhow::{Context, Result};
use tracing::debug;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as WrapperExt;

use crate::constants::x11;
use crate::types::ScreenArea;

/// Application context holding immutable shared state
#[derive(Clone, Copy)]
pub struct AppContext<'a> {
    pub conn: &'a RustConnection,
    pub screen: &'a Screen,
    pub atoms: &'a CachedAtoms,
}

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub net_wm_state: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_state_skip_taskbar: Atom,
    pub net_wm_state_skip_pager: Atom,
    pub net_wm_window_opacity: Atom,
    pub net_workarea: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .context(format!("Failed to intern {name} atom"))?
        .reply()
        .context(format!("Failed to get reply for {name} atom"))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        // Do all intern_atom roundtrips once at startup
        Ok(Self {
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_above: intern(conn, "_NET_WM_STATE_ABOVE")?,
            net_wm_state_skip_taskbar: intern(conn, "_NET_WM_STATE_SKIP_TASKBAR")?,
            net_wm_state_skip_pager: intern(conn, "_NET_WM_STATE_SKIP_PAGER")?,
            net_wm_window_opacity: intern(conn, "_NET_WM_WINDOW_OPACITY")?,
            net_workarea: intern(conn, "_NET_WORKAREA")?,
        })
    }
}

/// Usable screen extent: right/bottom edge of `_NET_WORKAREA`, or the root size
pub fn available_area(ctx: &AppContext) -> ScreenArea {
    let fallback = ScreenArea::new(
        ctx.screen.width_in_pixels as u32,
        ctx.screen.height_in_pixels as u32,
    );

    let workarea = ctx
        .conn
        .get_property(false, ctx.screen.root, ctx.atoms.net_workarea, AtomEnum::CARDINAL, 0, 4)
        .ok()
        .and_then(|cookie| cookie.reply().ok())
        .and_then(|reply| reply.value32().map(|values| values.collect::<Vec<u32>>()));

    match workarea.as_deref() {
        Some([x, y, width, height]) if *width > 0 && *height > 0 => {
            ScreenArea::new(x + width, y + height)
        }
        _ => {
            debug!("No _NET_WORKAREA, using root window size");
            fallback
        }
    }
}

/// Keep `window` out of focus handling, taskbars and pagers, and above other windows
pub fn make_non_activating(ctx: &AppContext, window: Window) -> Result<()> {
    // WM_HINTS: flags = InputHint, input = False
    let mut hints = [0u32; x11::WM_HINTS_LEN];
    hints[0] = x11::WM_HINTS_INPUT_FLAG;
    ctx.conn
        .change_property32(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_HINTS,
            AtomEnum::WM_HINTS,
            &hints,
        )
        .context(format!("Failed to set WM_HINTS on window {window}"))?;

    ctx.conn
        .change_property32(
            PropMode::REPLACE,
            window,
            ctx.atoms.net_wm_state,
            AtomEnum::ATOM,
            &[
                ctx.atoms.net_wm_state_above,
                ctx.atoms.net_wm_state_skip_taskbar,
                ctx.atoms.net_wm_state_skip_pager,
            ],
        )
        .context(format!("Failed to set _NET_WM_STATE on window {window}"))?;

    ctx.conn
        .change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_CLASS,
            AtomEnum::STRING,
            x11::WM_CLASS,
        )
        .context(format!("Failed to set WM_CLASS on window {window}"))?;

    ctx.conn
        .configure_window(window, &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE))
        .context(format!("Failed to raise window {window}"))?;
    Ok(())
}

pub fn set_opacity(ctx: &AppContext, window: Window, cardinal: u32) -> Result<()> {
    ctx.conn
        .change_property32(
            PropMode::REPLACE,
            window,
            ctx.atoms.net_wm_window_opacity,
            AtomEnum::CARDINAL,
            &[cardinal],
        )
        .context(format!("Failed to set window opacity on window {window}"))?;
    Ok(())
}
