use std::time::Instant;
use tracing::warn;
use x11rb::protocol::Event;

use crate::overlay::{OverlayManager, PointerEvent};
use crate::surface::X11SurfaceFactory;
use crate::types::Position;

/// Translate one X11 event into overlay input
pub fn handle_event(
    manager: &mut OverlayManager<X11SurfaceFactory<'_>>,
    event: Event,
    now: Instant,
) {
    match event {
        Event::ButtonPress(event) => {
            manager.handle_pointer(
                event.event,
                PointerEvent::Press {
                    button: event.detail,
                    local: Position::new(event.event_x as i32, event.event_y as i32),
                    global: Position::new(event.root_x as i32, event.root_y as i32),
                },
                now,
            );
        }
        Event::MotionNotify(event) => {
            manager.handle_pointer(
                event.event,
                PointerEvent::Motion {
                    global: Position::new(event.root_x as i32, event.root_y as i32),
                },
                now,
            );
        }
        Event::ButtonRelease(event) => {
            manager.handle_pointer(
                event.event,
                PointerEvent::Release {
                    button: event.detail,
                    global: Position::new(event.root_x as i32, event.root_y as i32),
                },
                now,
            );
        }
        Event::Expose(event) if event.count == 0 => {
            manager.repaint(event.window);
        }
        Event::Error(e) => {
            warn!(error = ?e, "X11 error event");
        }
        _ => (),
    }
}
