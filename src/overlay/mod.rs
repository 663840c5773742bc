//! Overlay buttons and the manager that owns them

pub mod button;
pub mod debounce;
pub mod manager;

pub use button::{
    ButtonEvent, ButtonSurface, NullSurface, NullSurfaceFactory, OverlayButton, PointerEvent,
    SurfaceFactory,
};
pub use manager::OverlayManager;
