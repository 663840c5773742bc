//! One on-screen button: pointer state machine plus its platform surface

use anyhow::Result;
use std::fmt;
use std::sync::mpsc::Sender;
use tracing::debug;

use crate::config::{ButtonDefinition, ButtonId};
use crate::constants::{interaction, mouse};
use crate::types::{Dimensions, Position, ScreenArea};

/// Native window backing a button
pub trait ButtonSurface {
    /// Key used to route platform events back to the owning button
    type Handle: Copy + Eq + fmt::Debug;

    fn handle(&self) -> Self::Handle;
    fn move_to(&mut self, position: Position) -> Result<()>;
    /// Size, colors, label, font and opacity
    fn apply_style(&mut self, definition: &ButtonDefinition) -> Result<()>;
    /// Redraw with the current style (after exposure)
    fn repaint(&mut self) -> Result<()>;
    /// Usable geometry of the screen the surface is on
    fn available_area(&self) -> ScreenArea;
    /// Never take focus, float above other windows, stay out of taskbars and switchers
    fn make_non_activating(&mut self) -> Result<()>;
}

/// Creates one surface per button definition
pub trait SurfaceFactory {
    type Surface: ButtonSurface;

    fn create(&mut self, definition: &ButtonDefinition) -> Result<Self::Surface>;
}

/// Pointer input already translated out of the platform's event types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerEvent {
    Press {
        button: u8,
        local: Position,
        global: Position,
    },
    Motion {
        global: Position,
    },
    Release {
        button: u8,
        global: Position,
    },
}

/// Sent from a button to the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonEvent {
    PositionChanged { id: ButtonId, position: Position },
    Activated(ButtonId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Press {
    pub local: Position,
    pub global: Position,
    /// Pointer position relative to the button's top-left
    pub offset: Position,
    pub area: ScreenArea,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Button down, not yet classified as click or drag
    PressedPending(Press),
    Dragging(Press),
}

pub struct OverlayButton<S: ButtonSurface> {
    id: ButtonId,
    position: Position,
    size: Dimensions,
    locked: bool,
    state: DragState,
    surface: S,
    events: Sender<ButtonEvent>,
}

impl<S: ButtonSurface> OverlayButton<S> {
    pub fn new(definition: &ButtonDefinition, surface: S, events: Sender<ButtonEvent>) -> Self {
        Self {
            id: definition.id.clone(),
            position: definition.position,
            size: definition.size,
            locked: definition.position_lock,
            state: DragState::Idle,
            surface,
            events,
        }
    }

    pub fn id(&self) -> &ButtonId {
        &self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> Result<()> {
        match (event, self.state) {
            (PointerEvent::Press { button, local, global }, DragState::Idle) => {
                if button != mouse::BUTTON_LEFT {
                    return Ok(());
                }
                self.state = DragState::PressedPending(Press {
                    local,
                    global,
                    offset: global - self.position,
                    area: self.surface.available_area(),
                });
            }
            (PointerEvent::Motion { .. }, DragState::PressedPending(_) | DragState::Dragging(_))
                if self.locked => {}
            (PointerEvent::Motion { global }, DragState::PressedPending(press))
            | (PointerEvent::Motion { global }, DragState::Dragging(press)) => {
                self.state = DragState::Dragging(press);
                self.drag_to(global, &press)?;
            }
            (PointerEvent::Release { button, global }, DragState::PressedPending(press))
            | (PointerEvent::Release { button, global }, DragState::Dragging(press)) => {
                if button != mouse::BUTTON_LEFT {
                    return Ok(());
                }
                self.state = DragState::Idle;
                if global.manhattan_distance(press.global) < interaction::CLICK_THRESHOLD {
                    self.emit(ButtonEvent::Activated(self.id.clone()));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn drag_to(&mut self, pointer: Position, press: &Press) -> Result<()> {
        let target = press.area.clamp(pointer - press.offset, self.size);
        if target == self.position {
            return Ok(());
        }
        self.position = target;
        self.surface.move_to(target)?;
        self.emit(ButtonEvent::PositionChanged {
            id: self.id.clone(),
            position: target,
        });
        Ok(())
    }

    fn emit(&self, event: ButtonEvent) {
        if self.events.send(event).is_err() {
            debug!(id = %self.id, "Button event dropped, manager gone");
        }
    }
}

impl<S: ButtonSurface> fmt::Debug for OverlayButton<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayButton")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("locked", &self.locked)
            .field("state", &self.state)
            .field("surface", &self.surface.handle())
            .finish()
    }
}

/// Surface that does nothing; used headless and in tests
#[derive(Debug, Clone)]
pub struct NullSurface {
    handle: u32,
    area: ScreenArea,
    pub moves: Vec<Position>,
    pub styled: usize,
    pub non_activating: bool,
}

impl NullSurface {
    pub fn new(handle: u32, area: ScreenArea) -> Self {
        Self {
            handle,
            area,
            moves: Vec::new(),
            styled: 0,
            non_activating: false,
        }
    }
}

impl ButtonSurface for NullSurface {
    type Handle = u32;

    fn handle(&self) -> u32 {
        self.handle
    }

    fn move_to(&mut self, position: Position) -> Result<()> {
        self.moves.push(position);
        Ok(())
    }

    fn apply_style(&mut self, _definition: &ButtonDefinition) -> Result<()> {
        self.styled += 1;
        Ok(())
    }

    fn repaint(&mut self) -> Result<()> {
        Ok(())
    }

    fn available_area(&self) -> ScreenArea {
        self.area
    }

    fn make_non_activating(&mut self) -> Result<()> {
        self.non_activating = true;
        Ok(())
    }
}

#[derive(Debug)]
pub struct NullSurfaceFactory {
    area: ScreenArea,
    next_handle: u32,
}

impl NullSurfaceFactory {
    pub fn new(area: ScreenArea) -> Self {
        Self {
            area,
            next_handle: 1,
        }
    }
}

impl SurfaceFactory for NullSurfaceFactory {
    type Surface = NullSurface;

    fn create(&mut self, _definition: &ButtonDefinition) -> Result<NullSurface> {
        let surface = NullSurface::new(self.next_handle, self.area);
        self.next_handle += 1;
        Ok(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{self, Receiver};

    const SCREEN: ScreenArea = ScreenArea::new(800, 600);

    fn button(locked: bool) -> (OverlayButton<NullSurface>, Receiver<ButtonEvent>) {
        let mut def = ButtonDefinition::new_default();
        def.position = Position::new(100, 100);
        def.size = Dimensions::new(150, 100);
        def.position_lock = locked;
        let (tx, rx) = mpsc::channel();
        (OverlayButton::new(&def, NullSurface::new(1, SCREEN), tx), rx)
    }

    fn press(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Press {
            button: mouse::BUTTON_LEFT,
            local: Position::new(x - 100, y - 100),
            global: Position::new(x, y),
        }
    }

    fn motion(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Motion { global: Position::new(x, y) }
    }

    fn release(x: i32, y: i32) -> PointerEvent {
        PointerEvent::Release {
            button: mouse::BUTTON_LEFT,
            global: Position::new(x, y),
        }
    }

    fn drain(rx: &Receiver<ButtonEvent>) -> Vec<ButtonEvent> {
        rx.try_iter().collect()
    }

    fn activations(events: &[ButtonEvent]) -> usize {
        events.iter().filter(|e| matches!(e, ButtonEvent::Activated(_))).count()
    }

    #[test]
    fn test_press_records_offset() {
        let (mut b, _rx) = button(false);
        b.handle_pointer(press(130, 110)).unwrap();
        match b.state() {
            DragState::PressedPending(p) => {
                assert_eq!(p.offset, Position::new(30, 10));
                assert_eq!(p.local, Position::new(30, 10));
                assert_eq!(p.area, SCREEN);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn test_click_without_motion_activates_once() {
        let (mut b, rx) = button(false);
        b.handle_pointer(press(120, 120)).unwrap();
        b.handle_pointer(release(120, 120)).unwrap();

        let events = drain(&rx);
        assert_eq!(events, vec![ButtonEvent::Activated(b.id().clone())]);
        assert_eq!(b.state(), DragState::Idle);
    }

    #[test]
    fn test_one_pixel_jitter_is_still_a_click() {
        let (mut b, rx) = button(false);
        b.handle_pointer(press(120, 120)).unwrap();
        b.handle_pointer(motion(121, 120)).unwrap();
        b.handle_pointer(release(121, 120)).unwrap();

        let events = drain(&rx);
        assert_eq!(activations(&events), 1);
    }

    #[test]
    fn test_drag_of_two_pixels_does_not_activate() {
        let (mut b, rx) = button(false);
        b.handle_pointer(press(120, 120)).unwrap();
        b.handle_pointer(motion(121, 121)).unwrap();
        b.handle_pointer(release(121, 121)).unwrap();

        let events = drain(&rx);
        assert_eq!(activations(&events), 0);
        assert_eq!(b.position(), Position::new(101, 101));
    }

    #[test]
    fn test_drag_moves_surface_and_reports_every_step() {
        let (mut b, rx) = button(false);
        b.handle_pointer(press(110, 110)).unwrap();
        b.handle_pointer(motion(115, 110)).unwrap();
        b.handle_pointer(motion(120, 130)).unwrap();
        b.handle_pointer(release(120, 130)).unwrap();

        let id = b.id().clone();
        assert_eq!(
            drain(&rx),
            vec![
                ButtonEvent::PositionChanged { id: id.clone(), position: Position::new(105, 100) },
                ButtonEvent::PositionChanged { id, position: Position::new(110, 120) },
            ]
        );
        assert_eq!(b.surface().moves, vec![Position::new(105, 100), Position::new(110, 120)]);
    }

    #[test]
    fn test_drag_off_screen_is_clamped() {
        let (mut b, rx) = button(false);
        b.handle_pointer(press(110, 110)).unwrap();
        for (x, y) in [(-500, -500), (5000, 40), (300, 9000), (-1, 599)] {
            b.handle_pointer(motion(x, y)).unwrap();
            let p = b.position();
            assert!((0..=650).contains(&p.x), "x out of bounds: {p:?}");
            assert!((0..=500).contains(&p.y), "y out of bounds: {p:?}");
        }
        b.handle_pointer(release(-1, 599)).unwrap();

        for event in drain(&rx) {
            if let ButtonEvent::PositionChanged { position, .. } = event {
                assert!((0..=650).contains(&position.x) && (0..=500).contains(&position.y));
            }
        }
        assert_eq!(b.position(), Position::new(0, 500));
    }

    #[test]
    fn test_locked_button_never_moves_but_clicks() {
        let (mut b, rx) = button(true);
        b.handle_pointer(press(120, 120)).unwrap();
        b.handle_pointer(motion(400, 400)).unwrap();
        assert!(matches!(b.state(), DragState::PressedPending(_)));
        b.handle_pointer(release(400, 400)).unwrap();
        assert!(drain(&rx).is_empty());

        b.handle_pointer(press(120, 120)).unwrap();
        b.handle_pointer(motion(300, 300)).unwrap();
        b.handle_pointer(release(120, 120)).unwrap();

        let events = drain(&rx);
        assert_eq!(events, vec![ButtonEvent::Activated(b.id().clone())]);
        assert_eq!(b.position(), Position::new(100, 100));
        assert!(b.surface().moves.is_empty());
    }

    #[test]
    fn test_other_buttons_and_stray_releases_are_ignored() {
        let (mut b, rx) = button(false);
        b.handle_pointer(PointerEvent::Press {
            button: mouse::BUTTON_RIGHT,
            local: Position::new(0, 0),
            global: Position::new(100, 100),
        })
        .unwrap();
        assert_eq!(b.state(), DragState::Idle);

        b.handle_pointer(motion(300, 300)).unwrap();
        b.handle_pointer(release(100, 100)).unwrap();
        assert!(drain(&rx).is_empty());
        assert_eq!(b.position(), Position::new(100, 100));
    }

    #[test]
    fn test_locking_mid_drag_stops_movement() {
        let (mut b, rx) = button(false);
        b.handle_pointer(press(110, 110)).unwrap();
        b.handle_pointer(motion(120, 110)).unwrap();
        assert!(matches!(b.state(), DragState::Dragging(_)));
        drain(&rx);

        b.set_locked(true);
        b.handle_pointer(motion(300, 300)).unwrap();
        assert!(drain(&rx).is_empty());
        assert_eq!(b.position(), Position::new(110, 100));
        assert_eq!(b.surface().moves, vec![Position::new(110, 100)]);

        b.handle_pointer(release(300, 300)).unwrap();
        assert_eq!(b.state(), DragState::Idle);
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_press_on_button_at_extreme_position() {
        let mut def = ButtonDefinition::new_default();
        def.position = Position::new(i32::MIN, 0);
        let (tx, rx) = mpsc::channel();
        let mut b = OverlayButton::new(&def, NullSurface::new(1, SCREEN), tx);

        b.handle_pointer(PointerEvent::Press {
            button: mouse::BUTTON_LEFT,
            local: Position::new(5, 5),
            global: Position::new(5, 5),
        })
        .unwrap();
        b.handle_pointer(motion(200, 200)).unwrap();
        b.handle_pointer(release(200, 200)).unwrap();

        let p = b.position();
        assert!((0..=650).contains(&p.x) && (0..=500).contains(&p.y), "{p:?}");
        assert_eq!(activations(&drain(&rx)), 0);
    }

    #[test]
    fn test_unlocking_mid_press_allows_drag() {
        let (mut b, rx) = button(true);
        b.handle_pointer(press(120, 120)).unwrap();
        b.set_locked(false);
        b.handle_pointer(motion(130, 120)).unwrap();
        assert!(matches!(b.state(), DragState::Dragging(_)));
        assert_eq!(drain(&rx).len(), 1);
    }
}
