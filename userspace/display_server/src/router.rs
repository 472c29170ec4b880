use crate::consts::CURSOR_RESIZE_WIDTH;
use crate::error::Result;
use crate::registry::{Repaint, WindowRegistry};
use crate::window::Window;
use bitflags::bitflags;
use display_api_types::MouseButtons;
use display_api_types::input::{KeyboardEvent, MouseEvent};
use display_api_types::window::{CursorShape, WindowEvent, WindowId, WindowStyle};
use embedded_graphics::geometry::{Point, Size};

bitflags! {
    /// Resize grab zones of a window under the pointer.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct BorderZone: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const BOTTOM = 1 << 2;
    }
}

impl BorderZone {
    /// Zones of `w` that contain `(x, y)`. Only normal windows can be
    /// resized, and never from the title bar.
    pub fn of(w: &Window, x: i32, y: i32) -> Self {
        let mut zone = BorderZone::empty();
        if w.style != WindowStyle::Default || !w.contains(x, y) {
            return zone;
        }
        if y < w.rect.y.saturating_add_unsigned(w.title_bar_height) {
            return zone;
        }
        zone.set(BorderZone::LEFT, x < w.rect.x + CURSOR_RESIZE_WIDTH);
        zone.set(BorderZone::RIGHT, x >= w.rect.end_x() - CURSOR_RESIZE_WIDTH);
        zone.set(BorderZone::BOTTOM, y >= w.rect.end_y() - CURSOR_RESIZE_WIDTH);
        zone
    }

    /// On narrow windows left and right overlap; right wins.
    pub fn cursor_shape(self) -> CursorShape {
        let bottom = self.contains(BorderZone::BOTTOM);
        if self.contains(BorderZone::RIGHT) {
            if bottom {
                CursorShape::ResizeBottomRight
            } else {
                CursorShape::ResizeRight
            }
        } else if self.contains(BorderZone::LEFT) {
            if bottom {
                CursorShape::ResizeBottomLeft
            } else {
                CursorShape::ResizeLeft
            }
        } else if bottom {
            CursorShape::ResizeVertical
        } else {
            CursorShape::Default
        }
    }
}

/// What a mouse event did to the pointer and the window stack.
#[derive(Debug, PartialEq, Eq)]
pub struct MouseRoute {
    pub pointer: Point,
    pub shape: CursorShape,
    /// Set when a click raised a window.
    pub repaints: Vec<Repaint>,
    pub target: Option<WindowId>,
}

/// Pointer position, held buttons and the window a drag is captured by.
pub struct EventRouter {
    pointer: Point,
    buttons: MouseButtons,
    captured: Option<WindowId>,
    shape: CursorShape,
}

impl EventRouter {
    pub fn new(pointer: Point) -> Self {
        Self {
            pointer,
            buttons: MouseButtons::empty(),
            captured: None,
            shape: CursorShape::Default,
        }
    }

    pub fn pointer(&self) -> Point {
        self.pointer
    }

    pub fn captured(&self) -> Option<WindowId> {
        self.captured
    }

    pub fn shape(&self) -> CursorShape {
        self.shape
    }

    /// After a mode switch: pull the pointer onto the new screen and drop any drag.
    pub fn reset(&mut self, screen: Size) {
        self.pointer = clamp(self.pointer, screen);
        self.buttons = MouseButtons::empty();
        self.captured = None;
        self.shape = CursorShape::Default;
    }

    /// The window is gone; a drag it captured ends.
    pub fn forget(&mut self, id: WindowId) {
        if self.captured == Some(id) {
            self.captured = None;
        }
    }

    /// Move the pointer, handle press/release and forward the motion.
    ///
    /// Input `dy` is positive upwards; the event sent to the window uses
    /// screen orientation (positive downwards).
    pub fn handle_mouse(
        &mut self,
        registry: &mut WindowRegistry,
        screen: Size,
        event: &MouseEvent,
    ) -> Result<MouseRoute> {
        let dx = i32::from(event.dx);
        let dy = -i32::from(event.dy);
        let pointer = clamp(self.pointer + Point::new(dx, dy), screen);
        self.pointer = pointer;

        let mut repaints = Vec::new();
        let pressed = self.buttons.is_empty() && !event.buttons.is_empty();
        if pressed && let Some(id) = registry.get_at(pointer.x, pointer.y) {
            repaints = registry.set_active(id, true, pointer)?;
            self.captured = Some(id);
        }
        self.buttons = event.buttons;

        if event.buttons.is_empty() {
            self.shape = registry
                .get_at(pointer.x, pointer.y)
                .and_then(|id| registry.get(id))
                .map_or(CursorShape::Default, |w| {
                    BorderZone::of(w, pointer.x, pointer.y).cursor_shape()
                });
        }

        let target = self
            .captured
            .filter(|&id| registry.get(id).is_some())
            .or_else(|| registry.get_at(pointer.x, pointer.y))
            .or_else(|| registry.active());
        if let Some(w) = target.and_then(|id| registry.get(id)) {
            w.send(WindowEvent::Mouse {
                window: w.id,
                x: pointer.x,
                y: pointer.y,
                dx,
                dy,
                dz: i32::from(event.dz),
                buttons: event.buttons,
            });
        }

        if event.buttons.is_empty() {
            self.captured = None;
        }
        Ok(MouseRoute {
            pointer,
            shape: self.shape,
            repaints,
            target,
        })
    }

    /// Keyboard input goes to the active window only. Returns the receiver.
    pub fn handle_keyboard(&self, registry: &WindowRegistry, event: &KeyboardEvent) -> Option<WindowId> {
        let w = registry.active().and_then(|id| registry.get(id))?;
        w.send(WindowEvent::Keyboard {
            window: w.id,
            event: *event,
        });
        Some(w.id)
    }
}

fn clamp(p: Point, screen: Size) -> Point {
    let max_x = screen.width.saturating_sub(1) as i32;
    let max_y = screen.height.saturating_sub(1) as i32;
    Point::new(p.x.clamp(0, max_x), p.y.clamp(0, max_y))
}
