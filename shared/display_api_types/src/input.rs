use crate::{KeyModifiers, MouseButtons};

/// A decoded PS/2 mouse packet.
///
/// `dx`/`dy` are relative movement deltas in PS/2 coordinates
/// (positive dy = mouse moved up), `dz` is the wheel delta.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MouseEvent {
    pub dx: i16,
    pub dy: i16,
    pub dz: i8,
    pub buttons: MouseButtons,
}

impl MouseEvent {
    pub const EMPTY: Self = Self {
        dx: 0,
        dy: 0,
        dz: 0,
        buttons: MouseButtons::empty(),
    };
}

/// A decoded key press or release.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub keycode: u16,
    pub character: Option<char>,
    pub modifiers: KeyModifiers,
}

impl KeyboardEvent {
    pub fn is_release(&self) -> bool {
        self.modifiers.contains(KeyModifiers::RELEASED)
    }
}

/// Everything the input thread hands to the window manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Keyboard(KeyboardEvent),
    Mouse(MouseEvent),
}
