#![no_std]

#[cfg(test)]
extern crate std;

pub mod graphics;
pub mod input;
pub mod window;

use bitflags::bitflags;

bitflags! {
    /// Pressed mouse buttons, as reported by the input decoder.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct MouseButtons: u8 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const MIDDLE = 1 << 2;

        // The decoder may set any bits
        const _ = !0;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct KeyModifiers: u8 {
        const RELEASED = 1 << 0;
        const SHIFT = 1 << 1;
        const CTRL = 1 << 2;
        const ALT = 1 << 3;
    }
}
