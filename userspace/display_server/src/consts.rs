use embedded_graphics::pixelcolor::Rgb888;

/// Capacity of the window table. Window ids are slot indices below this.
pub const WINDOW_COUNT: usize = 32;

/// Colour depth requested when the command line does not name one.
pub const DEF_BPP: u8 = 24;

/// Largest accepted window width or height.
pub const MAX_WINDOW_DIM: u32 = 4096;

/// Border thickness of the move/resize preview outline.
pub const PREVIEW_THICKNESS: u32 = 2;

/// Width of the grab zone along a window's left, right and bottom edges.
pub const CURSOR_RESIZE_WIDTH: i32 = 6;

/// Pending events per client before further events are dropped.
pub const EVENT_QUEUE_DEPTH: usize = 64;

pub const BACKGROUND_COLOR: Rgb888 = Rgb888::new(0x1e, 0x3a, 0x5f);
pub const PREVIEW_COLOR: Rgb888 = Rgb888::new(0xd0, 0xd0, 0xd0);
pub const CURSOR_OUTLINE_COLOR: Rgb888 = Rgb888::new(0, 0, 0);
pub const CURSOR_FILL_COLOR: Rgb888 = Rgb888::new(255, 255, 255);
