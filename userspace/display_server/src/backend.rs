use crate::error::{Result, WinMngError};
use display_api_types::graphics::{DirtyRect, PixelFormat, ScreenMode};
use display_api_types::window::CursorShape;

/// The video device below the compositor.
pub trait DisplayBackend: Send {
    /// Every mode the device can drive, in its own order.
    fn modes(&self) -> Vec<ScreenMode>;

    /// The supported mode closest to the request, if any has that depth.
    fn find_mode(&self, width: u32, height: u32, bpp: u8) -> Option<ScreenMode>;

    fn set_mode(&mut self, mode: &ScreenMode) -> Result<()>;

    /// Hardware cursor position and shape. Backends without one ignore it.
    fn set_cursor(&mut self, x: i32, y: i32, shape: CursorShape);

    /// Pixels in `rect` of the output buffer changed and should be presented.
    fn notify_dirty(&mut self, rect: DirtyRect);
}

/// Dirty notifications kept for inspection; older ones are only counted.
const DIRTY_HISTORY: usize = 256;

const STANDARD_SIZES: [(u32, u32); 3] = [(640, 480), (800, 600), (1024, 768)];
const STANDARD_FORMATS: [PixelFormat; 3] = [
    PixelFormat::RGB565,
    PixelFormat::RGB888,
    PixelFormat::XRGB8888,
];

/// In-memory backend: records what the compositor asks of it.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    modes: Vec<ScreenMode>,
    current: Option<ScreenMode>,
    dirty: Vec<DirtyRect>,
    dirty_count: u64,
    cursor: Option<(i32, i32, CursorShape)>,
    fail_next_set_mode: bool,
}

impl HeadlessBackend {
    /// 640x480, 800x600 and 1024x768, each at 16, 24 and 32 bpp.
    pub fn new() -> Self {
        let modes = STANDARD_SIZES
            .iter()
            .flat_map(|&(width, height)| {
                STANDARD_FORMATS
                    .iter()
                    .map(move |&format| (width, height, format))
            })
            .enumerate()
            .map(|(id, (width, height, format))| ScreenMode {
                id: id as u16,
                width,
                height,
                format,
            })
            .collect();
        Self::with_modes(modes)
    }

    pub fn with_modes(modes: Vec<ScreenMode>) -> Self {
        Self {
            modes,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<ScreenMode> {
        self.current
    }

    /// Make the next `set_mode` fail, as a device rejecting a mode would.
    pub fn fail_next_set_mode(&mut self) {
        self.fail_next_set_mode = true;
    }

    /// The most recent dirty notifications, oldest first.
    pub fn dirty(&self) -> &[DirtyRect] {
        &self.dirty
    }

    /// Dirty notifications received since startup.
    pub fn dirty_count(&self) -> u64 {
        self.dirty_count
    }

    pub fn take_dirty(&mut self) -> Vec<DirtyRect> {
        core::mem::take(&mut self.dirty)
    }

    pub fn cursor(&self) -> Option<(i32, i32, CursorShape)> {
        self.cursor
    }
}

impl DisplayBackend for HeadlessBackend {
    fn modes(&self) -> Vec<ScreenMode> {
        self.modes.clone()
    }

    fn find_mode(&self, width: u32, height: u32, bpp: u8) -> Option<ScreenMode> {
        self.modes
            .iter()
            .filter(|m| m.bits_per_pixel() == bpp)
            .min_by_key(|m| m.width.abs_diff(width) as u64 + m.height.abs_diff(height) as u64)
            .copied()
    }

    fn set_mode(&mut self, mode: &ScreenMode) -> Result<()> {
        if core::mem::take(&mut self.fail_next_set_mode) {
            log::warn!("headless: rejecting mode {}x{}x{}", mode.width, mode.height, mode.bits_per_pixel());
            return Err(WinMngError::ModeSwitchFailed);
        }
        log::info!("headless: mode {}x{}x{}", mode.width, mode.height, mode.bits_per_pixel());
        self.current = Some(*mode);
        Ok(())
    }

    fn set_cursor(&mut self, x: i32, y: i32, shape: CursorShape) {
        self.cursor = Some((x, y, shape));
    }

    fn notify_dirty(&mut self, rect: DirtyRect) {
        log::trace!("headless: dirty {rect:?}");
        self.dirty_count += 1;
        if self.dirty.len() == DIRTY_HISTORY {
            self.dirty.remove(0);
        }
        self.dirty.push(rect);
    }
}
