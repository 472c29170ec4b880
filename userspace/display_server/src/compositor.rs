use crate::consts::BACKGROUND_COLOR;
use crate::damage::{RegionOwner, WinRect};
use crate::frame_buffer::FrameBuffer;
use crate::rect::Rectangle;
use crate::window::Window;
use display_api_types::graphics::DirtyRect;

/// Owns the output framebuffer and paints damage regions into it.
pub struct Compositor {
    output: FrameBuffer,
    /// Background fill, pre-encoded in the output's pixel format.
    background: u32,
}

impl Compositor {
    pub fn new(output: FrameBuffer) -> Self {
        let background = output.encode(BACKGROUND_COLOR);
        Self { output, background }
    }

    pub fn output(&self) -> &FrameBuffer {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut FrameBuffer {
        &mut self.output
    }

    pub fn screen(&self) -> Rectangle {
        self.output.bounds()
    }

    /// Swap in a new output (mode switch) and hand back the old one.
    pub fn replace_output(&mut self, output: FrameBuffer) -> FrameBuffer {
        self.background = output.encode(BACKGROUND_COLOR);
        core::mem::replace(&mut self.output, output)
    }

    /// Paint one region and return the screen area actually touched.
    ///
    /// # Panics
    ///
    /// If the region names a window that is not in `windows`. Regions come
    /// straight from the damage engine over the same table, so this is a bug.
    pub fn paint(&mut self, windows: &[Option<Window>], region: &WinRect) -> Option<Rectangle> {
        let screen = self.screen();
        let rect = region.rect.clamp_to_bounds(screen.width, screen.height)?;
        match region.owner {
            RegionOwner::Background => {
                log::trace!("clear {rect:?}");
                self.output.fill(rect, self.background);
            }
            RegionOwner::Window(id) => {
                let Some(w) = windows.get(id as usize).and_then(Option::as_ref) else {
                    log::error!("damage region {rect:?} names dead window {id}");
                    panic!("damage region for window {id}, which is not in the table");
                };
                log::trace!("copy {rect:?} from window {id}");
                let src = rect.translate(-w.rect.x, -w.rect.y);
                self.output.blit(&w.buffer, src, rect.x, rect.y);
            }
        }
        Some(rect)
    }

    /// Fill the whole screen with the background, ignoring windows.
    pub fn clear(&mut self) -> Rectangle {
        let screen = self.screen();
        self.output.fill(screen, self.background);
        screen
    }
}

/// Bounding box of everything touched during one operation, flushed to the
/// backend as a single notification.
#[derive(Default, Debug)]
pub struct Damage {
    bounds: Option<DirtyRect>,
}

impl Damage {
    pub fn add(&mut self, rect: Rectangle) {
        if rect.is_empty() || rect.x < 0 || rect.y < 0 {
            return;
        }
        let rect = DirtyRect::new(rect.x as u32, rect.y as u32, rect.width, rect.height);
        self.bounds.get_or_insert(rect).include(rect);
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_none()
    }

    pub fn take(&mut self) -> Option<DirtyRect> {
        self.bounds.take()
    }
}
