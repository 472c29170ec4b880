use crate::channel::{ClientId, EventChannel};
use crate::frame_buffer::FrameBuffer;
use crate::rect::Rectangle;
use display_api_types::window::{WindowEvent, WindowId, WindowStyle, WindowTitle};
use unicode_segmentation::UnicodeSegmentation;

pub struct Window {
    pub id: WindowId,
    /// Screen-space placement; the origin is never negative.
    pub rect: Rectangle,
    pub z: i32,
    pub owner: ClientId,
    pub style: WindowStyle,
    pub title_bar_height: u32,
    pub title: WindowTitle,
    /// Set by the first content update. Unready windows are never composited.
    pub ready: bool,
    /// Sized to `rect`; recreated on resize and on mode switches.
    pub buffer: FrameBuffer,
    pub channel: Option<EventChannel>,
}

impl Window {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rect.contains(x, y)
    }

    /// Best-effort push to the attached channel; dropped when detached.
    pub fn send(&self, event: WindowEvent) {
        if let Some(channel) = &self.channel {
            channel.try_send(event);
        }
    }
}

/// Keep as many whole grapheme clusters of `title` as fit into a `WindowTitle`.
pub fn truncate_title(title: &str) -> WindowTitle {
    let mut out = WindowTitle::new();
    for grapheme in title.graphemes(true) {
        if out.push_str(grapheme).is_err() {
            break;
        }
    }
    out
}
