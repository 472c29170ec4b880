use crate::channel::{ChannelId, ClientId, EventChannel, Listeners};
use crate::consts::{MAX_WINDOW_DIM, WINDOW_COUNT};
use crate::error::{Result, WinMngError};
use crate::frame_buffer::FrameBuffer;
use crate::rect::Rectangle;
use crate::window::{Window, truncate_title};
use display_api_types::graphics::PixelFormat;
use display_api_types::window::{ListenerKind, WindowEvent, WindowId, WindowStyle};
use embedded_graphics::geometry::Point;

/// A screen area that must be run through the damage engine.
///
/// `owner`/`min_z` are the starting point of the occlusion walk: the window
/// the pixels come from (and everything below it is skipped), or `None`
/// and `-1` for exposed area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Repaint {
    pub rect: Rectangle,
    pub owner: Option<WindowId>,
    pub min_z: i32,
}

impl Repaint {
    pub fn exposed(rect: Rectangle) -> Self {
        Self {
            rect,
            owner: None,
            min_z: -1,
        }
    }

    /// The whole window. An unready window is transparent, so its area is treated as exposed.
    pub fn of_window(w: &Window) -> Self {
        if w.ready {
            Self {
                rect: w.rect,
                owner: Some(w.id),
                min_z: w.z,
            }
        } else {
            Self::exposed(w.rect)
        }
    }
}

/// The fixed-capacity window table, with focus and lifecycle listeners.
///
/// A window's id is its slot index; a slot is reused only after destroy.
pub struct WindowRegistry {
    windows: [Option<Window>; WINDOW_COUNT],
    active: Option<WindowId>,
    listeners: Listeners,
}

fn validate_size(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > MAX_WINDOW_DIM || height > MAX_WINDOW_DIM {
        return Err(WinMngError::InvalidRegion);
    }
    Ok(())
}

/// Screen placement of a window: the origin is translated onto the screen, never shrunk.
fn place(rect: Rectangle) -> Rectangle {
    Rectangle::new(rect.x.max(0), rect.y.max(0), rect.width, rect.height)
}

impl Default for WindowRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowRegistry {
    pub fn new() -> Self {
        const NONE_WINDOW: Option<Window> = None;
        Self {
            windows: [NONE_WINDOW; WINDOW_COUNT],
            active: None,
            listeners: Listeners::default(),
        }
    }

    pub fn slots(&self) -> &[Option<Window>] {
        &self.windows
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(id as usize).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(id as usize).and_then(Option::as_mut)
    }

    pub fn window(&self, id: WindowId) -> Result<&Window> {
        self.get(id).ok_or(WinMngError::InvalidWindowId)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Result<&mut Window> {
        self.get_mut(id).ok_or(WinMngError::InvalidWindowId)
    }

    pub fn listeners_mut(&mut self) -> &mut Listeners {
        &mut self.listeners
    }

    pub fn active(&self) -> Option<WindowId> {
        self.active
    }

    /// The window with the highest z. Linear scan; the table is small.
    pub fn top(&self) -> Option<WindowId> {
        topmost(self.iter())
    }

    /// The topmost visible (ready) window containing the point.
    pub fn get_at(&self, x: i32, y: i32) -> Option<WindowId> {
        topmost(self.iter().filter(|w| w.ready && w.contains(x, y)))
    }

    pub fn windows_of(&self, client: ClientId) -> heapless::Vec<WindowId, WINDOW_COUNT> {
        self.iter()
            .filter(|w| w.owner == client)
            .map(|w| w.id)
            .collect()
    }

    pub fn create(
        &mut self,
        rect: Rectangle,
        owner: ClientId,
        style: WindowStyle,
        title_bar_height: u32,
        title: &str,
        format: PixelFormat,
    ) -> Result<WindowId> {
        validate_size(rect.width, rect.height)?;
        let slot = self
            .windows
            .iter()
            .position(Option::is_none)
            .ok_or(WinMngError::NoFreeSlot)?;
        let buffer = FrameBuffer::new(rect.width, rect.height, format)?;
        let z = match style {
            WindowStyle::Desktop => 0,
            _ => self.top().and_then(|id| self.get(id)).map_or(1, |w| w.z + 1),
        };
        let id = slot as WindowId;
        let window = Window {
            id,
            rect: place(rect),
            z,
            owner,
            style,
            title_bar_height,
            title: truncate_title(title),
            ready: false,
            buffer,
            channel: None,
        };
        log::debug!(
            "window {id} created at {:?} z={z} {style:?} for client {owner}",
            window.rect
        );
        if style.announces_lifecycle() {
            self.listeners.notify(
                ListenerKind::Created,
                &WindowEvent::Created {
                    window: id,
                    title: window.title.clone(),
                },
            );
        }
        self.windows[slot] = Some(window);
        Ok(id)
    }

    /// Bring `id` to the front and give it the focus.
    ///
    /// Every window above it (popups excepted) yields one level and `id`
    /// takes the highest vacated level. Does nothing if `id` is already active.
    pub fn set_active(&mut self, id: WindowId, repaint: bool, pointer: Point) -> Result<Vec<Repaint>> {
        let (style, z) = {
            let w = self.window(id)?;
            (w.style, w.z)
        };
        if self.active == Some(id) {
            return Ok(Vec::new());
        }
        if style != WindowStyle::Desktop {
            let mut max_z = z;
            for w in self.windows.iter_mut().flatten() {
                if w.id != id && w.z > z && w.style != WindowStyle::Popup {
                    max_z = max_z.max(w.z);
                    w.z -= 1;
                }
            }
            if let Some(w) = self.get_mut(id) {
                w.z = max_z;
            }
            self.normalize_z_order();
        }

        if let Some(prev) = self.active.and_then(|prev| self.get(prev)) {
            prev.send(WindowEvent::SetActive {
                window: prev.id,
                active: false,
                mouse_x: pointer.x,
                mouse_y: pointer.y,
            });
        }
        self.active = Some(id);
        let w = self.window(id)?;
        log::debug!("window {id} active at z={}", w.z);
        w.send(WindowEvent::SetActive {
            window: id,
            active: true,
            mouse_x: pointer.x,
            mouse_y: pointer.y,
        });
        if style != WindowStyle::Popup {
            self.listeners
                .notify(ListenerKind::Active, &WindowEvent::Activated { window: id });
        }

        let mut repaints = Vec::new();
        if repaint && style != WindowStyle::Desktop {
            repaints.push(Repaint::of_window(w));
        }
        Ok(repaints)
    }

    /// Free the slot, expose the area the window covered and, if it had the
    /// focus or was on top, activate the new topmost window.
    pub fn destroy(&mut self, id: WindowId, pointer: Point) -> Result<Vec<Repaint>> {
        let was_top = self.top() == Some(id);
        let window = self
            .windows
            .get_mut(id as usize)
            .and_then(Option::take)
            .ok_or(WinMngError::InvalidWindowId)?;
        log::debug!("window {id} destroyed");
        if window.style.announces_lifecycle() {
            self.listeners
                .notify(ListenerKind::Destroyed, &WindowEvent::Destroyed { window: id });
        }

        let mut repaints = vec![Repaint::exposed(window.rect)];
        let was_active = self.active == Some(id);
        if was_active {
            self.active = None;
        }
        self.normalize_z_order();
        if (was_active || was_top)
            && let Some(next) = self.top()
        {
            repaints.extend(self.set_active(next, true, pointer)?);
        }
        Ok(repaints)
    }

    /// Move the window. The buffer goes with it, so the new area can be
    /// painted straight away. The origin is clamped to the screen.
    pub fn move_to(&mut self, id: WindowId, x: i32, y: i32) -> Result<Vec<Repaint>> {
        let w = self.window_mut(id)?;
        let old = w.rect;
        let new = place(Rectangle::new(x, y, old.width, old.height));
        if new == old {
            return Ok(Vec::new());
        }
        w.rect = new;
        log::debug!("window {id} moved to {new:?}");
        let mut repaints: Vec<Repaint> = old
            .subtraction(&new)
            .into_iter()
            .map(Repaint::exposed)
            .collect();
        repaints.push(Repaint::of_window(w));
        Ok(repaints)
    }

    /// Give the window a new placement and a fresh, blank buffer.
    /// Nothing changes if the new buffer cannot be allocated.
    pub fn resize(&mut self, id: WindowId, rect: Rectangle, format: PixelFormat) -> Result<Vec<Repaint>> {
        validate_size(rect.width, rect.height)?;
        self.window(id)?;
        let buffer = FrameBuffer::new(rect.width, rect.height, format)?;
        let w = self.window_mut(id)?;
        let old = w.rect;
        let new = place(rect);
        w.buffer = buffer;
        w.rect = new;
        let mut repaints: Vec<Repaint> = old
            .subtraction(&new)
            .into_iter()
            .map(Repaint::exposed)
            .collect();
        repaints.push(Repaint::of_window(w));
        Ok(repaints)
    }

    /// Record that the client repainted `sub` (window-relative) and mark the window ready.
    pub fn mark_updated(&mut self, id: WindowId, sub: Rectangle) -> Result<Repaint> {
        let w = self.window_mut(id)?;
        if sub.is_empty()
            || sub.x < 0
            || sub.y < 0
            || sub.x as u64 + sub.width as u64 > w.rect.width as u64
            || sub.y as u64 + sub.height as u64 > w.rect.height as u64
        {
            return Err(WinMngError::InvalidRegion);
        }
        w.ready = true;
        Ok(Repaint {
            rect: sub.translate(w.rect.x, w.rect.y),
            owner: Some(id),
            min_z: w.z,
        })
    }

    /// Attach an event channel (the first one sticks) and focus the window,
    /// unless it is a desktop and something else already has the focus.
    pub fn attach(&mut self, id: WindowId, channel: &EventChannel, pointer: Point) -> Result<Vec<Repaint>> {
        let w = self.window_mut(id)?;
        if w.channel.is_none() {
            w.channel = Some(channel.clone());
        }
        let style = w.style;
        if self.active.is_none() || style != WindowStyle::Desktop {
            return self.set_active(id, true, pointer);
        }
        Ok(Vec::new())
    }

    /// Forget `channel` on every window using it. The windows stay alive.
    pub fn detach_channel(&mut self, channel: ChannelId) {
        for w in self.windows.iter_mut().flatten() {
            if w.channel.as_ref().is_some_and(|c| c.id() == channel) {
                w.channel = None;
            }
        }
    }

    /// Forget every channel opened by `client`.
    pub fn detach_client(&mut self, client: ClientId) {
        for w in self.windows.iter_mut().flatten() {
            if w.channel.as_ref().is_some_and(|c| c.client() == client) {
                w.channel = None;
            }
        }
    }

    /// New buffers for every window in `format`. All or nothing.
    pub fn allocate_buffers(&self, format: PixelFormat) -> Result<Vec<(WindowId, FrameBuffer)>> {
        self.iter()
            .map(|w| Ok((w.id, FrameBuffer::new(w.rect.width, w.rect.height, format)?)))
            .collect()
    }

    /// Swap in buffers from `allocate_buffers`. The windows turn unready
    /// until their clients repaint, and are told so with `Reset`.
    pub fn install_buffers(&mut self, buffers: Vec<(WindowId, FrameBuffer)>) {
        for (id, buffer) in buffers {
            if let Some(w) = self.get_mut(id) {
                w.buffer = buffer;
                w.ready = false;
                w.send(WindowEvent::Reset { window: id });
            }
        }
    }

    /// Renumber non-desktop windows 1..=n keeping their order; ties go by slot.
    fn normalize_z_order(&mut self) {
        let mut order: heapless::Vec<(i32, usize), WINDOW_COUNT> = heapless::Vec::new();
        for (index, w) in self.windows.iter().enumerate() {
            if let Some(w) = w
                && w.style != WindowStyle::Desktop
            {
                let _ = order.push((w.z, index));
            }
        }
        order.sort_unstable();
        for (rank, &(_, index)) in order.iter().enumerate() {
            if let Some(w) = &mut self.windows[index] {
                w.z = rank as i32 + 1;
            }
        }
    }
}

/// Highest z wins; among equal z the later slot wins, matching the damage engine.
fn topmost<'a>(windows: impl Iterator<Item = &'a Window>) -> Option<WindowId> {
    windows
        .fold(None, |best: Option<&Window>, w| match best {
            Some(b) if b.z > w.z => Some(b),
            _ => Some(w),
        })
        .map(|w| w.id)
}
