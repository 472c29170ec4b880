//! The window manager façade: one lock around the window table, the output
//! buffer and both overlays, and a second one around the display backend.
//!
//! Every operation runs completely under the state lock. Screen damage is
//! collected while it is held and handed to the backend as a single dirty
//! rectangle after it has been released. Lock order is state, then backend.

use crate::backend::DisplayBackend;
use crate::channel::{ChannelId, ClientId, EventChannel};
use crate::compositor::{Compositor, Damage};
use crate::config::Config;
use crate::consts::{MAX_WINDOW_DIM, PREVIEW_COLOR, PREVIEW_THICKNESS};
use crate::cursor::CursorOverlay;
use crate::damage::{RegionOwner, WinRect, repaint_regions};
use crate::error::{Result, WinMngError};
use crate::frame_buffer::FrameBuffer;
use crate::preview::PreviewOverlay;
use crate::rect::Rectangle;
use crate::registry::{Repaint, WindowRegistry};
use crate::router::EventRouter;
use display_api_types::graphics::ScreenMode;
use display_api_types::input::InputEvent;
use display_api_types::window::{
    CursorShape, ListenerKind, WindowEvent, WindowId, WindowStyle, WindowTitle,
};
use embedded_graphics::geometry::{Point, Size};

/// A snapshot of one window, for clients and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub rect: Rectangle,
    pub z: i32,
    pub owner: ClientId,
    pub style: WindowStyle,
    pub ready: bool,
    pub title: WindowTitle,
}

struct State {
    mode: ScreenMode,
    registry: WindowRegistry,
    compositor: Compositor,
    cursor: CursorOverlay,
    preview: PreviewOverlay,
    router: EventRouter,
}

impl State {
    fn screen_size(&self) -> Size {
        Size::new(self.mode.width, self.mode.height)
    }

    fn apply(&mut self, repaints: &[Repaint], damage: &mut Damage) {
        for repaint in repaints {
            self.repaint(repaint, damage);
        }
    }

    fn repaint(&mut self, repaint: &Repaint, damage: &mut Damage) {
        let regions = {
            let owner = repaint.owner.and_then(|id| self.registry.get(id));
            let min_z = if owner.is_some() { repaint.min_z } else { -1 };
            repaint_regions(self.registry.slots(), repaint.rect, owner, min_z)
        };
        for region in &regions {
            self.paint_region(region, damage);
        }
    }

    /// Window content first, then the outline, then the cursor on top.
    fn paint_region(&mut self, region: &WinRect, damage: &mut Damage) {
        let Some(rect) = self.compositor.paint(self.registry.slots(), region) else {
            return;
        };
        damage.add(rect);
        let output = self.compositor.output_mut();
        self.preview.update_rect(output, rect, damage);
        self.cursor.on_screen_update(output, rect, damage);
    }

    fn repaint_all(&mut self, damage: &mut Damage) {
        let screen = self.compositor.screen();
        self.repaint(&Repaint::exposed(screen), damage);
    }

    fn set_preview(&mut self, rect: Rectangle, thickness: u32, damage: &mut Damage) -> Result<()> {
        let output = self.compositor.output_mut();
        let color = output.encode(PREVIEW_COLOR);
        self.cursor.hide(output, damage);
        let result = self.preview.set(output, rect, thickness, color, damage);
        self.cursor.show(output, damage);
        result
    }

    fn clear_preview(&mut self, damage: &mut Damage) {
        if self.preview.is_active() {
            // Removing never allocates.
            let _ = self.set_preview(Rectangle::EMPTY, 0, damage);
        }
    }

    fn destroy(&mut self, id: WindowId, damage: &mut Damage) -> Result<()> {
        self.router.forget(id);
        let repaints = self.registry.destroy(id, self.router.pointer())?;
        self.apply(&repaints, damage);
        Ok(())
    }
}

pub struct WindowManager<B: DisplayBackend> {
    state: spin::Mutex<State>,
    backend: spin::Mutex<B>,
}

impl<B: DisplayBackend> WindowManager<B> {
    /// Switch the backend to the configured mode and paint the empty desktop.
    pub fn new(mut backend: B, config: &Config) -> Result<Self> {
        let mode = backend
            .find_mode(config.width, config.height, config.bpp)
            .ok_or(WinMngError::ModeUnsupported)?;
        let output = FrameBuffer::new(mode.width, mode.height, mode.format)?;
        backend.set_mode(&mode)?;

        let mut damage = Damage::default();
        let mut compositor = Compositor::new(output);
        damage.add(compositor.clear());
        let center = Point::new(mode.width as i32 / 2, mode.height as i32 / 2);
        let mut cursor = CursorOverlay::new(center);
        cursor.show(compositor.output_mut(), &mut damage);
        if let Some(rect) = damage.take() {
            backend.notify_dirty(rect);
        }
        backend.set_cursor(center.x, center.y, CursorShape::Default);
        log::info!(
            "screen {}x{} at {}bpp (mode {})",
            mode.width,
            mode.height,
            mode.bits_per_pixel(),
            mode.id
        );

        Ok(Self {
            state: spin::Mutex::new(State {
                mode,
                registry: WindowRegistry::new(),
                compositor,
                cursor,
                preview: PreviewOverlay::new(),
                router: EventRouter::new(center),
            }),
            backend: spin::Mutex::new(backend),
        })
    }

    /// Run `f` under the state lock, then flush whatever it painted.
    fn with_state<R>(&self, f: impl FnOnce(&mut State, &mut Damage) -> Result<R>) -> Result<R> {
        let mut damage = Damage::default();
        let result = {
            let mut state = self.state.lock();
            f(&mut state, &mut damage)
        };
        if let Some(rect) = damage.take() {
            self.backend.lock().notify_dirty(rect);
        }
        result
    }

    pub fn backend(&self) -> spin::MutexGuard<'_, B> {
        self.backend.lock()
    }

    pub fn create_window(
        &self,
        client: ClientId,
        rect: Rectangle,
        style: WindowStyle,
        title_bar_height: u32,
        title: &str,
    ) -> Result<WindowId> {
        self.with_state(|state, _| {
            let format = state.mode.format;
            state
                .registry
                .create(rect, client, style, title_bar_height, title, format)
        })
    }

    /// Route the window's events to `channel`; the first attach sticks.
    pub fn attach(&self, id: WindowId, channel: &EventChannel) -> Result<()> {
        self.with_state(|state, damage| {
            let repaints = state.registry.attach(id, channel, state.router.pointer())?;
            state.apply(&repaints, damage);
            Ok(())
        })
    }

    pub fn set_active(&self, id: WindowId) -> Result<()> {
        self.with_state(|state, damage| {
            let repaints = state.registry.set_active(id, true, state.router.pointer())?;
            state.apply(&repaints, damage);
            Ok(())
        })
    }

    pub fn destroy_window(&self, id: WindowId) -> Result<()> {
        self.with_state(|state, damage| state.destroy(id, damage))
    }

    /// With `finished` unset only the outline moves; otherwise the window does.
    pub fn move_window(&self, id: WindowId, x: i32, y: i32, finished: bool) -> Result<()> {
        self.with_state(|state, damage| {
            let size = state.registry.window(id)?.rect;
            if x >= state.mode.width as i32 || y >= state.mode.height as i32 {
                return Err(WinMngError::InvalidRegion);
            }
            if finished {
                state.clear_preview(damage);
                let repaints = state.registry.move_to(id, x, y)?;
                state.apply(&repaints, damage);
                Ok(())
            } else {
                let outline = Rectangle::new(x, y, size.width, size.height);
                state.set_preview(outline, PREVIEW_THICKNESS, damage)
            }
        })
    }

    /// Same preview/commit split as `move_window`. A commit gives the window a
    /// fresh buffer and tells it with `Resized`.
    pub fn resize_window(&self, id: WindowId, rect: Rectangle, finished: bool) -> Result<()> {
        self.with_state(|state, damage| {
            state.registry.window(id)?;
            if rect.width == 0 || rect.height == 0 || rect.width > MAX_WINDOW_DIM || rect.height > MAX_WINDOW_DIM {
                return Err(WinMngError::InvalidRegion);
            }
            if !finished {
                return state.set_preview(rect, PREVIEW_THICKNESS, damage);
            }
            let format = state.mode.format;
            let repaints = state.registry.resize(id, rect, format)?;
            state.clear_preview(damage);
            state.apply(&repaints, damage);
            let w = state.registry.window(id)?;
            w.send(WindowEvent::Resized {
                window: id,
                width: w.rect.width,
                height: w.rect.height,
            });
            Ok(())
        })
    }

    /// The client redrew `sub` (window-relative) of its buffer.
    pub fn update(&self, id: WindowId, sub: Rectangle) -> Result<()> {
        self.with_state(|state, damage| {
            let repaint = state.registry.mark_updated(id, sub)?;
            if state.registry.top() == Some(id) {
                // Nothing can be above the topmost window.
                let region = WinRect {
                    rect: repaint.rect,
                    owner: RegionOwner::Window(id),
                };
                state.paint_region(&region, damage);
            } else {
                state.repaint(&repaint, damage);
            }
            Ok(())
        })
    }

    /// Let the owning client draw into its window's buffer.
    pub fn with_window_buffer<R>(
        &self,
        client: ClientId,
        id: WindowId,
        f: impl FnOnce(&mut FrameBuffer) -> R,
    ) -> Result<R> {
        self.with_state(|state, _| {
            let w = state.registry.window_mut(id)?;
            if w.owner != client {
                return Err(WinMngError::InvalidWindowId);
            }
            Ok(f(&mut w.buffer))
        })
    }

    /// Switch the screen mode. Windows get new, blank buffers and a `Reset`.
    ///
    /// If the backend refuses the mode the old one is set again, the screen
    /// is repainted and `ModeSwitchFailed` is returned.
    pub fn set_mode(&self, width: u32, height: u32, bpp: u8) -> Result<ScreenMode> {
        self.with_state(|state, damage| {
            let mut backend = self.backend.lock();
            let mode = backend
                .find_mode(width, height, bpp)
                .ok_or(WinMngError::ModeUnsupported)?;
            let fail = |err: WinMngError| {
                log::warn!("mode {width}x{height}x{bpp}: {err}");
                WinMngError::ModeSwitchFailed
            };
            let output = FrameBuffer::new(mode.width, mode.height, mode.format).map_err(fail)?;
            let buffers = state.registry.allocate_buffers(mode.format).map_err(fail)?;

            if let Err(err) = backend.set_mode(&mode) {
                log::error!("backend refused mode {}: {err}, restoring mode {}", mode.id, state.mode.id);
                if let Err(err) = backend.set_mode(&state.mode) {
                    log::error!("restoring mode {} failed: {err}", state.mode.id);
                }
                state.repaint_all(damage);
                return Err(WinMngError::ModeSwitchFailed);
            }

            state.compositor.replace_output(output);
            state.registry.install_buffers(buffers);
            state.mode = mode;
            state.preview.reset();
            state.cursor.reset(state.compositor.output());
            let size = state.screen_size();
            state.router.reset(size);
            state.repaint_all(damage);
            state.cursor.show(state.compositor.output_mut(), damage);
            let pointer = state.cursor.position();
            backend.set_cursor(pointer.x, pointer.y, state.cursor.shape());
            log::info!(
                "switched to {}x{} at {}bpp (mode {})",
                mode.width,
                mode.height,
                mode.bits_per_pixel(),
                mode.id
            );
            Ok(mode)
        })
    }

    pub fn add_listener(&self, channel: &EventChannel, kind: ListenerKind) {
        let _ = self.with_state(|state, _| {
            state.registry.listeners_mut().add(channel, kind);
            Ok(())
        });
    }

    pub fn remove_listener(&self, channel: ChannelId, kind: ListenerKind) {
        let _ = self.with_state(|state, _| {
            state.registry.listeners_mut().remove(channel, kind);
            Ok(())
        });
    }

    /// The receiving end of `channel` is gone.
    pub fn close_events(&self, channel: ChannelId) {
        let _ = self.with_state(|state, _| {
            state.registry.detach_channel(channel);
            state.registry.listeners_mut().remove_channel(channel);
            Ok(())
        });
    }

    /// Destroy everything `client` owned and forget its subscriptions.
    pub fn disconnect(&self, client: ClientId) {
        let _ = self.with_state(|state, damage| {
            let windows = state.registry.windows_of(client);
            for &id in &windows {
                state.destroy(id, damage)?;
            }
            state.registry.detach_client(client);
            state.registry.listeners_mut().remove_client(client);
            log::debug!("client {client} disconnected, {} windows destroyed", windows.len());
            Ok(())
        });
    }

    /// Feed one decoded input event through the router.
    pub fn handle_input(&self, event: &InputEvent) -> Result<()> {
        let cursor = self.with_state(|state, damage| match event {
            InputEvent::Keyboard(key) => {
                state.router.handle_keyboard(&state.registry, key);
                Ok(None)
            }
            InputEvent::Mouse(mouse) => {
                let size = state.screen_size();
                let route = state.router.handle_mouse(&mut state.registry, size, mouse)?;
                state.apply(&route.repaints, damage);
                let output = state.compositor.output_mut();
                state
                    .cursor
                    .move_to(output, route.pointer.x, route.pointer.y, route.shape, damage);
                Ok(Some((route.pointer, route.shape)))
            }
        })?;
        if let Some((pointer, shape)) = cursor {
            self.backend.lock().set_cursor(pointer.x, pointer.y, shape);
        }
        Ok(())
    }

    pub fn mode(&self) -> ScreenMode {
        self.state.lock().mode
    }

    /// The modes a client may pass to `set_mode`.
    pub fn modes(&self) -> Vec<ScreenMode> {
        self.backend.lock().modes()
    }

    pub fn active(&self) -> Option<WindowId> {
        self.state.lock().registry.active()
    }

    pub fn top(&self) -> Option<WindowId> {
        self.state.lock().registry.top()
    }

    pub fn pointer(&self) -> Point {
        self.state.lock().router.pointer()
    }

    pub fn window_info(&self, id: WindowId) -> Option<WindowInfo> {
        let state = self.state.lock();
        state.registry.get(id).map(|w| WindowInfo {
            id: w.id,
            rect: w.rect,
            z: w.z,
            owner: w.owner,
            style: w.style,
            ready: w.ready,
            title: w.title.clone(),
        })
    }

    pub fn window_count(&self) -> usize {
        self.state.lock().registry.len()
    }

    /// Raw output pixel, as the backend would scan it out.
    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.state.lock().compositor.output().pixel(x, y)
    }

    pub fn with_output<R>(&self, f: impl FnOnce(&FrameBuffer) -> R) -> R {
        f(self.state.lock().compositor.output())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::channel::next_client_id;
    use crate::consts::BACKGROUND_COLOR;
    use display_api_types::MouseButtons;
    use display_api_types::graphics::{DirtyRect, PixelFormat};
    use display_api_types::input::{KeyboardEvent, MouseEvent};
    use embedded_graphics::pixelcolor::Rgb888;
    use std::sync::mpsc::Receiver;

    type Manager = WindowManager<HeadlessBackend>;

    fn config(bpp: u8) -> Config {
        Config {
            width: 640,
            height: 480,
            bpp,
            name: "test".into(),
            log_level: log::LevelFilter::Off,
        }
    }

    fn manager() -> Manager {
        WindowManager::new(HeadlessBackend::new(), &config(24)).unwrap()
    }

    fn rgb(raw: Rgb888) -> u32 {
        use embedded_graphics::pixelcolor::RgbColor;
        PixelFormat::RGB888.build_pixel(raw.r(), raw.g(), raw.b())
    }

    struct Client {
        id: ClientId,
        channel: EventChannel,
        events: Receiver<WindowEvent>,
    }

    impl Client {
        fn connect() -> Self {
            let id = next_client_id();
            let (channel, events) = EventChannel::new(id);
            Self { id, channel, events }
        }

        /// Create, attach and paint a window in one solid colour.
        fn window(&self, mgr: &Manager, rect: Rectangle, fill: u32) -> WindowId {
            let id = mgr
                .create_window(self.id, rect, WindowStyle::Default, 0, "w")
                .unwrap();
            mgr.attach(id, &self.channel).unwrap();
            self.paint(mgr, id, fill);
            id
        }

        fn paint(&self, mgr: &Manager, id: WindowId, fill: u32) {
            let bounds = mgr
                .with_window_buffer(self.id, id, |fb| {
                    fb.fill(fb.bounds(), fill);
                    fb.bounds()
                })
                .unwrap();
            mgr.update(id, bounds).unwrap();
        }

        fn drain(&self) -> Vec<WindowEvent> {
            self.events.try_iter().collect()
        }
    }

    fn mouse(mgr: &Manager, dx: i16, dy: i16, buttons: MouseButtons) {
        let event = InputEvent::Mouse(MouseEvent {
            dx,
            dy,
            dz: 0,
            buttons,
        });
        mgr.handle_input(&event).unwrap();
    }

    #[test]
    fn startup_paints_background_and_cursor() {
        let mgr = manager();
        assert_eq!(mgr.pixel(0, 0), Some(rgb(BACKGROUND_COLOR)));
        assert_eq!(mgr.pixel(320, 240), Some(0), "arrow tip");
        let backend = mgr.backend();
        assert_eq!(backend.dirty(), &[DirtyRect { x: 0, y: 0, w: 640, h: 480 }]);
        assert_eq!(backend.current().map(|m| m.width), Some(640));
    }

    #[test]
    fn unsupported_startup_mode_is_an_error() {
        assert!(matches!(
            WindowManager::new(HeadlessBackend::new(), &config(8)),
            Err(WinMngError::ModeUnsupported)
        ));
    }

    #[test]
    fn windows_show_up_after_their_first_update() {
        let mgr = manager();
        let client = Client::connect();
        let id = mgr
            .create_window(client.id, Rectangle::new(10, 10, 50, 40), WindowStyle::Default, 0, "w")
            .unwrap();
        mgr.attach(id, &client.channel).unwrap();
        assert_eq!(mgr.pixel(20, 20), Some(rgb(BACKGROUND_COLOR)));

        mgr.backend().take_dirty();
        client.paint(&mgr, id, 0x0011_2233);
        assert_eq!(mgr.pixel(20, 20), Some(0x0011_2233));
        assert_eq!(mgr.pixel(60, 20), Some(rgb(BACKGROUND_COLOR)));
        assert_eq!(mgr.backend().dirty(), &[DirtyRect { x: 10, y: 10, w: 50, h: 40 }]);
        assert!(mgr.window_info(id).unwrap().ready);
    }

    #[test]
    fn updates_below_another_window_stay_hidden() {
        let mgr = manager();
        let client = Client::connect();
        let a = client.window(&mgr, Rectangle::new(0, 0, 100, 100), 0xAA);
        client.window(&mgr, Rectangle::new(50, 50, 100, 100), 0xBB);
        client.paint(&mgr, a, 0xA1);
        assert_eq!(mgr.pixel(10, 10), Some(0xA1));
        assert_eq!(mgr.pixel(60, 60), Some(0xBB));
        assert_eq!(mgr.pixel(120, 120), Some(0xBB));
    }

    #[test]
    fn invalid_updates_are_rejected_without_painting() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(0, 0, 20, 20), 0x01);
        mgr.backend().take_dirty();
        assert_eq!(mgr.update(id, Rectangle::new(10, 10, 11, 1)), Err(WinMngError::InvalidRegion));
        assert_eq!(mgr.update(id + 1, Rectangle::new(0, 0, 1, 1)), Err(WinMngError::InvalidWindowId));
        assert!(mgr.backend().dirty().is_empty());
    }

    #[test]
    fn destroying_the_top_window_reactivates_the_remaining_one() {
        let mgr = manager();
        let client = Client::connect();
        let a = client.window(&mgr, Rectangle::new(0, 0, 100, 100), 0xAA);
        let b = client.window(&mgr, Rectangle::new(50, 50, 100, 100), 0xBB);
        assert_eq!(mgr.active(), Some(b));
        client.drain();

        mgr.destroy_window(b).unwrap();
        assert_eq!(mgr.active(), Some(a));
        assert_eq!(mgr.top(), Some(a));
        assert_eq!(mgr.pixel(60, 60), Some(0xAA));
        assert_eq!(mgr.pixel(120, 120), Some(rgb(BACKGROUND_COLOR)));
        assert!(client.drain().contains(&WindowEvent::SetActive {
            window: a,
            active: true,
            mouse_x: 320,
            mouse_y: 240,
        }));
        assert_eq!(mgr.destroy_window(b), Err(WinMngError::InvalidWindowId));
    }

    #[test]
    fn activating_the_active_window_is_silent() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(0, 0, 30, 30), 0x10);
        client.drain();
        mgr.backend().take_dirty();
        let z = mgr.window_info(id).unwrap().z;

        mgr.set_active(id).unwrap();
        assert!(client.drain().is_empty());
        assert!(mgr.backend().dirty().is_empty());
        assert_eq!(mgr.window_info(id).unwrap().z, z);
    }

    #[test]
    fn move_previews_then_commits() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(10, 10, 40, 30), 0x42);
        let outline = rgb(PREVIEW_COLOR);
        client.drain();

        mgr.move_window(id, 100, 50, false).unwrap();
        assert_eq!(mgr.window_info(id).unwrap().rect, Rectangle::new(10, 10, 40, 30));
        assert_eq!(mgr.pixel(100, 50), Some(outline));
        assert_eq!(mgr.pixel(139, 79), Some(outline));
        assert_eq!(mgr.pixel(110, 60), Some(rgb(BACKGROUND_COLOR)));
        assert_eq!(mgr.pixel(20, 20), Some(0x42));

        mgr.move_window(id, 100, 50, true).unwrap();
        assert_eq!(mgr.window_info(id).unwrap().rect, Rectangle::new(100, 50, 40, 30));
        assert_eq!(mgr.pixel(100, 50), Some(0x42));
        assert_eq!(mgr.pixel(139, 79), Some(0x42));
        assert_eq!(mgr.pixel(20, 20), Some(rgb(BACKGROUND_COLOR)));
        assert!(client.drain().is_empty());
        let outline_left = mgr.with_output(|fb| {
            (0..480)
                .flat_map(|y| (0..640).map(move |x| (x, y)))
                .filter(|&(x, y)| fb.pixel(x, y) == Some(outline))
                .count()
        });
        assert_eq!(outline_left, 0);
    }

    #[test]
    fn moves_past_the_screen_edge_are_rejected() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(10, 10, 40, 30), 0x42);
        assert_eq!(mgr.move_window(id, 640, 0, true), Err(WinMngError::InvalidRegion));
        assert_eq!(mgr.move_window(id, 0, 480, false), Err(WinMngError::InvalidRegion));
        mgr.move_window(id, -15, 5, true).unwrap();
        assert_eq!(mgr.window_info(id).unwrap().rect, Rectangle::new(0, 5, 40, 30));
    }

    #[test]
    fn resize_preview_then_commit_composites_once() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(20, 20, 60, 60), 0x42);
        client.drain();
        let target = Rectangle::new(20, 20, 100, 40);

        mgr.resize_window(id, target, false).unwrap();
        assert_eq!(mgr.pixel(119, 30), Some(rgb(PREVIEW_COLOR)));
        assert_eq!(mgr.pixel(50, 59), Some(rgb(PREVIEW_COLOR)));

        mgr.backend().take_dirty();
        mgr.resize_window(id, target, true).unwrap();
        let dirty = mgr.backend().take_dirty();
        assert_eq!(dirty.len(), 1);
        let d = dirty[0];
        assert!(d.x <= 20 && d.y <= 20 && d.x + d.w >= 120 && d.y + d.h >= 80);

        // Preview strips are gone: outside the window we see the desktop,
        // inside the fresh (blank) buffer.
        assert_eq!(mgr.pixel(119, 30), Some(0));
        assert_eq!(mgr.pixel(50, 59), Some(0));
        assert_eq!(mgr.pixel(50, 70), Some(rgb(BACKGROUND_COLOR)));
        assert_eq!(
            client.drain(),
            vec![WindowEvent::Resized { window: id, width: 100, height: 40 }]
        );
    }

    #[test]
    fn resize_rejects_bad_sizes() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(0, 0, 10, 10), 0x1);
        assert_eq!(
            mgr.resize_window(id, Rectangle::new(0, 0, 0, 10), true),
            Err(WinMngError::InvalidRegion)
        );
        assert_eq!(
            mgr.resize_window(99, Rectangle::new(0, 0, 5, 5), false),
            Err(WinMngError::InvalidWindowId)
        );
    }

    #[test]
    fn cursor_survives_window_repaints() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(300, 220, 60, 60), 0x42);
        assert_eq!(mgr.pixel(320, 240), Some(0), "cursor drawn over the window");
        client.paint(&mgr, id, 0x43);
        assert_eq!(mgr.pixel(320, 240), Some(0));
        assert_eq!(mgr.pixel(310, 230), Some(0x43));

        mouse(&mgr, 100, 0, MouseButtons::empty());
        assert_eq!(mgr.pointer(), Point::new(420, 240));
        assert_eq!(mgr.pixel(320, 240), Some(0x43));
        assert_eq!(mgr.pixel(321, 242), Some(0x43));
        assert_eq!(mgr.backend().cursor(), Some((420, 240, CursorShape::Default)));
    }

    #[test]
    fn clicking_raises_the_window_under_the_pointer() {
        let mgr = manager();
        let client = Client::connect();
        let a = client.window(&mgr, Rectangle::new(300, 200, 100, 100), 0xAA);
        client.window(&mgr, Rectangle::new(350, 250, 100, 100), 0xBB);
        assert_eq!(mgr.pixel(380, 280), Some(0xBB));

        // Pointer starts at (320, 240), inside a only.
        mouse(&mgr, 0, 0, MouseButtons::LEFT);
        mouse(&mgr, 0, 0, MouseButtons::empty());
        assert_eq!(mgr.active(), Some(a));
        assert_eq!(mgr.top(), Some(a));
        assert_eq!(mgr.pixel(380, 280), Some(0xAA));
        assert_eq!(mgr.pixel(420, 320), Some(0xBB));
    }

    #[test]
    fn keyboard_reaches_the_active_window() {
        let mgr = manager();
        let first = Client::connect();
        let second = Client::connect();
        first.window(&mgr, Rectangle::new(0, 0, 10, 10), 0x1);
        let b = second.window(&mgr, Rectangle::new(20, 0, 10, 10), 0x2);
        first.drain();
        second.drain();
        let key = KeyboardEvent {
            keycode: 28,
            character: Some('\n'),
            ..Default::default()
        };
        mgr.handle_input(&InputEvent::Keyboard(key)).unwrap();
        assert!(first.drain().is_empty());
        assert_eq!(second.drain(), vec![WindowEvent::Keyboard { window: b, event: key }]);
    }

    #[test]
    fn mode_switch_resets_windows() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(0, 0, 50, 50), 0x42);
        client.drain();

        let mode = mgr.set_mode(800, 600, 16).unwrap();
        assert_eq!((mode.width, mode.height), (800, 600));
        assert_eq!(mgr.mode(), mode);
        assert_eq!(mgr.backend().current(), Some(mode));
        assert!(!mgr.window_info(id).unwrap().ready);
        assert_eq!(client.drain(), vec![WindowEvent::Reset { window: id }]);
        let background = PixelFormat::RGB565.build_pixel(0x1e, 0x3a, 0x5f);
        assert_eq!(mgr.pixel(10, 10), Some(background));
        assert_eq!(mgr.pixel(799, 599), Some(background));

        mgr.with_window_buffer(client.id, id, |fb| assert_eq!(fb.format(), PixelFormat::RGB565))
            .unwrap();
        client.paint(&mgr, id, 0x1234);
        assert_eq!(mgr.pixel(10, 10), Some(0x1234));
    }

    #[test]
    fn refused_mode_switch_restores_the_old_mode() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(0, 0, 50, 50), 0x42);
        let before = mgr.mode();
        mgr.backend().fail_next_set_mode();

        assert_eq!(mgr.set_mode(1024, 768, 32), Err(WinMngError::ModeSwitchFailed));
        assert_eq!(mgr.mode(), before);
        assert_eq!(mgr.backend().current(), Some(before));
        assert!(mgr.window_info(id).unwrap().ready);
        assert_eq!(mgr.pixel(10, 10), Some(0x42));
        assert_eq!(mgr.set_mode(1024, 768, 8), Err(WinMngError::ModeUnsupported));
    }

    #[test]
    fn disconnect_destroys_only_that_clients_windows() {
        let mgr = manager();
        let leaving = Client::connect();
        let staying = Client::connect();
        leaving.window(&mgr, Rectangle::new(0, 0, 10, 10), 0x1);
        leaving.window(&mgr, Rectangle::new(10, 0, 10, 10), 0x1);
        let kept = staying.window(&mgr, Rectangle::new(20, 0, 10, 10), 0x2);
        mgr.add_listener(&leaving.channel, ListenerKind::Destroyed);

        mgr.disconnect(leaving.id);
        assert_eq!(mgr.window_count(), 1);
        assert!(mgr.window_info(kept).is_some());
        assert_eq!(mgr.pixel(5, 5), Some(rgb(BACKGROUND_COLOR)));

        leaving.drain();
        staying.window(&mgr, Rectangle::new(40, 0, 10, 10), 0x2);
        let gone = mgr.create_window(staying.id, Rectangle::new(0, 0, 5, 5), WindowStyle::Default, 0, "x").unwrap();
        mgr.destroy_window(gone).unwrap();
        assert!(leaving.drain().is_empty(), "listeners were removed");
    }

    #[test]
    fn listeners_hear_about_lifecycle_changes() {
        let mgr = manager();
        let panel = Client::connect();
        mgr.add_listener(&panel.channel, ListenerKind::Created);
        mgr.add_listener(&panel.channel, ListenerKind::Active);
        let app = Client::connect();
        let id = app.window(&mgr, Rectangle::new(0, 0, 10, 10), 0x1);
        let events = panel.drain();
        assert!(matches!(&events[0], WindowEvent::Created { window, .. } if *window == id));
        assert!(events.contains(&WindowEvent::Activated { window: id }));

        mgr.remove_listener(panel.channel.id(), ListenerKind::Active);
        app.window(&mgr, Rectangle::new(20, 0, 10, 10), 0x1);
        assert!(panel.drain().iter().all(|e| matches!(e, WindowEvent::Created { .. })));
    }

    #[test]
    fn closing_events_detaches_the_channel() {
        let mgr = manager();
        let client = Client::connect();
        let id = client.window(&mgr, Rectangle::new(0, 0, 10, 10), 0x1);
        client.drain();
        mgr.close_events(client.channel.id());
        mgr.resize_window(id, Rectangle::new(0, 0, 20, 20), true).unwrap();
        assert!(client.drain().is_empty());
    }

    #[test]
    fn buffers_belong_to_their_owner() {
        let mgr = manager();
        let owner = Client::connect();
        let other = Client::connect();
        let id = owner.window(&mgr, Rectangle::new(0, 0, 10, 10), 0x1);
        assert_eq!(
            mgr.with_window_buffer(other.id, id, |_| ()),
            Err(WinMngError::InvalidWindowId)
        );
    }
}
