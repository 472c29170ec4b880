/// Window management protocol between clients and the display_server.
///
/// Clients send `Request`s and get a `WindowResponse` back for each one.
/// The server pushes `WindowEvent`s to the event channel a client attached.
use crate::graphics::ScreenMode;
use crate::input::KeyboardEvent;
use crate::MouseButtons;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Longest window title kept by the server, in bytes.
pub const MAX_TITLE_LEN: usize = 64;

/// Window ID assigned by the display server. Doubles as the window table slot.
pub type WindowId = u32;

pub type WindowTitle = heapless::String<MAX_TITLE_LEN>;

/// Most modes a single `GetModes` response carries.
pub const MAX_MODES: usize = 16;

pub type ModeList = heapless::Vec<ScreenMode, MAX_MODES>;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum WindowStyle {
    Default = 0,
    /// Menus and tooltips: take part in occlusion, but never yield z-levels
    /// and never produce lifecycle notifications.
    Popup = 1,
    /// The background window, pinned at z = 0.
    Desktop = 2,
}

impl WindowStyle {
    /// Whether create/destroy of a window with this style is announced to listeners.
    pub fn announces_lifecycle(self) -> bool {
        matches!(self, WindowStyle::Default)
    }
}

impl Default for WindowStyle {
    fn default() -> Self {
        WindowStyle::Default
    }
}

/// Lifecycle notifications a client can subscribe to.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum ListenerKind {
    Created = 0,
    Destroyed = 1,
    Active = 2,
}

/// Cursor bitmaps known to the display backend.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
pub enum CursorShape {
    Default = 0,
    ResizeLeft = 1,
    ResizeBottomRight = 2,
    ResizeVertical = 3,
    ResizeBottomLeft = 4,
    ResizeRight = 5,
}

impl Default for CursorShape {
    fn default() -> Self {
        CursorShape::Default
    }
}

/// Server-to-client push notifications.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WindowEvent {
    Keyboard {
        window: WindowId,
        event: KeyboardEvent,
    },
    /// Absolute pointer position plus screen-space deltas (positive dy = down).
    Mouse {
        window: WindowId,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        dz: i32,
        buttons: MouseButtons,
    },
    SetActive {
        window: WindowId,
        active: bool,
        mouse_x: i32,
        mouse_y: i32,
    },
    /// A committed resize recreated the window buffer; the client must repaint.
    Resized {
        window: WindowId,
        width: u32,
        height: u32,
    },
    /// The screen mode changed and the window buffer was recreated.
    Reset { window: WindowId },
    Created {
        window: WindowId,
        title: WindowTitle,
    },
    Destroyed { window: WindowId },
    Activated { window: WindowId },
}

impl WindowEvent {
    pub fn window(&self) -> WindowId {
        match self {
            WindowEvent::Keyboard { window, .. }
            | WindowEvent::Mouse { window, .. }
            | WindowEvent::SetActive { window, .. }
            | WindowEvent::Resized { window, .. }
            | WindowEvent::Reset { window }
            | WindowEvent::Created { window, .. }
            | WindowEvent::Destroyed { window }
            | WindowEvent::Activated { window } => *window,
        }
    }
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum WindowMessageType {
    CreateWindow = 0,
    SetActive = 1,
    DestroyWindow = 2,
    MoveWindow = 3,
    ResizeWindow = 4,
    UpdateWindow = 5,
    SetMode = 6,
    AddListener = 7,
    RemoveListener = 8,
    GetMode = 9,
    GetModes = 10,
}

/// Client-to-server requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    CreateWindow {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        style: WindowStyle,
        title_bar_height: u32,
        title: WindowTitle,
    },
    SetActive {
        window: WindowId,
    },
    DestroyWindow {
        window: WindowId,
    },
    /// `finished = false` only moves the preview outline.
    Move {
        window: WindowId,
        x: i32,
        y: i32,
        finished: bool,
    },
    /// `finished = false` only moves the preview outline.
    Resize {
        window: WindowId,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        finished: bool,
    },
    /// The client repainted this window-relative area of its buffer.
    Update {
        window: WindowId,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
    },
    SetMode {
        width: u32,
        height: u32,
        bpp: u8,
    },
    AddListener(ListenerKind),
    RemoveListener(ListenerKind),
    /// The active screen mode.
    GetMode,
    /// Up to `max` of the supported modes. `max = 0` asks for the count only.
    GetModes {
        max: u32,
    },
}

impl Request {
    pub fn message_type(&self) -> WindowMessageType {
        match self {
            Request::CreateWindow { .. } => WindowMessageType::CreateWindow,
            Request::SetActive { .. } => WindowMessageType::SetActive,
            Request::DestroyWindow { .. } => WindowMessageType::DestroyWindow,
            Request::Move { .. } => WindowMessageType::MoveWindow,
            Request::Resize { .. } => WindowMessageType::ResizeWindow,
            Request::Update { .. } => WindowMessageType::UpdateWindow,
            Request::SetMode { .. } => WindowMessageType::SetMode,
            Request::AddListener(_) => WindowMessageType::AddListener,
            Request::RemoveListener(_) => WindowMessageType::RemoveListener,
            Request::GetMode => WindowMessageType::GetMode,
            Request::GetModes { .. } => WindowMessageType::GetModes,
        }
    }
}

/// Server-to-client response codes
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum WindowResult {
    Ok = 0,
    ErrorNoFreeSlot = 1,
    ErrorOutOfMemory = 2,
    ErrorInvalidWindowId = 3,
    ErrorInvalidRegion = 4,
    ErrorModeUnsupported = 5,
    ErrorModeSwitchFailed = 6,
    ErrorInvalidMessage = 7,
}

impl WindowResult {
    pub fn from_u64(v: u64) -> Self {
        Self::try_from(v).unwrap_or(WindowResult::ErrorInvalidMessage)
    }

    pub fn is_ok(self) -> bool {
        matches!(self, WindowResult::Ok)
    }
}

/// Payload of a response, beyond the result code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ResponseData {
    #[default]
    None,
    Mode(ScreenMode),
    /// `count` is the number of modes on offer when none were asked for,
    /// otherwise the number returned in `modes`.
    Modes {
        count: u32,
        modes: ModeList,
    },
}

/// Response to every request. `window_id` is only meaningful for window requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowResponse {
    pub result: WindowResult,
    pub window_id: WindowId,
    pub data: ResponseData,
}

impl WindowResponse {
    pub const OK: Self = Self {
        result: WindowResult::Ok,
        window_id: 0,
        data: ResponseData::None,
    };

    pub fn window(window_id: WindowId) -> Self {
        Self {
            window_id,
            ..Self::OK
        }
    }

    pub fn with_data(data: ResponseData) -> Self {
        Self { data, ..Self::OK }
    }

    pub fn error(result: WindowResult) -> Self {
        Self {
            result,
            ..Self::OK
        }
    }
}
