use core::fmt;
use display_api_types::window::WindowResult;

/// Every way a window-manager request can fail. None of these are fatal to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WinMngError {
    /// The window table is full.
    NoFreeSlot,
    /// A backing store could not be allocated.
    BufferAllocFailed,
    /// The request named a dead or out-of-range window.
    InvalidWindowId,
    /// A rectangle failed bounds validation.
    InvalidRegion,
    /// The display backend has no mode close to the one requested.
    ModeUnsupported,
    /// The display backend rejected the mode; the previous mode was restored.
    ModeSwitchFailed,
}

impl fmt::Display for WinMngError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            WinMngError::NoFreeSlot => "window table is full",
            WinMngError::BufferAllocFailed => "backing store allocation failed",
            WinMngError::InvalidWindowId => "no such window",
            WinMngError::InvalidRegion => "rectangle out of bounds",
            WinMngError::ModeUnsupported => "screen mode not supported",
            WinMngError::ModeSwitchFailed => "screen mode switch failed",
        };
        f.write_str(msg)
    }
}

impl core::error::Error for WinMngError {}

impl From<WinMngError> for WindowResult {
    fn from(value: WinMngError) -> Self {
        match value {
            WinMngError::NoFreeSlot => WindowResult::ErrorNoFreeSlot,
            WinMngError::BufferAllocFailed => WindowResult::ErrorOutOfMemory,
            WinMngError::InvalidWindowId => WindowResult::ErrorInvalidWindowId,
            WinMngError::InvalidRegion => WindowResult::ErrorInvalidRegion,
            WinMngError::ModeUnsupported => WindowResult::ErrorModeUnsupported,
            WinMngError::ModeSwitchFailed => WindowResult::ErrorModeSwitchFailed,
        }
    }
}

pub type Result<T, E = WinMngError> = core::result::Result<T, E>;
