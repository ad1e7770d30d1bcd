#![allow(unsafe_code)]

use windows::Win32::{
    Foundation::{HWND, WPARAM},
    UI::HiDpi::{
        GetDpiForSystem, GetDpiForWindow, SetProcessDpiAwarenessContext,
        DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    },
};

pub(crate) const BASE_DPI: u32 = 96;

/// Scale a length defined at 96 DPI to `dpi`.
pub(crate) fn scale(px: i32, dpi: u32) -> i32 {
    crate::geometry::scale_to_dpi(px, dpi, BASE_DPI)
}

/// Opt into Per-Monitor v2 DPI awareness so the bar sees device pixels on
/// every monitor and receives WM_DPICHANGED.
/// MUST be called before any window is created on the calling thread.
pub(crate) fn init() {
    // SAFETY: Must precede all window creation; single call at process start.
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }
}

/// The new DPI carried by WM_DPICHANGED (X and Y are always equal).
pub(crate) fn from_dpi_changed(wparam: WPARAM) -> u32 {
    match (wparam.0 & 0xFFFF) as u32 {
        0 => BASE_DPI,
        v => v,
    }
}

/// Return the DPI of the monitor hosting `hwnd`. Falls back to 96.
pub(crate) fn get_for_window(hwnd: HWND) -> u32 {
    // SAFETY: hwnd is a valid window handle provided by the caller.
    match unsafe { GetDpiForWindow(hwnd) } {
        0 => BASE_DPI,
        v => v,
    }
}

/// Return the primary-monitor DPI. Used to size the window before it exists.
pub(crate) fn get_system_dpi() -> u32 {
    // SAFETY: GetDpiForSystem takes no parameters and always succeeds on Win10+.
    match unsafe { GetDpiForSystem() } {
        0 => BASE_DPI,
        v => v,
    }
}
