// ── Shell appbar host ─────────────────────────────────────────────────────────
//
// The production `ShellHost`: `SHAppBarMessage` for the dock service plus the
// monitor / window-placement calls the dock client needs.  Stateless; every
// query goes to the OS.

#![allow(unsafe_code)]

use std::ffi::c_void;

use tracing::trace;
use windows::{
    core::w,
    Win32::{
        Foundation::{HWND, RECT},
        Graphics::Gdi::{GetMonitorInfoW, MonitorFromWindow, MONITORINFO, MONITOR_DEFAULTTONEAREST},
        UI::{
            Shell::{
                SHAppBarMessage, ABE_BOTTOM, ABE_LEFT, ABE_RIGHT, ABE_TOP, ABM_ACTIVATE, ABM_NEW,
                ABM_QUERYPOS, ABM_REMOVE, ABM_SETPOS, ABM_WINDOWPOSCHANGED, APPBARDATA,
            },
            WindowsAndMessaging::{
                GetWindowRect, IsWindow, RegisterWindowMessageW, SetWindowPos, HWND_NOTOPMOST,
                HWND_TOPMOST, SWP_NOACTIVATE, SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER,
            },
        },
    },
};

use crate::{
    dock::{MessageId, ShellHost, WindowId},
    error::{LedgeError, RegistrationError, Result},
    geometry::{Edge, MonitorWorkArea, Rect},
};

// ── Handle conversion ─────────────────────────────────────────────────────────

pub(crate) fn window_id(hwnd: HWND) -> WindowId {
    WindowId(hwnd.0 as isize)
}

pub(crate) fn hwnd(window: WindowId) -> HWND {
    HWND(window.0 as *mut c_void)
}

fn to_rect(r: RECT) -> Rect {
    Rect::new(r.left, r.top, r.right, r.bottom)
}

fn to_win32(r: Rect) -> RECT {
    RECT {
        left: r.left,
        top: r.top,
        right: r.right,
        bottom: r.bottom,
    }
}

fn abe(edge: Edge) -> u32 {
    match edge {
        Edge::Left => ABE_LEFT,
        Edge::Top => ABE_TOP,
        Edge::Right => ABE_RIGHT,
        Edge::Bottom => ABE_BOTTOM,
    }
}

// ── Host ──────────────────────────────────────────────────────────────────────

pub(crate) struct Win32Shell;

impl Win32Shell {
    /// Send one appbar message; returns the shell's reply and the (possibly
    /// adjusted) data block.
    fn send(message: u32, mut data: APPBARDATA) -> (usize, APPBARDATA) {
        // SAFETY: `data` is a fully initialised APPBARDATA with cbSize set;
        // the shell reads and writes only within it for the call's duration.
        let ret = unsafe { SHAppBarMessage(message, &mut data) };
        (ret, data)
    }

    fn data(window: WindowId) -> APPBARDATA {
        APPBARDATA {
            cbSize: std::mem::size_of::<APPBARDATA>() as u32,
            hWnd: hwnd(window),
            ..Default::default()
        }
    }

    fn positioned(window: WindowId, edge: Edge, rect: Rect) -> APPBARDATA {
        APPBARDATA {
            uEdge: abe(edge),
            rc: to_win32(rect),
            ..Self::data(window)
        }
    }
}

impl ShellHost for Win32Shell {
    fn is_window(&self, window: WindowId) -> bool {
        // SAFETY: IsWindow accepts any value and only reports whether it names
        // an existing window.
        unsafe { IsWindow(hwnd(window)) }.as_bool()
    }

    fn work_area(&self, window: WindowId) -> Result<MonitorWorkArea> {
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        // SAFETY: MONITOR_DEFAULTTONEAREST always yields a monitor handle;
        // `info` has cbSize set and outlives the call.
        let ok = unsafe {
            let monitor = MonitorFromWindow(hwnd(window), MONITOR_DEFAULTTONEAREST);
            GetMonitorInfoW(monitor, &mut info)
        };
        if !ok.as_bool() {
            return Err(LedgeError::Win32 {
                function: "GetMonitorInfoW",
                code: 0,
            });
        }
        Ok(MonitorWorkArea {
            monitor: to_rect(info.rcMonitor),
            work: to_rect(info.rcWork),
        })
    }

    fn window_rect(&self, window: WindowId) -> Option<Rect> {
        let mut rc = RECT::default();
        // SAFETY: `rc` is a valid out-pointer; an invalid hwnd is reported as
        // an error, not undefined behaviour.
        unsafe { GetWindowRect(hwnd(window), &mut rc) }.ok()?;
        Some(to_rect(rc))
    }

    fn place_window(&mut self, window: WindowId, rect: Rect) -> Result<()> {
        // SAFETY: plain move/resize of a window owned by this thread.
        unsafe {
            SetWindowPos(
                hwnd(window),
                HWND::default(),
                rect.left,
                rect.top,
                rect.width(),
                rect.height(),
                SWP_NOZORDER | SWP_NOACTIVATE,
            )
        }?;
        Ok(())
    }

    fn set_topmost(&mut self, window: WindowId, topmost: bool) -> Result<()> {
        let after = if topmost { HWND_TOPMOST } else { HWND_NOTOPMOST };
        // SAFETY: z-order change only; position and size are untouched.
        unsafe {
            SetWindowPos(
                hwnd(window),
                after,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
        }?;
        Ok(())
    }

    fn new_bar(&mut self, window: WindowId) -> std::result::Result<MessageId, RegistrationError> {
        // SAFETY: the literal is a valid null-terminated UTF-16 string.  The
        // same string always maps to the same id for the session.
        let callback = unsafe { RegisterWindowMessageW(w!("LedgeAppBarMessage")) };
        if callback == 0 {
            return Err(RegistrationError::ServiceUnavailable);
        }

        let data = APPBARDATA {
            uCallbackMessage: callback,
            ..Self::data(window)
        };
        let (ret, _) = Self::send(ABM_NEW, data);
        if ret == 0 {
            return Err(RegistrationError::ServiceUnavailable);
        }
        Ok(MessageId(callback))
    }

    fn query_pos(&mut self, window: WindowId, edge: Edge, proposed: Rect) -> Rect {
        let (_, data) = Self::send(ABM_QUERYPOS, Self::positioned(window, edge, proposed));
        let r = to_rect(data.rc);
        trace!(%proposed, adjusted = %r, "ABM_QUERYPOS");
        r
    }

    fn set_pos(&mut self, window: WindowId, edge: Edge, proposed: Rect) -> Rect {
        let (_, data) = Self::send(ABM_SETPOS, Self::positioned(window, edge, proposed));
        let r = to_rect(data.rc);
        trace!(%proposed, granted = %r, "ABM_SETPOS");
        r
    }

    fn remove_bar(&mut self, window: WindowId) {
        Self::send(ABM_REMOVE, Self::data(window));
    }

    fn activate(&mut self, window: WindowId) {
        Self::send(ABM_ACTIVATE, Self::data(window));
    }

    fn window_pos_changed(&mut self, window: WindowId) {
        Self::send(ABM_WINDOWPOSCHANGED, Self::data(window));
    }
}
