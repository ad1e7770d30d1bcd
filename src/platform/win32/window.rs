// ── Bar window ────────────────────────────────────────────────────────────────
//
// Responsibilities in this file (unsafe confined here):
//   • Register the bar window class and create the topmost popup.
//   • Own the `WindowState` for the window's lifetime and reach it from
//     WndProc through GWLP_USERDATA.
//   • Translate window messages into `BarController` events.
//   • Run the Win32 message loop.
//
// Re-entrancy: placing the bar (SetWindowPos) and modal UI (menus, message
// boxes) dispatch messages back into WndProc while a handler still holds the
// state.  Those nested messages get default processing only.

#![allow(unsafe_code)]

use std::{cell::RefCell, ffi::c_void};

use tracing::{debug, info, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{GetLastError, HINSTANCE, HWND, LPARAM, LRESULT, POINT, RECT, TRUE, WPARAM},
        Graphics::Gdi::{
            BeginPaint, DrawTextW, EndPaint, GetStockObject, InvalidateRect, SetBkMode, DT_RIGHT,
            DT_SINGLELINE, DT_VCENTER, HBRUSH, LTGRAY_BRUSH, PAINTSTRUCT, TRANSPARENT,
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            AppendMenuW, CreatePopupMenu, CreateWindowExW, DefWindowProcW, DestroyMenu,
            DestroyWindow, DispatchMessageW, GetClientRect, GetCursorPos, GetMessageW,
            GetSystemMetrics, GetWindowLongPtrW, KillTimer, LoadCursorW, LoadIconW,
            PostMessageW, PostQuitMessage, RegisterClassExW, SetForegroundWindow, SetTimer, SetWindowPos,
            SetWindowLongPtrW, ShowWindow, TrackPopupMenu, TranslateMessage, CREATESTRUCTW,
            CS_HREDRAW, CS_VREDRAW, GWLP_USERDATA, HMENU, IDC_ARROW, IDI_APPLICATION, MF_STRING, MSG,
            SM_CXSCREEN, SPI_SETWORKAREA, SWP_NOACTIVATE, SWP_NOZORDER, SW_SHOWNOACTIVATE, TPM_RETURNCMD, TPM_RIGHTBUTTON,
            WM_ACTIVATE, WM_CLOSE, WM_CREATE, WM_DESTROY, WM_DISPLAYCHANGE, WM_DPICHANGED,
            WM_ENDSESSION, WM_NCCREATE, WM_NCDESTROY, WM_PAINT, WM_RBUTTONUP, WM_SETTINGCHANGE,
            WM_SIZE, WM_TIMER, WM_WINDOWPOSCHANGED, WNDCLASSEXW, WS_EX_TOOLWINDOW,
            WS_EX_TOPMOST, WS_POPUP,
        },
    },
};

use super::{
    appbar::{window_id, Win32Shell},
    dialogs, dpi,
};
use crate::{
    clock::Clock,
    error::{LedgeError, Result},
    lifecycle::{BarController, CloseOutcome, Companion},
    settings::Settings,
};

// ── Window identity ───────────────────────────────────────────────────────────

/// Atom name used to register (and later find) the bar window class.
const CLASS_NAME: PCWSTR = w!("LedgeBarWindow");

/// Window text; shown by task switchers and accessibility tools.
const APP_TITLE: PCWSTR = w!("Ledge");

// ── Timer and command IDs ─────────────────────────────────────────────────────

const TIMER_CLOCK: usize = 1;
const TIMER_REASSERT: usize = 2;

const CLOCK_INTERVAL_MS: u32 = 1_000;

/// Tick used for registration retries when periodic reassertion is off.
const RETRY_INTERVAL_MS: u32 = 10_000;

const IDM_EXIT: usize = 1001;

// ── Window state ──────────────────────────────────────────────────────────────

struct WindowState {
    controller: BarController<Win32Shell>,
    clock: Clock,
    /// Logical bar height at 96 DPI, from the settings.
    logical_thickness: i32,
    reassert_interval_ms: u32,
    dpi: u32,
    /// Current clock line as null-terminated UTF-16, ready for DrawTextW.
    clock_line: Vec<u16>,
}

impl WindowState {
    fn new(settings: &Settings) -> Self {
        Self {
            controller: BarController::new(Win32Shell, settings.policy()),
            clock: Clock::new(&settings.time_format, &settings.date_format),
            logical_thickness: settings.bar_thickness(),
            reassert_interval_ms: settings.reassert_interval_secs.saturating_mul(1_000),
            dpi: dpi::get_system_dpi(),
            clock_line: vec![0],
        }
    }

    /// The bar's rendered thickness in device pixels at the current DPI.
    fn thickness(&self) -> i32 {
        dpi::scale(self.logical_thickness, self.dpi)
    }

    fn refresh_clock(&mut self) {
        let now = Clock::now();
        let line = format!(
            "{}    {}   ",
            self.clock.date_text(&now),
            self.clock.time_text(&now)
        );
        self.clock_line = line.encode_utf16().chain(std::iter::once(0)).collect();
    }
}

/// Starts the clock and reassertion timers when the bar appears; stops them
/// when it closes.
struct BarTimers {
    hwnd: HWND,
    reassert_interval_ms: u32,
}

impl BarTimers {
    /// The reassert timer also drives registration retries, so it runs even
    /// when reassertion is turned off.
    fn reassert_tick_ms(&self) -> u32 {
        match self.reassert_interval_ms {
            0 => RETRY_INTERVAL_MS,
            ms => ms,
        }
    }
}

impl Companion for BarTimers {
    fn on_visible(&mut self) {
        // SAFETY: hwnd is the bar window, alive until WM_DESTROY; timers are
        // delivered as WM_TIMER on this thread (no TIMERPROC).
        unsafe {
            SetTimer(self.hwnd, TIMER_CLOCK, CLOCK_INTERVAL_MS, None);
            SetTimer(self.hwnd, TIMER_REASSERT, self.reassert_tick_ms(), None);
        }
    }

    fn on_closing(&mut self) {
        // SAFETY: killing a timer that was never set only returns an error.
        unsafe {
            let _ = KillTimer(self.hwnd, TIMER_CLOCK);
            let _ = KillTimer(self.hwnd, TIMER_REASSERT);
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Create the bar window, dock it to the top of its monitor and drive the
/// message loop until the bar exits.
pub(crate) fn run(settings: Settings) -> Result<()> {
    dpi::init();

    // SAFETY: GetModuleHandleW(None) returns the .exe's own HMODULE, which is
    // always valid for the process lifetime.
    let hmodule = unsafe { GetModuleHandleW(None) }?;
    let hinstance = HINSTANCE(hmodule.0);

    register_class(hinstance)?;

    // Owned here for the whole message loop; WndProc borrows it through
    // GWLP_USERDATA, which is cleared in WM_NCDESTROY before this drops.
    let state = Box::new(RefCell::new(WindowState::new(&settings)));
    let hwnd = create_window(hinstance, &state)?;

    // SAFETY: hwnd was just returned by CreateWindowExW and is valid.
    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOWNOACTIVATE);
    }

    {
        let mut s = state.borrow_mut();
        s.refresh_clock();
        let thickness = s.thickness();
        if !s.controller.dock_bar(thickness) {
            warn!("Ledge is running without a screen-edge reservation");
        }
    }

    let result = message_loop();
    info!("message loop ended");
    drop(state);
    result
}

// ── Window class registration ─────────────────────────────────────────────────

fn register_class(hinstance: HINSTANCE) -> Result<()> {
    // SAFETY: IDI_APPLICATION and IDC_ARROW are built-in resources that exist
    // on all Windows versions.
    let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }?;
    let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }?;

    // SAFETY: GetStockObject with LTGRAY_BRUSH always returns a valid HGDIOBJ;
    // stock brush objects are compatible with HBRUSH.
    let bg_brush = unsafe { HBRUSH(GetStockObject(LTGRAY_BRUSH).0) };

    let wndclass = WNDCLASSEXW {
        cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
        style: CS_HREDRAW | CS_VREDRAW,
        lpfnWndProc: Some(wnd_proc),
        cbClsExtra: 0,
        cbWndExtra: 0,
        hInstance: hinstance,
        hIcon: icon,
        hCursor: cursor,
        hbrBackground: bg_brush,
        lpszMenuName: PCWSTR::null(),
        lpszClassName: CLASS_NAME,
        hIconSm: icon,
    };

    // SAFETY: wndclass is fully initialised with valid handles;
    // CLASS_NAME is a valid null-terminated UTF-16 string literal.
    let atom = unsafe { RegisterClassExW(&wndclass) };
    if atom == 0 {
        return Err(last_error("RegisterClassExW"));
    }

    Ok(())
}

// ── Window creation ───────────────────────────────────────────────────────────

fn create_window(hinstance: HINSTANCE, state: &RefCell<WindowState>) -> Result<HWND> {
    let system_dpi = state.borrow().dpi;
    let height = dpi::scale(state.borrow().logical_thickness, system_dpi);

    // SAFETY: GetSystemMetrics has no preconditions.
    let width = unsafe { GetSystemMetrics(SM_CXSCREEN) };

    // SAFETY: CLASS_NAME was just registered; hinstance is the exe's module.
    // lpParam points at the RefCell owned by `run`, which outlives the window.
    // The bar is placed properly once it registers with the shell; until then
    // it floats at the top of the primary monitor.
    let hwnd = unsafe {
        CreateWindowExW(
            WS_EX_TOOLWINDOW | WS_EX_TOPMOST,
            CLASS_NAME,
            APP_TITLE,
            WS_POPUP,
            0,
            0,
            width,
            height,
            HWND::default(),
            HMENU::default(),
            hinstance,
            Some(state as *const RefCell<WindowState> as *const c_void),
        )
    }?;

    Ok(hwnd)
}

// ── Message loop ──────────────────────────────────────────────────────────────

fn message_loop() -> Result<()> {
    let mut msg = MSG::default();

    loop {
        // SAFETY: &mut msg is a valid MSG pointer; HWND::default() retrieves
        // messages for all windows on this thread; 0,0 filter accepts all.
        let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };

        match ret.0 {
            -1 => return Err(last_error("GetMessageW")),
            0 => break,
            _ => unsafe {
                // SAFETY: msg was populated by a successful GetMessageW call.
                let _ = TranslateMessage(&msg);
                let _ = DispatchMessageW(&msg);
            },
        }
    }

    Ok(())
}

// ── Window procedure ──────────────────────────────────────────────────────────

/// What WndProc should do once the state borrow is released.
enum Reply {
    Default,
    Handled(LRESULT),
    /// Exit confirmed: destroy the window.
    Destroy,
}

// SAFETY: wnd_proc is registered as lpfnWndProc in WNDCLASSEXW.
// Windows guarantees that hwnd, msg, wparam, and lparam are valid for the
// lifetime of this call; we must not store hwnd beyond the window's life.
unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if msg == WM_NCCREATE {
        // SAFETY: for WM_NCCREATE lparam points at the CREATESTRUCTW whose
        // lpCreateParams is the state pointer passed by `create_window`.
        let cs = lparam.0 as *const CREATESTRUCTW;
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, (*cs).lpCreateParams as isize);
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    let ptr = GetWindowLongPtrW(hwnd, GWLP_USERDATA) as *const RefCell<WindowState>;
    if ptr.is_null() {
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }
    if msg == WM_NCDESTROY {
        SetWindowLongPtrW(hwnd, GWLP_USERDATA, 0);
        return DefWindowProcW(hwnd, msg, wparam, lparam);
    }

    // SAFETY: the pointer was stored in WM_NCCREATE and refers to the
    // RefCell owned by `run`, which lives until after WM_NCDESTROY.
    let cell = &*ptr;
    let reply = match cell.try_borrow_mut() {
        Ok(mut state) => handle_message(&mut state, hwnd, msg, wparam, lparam),
        // Nested dispatch while a handler is running.
        Err(_) => Reply::Default,
    };

    match reply {
        Reply::Default => DefWindowProcW(hwnd, msg, wparam, lparam),
        Reply::Handled(r) => r,
        Reply::Destroy => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }
    }
}

fn handle_message(state: &mut WindowState, hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> Reply {
    match msg {
        // ── Lifecycle ─────────────────────────────────────────────────────────
        WM_CREATE => {
            state.dpi = dpi::get_for_window(hwnd);
            state.controller.on_window_created(window_id(hwnd));
            state.controller.add_companion(Box::new(BarTimers {
                hwnd,
                reassert_interval_ms: state.reassert_interval_ms,
            }));
            Reply::Handled(LRESULT(0))
        }

        WM_CLOSE => {
            let outcome = state
                .controller
                .request_close(&mut || dialogs::confirm_exit(hwnd));
            match outcome {
                CloseOutcome::Closed => Reply::Destroy,
                CloseOutcome::Cancelled => Reply::Handled(LRESULT(0)),
            }
        }

        WM_ENDSESSION => {
            if wparam.0 != 0 {
                state.controller.shutdown();
            }
            Reply::Handled(LRESULT(0))
        }

        WM_DESTROY => {
            // Destroyed without going through WM_CLOSE: release anyway.
            state.controller.shutdown();
            // SAFETY: posts WM_QUIT to this thread's queue.
            unsafe { PostQuitMessage(0) };
            Reply::Handled(LRESULT(0))
        }

        // ── Geometry ──────────────────────────────────────────────────────────
        WM_SIZE => {
            let thickness = state.thickness();
            state.controller.on_resize(thickness);
            Reply::Handled(LRESULT(0))
        }

        WM_DPICHANGED => {
            state.dpi = dpi::from_dpi_changed(wparam);
            debug!(dpi = state.dpi, "DPI changed");
            let thickness = state.thickness();
            if state.controller.on_dpi_changed(thickness) {
                // SAFETY: for WM_DPICHANGED, lparam points at a RECT owned by
                // the system for the duration of this message.
                let r = unsafe { *(lparam.0 as *const RECT) };
                // SAFETY: hwnd is this window.  The nested WM_SIZE only gets
                // default processing while the state is borrowed.
                let placed = unsafe {
                    SetWindowPos(
                        hwnd,
                        HWND::default(),
                        r.left,
                        r.top,
                        r.right - r.left,
                        r.bottom - r.top,
                        SWP_NOZORDER | SWP_NOACTIVATE,
                    )
                };
                if let Err(e) = placed {
                    warn!(error = %e, "could not apply the suggested DPI rect");
                }
            }
            Reply::Handled(LRESULT(0))
        }

        WM_DISPLAYCHANGE => {
            state.controller.on_display_changed();
            Reply::Default
        }

        WM_SETTINGCHANGE if wparam.0 == SPI_SETWORKAREA.0 as usize => {
            state.controller.on_display_changed();
            Reply::Default
        }

        // ── Appbar protocol courtesy ──────────────────────────────────────────
        WM_ACTIVATE => {
            state.controller.on_activate();
            Reply::Default
        }

        WM_WINDOWPOSCHANGED => {
            state.controller.on_window_pos_changed();
            Reply::Default
        }

        // ── Timers ────────────────────────────────────────────────────────────
        WM_TIMER => {
            match wparam.0 {
                TIMER_CLOCK => {
                    state.refresh_clock();
                    // SAFETY: hwnd is this window; invalidating the whole
                    // client area queues one WM_PAINT.
                    unsafe {
                        let _ = InvalidateRect(hwnd, None, TRUE);
                    }
                }
                TIMER_REASSERT => state.controller.on_reassert_timer(),
                _ => {}
            }
            Reply::Handled(LRESULT(0))
        }

        // ── Presence ──────────────────────────────────────────────────────────
        WM_PAINT => {
            paint(state, hwnd);
            Reply::Handled(LRESULT(0))
        }

        WM_RBUTTONUP => {
            if context_menu(hwnd) == Some(IDM_EXIT) {
                // SAFETY: queued, so WM_CLOSE arrives after this handler
                // released the state.
                unsafe {
                    let _ = PostMessageW(hwnd, WM_CLOSE, WPARAM(0), LPARAM(0));
                }
            }
            Reply::Handled(LRESULT(0))
        }

        // ── Appbar callback ───────────────────────────────────────────────────
        _ => {
            if state.controller.route(msg, wparam.0, lparam.0) {
                Reply::Handled(LRESULT(0))
            } else {
                Reply::Default
            }
        }
    }
}

// ── Painting ──────────────────────────────────────────────────────────────────

fn paint(state: &mut WindowState, hwnd: HWND) {
    let mut ps = PAINTSTRUCT::default();
    let mut rc = RECT::default();

    // SAFETY: BeginPaint/EndPaint are paired on the same PAINTSTRUCT; the
    // clock buffer is null-terminated and outlives DrawTextW.
    unsafe {
        let hdc = BeginPaint(hwnd, &mut ps);
        if GetClientRect(hwnd, &mut rc).is_ok() {
            SetBkMode(hdc, TRANSPARENT);
            let len = state.clock_line.len().saturating_sub(1);
            DrawTextW(
                hdc,
                &mut state.clock_line[..len],
                &mut rc,
                DT_RIGHT | DT_VCENTER | DT_SINGLELINE,
            );
        }
        let _ = EndPaint(hwnd, &ps);
    }
}

// ── Context menu ──────────────────────────────────────────────────────────────

/// Show the bar's right-click menu; returns the chosen command.
fn context_menu(hwnd: HWND) -> Option<usize> {
    // SAFETY: the menu is created, tracked and destroyed within this call;
    // hwnd is the bar window and owns the menu while it is tracked.
    unsafe {
        let menu = CreatePopupMenu().ok()?;
        let chosen = (|| {
            AppendMenuW(menu, MF_STRING, IDM_EXIT, w!("E&xit Ledge")).ok()?;
            let mut pt = POINT::default();
            GetCursorPos(&mut pt).ok()?;
            // Required so the menu closes when the user clicks elsewhere.
            let _ = SetForegroundWindow(hwnd);
            let cmd = TrackPopupMenu(menu, TPM_RETURNCMD | TPM_RIGHTBUTTON, pt.x, pt.y, 0, hwnd, None);
            usize::try_from(cmd.0).ok().filter(|&c| c != 0)
        })();
        let _ = DestroyMenu(menu);
        chosen
    }
}

// ── Error helpers ─────────────────────────────────────────────────────────────

/// Capture the current Win32 last-error code and wrap it in a `LedgeError`.
///
/// Call immediately after a Win32 function that signals failure; `GetLastError`
/// reads thread-local state that can be overwritten by any subsequent API call.
fn last_error(function: &'static str) -> LedgeError {
    // SAFETY: GetLastError reads thread-local state set by the last Win32 call.
    let code = unsafe { GetLastError() };
    LedgeError::Win32 {
        function,
        code: code.0,
    }
}
