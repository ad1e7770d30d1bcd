// ── Message boxes ─────────────────────────────────────────────────────────────
//
// The exit confirmation and the fatal startup error.  Both are modal and must
// be called on the UI thread.
//
// This is inside `platform::win32` so `unsafe` is permitted per crate policy.

#![allow(unsafe_code)]

use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::HWND,
        UI::WindowsAndMessaging::{
            MessageBoxW, IDOK, MB_ICONERROR, MB_ICONQUESTION, MB_OK, MB_OKCANCEL, MB_SETFOREGROUND,
        },
    },
};

/// Null-terminated UTF-16 copy of `s`.
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Ask whether the bar should exit.  `true` only when the user chose OK.
pub(crate) fn confirm_exit(owner: HWND) -> bool {
    let body = wide(
        "The reserved space at the top of the screen will be released.\n\n\
         Start Ledge again from its shortcut to bring the bar back.",
    );

    // SAFETY: `body` stays allocated for the duration of the call; the
    // caption is a static literal; `owner` is the bar window (or null).
    let choice = unsafe {
        MessageBoxW(
            owner,
            PCWSTR(body.as_ptr()),
            w!("Exit Ledge?"),
            MB_OKCANCEL | MB_ICONQUESTION | MB_SETFOREGROUND,
        )
    };
    choice == IDOK
}

/// Show a modal error dialog with the given message.
///
/// Used by `main()` when the bar window could not be created.
pub(crate) fn show_error_dialog(message: &str) {
    let msg_wide = wide(message);
    let title_wide = wide("Ledge \u{2014} Fatal Error");

    // SAFETY: msg_wide and title_wide are valid null-terminated UTF-16 strings
    // that remain allocated for the duration of the MessageBoxW call.
    // HWND::default() (null) means the dialog has no owner window.
    unsafe {
        let _ = MessageBoxW(
            HWND::default(),
            PCWSTR(msg_wide.as_ptr()),
            PCWSTR(title_wide.as_ptr()),
            MB_OK | MB_ICONERROR,
        );
    }
}
