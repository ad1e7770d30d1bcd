// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except `platform::win32` (Win32 FFI).
// Each unsafe block in that module MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]

// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
// Off Windows only the dock core and its tests are built.
#![cfg_attr(not(windows), allow(dead_code))]

mod clock;
mod dock;
mod error;
mod geometry;
mod lifecycle;
mod logging;
mod platform;
mod router;
mod settings;

#[cfg(windows)]
fn main() {
    let log_guard = logging::init();
    let settings = settings::load();
    tracing::info!(?settings, "starting Ledge");

    if let Err(e) = platform::win32::window::run(settings) {
        // The bar window could not be created or the message loop failed.
        // A modal error dialog is the only output path in a GUI app.
        tracing::error!(error = %e, "Ledge stopped");
        drop(log_guard);
        platform::win32::dialogs::show_error_dialog(&e.to_string());
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn main() {
    let _log_guard = logging::init();
    tracing::error!("Ledge docks into the Windows shell and only runs on Windows");
    std::process::exit(1);
}
