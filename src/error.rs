// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in Ledge return `error::Result<T>`.  Dock errors are
// handled at the lifecycle boundary and never terminate the process; only a
// failure to create the bar window surfaces as a fatal dialog (see
// `platform::win32::window::show_error_dialog`).

use thiserror::Error;

use crate::geometry::Rect;

/// Why the shell refused to register the bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// The window handle is null or no longer refers to a live window.
    #[error("window handle is not a live window")]
    InvalidWindow,

    /// The shell's appbar service rejected the request (typically because
    /// no shell that implements the appbar protocol is running).
    #[error("shell dock service is unavailable")]
    ServiceUnavailable,

    /// The bar already holds a live reservation.
    #[error("bar is already registered")]
    AlreadyRegistered,
}

/// Every error that Ledge can produce.
#[derive(Debug, Error)]
pub enum LedgeError {
    /// Registration with the shell failed; the bar degrades to a floating
    /// top-level window.
    #[error("appbar registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// The shell negotiated a rectangle the bar cannot occupy.  The previous
    /// geometry is kept until the next successful reposition.
    #[error("appbar position drifted: expected {expected}, shell reported {reported}")]
    RepositionDrift { expected: Rect, reported: Rect },

    /// A caller broke a geometry contract (for example a zero-area monitor).
    #[error("precondition violated: {0}")]
    Precondition(&'static str),

    /// The handle does not belong to the live registration.
    #[error("appbar handle is stale or was never registered")]
    StaleHandle,

    /// A Win32 API call returned a failure code.
    #[error("{function} failed (error {code:#010x})")]
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error (settings file, log directory, …).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file could not be parsed or written.
    #[error("settings JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Convert a windows-crate error (HRESULT) directly into a LedgeError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for LedgeError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, LedgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_error_converts_with_question_mark() {
        fn fails() -> Result<()> {
            Err(RegistrationError::ServiceUnavailable)?;
            Ok(())
        }
        assert!(matches!(
            fails(),
            Err(LedgeError::Registration(RegistrationError::ServiceUnavailable))
        ));
    }

    #[test]
    fn drift_message_names_both_rectangles() {
        let e = LedgeError::RepositionDrift {
            expected: Rect::new(0, 0, 1920, 40),
            reported: Rect::new(0, 40, 1920, 40),
        };
        let text = e.to_string();
        assert!(text.contains("(0, 0, 1920, 40)"), "{text}");
        assert!(text.contains("(0, 40, 1920, 40)"), "{text}");
    }

    #[test]
    fn win32_code_is_hex_formatted() {
        let e = LedgeError::Win32 { function: "SetWindowPos", code: 5 };
        assert_eq!(e.to_string(), "SetWindowPos failed (error 0x00000005)");
    }
}
