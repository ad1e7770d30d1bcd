// ── Win32 platform implementation ─────────────────────────────────────────────
//
// The only module tree in the codebase where `unsafe` code is permitted.
// Every `unsafe` block MUST carry a `// SAFETY:` comment that states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub mod dialogs; // exit confirmation, fatal error box
pub mod window; // bar window, WndProc, message loop

pub(crate) mod appbar; // SHAppBarMessage-backed ShellHost
pub(crate) mod dpi; // per-monitor DPI v2 helpers
