// ── Platform abstraction layer ────────────────────────────────────────────────
//
// All OS access lives below this module.  No `unsafe` lives here; all Win32
// FFI is confined to the `win32` sub-module and never leaks outward.  On other
// targets only the platform-neutral dock core is built.

#[cfg(windows)]
pub mod win32;
