// ── Platform abstraction layer ────────────────────────────────────────────────
//
// `os_version` is portable: it classifies version numbers into blur tiers.
// All Win32 FFI is confined to the `win32` sub-module and never leaks outward.

pub mod os_version;

#[cfg(windows)]
pub mod win32;
