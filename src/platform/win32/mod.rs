// ── Win32 platform implementation ─────────────────────────────────────────────
//
// Besides `effect::buffer`, this is the only module where `unsafe` code is
// permitted.  Every `unsafe` block MUST carry a `// SAFETY:` comment that
// states:
//   • which invariant makes the operation sound, and
//   • what the caller is responsible for maintaining.
//
// Nothing in this module is `pub` beyond what callers genuinely need; keep the
// unsafe surface as small as possible.

#![allow(unsafe_code)]

// ── Sub-modules ───────────────────────────────────────────────────────────────

pub mod window; // main window, WndProc, message loop

pub(crate) mod compositor; // DWM / user32 composition calls
pub(crate) mod version; // RtlGetVersion
