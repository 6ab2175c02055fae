// ── Safety policy ────────────────────────────────────────────────────────────
// Unsafe code is forbidden everywhere except:
//   • `platform::win32` – Win32 / DWM FFI
//   • `effect::buffer`  – the native heap block handed to the compositor
// Each unsafe block in those modules MUST carry a `// SAFETY:` comment.
#![deny(unsafe_code)]
// Off Windows only the portable blur logic and its tests are exercised.
#![cfg_attr(not(windows), allow(dead_code))]
// Release builds run as a GUI application (no console window).
// Debug builds keep the console so that log output is visible.
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod effect;
mod error;
mod logging;
mod platform;
mod settings;

#[cfg(windows)]
fn main() {
    logging::init();

    let settings = settings::load().unwrap_or_default();
    tracing::info!(
        event = "app.started",
        background_blur = settings.background_blur,
        width = settings.window_width,
        height = settings.window_height,
    );

    if let Err(e) = platform::win32::window::run(&settings) {
        tracing::error!(event = "app.failed", error = %e);
        // Startup failed before or during the message loop.
        // A modal dialog is the only visible output path in a GUI app.
        platform::win32::window::show_error_dialog(&e.to_string());
        std::process::exit(1);
    }
}

#[cfg(not(windows))]
fn main() {
    logging::init();
    tracing::error!(
        event = "app.unsupported_platform",
        os = std::env::consts::OS,
        "frost needs the Windows desktop compositor"
    );
    std::process::exit(1);
}
