// ── User settings ─────────────────────────────────────────────────────────────
//
// Reads and writes `%APPDATA%\Frost\settings.json`.
// No `unsafe`: pure safe Rust + serde_json.

use std::{fs, io, path::PathBuf};

use serde::{Deserialize, Serialize};

// ── On-disk type ──────────────────────────────────────────────────────────────

/// Root of the JSON settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Settings {
    pub(crate) version: u32,
    /// Apply the blur when the window opens.
    #[serde(default = "default_background_blur")]
    pub(crate) background_blur: bool,
    /// Outer window size in device pixels.
    #[serde(default = "default_window_width")]
    pub(crate) window_width: i32,
    #[serde(default = "default_window_height")]
    pub(crate) window_height: i32,
}

fn default_background_blur() -> bool {
    true
}

fn default_window_width() -> i32 {
    720
}

fn default_window_height() -> i32 {
    480
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            background_blur: default_background_blur(),
            window_width: default_window_width(),
            window_height: default_window_height(),
        }
    }
}

impl Settings {
    /// Record a blur menu toggle whose native call returned `applied`.
    ///
    /// A failed enable is not remembered, so later launches do not retry a
    /// blur the OS cannot render. Turning the blur off is always remembered.
    /// Returns `true` when the settings should be saved.
    pub(crate) fn record_blur_toggle(&mut self, on: bool, applied: bool) -> bool {
        if on && !applied {
            return false;
        }
        self.background_blur = on;
        true
    }
}

// ── Format version ────────────────────────────────────────────────────────────

const SETTINGS_VERSION: u32 = 1;

// ── Path ──────────────────────────────────────────────────────────────────────

/// Return the path to the settings file: `%APPDATA%\Frost\settings.json`.
///
/// Returns `None` if the `APPDATA` environment variable is not set.
pub(crate) fn settings_path() -> Option<PathBuf> {
    let appdata = std::env::var_os("APPDATA")?;
    let mut p = PathBuf::from(appdata);
    p.push("Frost");
    p.push("settings.json");
    Some(p)
}

// ── Save ──────────────────────────────────────────────────────────────────────

/// Write `settings`, creating the `Frost` directory if needed.
pub(crate) fn save(settings: &Settings) -> io::Result<()> {
    let path = settings_path()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "APPDATA not set"))?;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }

    let file = fs::File::create(&path)?;
    serde_json::to_writer_pretty(file, settings).map_err(io::Error::other)
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Read and parse the settings file.
///
/// Returns `None` when the file is missing, unparsable, or from another
/// format version; the caller falls back to `Settings::default()`.
pub(crate) fn load() -> Option<Settings> {
    let path = settings_path()?;
    let data = fs::read(&path).ok()?;
    parse(&data)
}

fn parse(data: &[u8]) -> Option<Settings> {
    let settings: Settings = serde_json::from_slice(data).ok()?;
    if settings.version != SETTINGS_VERSION {
        return None;
    }
    Some(settings)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
