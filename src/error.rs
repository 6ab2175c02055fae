// ── Central error type ────────────────────────────────────────────────────────
//
// All fallible operations in Frost return `error::Result<T>`.  Blur failures
// are expected outcomes on many machines: callers log them and carry on
// without the effect.  Only startup failures reach the user as a dialog.

use crate::platform::os_version::OsTier;

/// Every error that Frost can produce.
#[derive(Debug)]
pub enum FrostError {
    /// A Win32 API call returned a failure code.
    Win32 {
        /// The name of the failing function, for display purposes.
        function: &'static str,
        /// The raw Win32 error code (`GetLastError()` value) or HRESULT.
        code: u32,
    },

    /// A standard I/O error (settings file read or write).
    Io(std::io::Error),

    /// The running OS has no background blur on this tier.
    Unsupported { tier: OsTier },

    /// Desktop composition is switched off (Vista/7 basic theme).
    CompositionDisabled,

    /// An undocumented export could not be resolved at run time.
    MissingExport {
        module: &'static str,
        function: &'static str,
    },

    /// The native heap refused an allocation of `size` bytes.
    Allocation { size: usize },
}

impl std::fmt::Display for FrostError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Win32 { function, code } => {
                write!(f, "{function} failed (error {code:#010x})")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Unsupported { tier } => {
                write!(f, "background blur is not available on {}", tier.describe())
            }
            Self::CompositionDisabled => f.write_str("desktop composition is disabled"),
            Self::MissingExport { module, function } => {
                write!(f, "{module} does not export {function}")
            }
            Self::Allocation { size } => write!(f, "failed to allocate {size} bytes"),
        }
    }
}

impl std::error::Error for FrostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for FrostError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// Convert a windows-crate error (HRESULT) directly into a FrostError so that
// `?` can be used on `windows::core::Result<T>` throughout the platform module.
#[cfg(windows)]
impl From<windows::core::Error> for FrostError {
    fn from(e: windows::core::Error) -> Self {
        // HRESULT.0 is i32; reinterpret bits as u32 for display purposes.
        Self::Win32 {
            function: "windows",
            code: e.code().0 as u32,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FrostError>;
