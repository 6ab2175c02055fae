// ── OS capability tiers ───────────────────────────────────────────────────────
//
// Pure classification, no FFI.  The real version numbers come from
// `win32::version::detect()`; everything downstream only sees an `OsTier`.

/// Windows version triple as reported by the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct OsVersion {
    pub(crate) major: u32,
    pub(crate) minor: u32,
    pub(crate) build: u32,
}

/// Windows Vista: first release with the DWM compositor.
const VISTA: OsVersion = OsVersion::new(6, 0, 0);
/// Windows 8: blur-behind became a no-op.
const WINDOWS_8: OsVersion = OsVersion::new(6, 2, 0);
/// Windows 10 Threshold 1 (build 10240): accent policy blur.
const WINDOWS_10_TH1: OsVersion = OsVersion::new(10, 0, 10240);

impl OsVersion {
    pub(crate) const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self { major, minor, build }
    }

    /// Which blur mechanism, if any, this version offers.
    pub(crate) fn tier(self) -> OsTier {
        if self < VISTA {
            OsTier::Unsupported
        } else if self < WINDOWS_8 {
            OsTier::Legacy
        } else if self < WINDOWS_10_TH1 {
            OsTier::NoBlur
        } else {
            OsTier::Modern
        }
    }
}

impl std::fmt::Display for OsVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// Compositor capability, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum OsTier {
    /// Before Vista: no desktop compositor at all.
    Unsupported,
    /// Vista and 7: `DwmEnableBlurBehindWindow`.
    Legacy,
    /// 8 and 8.1: DWM is always on but renders no blur.
    NoBlur,
    /// 10 TH1 and later: `SetWindowCompositionAttribute` accent policy.
    Modern,
}

impl OsTier {
    /// Human-readable name used in the About box and in error messages.
    pub(crate) fn describe(self) -> &'static str {
        match self {
            Self::Unsupported => "Windows XP or earlier",
            Self::Legacy => "Windows Vista/7 (DWM blur-behind)",
            Self::NoBlur => "Windows 8/8.1",
            Self::Modern => "Windows 10 or later (accent policy blur)",
        }
    }
}
