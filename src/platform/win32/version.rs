#![allow(unsafe_code)]

use windows::{
    Wdk::System::SystemServices::RtlGetVersion,
    Win32::System::SystemInformation::OSVERSIONINFOW,
};

use crate::{
    error::{FrostError, Result},
    platform::os_version::{OsTier, OsVersion},
};

/// Read the real OS version from the kernel.
///
/// `GetVersionExW` reports whatever the application manifest claims to be
/// compatible with; `RtlGetVersion` does not.
pub(crate) fn detect() -> Result<OsVersion> {
    let mut info = OSVERSIONINFOW {
        dwOSVersionInfoSize: std::mem::size_of::<OSVERSIONINFOW>() as u32,
        ..Default::default()
    };

    // SAFETY: info is a valid, writable OSVERSIONINFOW with its size field set
    // as RtlGetVersion requires.
    let status = unsafe { RtlGetVersion(&mut info) };
    if status.is_err() {
        return Err(FrostError::Win32 {
            function: "RtlGetVersion",
            code: status.0 as u32,
        });
    }

    Ok(OsVersion::new(
        info.dwMajorVersion,
        info.dwMinorVersion,
        info.dwBuildNumber,
    ))
}

/// The blur tier of the running OS; `Unsupported` if detection fails.
pub(crate) fn detect_tier() -> OsTier {
    match detect() {
        Ok(version) => version.tier(),
        Err(error) => {
            tracing::warn!(event = "platform.version.detect_failed", %error);
            OsTier::Unsupported
        }
    }
}
