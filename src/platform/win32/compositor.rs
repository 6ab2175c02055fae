// ── DWM compositor ────────────────────────────────────────────────────────────
//
// Real implementation of `effect::Compositor`.
//
// `SetWindowCompositionAttribute` is undocumented and absent from the Win32
// metadata, so it is resolved from user32.dll once, in `DwmCompositor::new`.
// user32 is already mapped into every GUI process, so `GetModuleHandleA`
// suffices and no `FreeLibrary` is owed.  The export is missing on Vista;
// that only matters on the modern tier, so resolution failure is recorded
// rather than returned.

#![allow(unsafe_code)]

use windows::{
    core::PCSTR,
    Win32::{
        Foundation::{GetLastError, BOOL, HWND},
        Graphics::{
            Dwm::{DwmEnableBlurBehindWindow, DwmIsCompositionEnabled, DWM_BLURBEHIND},
            Gdi::HRGN,
        },
        System::LibraryLoader::{GetModuleHandleA, GetProcAddress},
    },
};

use crate::{
    effect::{BlurBehind, CompositionAttributeData, Compositor, WindowHandle},
    error::{FrostError, Result},
};

/// `BOOL WINAPI SetWindowCompositionAttribute(HWND, WINDOWCOMPOSITIONATTRIBDATA*)`
type SetWindowCompositionAttributeFn =
    unsafe extern "system" fn(HWND, *mut CompositionAttributeData) -> BOOL;

// Null-terminated for the ANSI loader calls; `name()` strips the terminator
// for error messages.
const USER32: &str = "user32.dll\0";
const SET_WCA: &str = "SetWindowCompositionAttribute\0";

fn name(z: &'static str) -> &'static str {
    z.trim_end_matches('\0')
}

/// Talks to the Desktop Window Manager on behalf of `BlurEffectApplier`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DwmCompositor {
    set_wca: Option<SetWindowCompositionAttributeFn>,
}

impl DwmCompositor {
    pub(crate) fn new() -> Self {
        let set_wca = match Self::resolve_set_wca() {
            Ok(f) => Some(f),
            Err(error) => {
                tracing::debug!(event = "platform.compositor.export_missing", %error);
                None
            }
        };
        Self { set_wca }
    }

    fn resolve_set_wca() -> Result<SetWindowCompositionAttributeFn> {
        // SAFETY: USER32 is a null-terminated ANSI string with static lifetime.
        let user32 =
            unsafe { GetModuleHandleA(PCSTR(USER32.as_ptr())) }.map_err(FrostError::from)?;

        // SAFETY: user32 is a loaded module handle; SET_WCA is a null-terminated
        // ANSI string with static lifetime.
        let proc = unsafe { GetProcAddress(user32, PCSTR(SET_WCA.as_ptr())) }.ok_or(
            FrostError::MissingExport {
                module: name(USER32),
                function: name(SET_WCA),
            },
        )?;

        // SAFETY: the export has had this signature since Windows 7; the
        // pointer is only reinterpreted, never called with another ABI.
        Ok(unsafe {
            std::mem::transmute::<unsafe extern "system" fn() -> isize, SetWindowCompositionAttributeFn>(
                proc,
            )
        })
    }

    fn set_wca(&self) -> Result<SetWindowCompositionAttributeFn> {
        self.set_wca.ok_or(FrostError::MissingExport {
            module: name(USER32),
            function: name(SET_WCA),
        })
    }
}

impl Compositor for DwmCompositor {
    fn is_composition_enabled(&self) -> Result<bool> {
        // SAFETY: DwmIsCompositionEnabled takes no pointers we own.
        let enabled = unsafe { DwmIsCompositionEnabled() }.map_err(FrostError::from)?;
        Ok(enabled.as_bool())
    }

    fn enable_blur_behind(&self, window: WindowHandle, blur: &BlurBehind) -> Result<()> {
        let bb = DWM_BLURBEHIND {
            dwFlags: blur.flags,
            fEnable: BOOL::from(blur.enable),
            hRgnBlur: HRGN(blur.region.map_or(std::ptr::null_mut(), |r| r.as_ptr())),
            fTransitionOnMaximized: BOOL::from(blur.transition_on_maximized),
        };

        // SAFETY: window is a live top-level HWND owned by the caller; bb lives
        // on this stack frame for the duration of the call.
        unsafe { DwmEnableBlurBehindWindow(HWND(window.0), &bb) }.map_err(FrostError::from)
    }

    fn check_composition_attribute(&self) -> Result<()> {
        self.set_wca().map(|_| ())
    }

    fn set_window_composition_attribute(
        &self,
        window: WindowHandle,
        data: &mut CompositionAttributeData,
    ) -> Result<()> {
        let set_wca = self.set_wca()?;

        // SAFETY: window is a live top-level HWND owned by the caller; data
        // and the payload it points at outlive the call.
        let ok = unsafe { set_wca(HWND(window.0), data) };
        if ok.as_bool() {
            return Ok(());
        }

        // SAFETY: GetLastError reads thread-local state set by the call above.
        let code = unsafe { GetLastError() };
        Err(FrostError::Win32 {
            function: "SetWindowCompositionAttribute",
            code: code.0,
        })
    }
}
