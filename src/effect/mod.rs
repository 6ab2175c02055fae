// ── Background blur ───────────────────────────────────────────────────────────
//
// `BlurEffectApplier` picks the blur mechanism for the OS tier and drives it
// through the `Compositor` seam.  The real compositor lives in
// `platform::win32::compositor`; tests substitute a recording fake, so no
// code in this module touches Win32 directly.
//
//   Unsupported → fail, no native call
//   Legacy      → DwmIsCompositionEnabled, then DwmEnableBlurBehindWindow
//   NoBlur      → fail, no native call
//   Modern      → AccentPolicy in a NativeBuffer → SetWindowCompositionAttribute

pub(crate) mod buffer;

use std::{ffi::c_void, ptr::NonNull};

use tracing::{debug, info};

use crate::{
    error::{FrostError, Result},
    platform::os_version::OsTier,
};

use buffer::{Heap, NativeBuffer};

// ── Window handle ─────────────────────────────────────────────────────────────

/// A native top-level window handle, owned by the window system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WindowHandle(pub(crate) *mut c_void);

// ── Legacy blur-behind ────────────────────────────────────────────────────────

/// `DWM_BB_ENABLE`: `enable` is meaningful.
pub(crate) const BB_ENABLE: u32 = 0x0000_0001;
/// `DWM_BB_BLURREGION`: `region` is meaningful.
#[allow(dead_code)]
pub(crate) const BB_BLURREGION: u32 = 0x0000_0002;
/// `DWM_BB_TRANSITIONONMAXIMIZED`: `transition_on_maximized` is meaningful.
#[allow(dead_code)]
pub(crate) const BB_TRANSITIONONMAXIMIZED: u32 = 0x0000_0004;

/// Mirrors `DWM_BLURBEHIND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BlurBehind {
    pub(crate) flags: u32,
    pub(crate) enable: bool,
    /// `None` blurs the whole client area.
    pub(crate) region: Option<NonNull<c_void>>,
    pub(crate) transition_on_maximized: bool,
}

impl BlurBehind {
    fn whole_window(enable: bool) -> Self {
        Self {
            flags: BB_ENABLE,
            enable,
            region: None,
            transition_on_maximized: false,
        }
    }
}

// ── Modern accent policy ──────────────────────────────────────────────────────

/// `ACCENT_STATE` values understood by `SetWindowCompositionAttribute`.
#[allow(dead_code)] // gradient states are listed for the native value set
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AccentState {
    Disabled = 0,
    Gradient = 1,
    TransparentGradient = 2,
    BlurBehind = 3,
    Invalid = 4,
}

/// Mirrors the undocumented `ACCENT_POLICY` struct.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AccentPolicy {
    pub(crate) state: AccentState,
    pub(crate) flags: u32,
    /// 0xAABBGGRR; only read by the gradient states.
    pub(crate) gradient_color: u32,
    pub(crate) animation_id: u32,
}

impl AccentPolicy {
    fn new(state: AccentState) -> Self {
        Self {
            state,
            flags: 0,
            gradient_color: 0,
            animation_id: 0,
        }
    }
}

/// `WINDOWCOMPOSITIONATTRIB` tags. Only the accent policy is used.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CompositionAttribute {
    AccentPolicy = 19,
}

/// Mirrors `WINDOWCOMPOSITIONATTRIBDATA`: tag, opaque payload, payload size.
#[repr(C)]
#[derive(Debug)]
pub(crate) struct CompositionAttributeData {
    pub(crate) attribute: CompositionAttribute,
    pub(crate) data: *mut c_void,
    pub(crate) size: usize,
}

// ── Compositor seam ───────────────────────────────────────────────────────────

/// The three native calls the blur needs.
pub(crate) trait Compositor {
    /// `DwmIsCompositionEnabled`.
    fn is_composition_enabled(&self) -> Result<bool>;

    /// `DwmEnableBlurBehindWindow`.
    fn enable_blur_behind(&self, window: WindowHandle, blur: &BlurBehind) -> Result<()>;

    /// Whether `set_window_composition_attribute` can be called at all.
    /// Checked before the payload is allocated.
    fn check_composition_attribute(&self) -> Result<()> {
        Ok(())
    }

    /// `SetWindowCompositionAttribute`. A `FALSE` return is an `Err`.
    fn set_window_composition_attribute(
        &self,
        window: WindowHandle,
        data: &mut CompositionAttributeData,
    ) -> Result<()>;
}

// ── Applier ───────────────────────────────────────────────────────────────────

/// Requested end state of the effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlurState {
    On,
    Off,
}

/// Which native mechanism carried a successful request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlurPath {
    BlurBehind,
    AccentPolicy,
}

pub(crate) struct BlurEffectApplier<'a, C: Compositor, H: Heap> {
    compositor: &'a C,
    heap: &'a H,
}

impl<'a, C: Compositor, H: Heap> BlurEffectApplier<'a, C, H> {
    pub(crate) fn new(compositor: &'a C, heap: &'a H) -> Self {
        Self { compositor, heap }
    }

    /// Turn the blur on. Failures are logged at debug level and reported as
    /// `false`; the window simply stays opaque.
    pub(crate) fn enable(&self, window: WindowHandle, tier: OsTier) -> bool {
        self.apply_logged(window, tier, BlurState::On)
    }

    /// Turn the blur off again.
    pub(crate) fn disable(&self, window: WindowHandle, tier: OsTier) -> bool {
        self.apply_logged(window, tier, BlurState::Off)
    }

    fn apply_logged(&self, window: WindowHandle, tier: OsTier, state: BlurState) -> bool {
        match self.apply(window, tier, state) {
            Ok(path) => {
                info!(event = "effect.blur.applied", ?tier, ?state, ?path);
                true
            }
            Err(error) => {
                debug!(event = "effect.blur.failed", ?tier, ?state, %error);
                false
            }
        }
    }

    /// Apply `state` through whichever mechanism `tier` provides.
    pub(crate) fn apply(
        &self,
        window: WindowHandle,
        tier: OsTier,
        state: BlurState,
    ) -> Result<BlurPath> {
        match tier {
            OsTier::Unsupported | OsTier::NoBlur => Err(FrostError::Unsupported { tier }),
            OsTier::Legacy => self.apply_blur_behind(window, state),
            OsTier::Modern => self.apply_accent_policy(window, state),
        }
    }

    fn apply_blur_behind(&self, window: WindowHandle, state: BlurState) -> Result<BlurPath> {
        if !self.compositor.is_composition_enabled()? {
            return Err(FrostError::CompositionDisabled);
        }
        let blur = BlurBehind::whole_window(state == BlurState::On);
        self.compositor.enable_blur_behind(window, &blur)?;
        Ok(BlurPath::BlurBehind)
    }

    fn apply_accent_policy(&self, window: WindowHandle, state: BlurState) -> Result<BlurPath> {
        let accent = AccentPolicy::new(match state {
            BlurState::On => AccentState::BlurBehind,
            BlurState::Off => AccentState::Disabled,
        });

        self.compositor.check_composition_attribute()?;

        // Released when `buf` goes out of scope, whatever the outcome below.
        let buf = NativeBuffer::with_value(self.heap, accent)?;
        let mut data = CompositionAttributeData {
            attribute: CompositionAttribute::AccentPolicy,
            data: buf.as_mut_ptr(),
            size: buf.len(),
        };
        self.compositor.set_window_composition_attribute(window, &mut data)?;
        Ok(BlurPath::AccentPolicy)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        panic::{catch_unwind, AssertUnwindSafe},
    };

    use super::{buffer::CountingHeap, *};

    const WINDOW: WindowHandle = WindowHandle(0x1234 as *mut c_void);

    /// How the fake should answer the modern call.
    #[derive(Clone, Copy, Default)]
    enum AttributeReply {
        #[default]
        Accept,
        Reject,
        Panic,
    }

    /// Records every native call and replies as configured.
    #[derive(Default)]
    struct RecordingCompositor {
        composition: Option<bool>,
        blur_behind_fails: bool,
        export_missing: bool,
        attribute_reply: AttributeReply,

        composition_queries: Cell<usize>,
        blur_behind: RefCell<Vec<BlurBehind>>,
        accents: RefCell<Vec<(CompositionAttribute, usize, AccentPolicy)>>,
    }

    impl RecordingCompositor {
        fn composition(enabled: bool) -> Self {
            Self {
                composition: Some(enabled),
                ..Self::default()
            }
        }

        fn native_calls(&self) -> usize {
            self.composition_queries.get()
                + self.blur_behind.borrow().len()
                + self.accents.borrow().len()
        }
    }

    impl Compositor for RecordingCompositor {
        fn is_composition_enabled(&self) -> Result<bool> {
            self.composition_queries.set(self.composition_queries.get() + 1);
            self.composition.ok_or(FrostError::Win32 {
                function: "DwmIsCompositionEnabled",
                code: 0x8000_4005,
            })
        }

        fn enable_blur_behind(&self, window: WindowHandle, blur: &BlurBehind) -> Result<()> {
            assert_eq!(window, WINDOW);
            self.blur_behind.borrow_mut().push(*blur);
            if self.blur_behind_fails {
                return Err(FrostError::Win32 {
                    function: "DwmEnableBlurBehindWindow",
                    code: 0x8000_4005,
                });
            }
            Ok(())
        }

        fn check_composition_attribute(&self) -> Result<()> {
            if self.export_missing {
                return Err(FrostError::MissingExport {
                    module: "user32.dll",
                    function: "SetWindowCompositionAttribute",
                });
            }
            Ok(())
        }

        fn set_window_composition_attribute(
            &self,
            window: WindowHandle,
            data: &mut CompositionAttributeData,
        ) -> Result<()> {
            assert_eq!(window, WINDOW);
            assert_eq!(data.size, std::mem::size_of::<AccentPolicy>());
            // SAFETY: the applier always passes a live AccentPolicy block.
            #[allow(unsafe_code)]
            let accent = unsafe { data.data.cast::<AccentPolicy>().read() };
            self.accents.borrow_mut().push((data.attribute, data.size, accent));

            match self.attribute_reply {
                AttributeReply::Accept => Ok(()),
                AttributeReply::Reject => Err(FrostError::Win32 {
                    function: "SetWindowCompositionAttribute",
                    code: 0,
                }),
                AttributeReply::Panic => panic!("compositor blew up"),
            }
        }
    }

    // ── Tier dispatch ─────────────────────────────────────────────────────────

    #[test]
    fn unsupported_os_fails_without_native_calls() {
        let compositor = RecordingCompositor::composition(true);
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        assert!(!applier.enable(WINDOW, OsTier::Unsupported));
        assert_eq!(compositor.native_calls(), 0);
        assert_eq!(heap.allocations.get(), 0);
    }

    #[test]
    fn intermediate_tier_calls_neither_api() {
        let compositor = RecordingCompositor::composition(true);
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        let err = applier.apply(WINDOW, OsTier::NoBlur, BlurState::On).unwrap_err();
        assert!(matches!(err, FrostError::Unsupported { tier: OsTier::NoBlur }));
        assert!(!applier.enable(WINDOW, OsTier::NoBlur));
        assert_eq!(compositor.native_calls(), 0);
        assert_eq!(heap.allocations.get(), 0);
    }

    // ── Legacy path ───────────────────────────────────────────────────────────

    #[test]
    fn legacy_success_requests_whole_window_blur() {
        let compositor = RecordingCompositor::composition(true);
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        assert!(applier.enable(WINDOW, OsTier::Legacy));

        let calls = compositor.blur_behind.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].flags, BB_ENABLE);
        assert!(calls[0].enable);
        assert_eq!(calls[0].region, None);
        assert!(!calls[0].transition_on_maximized);
        assert_eq!(heap.allocations.get(), 0, "legacy path needs no heap block");
    }

    #[test]
    fn legacy_with_composition_disabled_skips_blur_behind() {
        let compositor = RecordingCompositor::composition(false);
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        let err = applier.apply(WINDOW, OsTier::Legacy, BlurState::On).unwrap_err();
        assert!(matches!(err, FrostError::CompositionDisabled));
        assert!(compositor.blur_behind.borrow().is_empty());
    }

    #[test]
    fn legacy_with_failed_composition_query_skips_blur_behind() {
        let compositor = RecordingCompositor::default();
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        assert!(!applier.enable(WINDOW, OsTier::Legacy));
        assert_eq!(compositor.composition_queries.get(), 1);
        assert!(compositor.blur_behind.borrow().is_empty());
    }

    #[test]
    fn legacy_call_failure_is_reported() {
        let compositor = RecordingCompositor {
            blur_behind_fails: true,
            ..RecordingCompositor::composition(true)
        };
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        assert!(!applier.enable(WINDOW, OsTier::Legacy));
        assert_eq!(compositor.blur_behind.borrow().len(), 1);
    }

    #[test]
    fn legacy_disable_clears_enable_flag() {
        let compositor = RecordingCompositor::composition(true);
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        assert!(applier.disable(WINDOW, OsTier::Legacy));
        let calls = compositor.blur_behind.borrow();
        assert_eq!(calls[0].flags, BB_ENABLE);
        assert!(!calls[0].enable);
    }

    // ── Modern path ───────────────────────────────────────────────────────────

    #[test]
    fn modern_success_sends_blur_behind_accent() {
        let compositor = RecordingCompositor::default();
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        let path = applier.apply(WINDOW, OsTier::Modern, BlurState::On).expect("apply");
        assert_eq!(path, BlurPath::AccentPolicy);

        let accents = compositor.accents.borrow();
        assert_eq!(accents.len(), 1);
        let (attribute, size, accent) = accents[0];
        assert_eq!(attribute, CompositionAttribute::AccentPolicy);
        assert_eq!(size, 16);
        assert_eq!(accent, AccentPolicy::new(AccentState::BlurBehind));

        assert_eq!(heap.allocations.get(), 1);
        assert_eq!(heap.releases.get(), 1);
        assert_eq!(compositor.composition_queries.get(), 0);
    }

    #[test]
    fn modern_rejection_fails_with_one_alloc_and_one_free() {
        let compositor = RecordingCompositor {
            attribute_reply: AttributeReply::Reject,
            ..RecordingCompositor::default()
        };
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        assert!(!applier.enable(WINDOW, OsTier::Modern));
        assert_eq!(heap.allocations.get(), 1);
        assert_eq!(heap.releases.get(), 1);
    }

    #[test]
    fn modern_panic_still_frees_the_block() {
        let compositor = RecordingCompositor {
            attribute_reply: AttributeReply::Panic,
            ..RecordingCompositor::default()
        };
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        let outcome = catch_unwind(AssertUnwindSafe(|| applier.enable(WINDOW, OsTier::Modern)));
        assert!(outcome.is_err());
        assert_eq!(heap.allocations.get(), 1);
        assert_eq!(heap.releases.get(), 1);
    }

    #[test]
    fn modern_allocation_failure_never_reaches_the_compositor() {
        let compositor = RecordingCompositor::default();
        let heap = CountingHeap::exhausted();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        let err = applier.apply(WINDOW, OsTier::Modern, BlurState::On).unwrap_err();
        assert!(matches!(err, FrostError::Allocation { size: 16 }));
        assert!(compositor.accents.borrow().is_empty());
        assert_eq!(heap.releases.get(), 0);
    }

    #[test]
    fn missing_export_fails_before_allocating() {
        let compositor = RecordingCompositor {
            export_missing: true,
            ..RecordingCompositor::default()
        };
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        let err = applier.apply(WINDOW, OsTier::Modern, BlurState::On).unwrap_err();
        assert!(matches!(err, FrostError::MissingExport { .. }), "got {err:?}");
        assert!(!applier.enable(WINDOW, OsTier::Modern));
        assert_eq!(heap.allocations.get(), 0);
        assert_eq!(heap.releases.get(), 0);
        assert!(compositor.accents.borrow().is_empty());
    }

    /// The legacy path never needs the undocumented export.
    #[test]
    fn missing_export_does_not_affect_legacy_tier() {
        let compositor = RecordingCompositor {
            export_missing: true,
            ..RecordingCompositor::composition(true)
        };
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        assert!(applier.enable(WINDOW, OsTier::Legacy));
    }

    #[test]
    fn allocations_balance_across_repeated_toggles() {
        let compositor = RecordingCompositor::default();
        let heap = CountingHeap::default();
        let applier = BlurEffectApplier::new(&compositor, &heap);

        for _ in 0..3 {
            assert!(applier.enable(WINDOW, OsTier::Modern));
            assert!(applier.disable(WINDOW, OsTier::Modern));
        }
        assert_eq!(heap.allocations.get(), 6);
        assert_eq!(heap.releases.get(), 6);

        let states: Vec<_> = compositor.accents.borrow().iter().map(|a| a.2.state).collect();
        assert_eq!(states[..2], [AccentState::BlurBehind, AccentState::Disabled]);
    }
}
