// ── Native heap buffer ────────────────────────────────────────────────────────
//
// `SetWindowCompositionAttribute` takes its payload through an opaque pointer
// plus a byte count.  `NativeBuffer` owns that payload for exactly one call:
// the allocation is released in `Drop`, so every exit path (early `?` return,
// rejected call, unwinding panic) frees it exactly once.
//
// This module allows `unsafe` for the raw allocation and the typed write.
// Every `unsafe` block MUST carry a `// SAFETY:` comment.

#![allow(unsafe_code)]

use std::{alloc::Layout, ffi::c_void, ptr::NonNull};

use crate::error::{FrostError, Result};

// ── Heap ──────────────────────────────────────────────────────────────────────

/// Source of raw memory handed to native code.
pub(crate) trait Heap {
    /// Allocate a block for `layout`, or `None` if the heap is exhausted.
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>>;

    /// Return a block to the heap.
    ///
    /// # Safety
    ///
    /// `ptr` must have come from `allocate` on this heap with the same
    /// `layout`, and must not have been released already.
    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The process heap, through the global allocator.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemHeap;

impl Heap for SystemHeap {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        // Zero-sized allocations are undefined behaviour for `alloc`.
        if layout.size() == 0 {
            return None;
        }
        // SAFETY: layout has a non-zero size (checked above).
        NonNull::new(unsafe { std::alloc::alloc(layout) })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the caller guarantees ptr came from `allocate` with layout.
        unsafe { std::alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

// ── NativeBuffer ──────────────────────────────────────────────────────────────

/// RAII owner of one heap block holding a copy of a `#[repr(C)]` value.
pub(crate) struct NativeBuffer<'h, H: Heap> {
    heap: &'h H,
    ptr: NonNull<u8>,
    layout: Layout,
}

impl<'h, H: Heap> NativeBuffer<'h, H> {
    /// Allocate a block sized and aligned for `T` and copy `value` into it.
    pub(crate) fn with_value<T: Copy>(heap: &'h H, value: T) -> Result<Self> {
        let layout = Layout::new::<T>();
        let ptr = heap
            .allocate(layout)
            .ok_or(FrostError::Allocation { size: layout.size() })?;

        // SAFETY: ptr is a fresh, exclusively owned block whose size and
        // alignment match `T` (it was allocated for `Layout::new::<T>()`).
        // `T: Copy` means no destructor is skipped by the bitwise write.
        unsafe { ptr.cast::<T>().as_ptr().write(value) };

        Ok(Self { heap, ptr, layout })
    }

    /// Opaque pointer for the native envelope.
    pub(crate) fn as_mut_ptr(&self) -> *mut c_void {
        self.ptr.as_ptr().cast()
    }

    /// Size of the block in bytes.
    pub(crate) fn len(&self) -> usize {
        self.layout.size()
    }
}

impl<H: Heap> Drop for NativeBuffer<'_, H> {
    fn drop(&mut self) {
        // SAFETY: ptr and layout are exactly what `allocate` returned in
        // `with_value`; `Drop` runs once, so the block is released once.
        unsafe { self.heap.release(self.ptr, self.layout) }
    }
}

// ── Test heap ─────────────────────────────────────────────────────────────────

/// A `SystemHeap` that counts calls, or refuses every allocation.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct CountingHeap {
    pub(crate) allocations: std::cell::Cell<usize>,
    pub(crate) releases: std::cell::Cell<usize>,
    pub(crate) exhausted: bool,
}

#[cfg(test)]
impl CountingHeap {
    pub(crate) fn exhausted() -> Self {
        Self {
            exhausted: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
impl Heap for CountingHeap {
    fn allocate(&self, layout: Layout) -> Option<NonNull<u8>> {
        if self.exhausted {
            return None;
        }
        self.allocations.set(self.allocations.get() + 1);
        SystemHeap.allocate(layout)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, layout: Layout) {
        self.releases.set(self.releases.get() + 1);
        // SAFETY: forwarded from the caller's contract; the block came from
        // `SystemHeap::allocate` above.
        unsafe { SystemHeap.release(ptr, layout) }
    }
}
