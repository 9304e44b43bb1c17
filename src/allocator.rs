//! Allocators backing native buffers.
//!
//! Every allocation names its allocator explicitly. [`SystemAllocator`] is
//! the default and goes through the global Rust heap; [`FnAllocator`] wraps a
//! caller-supplied pair of allocate/free functions so buffers can come from
//! an arena or a foreign heap.

use crate::error::{MarshalError, Result};
use std::alloc::{self, Layout};
use std::ptr::NonNull;
use tracing::trace;

/// A source of zero-initialized native memory.
///
/// # Safety
///
/// Implementations must return blocks valid for reads and writes of
/// `layout.size()` bytes, aligned to `layout.align()`, and fully zeroed.
/// A block returned by `allocate_zeroed` stays valid until it is passed to
/// `deallocate` on the same allocator with the same layout.
pub unsafe trait NativeAllocator {
    /// Allocates a zeroed block for `layout`.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::OutOfMemory`] if the block cannot be provided.
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<u8>>;

    /// Releases a block previously returned by `allocate_zeroed`.
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_zeroed` on this allocator with the same
    /// `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

unsafe impl<A: NativeAllocator + ?Sized> NativeAllocator for &A {
    #[inline]
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<u8>> {
        (**self).allocate_zeroed(layout)
    }

    #[inline]
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded contract.
        unsafe { (**self).deallocate(ptr, layout) }
    }
}

/// The process heap, through the global Rust allocator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SystemAllocator;

unsafe impl NativeAllocator for SystemAllocator {
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<u8>> {
        if layout.size() == 0 {
            return Err(MarshalError::InvalidLayout {
                size: 0,
                align: layout.align(),
            });
        }

        // SAFETY: `layout` has a non-zero size, checked above.
        let ptr = unsafe { alloc::alloc_zeroed(layout) };
        trace!(size = layout.size(), align = layout.align(), "System allocation");
        NonNull::new(ptr).ok_or_else(|| MarshalError::out_of_memory(layout.size(), layout.align()))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: caller guarantees `ptr` came from `alloc_zeroed` with `layout`.
        unsafe { alloc::dealloc(ptr.as_ptr(), layout) }
    }
}

/// An allocator built from caller-supplied functions.
///
/// The allocate function may return uninitialized memory; the block is
/// zeroed before it is handed out. Returning `None` reports out of memory.
pub struct FnAllocator<F, G>
where
    F: Fn(Layout) -> Option<NonNull<u8>>,
    G: Fn(NonNull<u8>, Layout),
{
    alloc_fn: F,
    free_fn: G,
}

impl<F, G> FnAllocator<F, G>
where
    F: Fn(Layout) -> Option<NonNull<u8>>,
    G: Fn(NonNull<u8>, Layout),
{
    /// Creates an allocator from an allocate function and a matching free function.
    ///
    /// # Safety
    ///
    /// `alloc_fn` must return blocks valid for `layout` (size and alignment)
    /// until they are passed to `free_fn`.
    pub unsafe fn new(alloc_fn: F, free_fn: G) -> Self {
        Self { alloc_fn, free_fn }
    }
}

unsafe impl<F, G> NativeAllocator for FnAllocator<F, G>
where
    F: Fn(Layout) -> Option<NonNull<u8>>,
    G: Fn(NonNull<u8>, Layout),
{
    fn allocate_zeroed(&self, layout: Layout) -> Result<NonNull<u8>> {
        let ptr = (self.alloc_fn)(layout)
            .ok_or_else(|| MarshalError::out_of_memory(layout.size(), layout.align()))?;
        // SAFETY: `new` requires blocks valid for `layout.size()` bytes.
        unsafe { ptr.as_ptr().write_bytes(0, layout.size()) };
        Ok(ptr)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        (self.free_fn)(ptr, layout)
    }
}

impl<F, G> std::fmt::Debug for FnAllocator<F, G>
where
    F: Fn(Layout) -> Option<NonNull<u8>>,
    G: Fn(NonNull<u8>, Layout),
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAllocator").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_system_allocation_is_zeroed() {
        let layout = Layout::from_size_align(16, 2).unwrap();
        let ptr = SystemAllocator.allocate_zeroed(layout).unwrap();
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), 16) };
        assert!(bytes.iter().all(|&b| b == 0));
        unsafe { SystemAllocator.deallocate(ptr, layout) };
    }

    #[test]
    fn test_system_rejects_zero_size() {
        let layout = Layout::from_size_align(0, 1).unwrap();
        assert!(matches!(
            SystemAllocator.allocate_zeroed(layout),
            Err(MarshalError::InvalidLayout { size: 0, .. })
        ));
    }

    #[test]
    fn test_fn_allocator_failure_is_out_of_memory() {
        let allocator = unsafe { FnAllocator::new(|_| None, |_, _| {}) };
        let layout = Layout::from_size_align(8, 1).unwrap();
        let err = allocator.allocate_zeroed(layout).unwrap_err();
        assert!(err.is_out_of_memory());
    }

    #[test]
    fn test_fn_allocator_routes_through_functions() {
        let allocs = Cell::new(0);
        let frees = Cell::new(0);
        let allocator = unsafe {
            FnAllocator::new(
                |layout| {
                    allocs.set(allocs.get() + 1);
                    NonNull::new(alloc::alloc(layout))
                },
                |ptr, layout| {
                    frees.set(frees.get() + 1);
                    alloc::dealloc(ptr.as_ptr(), layout)
                },
            )
        };

        let layout = Layout::from_size_align(4, 2).unwrap();
        let ptr = allocator.allocate_zeroed(layout).unwrap();
        unsafe { allocator.deallocate(ptr, layout) };
        assert_eq!(allocs.get(), 1);
        assert_eq!(frees.get(), 1);
    }
}
