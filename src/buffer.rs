//! Owned native buffers and borrowed views over native memory.
//!
//! A [`NativeBuffer`] is the only owner of its block. It cannot be cloned,
//! and dropping it zero-fills the block before handing it back to the
//! allocator that produced it, so a block is released exactly once and never
//! in cleartext.
//!
//! A [`NativeView`] is what readers and the registry value decoder consume:
//! either a bounds-checked byte slice or a sentinel address that must not be
//! dereferenced.

use crate::address::{is_sentinel, NativeAddress};
use crate::allocator::{NativeAllocator, SystemAllocator};
use crate::error::{MarshalError, Result};
use crate::width::CharWidth;
use std::alloc::Layout;
use std::fmt;
use std::mem::ManuallyDrop;
use std::ptr::NonNull;
use tracing::{debug, trace};
use zeroize::Zeroize;

/// An exclusively owned block of zero-initialized native memory.
pub struct NativeBuffer<A: NativeAllocator = SystemAllocator> {
    ptr: NonNull<u8>,
    layout: Layout,
    width: CharWidth,
    allocator: A,
}

// SAFETY: the buffer uniquely owns its block; moving it to another thread
// moves that ownership along with the allocator needed to release it.
unsafe impl<A: NativeAllocator + Send> Send for NativeBuffer<A> {}

// SAFETY: shared references only expose `&[u8]`.
unsafe impl<A: NativeAllocator + Sync> Sync for NativeBuffer<A> {}

impl NativeBuffer<SystemAllocator> {
    /// Allocates `len` zeroed bytes from the system allocator.
    ///
    /// # Errors
    ///
    /// See [`NativeBuffer::zeroed_in`].
    pub fn zeroed(len: usize, width: CharWidth) -> Result<Self> {
        Self::zeroed_in(len, width, SystemAllocator)
    }
}

impl<A: NativeAllocator> NativeBuffer<A> {
    /// Allocates `len` zeroed bytes aligned for `width`-byte characters.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::UnalignedWideBuffer`] if a wide buffer would
    /// have an odd length, [`MarshalError::InvalidLayout`] for a zero or
    /// oversized length, and [`MarshalError::OutOfMemory`] if the allocator
    /// fails.
    pub fn zeroed_in(len: usize, width: CharWidth, allocator: A) -> Result<Self> {
        if len % width.bytes() != 0 {
            return Err(MarshalError::UnalignedWideBuffer { len });
        }
        if len == 0 {
            return Err(MarshalError::InvalidLayout {
                size: 0,
                align: width.bytes(),
            });
        }

        let layout = Layout::from_size_align(len, width.bytes()).map_err(|_| {
            MarshalError::InvalidLayout {
                size: len,
                align: width.bytes(),
            }
        })?;
        let ptr = allocator.allocate_zeroed(layout)?;
        debug!(len, width = width.name(), "Allocated native buffer");

        Ok(Self {
            ptr,
            layout,
            width,
            allocator,
        })
    }

    /// Rebuilds a buffer from parts produced by [`NativeBuffer::into_raw_parts`].
    ///
    /// # Safety
    ///
    /// `ptr` and `layout` must come from `into_raw_parts` on a buffer that
    /// used `allocator`, and the block must not have been released since.
    pub unsafe fn from_raw_parts_in(
        ptr: NonNull<u8>,
        layout: Layout,
        width: CharWidth,
        allocator: A,
    ) -> Self {
        Self {
            ptr,
            layout,
            width,
            allocator,
        }
    }

    /// Gives up ownership of the block without releasing it.
    ///
    /// Use this to hand a buffer to a foreign owner that frees it itself.
    /// The block is not zeroed.
    pub fn into_raw_parts(self) -> (NonNull<u8>, Layout, CharWidth, A) {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, so the allocator is moved out once.
        let allocator = unsafe { std::ptr::read(&this.allocator) };
        (this.ptr, this.layout, this.width, allocator)
    }

    /// Returns the length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.layout.size()
    }

    /// Always false: empty buffers are represented by `None`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the character width.
    #[inline]
    pub fn width(&self) -> CharWidth {
        self.width
    }

    /// Returns the capacity in characters (terminator included).
    #[inline]
    pub fn char_capacity(&self) -> usize {
        self.len() / self.width.bytes()
    }

    /// Returns the allocator that owns the block.
    #[inline]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    /// Returns the block contents.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the block is valid and initialized for `len` bytes while
        // `self` is alive.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len()) }
    }

    /// Returns the block contents mutably.
    #[inline]
    pub fn as_mut_bytes(&mut self) -> &mut [u8] {
        // SAFETY: as above, and `&mut self` guarantees exclusivity.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len()) }
    }

    /// Returns the base pointer for passing to a native call.
    #[inline]
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    /// Returns the base pointer for native calls that write into the buffer.
    #[inline]
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Returns the classified address of this buffer.
    #[inline]
    pub fn address(&self) -> NativeAddress {
        NativeAddress::Valid {
            address: self.ptr.as_ptr() as usize,
            len: self.len(),
        }
    }

    /// Borrows the buffer as a view.
    #[inline]
    pub fn view(&self) -> NativeView<'_> {
        NativeView::Bytes(self.as_bytes())
    }

    /// Zero-fills and releases the buffer.
    ///
    /// Equivalent to dropping it; spelled out for call sites handling secrets.
    pub fn free_secret(self) {
        trace!(len = self.len(), "Freeing secret buffer");
        drop(self);
    }
}

impl<A: NativeAllocator> Drop for NativeBuffer<A> {
    fn drop(&mut self) {
        self.as_mut_bytes().zeroize();
        // SAFETY: `ptr` came from `allocate_zeroed` on `self.allocator` with
        // `self.layout`, and ownership guarantees this runs once.
        unsafe { self.allocator.deallocate(self.ptr, self.layout) };
        trace!(len = self.layout.size(), "Released native buffer");
    }
}

impl<A: NativeAllocator> fmt::Debug for NativeBuffer<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeBuffer")
            .field("address", &self.address())
            .field("width", &self.width)
            .finish()
    }
}

/// A borrowed, bounds-checked view of native memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeView<'a> {
    /// Readable bytes.
    Bytes(&'a [u8]),

    /// A sentinel address; there is nothing to read.
    Sentinel(usize),
}

impl<'a> NativeView<'a> {
    /// The null view.
    pub const NULL: NativeView<'static> = NativeView::Sentinel(0);

    /// Views a byte slice.
    #[inline]
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        NativeView::Bytes(bytes)
    }

    /// Views memory returned by a native call.
    ///
    /// Sentinel addresses (below `0x10000`, including null) are recorded as
    /// such and never dereferenced.
    ///
    /// # Safety
    ///
    /// Unless `ptr` is a sentinel, it must be valid for reads of `len` bytes
    /// for the lifetime `'a`, and the memory must not be mutated meanwhile.
    pub unsafe fn from_raw(ptr: *const u8, len: usize) -> Self {
        let raw = ptr as usize;
        if is_sentinel(raw) {
            NativeView::Sentinel(raw)
        } else {
            // SAFETY: caller guarantees validity for non-sentinel pointers.
            NativeView::Bytes(unsafe { std::slice::from_raw_parts(ptr, len) })
        }
    }

    /// Returns the readable bytes, or `None` for a sentinel.
    #[inline]
    pub fn bytes(&self) -> Option<&'a [u8]> {
        match *self {
            NativeView::Bytes(bytes) => Some(bytes),
            NativeView::Sentinel(_) => None,
        }
    }

    /// Returns true if this view is a sentinel.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        matches!(self, NativeView::Sentinel(_))
    }

    /// Returns the number of readable bytes (0 for a sentinel).
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes().map_or(0, <[u8]>::len)
    }

    /// Returns true if there is nothing to read.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the classified address of the viewed memory.
    pub fn address(&self) -> NativeAddress {
        match *self {
            NativeView::Bytes(bytes) => NativeAddress::classify(bytes.as_ptr() as usize, bytes.len()),
            NativeView::Sentinel(raw) => NativeAddress::Sentinel(raw),
        }
    }

    /// Returns the first `size` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::TruncatedData`] if the view is shorter than
    /// `size`. A sentinel view yields `Ok(None)`.
    pub fn prefix(&self, size: usize) -> Result<Option<&'a [u8]>> {
        match *self {
            NativeView::Bytes(bytes) => bytes
                .get(..size)
                .map(Some)
                .ok_or_else(|| MarshalError::truncated(size, bytes.len())),
            NativeView::Sentinel(_) => Ok(None),
        }
    }
}

impl<'a> From<&'a [u8]> for NativeView<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        NativeView::Bytes(bytes)
    }
}

impl<'a, A: NativeAllocator> From<&'a NativeBuffer<A>> for NativeView<'a> {
    fn from(buffer: &'a NativeBuffer<A>) -> Self {
        buffer.view()
    }
}

impl<'a, A: NativeAllocator> From<Option<&'a NativeBuffer<A>>> for NativeView<'a> {
    fn from(buffer: Option<&'a NativeBuffer<A>>) -> Self {
        match buffer {
            Some(buffer) => buffer.view(),
            None => NativeView::NULL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeroed_buffer() {
        let buffer = NativeBuffer::zeroed(8, CharWidth::Wide).unwrap();
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.char_capacity(), 4);
        assert!(buffer.as_bytes().iter().all(|&b| b == 0));
        assert_eq!(buffer.as_ptr() as usize % 2, 0);
    }

    #[test]
    fn test_wide_buffer_must_be_even() {
        let result = NativeBuffer::zeroed(3, CharWidth::Wide);
        assert!(matches!(result, Err(MarshalError::UnalignedWideBuffer { len: 3 })));
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(NativeBuffer::zeroed(0, CharWidth::Narrow).is_err());
    }

    #[test]
    fn test_raw_parts_round_trip() {
        let mut buffer = NativeBuffer::zeroed(4, CharWidth::Narrow).unwrap();
        buffer.as_mut_bytes().copy_from_slice(b"abc\0");
        let (ptr, layout, width, allocator) = buffer.into_raw_parts();
        let buffer = unsafe { NativeBuffer::from_raw_parts_in(ptr, layout, width, allocator) };
        assert_eq!(buffer.as_bytes(), b"abc\0");
    }

    #[test]
    fn test_view_from_raw_sentinel() {
        let view = unsafe { NativeView::from_raw(0x1234 as *const u8, 16) };
        assert_eq!(view, NativeView::Sentinel(0x1234));
        assert_eq!(view.len(), 0);
        assert_eq!(view.address(), NativeAddress::Sentinel(0x1234));
    }

    #[test]
    fn test_view_from_raw_valid() {
        let data = vec![1u8, 2, 3, 4];
        let view = unsafe { NativeView::from_raw(data.as_ptr(), data.len()) };
        assert_eq!(view.bytes(), Some(&data[..]));
    }

    #[test]
    fn test_view_prefix_bounds() {
        let data = [1u8, 2, 3];
        let view = NativeView::from_slice(&data);
        assert_eq!(view.prefix(2).unwrap(), Some(&data[..2]));
        assert!(matches!(
            view.prefix(4),
            Err(MarshalError::TruncatedData { expected: 4, actual: 3 })
        ));
        assert_eq!(NativeView::NULL.prefix(4).unwrap(), None);
    }

    #[test]
    fn test_view_from_optional_buffer() {
        let none: Option<&NativeBuffer> = None;
        assert!(NativeView::from(none).is_sentinel());
    }
}
