//! Allocation, reading and release of native string buffers.
//!
//! Every allocating function has a plain form that uses [`SystemAllocator`]
//! and an `_in` form taking an explicit allocator. Null inputs (`None`) are
//! not errors: they produce `None`, the Rust spelling of a null address.
//!
//! # Examples
//!
//! ```rust
//! use reg_marshal::{strings, CharWidth};
//!
//! # fn main() -> reg_marshal::Result<()> {
//! let buffer = strings::allocate_string(Some("HKLM"), CharWidth::Wide)?;
//! assert_eq!(buffer.as_ref().map(|b| b.len()), Some(10));
//!
//! let text = strings::read_string(buffer.as_ref(), CharWidth::Wide)?;
//! assert_eq!(text.as_deref(), Some("HKLM"));
//!
//! strings::free_string(buffer);
//! # Ok(())
//! # }
//! ```

use crate::address::is_sentinel;
use crate::allocator::{NativeAllocator, SystemAllocator};
use crate::buffer::{NativeBuffer, NativeView};
use crate::error::{MarshalError, Result};
use crate::secret::SecretString;
use crate::utils::{decode_string, encode_chars_into, encoded_len, encoded_len_chars, read_terminated_string};
use crate::width::CharWidth;
use std::ptr::NonNull;
use tracing::{debug, instrument};
use zeroize::Zeroize;

/// Allocates zeroed room for `count` characters from the system allocator.
///
/// See [`allocate_chars_in`].
pub fn allocate_chars(count: usize, width: CharWidth) -> Result<Option<NativeBuffer>> {
    allocate_chars_in(count, width, SystemAllocator)
}

/// Allocates zeroed room for `count` characters of `width` bytes each.
///
/// The block is `count * width` bytes, so it already starts with a
/// terminator. `count == 0` returns `None`.
///
/// # Errors
///
/// Returns [`MarshalError::OutOfMemory`] if the allocator fails and
/// [`MarshalError::InvalidLayout`] if the size overflows.
#[instrument(level = "debug", skip_all, fields(count = count, width = width.name()))]
pub fn allocate_chars_in<A: NativeAllocator>(
    count: usize,
    width: CharWidth,
    allocator: A,
) -> Result<Option<NativeBuffer<A>>> {
    if count == 0 {
        return Ok(None);
    }

    let len = count
        .checked_mul(width.bytes())
        .ok_or(MarshalError::InvalidLayout {
            size: usize::MAX,
            align: width.bytes(),
        })?;
    NativeBuffer::zeroed_in(len, width, allocator).map(Some)
}

/// Copies `value` into a new system-allocated buffer with a terminator.
///
/// See [`allocate_string_in`].
pub fn allocate_string(value: Option<&str>, width: CharWidth) -> Result<Option<NativeBuffer>> {
    allocate_string_in(value, width, SystemAllocator)
}

/// Copies `value` into a new buffer from `allocator`, followed by a
/// `width`-byte terminator.
///
/// Returns `None` for a `None` input.
///
/// # Errors
///
/// Returns [`MarshalError::OutOfMemory`] if the allocator fails.
#[instrument(level = "debug", skip_all, fields(width = width.name()))]
pub fn allocate_string_in<A: NativeAllocator>(
    value: Option<&str>,
    width: CharWidth,
    allocator: A,
) -> Result<Option<NativeBuffer<A>>> {
    let Some(value) = value else {
        return Ok(None);
    };

    let len = encoded_len(value, width) + width.bytes();
    let mut buffer = NativeBuffer::zeroed_in(len, width, allocator)?;
    encode_chars_into(value.chars(), width, buffer.as_mut_bytes())?;
    Ok(Some(buffer))
}

/// Copies a secret into a new system-allocated buffer.
///
/// See [`allocate_secret_in`].
pub fn allocate_secret(secret: Option<&SecretString>, width: CharWidth) -> Result<Option<NativeBuffer>> {
    allocate_secret_in(secret, width, SystemAllocator)
}

/// Copies a secret into a new buffer from `allocator`, followed by a
/// terminator.
///
/// Characters are encoded straight from the secret's storage into the
/// native block; no intermediate string is built on either allocator path.
/// Drop the returned buffer (or call [`NativeBuffer::free_secret`]) to wipe
/// and release it.
///
/// # Errors
///
/// Returns [`MarshalError::OutOfMemory`] if the allocator fails.
#[instrument(level = "debug", skip_all, fields(width = width.name()))]
pub fn allocate_secret_in<A: NativeAllocator>(
    secret: Option<&SecretString>,
    width: CharWidth,
    allocator: A,
) -> Result<Option<NativeBuffer<A>>> {
    let Some(secret) = secret else {
        return Ok(None);
    };

    let len = encoded_len_chars(secret.chars(), width) + width.bytes();
    let mut buffer = NativeBuffer::zeroed_in(len, width, allocator)?;
    encode_chars_into(secret.chars(), width, buffer.as_mut_bytes())?;
    debug!(len, "Copied secret into native buffer");
    Ok(Some(buffer))
}

/// Wipes `size_in_bytes` bytes at `address`, then hands it to `freer`.
///
/// This is for blocks owned by foreign code (for example returned by an OS
/// call). Sentinel addresses are ignored and `freer` is not called.
///
/// # Safety
///
/// Unless `address` is a sentinel, it must be valid for writes of
/// `size_in_bytes` bytes, and must be a block `freer` can release. It must
/// not be used after this call.
pub unsafe fn free_secret<F>(address: *mut u8, size_in_bytes: usize, freer: F)
where
    F: FnOnce(NonNull<u8>),
{
    if is_sentinel(address as usize) {
        return;
    }

    // SAFETY: caller guarantees `address` is valid for `size_in_bytes` writes.
    let bytes = unsafe { std::slice::from_raw_parts_mut(address, size_in_bytes) };
    bytes.zeroize();
    debug!(size_in_bytes, "Wiped foreign secret buffer");

    // SAFETY: non-sentinel addresses are never null.
    freer(unsafe { NonNull::new_unchecked(address) });
}

/// Wipes and releases a string buffer; `None` is a no-op.
pub fn free_string<A: NativeAllocator>(buffer: Option<NativeBuffer<A>>) {
    drop(buffer);
}

/// Encodes `value` at `width`, optionally followed by a terminator.
///
/// # Examples
///
/// ```rust
/// use reg_marshal::{strings::get_bytes, CharWidth};
///
/// assert_eq!(get_bytes("Hi", true, CharWidth::Wide), vec![b'H', 0, b'i', 0, 0, 0]);
/// assert_eq!(get_bytes("Hi", false, CharWidth::Narrow), b"Hi".to_vec());
/// ```
pub fn get_bytes(value: &str, include_terminator: bool, width: CharWidth) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(get_byte_count(Some(value), include_terminator, width));

    match width {
        CharWidth::Narrow => bytes.extend_from_slice(value.as_bytes()),
        CharWidth::Wide => {
            for unit in value.encode_utf16() {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
        }
    }

    if include_terminator {
        bytes.extend_from_slice(width.terminator());
    }
    bytes
}

/// Returns the exact length [`get_bytes`] would produce; `None` counts as 0.
pub fn get_byte_count(value: Option<&str>, include_terminator: bool, width: CharWidth) -> usize {
    match value {
        Some(value) => {
            let terminator = if include_terminator { width.bytes() } else { 0 };
            encoded_len(value, width) + terminator
        }
        None => 0,
    }
}

/// Reads the string at the start of `view`, up to its terminator.
///
/// Without a terminator the whole view is read. Sentinel views yield `None`.
///
/// # Errors
///
/// Returns an error if wide data is not valid UTF-16.
pub fn read_string<'a, V>(view: V, width: CharWidth) -> Result<Option<String>>
where
    V: Into<NativeView<'a>>,
{
    match view.into() {
        NativeView::Bytes(bytes) => read_terminated_string(bytes, width).map(Some),
        NativeView::Sentinel(_) => Ok(None),
    }
}

/// Reads exactly `length` characters from `view`, embedded nulls included.
///
/// Sentinel views yield `None`.
///
/// # Errors
///
/// Returns [`MarshalError::TruncatedData`] if the view holds fewer than
/// `length` characters.
pub fn read_string_len<'a, V>(view: V, length: usize, width: CharWidth) -> Result<Option<String>>
where
    V: Into<NativeView<'a>>,
{
    let view = view.into();
    let size = length
        .checked_mul(width.bytes())
        .ok_or_else(|| MarshalError::truncated(usize::MAX, view.len()))?;

    match view.prefix(size)? {
        Some(bytes) => decode_string(bytes, width).map(Some),
        None => Ok(None),
    }
}

/// Replaces the buffer in `slot` with a fresh copy of `new_value`.
///
/// The previous buffer is wiped and released exactly once, before the new
/// one is allocated. On return `slot` holds the new buffer, or `None` when
/// `new_value` is `None` or the allocation failed.
///
/// Returns the new length in characters (terminator excluded), or `None`
/// when the slot is now empty.
///
/// # Errors
///
/// Returns [`MarshalError::OutOfMemory`] if the allocator fails; `slot` is
/// left empty in that case.
pub fn refresh_string<A: NativeAllocator>(
    slot: &mut Option<NativeBuffer<A>>,
    new_value: Option<&str>,
    width: CharWidth,
    allocator: A,
) -> Result<Option<usize>> {
    free_string(slot.take());

    *slot = allocate_string_in(new_value, width, allocator)?;
    Ok(slot
        .as_ref()
        .map(|buffer| buffer.char_capacity() - 1))
}
