//! Native address values.
//!
//! Win32 APIs reuse pointer-sized slots for small integers (resource IDs,
//! atoms, predefined handles). Anything below [`SENTINEL_THRESHOLD`] is such
//! an encoded integer rather than a usable memory location, and is never
//! dereferenced.

use std::fmt;

/// Raw address values below this threshold are sentinels, not pointers.
pub const SENTINEL_THRESHOLD: usize = 0x10000;

/// Returns true if `raw` is a sentinel (null or an encoded integer).
///
/// # Examples
///
/// ```rust
/// use reg_marshal::address::is_sentinel;
///
/// assert!(is_sentinel(0));
/// assert!(is_sentinel(0xFFFF));
/// assert!(!is_sentinel(0x10000));
/// ```
#[inline]
pub const fn is_sentinel(raw: usize) -> bool {
    raw < SENTINEL_THRESHOLD
}

/// A classified native address.
///
/// This is a plain value: it records where a buffer lived and how long it
/// was, but grants no access to the memory itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NativeAddress {
    /// A real memory location with its length in bytes.
    Valid {
        /// Base address.
        address: usize,
        /// Length in bytes.
        len: usize,
    },

    /// An encoded integer (including null) stored in an address slot.
    Sentinel(usize),
}

impl NativeAddress {
    /// The null address.
    pub const NULL: NativeAddress = NativeAddress::Sentinel(0);

    /// Classifies a raw address value.
    pub const fn classify(raw: usize, len: usize) -> Self {
        if is_sentinel(raw) {
            NativeAddress::Sentinel(raw)
        } else {
            NativeAddress::Valid { address: raw, len }
        }
    }

    /// Returns true if this is a sentinel.
    #[inline]
    pub const fn is_sentinel(&self) -> bool {
        matches!(self, NativeAddress::Sentinel(_))
    }

    /// Returns true if this is the null address.
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, NativeAddress::Sentinel(0))
    }

    /// Returns the raw address value.
    #[inline]
    pub const fn raw(&self) -> usize {
        match *self {
            NativeAddress::Valid { address, .. } => address,
            NativeAddress::Sentinel(raw) => raw,
        }
    }

    /// Returns the length in bytes (0 for sentinels).
    #[inline]
    pub const fn len(&self) -> usize {
        match *self {
            NativeAddress::Valid { len, .. } => len,
            NativeAddress::Sentinel(_) => 0,
        }
    }

    /// Returns true if no bytes are addressable.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NativeAddress {
    fn default() -> Self {
        NativeAddress::NULL
    }
}

impl fmt::Display for NativeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeAddress::Valid { address, len } => write!(f, "{:#x} ({} bytes)", address, len),
            NativeAddress::Sentinel(raw) => write!(f, "sentinel {:#x}", raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundary() {
        assert_eq!(NativeAddress::classify(0, 8), NativeAddress::NULL);
        assert_eq!(NativeAddress::classify(0xFFFF, 8), NativeAddress::Sentinel(0xFFFF));
        assert_eq!(
            NativeAddress::classify(0x10000, 8),
            NativeAddress::Valid { address: 0x10000, len: 8 }
        );
    }

    #[test]
    fn test_sentinel_has_no_length() {
        let addr = NativeAddress::classify(42, 100);
        assert!(addr.is_sentinel());
        assert!(!addr.is_null());
        assert_eq!(addr.raw(), 42);
        assert!(addr.is_empty());
    }

    #[test]
    fn test_display() {
        assert_eq!(NativeAddress::Sentinel(5).to_string(), "sentinel 0x5");
        let valid = NativeAddress::Valid { address: 0x20000, len: 4 };
        assert_eq!(valid.to_string(), "0x20000 (4 bytes)");
    }
}
