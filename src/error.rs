//! Error types for native buffer marshaling and registry value decoding.
//!
//! Null inputs, empty strings and unrecognized registry value types are not
//! errors; they have defined results. The variants below cover allocation
//! failure and reads that would step outside a buffer.

use thiserror::Error;

/// Result type alias for marshaling operations.
pub type Result<T> = std::result::Result<T, MarshalError>;

/// Errors that can occur while allocating, reading or decoding native buffers.
#[derive(Error, Debug)]
pub enum MarshalError {
    /// The allocator could not provide the requested block.
    #[error("Out of memory: failed to allocate {size} bytes (align {align})")]
    OutOfMemory {
        size: usize,
        align: usize,
    },

    /// The requested size and alignment do not form a valid layout.
    #[error("Invalid allocation layout: {size} bytes with align {align}")]
    InvalidLayout {
        size: usize,
        align: usize,
    },

    /// A read would go past the end of the buffer.
    #[error("Truncated data: expected {expected} bytes, got {actual} bytes")]
    TruncatedData {
        expected: usize,
        actual: usize,
    },

    /// A wide buffer holds an odd number of bytes.
    #[error("Wide buffer length {len} is not a multiple of 2")]
    UnalignedWideBuffer {
        len: usize,
    },

    /// Wide character data is not valid UTF-16.
    #[error("Invalid UTF-16 string data ({len} bytes)")]
    InvalidUtf16 {
        len: usize,
    },

    /// A REG_LINK value does not parse as a URI.
    #[error("Invalid link value {value:?}: {source}")]
    InvalidLink {
        value: String,
        #[source]
        source: url::ParseError,
    },
}

impl MarshalError {
    /// Creates a truncated data error.
    ///
    /// # Arguments
    ///
    /// * `expected` - Number of bytes the read needed
    /// * `actual` - Number of bytes actually available
    pub fn truncated(expected: usize, actual: usize) -> Self {
        Self::TruncatedData { expected, actual }
    }

    /// Creates an out of memory error for a failed allocation.
    pub fn out_of_memory(size: usize, align: usize) -> Self {
        Self::OutOfMemory { size, align }
    }

    /// Returns true if this error reports an allocation failure.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use reg_marshal::error::MarshalError;
    /// let err = MarshalError::out_of_memory(64, 2);
    /// assert!(err.is_out_of_memory());
    /// assert!(!MarshalError::truncated(4, 2).is_out_of_memory());
    /// ```
    pub fn is_out_of_memory(&self) -> bool {
        matches!(self, Self::OutOfMemory { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_message() {
        let err = MarshalError::truncated(8, 3);
        assert_eq!(err.to_string(), "Truncated data: expected 8 bytes, got 3 bytes");
    }

    #[test]
    fn test_invalid_link_keeps_source() {
        let source = url::Url::parse("not a uri").unwrap_err();
        let err = MarshalError::InvalidLink {
            value: "not a uri".to_string(),
            source,
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("not a uri"));
    }
}
