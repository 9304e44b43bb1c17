//! Character width selection for native string buffers.
//!
//! Narrow buffers hold UTF-8 code units (one byte each); wide buffers hold
//! UTF-16LE code units (two bytes each), matching the `W` flavour of the
//! Win32 API.

/// Number of bytes per character in a native string buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CharWidth {
    /// One byte per character (UTF-8).
    Narrow,

    /// Two bytes per character (UTF-16LE).
    Wide,
}

impl CharWidth {
    /// Parses a width from its byte count.
    ///
    /// Returns `None` for anything other than 1 or 2.
    pub fn from_bytes(bytes: usize) -> Option<Self> {
        match bytes {
            1 => Some(CharWidth::Narrow),
            2 => Some(CharWidth::Wide),
            _ => None,
        }
    }

    /// Returns the number of bytes per character.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            CharWidth::Narrow => 1,
            CharWidth::Wide => 2,
        }
    }

    /// Returns the terminator for this width (`width` zero bytes).
    #[inline]
    pub const fn terminator(self) -> &'static [u8] {
        match self {
            CharWidth::Narrow => &[0],
            CharWidth::Wide => &[0, 0],
        }
    }

    /// Returns the name of this width.
    pub fn name(&self) -> &'static str {
        match self {
            CharWidth::Narrow => "narrow",
            CharWidth::Wide => "wide",
        }
    }
}

impl Default for CharWidth {
    fn default() -> Self {
        CharWidth::Wide
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes() {
        assert_eq!(CharWidth::from_bytes(1), Some(CharWidth::Narrow));
        assert_eq!(CharWidth::from_bytes(2), Some(CharWidth::Wide));
        assert_eq!(CharWidth::from_bytes(4), None);
    }

    #[test]
    fn test_terminator_matches_width() {
        for width in [CharWidth::Narrow, CharWidth::Wide] {
            assert_eq!(width.terminator().len(), width.bytes());
            assert!(width.terminator().iter().all(|&b| b == 0));
        }
    }
}
