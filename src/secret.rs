//! Protected in-memory strings.
//!
//! A [`SecretString`] keeps its characters in storage that is zeroed when
//! dropped and whenever it has to grow. Its contents never appear in `Debug`
//! output or logs.

use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// A string whose backing memory is wiped at end of life.
#[derive(Clone, Default)]
pub struct SecretString {
    inner: Zeroizing<String>,
}

impl SecretString {
    /// Creates an empty secret.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty secret with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Zeroizing::new(String::with_capacity(capacity)),
        }
    }

    /// Takes ownership of `value`; the caller's string is consumed.
    pub fn from_string(value: String) -> Self {
        Self {
            inner: Zeroizing::new(value),
        }
    }

    /// Appends a character.
    ///
    /// Growth copies into a fresh allocation and wipes the old one, so no
    /// stale copy is left behind by the reallocation.
    pub fn push(&mut self, c: char) {
        if self.inner.capacity() - self.inner.len() < c.len_utf8() {
            let wanted = (self.inner.capacity() * 2).max(self.inner.len() + c.len_utf8()).max(16);
            let mut grown = Zeroizing::new(String::with_capacity(wanted));
            grown.push_str(&self.inner);
            // Old storage is zeroized when dropped here.
            self.inner = grown;
        }
        self.inner.push(c);
    }

    /// Appends a string slice, one character at a time.
    pub fn push_str(&mut self, s: &str) {
        for c in s.chars() {
            self.push(c);
        }
    }

    /// Wipes the contents, keeping the allocation.
    pub fn clear(&mut self) {
        self.inner.zeroize();
    }

    /// Returns the length in bytes (UTF-8).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the secret is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over the characters without copying them out.
    pub fn chars(&self) -> std::str::Chars<'_> {
        self.inner.chars()
    }

    /// Borrows the cleartext.
    pub fn expose_secret(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for SecretString {
    fn from(value: &str) -> Self {
        let mut secret = Self::with_capacity(value.len());
        secret.push_str(value);
        secret
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED; {} bytes])", self.len())
    }
}

impl PartialEq for SecretString {
    fn eq(&self, other: &Self) -> bool {
        self.inner.as_bytes() == other.inner.as_bytes()
    }
}

impl Eq for SecretString {}
