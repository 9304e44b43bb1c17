//! # Native string marshaling and registry value decoding
//!
//! Building blocks for code that hands buffers to Win32 calls and reads
//! typed registry values back out of them.
//!
//! ## Features
//!
//! - **Owned native buffers**: [`NativeBuffer`] is a move-only handle; dropping
//!   it zero-fills the block and releases it through the allocator that made it
//! - **Explicit allocators**: every allocation names a [`NativeAllocator`],
//!   defaulting to [`SystemAllocator`]
//! - **Secrets**: [`SecretString`] keeps protected text in storage that is
//!   wiped on drop, and copies straight into native buffers
//! - **Sentinel-aware reads**: small integer "addresses" are classified as
//!   [`NativeAddress::Sentinel`] and never dereferenced
//! - **Typed registry values**: [`ValueData::decode`] applies the one decoding
//!   rule for each [`ValueType`] tag
//!
//! ## Architecture
//!
//! ```text
//! allocate_string / allocate_chars / allocate_secret
//!         |
//!         v
//!   NativeBuffer<A>  --as_mut_ptr()-->  OS call fills buffer, reports tag + size
//!         |
//!         v
//!   NativeView  --ValueData::decode(view, size, tag)-->  ValueData (owned copy)
//!         |
//!         v
//!   drop / free_string  (zero-fill, then release)
//! ```
//!
//! ## Examples
//!
//! ### Decoding a registry value
//!
//! ```rust
//! use reg_marshal::{ValueData, ValueType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // REG_MULTI_SZ as returned by RegQueryValueExW
//! let raw = [b'A', 0, 0, 0, b'B', 0, 0, 0, 0, 0];
//! match ValueData::from_bytes(&raw, ValueType::MultiString)? {
//!     ValueData::MultiString(strings) => assert_eq!(strings, ["A", "B"]),
//!     other => panic!("unexpected {other:?}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Allocating a buffer for a native call
//!
//! ```rust
//! use reg_marshal::{strings, CharWidth, ValueData, ValueType};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Room for 32 wide characters, already null-terminated
//! let mut buffer = strings::allocate_chars(32, CharWidth::Wide)?.ok_or("empty")?;
//! buffer.as_mut_bytes()[..4].copy_from_slice(&[b'o', 0, b'k', 0]);
//!
//! let value = ValueData::decode_buffer(&buffer, ValueType::String)?;
//! assert_eq!(value.as_str(), Some("ok"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod address;
pub mod allocator;
pub mod buffer;
pub mod error;
pub mod secret;
pub mod strings;
pub mod utils;
pub mod value;
pub mod value_type;
pub mod width;

// Python bindings (only compiled when python feature is enabled)
#[cfg(feature = "python")]
pub mod python;

// Re-export main types for convenience
pub use address::{is_sentinel, NativeAddress, SENTINEL_THRESHOLD};
pub use allocator::{FnAllocator, NativeAllocator, SystemAllocator};
pub use buffer::{NativeBuffer, NativeView};
pub use error::{MarshalError, Result};
pub use secret::SecretString;
pub use value::ValueData;
pub use value_type::ValueType;
pub use width::CharWidth;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
