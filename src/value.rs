//! Typed registry value decoding.
//!
//! [`ValueData::decode`] turns the buffer filled in by a registry query plus
//! its value type tag into an owned, typed value. Decoding copies: the result
//! does not borrow from, and never frees, the source buffer.
//!
//! Every tag has exactly one rule. `REG_NONE` and unrecognized tags are not
//! decoded at all; the buffer's address is handed back unchanged.

use crate::address::NativeAddress;
use crate::allocator::NativeAllocator;
use crate::buffer::{NativeBuffer, NativeView};
use crate::error::{MarshalError, Result};
use crate::strings::get_bytes;
use crate::utils::{expand_environment_strings, read_terminated_string, split_multi_string};
use crate::value_type::ValueType;
use crate::width::CharWidth;
use byteorder::{BigEndian, ByteOrder, NativeEndian};
use std::fmt;
use tracing::{trace, warn};
use url::Url;

/// Registry strings are always stored wide.
const REGISTRY_WIDTH: CharWidth = CharWidth::Wide;

/// Decoded registry value data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueData {
    /// String value.
    String(String),

    /// Expandable string value, with environment references substituted.
    ExpandString(String),

    /// Link target parsed as a URI.
    Link(Url),

    /// Binary data.
    Binary(Vec<u8>),

    /// Resource list, copied verbatim.
    ResourceList(Vec<u8>),

    /// Full resource descriptor, copied verbatim.
    FullResourceDescriptor(Vec<u8>),

    /// Resource requirements list, copied verbatim.
    ResourceRequirementsList(Vec<u8>),

    /// 32-bit integer.
    Dword(u32),

    /// 32-bit big-endian integer.
    DwordBigEndian(u32),

    /// Multiple strings.
    MultiString(Vec<String>),

    /// 64-bit integer.
    Qword(u64),

    /// Undecoded passthrough for `REG_NONE`, unknown tags and sentinel buffers.
    Address(NativeAddress),
}

impl ValueData {
    /// Decodes the first `size` bytes of `view` according to `value_type`.
    ///
    /// # Arguments
    ///
    /// * `view` - Buffer returned by the registry query.
    /// * `size` - Number of valid bytes reported alongside the buffer.
    /// * `value_type` - Type tag reported alongside the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`MarshalError::TruncatedData`] if `size` exceeds the view or
    /// an integer needs more bytes than `size`, string errors for malformed
    /// UTF-16, and [`MarshalError::InvalidLink`] for a link that is not a URI.
    /// The tag itself never causes an error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use reg_marshal::{ValueData, ValueType};
    ///
    /// let data = [0x00, 0x00, 0x00, 0x2A];
    /// let value = ValueData::from_bytes(&data, ValueType::DwordBigEndian).unwrap();
    /// assert_eq!(value, ValueData::DwordBigEndian(42));
    /// ```
    pub fn decode<'a, V>(view: V, size: usize, value_type: ValueType) -> Result<Self>
    where
        V: Into<NativeView<'a>>,
    {
        let view = view.into();
        trace!(size, value_type = %value_type, "Decoding registry value");

        if matches!(value_type, ValueType::None | ValueType::Unknown(_)) {
            return Ok(ValueData::Address(view.address()));
        }

        let Some(data) = view.prefix(size)? else {
            return Ok(ValueData::Address(view.address()));
        };

        match value_type {
            ValueType::None | ValueType::Unknown(_) => Ok(ValueData::Address(view.address())),

            ValueType::Dword => Ok(ValueData::Dword(NativeEndian::read_u32(fixed(data, 4)?))),

            ValueType::DwordBigEndian => Ok(ValueData::DwordBigEndian(BigEndian::read_u32(fixed(data, 4)?))),

            ValueType::Qword => Ok(ValueData::Qword(NativeEndian::read_u64(fixed(data, 8)?))),

            ValueType::String => Ok(ValueData::String(read_terminated_string(data, REGISTRY_WIDTH)?)),

            ValueType::ExpandString => {
                let raw = read_terminated_string(data, REGISTRY_WIDTH)?;
                Ok(ValueData::ExpandString(expand_environment_strings(&raw)))
            }

            ValueType::Link => {
                let raw = read_terminated_string(data, REGISTRY_WIDTH)?;
                match Url::parse(&raw) {
                    Ok(url) => Ok(ValueData::Link(url)),
                    Err(source) => {
                        warn!(value = %raw, "Link value is not a valid URI");
                        Err(MarshalError::InvalidLink { value: raw, source })
                    }
                }
            }

            ValueType::MultiString => Ok(ValueData::MultiString(split_multi_string(data, REGISTRY_WIDTH)?)),

            ValueType::Binary => Ok(ValueData::Binary(data.to_vec())),
            ValueType::ResourceList => Ok(ValueData::ResourceList(data.to_vec())),
            ValueType::FullResourceDescriptor => Ok(ValueData::FullResourceDescriptor(data.to_vec())),
            ValueType::ResourceRequirementsList => Ok(ValueData::ResourceRequirementsList(data.to_vec())),
        }
    }

    /// Decodes a whole byte slice.
    pub fn from_bytes(data: &[u8], value_type: ValueType) -> Result<Self> {
        Self::decode(data, data.len(), value_type)
    }

    /// Decodes the full contents of an owned buffer.
    pub fn decode_buffer<A: NativeAllocator>(buffer: &NativeBuffer<A>, value_type: ValueType) -> Result<Self> {
        Self::decode(buffer, buffer.len(), value_type)
    }

    /// Returns the value type this data encodes as.
    ///
    /// Passthrough addresses report `ValueType::None`.
    pub fn value_type(&self) -> ValueType {
        match self {
            ValueData::String(_) => ValueType::String,
            ValueData::ExpandString(_) => ValueType::ExpandString,
            ValueData::Link(_) => ValueType::Link,
            ValueData::Binary(_) => ValueType::Binary,
            ValueData::ResourceList(_) => ValueType::ResourceList,
            ValueData::FullResourceDescriptor(_) => ValueType::FullResourceDescriptor,
            ValueData::ResourceRequirementsList(_) => ValueType::ResourceRequirementsList,
            ValueData::Dword(_) => ValueType::Dword,
            ValueData::DwordBigEndian(_) => ValueType::DwordBigEndian,
            ValueData::MultiString(_) => ValueType::MultiString,
            ValueData::Qword(_) => ValueType::Qword,
            ValueData::Address(_) => ValueType::None,
        }
    }

    /// Encodes the value in the layout `RegSetValueExW` expects.
    ///
    /// Strings are wide and null-terminated; a multi-string ends with an
    /// extra terminator. Passthrough addresses encode as no bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            ValueData::String(s) | ValueData::ExpandString(s) => get_bytes(s, true, REGISTRY_WIDTH),
            ValueData::Link(url) => get_bytes(url.as_str(), true, REGISTRY_WIDTH),
            ValueData::MultiString(strings) => {
                let mut bytes = Vec::new();
                for s in strings {
                    bytes.extend(get_bytes(s, true, REGISTRY_WIDTH));
                }
                bytes.extend_from_slice(REGISTRY_WIDTH.terminator());
                bytes
            }
            ValueData::Binary(b)
            | ValueData::ResourceList(b)
            | ValueData::FullResourceDescriptor(b)
            | ValueData::ResourceRequirementsList(b) => b.clone(),
            ValueData::Dword(d) => d.to_ne_bytes().to_vec(),
            ValueData::DwordBigEndian(d) => d.to_be_bytes().to_vec(),
            ValueData::Qword(q) => q.to_ne_bytes().to_vec(),
            ValueData::Address(_) => Vec::new(),
        }
    }

    /// Returns the string if this is a `String` or `ExpandString` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValueData::String(s) | ValueData::ExpandString(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is a `Dword`, `DwordBigEndian` or `Qword` value.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            ValueData::Dword(d) | ValueData::DwordBigEndian(d) => Some(u64::from(d)),
            ValueData::Qword(q) => Some(q),
            _ => None,
        }
    }
}

/// Returns the first `len` bytes of `data`.
fn fixed(data: &[u8], len: usize) -> Result<&[u8]> {
    data.get(..len)
        .ok_or_else(|| MarshalError::truncated(len, data.len()))
}

impl fmt::Display for ValueData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueData::String(s) | ValueData::ExpandString(s) => f.write_str(s),
            ValueData::Link(url) => f.write_str(url.as_str()),
            ValueData::Binary(b)
            | ValueData::ResourceList(b)
            | ValueData::FullResourceDescriptor(b)
            | ValueData::ResourceRequirementsList(b) => f.write_str(&hex::encode_upper(b)),
            ValueData::Dword(d) | ValueData::DwordBigEndian(d) => write!(f, "{} (0x{:08X})", d, d),
            ValueData::Qword(q) => write!(f, "{} (0x{:016X})", q, q),
            ValueData::MultiString(strings) => f.write_str(&strings.join(", ")),
            ValueData::Address(address) => write!(f, "{}", address),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide(s: &str) -> Vec<u8> {
        get_bytes(s, false, CharWidth::Wide)
    }

    #[test]
    fn test_dword_native_order() {
        let data = [0x2A, 0x00, 0x00, 0x00, 0xFF];
        let value = ValueData::from_bytes(&data, ValueType::Dword).unwrap();
        assert_eq!(value, ValueData::Dword(u32::from_ne_bytes([0x2A, 0, 0, 0])));
    }

    #[test]
    fn test_dword_truncated() {
        let result = ValueData::from_bytes(&[1, 2, 3], ValueType::Dword);
        assert!(matches!(result, Err(MarshalError::TruncatedData { expected: 4, actual: 3 })));
    }

    #[test]
    fn test_qword() {
        let data = 0x0102_0304_0506_0708u64.to_ne_bytes();
        let value = ValueData::from_bytes(&data, ValueType::Qword).unwrap();
        assert_eq!(value, ValueData::Qword(0x0102_0304_0506_0708));
    }

    #[test]
    fn test_size_bounds_the_read() {
        let mut data = wide("abc\0");
        data.extend(wide("def"));
        let value = ValueData::decode(&data[..], 4, ValueType::String).unwrap();
        assert_eq!(value, ValueData::String("ab".to_string()));
    }

    #[test]
    fn test_size_past_view() {
        let data = [0u8; 4];
        let result = ValueData::decode(&data[..], 8, ValueType::Binary);
        assert!(matches!(result, Err(MarshalError::TruncatedData { expected: 8, actual: 4 })));
    }

    #[test]
    fn test_expand_string_leaves_unknown_reference() {
        let data = wide("%REG_MARSHAL_SURELY_UNSET_VAR%\\x\0");
        let value = ValueData::from_bytes(&data, ValueType::ExpandString).unwrap();
        assert_eq!(value, ValueData::ExpandString("%REG_MARSHAL_SURELY_UNSET_VAR%\\x".to_string()));
    }

    #[test]
    fn test_link() {
        let data = wide("file:///C:/Windows\0");
        let value = ValueData::from_bytes(&data, ValueType::Link).unwrap();
        assert!(matches!(value, ValueData::Link(ref url) if url.scheme() == "file"));
    }

    #[test]
    fn test_invalid_link() {
        let data = wide("\\Registry\\Machine\\Software\0");
        let result = ValueData::from_bytes(&data, ValueType::Link);
        assert!(matches!(result, Err(MarshalError::InvalidLink { .. })));
    }

    #[test]
    fn test_resource_variants_copy_verbatim() {
        let data = [9u8, 8, 7];
        for value_type in [
            ValueType::Binary,
            ValueType::ResourceList,
            ValueType::FullResourceDescriptor,
            ValueType::ResourceRequirementsList,
        ] {
            let value = ValueData::from_bytes(&data, value_type).unwrap();
            assert_eq!(value.value_type(), value_type);
            assert_eq!(value.to_bytes(), data.to_vec());
        }
    }

    #[test]
    fn test_none_is_passthrough() {
        let data = [1u8, 2];
        let value = ValueData::from_bytes(&data, ValueType::None).unwrap();
        assert_eq!(value, ValueData::Address(NativeView::from_slice(&data).address()));
    }

    #[test]
    fn test_sentinel_view_is_passthrough() {
        let value = ValueData::decode(NativeView::Sentinel(0x10), 4, ValueType::Dword).unwrap();
        assert_eq!(value, ValueData::Address(NativeAddress::Sentinel(0x10)));
    }

    #[test]
    fn test_multi_string_to_bytes() {
        let value = ValueData::MultiString(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(value.to_bytes(), wide("A\0B\0\0"));
        assert_eq!(ValueData::MultiString(Vec::new()).to_bytes(), vec![0, 0]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueData::Dword(42).to_string(), "42 (0x0000002A)");
        assert_eq!(ValueData::Binary(vec![0xDE, 0xAD]).to_string(), "DEAD");
        assert_eq!(
            ValueData::MultiString(vec!["a".to_string(), "b".to_string()]).to_string(),
            "a, b"
        );
    }

    #[test]
    fn test_accessors() {
        assert_eq!(ValueData::String("x".to_string()).as_str(), Some("x"));
        assert_eq!(ValueData::DwordBigEndian(7).as_u64(), Some(7));
        assert_eq!(ValueData::Binary(vec![]).as_u64(), None);
    }
}
