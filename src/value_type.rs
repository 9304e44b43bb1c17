//! Registry value type tags.
//!
//! The numbering is fixed by Windows (`REG_NONE` = 0 through `REG_QWORD` =
//! 11) and is preserved exactly so tags returned by `RegQueryValueExW` and
//! friends can be used directly.

use std::fmt;

/// Registry value data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    /// No value type.
    None,

    /// String (null-terminated).
    String,

    /// String with environment variables.
    ExpandString,

    /// Binary data.
    Binary,

    /// 32-bit integer in native byte order.
    Dword,

    /// 32-bit big-endian integer.
    DwordBigEndian,

    /// Symbolic link (Unicode).
    Link,

    /// Multiple strings.
    MultiString,

    /// Resource list.
    ResourceList,

    /// Full resource descriptor.
    FullResourceDescriptor,

    /// Resource requirements list.
    ResourceRequirementsList,

    /// 64-bit integer in native byte order.
    Qword,

    /// Unknown or non-standard value type.
    /// Contains the raw type value.
    Unknown(u32),
}

impl ValueType {
    /// Every predefined tag, in numeric order.
    pub const ALL: [ValueType; 12] = [
        ValueType::None,
        ValueType::String,
        ValueType::ExpandString,
        ValueType::Binary,
        ValueType::Dword,
        ValueType::DwordBigEndian,
        ValueType::Link,
        ValueType::MultiString,
        ValueType::ResourceList,
        ValueType::FullResourceDescriptor,
        ValueType::ResourceRequirementsList,
        ValueType::Qword,
    ];

    /// Parses a value type from a u32.
    ///
    /// Value types 0-11 are predefined, but other values are allowed as well.
    /// Unknown types are returned as `ValueType::Unknown`.
    pub const fn from_u32(value: u32) -> Self {
        match value {
            0 => ValueType::None,
            1 => ValueType::String,
            2 => ValueType::ExpandString,
            3 => ValueType::Binary,
            4 => ValueType::Dword,
            5 => ValueType::DwordBigEndian,
            6 => ValueType::Link,
            7 => ValueType::MultiString,
            8 => ValueType::ResourceList,
            9 => ValueType::FullResourceDescriptor,
            10 => ValueType::ResourceRequirementsList,
            11 => ValueType::Qword,
            _ => ValueType::Unknown(value),
        }
    }

    /// Returns the numeric tag.
    pub const fn to_u32(self) -> u32 {
        match self {
            ValueType::None => 0,
            ValueType::String => 1,
            ValueType::ExpandString => 2,
            ValueType::Binary => 3,
            ValueType::Dword => 4,
            ValueType::DwordBigEndian => 5,
            ValueType::Link => 6,
            ValueType::MultiString => 7,
            ValueType::ResourceList => 8,
            ValueType::FullResourceDescriptor => 9,
            ValueType::ResourceRequirementsList => 10,
            ValueType::Qword => 11,
            ValueType::Unknown(value) => value,
        }
    }

    /// Returns the name of this value type.
    pub fn name(&self) -> String {
        match self {
            ValueType::None => "REG_NONE".to_string(),
            ValueType::String => "REG_SZ".to_string(),
            ValueType::ExpandString => "REG_EXPAND_SZ".to_string(),
            ValueType::Binary => "REG_BINARY".to_string(),
            ValueType::Dword => "REG_DWORD".to_string(),
            ValueType::DwordBigEndian => "REG_DWORD_BIG_ENDIAN".to_string(),
            ValueType::Link => "REG_LINK".to_string(),
            ValueType::MultiString => "REG_MULTI_SZ".to_string(),
            ValueType::ResourceList => "REG_RESOURCE_LIST".to_string(),
            ValueType::FullResourceDescriptor => "REG_FULL_RESOURCE_DESCRIPTOR".to_string(),
            ValueType::ResourceRequirementsList => "REG_RESOURCE_REQUIREMENTS_LIST".to_string(),
            ValueType::Qword => "REG_QWORD".to_string(),
            ValueType::Unknown(value) => format!("REG_UNKNOWN_{:#010x}", value),
        }
    }

    /// Returns true if values of this type are decoded as text.
    pub fn is_string(&self) -> bool {
        matches!(
            self,
            ValueType::String | ValueType::ExpandString | ValueType::Link | ValueType::MultiString
        )
    }

    /// Returns true if values of this type are copied as opaque bytes.
    pub fn is_binary(&self) -> bool {
        matches!(
            self,
            ValueType::Binary
                | ValueType::ResourceList
                | ValueType::FullResourceDescriptor
                | ValueType::ResourceRequirementsList
        )
    }
}

impl From<u32> for ValueType {
    fn from(value: u32) -> Self {
        ValueType::from_u32(value)
    }
}

impl From<ValueType> for u32 {
    fn from(value: ValueType) -> Self {
        value.to_u32()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
