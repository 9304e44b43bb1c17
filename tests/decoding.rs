//! Registry value decoding against hand-built buffers.

use reg_marshal::strings::{allocate_string, get_bytes};
use reg_marshal::{CharWidth, NativeAddress, NativeView, ValueData, ValueType};

fn wide(s: &str) -> Vec<u8> {
    get_bytes(s, false, CharWidth::Wide)
}

#[test]
fn test_big_endian_dword() {
    let data = [0x00, 0x00, 0x00, 0x2A];
    assert_eq!(
        ValueData::from_bytes(&data, ValueType::DwordBigEndian).unwrap(),
        ValueData::DwordBigEndian(42)
    );

    let native = ValueData::from_bytes(&data, ValueType::Dword).unwrap();
    if cfg!(target_endian = "little") {
        assert_eq!(native, ValueData::Dword(0x2A00_0000));
    } else {
        assert_eq!(native, ValueData::Dword(42));
    }
}

#[test]
fn test_multi_string() {
    let data = wide("A\0B\0\0");
    assert_eq!(
        ValueData::from_bytes(&data, ValueType::MultiString).unwrap(),
        ValueData::MultiString(vec!["A".to_string(), "B".to_string()])
    );
}

#[test]
fn test_empty_multi_string() {
    let data = wide("\0");
    assert_eq!(
        ValueData::from_bytes(&data, ValueType::MultiString).unwrap(),
        ValueData::MultiString(Vec::new())
    );
}

#[test]
fn test_unknown_tag_is_passthrough() {
    let data = [1u8, 2, 3, 4];
    let view = NativeView::from_slice(&data);
    let value = ValueData::decode(view, data.len(), ValueType::from_u32(99)).unwrap();
    assert_eq!(value, ValueData::Address(view.address()));
    assert!(matches!(value, ValueData::Address(NativeAddress::Valid { len: 4, .. })));
}

#[test]
fn test_every_tag_has_a_result() {
    let data = wide("file:///x\0\0");
    for tag in 0..=12 {
        let value_type = ValueType::from_u32(tag);
        let result = ValueData::from_bytes(&data, value_type);
        assert!(result.is_ok(), "{} failed: {:?}", value_type, result.err());
    }
}

#[test]
fn test_string_from_native_buffer() {
    let buffer = allocate_string(Some("Software"), CharWidth::Wide).unwrap().unwrap();
    let value = ValueData::decode_buffer(&buffer, ValueType::String).unwrap();
    drop(buffer);
    // Decoded value outlives the source buffer
    assert_eq!(value, ValueData::String("Software".to_string()));
}

#[test]
fn test_expand_string_uses_environment() {
    std::env::set_var("REG_MARSHAL_TEST_ROOT", "C:\\Windows");
    let data = wide("%REG_MARSHAL_TEST_ROOT%\\System32\0");
    assert_eq!(
        ValueData::from_bytes(&data, ValueType::ExpandString).unwrap(),
        ValueData::ExpandString("C:\\Windows\\System32".to_string())
    );
}

#[test]
fn test_to_bytes_round_trip() {
    let values = [
        ValueData::String("x".to_string()),
        ValueData::Dword(7),
        ValueData::DwordBigEndian(7),
        ValueData::Qword(u64::MAX - 1),
        ValueData::MultiString(vec!["a".to_string(), "bc".to_string()]),
        ValueData::Binary(vec![0, 1, 2]),
    ];
    for value in values {
        let decoded = ValueData::from_bytes(&value.to_bytes(), value.value_type()).unwrap();
        assert_eq!(decoded, value);
    }
}
