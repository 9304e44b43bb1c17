//! Utility functions for character encoding and terminator handling.

use crate::error::{MarshalError, Result};
use crate::width::CharWidth;
use byteorder::{ByteOrder, LittleEndian};
use encoding_rs::{UTF_16LE, UTF_8};

/// Returns the number of bytes `value` occupies at `width`, without terminator.
#[inline]
pub fn encoded_len(value: &str, width: CharWidth) -> usize {
    match width {
        CharWidth::Narrow => value.len(),
        CharWidth::Wide => value.encode_utf16().count() * 2,
    }
}

/// Returns the number of bytes a character sequence occupies at `width`.
pub fn encoded_len_chars<I>(chars: I, width: CharWidth) -> usize
where
    I: IntoIterator<Item = char>,
{
    chars
        .into_iter()
        .map(|c| match width {
            CharWidth::Narrow => c.len_utf8(),
            CharWidth::Wide => c.len_utf16() * 2,
        })
        .sum()
}

/// Encodes a character sequence into `dst` at `width`.
///
/// Characters are written one at a time straight into `dst`; no intermediate
/// string is built. Returns the number of bytes written.
///
/// # Errors
///
/// Returns [`MarshalError::TruncatedData`] if `dst` is too small.
pub fn encode_chars_into<I>(chars: I, width: CharWidth, dst: &mut [u8]) -> Result<usize>
where
    I: IntoIterator<Item = char>,
{
    let mut pos = 0;
    for c in chars {
        match width {
            CharWidth::Narrow => {
                let n = c.len_utf8();
                let end = pos + n;
                if end > dst.len() {
                    return Err(MarshalError::truncated(end, dst.len()));
                }
                c.encode_utf8(&mut dst[pos..end]);
                pos = end;
            }
            CharWidth::Wide => {
                let mut units = [0u16; 2];
                for &unit in c.encode_utf16(&mut units).iter() {
                    let end = pos + 2;
                    if end > dst.len() {
                        return Err(MarshalError::truncated(end, dst.len()));
                    }
                    LittleEndian::write_u16(&mut dst[pos..end], unit);
                    pos = end;
                }
            }
        }
    }
    Ok(pos)
}

/// Returns the byte length of the string at the start of `data`, stopping at
/// the first terminator aligned to `width`.
///
/// Without a terminator, the whole buffer counts (rounded down to whole
/// characters).
pub fn terminated_len(data: &[u8], width: CharWidth) -> usize {
    match width {
        CharWidth::Narrow => data.iter().position(|&b| b == 0).unwrap_or(data.len()),
        CharWidth::Wide => data
            .chunks_exact(2)
            .position(|unit| unit == [0, 0])
            .map(|i| i * 2)
            .unwrap_or(data.len() - data.len() % 2),
    }
}

/// Decodes `data` at `width` into a string.
///
/// Narrow data that is not valid UTF-8 is decoded lossily, like ASCII names
/// in registry structures. Wide data must be valid UTF-16LE.
///
/// # Errors
///
/// Returns an error if wide data has an odd length or is not valid UTF-16.
pub fn decode_string(data: &[u8], width: CharWidth) -> Result<String> {
    if data.is_empty() {
        return Ok(String::new());
    }

    match width {
        CharWidth::Narrow => {
            let (decoded, _had_errors) = UTF_8.decode_without_bom_handling(data);
            Ok(decoded.into_owned())
        }
        CharWidth::Wide => {
            // UTF-16 requires even number of bytes
            if data.len() % 2 != 0 {
                return Err(MarshalError::UnalignedWideBuffer { len: data.len() });
            }

            let (decoded, had_errors) = UTF_16LE.decode_without_bom_handling(data);
            if had_errors {
                return Err(MarshalError::InvalidUtf16 { len: data.len() });
            }
            Ok(decoded.into_owned())
        }
    }
}

/// Decodes the null-terminated string at the start of `data`.
pub fn read_terminated_string(data: &[u8], width: CharWidth) -> Result<String> {
    let len = terminated_len(data, width);
    decode_string(&data[..len], width)
}

/// Splits a multi-string block into its strings.
///
/// The block is a run of null-terminated strings ended by an empty string.
/// Anything after the empty string is ignored. A final string missing its
/// terminator is still returned.
pub fn split_multi_string(data: &[u8], width: CharWidth) -> Result<Vec<String>> {
    let mut strings = Vec::new();
    let mut rest = data;

    while rest.len() >= width.bytes() {
        let len = terminated_len(rest, width);
        if len == 0 {
            break;
        }
        strings.push(decode_string(&rest[..len], width)?);
        rest = &rest[(len + width.bytes()).min(rest.len())..];
    }

    Ok(strings)
}

/// Replaces `%NAME%` references with values from the process environment.
///
/// References to undefined variables are left as written.
pub fn expand_environment_strings(value: &str) -> String {
    expand_with(value, |name| std::env::var(name).ok())
}

/// Replaces `%NAME%` references using `lookup`.
///
/// An unmatched `%` is copied literally. When a name does not resolve, the
/// opening `%` and the name are copied and scanning resumes at the closing
/// `%`, which may open the next reference.
pub fn expand_with<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find('%') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                match (!name.is_empty()).then(|| lookup(name)).flatten() {
                    Some(expanded) => {
                        result.push_str(&expanded);
                        rest = &after[end + 1..];
                    }
                    None => {
                        result.push('%');
                        result.push_str(name);
                        rest = &after[end..];
                    }
                }
            }
            None => {
                result.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}
