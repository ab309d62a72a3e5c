//! Minimal protobuf wire format support.
//!
//! Implements just enough of the protobuf encoding to walk serialized
//! `FileDescriptorProto` messages without requiring prost or other heavy
//! deps. Readers take a `&mut &[u8]` cursor and return `None` on truncated
//! or malformed input; writers exist primarily so tests can synthesize
//! descriptor bytes.

/// Wire type for varint fields (int32, int64, bool, enum).
pub const WIRE_VARINT: u8 = 0;
/// Wire type for 64-bit fixed fields.
pub const WIRE_FIXED64: u8 = 1;
/// Wire type for length-delimited fields (string, bytes, messages).
pub const WIRE_LEN: u8 = 2;
/// Wire type for 32-bit fixed fields.
pub const WIRE_FIXED32: u8 = 5;

/// Read a varint, advancing the cursor.
pub fn read_varint(buf: &mut &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    for (i, &byte) in buf.iter().enumerate() {
        if i >= 10 {
            return None; // Overlong
        }
        value |= u64::from(byte & 0x7F) << (7 * i);
        if byte & 0x80 == 0 {
            *buf = &buf[i + 1..];
            return Some(value);
        }
    }
    None
}

/// Read a field tag, returning `(field_number, wire_type)`.
pub fn read_tag(buf: &mut &[u8]) -> Option<(u32, u8)> {
    let tag = read_varint(buf)?;
    Some(((tag >> 3) as u32, (tag & 0x07) as u8))
}

/// Read a length-delimited field, returning its bytes.
pub fn read_len_delimited<'a>(buf: &mut &'a [u8]) -> Option<&'a [u8]> {
    let len = read_varint(buf)? as usize;
    if buf.len() < len {
        return None;
    }
    let (data, rest) = buf.split_at(len);
    *buf = rest;
    Some(data)
}

/// Read a length-delimited field as UTF-8 text.
pub fn read_string(buf: &mut &[u8]) -> Option<String> {
    let data = read_len_delimited(buf)?;
    std::str::from_utf8(data).ok().map(str::to_owned)
}

/// Skip over a field of the given wire type.
pub fn skip_field(wire_type: u8, buf: &mut &[u8]) -> Option<()> {
    match wire_type {
        WIRE_VARINT => {
            read_varint(buf)?;
        }
        WIRE_LEN => {
            read_len_delimited(buf)?;
        }
        WIRE_FIXED64 => {
            if buf.len() < 8 {
                return None;
            }
            *buf = &buf[8..];
        }
        WIRE_FIXED32 => {
            if buf.len() < 4 {
                return None;
            }
            *buf = &buf[4..];
        }
        _ => return None,
    }
    Some(())
}

/// Write a varint.
pub fn write_varint(mut value: u64, buf: &mut Vec<u8>) {
    while value >= 0x80 {
        buf.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Write a field tag.
pub fn write_tag(field_number: u32, wire_type: u8, buf: &mut Vec<u8>) {
    write_varint((u64::from(field_number) << 3) | u64::from(wire_type), buf);
}

/// Write a length-delimited bytes field.
pub fn write_bytes(field_number: u32, data: &[u8], buf: &mut Vec<u8>) {
    write_tag(field_number, WIRE_LEN, buf);
    write_varint(data.len() as u64, buf);
    buf.extend_from_slice(data);
}

/// Write a string field.
pub fn write_string(field_number: u32, value: &str, buf: &mut Vec<u8>) {
    write_bytes(field_number, value.as_bytes(), buf);
}

/// Write a bool field.
pub fn write_bool(field_number: u32, value: bool, buf: &mut Vec<u8>) {
    write_tag(field_number, WIRE_VARINT, buf);
    write_varint(u64::from(value), buf);
}

/// Write an embedded message field.
pub fn write_message(field_number: u32, body: &[u8], buf: &mut Vec<u8>) {
    write_bytes(field_number, body, buf);
}
