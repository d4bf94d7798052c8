//! Low-level RowBinary primitives

use bytes::{BufMut, BytesMut};

/// Append an unsigned LEB128 integer
pub fn put_varint(out: &mut BytesMut, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.put_u8(byte);
            return;
        }
        out.put_u8(byte | 0x80);
    }
}

/// Append a length-prefixed byte string
pub fn put_string(out: &mut BytesMut, bytes: &[u8]) {
    put_varint(out, bytes.len() as u64);
    out.put_slice(bytes);
}

/// Append a 256-bit integer from its low 128 bits and a fill byte for the rest
pub(super) fn put_wide(out: &mut BytesMut, low: u128, negative: bool) {
    out.put_u128_le(low);
    out.put_bytes(if negative { 0xff } else { 0x00 }, 16);
}
