//! Unsigned-varint helpers shared by the compact share codec and the wire
//! decoders, built on `prost`'s varint implementation (the same primitive
//! the corpus uses for its hand-rolled protobuf-shaped messages).

use bytes::{Buf, BufMut};
use prost::encoding::{decode_varint, encode_varint};

/// Appends `value` to `out` as an unsigned varint.
pub fn encode_u64(value: u64, out: &mut impl BufMut) {
    encode_varint(value, out)
}

/// Reads a varint from the front of `bytes`, returning the decoded value
/// and the number of bytes consumed.
pub fn read_varint(mut bytes: impl Buf) -> Result<(u64, usize), prost::DecodeError> {
    let original_len = bytes.remaining();
    let value = decode_varint(&mut bytes)?;
    Ok((value, original_len - bytes.remaining()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_small_and_large_values() {
        for value in [0u64, 1, 127, 128, 300, 16384, u32::MAX as u64] {
            let mut buf = Vec::new();
            encode_u64(value, &mut buf);
            let (decoded, len) = read_varint(&buf[..]).unwrap();
            assert_eq!(decoded, value);
            assert_eq!(len, buf.len());
        }
    }
}
