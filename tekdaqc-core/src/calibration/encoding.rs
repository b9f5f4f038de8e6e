//! Word encoding for persisted floats
//!
//! The store holds 16-bit words. A 32-bit float is persisted as the low and
//! high halves of its IEEE-754 bit pattern, so a value read back is
//! bit-identical to the value written.

use crate::errors::StorageError;
use crate::traits::NvStore;

/// Split a float into (low, high) 16-bit halves of its bit pattern
pub fn split_f32(value: f32) -> (u16, u16) {
    split_u32(value.to_bits())
}

/// Rebuild a float from (low, high) halves
pub fn join_f32(low: u16, high: u16) -> f32 {
    f32::from_bits(join_u32(low, high))
}

/// Split a word pair value into (low, high)
pub const fn split_u32(value: u32) -> (u16, u16) {
    ((value & 0xFFFF) as u16, (value >> 16) as u16)
}

/// Rebuild a 32-bit value from (low, high)
pub const fn join_u32(low: u16, high: u16) -> u32 {
    (high as u32) << 16 | low as u32
}

/// Read a float stored at `low_key` and `high_key`
pub fn read_f32<S: NvStore + ?Sized>(store: &S, low_key: u32, high_key: u32) -> Result<f32, StorageError> {
    let low = store.read_word(low_key)?;
    let high = store.read_word(high_key)?;
    Ok(join_f32(low, high))
}

/// Persist a float at `low_key` and `high_key`
pub fn write_f32<S: NvStore + ?Sized>(
    store: &mut S,
    low_key: u32,
    high_key: u32,
    value: f32,
) -> Result<(), StorageError> {
    let (low, high) = split_f32(value);
    store.write_word(low_key, low)?;
    store.write_word(high_key, high)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MemoryStore;

    #[test]
    fn halves_rebuild_bit_pattern() {
        for value in [0.0f32, -0.0, 1.0, -273.15, 1.0e-38, f32::MAX, f32::INFINITY] {
            let (low, high) = split_f32(value);
            assert_eq!(join_f32(low, high).to_bits(), value.to_bits());
        }
        assert_eq!(split_u32(0xDEAD_BEEF), (0xBEEF, 0xDEAD));
    }

    #[test]
    fn nan_payload_is_preserved() {
        let nan = f32::from_bits(0x7FC0_1234);
        let (low, high) = split_f32(nan);
        assert_eq!(join_f32(low, high).to_bits(), 0x7FC0_1234);
    }

    #[test]
    fn store_round_trip_uses_both_keys() {
        let mut store: MemoryStore<8> = MemoryStore::new();
        write_f32(&mut store, 1, 0, 42.5).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(read_f32(&store, 1, 0).unwrap(), 42.5);
    }
}
