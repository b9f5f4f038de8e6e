//! Non-volatile word storage
//!
//! Persisted board state (temperature extremes, calibration entries, serial
//! number) is addressed as 16-bit words under 32-bit keys, matching the
//! emulated EEPROM on the board.

use heapless::FnvIndexMap;

use crate::errors::StorageError;

/// 16-bit word store
pub trait NvStore {
    /// Read the word stored at `key`
    fn read_word(&self, key: u32) -> Result<u16, StorageError>;

    /// Store `value` at `key`
    fn write_word(&mut self, key: u32, value: u16) -> Result<(), StorageError>;
}

impl<T: NvStore + ?Sized> NvStore for &mut T {
    fn read_word(&self, key: u32) -> Result<u16, StorageError> {
        (**self).read_word(key)
    }

    fn write_word(&mut self, key: u32, value: u16) -> Result<(), StorageError> {
        (**self).write_word(key, value)
    }
}

/// RAM-backed store holding up to `N` words
///
/// `N` must be a power of two. Used for simulation, tests, and as a write
/// cache in front of slow flash.
#[derive(Debug, Default)]
pub struct MemoryStore<const N: usize> {
    words: FnvIndexMap<u32, u16, N>,
}

impl<const N: usize> MemoryStore<N> {
    /// Empty store
    pub fn new() -> Self {
        Self {
            words: FnvIndexMap::new(),
        }
    }

    /// Number of keys written so far
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True when nothing has been written
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Forget every stored word
    pub fn clear(&mut self) {
        self.words.clear();
    }
}

impl<const N: usize> NvStore for MemoryStore<N> {
    fn read_word(&self, key: u32) -> Result<u16, StorageError> {
        self.words
            .get(&key)
            .copied()
            .ok_or(StorageError::Missing { key })
    }

    fn write_word(&mut self, key: u32, value: u16) -> Result<(), StorageError> {
        self.words
            .insert(key, value)
            .map(|_| ())
            .map_err(|_| StorageError::Full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reports_key() {
        let store: MemoryStore<8> = MemoryStore::new();
        assert_eq!(store.read_word(7), Err(StorageError::Missing { key: 7 }));
    }

    #[test]
    fn overwrite_keeps_single_entry() {
        let mut store: MemoryStore<8> = MemoryStore::new();
        store.write_word(1, 10).unwrap();
        store.write_word(1, 20).unwrap();
        assert_eq!(store.read_word(1), Ok(20));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn full_store_rejects_new_keys() {
        let mut store: MemoryStore<2> = MemoryStore::new();
        store.write_word(1, 1).unwrap();
        store.write_word(2, 2).unwrap();
        assert_eq!(store.write_word(3, 3), Err(StorageError::Full));
        // existing keys can still be updated
        assert!(store.write_word(2, 5).is_ok());
    }
}
