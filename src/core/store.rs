//! # Byte Store
//!
//! Contiguous byte storage with per-offset population tracking.
//!
//! The store keeps two parallel vectors: the raw bytes and a mask recording
//! which offsets currently hold a written value. Unpopulated slots always
//! contain `0x00`, so the raw vector can be handed out directly as the
//! contiguous wire image of the packet.

use crate::error::{BufferError, Result};

/// Growable byte storage that remembers which offsets were written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteStore {
    data: Vec<u8>,
    present: Vec<bool>,
    populated: usize,
}

impl ByteStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store of `len` unpopulated slots
    pub fn with_len(len: usize) -> Self {
        Self {
            data: vec![0; len],
            present: vec![false; len],
            populated: 0,
        }
    }

    /// Create a fully populated store holding a copy of `bytes`
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: bytes.to_vec(),
            present: vec![true; bytes.len()],
            populated: bytes.len(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of offsets currently holding a value
    #[inline]
    pub fn populated(&self) -> usize {
        self.populated
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.data.capacity()
    }

    #[inline]
    pub fn contains(&self, offset: usize) -> bool {
        self.present.get(offset).copied().unwrap_or(false)
    }

    /// Byte at `offset`, or `None` if the slot is unpopulated
    #[inline]
    pub fn get(&self, offset: usize) -> Option<u8> {
        if self.contains(offset) {
            Some(self.data[offset])
        } else {
            None
        }
    }

    /// Store `value` at `offset`, growing the store when needed
    pub fn set(&mut self, offset: usize, value: u8) -> Result<()> {
        self.write_at(offset, &[value])
    }

    /// Clear the slot at `offset`. Returns the removed byte, if any.
    pub fn unset(&mut self, offset: usize) -> Option<u8> {
        let value = self.get(offset)?;
        self.data[offset] = 0;
        self.present[offset] = false;
        self.populated -= 1;
        Some(value)
    }

    /// Copy `bytes` into `[offset, offset + bytes.len())`, growing as needed.
    ///
    /// Fails with `OffsetOverflow` if the range end does not fit in `usize`,
    /// or `OversizedBuffer` if the store cannot grow that far. Either way the
    /// store is left untouched.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        let end = offset
            .checked_add(bytes.len())
            .ok_or(BufferError::OffsetOverflow {
                offset,
                width: bytes.len(),
            })?;
        self.grow_to(end)?;
        self.data[offset..end].copy_from_slice(bytes);
        for index in offset..end {
            self.mark(index);
        }
        Ok(())
    }

    /// Borrow `[offset, offset + len)` if every slot in it is populated.
    ///
    /// On failure returns the first offset in the range that holds no value.
    pub fn read_at(&self, offset: usize, len: usize) -> std::result::Result<&[u8], usize> {
        let end = offset.checked_add(len).ok_or(offset)?;
        match (offset..end).find(|&index| !self.contains(index)) {
            Some(missing) => Err(missing),
            None => Ok(&self.data[offset..end]),
        }
    }

    /// Append `bytes` after the current end
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        let offset = self.len();
        self.write_at(offset, bytes)
    }

    /// Raw contents, unpopulated slots reading as zero
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consume the store, returning its raw contents
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Drop all contents, keeping allocated capacity
    pub fn clear(&mut self) {
        self.data.clear();
        self.present.clear();
        self.populated = 0;
    }

    /// Shorten the store to `len` slots. No-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len >= self.len() {
            return;
        }
        let dropped = self.present[len..].iter().filter(|p| **p).count();
        self.data.truncate(len);
        self.present.truncate(len);
        self.populated -= dropped;
    }

    pub fn reserve(&mut self, additional: usize) {
        self.data.reserve(additional);
        self.present.reserve(additional);
    }

    fn grow_to(&mut self, len: usize) -> Result<()> {
        if len <= self.data.len() {
            return Ok(());
        }
        let additional = len - self.data.len();
        self.data
            .try_reserve(additional)
            .and_then(|()| self.present.try_reserve(additional))
            .map_err(|_| BufferError::OversizedBuffer(len))?;
        self.data.resize(len, 0);
        self.present.resize(len, false);
        Ok(())
    }

    #[inline]
    fn mark(&mut self, offset: usize) {
        if !self.present[offset] {
            self.present[offset] = true;
            self.populated += 1;
        }
    }
}
