//! # Packet Buffer
//!
//! Offset-addressed assembly buffer for fixed-layout binary packets.
//!
//! Voice and gateway protocols mix byte orders inside a single packet
//! (big-endian RTP header fields next to little-endian nonce material), so
//! every accessor names its width and endianness instead of consulting a
//! buffer-wide mode.
//!
//! ## Accessors
//! | Method | Width | Encoding |
//! |---|---|---|
//! | `write_u16_be` / `read_u16_be` | 2 | big-endian |
//! | `write_u24_le` / `read_u24_le` | 3 | little-endian |
//! | `write_u32_be` / `read_u32_be` | 4 | big-endian |
//! | `write_i32_be` / `read_i32_be` | 4 | big-endian two's complement |
//! | `write_u64_le` / `read_u64_le` | 8 | little-endian |
//! | `write_char` / `read_i8` | 1 | two's complement |
//! | `write_raw` / `read_u8` | 1 | verbatim |
//! | `write_raw_run` / `read_raw_run` | n | verbatim |
//! | `write_uint_{le,be}` / `read_uint_{le,be}` | 1-8 | as named |
//!
//! ## Population
//! Slots that were never written (or were removed) are *unpopulated*.
//! Reading them fails with [`BufferError::OutOfRange`]; exporting the
//! buffer renders them as `0x00`.
//!
//! ## Atomicity
//! Every write validates its width and full byte range before the first
//! byte is stored, so a rejected write leaves the buffer untouched.
//!
//! ## Example
//! ```rust
//! use packet_buffer::core::buffer::PacketBuffer;
//!
//! let mut header = PacketBuffer::new(12);
//! header.write_raw(0x80, 0)?;
//! header.write_raw(0x78, 1)?;
//! header.write_u16_be(1, 2)?;
//! header.write_u32_be(960, 4)?;
//! header.write_u32_be(0xDEADBEEF, 8)?;
//! assert_eq!(header.read_u32_be(8)?, 0xDEADBEEF);
//! # Ok::<(), packet_buffer::error::BufferError>(())
//! ```

use crate::config::{BufferLimits, MAX_BUFFER_SIZE};
use crate::core::store::ByteStore;
use crate::error::{BufferError, Result};
use crate::utils::metrics::global_metrics;
use bytes::Bytes;
use tracing::{trace, warn};

/// Widest field the variable-width accessors handle
pub const MAX_FIELD_WIDTH: usize = 8;

/// Mutable, growable byte buffer with typed offset-addressed accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketBuffer {
    store: ByteStore,
    max_size: usize,
}

impl PacketBuffer {
    /// Create a buffer of `size` unpopulated slots with the default growth limit.
    ///
    /// A `size` above [`MAX_BUFFER_SIZE`] raises the limit to `size`.
    pub fn new(size: usize) -> Self {
        Self::build(ByteStore::with_len(size), size.max(MAX_BUFFER_SIZE))
    }

    /// Create a buffer that may never grow beyond `max_size` bytes
    pub fn with_limit(size: usize, max_size: usize) -> Result<Self> {
        if size > max_size {
            return Err(BufferError::OversizedBuffer(size));
        }
        Ok(Self::build(ByteStore::with_len(size), max_size))
    }

    /// Create a buffer sized by configuration
    pub fn from_config(limits: &BufferLimits) -> Result<Self> {
        Self::with_limit(limits.initial_size, limits.max_size)
    }

    /// Wrap received bytes; every offset in `bytes` is populated.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::build(ByteStore::from_slice(bytes), bytes.len().max(MAX_BUFFER_SIZE))
    }

    /// Unallocated stand-in left behind when a buffer is moved out of a
    /// guard. Not counted as a created buffer.
    pub(crate) fn detached() -> Self {
        Self {
            store: ByteStore::new(),
            max_size: MAX_BUFFER_SIZE,
        }
    }

    fn build(store: ByteStore, max_size: usize) -> Self {
        global_metrics().buffer_created();
        Self { store, max_size }
    }

    // ------------------------------------------------------------------
    // Typed writers
    // ------------------------------------------------------------------

    /// Write `value` big-endian at `[offset, offset + 4)`.
    pub fn write_u32_be(&mut self, value: u32, offset: usize) -> Result<()> {
        self.put(offset, &value.to_be_bytes())
    }

    /// Write `value` little-endian at `[offset, offset + 8)`.
    pub fn write_u64_le(&mut self, value: u64, offset: usize) -> Result<()> {
        self.put(offset, &value.to_le_bytes())
    }

    /// Write `value` as a big-endian two's-complement integer at `[offset, offset + 4)`.
    pub fn write_i32_be(&mut self, value: i32, offset: usize) -> Result<()> {
        self.put(offset, &value.to_be_bytes())
    }

    /// Write `value` big-endian at `[offset, offset + 2)`.
    pub fn write_u16_be(&mut self, value: u16, offset: usize) -> Result<()> {
        self.put(offset, &value.to_be_bytes())
    }

    /// Write the low 24 bits of `value` little-endian at `[offset, offset + 3)`.
    pub fn write_u24_le(&mut self, value: u32, offset: usize) -> Result<()> {
        self.write_uint_le(u64::from(value), offset, 3)
    }

    /// Write a signed char as one two's-complement byte.
    pub fn write_char(&mut self, value: i8, offset: usize) -> Result<()> {
        self.put(offset, &value.to_be_bytes())
    }

    /// Store a single byte verbatim.
    pub fn write_raw(&mut self, value: u8, offset: usize) -> Result<()> {
        self.set(offset, value)
    }

    /// Write `bytes` verbatim starting at `offset`, in input order.
    pub fn write_raw_run(&mut self, bytes: &[u8], offset: usize) -> Result<()> {
        self.put(offset, bytes)
    }

    /// Write the low `width` bytes of `value`, least-significant first.
    ///
    /// Higher bytes of `value` are discarded. `width` must be in `1..=8`.
    pub fn write_uint_le(&mut self, value: u64, offset: usize, width: usize) -> Result<()> {
        check_width(width)?;
        self.put(offset, &value.to_le_bytes()[..width])
    }

    /// Write the low `width` bytes of `value`, most-significant first.
    ///
    /// Higher bytes of `value` are discarded. `width` must be in `1..=8`.
    pub fn write_uint_be(&mut self, value: u64, offset: usize, width: usize) -> Result<()> {
        check_width(width)?;
        self.put(offset, &value.to_be_bytes()[MAX_FIELD_WIDTH - width..])
    }

    // ------------------------------------------------------------------
    // Typed readers
    // ------------------------------------------------------------------

    /// Read 3 bytes at `offset` as an unsigned little-endian integer.
    pub fn read_u24_le(&self, offset: usize) -> Result<u32> {
        // Three bytes always fit in a u32.
        self.read_uint_le(offset, 3).map(|value| value as u32)
    }

    /// Read 2 bytes at `offset` as an unsigned big-endian integer.
    pub fn read_u16_be(&self, offset: usize) -> Result<u16> {
        self.take::<2>(offset).map(u16::from_be_bytes)
    }

    /// Read 4 bytes at `offset` as an unsigned big-endian integer.
    pub fn read_u32_be(&self, offset: usize) -> Result<u32> {
        self.take::<4>(offset).map(u32::from_be_bytes)
    }

    /// Read 4 bytes at `offset` as a signed big-endian integer.
    pub fn read_i32_be(&self, offset: usize) -> Result<i32> {
        self.take::<4>(offset).map(i32::from_be_bytes)
    }

    /// Read 8 bytes at `offset` as an unsigned little-endian integer.
    pub fn read_u64_le(&self, offset: usize) -> Result<u64> {
        self.take::<8>(offset).map(u64::from_le_bytes)
    }

    /// Read the raw byte at `offset`.
    pub fn read_u8(&self, offset: usize) -> Result<u8> {
        self.get(offset)
    }

    /// Read the byte at `offset` as a two's-complement signed value.
    pub fn read_i8(&self, offset: usize) -> Result<i8> {
        self.take::<1>(offset).map(i8::from_be_bytes)
    }

    /// Borrow `len` bytes starting at `offset`; all of them must be populated.
    pub fn read_raw_run(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.field(offset, len)
    }

    /// Read `width` bytes at `offset` as an unsigned little-endian integer.
    pub fn read_uint_le(&self, offset: usize, width: usize) -> Result<u64> {
        check_width(width)?;
        let field = self.field(offset, width)?;
        let mut bytes = [0u8; MAX_FIELD_WIDTH];
        bytes[..width].copy_from_slice(field);
        Ok(u64::from_le_bytes(bytes))
    }

    /// Read `width` bytes at `offset` as an unsigned big-endian integer.
    pub fn read_uint_be(&self, offset: usize, width: usize) -> Result<u64> {
        check_width(width)?;
        let field = self.field(offset, width)?;
        let mut bytes = [0u8; MAX_FIELD_WIDTH];
        bytes[MAX_FIELD_WIDTH - width..].copy_from_slice(field);
        Ok(u64::from_be_bytes(bytes))
    }

    // ------------------------------------------------------------------
    // Indexed access
    // ------------------------------------------------------------------

    /// Byte at `offset`; fails with `OutOfRange` if the slot is unpopulated.
    pub fn get(&self, offset: usize) -> Result<u8> {
        self.store.get(offset).ok_or_else(|| self.miss(offset))
    }

    /// Set the byte at `offset`, extending storage if necessary.
    pub fn set(&mut self, offset: usize, value: u8) -> Result<()> {
        self.put(offset, &[value])
    }

    /// Whether `offset` currently holds a value
    pub fn exists(&self, offset: usize) -> bool {
        self.store.contains(offset)
    }

    /// Remove the byte at `offset`. Absent offsets are ignored.
    pub fn remove(&mut self, offset: usize) {
        self.store.unset(offset);
    }

    // ------------------------------------------------------------------
    // Whole-buffer access
    // ------------------------------------------------------------------

    #[inline]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of populated offsets
    #[inline]
    pub fn populated(&self) -> usize {
        self.store.populated()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    /// Growth limit of this buffer
    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Contiguous wire image; unpopulated slots read as zero.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        self.store.as_slice()
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Consume the buffer, returning the finished packet
    pub fn freeze(self) -> Bytes {
        Bytes::from(self.store.into_vec())
    }

    /// Drop all contents, keeping allocated capacity and the growth limit
    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Shorten the buffer to `len` bytes. No-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        self.store.truncate(len);
    }

    /// Reserve room for at least `additional` more bytes
    pub fn reserve(&mut self, additional: usize) {
        let room = self.max_size.saturating_sub(self.len());
        self.store.reserve(additional.min(room));
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Validate `[offset, offset + width)` against overflow and the growth limit.
    fn field_end(&self, offset: usize, width: usize) -> Result<usize> {
        let end = offset
            .checked_add(width)
            .ok_or(BufferError::OffsetOverflow { offset, width })?;
        if end > self.max_size {
            global_metrics().oversize_rejected();
            warn!(
                offset,
                width,
                max_size = self.max_size,
                "Rejected write past buffer limit"
            );
            return Err(BufferError::OversizedBuffer(end));
        }
        Ok(end)
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = self.field_end(offset, bytes.len())?;
        if bytes.is_empty() {
            return Ok(());
        }
        if end > self.store.len() {
            trace!(from = self.store.len(), to = end, "Growing packet buffer");
        }
        self.store.write_at(offset, bytes)
    }

    fn field(&self, offset: usize, width: usize) -> Result<&[u8]> {
        self.store
            .read_at(offset, width)
            .map_err(|missing| self.miss(missing))
    }

    fn take<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        let field = self.field(offset, N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(field);
        Ok(bytes)
    }

    fn miss(&self, offset: usize) -> BufferError {
        global_metrics().read_miss();
        BufferError::OutOfRange {
            offset,
            len: self.store.len(),
        }
    }
}

impl Default for PacketBuffer {
    fn default() -> Self {
        Self::new(0)
    }
}

impl AsRef<[u8]> for PacketBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<&[u8]> for PacketBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

#[inline]
fn check_width(width: usize) -> Result<()> {
    if (1..=MAX_FIELD_WIDTH).contains(&width) {
        Ok(())
    } else {
        Err(BufferError::InvalidWidth(width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u32_be_layout() {
        let mut buf = PacketBuffer::new(0);
        buf.write_u32_be(0x0102_0304, 0).unwrap();
        assert_eq!(buf.as_bytes(), &[0x01, 0x02, 0x03, 0x04]);
        assert_eq!(buf.read_u32_be(0).unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_u64_le_layout() {
        let mut buf = PacketBuffer::new(0);
        buf.write_u64_le(0x0102_0304_0506_0708, 0).unwrap();
        assert_eq!(
            buf.as_bytes(),
            &[0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01]
        );
        assert_eq!(buf.read_u64_le(0).unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn test_u24_le_layout() {
        let mut buf = PacketBuffer::new(0);
        buf.write_u24_le(0x010203, 0).unwrap();
        assert_eq!(buf.as_bytes(), &[0x03, 0x02, 0x01]);
        assert_eq!(buf.read_u24_le(0).unwrap(), 0x010203);
    }

    #[test]
    fn test_u24_le_discards_high_byte() {
        let mut buf = PacketBuffer::new(0);
        buf.write_u24_le(0xFF01_0203, 0).unwrap();
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.read_u24_le(0).unwrap(), 0x010203);
    }

    #[test]
    fn test_u16_be_at_offset() {
        let mut buf = PacketBuffer::new(0);
        buf.write_u16_be(256, 5).unwrap();
        assert_eq!(buf.len(), 7);
        assert_eq!(buf.get(5).unwrap(), 0x01);
        assert_eq!(buf.get(6).unwrap(), 0x00);
        assert!(!buf.exists(0));
    }

    #[test]
    fn test_i32_be_twos_complement() {
        let mut buf = PacketBuffer::new(0);
        buf.write_i32_be(-2, 0).unwrap();
        assert_eq!(buf.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFE]);
        assert_eq!(buf.read_i32_be(0).unwrap(), -2);
    }

    #[test]
    fn test_char_is_single_byte() {
        let mut buf = PacketBuffer::new(0);
        buf.write_char(-1, 2).unwrap();
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.get(2).unwrap(), 0xFF);
        assert_eq!(buf.read_i8(2).unwrap(), -1);
    }

    #[test]
    fn test_raw_run_on_empty_buffer() {
        let mut buf = PacketBuffer::new(0);
        buf.write_raw_run(b"abc", 2).unwrap();
        assert_eq!(buf.get(2).unwrap(), b'a');
        assert_eq!(buf.get(3).unwrap(), b'b');
        assert_eq!(buf.get(4).unwrap(), b'c');
        assert!(!buf.exists(0));
        assert!(!buf.exists(1));
        assert_eq!(buf.as_bytes(), &[0, 0, b'a', b'b', b'c']);
    }

    #[test]
    fn test_empty_raw_run_does_not_grow() {
        let mut buf = PacketBuffer::new(0);
        buf.write_raw_run(&[], 10).unwrap();
        assert!(buf.is_empty());
    }

    #[test]
    fn test_initial_size_is_unpopulated() {
        let buf = PacketBuffer::new(4);
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.populated(), 0);
        assert!(buf.get(0).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_read_reports_first_gap() {
        let mut buf = PacketBuffer::new(0);
        buf.write_u16_be(0xABCD, 0).unwrap();
        match buf.read_u32_be(0) {
            Err(BufferError::OutOfRange { offset, len }) => {
                assert_eq!(offset, 2);
                assert_eq!(len, 2);
            }
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_remove_semantics() {
        let mut buf = PacketBuffer::new(0);
        buf.set(3, 9).unwrap();
        assert!(buf.exists(3));
        buf.remove(3);
        assert!(!buf.exists(3));
        assert_eq!(buf.len(), 4);
        buf.remove(3);
        buf.remove(100);
        assert_eq!(buf.len(), 4);
    }

    #[test]
    fn test_overwrite_leaves_final_value() {
        let mut buf = PacketBuffer::new(0);
        buf.set(0, 1).unwrap();
        buf.set(0, 2).unwrap();
        assert_eq!(buf.get(0).unwrap(), 2);
        assert_eq!(buf.populated(), 1);
    }

    #[test]
    fn test_overlapping_write_keeps_length() {
        let mut buf = PacketBuffer::new(0);
        buf.write_u64_le(u64::MAX, 0).unwrap();
        buf.write_u16_be(0x1234, 3).unwrap();
        assert_eq!(buf.len(), 8);
        assert_eq!(
            buf.as_bytes(),
            &[0xFF, 0xFF, 0xFF, 0x12, 0x34, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_variable_width_rejects_bad_width() {
        let mut buf = PacketBuffer::new(0);
        assert!(matches!(
            buf.write_uint_le(1, 0, 0),
            Err(BufferError::InvalidWidth(0))
        ));
        assert!(matches!(
            buf.write_uint_be(1, 0, 9),
            Err(BufferError::InvalidWidth(9))
        ));
        assert!(matches!(
            buf.read_uint_le(0, 9),
            Err(BufferError::InvalidWidth(9))
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_variable_width_be_layout() {
        let mut buf = PacketBuffer::new(0);
        buf.write_uint_be(0x0A0B0C, 0, 3).unwrap();
        assert_eq!(buf.as_bytes(), &[0x0A, 0x0B, 0x0C]);
        assert_eq!(buf.read_uint_be(0, 3).unwrap(), 0x0A0B0C);
        assert_eq!(buf.read_uint_le(0, 3).unwrap(), 0x0C0B0A);
    }

    #[test]
    fn test_limit_rejects_without_mutation() {
        let mut buf = PacketBuffer::with_limit(0, 6).unwrap();
        buf.write_u16_be(0xBEEF, 0).unwrap();
        assert!(matches!(
            buf.write_u32_be(1, 3),
            Err(BufferError::OversizedBuffer(7))
        ));
        assert_eq!(buf.len(), 2);
        assert_eq!(buf.as_bytes(), &[0xBE, 0xEF]);
    }

    #[test]
    fn test_offset_overflow() {
        let mut buf = PacketBuffer::new(0);
        assert!(matches!(
            buf.write_u32_be(1, usize::MAX - 1),
            Err(BufferError::OffsetOverflow { width: 4, .. })
        ));
        assert!(buf.read_u32_be(usize::MAX - 1).unwrap_err().is_out_of_range());
    }

    #[test]
    fn test_with_limit_rejects_large_initial_size() {
        assert!(matches!(
            PacketBuffer::with_limit(10, 4),
            Err(BufferError::OversizedBuffer(10))
        ));
    }

    #[test]
    fn test_freeze_matches_wire_image() {
        let mut buf = PacketBuffer::new(0);
        buf.write_u16_be(0x0102, 1).unwrap();
        let expected = buf.to_vec();
        let frozen = buf.freeze();
        assert_eq!(&frozen[..], &expected[..]);
        assert_eq!(&frozen[..], &[0x00, 0x01, 0x02]);
    }

    #[test]
    fn test_clear_keeps_limit() {
        let mut buf = PacketBuffer::with_limit(0, 32).unwrap();
        buf.write_u64_le(7, 0).unwrap();
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.max_size(), 32);
    }
}
