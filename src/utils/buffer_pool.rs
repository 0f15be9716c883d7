//! # Buffer Pool
//!
//! Object pool for packet buffers, so a sender assembling one packet per
//! audio frame does not allocate a fresh buffer every 20ms.
//!
//! ## Usage
//! ```rust,no_run
//! use packet_buffer::utils::buffer_pool::BufferPool;
//!
//! let pool = BufferPool::new(16);
//! let mut packet = pool.acquire();
//! packet.write_u16_be(1, 2)?;
//! // Buffer is cleared and returned to the pool on drop
//! # Ok::<(), packet_buffer::error::BufferError>(())
//! ```

use crate::config::{PoolConfig, DEFAULT_POOLED_CAPACITY, MAX_BUFFER_SIZE, MAX_POOLED_CAPACITY};
use crate::core::buffer::PacketBuffer;
use crate::utils::metrics::global_metrics;
use std::sync::{Arc, Mutex};
use tracing::debug;

type Shared = Arc<Mutex<Vec<PacketBuffer>>>;

/// A pooled packet buffer that returns itself to the pool when dropped
pub struct PooledBuffer {
    buffer: PacketBuffer,
    // None once the buffer has been detached
    pool: Option<Shared>,
    max_pooled_capacity: usize,
}

impl PooledBuffer {
    /// Take the assembled buffer out of the pool for good.
    ///
    /// Nothing is returned to the pool in its place; the next `acquire`
    /// allocates if the pool has run dry.
    pub fn into_inner(mut self) -> PacketBuffer {
        self.pool = None;
        std::mem::replace(&mut self.buffer, PacketBuffer::detached())
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        let Some(pool) = self.pool.take() else {
            return;
        };
        // Oversized buffers are freed
        if self.buffer.capacity() <= self.max_pooled_capacity {
            self.buffer.clear();
            if let Ok(mut pool) = pool.lock() {
                pool.push(std::mem::replace(&mut self.buffer, PacketBuffer::detached()));
            }
        } else {
            debug!(
                capacity = self.buffer.capacity(),
                "Dropping oversized buffer instead of pooling it"
            );
        }
    }
}

impl std::ops::Deref for PooledBuffer {
    type Target = PacketBuffer;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl std::ops::DerefMut for PooledBuffer {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

/// Thread-safe pool of packet buffers
#[derive(Clone)]
pub struct BufferPool {
    pool: Shared,
    buffer_capacity: usize,
    max_pooled_capacity: usize,
}

impl BufferPool {
    /// Create a new buffer pool with `pool_size` pre-allocated buffers
    pub fn new(pool_size: usize) -> Self {
        Self::with_config(&PoolConfig {
            pool_size,
            buffer_capacity: DEFAULT_POOLED_CAPACITY,
            max_pooled_capacity: MAX_POOLED_CAPACITY,
        })
    }

    pub fn with_config(config: &PoolConfig) -> Self {
        let mut pool = Vec::with_capacity(config.pool_size);
        for _ in 0..config.pool_size {
            pool.push(Self::allocate(config.buffer_capacity));
        }

        Self {
            pool: Arc::new(Mutex::new(pool)),
            buffer_capacity: config.buffer_capacity,
            max_pooled_capacity: config.max_pooled_capacity,
        }
    }

    /// Acquire an empty buffer from the pool (or allocate one if the pool is empty)
    pub fn acquire(&self) -> PooledBuffer {
        let pooled = self.pool.lock().ok().and_then(|mut pool| pool.pop());
        let buffer = match pooled {
            Some(buffer) => {
                global_metrics().buffer_reused();
                buffer
            }
            None => Self::allocate(self.buffer_capacity),
        };

        PooledBuffer {
            buffer,
            pool: Some(self.pool.clone()),
            max_pooled_capacity: self.max_pooled_capacity,
        }
    }

    /// Get the current number of available buffers in the pool
    pub fn available(&self) -> usize {
        self.pool.lock().map(|p| p.len()).unwrap_or(0)
    }

    fn allocate(capacity: usize) -> PacketBuffer {
        let mut buffer = PacketBuffer::new(0);
        buffer.reserve(capacity.min(MAX_BUFFER_SIZE));
        buffer
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::with_config(&PoolConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_buffer_pool_basic() {
        let pool = BufferPool::new(10);
        assert_eq!(pool.available(), 10);

        let mut buf = pool.acquire();
        assert_eq!(pool.available(), 9);

        buf.write_raw(42, 0).unwrap();
        assert_eq!(buf.get(0).unwrap(), 42);

        drop(buf);
        assert_eq!(pool.available(), 10);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_buffer_pool_reuse_is_cleared() {
        let pool = BufferPool::new(1);

        {
            let mut buf = pool.acquire();
            buf.write_raw_run(b"test", 0).unwrap();
            assert_eq!(buf.len(), 4);
        }

        let buf = pool.acquire();
        assert!(buf.is_empty());
        assert_eq!(buf.populated(), 0);
        assert!(buf.capacity() >= 4);
    }

    #[test]
    fn test_buffer_pool_empty() {
        let pool = BufferPool::new(1);
        let _buf1 = pool.acquire();
        let _buf2 = pool.acquire();

        assert_eq!(pool.available(), 0);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_buffer_size_limit() {
        let pool = BufferPool::new(1);

        {
            let mut buf = pool.acquire();
            buf.write_raw_run(&vec![0u8; MAX_POOLED_CAPACITY + 1], 0)
                .unwrap();
        }

        assert_eq!(pool.available(), 0);
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_into_inner_keeps_contents() {
        let pool = BufferPool::new(1);
        let mut guard = pool.acquire();
        guard.write_u16_be(0x0102, 0).unwrap();

        let buffer = guard.into_inner();
        assert_eq!(buffer.as_bytes(), &[0x01, 0x02]);
        assert!(buffer.capacity() >= DEFAULT_POOLED_CAPACITY);
        // Detached buffers do not come back
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_into_inner_does_not_refill_with_unreserved_buffer() {
        let pool = BufferPool::new(2);
        let detached = pool.acquire().into_inner();
        assert_eq!(pool.available(), 1);
        drop(detached);

        let first = pool.acquire();
        assert!(first.capacity() >= DEFAULT_POOLED_CAPACITY);
        // Pool ran dry, so this one is freshly allocated at full capacity
        let second = pool.acquire();
        assert!(second.capacity() >= DEFAULT_POOLED_CAPACITY);

        drop(first);
        drop(second);
        assert_eq!(pool.available(), 2);
    }
}
