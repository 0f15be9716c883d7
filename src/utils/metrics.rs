//! Observability and Metrics
//!
//! Counters for monitoring packet assembly, framing and cache behaviour.
//!
//! Uses atomic counters for thread-safe metrics collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Global metrics collector for buffer operations
#[derive(Debug)]
pub struct Metrics {
    /// Packet buffers allocated
    pub buffers_created: AtomicU64,
    /// Packet buffers handed out again by a pool
    pub buffers_reused: AtomicU64,
    /// Reads that hit an unpopulated offset
    pub read_misses: AtomicU64,
    /// Writes rejected by a growth limit
    pub oversize_rejections: AtomicU64,
    /// Finished packets handed to a transport
    pub frames_encoded: AtomicU64,
    /// Bytes handed to a transport
    pub bytes_encoded: AtomicU64,
    /// Datagrams turned into packet buffers
    pub frames_decoded: AtomicU64,
    /// Bytes received from a transport
    pub bytes_decoded: AtomicU64,
    /// Part cache pulls that found an entry
    pub cache_hits: AtomicU64,
    /// Part cache pulls that fell back to construction
    pub cache_misses: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            buffers_created: AtomicU64::new(0),
            buffers_reused: AtomicU64::new(0),
            read_misses: AtomicU64::new(0),
            oversize_rejections: AtomicU64::new(0),
            frames_encoded: AtomicU64::new(0),
            bytes_encoded: AtomicU64::new(0),
            frames_decoded: AtomicU64::new(0),
            bytes_decoded: AtomicU64::new(0),
            cache_hits: AtomicU64::new(0),
            cache_misses: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn buffer_created(&self) {
        self.buffers_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn buffer_reused(&self) {
        self.buffers_reused.fetch_add(1, Ordering::Relaxed);
    }

    pub fn read_miss(&self) {
        self.read_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn oversize_rejected(&self) {
        self.oversize_rejections.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a packet handed to a transport
    pub fn frame_encoded(&self, byte_count: u64) {
        self.frames_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_encoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a datagram received from a transport
    pub fn frame_decoded(&self, byte_count: u64) {
        self.frames_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_decoded.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            buffers_created: self.buffers_created.load(Ordering::Relaxed),
            buffers_reused: self.buffers_reused.load(Ordering::Relaxed),
            read_misses: self.read_misses.load(Ordering::Relaxed),
            oversize_rejections: self.oversize_rejections.load(Ordering::Relaxed),
            frames_encoded: self.frames_encoded.load(Ordering::Relaxed),
            bytes_encoded: self.bytes_encoded.load(Ordering::Relaxed),
            frames_decoded: self.frames_decoded.load(Ordering::Relaxed),
            bytes_decoded: self.bytes_decoded.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            buffers_created = snapshot.buffers_created,
            buffers_reused = snapshot.buffers_reused,
            read_misses = snapshot.read_misses,
            oversize_rejections = snapshot.oversize_rejections,
            frames_encoded = snapshot.frames_encoded,
            bytes_encoded = snapshot.bytes_encoded,
            frames_decoded = snapshot.frames_decoded,
            bytes_decoded = snapshot.bytes_decoded,
            cache_hits = snapshot.cache_hits,
            cache_misses = snapshot.cache_misses,
            uptime_seconds = snapshot.uptime_seconds,
            "Packet buffer metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub buffers_created: u64,
    pub buffers_reused: u64,
    pub read_misses: u64,
    pub oversize_rejections: u64,
    pub frames_encoded: u64,
    pub bytes_encoded: u64,
    pub frames_decoded: u64,
    pub bytes_decoded: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<Metrics> = once_cell::sync::Lazy::new(Metrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static Metrics {
    &METRICS
}

/// Initialize metrics collection (call once at startup)
pub fn init_metrics() {
    let _ = global_metrics();
    info!("Metrics collection initialized");
}
