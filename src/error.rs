//! # Error Types
//!
//! Error handling for packet assembly and its supporting utilities.
//!
//! ## Error Categories
//! - **Access Errors**: reads of unpopulated offsets, offset arithmetic overflow
//! - **Width Errors**: unsupported field widths (programming errors, fail fast)
//! - **Limit Errors**: growth past the configured buffer or packet size
//! - **Setup Errors**: configuration, logging and part construction failures
//!
//! All errors implement `std::error::Error` for interoperability.
//!
//! ## Example Usage
//! ```rust
//! use packet_buffer::core::buffer::PacketBuffer;
//! use packet_buffer::error::{BufferError, Result};
//!
//! fn ssrc(packet: &PacketBuffer) -> Result<u32> {
//!     packet.read_u32_be(8)
//! }
//!
//! let packet = PacketBuffer::new(0);
//! match ssrc(&packet) {
//!     Err(BufferError::OutOfRange { offset, .. }) => assert_eq!(offset, 8),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Static error messages shared by validation and setup paths.
pub mod constants {
    pub const ERR_LOGGING_INIT: &str = "Failed to install tracing subscriber";
    pub const ERR_LOG_FILE_MISSING: &str = "log_file_path must be specified when log_to_file is true";
    pub const ERR_NO_LOG_OUTPUT: &str =
        "At least one logging output (console or file) must be enabled";
}

// BufferError is the primary error type for every fallible operation in the crate
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum BufferError {
    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Offset {offset} is not populated (buffer length {len})")]
    OutOfRange { offset: usize, len: usize },

    #[error("Unsupported field width: {0} bytes (expected 1-8)")]
    InvalidWidth(usize),

    #[error("Field of {width} bytes at offset {offset} overflows the address space")]
    OffsetOverflow { offset: usize, width: usize },

    #[error("Buffer too large: {0} bytes")]
    OversizedBuffer(usize),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl BufferError {
    /// Whether this error reports a read of an unpopulated offset
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, BufferError::OutOfRange { .. })
    }
}

/// Type alias for Results using BufferError
pub type Result<T> = std::result::Result<T, BufferError>;
