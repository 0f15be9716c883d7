//! # Packet Buffer
//!
//! Offset-addressed assembly buffer for fixed-layout binary packets such as
//! voice RTP headers and IP-discovery requests.
//!
//! Fields are written and read at explicit byte offsets through accessors
//! that each fix a width and an endianness, so call sites match the wire
//! format they implement.
//!
//! ## Modules
//! - [`core`]: byte storage, the typed [`PacketBuffer`], and its transport codec
//! - [`config`]: TOML / environment configuration with validation
//! - [`error`]: the [`BufferError`] type and `Result` alias
//! - [`utils`]: buffer pool, part cache, logging and metrics
//!
//! ## Example
//! ```rust
//! use packet_buffer::PacketBuffer;
//!
//! let mut packet = PacketBuffer::new(0);
//! packet.write_u16_be(0x0001, 0)?;
//! packet.write_u16_be(70, 2)?;
//! packet.write_u32_be(0x1234_5678, 4)?;
//! assert_eq!(&packet.as_bytes()[..4], &[0x00, 0x01, 0x00, 0x46]);
//! # Ok::<(), packet_buffer::BufferError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod utils;

pub use crate::core::buffer::PacketBuffer;
pub use crate::core::codec::PacketBufferCodec;
pub use crate::core::store::ByteStore;
pub use crate::error::{BufferError, Result};
