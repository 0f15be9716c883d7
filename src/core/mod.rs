//! # Core Packet Components
//!
//! Byte storage, typed offset access, and the transport hand-off.
//!
//! ## Components
//! - **ByteStore**: contiguous bytes with a population mask
//! - **PacketBuffer**: typed, offset-addressed field access layered on a store
//! - **Codec**: Tokio codec handing finished buffers to a datagram transport
//!
//! ## Limits
//! - Default growth limit: 16MB (prevents a stray offset from exhausting memory)
//! - Width and range validation happen before any byte is written

pub mod buffer;
pub mod codec;
pub mod store;
