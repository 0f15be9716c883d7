//! # Packet Buffer Codec
//!
//! Hands finished packet buffers to a framed transport and turns received
//! datagrams back into buffers.
//!
//! The codec has datagram semantics: one encoded buffer is one frame, and
//! the decoder consumes everything it is given as a single packet. This is
//! the shape `tokio_util::udp::UdpFramed` expects for voice traffic.

use crate::config::MAX_BUFFER_SIZE;
use crate::core::buffer::PacketBuffer;
use crate::error::BufferError;
use crate::utils::metrics::global_metrics;
use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

/// Datagram codec for [`PacketBuffer`]
#[derive(Debug, Clone, Copy)]
pub struct PacketBufferCodec {
    max_packet_size: usize,
}

impl PacketBufferCodec {
    pub fn new(max_packet_size: usize) -> Self {
        Self { max_packet_size }
    }

    pub fn max_packet_size(&self) -> usize {
        self.max_packet_size
    }

    fn check_size(&self, len: usize) -> Result<(), BufferError> {
        if len > self.max_packet_size {
            warn!(
                len,
                max_packet_size = self.max_packet_size,
                "Packet exceeds codec limit"
            );
            global_metrics().oversize_rejected();
            return Err(BufferError::OversizedBuffer(len));
        }
        Ok(())
    }
}

impl Default for PacketBufferCodec {
    fn default() -> Self {
        Self::new(MAX_BUFFER_SIZE)
    }
}

impl Encoder<&PacketBuffer> for PacketBufferCodec {
    type Error = BufferError;

    fn encode(&mut self, item: &PacketBuffer, dst: &mut BytesMut) -> Result<(), Self::Error> {
        self.check_size(item.len())?;
        if item.is_empty() {
            return Ok(());
        }
        dst.extend_from_slice(item.as_bytes());
        global_metrics().frame_encoded(item.len() as u64);
        Ok(())
    }
}

impl Encoder<PacketBuffer> for PacketBufferCodec {
    type Error = BufferError;

    fn encode(&mut self, item: PacketBuffer, dst: &mut BytesMut) -> Result<(), Self::Error> {
        <Self as Encoder<&PacketBuffer>>::encode(self, &item, dst)
    }
}

impl Decoder for PacketBufferCodec {
    type Item = PacketBuffer;
    type Error = BufferError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.is_empty() {
            return Ok(None);
        }
        self.check_size(src.len())?;

        let datagram = src.split();
        global_metrics().frame_decoded(datagram.len() as u64);
        Ok(Some(PacketBuffer::from_bytes(&datagram)))
    }
}
