//! Assemble the two fixed-layout packets a voice client sends over UDP:
//! the IP discovery request and an RTP audio header followed by an opaque
//! payload.

use bytes::BytesMut;
use packet_buffer::config::LoggingConfig;
use packet_buffer::utils::logging::init_logging;
use packet_buffer::utils::metrics::{global_metrics, init_metrics};
use packet_buffer::{PacketBuffer, PacketBufferCodec, Result};
use tokio_util::codec::Encoder;
use tracing::info;

const DISCOVERY_LEN: usize = 74;
const RTP_HEADER_LEN: usize = 12;

fn discovery_request(ssrc: u32) -> Result<PacketBuffer> {
    let mut packet = PacketBuffer::new(DISCOVERY_LEN);
    packet.write_u16_be(0x0001, 0)?;
    packet.write_u16_be(70, 2)?;
    packet.write_u32_be(ssrc, 4)?;
    // Address and port are filled in by the server's response
    packet.write_raw_run(&[0u8; 66], 8)?;
    Ok(packet)
}

fn audio_packet(
    sequence: u16,
    timestamp: u32,
    ssrc: u32,
    nonce: u32,
    frame: &[u8],
) -> Result<PacketBuffer> {
    let mut packet = PacketBuffer::new(RTP_HEADER_LEN);
    packet.write_raw(0x80, 0)?;
    packet.write_raw(0x78, 1)?;
    packet.write_u16_be(sequence, 2)?;
    packet.write_u32_be(timestamp, 4)?;
    packet.write_u32_be(ssrc, 8)?;
    packet.write_raw_run(frame, RTP_HEADER_LEN)?;
    packet.write_u32_be(nonce, RTP_HEADER_LEN + frame.len())?;
    Ok(packet)
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn main() -> Result<()> {
    init_logging(&LoggingConfig::default())?;
    init_metrics();

    let ssrc = 0x0001_E240;
    let discovery = discovery_request(ssrc)?;
    info!(
        len = discovery.len(),
        head = %hex(&discovery.as_bytes()[..8]),
        "IP discovery request"
    );

    let mut codec = PacketBufferCodec::default();
    let mut wire = BytesMut::new();
    let frame = [0xF8, 0xFF, 0xFE];
    for sequence in 0..3u16 {
        let timestamp = u32::from(sequence) * 960;
        let packet = audio_packet(sequence, timestamp, ssrc, u32::from(sequence), &frame)?;
        info!(
            sequence,
            header = %hex(&packet.as_bytes()[..RTP_HEADER_LEN]),
            "Audio packet"
        );
        codec.encode(packet, &mut wire)?;
    }

    info!(bytes = wire.len(), "Packets ready for transport");
    global_metrics().log_metrics();
    Ok(())
}
