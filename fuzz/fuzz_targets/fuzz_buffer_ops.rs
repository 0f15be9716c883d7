#![no_main]

use libfuzzer_sys::fuzz_target;
use packet_buffer::PacketBuffer;

fuzz_target!(|data: &[u8]| {
    // Drive arbitrary accessor sequences against a small limit: no panics,
    // and every successful write must read back
    let mut buf = match PacketBuffer::with_limit(0, 512) {
        Ok(buf) => buf,
        Err(_) => return,
    };

    for chunk in data.chunks(4) {
        let (op, offset, a, b) = match *chunk {
            [op, offset, a, b] => (op, usize::from(offset) * 2, a, b),
            _ => return,
        };
        let word = u16::from_be_bytes([a, b]);

        match op % 8 {
            0 => {
                if buf.write_u16_be(word, offset).is_ok() {
                    assert_eq!(buf.read_u16_be(offset).ok(), Some(word));
                }
            }
            1 => {
                if buf.write_u32_be(u32::from(word) << 8, offset).is_ok() {
                    assert_eq!(buf.read_u32_be(offset).ok(), Some(u32::from(word) << 8));
                }
            }
            2 => {
                let _ = buf.write_u64_le(u64::from(word), offset);
            }
            3 => {
                let _ = buf.write_uint_le(u64::from(word), offset, usize::from(a % 10));
            }
            4 => buf.remove(offset),
            5 => {
                let _ = buf.read_u24_le(offset);
            }
            6 => {
                let _ = buf.write_raw_run(&data[..usize::from(a) % data.len()], offset);
            }
            _ => {
                let _ = buf.read_uint_be(offset, usize::from(b % 10));
            }
        }
    }

    assert!(buf.len() <= 512);
    assert!(buf.populated() <= buf.len());
});
