//! Header-first read: learn the payload length from 6 bytes, then read the rest.
//!
//! Run with:
//!   cargo run --example header-first

use std::io::Cursor;

use aptprims::frame::opcode::{HW_GET_INFO, HW_REQ_INFO};
use aptprims::frame::{MessageReader, MessageWriter};
use aptprims::{decode_header, Message};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Host side: request hardware info.
    let mut writer = MessageWriter::new(Cursor::new(Vec::new()));
    writer.write_message(&Message::new(HW_REQ_INFO))?;
    let request = writer.into_inner().into_inner();
    eprintln!("[host] request: {request:02X?}");

    // Device side: an 84-byte info block in a long frame.
    let mut info = 83_000_001u32.to_le_bytes().to_vec();
    info.extend_from_slice(b"TDC001\0\0");
    info.resize(84, 0);
    let reply = Message::builder(HW_GET_INFO)
        .destination(0x01u8)
        .source(0x50u8)
        .data(info)
        .build()?
        .pack();

    // Six bytes are enough to know how much more to read.
    let header = decode_header(&reply[..6])?;
    eprintln!(
        "[host] header: opcode=0x{:04X} raw_dest=0x{:02X} payload_len={:?}",
        header.opcode(),
        header.raw_destination(),
        header.payload_len()
    );

    let mut reader = MessageReader::new(Cursor::new(reply.to_vec()));
    let msg = reader.read_message()?;
    let data = msg.data().map(|d| d.to_vec()).unwrap_or_default();
    let model = String::from_utf8_lossy(&data[4..12]);
    eprintln!("[host] model: {}", model.trim_end_matches('\0'));

    Ok(())
}
