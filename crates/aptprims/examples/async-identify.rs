//! Async framing with `AptCodec` over an in-memory duplex stream.
//!
//! Run with:
//!   cargo run --example async-identify --features async

use futures_util::{SinkExt, StreamExt};
use tokio_util::codec::Framed;

use aptprims::frame::opcode::MOD_IDENTIFY;
use aptprims::frame::AptCodec;
use aptprims::Message;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (host, device) = tokio::io::duplex(256);
    let mut host = Framed::new(host, AptCodec::new());
    let mut device = Framed::new(device, AptCodec::new());

    let device_task = tokio::spawn(async move {
        while let Some(msg) = device.next().await {
            let msg = msg?;
            eprintln!("[device] opcode=0x{:04X} params={:?}", msg.opcode(), msg.params());
            if msg.opcode() == MOD_IDENTIFY {
                break;
            }
        }
        Ok::<_, aptprims::FrameError>(())
    });

    host.send(Message::with_params(MOD_IDENTIFY, 0, 0)).await?;
    device_task.await??;
    eprintln!("[host] identify delivered");
    Ok(())
}
