use std::fs::OpenOptions;
use std::time::Duration;

use aptprims_frame::{Message, MessageReader, MessageWriter};

use crate::cmd::device::{DeviceReader, Received};
use crate::cmd::{parse_duration, SendArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, FAILURE, SUCCESS, TIMEOUT};
use crate::output::{print_message, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let msg = args.message.build()?;
    let wait_timeout = parse_duration(&args.wait_timeout)?;

    let device = OpenOptions::new()
        .read(true)
        .write(true)
        .open(&args.device)
        .map_err(|err| io_error(&format!("failed opening {}", args.device.display()), err))?;
    let responses = if args.wait {
        let clone = device
            .try_clone()
            .map_err(|err| io_error("failed cloning device handle", err))?;
        let reader = DeviceReader::spawn(MessageReader::new(clone))
            .map_err(|err| io_error("failed starting device reader", err))?;
        Some(reader)
    } else {
        None
    };
    let mut writer = MessageWriter::new(device);

    tracing::info!(
        device = %args.device.display(),
        opcode = msg.opcode(),
        "sending message"
    );
    writer
        .write_message(&msg)
        .map_err(|err| frame_error("send failed", err))?;

    if let Some(responses) = responses {
        let response = wait_for_response(&responses, wait_timeout)?;
        print_message(&response, format);
    }
    Ok(SUCCESS)
}

fn wait_for_response(device: &DeviceReader, timeout: Duration) -> CliResult<Message> {
    match device
        .recv_timeout(timeout)
        .map_err(|err| frame_error("receive failed", err))?
    {
        Received::Message(msg) => Ok(msg),
        Received::Closed => Err(CliError::new(
            FAILURE,
            "receive failed: device closed before responding",
        )),
        Received::Idle => Err(CliError::new(
            TIMEOUT,
            format!("no response within {}ms", timeout.as_millis()),
        )),
    }
}
