use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use aptprims_frame::opcode::opcode_by_name;
use aptprims_frame::{FrameError, Message, MessageReader};

use crate::cmd::device::{DeviceReader, Received};
use crate::cmd::{parse_number, ListenArgs};
use crate::exit::{frame_error, io_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_message, OutputFormat};

/// How often a quiet device is checked for Ctrl-C.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let filter = args
        .opcodes
        .as_deref()
        .map(resolve_opcodes)
        .transpose()?;

    let device = File::open(&args.device)
        .map_err(|err| io_error(&format!("failed opening {}", args.device.display()), err))?;
    let device = DeviceReader::spawn(MessageReader::new(device))
        .map_err(|err| io_error("failed starting device reader", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    tracing::info!(device = %args.device.display(), "listening");
    let printed = pump(
        &device,
        filter.as_deref(),
        args.count,
        &running,
        POLL_INTERVAL,
        |msg| print_message(msg, format),
    )
    .map_err(|err| frame_error("receive failed", err))?;
    tracing::info!(printed, "listen finished");

    Ok(SUCCESS)
}

/// Print messages until the device closes, `count` matches, or `running` is cleared.
///
/// `running` is rechecked at least every `poll` while the device is quiet. A
/// device that ends inside a frame is an error.
fn pump(
    device: &DeviceReader,
    filter: Option<&[u16]>,
    count: Option<usize>,
    running: &AtomicBool,
    poll: Duration,
    mut on_message: impl FnMut(&Message),
) -> Result<usize, FrameError> {
    let mut printed = 0usize;

    while running.load(Ordering::SeqCst) {
        let msg = match device.recv_timeout(poll) {
            Ok(Received::Message(msg)) => msg,
            Ok(Received::Idle) => continue,
            Ok(Received::Closed) => break,
            Err(err @ FrameError::PayloadTooLarge { .. }) => {
                tracing::warn!(error = %err, "skipped frame");
                continue;
            }
            Err(err) => return Err(err),
        };

        if let Some(filter) = filter {
            if !filter.contains(&msg.opcode()) {
                tracing::debug!(opcode = msg.opcode(), "filtered out");
                continue;
            }
        }

        on_message(&msg);
        printed = printed.saturating_add(1);

        if count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    Ok(printed)
}

fn resolve_opcodes(names: &[String]) -> CliResult<Vec<u16>> {
    names
        .iter()
        .map(|name| {
            if let Some(code) = opcode_by_name(name) {
                return Ok(code);
            }
            parse_number(name)
                .ok()
                .and_then(|value| u16::try_from(value).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("unknown opcode: {name}")))
        })
        .collect()
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::thread;

    use aptprims_frame::opcode::{MOT_GET_DCSTATUSUPDATE, MOT_MOVE_COMPLETED, MOT_MOVE_HOMED};

    use super::*;
    use crate::cmd::device::tests::Silent;

    const POLL: Duration = Duration::from_millis(10);

    fn wire() -> Vec<u8> {
        let mut wire = Vec::new();
        wire.extend_from_slice(&Message::with_data(MOT_GET_DCSTATUSUPDATE, vec![0u8; 14]).unwrap().pack());
        wire.extend_from_slice(&Message::with_params(MOT_MOVE_HOMED, 1, 0).pack());
        wire.extend_from_slice(&Message::with_data(MOT_MOVE_COMPLETED, vec![1u8, 0]).unwrap().pack());
        wire
    }

    fn device(wire: Vec<u8>) -> DeviceReader {
        DeviceReader::spawn(MessageReader::new(Cursor::new(wire))).unwrap()
    }

    #[test]
    fn pump_reads_until_eof() {
        let running = AtomicBool::new(true);
        let mut seen = Vec::new();
        let printed = pump(&device(wire()), None, None, &running, POLL, |msg| {
            seen.push(msg.opcode())
        })
        .unwrap();
        assert_eq!(printed, 3);
        assert_eq!(seen, vec![MOT_GET_DCSTATUSUPDATE, MOT_MOVE_HOMED, MOT_MOVE_COMPLETED]);
    }

    #[test]
    fn pump_filters_and_counts() {
        let running = AtomicBool::new(true);
        let filter = [MOT_MOVE_HOMED, MOT_MOVE_COMPLETED];
        let mut seen = Vec::new();
        let printed = pump(&device(wire()), Some(&filter), Some(1), &running, POLL, |msg| {
            seen.push(msg.opcode())
        })
        .unwrap();
        assert_eq!(printed, 1);
        assert_eq!(seen, vec![MOT_MOVE_HOMED]);
    }

    #[test]
    fn pump_stops_when_not_running() {
        let running = AtomicBool::new(false);
        let printed = pump(&device(wire()), None, None, &running, POLL, |_| {}).unwrap();
        assert_eq!(printed, 0);
    }

    #[test]
    fn pump_stops_on_ctrlc_while_device_is_quiet() {
        let device = DeviceReader::spawn(MessageReader::new(Silent)).unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let stopper = {
            let running = running.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(50));
                running.store(false, Ordering::SeqCst);
            })
        };

        let printed = pump(&device, None, None, &running, POLL, |_| {}).unwrap();
        assert_eq!(printed, 0);
        stopper.join().unwrap();
    }

    #[test]
    fn pump_reports_stream_ending_mid_frame() {
        let mut wire = Message::with_params(MOT_MOVE_HOMED, 1, 0).pack().to_vec();
        wire.extend_from_slice(&[0x64, 0x04, 0x05, 0x00, 0x81, 0x50, 0x01]);

        let running = AtomicBool::new(true);
        let mut seen = Vec::new();
        let err = pump(&device(wire), None, None, &running, POLL, |msg| {
            seen.push(msg.opcode())
        })
        .unwrap_err();

        assert_eq!(seen, vec![MOT_MOVE_HOMED]);
        assert!(matches!(
            err,
            FrameError::TruncatedPayload {
                declared: 5,
                available: 1
            }
        ));
    }

    #[test]
    fn pump_skips_oversized_frames() {
        let mut wire = Message::with_data(MOT_GET_DCSTATUSUPDATE, vec![0u8; 14])
            .unwrap()
            .pack()
            .to_vec();
        wire.extend_from_slice(&Message::new(MOT_MOVE_HOMED).pack());
        let mut reader = MessageReader::new(Cursor::new(wire));
        reader.set_max_payload_size(4);

        let running = AtomicBool::new(true);
        let mut seen = Vec::new();
        let printed = pump(
            &DeviceReader::spawn(reader).unwrap(),
            None,
            None,
            &running,
            POLL,
            |msg| seen.push(msg.opcode()),
        )
        .unwrap();
        assert_eq!(printed, 1);
        assert_eq!(seen, vec![MOT_MOVE_HOMED]);
    }

    #[test]
    fn resolve_opcodes_mixes_names_and_numbers() {
        let names = vec!["MOT_MOVE_HOMED".to_string(), "0x0464".to_string(), "1090".to_string()];
        assert_eq!(resolve_opcodes(&names).unwrap(), vec![0x0444, 0x0464, 1090]);

        let err = resolve_opcodes(&["0x10000".to_string()]).unwrap_err();
        assert_eq!(err.code, USAGE);
    }
}
