use aptprims_frame::{unpack, Decoded};

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_header, print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let wire = parse_hex(&args.hex)?;
    let decoded =
        unpack(&wire, args.header_only).map_err(|err| frame_error("decode failed", err))?;

    let consumed = decoded.frame_len();
    if !args.header_only && wire.len() > consumed {
        tracing::warn!(
            trailing = wire.len() - consumed,
            "ignoring bytes after the frame"
        );
    }

    match decoded {
        Decoded::Message(msg) => print_message(&msg, format),
        Decoded::Header(header) => print_header(&header, format),
    }
    Ok(SUCCESS)
}
