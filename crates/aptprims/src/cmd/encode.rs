use crate::cmd::EncodeArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let msg = args.message.build()?;
    tracing::debug!(
        opcode = msg.opcode(),
        len = msg.wire_len(),
        "encoded message"
    );
    print_message(&msg, format);
    Ok(SUCCESS)
}
