use aptprims_frame::opcode::KNOWN;

use crate::cmd::OpcodesArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_opcodes, OutputFormat};

pub fn run(_args: OpcodesArgs, format: OutputFormat) -> CliResult<i32> {
    print_opcodes(KNOWN, format);
    Ok(SUCCESS)
}
