use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use aptprims_frame::opcode::opcode_by_name;
use aptprims_frame::{text_payload, Message};

use crate::exit::{frame_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod device;
pub mod encode;
pub mod listen;
pub mod opcodes;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a message and print its wire bytes.
    Encode(EncodeArgs),
    /// Decode wire bytes given as hex.
    Decode(DecodeArgs),
    /// Write a single message to a device.
    Send(SendArgs),
    /// Print messages read from a device.
    Listen(ListenArgs),
    /// List well-known opcodes.
    Opcodes(OpcodesArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Opcodes(args) => opcodes::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Fields of a message to build, shared by `encode` and `send`.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// Opcode as a number (0x0223) or a name (MOD_IDENTIFY).
    pub opcode: String,
    /// First inline parameter.
    #[arg(long, value_parser = parse_number)]
    pub param1: Option<u32>,
    /// Second inline parameter.
    #[arg(long, value_parser = parse_number)]
    pub param2: Option<u32>,
    /// Extended payload as hex bytes ("01 02 0A" or "01020A").
    #[arg(long, conflicts_with = "text")]
    pub data: Option<String>,
    /// Extended payload as text, one byte per character.
    #[arg(long, conflicts_with = "data")]
    pub text: Option<String>,
    /// Destination endpoint.
    #[arg(long, value_parser = parse_number, env = "APTPRIMS_DEST", default_value = "0x50")]
    pub dest: u32,
    /// Source endpoint.
    #[arg(long, value_parser = parse_number, env = "APTPRIMS_SRC", default_value = "0x01")]
    pub src: u32,
}

impl MessageArgs {
    pub fn build(&self) -> CliResult<Message> {
        let opcode = match opcode_by_name(&self.opcode) {
            Some(code) => u32::from(code),
            None => parse_number(&self.opcode).map_err(|err| CliError::new(USAGE, err))?,
        };

        let mut builder = Message::builder(opcode)
            .destination(self.dest)
            .source(self.src);

        if self.param1.is_some() || self.param2.is_some() {
            builder = builder.params(self.param1.unwrap_or(0), self.param2.unwrap_or(0));
        }
        if let Some(data) = &self.data {
            builder = builder.data(parse_hex(data)?);
        }
        if let Some(text) = &self.text {
            builder = builder.data(text_payload(text).map_err(|err| frame_error("--text", err))?);
        }

        builder
            .build()
            .map_err(|err| frame_error("invalid message", err))
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub message: MessageArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Wire bytes as hex.
    pub hex: String,
    /// Stop after the 6-byte header of a long frame.
    #[arg(long)]
    pub header_only: bool,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Device path (e.g. /dev/ttyUSB0).
    pub device: PathBuf,
    #[command(flatten)]
    pub message: MessageArgs,
    /// Wait for one response message and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for a response when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Device path (e.g. /dev/ttyUSB0).
    pub device: PathBuf,
    /// Only print these opcodes (comma-separated numbers or names).
    #[arg(long, value_delimiter = ',')]
    pub opcodes: Option<Vec<String>>,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug, Default)]
pub struct OpcodesArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse a decimal or `0x`-prefixed hex number.
pub fn parse_number(input: &str) -> Result<u32, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid number: {input}"))
}

/// Parse a duration such as `5s`, `500ms` or a bare number of seconds.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else {
        (input.strip_suffix('s').unwrap_or(input), false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;
    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}

/// Parse hex bytes, ignoring whitespace, commas and `0x` prefixes.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: String = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .map(|token| {
            token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token)
        })
        .collect();

    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            USAGE,
            format!("hex input has an odd number of digits: {input}"),
        ));
    }

    (0..digits.len())
        .step_by(2)
        .map(|i| {
            digits
                .get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| CliError::new(USAGE, format!("invalid hex input: {input}")))
        })
        .collect()
}
