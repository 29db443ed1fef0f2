use std::io::{IsTerminal, Write};

use aptprims_frame::endpoint::{bay_index, endpoint_name};
use aptprims_frame::opcode::opcode_name;
use aptprims_frame::{Header, Message, Payload};
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize, Debug)]
struct MessageOutput {
    kind: &'static str,
    opcode: String,
    opcode_name: Option<&'static str>,
    destination: String,
    destination_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    destination_bay: Option<u8>,
    source: String,
    source_name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    param1: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    param2: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_len: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<String>,
    wire: String,
}

impl MessageOutput {
    fn from_message(msg: &Message) -> Self {
        let (param1, param2, payload_len, payload) = match msg.payload() {
            Payload::Inline { param1, param2 } => (Some(*param1), Some(*param2), None, None),
            Payload::Extended(data) => (None, None, Some(data.len()), Some(hex(data))),
        };
        Self {
            kind: if msg.has_data() { "extended" } else { "inline" },
            opcode: format!("0x{:04X}", msg.opcode()),
            opcode_name: opcode_name(msg.opcode()),
            destination: format!("0x{:02X}", msg.destination()),
            destination_name: endpoint_name(msg.destination()),
            destination_bay: bay_index(msg.destination()),
            source: format!("0x{:02X}", msg.source()),
            source_name: endpoint_name(msg.source()),
            param1,
            param2,
            payload_len,
            payload,
            wire: hex(&msg.pack()),
        }
    }

    fn from_header(header: &Header) -> Self {
        let params = header.params();
        Self {
            kind: "header",
            opcode: format!("0x{:04X}", header.opcode()),
            opcode_name: opcode_name(header.opcode()),
            destination: format!("0x{:02X}", header.raw_destination()),
            destination_name: endpoint_name(header.destination()),
            destination_bay: bay_index(header.raw_destination()),
            source: format!("0x{:02X}", header.source()),
            source_name: endpoint_name(header.source()),
            param1: params.map(|(p1, _)| p1),
            param2: params.map(|(_, p2)| p2),
            payload_len: header.payload_len(),
            payload: None,
            wire: hex(&header.to_bytes()),
        }
    }

    fn summary(&self) -> String {
        match (self.param1, self.param2, self.payload_len) {
            (Some(p1), Some(p2), _) => format!("params={p1:02X} {p2:02X}"),
            (_, _, Some(len)) => match &self.payload {
                Some(payload) => format!("len={len} data={payload}"),
                None => format!("len={len} (unread)"),
            },
            _ => String::new(),
        }
    }
}

pub fn print_message(msg: &Message, format: OutputFormat) {
    match format {
        OutputFormat::Raw => print_raw(&msg.pack()),
        _ => print_output(&MessageOutput::from_message(msg), format),
    }
}

pub fn print_header(header: &Header, format: OutputFormat) {
    match format {
        OutputFormat::Raw => print_raw(&header.to_bytes()),
        _ => print_output(&MessageOutput::from_header(header), format),
    }
}

fn print_output(out: &MessageOutput, format: OutputFormat) {
    let name = out.opcode_name.unwrap_or("?");
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPCODE", "NAME", "DEST", "SRC", "BODY", "WIRE"])
                .add_row(vec![
                    out.opcode.clone(),
                    name.to_string(),
                    format!("{} ({})", out.destination, out.destination_name),
                    format!("{} ({})", out.source, out.source_name),
                    out.summary(),
                    out.wire.clone(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{} {} {} dest={} src={} {}",
                out.kind,
                out.opcode,
                name,
                out.destination,
                out.source,
                out.summary()
            );
        }
        OutputFormat::Raw => {}
    }
}

/// Print the name table for `opcodes`.
pub fn print_opcodes(entries: &[(u16, &'static str)], format: OutputFormat) {
    #[derive(Serialize)]
    struct Entry {
        opcode: String,
        name: &'static str,
    }

    match format {
        OutputFormat::Json => {
            let out: Vec<Entry> = entries
                .iter()
                .map(|&(code, name)| Entry {
                    opcode: format!("0x{code:04X}"),
                    name,
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OPCODE", "NAME"]);
            for &(code, name) in entries {
                table.add_row(vec![format!("0x{code:04X}"), name.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for &(code, name) in entries {
                println!("0x{code:04X} {name}");
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Space-separated uppercase hex, the notation vendor logs use.
pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{byte:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}
