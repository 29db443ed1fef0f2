use aptprims_frame::opcode::KNOWN;
use aptprims_frame::{HEADER_SIZE, MAX_PAYLOAD};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    for (key, value) in version_lines(args.extended) {
        match key {
            Some(key) => println!("{key}: {value}"),
            None => println!("{value}"),
        }
    }
    Ok(SUCCESS)
}

fn version_lines(extended: bool) -> Vec<(Option<&'static str>, String)> {
    let version = env!("CARGO_PKG_VERSION");
    if !extended {
        return vec![(None, format!("aptprims {version}"))];
    }

    let build = |value: Option<&'static str>| value.unwrap_or("unknown").to_string();
    vec![
        (Some("name"), "aptprims".to_string()),
        (Some("version"), version.to_string()),
        (Some("target"), build(option_env!("APTPRIMS_BUILD_TARGET"))),
        (Some("profile"), build(option_env!("APTPRIMS_BUILD_PROFILE"))),
        (Some("header_size"), HEADER_SIZE.to_string()),
        (Some("max_payload"), MAX_PAYLOAD.to_string()),
        (Some("known_opcodes"), KNOWN.len().to_string()),
        (
            Some("features"),
            format!("async={}, cli=true", cfg!(feature = "async")),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_version_is_one_line() {
        let lines = version_lines(false);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].1.starts_with("aptprims "));
    }

    #[test]
    fn extended_version_reports_frame_limits() {
        let lines = version_lines(true);
        let get = |key: &str| {
            lines
                .iter()
                .find(|(k, _)| *k == Some(key))
                .map(|(_, v)| v.clone())
        };
        assert_eq!(get("header_size").as_deref(), Some("6"));
        assert_eq!(get("max_payload").as_deref(), Some("65535"));
        assert!(get("target").is_some());
    }
}
