//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load the built-in module the same way the host loader does.
//! - Print export metadata and evaluate `add` over command-line integers.
//!
//! Usage: `native-bridge [A B]` (defaults to `2 3`).

use native_bridge_core::{init_logging, load_custom_extension, BridgeConfig, HostValue};
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = BridgeConfig::from_env();
    if let Err(err) = init_logging(&config.log_level, config.log_dir_str().as_deref()) {
        eprintln!("logging disabled: {err}");
    }

    println!("native_bridge_core version={}", native_bridge_core::core_version());

    let module = match load_custom_extension(&config.module_name) {
        Ok(module) => module,
        Err(err) => {
            eprintln!("module load failed: {}", err.to_host_error());
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&module.exports()) {
        Ok(json) => println!("{} exports={json}", module.name()),
        Err(err) => eprintln!("failed to render exports: {err}"),
    }

    let args = parse_args(std::env::args().skip(1));
    let rendered = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    match module.call("add", &args) {
        Ok(value) => {
            println!("add({rendered}) = {value}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("add({rendered}) raised {}", err.to_host_error());
            ExitCode::FAILURE
        }
    }
}

/// Integers become `int`, everything else is passed through as `str` so the
/// adapter's conversion errors are observable from the command line.
fn parse_args(raw: impl Iterator<Item = String>) -> Vec<HostValue> {
    let values = raw
        .map(|arg| match arg.parse::<i64>() {
            Ok(value) => HostValue::Int(value),
            Err(_) => HostValue::Str(arg),
        })
        .collect::<Vec<_>>();
    if values.is_empty() {
        return vec![HostValue::Int(2), HostValue::Int(3)];
    }
    values
}
