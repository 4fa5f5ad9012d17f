//! Native extension boundary core.
//!
//! Registers native routines into an immutable export table at load time and
//! marshals host values through a per-call adapter.

pub mod adapter;
pub mod config;
pub mod error;
pub mod export;
pub mod extension;
pub mod logging;
pub mod marshal;
pub mod value;

pub use adapter::{call, CallFrame, CallStage};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeErrorKind, BridgeResult, HostError, NativeError};
pub use export::{
    load_module, ExportDecl, ExportInfo, ExportRecord, ExportTable, IntoNativeFn, ModuleHandle,
    ModuleRegistrar,
};
pub use extension::{custom_extension_exports, load_custom_extension, DEFAULT_MODULE_NAME};
pub use logging::{default_log_level, init_logging, logging_status};
pub use marshal::{ConversionError, ConversionSite, FromHost, IntoHost, NativeType};
pub use value::HostValue;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
