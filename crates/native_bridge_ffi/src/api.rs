//! FFI module-boundary API for Dart-facing calls.
//!
//! # Responsibility
//! - Publish the loaded module to the host exactly once (`module_init`).
//! - Dispatch host calls by export name (`module_call`).
//! - Expose export metadata for host help tooling.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Internal errors are translated into `CallResponse` at the last step.
//!
//! # See also
//! - native_bridge_core::adapter

use log::warn;
use native_bridge_core::{
    core_version as core_version_inner, init_logging as init_logging_inner,
    load_custom_extension, ping as ping_inner, BridgeConfig, BridgeError, ExportInfo, HostValue,
    ModuleHandle,
};
use once_cell::sync::OnceCell;

static MODULE: OnceCell<ModuleHandle> = OnceCell::new();

/// FFI mirror of a host runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeValue {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<BridgeValue>),
}

impl From<BridgeValue> for HostValue {
    fn from(value: BridgeValue) -> Self {
        match value {
            BridgeValue::None => HostValue::None,
            BridgeValue::Bool(raw) => HostValue::Bool(raw),
            BridgeValue::Int(raw) => HostValue::Int(raw),
            BridgeValue::Float(raw) => HostValue::Float(raw),
            BridgeValue::Str(raw) => HostValue::Str(raw),
            BridgeValue::List(items) => HostValue::List(items.into_iter().map(Into::into).collect()),
        }
    }
}

impl From<HostValue> for BridgeValue {
    fn from(value: HostValue) -> Self {
        match value {
            HostValue::None => BridgeValue::None,
            HostValue::Bool(raw) => BridgeValue::Bool(raw),
            HostValue::Int(raw) => BridgeValue::Int(raw),
            HostValue::Float(raw) => BridgeValue::Float(raw),
            HostValue::Str(raw) => BridgeValue::Str(raw),
            HostValue::List(items) => BridgeValue::List(items.into_iter().map(Into::into).collect()),
        }
    }
}

/// Result envelope for one host call.
#[derive(Debug, Clone, PartialEq)]
pub struct CallResponse {
    /// Whether the call returned a value.
    pub ok: bool,
    /// Returned value on success.
    pub value: Option<BridgeValue>,
    /// Stable error kind code on failure (`arity_mismatch`, ...).
    pub error_kind: Option<String>,
    /// Human-readable diagnostics; empty on success.
    pub message: String,
}

impl CallResponse {
    fn success(value: HostValue) -> Self {
        Self {
            ok: true,
            value: Some(value.into()),
            error_kind: None,
            message: String::new(),
        }
    }

    fn failure(err: &BridgeError) -> Self {
        let host = err.to_host_error();
        Self {
            ok: false,
            value: None,
            error_kind: Some(host.kind.as_str().to_string()),
            message: host.message,
        }
    }
}

/// Export metadata surfaced to host introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDescriptor {
    pub name: String,
    /// Empty when the export has no description.
    pub description: String,
    pub signature: String,
    pub arity: u32,
}

impl From<ExportInfo> for ExportDescriptor {
    fn from(info: ExportInfo) -> Self {
        Self {
            name: info.name,
            description: info.description.unwrap_or_default(),
            signature: info.signature,
            arity: u32::try_from(info.arity).unwrap_or(u32::MAX),
        }
    }
}

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// `log_dir = None` logs to stderr. Returns empty string on success and the
/// error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: Option<String>) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_deref()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Load entry point: registers the module exports once per process.
///
/// # FFI contract
/// - `module_name = None` uses `NATIVE_BRIDGE_MODULE_NAME` or the default.
/// - Repeated calls with the loaded name are no-ops.
/// - A different name after load, or a registration failure, aborts with an
///   error message; empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn module_init(module_name: Option<String>) -> String {
    let requested = module_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| BridgeConfig::from_env().module_name);

    match MODULE.get_or_try_init(|| load_custom_extension(&requested)) {
        Ok(module) if module.name() == requested => String::new(),
        Ok(module) => format!(
            "module already loaded as `{}`; refusing to load as `{requested}`",
            module.name()
        ),
        Err(err) => {
            let host = err.to_host_error();
            format!("module load failed ({}): {}", host.kind, host.message)
        }
    }
}

/// Call entry point: invokes one export with host arguments.
///
/// # FFI contract
/// - Sync call, bounded-time.
/// - Never panics; failures are returned with a stable `error_kind`.
/// - Calling before `module_init` reports `unknown_export`.
/// - `name` is trimmed, matching `module_describe`.
#[flutter_rust_bridge::frb(sync)]
pub fn module_call(name: String, args: Vec<BridgeValue>) -> CallResponse {
    let name = name.trim();
    let args = args.into_iter().map(HostValue::from).collect::<Vec<_>>();
    let result = match MODULE.get() {
        Some(module) => module.call(name, &args),
        None => {
            warn!("event=call_failed module=ffi status=error reason=module_not_loaded export={name}");
            Err(BridgeError::UnknownExport(name.to_string()))
        }
    };
    match result {
        Ok(value) => CallResponse::success(value),
        Err(err) => CallResponse::failure(&err),
    }
}

/// Lists export metadata; empty before `module_init`.
#[flutter_rust_bridge::frb(sync)]
pub fn module_exports() -> Vec<ExportDescriptor> {
    MODULE
        .get()
        .map(|module| module.exports().into_iter().map(Into::into).collect())
        .unwrap_or_default()
}

/// Returns metadata for one export.
#[flutter_rust_bridge::frb(sync)]
pub fn module_describe(name: String) -> Option<ExportDescriptor> {
    MODULE
        .get()
        .and_then(|module| module.describe(name.trim()))
        .map(Into::into)
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, module_call, module_describe, module_exports, module_init,
        ping, BridgeValue,
    };
    use native_bridge_core::HostValue;

    fn loaded() {
        let error = module_init(Some("custom_extension".to_string()));
        assert!(error.is_empty(), "{error}");
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_relative_log_dir() {
        let error = init_logging("info".to_string(), Some("tmp/logs".to_string()));
        assert!(error.contains("absolute"));
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), None);
        assert!(!error.is_empty());
    }

    #[test]
    fn module_init_is_idempotent_and_rejects_renames() {
        loaded();
        loaded();
        let error = module_init(Some("other_module".to_string()));
        assert!(error.contains("refusing"));
    }

    #[test]
    fn module_call_returns_values_and_error_kinds() {
        loaded();

        let ok = module_call(
            "add".to_string(),
            vec![BridgeValue::Int(2), BridgeValue::Int(3)],
        );
        assert!(ok.ok, "{}", ok.message);
        assert_eq!(ok.value, Some(BridgeValue::Int(5)));

        let arity = module_call("add".to_string(), vec![BridgeValue::Int(2)]);
        assert!(!arity.ok);
        assert_eq!(arity.error_kind.as_deref(), Some("arity_mismatch"));
        assert!(arity.message.contains("expected 2, got 1"));

        let conversion = module_call(
            "add".to_string(),
            vec![BridgeValue::Int(2), BridgeValue::Str("x".to_string())],
        );
        assert_eq!(conversion.error_kind.as_deref(), Some("type_conversion"));
        assert!(conversion.message.contains("argument 1"));

        let unknown = module_call("sub".to_string(), vec![]);
        assert_eq!(unknown.error_kind.as_deref(), Some("unknown_export"));
    }

    #[test]
    fn module_call_resolves_names_like_module_describe() {
        loaded();
        assert!(module_describe(" add ".to_string()).is_some());

        let padded = module_call(
            " add ".to_string(),
            vec![BridgeValue::Int(2), BridgeValue::Int(3)],
        );
        assert!(padded.ok, "{}", padded.message);
        assert_eq!(padded.value, Some(BridgeValue::Int(5)));

        let blank = module_call("  ".to_string(), vec![]);
        assert_eq!(blank.error_kind.as_deref(), Some("unknown_export"));
    }

    #[test]
    fn exports_are_introspectable() {
        loaded();
        let exports = module_exports();
        assert_eq!(exports.len(), 1);
        let add = module_describe(" add ".to_string()).expect("add is described");
        assert_eq!(add.description, "A function that adds two numbers");
        assert_eq!(add.signature, "add(i32, i32) -> i32");
        assert_eq!(add.arity, 2);
        assert!(module_describe("sub".to_string()).is_none());
    }

    #[test]
    fn bridge_values_mirror_host_values() {
        let bridge = BridgeValue::List(vec![
            BridgeValue::None,
            BridgeValue::Bool(false),
            BridgeValue::Float(0.5),
        ]);
        let host = HostValue::from(bridge.clone());
        assert_eq!(host.type_name(), "list");
        assert_eq!(BridgeValue::from(host), bridge);
    }
}
