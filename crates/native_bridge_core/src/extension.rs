//! Built-in `custom_extension` module.
//!
//! The exported computation is a placeholder; the module exists to exercise
//! the registrar and call adapter end to end.

use crate::error::{BridgeResult, NativeError};
use crate::export::{load_module, ExportDecl, ModuleHandle};

/// Module name used when no override is configured.
pub const DEFAULT_MODULE_NAME: &str = "custom_extension";

/// Description published for the `add` export.
pub const ADD_DESCRIPTION: &str = "A function that adds two numbers";

/// Adds two `i32` values, reporting overflow instead of wrapping.
pub fn add(a: i32, b: i32) -> Result<i32, NativeError> {
    a.checked_add(b).ok_or_else(|| NativeError::overflow("add"))
}

/// Export declarations of the built-in module.
pub fn custom_extension_exports() -> Vec<ExportDecl> {
    vec![ExportDecl::new("add", ADD_DESCRIPTION, add)]
}

/// Loads the built-in module under `module_name`.
pub fn load_custom_extension(module_name: &str) -> BridgeResult<ModuleHandle> {
    load_module(module_name, custom_extension_exports())
}
