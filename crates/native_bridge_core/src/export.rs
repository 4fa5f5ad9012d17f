//! Export table and module registrar.
//!
//! # Responsibility
//! - Turn typed native closures into type-erased export records.
//! - Build the export table exactly once per module load.
//! - Expose read-only introspection metadata for host help tooling.
//!
//! # Invariants
//! - Export names are unique within one module; duplicates fail the load.
//! - Each record has fixed arity and fixed parameter/return types.
//! - The table is immutable once `ModuleRegistrar::finish` returns.

use crate::adapter::{self, CallFrame, CallStage};
use crate::error::{BridgeError, BridgeResult, NativeError};
use crate::marshal::{ConversionSite, FromHost, IntoHost, NativeType};
use crate::value::HostValue;
use log::{debug, error, info};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

static HOST_IDENTIFIER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("host identifier pattern is valid")
});

/// Type-erased native entry point.
///
/// Runs conversion in, invocation, and conversion out for an arity-checked
/// frame, advancing the frame stage as it goes.
pub type NativeFn =
    Arc<dyn Fn(&mut CallFrame<'_>) -> BridgeResult<HostValue> + Send + Sync + 'static>;

/// Native closures that can be exported to the host runtime.
///
/// `Args` is the tuple of native argument types; it only disambiguates
/// implementations for different arities.
pub trait IntoNativeFn<Args>: Send + Sync + 'static {
    fn param_types() -> Vec<NativeType>;
    fn return_type() -> NativeType;
    fn into_native_fn(self) -> NativeFn;
}

macro_rules! impl_into_native_fn {
    ($(($arg:ident, $index:tt)),*) => {
        impl<F, R, $($arg,)*> IntoNativeFn<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> Result<R, NativeError> + Send + Sync + 'static,
            R: IntoHost,
            $($arg: FromHost,)*
        {
            fn param_types() -> Vec<NativeType> {
                vec![$(<$arg as FromHost>::native_type()),*]
            }

            fn return_type() -> NativeType {
                <R as IntoHost>::native_type()
            }

            #[allow(non_snake_case, unused_variables)]
            fn into_native_fn(self) -> NativeFn {
                Arc::new(move |frame: &mut CallFrame<'_>| {
                    let args = frame.args();
                    $(
                        let $arg = <$arg as FromHost>::from_host(&args[$index])
                            .map_err(|err| frame.conversion_failed(err.at(ConversionSite::Argument($index))))?;
                    )*
                    frame.advance(CallStage::ArgsConverted);

                    let output = frame.invoke(|| (self)($($arg),*))?;
                    frame.advance(CallStage::Invoked);

                    let value = output
                        .into_host()
                        .map_err(|err| frame.conversion_failed(err.at(ConversionSite::ReturnValue)))?;
                    frame.advance(CallStage::ResultConverted);
                    Ok(value)
                })
            }
        }
    };
}

impl_into_native_fn!();
impl_into_native_fn!((A0, 0));
impl_into_native_fn!((A0, 0), (A1, 1));
impl_into_native_fn!((A0, 0), (A1, 1), (A2, 2));
impl_into_native_fn!((A0, 0), (A1, 1), (A2, 2), (A3, 3));
impl_into_native_fn!((A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4));
impl_into_native_fn!((A0, 0), (A1, 1), (A2, 2), (A3, 3), (A4, 4), (A5, 5));

/// One registrar input entry: `exported_name -> (native_function, description)`.
pub struct ExportDecl {
    pub name: String,
    pub description: String,
    params: Vec<NativeType>,
    returns: NativeType,
    callable: NativeFn,
}

impl ExportDecl {
    pub fn new<Args, F>(name: impl Into<String>, description: impl Into<String>, f: F) -> Self
    where
        F: IntoNativeFn<Args>,
    {
        Self {
            name: name.into(),
            description: description.into(),
            params: F::param_types(),
            returns: F::return_type(),
            callable: f.into_native_fn(),
        }
    }
}

impl Debug for ExportDecl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportDecl")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .finish_non_exhaustive()
    }
}

/// Registered export: native callable plus its fixed signature metadata.
pub struct ExportRecord {
    name: String,
    description: Option<String>,
    params: Vec<NativeType>,
    returns: NativeType,
    callable: NativeFn,
}

impl ExportRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn params(&self) -> &[NativeType] {
        &self.params
    }

    pub fn returns(&self) -> &NativeType {
        &self.returns
    }

    /// Signature hint, e.g. `add(i32, i32) -> i32`.
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params}) -> {}", self.name, self.returns)
    }

    pub fn info(&self) -> ExportInfo {
        ExportInfo {
            name: self.name.clone(),
            description: self.description.clone(),
            params: self.params.iter().map(ToString::to_string).collect(),
            returns: self.returns.to_string(),
            signature: self.signature(),
            arity: self.arity(),
        }
    }

    pub(crate) fn callable(&self) -> &NativeFn {
        &self.callable
    }
}

impl Debug for ExportRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportRecord")
            .field("signature", &self.signature())
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Introspection snapshot of one export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportInfo {
    pub name: String,
    pub description: Option<String>,
    pub params: Vec<String>,
    pub returns: String,
    pub signature: String,
    pub arity: usize,
}

/// Read-only mapping from exported name to export record.
#[derive(Debug, Default)]
pub struct ExportTable {
    entries: BTreeMap<String, ExportRecord>,
}

impl ExportTable {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ExportRecord> {
        self.entries.get(name)
    }

    /// Export names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExportRecord> {
        self.entries.values()
    }
}

/// Loaded module: its name and the export table published to the host.
#[derive(Debug, Clone)]
pub struct ModuleHandle {
    name: String,
    table: Arc<ExportTable>,
}

impl ModuleHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self) -> &ExportTable {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.table.contains(name)
    }

    /// Calls one export with host arguments.
    pub fn call(&self, name: &str, args: &[HostValue]) -> BridgeResult<HostValue> {
        adapter::call(&self.name, &self.table, name, args)
    }

    /// Returns introspection metadata for one export.
    pub fn describe(&self, name: &str) -> Option<ExportInfo> {
        self.table.get(name).map(ExportRecord::info)
    }

    /// Returns introspection metadata for all exports, sorted by name.
    pub fn exports(&self) -> Vec<ExportInfo> {
        self.table.iter().map(ExportRecord::info).collect()
    }
}

/// Builds the export table for one module load.
#[derive(Debug)]
pub struct ModuleRegistrar {
    module_name: String,
    table: ExportTable,
}

impl ModuleRegistrar {
    pub fn new(module_name: impl Into<String>) -> BridgeResult<Self> {
        let module_name = module_name.into();
        if !is_host_identifier(&module_name) {
            return Err(BridgeError::InvalidModuleName(module_name));
        }
        Ok(Self {
            module_name,
            table: ExportTable::default(),
        })
    }

    /// Registers one typed native function under `name`.
    pub fn export<Args, F>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        f: F,
    ) -> BridgeResult<&mut Self>
    where
        F: IntoNativeFn<Args>,
    {
        self.declare(ExportDecl::new(name, description, f))
    }

    /// Registers one prepared declaration.
    pub fn declare(&mut self, decl: ExportDecl) -> BridgeResult<&mut Self> {
        if !is_host_identifier(&decl.name) {
            return Err(BridgeError::InvalidExportName(decl.name));
        }
        if self.table.contains(&decl.name) {
            return Err(BridgeError::DuplicateExport(decl.name));
        }

        let description = Some(decl.description.trim().to_string()).filter(|d| !d.is_empty());
        let record = ExportRecord {
            name: decl.name.clone(),
            description,
            params: decl.params,
            returns: decl.returns,
            callable: decl.callable,
        };
        debug!(
            "event=export_registered module={} status=ok signature={}",
            self.module_name,
            record.signature()
        );
        self.table.entries.insert(decl.name, record);
        Ok(self)
    }

    /// Completes the load and freezes the table.
    pub fn finish(self) -> ModuleHandle {
        info!(
            "event=module_load module={} status=ok exports={}",
            self.module_name,
            self.table.len()
        );
        ModuleHandle {
            name: self.module_name,
            table: Arc::new(self.table),
        }
    }
}

/// One-shot load: registers every declaration or fails the whole load.
pub fn load_module(
    module_name: impl Into<String>,
    decls: impl IntoIterator<Item = ExportDecl>,
) -> BridgeResult<ModuleHandle> {
    let mut registrar = ModuleRegistrar::new(module_name)?;
    for decl in decls {
        if let Err(err) = registrar.declare(decl) {
            error!(
                "event=module_load module={} status=error kind={} error={}",
                registrar.module_name,
                err.kind(),
                err
            );
            return Err(err);
        }
    }
    Ok(registrar.finish())
}

fn is_host_identifier(value: &str) -> bool {
    HOST_IDENTIFIER.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{is_host_identifier, load_module, ExportDecl, ModuleRegistrar};
    use crate::error::{BridgeError, NativeError};

    fn add(a: i32, b: i32) -> Result<i32, NativeError> {
        a.checked_add(b).ok_or_else(|| NativeError::overflow("add"))
    }

    #[test]
    fn records_signature_and_description() {
        let mut registrar = ModuleRegistrar::new("demo").expect("valid module name");
        registrar
            .export("add", "Adds two numbers", add)
            .expect("add registers");
        let module = registrar.finish();

        let info = module.describe("add").expect("add is exported");
        assert_eq!(info.signature, "add(i32, i32) -> i32");
        assert_eq!(info.description.as_deref(), Some("Adds two numbers"));
        assert_eq!(info.arity, 2);
    }

    #[test]
    fn blank_description_is_stored_as_none() {
        let module = load_module(
            "demo",
            [ExportDecl::new("nothing", "  ", || Ok::<_, NativeError>(()))],
        )
        .expect("load");
        let record = module.table().get("nothing").expect("record");
        assert_eq!(record.description(), None);
        assert_eq!(record.signature(), "nothing() -> unit");
    }

    #[test]
    fn rejects_duplicate_export_name() {
        let mut registrar = ModuleRegistrar::new("demo").expect("valid module name");
        registrar.export("add", "first", add).expect("first add");
        let err = registrar
            .export("add", "second", add)
            .expect_err("duplicate add must fail");
        assert_eq!(err, BridgeError::DuplicateExport("add".to_string()));
    }

    #[test]
    fn rejects_non_identifier_names() {
        assert!(matches!(
            ModuleRegistrar::new("my module"),
            Err(BridgeError::InvalidModuleName(_))
        ));
        let mut registrar = ModuleRegistrar::new("demo").expect("valid module name");
        let err = registrar
            .export("2add", "bad", add)
            .expect_err("leading digit must fail");
        assert!(matches!(err, BridgeError::InvalidExportName(_)));
    }

    #[test]
    fn host_identifier_rules() {
        assert!(is_host_identifier("add"));
        assert!(is_host_identifier("_private_2"));
        assert!(!is_host_identifier(""));
        assert!(!is_host_identifier("a-b"));
        assert!(!is_host_identifier("add "));
    }
}
