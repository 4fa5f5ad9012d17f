//! Boundary error taxonomy and host-facing translation.
//!
//! # Responsibility
//! - Define the closed set of failure kinds that may reach the host runtime.
//! - Translate internal failures into `HostError` right before returning to
//!   the host.
//!
//! # Invariants
//! - Every `BridgeError` maps to exactly one `BridgeErrorKind`.
//! - Kind codes are stable strings; host code may branch on them.
//! - Load-time kinds abort module load and are never seen at call time.

use crate::marshal::ConversionError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type BridgeResult<T> = Result<T, BridgeError>;

/// Stable code for `BridgeErrorKind::DuplicateExport`.
pub const ERROR_KIND_DUPLICATE_EXPORT: &str = "duplicate_export";
/// Stable code for `BridgeErrorKind::InvalidExportName`.
pub const ERROR_KIND_INVALID_EXPORT_NAME: &str = "invalid_export_name";
/// Stable code for `BridgeErrorKind::InvalidModuleName`.
pub const ERROR_KIND_INVALID_MODULE_NAME: &str = "invalid_module_name";
/// Stable code for `BridgeErrorKind::UnknownExport`.
pub const ERROR_KIND_UNKNOWN_EXPORT: &str = "unknown_export";
/// Stable code for `BridgeErrorKind::ArityMismatch`.
pub const ERROR_KIND_ARITY_MISMATCH: &str = "arity_mismatch";
/// Stable code for `BridgeErrorKind::TypeConversion`.
pub const ERROR_KIND_TYPE_CONVERSION: &str = "type_conversion";
/// Stable code for `BridgeErrorKind::NativeComputation`.
pub const ERROR_KIND_NATIVE_COMPUTATION: &str = "native_computation";

/// Closed error-kind enumeration surfaced to the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeErrorKind {
    DuplicateExport,
    InvalidExportName,
    InvalidModuleName,
    UnknownExport,
    ArityMismatch,
    TypeConversion,
    NativeComputation,
}

impl BridgeErrorKind {
    /// Stable string code for host-side branching.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DuplicateExport => ERROR_KIND_DUPLICATE_EXPORT,
            Self::InvalidExportName => ERROR_KIND_INVALID_EXPORT_NAME,
            Self::InvalidModuleName => ERROR_KIND_INVALID_MODULE_NAME,
            Self::UnknownExport => ERROR_KIND_UNKNOWN_EXPORT,
            Self::ArityMismatch => ERROR_KIND_ARITY_MISMATCH,
            Self::TypeConversion => ERROR_KIND_TYPE_CONVERSION,
            Self::NativeComputation => ERROR_KIND_NATIVE_COMPUTATION,
        }
    }

    /// Whether this kind can only occur while the module is loading.
    pub fn is_load_time(self) -> bool {
        matches!(
            self,
            Self::DuplicateExport | Self::InvalidExportName | Self::InvalidModuleName
        )
    }
}

impl Display for BridgeErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure reported by a native routine for its own precondition violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    message: String,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Arithmetic overflow in operation `op`.
    pub fn overflow(op: &str) -> Self {
        Self::new(format!("integer overflow in `{op}`"))
    }

    /// Violated input precondition.
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(format!("precondition violated: {}", message.into()))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for NativeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for NativeError {}

/// Internal boundary error raised by the registrar or call adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum BridgeError {
    DuplicateExport(String),
    InvalidExportName(String),
    InvalidModuleName(String),
    UnknownExport(String),
    ArityMismatch {
        export: String,
        expected: usize,
        actual: usize,
    },
    TypeConversion {
        export: String,
        error: ConversionError,
    },
    NativeComputation {
        export: String,
        message: String,
    },
}

impl BridgeError {
    pub fn kind(&self) -> BridgeErrorKind {
        match self {
            Self::DuplicateExport(_) => BridgeErrorKind::DuplicateExport,
            Self::InvalidExportName(_) => BridgeErrorKind::InvalidExportName,
            Self::InvalidModuleName(_) => BridgeErrorKind::InvalidModuleName,
            Self::UnknownExport(_) => BridgeErrorKind::UnknownExport,
            Self::ArityMismatch { .. } => BridgeErrorKind::ArityMismatch,
            Self::TypeConversion { .. } => BridgeErrorKind::TypeConversion,
            Self::NativeComputation { .. } => BridgeErrorKind::NativeComputation,
        }
    }

    /// Translates this failure into the host-visible error envelope.
    pub fn to_host_error(&self) -> HostError {
        HostError {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

impl Display for BridgeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateExport(name) => write!(f, "export already registered: {name}"),
            Self::InvalidExportName(name) => write!(f, "export name is invalid: {name:?}"),
            Self::InvalidModuleName(name) => write!(f, "module name is invalid: {name:?}"),
            Self::UnknownExport(name) => write!(f, "unknown export: {name}"),
            Self::ArityMismatch {
                export,
                expected,
                actual,
            } => write!(
                f,
                "{export}() argument count mismatch: expected {expected}, got {actual}"
            ),
            Self::TypeConversion { export, error } => write!(f, "{export}(): {error}"),
            Self::NativeComputation { export, message } => {
                write!(f, "{export}() failed: {message}")
            }
        }
    }
}

impl Error for BridgeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::TypeConversion { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Host-visible error object: a stable kind plus a descriptive message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostError {
    pub kind: BridgeErrorKind,
    pub message: String,
}

impl Display for HostError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Error for HostError {}

impl From<BridgeError> for HostError {
    fn from(value: BridgeError) -> Self {
        value.to_host_error()
    }
}

#[cfg(test)]
mod tests {
    use super::{BridgeError, BridgeErrorKind, NativeError};
    use crate::marshal::{ConversionError, ConversionSite};
    use std::error::Error;

    #[test]
    fn kind_codes_are_stable() {
        assert_eq!(BridgeErrorKind::DuplicateExport.as_str(), "duplicate_export");
        assert_eq!(BridgeErrorKind::UnknownExport.as_str(), "unknown_export");
        assert_eq!(BridgeErrorKind::ArityMismatch.as_str(), "arity_mismatch");
        assert_eq!(BridgeErrorKind::TypeConversion.as_str(), "type_conversion");
        assert_eq!(
            BridgeErrorKind::NativeComputation.as_str(),
            "native_computation"
        );
    }

    #[test]
    fn classifies_load_time_kinds() {
        assert!(BridgeErrorKind::DuplicateExport.is_load_time());
        assert!(BridgeErrorKind::InvalidExportName.is_load_time());
        assert!(!BridgeErrorKind::ArityMismatch.is_load_time());
        assert!(!BridgeErrorKind::UnknownExport.is_load_time());
    }

    #[test]
    fn arity_message_names_expected_and_actual() {
        let err = BridgeError::ArityMismatch {
            export: "add".to_string(),
            expected: 2,
            actual: 1,
        };
        let host = err.to_host_error();
        assert_eq!(host.kind, BridgeErrorKind::ArityMismatch);
        assert!(host.message.contains("expected 2, got 1"));
    }

    #[test]
    fn conversion_error_is_exposed_as_source() {
        let err = BridgeError::TypeConversion {
            export: "add".to_string(),
            error: ConversionError::new("str", "i32").at(ConversionSite::Argument(1)),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("argument 1"));
    }

    #[test]
    fn native_error_helpers_format_messages() {
        assert!(NativeError::overflow("add").message().contains("overflow"));
        assert!(NativeError::precondition("b != 0")
            .to_string()
            .starts_with("precondition violated"));
    }
}
