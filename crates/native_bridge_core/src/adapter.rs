//! Per-call adapter between host runtime and native routines.
//!
//! # Responsibility
//! - Resolve the export, check arity, and drive one call frame through
//!   conversion in, invocation and conversion out.
//! - Keep native panics from unwinding into the host runtime.
//!
//! # Invariants
//! - Arity is checked before any argument conversion or native invocation.
//! - A frame lives for exactly one call; nothing is cached between calls.
//! - Stages only move forward; `Error` is terminal.

use crate::error::{BridgeError, BridgeResult, NativeError};
use crate::export::ExportTable;
use crate::marshal::ConversionError;
use crate::value::HostValue;
use log::{error, trace, warn};
use std::fmt::{Display, Formatter};
use std::panic::{catch_unwind, AssertUnwindSafe};

const MAX_PANIC_MESSAGE_CHARS: usize = 160;

/// Linear per-call state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CallStage {
    Received,
    ArityChecked,
    ArgsConverted,
    Invoked,
    ResultConverted,
    Returned,
    Error,
}

impl CallStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::ArityChecked => "arity_checked",
            Self::ArgsConverted => "args_converted",
            Self::Invoked => "invoked",
            Self::ResultConverted => "result_converted",
            Self::Returned => "returned",
            Self::Error => "error",
        }
    }
}

impl Display for CallStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ephemeral state of one invocation.
#[derive(Debug)]
pub struct CallFrame<'a> {
    export: &'a str,
    args: &'a [HostValue],
    stage: CallStage,
    last_completed: CallStage,
}

impl<'a> CallFrame<'a> {
    pub(crate) fn new(export: &'a str, args: &'a [HostValue]) -> Self {
        Self {
            export,
            args,
            stage: CallStage::Received,
            last_completed: CallStage::Received,
        }
    }

    pub fn export(&self) -> &'a str {
        self.export
    }

    /// Host arguments exactly as received.
    pub fn args(&self) -> &'a [HostValue] {
        self.args
    }

    pub fn stage(&self) -> CallStage {
        self.stage
    }

    /// Last stage reached before the frame failed (or the current stage).
    pub fn last_completed(&self) -> CallStage {
        self.last_completed
    }

    pub(crate) fn advance(&mut self, next: CallStage) {
        debug_assert!(self.stage != CallStage::Error && next > self.stage);
        self.stage = next;
        self.last_completed = next;
    }

    pub(crate) fn fail(&mut self, err: BridgeError) -> BridgeError {
        self.stage = CallStage::Error;
        err
    }

    pub(crate) fn conversion_failed(&mut self, err: ConversionError) -> BridgeError {
        let export = self.export.to_string();
        self.fail(BridgeError::TypeConversion { export, error: err })
    }

    /// Runs the native routine, mapping its failures and panics.
    pub(crate) fn invoke<R>(
        &mut self,
        f: impl FnOnce() -> Result<R, NativeError>,
    ) -> BridgeResult<R> {
        let message = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(output)) => return Ok(output),
            Ok(Err(err)) => err.message().to_string(),
            Err(payload) => format!("native routine panicked: {}", panic_message(payload.as_ref())),
        };
        let export = self.export.to_string();
        Err(self.fail(BridgeError::NativeComputation { export, message }))
    }
}

/// Executes one call against a loaded export table.
///
/// # Errors
/// - `UnknownExport` when `name` is not in the table.
/// - `ArityMismatch` when `args.len()` differs from the export arity.
/// - `TypeConversion` when an argument or the result cannot be converted.
/// - `NativeComputation` when the native routine fails or panics.
pub fn call(
    module: &str,
    table: &ExportTable,
    name: &str,
    args: &[HostValue],
) -> BridgeResult<HostValue> {
    let mut frame = CallFrame::new(name, args);
    let result = run(table, &mut frame);
    match &result {
        Ok(_) => trace!("event=call module={module} export={name} status=ok"),
        Err(err @ BridgeError::UnknownExport(_)) => {
            error!("{}", call_failed_event(module, &frame, err))
        }
        Err(err) => warn!("{}", call_failed_event(module, &frame, err)),
    }
    result
}

fn call_failed_event(module: &str, frame: &CallFrame<'_>, err: &BridgeError) -> String {
    format!(
        "event=call_failed module={module} export={} status=error kind={} stage={} error={err}",
        frame.export(),
        err.kind(),
        frame.last_completed()
    )
}

fn run(table: &ExportTable, frame: &mut CallFrame<'_>) -> BridgeResult<HostValue> {
    let Some(record) = table.get(frame.export()) else {
        return Err(frame.fail(BridgeError::UnknownExport(frame.export().to_string())));
    };

    let expected = record.arity();
    let actual = frame.args().len();
    if expected != actual {
        return Err(frame.fail(BridgeError::ArityMismatch {
            export: record.name().to_string(),
            expected,
            actual,
        }));
    }
    frame.advance(CallStage::ArityChecked);

    let value = (record.callable())(frame)?;
    frame.advance(CallStage::Returned);
    Ok(value)
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    let raw = if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    };

    let normalized = raw.replace(['\n', '\r'], " ");
    let mut truncated = normalized
        .chars()
        .take(MAX_PANIC_MESSAGE_CHARS)
        .collect::<String>();
    if normalized.chars().count() > MAX_PANIC_MESSAGE_CHARS {
        truncated.push_str("...");
    }
    truncated
}
