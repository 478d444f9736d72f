//! Unified error types for the binding layer.
//!
//! Errors form a closed set returned to the caller as values; nothing here
//! unwinds across the native boundary. The hierarchy mirrors the call
//! phases:
//!
//! ```text
//! CallError (per-call wrapper)
//! ├── ConversionError - tagged-value decode/narrowing failures
//! ├── HandleError     - stale handle use
//! └── NativeError     - domain failures reported by the native function
//! ```
//!
//! Programming errors (registry used before install, typed buffer of the
//! wrong type) are contract violations and panic instead of returning a
//! variant; tolerating them would hide exactly the binding-layer bugs this
//! design exists to prevent.

use thiserror::Error;

use crate::binding_id::BindingId;
use crate::handle::Handle;
use crate::native_fn::CallMode;
use crate::value::ValueKind;

/// Errors converting between Rust values and tagged values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The value holds a different kind than the one requested.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// An integer does not fit the requested narrower type.
    #[error("integer {value} does not fit in {target}")]
    IntegerOverflow { value: i64, target: &'static str },

    /// A required mapping field is absent.
    #[error("missing field '{name}'")]
    MissingField { name: &'static str },
}

/// Errors from the handle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HandleError {
    /// The handle refers to a native object that has been destroyed.
    #[error("stale handle {0:?}")]
    Stale(Handle),
}

/// Domain failures reported by the invoked native function.
///
/// These propagate verbatim to the caller; they are never reinterpreted as
/// a "no result" outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// The query was issued against an invalid world/space reference.
    #[error("invalid space reference")]
    InvalidSpace,

    /// Any other failure the native core chose to report.
    #[error("native call failed: {0}")]
    Failed(String),
}

/// Per-call errors surfaced by the dispatcher and the query APIs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// No binding registered under this id.
    #[error("unknown binding {0}")]
    UnknownBinding(BindingId),

    /// The binding does not carry a callable for the requested mode.
    #[error("binding {id} does not support {mode:?} dispatch")]
    ModeUnsupported { id: BindingId, mode: CallMode },

    /// Wrong number of arguments on the dynamic path.
    #[error("arity mismatch: expected {expected} arguments, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// An argument's kind does not match the signature.
    #[error("argument {index}: expected {expected:?}, got {actual:?}")]
    ArgumentType {
        index: usize,
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A value failed to decode into the expected representation.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// A handle crossed the boundary after its native object died.
    #[error(transparent)]
    Handle(#[from] HandleError),

    /// The native function itself failed.
    #[error(transparent)]
    Native(#[from] NativeError),
}
