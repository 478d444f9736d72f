//! Core types for the hotcall binding layer.
//!
//! Leaf crate of the workspace: tagged values and their conversion traits,
//! deterministic binding identity, native function records and signatures,
//! opaque handles and the cross-boundary handle table, and the unified
//! error types. Higher layers (`hotcall-registry`, `hotcall`) build the
//! catalog and the dispatch surfaces on top of these.

mod binding_id;
mod convert;
mod error;
mod handle;
mod native_fn;
mod value;

pub use binding_id::BindingId;
pub use convert::{FromValue, IntoValue};
pub use error::{CallError, ConversionError, HandleError, NativeError};
pub use handle::{Handle, HandleTable, NativeId, WrapperId};
pub use native_fn::{Binding, CallMode, DynamicFn, NativeFn, Signature, TypedFn};
pub use value::{TaggedValue, ValueKind, ValueMap};
