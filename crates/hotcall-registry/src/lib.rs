//! Binding registry for the hotcall layer.
//!
//! Append-only during startup, sealed into an immutable catalog for the
//! rest of the process lifetime. See [`registry`] for the phase contract.

mod registry;

pub use registry::{BindingRegistry, RegistryBuilder, RegistryError, global, install};
