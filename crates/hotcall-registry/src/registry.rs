//! Method binding registry: build, seal, then read concurrently.
//!
//! Registration and dispatch are distinct phases. A [`RegistryBuilder`] is
//! populated single-threaded during startup; [`RegistryBuilder::seal`]
//! converts it into an immutable [`BindingRegistry`] that is `Send + Sync`
//! and safe for unsynchronized concurrent lookup. The one-way transition
//! replaces the lock-per-lookup pattern: after sealing there is nothing
//! left to synchronize.
//!
//! For embedders that want a process-wide catalog, [`install`] publishes a
//! sealed registry into a `OnceLock`; [`global`] before `install` is a
//! programming error and panics.

use std::sync::OnceLock;

use rustc_hash::FxHashMap;
use thiserror::Error;

use hotcall_core::{Binding, BindingId, NativeFn, Signature};

/// Errors raised during the registration phase.
///
/// These are fatal at startup; none of them can occur at call time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// A binding with this id is already registered.
    #[error("duplicate binding '{name}' ({id})")]
    DuplicateBinding { name: String, id: BindingId },

    /// A process-wide registry has already been installed.
    #[error("a binding registry is already installed")]
    AlreadyInstalled,
}

/// Mutable, append-only catalog used during the registration phase.
#[derive(Default)]
pub struct RegistryBuilder {
    bindings: FxHashMap<BindingId, Binding>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native function under a stable name.
    ///
    /// Fails with [`RegistryError::DuplicateBinding`] if the derived id is
    /// already taken.
    pub fn register(
        &mut self,
        name: &str,
        signature: Signature,
        func: NativeFn,
    ) -> Result<BindingId, RegistryError> {
        self.register_binding(Binding::new(name, signature, func))
    }

    /// Register a pre-built binding record.
    pub fn register_binding(&mut self, binding: Binding) -> Result<BindingId, RegistryError> {
        let id = binding.id();
        if let Some(existing) = self.bindings.get(&id) {
            return Err(RegistryError::DuplicateBinding {
                name: existing.name().to_owned(),
                id,
            });
        }
        self.bindings.insert(id, binding);
        Ok(id)
    }

    /// Number of bindings registered so far.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the builder is empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Seal the catalog.
    ///
    /// One-way: the returned registry is immutable and lock-free for
    /// readers. Nothing can be added afterwards.
    pub fn seal(self) -> BindingRegistry {
        log::debug!("binding registry sealed with {} bindings", self.bindings.len());
        BindingRegistry {
            bindings: self.bindings,
        }
    }
}

/// Immutable, process-lifetime catalog of callable native functions.
///
/// Safe for unsynchronized concurrent lookup; there is no interior
/// mutability left after sealing.
#[derive(Debug)]
pub struct BindingRegistry {
    bindings: FxHashMap<BindingId, Binding>,
}

impl BindingRegistry {
    /// Look up a binding by id.
    pub fn lookup(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    /// Look up a binding by name (hashes, then delegates to [`lookup`]).
    ///
    /// [`lookup`]: BindingRegistry::lookup
    pub fn lookup_name(&self, name: &str) -> Option<&Binding> {
        self.lookup(BindingId::from_name(name))
    }

    /// Number of registered bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Iterate over all bindings, for diagnostics and tooling.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }
}

static GLOBAL: OnceLock<BindingRegistry> = OnceLock::new();

/// Install a sealed registry as the process-wide catalog.
///
/// May be called once; a second install fails with
/// [`RegistryError::AlreadyInstalled`].
pub fn install(registry: BindingRegistry) -> Result<(), RegistryError> {
    GLOBAL
        .set(registry)
        .map_err(|_| RegistryError::AlreadyInstalled)
}

/// The process-wide catalog.
///
/// # Panics
///
/// Panics if called before [`install`]. Looking up bindings before
/// registration completes is a programming error, not a recoverable
/// condition.
pub fn global() -> &'static BindingRegistry {
    match GLOBAL.get() {
        Some(registry) => registry,
        None => panic!("binding registry used before install"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotcall_core::{NativeError, TaggedValue, ValueKind};

    fn noop() -> NativeFn {
        NativeFn::dynamic(|_| Ok(TaggedValue::Nil))
    }

    fn unit_signature() -> Signature {
        Signature::new([], ValueKind::Nil)
    }

    #[test]
    fn register_and_lookup() {
        let mut builder = RegistryBuilder::new();
        let id = builder
            .register("space/intersect_ray", unit_signature(), noop())
            .unwrap();
        let registry = builder.seal();

        let binding = registry.lookup(id).unwrap();
        assert_eq!(binding.name(), "space/intersect_ray");
        assert_eq!(registry.lookup_name("space/intersect_ray").unwrap().id(), id);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut builder = RegistryBuilder::new();
        builder.register("dup", unit_signature(), noop()).unwrap();
        let err = builder.register("dup", unit_signature(), noop()).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateBinding { ref name, .. } if name == "dup"));
        // The first registration survives.
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn unknown_lookup_is_none() {
        let registry = RegistryBuilder::new().seal();
        assert!(registry.lookup(BindingId::from_name("nope")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn sealed_registry_is_shareable() {
        fn assert_sync<T: Send + Sync>() {}
        assert_sync::<BindingRegistry>();
    }

    #[test]
    fn sealed_registry_reads_from_threads() {
        let mut builder = RegistryBuilder::new();
        let id = builder.register("threaded", unit_signature(), noop()).unwrap();
        let registry = std::sync::Arc::new(builder.seal());

        let joins: Vec<_> = (0..4)
            .map(|_| {
                let registry = std::sync::Arc::clone(&registry);
                std::thread::spawn(move || registry.lookup(id).is_some())
            })
            .collect();
        assert!(joins.into_iter().all(|j| j.join().unwrap()));
    }

    #[test]
    fn global_install_is_once() {
        let mut builder = RegistryBuilder::new();
        builder.register("global/one", unit_signature(), noop()).unwrap();
        install(builder.seal()).unwrap();

        assert!(global().lookup_name("global/one").is_some());
        assert_eq!(install(RegistryBuilder::new().seal()), Err(RegistryError::AlreadyInstalled));
    }

    #[test]
    fn bindings_can_still_be_called_after_seal() {
        let mut builder = RegistryBuilder::new();
        let id = builder
            .register(
                "echo",
                Signature::new([ValueKind::Int], ValueKind::Int),
                NativeFn::dynamic(|args| {
                    args[0]
                        .as_int()
                        .map(TaggedValue::Int)
                        .map_err(|e| NativeError::Failed(e.to_string()))
                }),
            )
            .unwrap();
        let registry = builder.seal();
        let out = registry
            .lookup(id)
            .unwrap()
            .call_dynamic(&[TaggedValue::Int(11)])
            .unwrap();
        assert_eq!(out, TaggedValue::Int(11));
    }
}
