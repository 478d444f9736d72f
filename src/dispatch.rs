//! Call dispatcher: resolves a binding id and invokes the callable.
//!
//! Two routes with identical observable results for the same logical call:
//!
//! - [`Dispatcher::invoke_dynamic`] validates arity and per-argument kind,
//!   then runs the dynamic callable - the route for callers without static
//!   struct support.
//! - [`Dispatcher::invoke_typed`] calls the typed callable directly against
//!   the caller's buffer - the mandatory route for hot paths.
//!
//! Hot callers should [`resolve`](Dispatcher::resolve) once and call
//! through the cached [`Binding`] so even the single map lookup leaves the
//! per-call cost.

use std::any::Any;
use std::sync::Arc;

use hotcall_core::{Binding, BindingId, CallError, TaggedValue};
use hotcall_registry::BindingRegistry;

/// Resolves bindings in a sealed registry and invokes them.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<BindingRegistry>,
}

impl Dispatcher {
    /// Wrap a sealed registry.
    pub fn new(registry: BindingRegistry) -> Self {
        Dispatcher {
            registry: Arc::new(registry),
        }
    }

    /// Wrap an already shared registry.
    pub fn from_shared(registry: Arc<BindingRegistry>) -> Self {
        Dispatcher { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    /// Resolve a binding id.
    pub fn resolve(&self, id: BindingId) -> Result<&Binding, CallError> {
        self.registry
            .lookup(id)
            .ok_or(CallError::UnknownBinding(id))
    }

    /// Dynamic call surface by name: hashes the name and dispatches
    /// dynamically.
    pub fn call(&self, name: &str, args: &[TaggedValue]) -> Result<TaggedValue, CallError> {
        self.invoke_dynamic(BindingId::from_name(name), args)
    }

    /// Invoke a binding through the dynamic path.
    pub fn invoke_dynamic(
        &self,
        id: BindingId,
        args: &[TaggedValue],
    ) -> Result<TaggedValue, CallError> {
        self.resolve(id)?.call_dynamic(args)
    }

    /// Invoke a binding through the typed path, writing results into the
    /// caller-owned buffer.
    pub fn invoke_typed(&self, id: BindingId, buffer: &mut dyn Any) -> Result<(), CallError> {
        self.resolve(id)?.call_typed(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotcall_core::{NativeError, NativeFn, Signature, ValueKind};
    use hotcall_registry::RegistryBuilder;

    struct ScaleBuffer {
        input: i64,
        factor: i64,
        output: i64,
    }

    fn scale_dispatcher() -> (Dispatcher, BindingId) {
        let mut builder = RegistryBuilder::new();
        let id = builder
            .register(
                "math/scale",
                Signature::new([ValueKind::Int, ValueKind::Int], ValueKind::Int),
                NativeFn::hybrid(
                    |args: &[TaggedValue]| {
                        let input = args[0].as_int().map_err(|e| NativeError::Failed(e.to_string()))?;
                        let factor = args[1].as_int().map_err(|e| NativeError::Failed(e.to_string()))?;
                        Ok(TaggedValue::Int(input * factor))
                    },
                    |buf: &mut ScaleBuffer| {
                        buf.output = buf.input * buf.factor;
                        Ok(())
                    },
                ),
            )
            .unwrap();
        (Dispatcher::new(builder.seal()), id)
    }

    #[test]
    fn dynamic_and_typed_agree() {
        let (dispatcher, id) = scale_dispatcher();

        let dynamic = dispatcher
            .invoke_dynamic(id, &[TaggedValue::Int(6), TaggedValue::Int(7)])
            .unwrap();

        let mut buffer = ScaleBuffer {
            input: 6,
            factor: 7,
            output: 0,
        };
        dispatcher.invoke_typed(id, &mut buffer).unwrap();

        assert_eq!(dynamic, TaggedValue::Int(buffer.output));
    }

    #[test]
    fn unknown_binding_is_an_error() {
        let (dispatcher, _) = scale_dispatcher();
        let missing = BindingId::from_name("math/missing");
        let err = dispatcher.invoke_dynamic(missing, &[]).unwrap_err();
        assert_eq!(err, CallError::UnknownBinding(missing));
    }

    #[test]
    fn call_by_name() {
        let (dispatcher, _) = scale_dispatcher();
        let out = dispatcher
            .call("math/scale", &[TaggedValue::Int(3), TaggedValue::Int(5)])
            .unwrap();
        assert_eq!(out, TaggedValue::Int(15));
    }

    #[test]
    fn argument_validation_happens_before_the_native_call() {
        let (dispatcher, id) = scale_dispatcher();
        let err = dispatcher
            .invoke_dynamic(id, &[TaggedValue::Bool(true), TaggedValue::Int(2)])
            .unwrap_err();
        assert_eq!(
            err,
            CallError::ArgumentType {
                index: 0,
                expected: ValueKind::Int,
                actual: ValueKind::Bool,
            }
        );
    }

    #[test]
    fn resolved_binding_can_be_cached() {
        let (dispatcher, id) = scale_dispatcher();
        let binding = dispatcher.resolve(id).unwrap().clone();
        for i in 0..4 {
            let out = binding
                .call_dynamic(&[TaggedValue::Int(i), TaggedValue::Int(2)])
                .unwrap();
            assert_eq!(out, TaggedValue::Int(i * 2));
        }
    }
}
