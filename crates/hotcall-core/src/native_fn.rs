//! Native function storage and binding records.
//!
//! A [`Binding`] is the immutable description of one callable native
//! function: stable id, name, calling [`Signature`], and the callable(s)
//! behind it. Callables come in two dispatch modes:
//!
//! - **dynamic** - arguments arrive as tagged values, the result leaves as
//!   one; every cost of dynamic typing (tagging, validation, allocation)
//!   is paid here and only here.
//! - **typed** - the caller supplies a fixed-layout, caller-owned buffer;
//!   the function reads and writes it directly with no encoding step and
//!   no allocation. This is the mandatory mode for any caller able to
//!   declare a fixed layout.
//!
//! A binding registered with both callables ("hybrid") must produce
//! identical observable results in both modes; they differ only in
//! representation and cost.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::binding_id::BindingId;
use crate::error::{CallError, NativeError};
use crate::value::{TaggedValue, ValueKind};

/// Dispatch mode of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallMode {
    /// Tagged-value arguments and result.
    Dynamic,
    /// Raw caller-owned buffer, no marshalling.
    Typed,
}

/// Dynamic callable: tagged values in, tagged value out.
pub type DynamicFn =
    Arc<dyn Fn(&[TaggedValue]) -> Result<TaggedValue, NativeError> + Send + Sync>;

/// Typed callable: operates directly on the caller's buffer.
///
/// The buffer arrives type-erased; the callable downcasts it to the
/// concrete buffer type it was registered for. Receiving a different
/// buffer type is a wiring bug on the registering side and panics.
pub type TypedFn = Arc<dyn Fn(&mut dyn Any) -> Result<(), NativeError> + Send + Sync>;

/// Calling signature: per-argument kinds and the result kind.
///
/// Used to validate dynamic calls before the native function runs; the
/// typed path trusts its buffer layout and never consults the signature
/// per call.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ValueKind>,
    result: ValueKind,
}

impl Signature {
    /// Build a signature from parameter kinds and a result kind.
    pub fn new(params: impl Into<Vec<ValueKind>>, result: ValueKind) -> Self {
        Signature {
            params: params.into(),
            result,
        }
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Parameter kinds in call order.
    pub fn params(&self) -> &[ValueKind] {
        &self.params
    }

    /// Declared result kind.
    pub fn result(&self) -> ValueKind {
        self.result
    }

    /// Validate dynamic arguments: arity first, then per-position kind.
    ///
    /// On mismatch the error names the offending position and the expected
    /// kind.
    pub fn validate(&self, args: &[TaggedValue]) -> Result<(), CallError> {
        if args.len() != self.params.len() {
            return Err(CallError::ArityMismatch {
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        for (index, (arg, &expected)) in args.iter().zip(&self.params).enumerate() {
            let actual = arg.kind();
            if actual != expected {
                return Err(CallError::ArgumentType {
                    index,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", p)?;
        }
        write!(f, ") -> {}", self.result)
    }
}

/// Type-erased native function, in one or both dispatch modes.
///
/// The callables are wrapped in `Arc` so bindings stay cheap to clone into
/// hot-path callers that cache them.
#[derive(Clone)]
pub struct NativeFn {
    dynamic: Option<DynamicFn>,
    typed: Option<TypedFn>,
}

impl NativeFn {
    /// A dynamic-only callable.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&[TaggedValue]) -> Result<TaggedValue, NativeError> + Send + Sync + 'static,
    {
        NativeFn {
            dynamic: Some(Arc::new(f)),
            typed: None,
        }
    }

    /// A typed-only callable operating on buffers of type `B`.
    pub fn typed<B, F>(f: F) -> Self
    where
        B: Any,
        F: Fn(&mut B) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        NativeFn {
            dynamic: None,
            typed: Some(Self::erase_typed(f)),
        }
    }

    /// A hybrid callable supporting both modes.
    pub fn hybrid<B, D, T>(dynamic: D, typed: T) -> Self
    where
        B: Any,
        D: Fn(&[TaggedValue]) -> Result<TaggedValue, NativeError> + Send + Sync + 'static,
        T: Fn(&mut B) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        NativeFn {
            dynamic: Some(Arc::new(dynamic)),
            typed: Some(Self::erase_typed(typed)),
        }
    }

    fn erase_typed<B, F>(f: F) -> TypedFn
    where
        B: Any,
        F: Fn(&mut B) -> Result<(), NativeError> + Send + Sync + 'static,
    {
        Arc::new(move |buffer: &mut dyn Any| {
            let Some(buffer) = buffer.downcast_mut::<B>() else {
                // Contract violation between registration and call site.
                panic!(
                    "typed call buffer mismatch: expected {}",
                    std::any::type_name::<B>()
                );
            };
            f(buffer)
        })
    }

    /// Whether this function supports the given mode.
    pub fn supports(&self, mode: CallMode) -> bool {
        match mode {
            CallMode::Dynamic => self.dynamic.is_some(),
            CallMode::Typed => self.typed.is_some(),
        }
    }

    pub(crate) fn dynamic_fn(&self) -> Option<&DynamicFn> {
        self.dynamic.as_ref()
    }

    pub(crate) fn typed_fn(&self) -> Option<&TypedFn> {
        self.typed.as_ref()
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("dynamic", &self.dynamic.is_some())
            .field("typed", &self.typed.is_some())
            .finish()
    }
}

/// Immutable record of a registered callable native function.
#[derive(Clone, Debug)]
pub struct Binding {
    id: BindingId,
    name: Arc<str>,
    signature: Signature,
    func: NativeFn,
}

impl Binding {
    /// Build a binding record. The id is derived from the name.
    pub fn new(name: &str, signature: Signature, func: NativeFn) -> Self {
        Binding {
            id: BindingId::from_name(name),
            name: Arc::from(name),
            signature,
            func,
        }
    }

    /// Stable binding id.
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calling signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Whether this binding supports the given mode.
    pub fn supports(&self, mode: CallMode) -> bool {
        self.func.supports(mode)
    }

    /// Invoke through the dynamic path: validate arity and kinds, decode,
    /// call, re-encode.
    pub fn call_dynamic(&self, args: &[TaggedValue]) -> Result<TaggedValue, CallError> {
        let Some(f) = self.func.dynamic_fn() else {
            return Err(CallError::ModeUnsupported {
                id: self.id,
                mode: CallMode::Dynamic,
            });
        };
        self.signature.validate(args)?;
        f(args).map_err(CallError::from)
    }

    /// Invoke through the typed path: call the function pointer directly
    /// against the caller's buffer.
    ///
    /// No encoding, no allocation, no unwinding scaffolding; the `&mut`
    /// borrow already guarantees a valid non-null buffer.
    pub fn call_typed(&self, buffer: &mut dyn Any) -> Result<(), CallError> {
        let Some(f) = self.func.typed_fn() else {
            return Err(CallError::ModeUnsupported {
                id: self.id,
                mode: CallMode::Typed,
            });
        };
        f(buffer).map_err(CallError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add_signature() -> Signature {
        Signature::new([ValueKind::Int, ValueKind::Int], ValueKind::Int)
    }

    fn add_binding() -> Binding {
        Binding::new(
            "math/add",
            add_signature(),
            NativeFn::dynamic(|args| {
                let a = args[0].as_int().map_err(|e| NativeError::Failed(e.to_string()))?;
                let b = args[1].as_int().map_err(|e| NativeError::Failed(e.to_string()))?;
                Ok(TaggedValue::Int(a + b))
            }),
        )
    }

    #[test]
    fn dynamic_call_roundtrip() {
        let binding = add_binding();
        let out = binding
            .call_dynamic(&[TaggedValue::Int(10), TaggedValue::Int(20)])
            .unwrap();
        assert_eq!(out, TaggedValue::Int(30));
    }

    #[test]
    fn arity_is_checked_before_kinds() {
        let binding = add_binding();
        let err = binding.call_dynamic(&[TaggedValue::Int(1)]).unwrap_err();
        assert_eq!(
            err,
            CallError::ArityMismatch {
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn kind_mismatch_names_position() {
        let binding = add_binding();
        let err = binding
            .call_dynamic(&[TaggedValue::Int(1), TaggedValue::Bool(true)])
            .unwrap_err();
        assert_eq!(
            err,
            CallError::ArgumentType {
                index: 1,
                expected: ValueKind::Int,
                actual: ValueKind::Bool,
            }
        );
    }

    #[test]
    fn typed_call_writes_into_buffer() {
        struct AddBuffer {
            a: i64,
            b: i64,
            sum: i64,
        }
        let binding = Binding::new(
            "math/add",
            add_signature(),
            NativeFn::typed(|buf: &mut AddBuffer| {
                buf.sum = buf.a + buf.b;
                Ok(())
            }),
        );
        let mut buf = AddBuffer { a: 4, b: 5, sum: 0 };
        binding.call_typed(&mut buf).unwrap();
        assert_eq!(buf.sum, 9);
    }

    #[test]
    fn missing_mode_is_reported() {
        let binding = add_binding();
        struct Empty;
        let mut buf = Empty;
        let err = binding.call_typed(&mut buf).unwrap_err();
        assert!(matches!(
            err,
            CallError::ModeUnsupported {
                mode: CallMode::Typed,
                ..
            }
        ));
    }

    #[test]
    #[should_panic(expected = "typed call buffer mismatch")]
    fn wrong_buffer_type_panics() {
        let binding = Binding::new(
            "math/neg",
            Signature::new([ValueKind::Int], ValueKind::Int),
            NativeFn::typed(|buf: &mut i64| {
                *buf = -*buf;
                Ok(())
            }),
        );
        let mut wrong = String::new();
        let _ = binding.call_typed(&mut wrong);
    }

    #[test]
    fn native_domain_error_propagates() {
        let binding = Binding::new(
            "space/query",
            Signature::new([], ValueKind::Nil),
            NativeFn::dynamic(|_| Err(NativeError::InvalidSpace)),
        );
        let err = binding.call_dynamic(&[]).unwrap_err();
        assert_eq!(err, CallError::Native(NativeError::InvalidSpace));
    }

    #[test]
    fn signature_debug_lists_kinds() {
        let sig = add_signature();
        assert_eq!(format!("{:?}", sig), "(int, int) -> int");
    }
}
