//! Fast-path spatial query surface: typed, allocation-free ray
//! intersection.
//!
//! The caller owns a reusable [`RayQuery`] buffer - the typed call buffer
//! for the ray binding. Arguments are raw fields, the result is written
//! inline, and the exclude set is a borrowed view over caller memory, so a
//! query issued thousands of times per frame performs zero heap
//! allocations after the buffer exists. Tagged values and the handle table
//! never appear on this path.
//!
//! The native query function itself is an external collaborator: the
//! engine supplies a closure to [`register_ray_query`], which wires it
//! into the registry as a hybrid binding (typed fast path plus a dynamic
//! adapter for tagged-value callers).

use std::sync::Arc;

use bitflags::bitflags;
use glam::Vec2;

use hotcall_core::{
    Binding, BindingId, CallError, CallMode, ConversionError, Handle, NativeError, NativeFn,
    Signature, TaggedValue, ValueKind,
};
use hotcall_registry::{RegistryBuilder, RegistryError};

use crate::config;
use crate::dispatch::Dispatcher;
use crate::shim;

bitflags! {
    /// Collision layer mask. A query only considers shapes whose layer
    /// bits intersect the mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionMask: u32 {
        /// Every layer.
        const ALL = u32::MAX;
    }
}

impl CollisionMask {
    /// Mask selecting a single layer (0..=31).
    pub fn layer(n: u8) -> Self {
        debug_assert!(n < 32);
        CollisionMask::from_bits_retain(1 << n)
    }
}

impl Default for CollisionMask {
    fn default() -> Self {
        CollisionMask::ALL
    }
}

/// Result of a successful ray intersection.
///
/// Fixed struct, returned by value; the query never heap-allocates it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Point of intersection.
    pub position: Vec2,
    /// Surface normal at the intersection point.
    pub normal: Vec2,
    /// Handle of the intersected object.
    pub handle: Handle,
    /// Index of the intersected shape within the object.
    pub shape_index: u32,
}

impl Default for RayHit {
    fn default() -> Self {
        RayHit {
            position: Vec2::ZERO,
            normal: Vec2::ZERO,
            handle: Handle::NULL,
            shape_index: 0,
        }
    }
}

/// Caller-owned typed call buffer for ray queries.
///
/// Reusable across calls; reuse is structural, not an opt-in optimization.
/// The buffer is stack- or pool-allocated by the caller, holds raw
/// argument fields and inline result storage, and never escapes the call
/// that fills it. One buffer per thread; the buffer is deliberately not
/// `Send`.
#[derive(Debug)]
pub struct RayQuery {
    /// Ray start point.
    pub origin: Vec2,
    /// Ray direction (unit length expected by the native core).
    pub direction: Vec2,
    /// Maximum distance along the ray.
    pub max_distance: f32,
    /// Layers to consider.
    pub collision_mask: CollisionMask,
    // Borrowed view over the caller's exclude set. Set immediately before
    // the typed call and cleared before intersect_ray returns, so outside
    // that window it is always the empty slice.
    exclude_ptr: *const Handle,
    exclude_len: usize,
    hit: bool,
    result: RayHit,
}

impl RayQuery {
    /// An empty query buffer.
    pub fn new() -> Self {
        RayQuery {
            origin: Vec2::ZERO,
            direction: Vec2::X,
            max_distance: 0.0,
            collision_mask: CollisionMask::ALL,
            exclude_ptr: std::ptr::null(),
            exclude_len: 0,
            hit: false,
            result: RayHit::default(),
        }
    }

    /// A buffer with the ray already filled in.
    pub fn with_ray(origin: Vec2, direction: Vec2, max_distance: f32) -> Self {
        let mut query = RayQuery::new();
        query.set_ray(origin, direction, max_distance);
        query
    }

    /// Fill in the ray arguments, keeping the buffer otherwise intact.
    pub fn set_ray(&mut self, origin: Vec2, direction: Vec2, max_distance: f32) {
        self.origin = origin;
        self.direction = direction;
        self.max_distance = max_distance;
    }

    /// The exclude set for the in-flight call.
    ///
    /// Outside a call this is always the empty slice. The common empty
    /// case is a zero-length view; no container is ever constructed.
    pub fn exclude(&self) -> &[Handle] {
        if self.exclude_len == 0 {
            &[]
        } else {
            // In-flight view installed by intersect_ray; the backing slice
            // outlives the dispatch it was installed for.
            unsafe { std::slice::from_raw_parts(self.exclude_ptr, self.exclude_len) }
        }
    }

    /// The hit recorded by the last call, if any.
    pub fn hit(&self) -> Option<&RayHit> {
        self.hit.then_some(&self.result)
    }

    /// Record a hit. Called by the native query function.
    pub fn write_hit(&mut self, hit: RayHit) {
        self.hit = true;
        self.result = hit;
    }

    /// Record a miss. Called by the native query function.
    pub fn write_miss(&mut self) {
        self.hit = false;
        self.result = RayHit::default();
    }

    fn set_exclude(&mut self, exclude: &[Handle]) {
        self.exclude_ptr = exclude.as_ptr();
        self.exclude_len = exclude.len();
    }

    fn clear_exclude(&mut self) {
        self.exclude_ptr = std::ptr::null();
        self.exclude_len = 0;
    }
}

impl Default for RayQuery {
    fn default() -> Self {
        RayQuery::new()
    }
}

/// Calling signature of the ray binding's dynamic adapter.
pub fn ray_signature() -> Signature {
    Signature::new(
        [
            ValueKind::Vector2,  // origin
            ValueKind::Vector2,  // direction
            ValueKind::Float,    // max_distance
            ValueKind::Int,      // collision_mask
            ValueKind::Sequence, // exclude
        ],
        ValueKind::Mapping,
    )
}

/// Register an engine ray query function as a hybrid binding.
///
/// The engine-supplied closure receives the raw arguments and the borrowed
/// exclude view, and reports a hit, a miss, or a domain error (an invalid
/// space reference is an error, never a miss).
///
/// The typed callable writes straight into the caller's [`RayQuery`]
/// buffer; the dynamic adapter pays the tag/untag cost so tagged-value
/// callers never reach into the fast path.
pub fn register_ray_query<F>(
    builder: &mut RegistryBuilder,
    name: &str,
    query_fn: F,
) -> Result<BindingId, RegistryError>
where
    F: Fn(Vec2, Vec2, f32, CollisionMask, &[Handle]) -> Result<Option<RayHit>, NativeError>
        + Send
        + Sync
        + 'static,
{
    let query_fn = Arc::new(query_fn);

    let typed_fn = {
        let query_fn = Arc::clone(&query_fn);
        move |buf: &mut RayQuery| {
            let outcome = query_fn(
                buf.origin,
                buf.direction,
                buf.max_distance,
                buf.collision_mask,
                buf.exclude(),
            )?;
            match outcome {
                Some(hit) => buf.write_hit(hit),
                None => buf.write_miss(),
            }
            Ok(())
        }
    };

    let dynamic_fn = move |args: &[TaggedValue]| -> Result<TaggedValue, NativeError> {
        // Arity and top-level kinds are validated by the dispatcher;
        // element kinds inside the exclude sequence are checked here.
        let decode = |e: ConversionError| NativeError::Failed(e.to_string());
        let origin = args[0].as_vector2().map_err(decode)?;
        let direction = args[1].as_vector2().map_err(decode)?;
        let max_distance = args[2].as_float().map_err(decode)? as f32;
        let mask = CollisionMask::from_bits_retain(args[3].as_int().map_err(decode)? as u32);
        let exclude: Vec<Handle> = args[4]
            .as_sequence()
            .map_err(decode)?
            .iter()
            .map(|v| v.as_handle())
            .collect::<Result<_, _>>()
            .map_err(decode)?;

        match query_fn(origin, direction, max_distance, mask, &exclude)? {
            Some(hit) => Ok(TaggedValue::Mapping(Box::new(shim::encode_hit(&hit)))),
            None => Ok(TaggedValue::Nil),
        }
    };

    builder.register(
        name,
        ray_signature(),
        NativeFn::hybrid(dynamic_fn, typed_fn),
    )
}

/// Typed query surface over one ray binding.
///
/// Resolves the binding once at construction; per-call work is a direct
/// call through the cached function pointer.
#[derive(Clone, Debug)]
pub struct SpaceQuery {
    binding: Binding,
}

impl SpaceQuery {
    /// Resolve and cache the ray binding.
    ///
    /// Fails if the id is unknown or the binding has no typed callable.
    pub fn new(dispatcher: &Dispatcher, id: BindingId) -> Result<Self, CallError> {
        let binding = dispatcher.resolve(id)?.clone();
        if !binding.supports(CallMode::Typed) {
            return Err(CallError::ModeUnsupported {
                id,
                mode: CallMode::Typed,
            });
        }
        Ok(SpaceQuery { binding })
    }

    /// The cached binding.
    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    /// Cast a ray, writing the outcome into the reusable buffer.
    ///
    /// `Ok(None)` is the normal no-hit outcome. Domain failures reported by
    /// the native core (e.g. an invalid space reference) propagate as
    /// errors and never degrade to a miss.
    ///
    /// With the fast path enabled (the default) this performs no heap
    /// allocation and no tagging. When `enable_fast_path` is off the call
    /// detours through the dynamic adapter for diagnostic comparison,
    /// paying the full tag/untag cost.
    pub fn intersect_ray(
        &self,
        query: &mut RayQuery,
        exclude: &[Handle],
    ) -> Result<Option<RayHit>, CallError> {
        if config::fast_path_enabled() {
            query.set_exclude(exclude);
            let outcome = self.binding.call_typed(query);
            query.clear_exclude();
            outcome?;
            Ok(query.hit().copied())
        } else {
            self.intersect_ray_via_dynamic(query, exclude)
        }
    }

    // Diagnostic route: same logical call, tagged-value representation.
    fn intersect_ray_via_dynamic(
        &self,
        query: &mut RayQuery,
        exclude: &[Handle],
    ) -> Result<Option<RayHit>, CallError> {
        let args = [
            TaggedValue::Vector2(query.origin),
            TaggedValue::Vector2(query.direction),
            TaggedValue::Float(query.max_distance as f64),
            TaggedValue::Int(query.collision_mask.bits() as i64),
            TaggedValue::Sequence(exclude.iter().copied().map(TaggedValue::Handle).collect()),
        ];
        match self.binding.call_dynamic(&args)? {
            TaggedValue::Nil => {
                query.write_miss();
                Ok(None)
            }
            TaggedValue::Mapping(map) => {
                let hit = shim::decode_hit(&map)?;
                query.write_hit(hit);
                Ok(Some(hit))
            }
            other => Err(ConversionError::TypeMismatch {
                expected: "mapping",
                actual: other.type_name(),
            }
            .into()),
        }
    }
}
