//! hotcall - binding dispatch and value-marshalling for native engine
//! cores.
//!
//! A same-process boundary layer that lets a scripting or managed runtime
//! invoke functions implemented in a native core. Two call routes share
//! one catalog:
//!
//! - **Dynamic**: arguments and results cross as [`TaggedValue`]s, with
//!   arity and kind validation up front. For callers whose language has no
//!   static struct concept; every cost of dynamic typing is confined to
//!   this route.
//! - **Typed**: the caller owns a reusable fixed-layout buffer and the
//!   native function reads and writes it directly. Zero allocation, zero
//!   tagging; the mandatory route for hot paths such as per-frame ray
//!   queries.
//!
//! # Example
//!
//! ```
//! use glam::Vec2;
//! use hotcall::{
//!     Dispatcher, RayQuery, SpaceQuery, register_ray_query, RegistryBuilder,
//! };
//!
//! let mut builder = RegistryBuilder::new();
//! let id = register_ray_query(&mut builder, "space/intersect_ray", |origin, _, max, _, _| {
//!     // Stand-in for the engine's collision solver: a wall at x = 5.
//!     let t = 5.0 - origin.x;
//!     if t >= 0.0 && t <= max {
//!         Ok(Some(hotcall::RayHit {
//!             position: Vec2::new(5.0, origin.y),
//!             normal: Vec2::new(-1.0, 0.0),
//!             handle: hotcall::Handle::new(0, 0),
//!             shape_index: 0,
//!         }))
//!     } else {
//!         Ok(None)
//!     }
//! })
//! .unwrap();
//!
//! let dispatcher = Dispatcher::new(builder.seal());
//! let space = SpaceQuery::new(&dispatcher, id).unwrap();
//!
//! let mut query = RayQuery::with_ray(Vec2::ZERO, Vec2::X, 10.0);
//! let hit = space.intersect_ray(&mut query, &[]).unwrap().unwrap();
//! assert_eq!(hit.position, Vec2::new(5.0, 0.0));
//! ```

pub mod config;
mod dispatch;
mod query;
mod shim;

pub use dispatch::Dispatcher;
pub use query::{
    CollisionMask, RayHit, RayQuery, SpaceQuery, ray_signature, register_ray_query,
};
pub use shim::intersect_ray_dynamic;

pub use hotcall_core::{
    Binding, BindingId, CallError, CallMode, ConversionError, DynamicFn, FromValue, Handle,
    HandleError, HandleTable, IntoValue, NativeError, NativeFn, NativeId, Signature, TaggedValue,
    TypedFn, ValueKind, ValueMap, WrapperId,
};
pub use hotcall_registry::{BindingRegistry, RegistryBuilder, RegistryError, global, install};
