//! Deterministic hash-based binding identity.
//!
//! This module provides [`BindingId`], a 64-bit hash that uniquely identifies
//! a registered native function. Unlike sequential ids, hashes are computed
//! deterministically from the binding name, enabling:
//!
//! - Forward references (id computed before registration)
//! - No registration order dependencies
//! - Same name = same id on every run and in every process
//! - Single map lookups (no secondary name→id map on the call path)
//!
//! # Examples
//!
//! ```
//! use hotcall_core::BindingId;
//!
//! let id = BindingId::from_name("space/intersect_ray");
//! assert_eq!(id, BindingId::from_name("space/intersect_ray"));
//! assert_ne!(id, BindingId::from_name("space/intersect_point"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-mixing constant folded into every binding hash.
///
/// Keeps binding ids from colliding with hashes of the same name computed
/// for other entity domains (types, wrapper identities).
const BINDING_DOMAIN: u64 = 0x6f24a5d19c38e07b;

/// A deterministic 64-bit hash identifying a registered binding.
///
/// Computed from the binding's stable name. The same name always produces
/// the same id, so callers may precompute ids as constants.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct BindingId(pub u64);

impl BindingId {
    /// Empty/invalid id constant.
    pub const EMPTY: BindingId = BindingId(0);

    /// Create a binding id from a stable name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        BindingId(BINDING_DOMAIN ^ xxh64(name.as_bytes(), 0))
    }

    /// Raw hash value.
    #[inline]
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BindingId({:#018x})", self.0)
    }
}

impl fmt::Display for BindingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
