//! Compatibility shim: mapping-based ray queries for dynamic-only callers.
//!
//! Adapts the typed fast-path contract into the tagged-value contract. The
//! cost of dynamic typing - decoding the parameter mapping, allocating the
//! result mapping - is paid exactly once, here at the boundary, and never
//! inside the fast path.
//!
//! On no-hit the shim returns an **empty mapping**. That is a deliberate
//! compatibility concession to legacy callers that test for emptiness, not
//! a design ideal; typed callers get a proper `Option`.

use hotcall_core::{CallError, ConversionError, Handle, TaggedValue, ValueMap};

use crate::query::{CollisionMask, RayHit, RayQuery, SpaceQuery};

/// Parameter mapping keys.
const KEY_ORIGIN: &str = "origin";
const KEY_DIRECTION: &str = "direction";
const KEY_MAX_DISTANCE: &str = "max_distance";
const KEY_COLLISION_MASK: &str = "collision_mask";
const KEY_EXCLUDE: &str = "exclude";

/// Result mapping keys.
const KEY_POSITION: &str = "position";
const KEY_NORMAL: &str = "normal";
const KEY_HANDLE: &str = "handle";
const KEY_SHAPE_INDEX: &str = "shape_index";

fn require<'a>(
    params: &'a ValueMap,
    name: &'static str,
) -> Result<&'a TaggedValue, ConversionError> {
    params.get(name).ok_or(ConversionError::MissingField { name })
}

/// Encode a hit into the legacy result mapping shape.
pub(crate) fn encode_hit(hit: &RayHit) -> ValueMap {
    let mut out = ValueMap::default();
    out.insert(KEY_POSITION.to_owned(), TaggedValue::Vector2(hit.position));
    out.insert(KEY_NORMAL.to_owned(), TaggedValue::Vector2(hit.normal));
    out.insert(KEY_HANDLE.to_owned(), TaggedValue::Handle(hit.handle));
    out.insert(
        KEY_SHAPE_INDEX.to_owned(),
        TaggedValue::Int(hit.shape_index as i64),
    );
    out
}

/// Decode a result mapping back into a hit.
pub(crate) fn decode_hit(map: &ValueMap) -> Result<RayHit, ConversionError> {
    Ok(RayHit {
        position: require(map, KEY_POSITION)?.as_vector2()?,
        normal: require(map, KEY_NORMAL)?.as_vector2()?,
        handle: require(map, KEY_HANDLE)?.as_handle()?,
        shape_index: require(map, KEY_SHAPE_INDEX)?.as_int()? as u32,
    })
}

/// Ray intersection for callers that only speak mappings.
///
/// Required keys: `origin` (vector2), `direction` (vector2),
/// `max_distance` (float). Optional: `collision_mask` (int, defaults to
/// all layers), `exclude` (sequence of handles, defaults to empty).
///
/// Returns the hit encoded as `position`/`normal`/`handle`/`shape_index`,
/// or an empty mapping on no-hit. Domain errors still propagate as errors;
/// only the hit/no-hit distinction is flattened for compatibility.
pub fn intersect_ray_dynamic(
    space: &SpaceQuery,
    params: &ValueMap,
) -> Result<ValueMap, CallError> {
    let origin = require(params, KEY_ORIGIN)?.as_vector2()?;
    let direction = require(params, KEY_DIRECTION)?.as_vector2()?;
    let max_distance = require(params, KEY_MAX_DISTANCE)?.as_float()? as f32;
    let collision_mask = match params.get(KEY_COLLISION_MASK) {
        Some(v) => CollisionMask::from_bits_retain(v.as_int()? as u32),
        None => CollisionMask::ALL,
    };
    let exclude: Vec<Handle> = match params.get(KEY_EXCLUDE) {
        Some(v) => v
            .as_sequence()?
            .iter()
            .map(TaggedValue::as_handle)
            .collect::<Result<_, _>>()?,
        None => Vec::new(),
    };

    let mut query = RayQuery::with_ray(origin, direction, max_distance);
    query.collision_mask = collision_mask;

    match space.intersect_ray(&mut query, &exclude)? {
        Some(hit) => Ok(encode_hit(&hit)),
        // Legacy contract: emptiness signals no-hit.
        None => Ok(ValueMap::default()),
    }
}
