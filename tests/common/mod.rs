//! Shared test fixture: a circle-field stand-in for the engine's
//! collision solver, consumed by the binding layer as an opaque query
//! function.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use glam::Vec2;
use hotcall::{
    BindingId, CollisionMask, Dispatcher, Handle, HandleTable, NativeError, NativeId, RayHit,
    RegistryBuilder, SpaceQuery, register_ray_query,
};

pub struct Circle {
    pub center: Vec2,
    pub radius: f32,
    pub layers: CollisionMask,
    pub handle: Handle,
    pub shape_index: u32,
}

pub struct CircleSpace {
    pub circles: Vec<Circle>,
    pub valid: bool,
}

impl CircleSpace {
    pub fn cast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: CollisionMask,
        exclude: &[Handle],
    ) -> Result<Option<RayHit>, NativeError> {
        if !self.valid {
            return Err(NativeError::InvalidSpace);
        }
        let mut best: Option<(f32, RayHit)> = None;
        for circle in &self.circles {
            if !circle.layers.intersects(mask) || exclude.contains(&circle.handle) {
                continue;
            }
            let Some(t) = ray_circle(origin, direction, circle.center, circle.radius) else {
                continue;
            };
            if t > max_distance {
                continue;
            }
            if best.is_none_or(|(best_t, _)| t < best_t) {
                let position = origin + direction * t;
                let normal = (position - circle.center).normalize_or_zero();
                best = Some((
                    t,
                    RayHit {
                        position,
                        normal,
                        handle: circle.handle,
                        shape_index: circle.shape_index,
                    },
                ));
            }
        }
        Ok(best.map(|(_, hit)| hit))
    }
}

/// Nearest non-negative ray parameter hitting the circle, if any.
fn ray_circle(origin: Vec2, direction: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let a = direction.length_squared();
    let b = 2.0 * oc.dot(direction);
    let c = oc.length_squared() - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }
    let t = (-b - discriminant.sqrt()) / (2.0 * a);
    (t >= 0.0).then_some(t)
}

/// The world used by the scenario tests: one circle at (5, 0) with
/// radius 1 on layer 0, one at (5, 5) on layer 1.
pub fn circle_world() -> (CircleSpace, Vec<Handle>) {
    let table = HandleTable::new();
    let on_ray = table.bind(NativeId(0x1000));
    let off_ray = table.bind(NativeId(0x2000));
    let space = CircleSpace {
        circles: vec![
            Circle {
                center: Vec2::new(5.0, 0.0),
                radius: 1.0,
                layers: CollisionMask::layer(0),
                handle: on_ray,
                shape_index: 0,
            },
            Circle {
                center: Vec2::new(5.0, 5.0),
                radius: 1.0,
                layers: CollisionMask::layer(1),
                handle: off_ray,
                shape_index: 1,
            },
        ],
        valid: true,
    };
    (space, vec![on_ray, off_ray])
}

/// Register the space's cast as the ray binding and build the typed
/// surface over it.
pub fn bind_space(space: CircleSpace) -> (Dispatcher, SpaceQuery, BindingId) {
    let space = Arc::new(space);
    let mut builder = RegistryBuilder::new();
    let id = register_ray_query(
        &mut builder,
        "space/intersect_ray",
        move |origin, direction, max_distance, mask, exclude| {
            space.cast(origin, direction, max_distance, mask, exclude)
        },
    )
    .unwrap();
    let dispatcher = Dispatcher::new(builder.seal());
    let query = SpaceQuery::new(&dispatcher, id).unwrap();
    (dispatcher, query, id)
}

pub fn approx(a: Vec2, b: Vec2) -> bool {
    (a - b).length() < 1e-4
}
