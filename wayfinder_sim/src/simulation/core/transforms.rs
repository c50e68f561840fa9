// wayfinder_sim/src/simulation/core/transforms.rs

//! The AR session space and Bevy share the same convention (Y up, -Z forward,
//! right-handed), so conversion is a narrowing from f64 to f32 and a re-pack of
//! the quaternion.

use bevy::prelude::{Quat as BevyQuat, Transform as BevyTransform, Vec3 as BevyVec3};
use nalgebra::{Isometry3, Point3, Similarity3, Translation3, UnitQuaternion, Vector3};

use wayfinder_core::types::Ray;

pub fn vector_to_bevy(v: &Vector3<f64>) -> BevyVec3 {
    BevyVec3::new(v.x as f32, v.y as f32, v.z as f32)
}

pub fn point_to_bevy(p: &Point3<f64>) -> BevyVec3 {
    vector_to_bevy(&p.coords)
}

pub fn quat_to_bevy(q: &UnitQuaternion<f64>) -> BevyQuat {
    BevyQuat::from_xyzw(q.i as f32, q.j as f32, q.k as f32, q.w as f32)
}

/// A scene-graph world transform as a Bevy `Transform` with uniform scale.
pub fn similarity_to_bevy_transform(world: &Similarity3<f64>) -> BevyTransform {
    let iso = &world.isometry;
    BevyTransform {
        translation: vector_to_bevy(&iso.translation.vector),
        rotation: quat_to_bevy(&iso.rotation),
        scale: BevyVec3::splat(world.scaling() as f32),
    }
}

/// Builds a controller pose that looks from `origin` along `direction`.
/// Returns `None` for a zero direction.
pub fn pose_looking_along(origin: [f64; 3], direction: [f64; 3]) -> Option<Isometry3<f64>> {
    let ray = Ray::new(Point3::from(origin), Vector3::from(direction))?;
    // The controller's forward axis is -Z.
    let rotation = UnitQuaternion::rotation_between(&-Vector3::z(), &ray.direction)
        .unwrap_or_else(|| UnitQuaternion::from_axis_angle(&Vector3::y_axis(), std::f64::consts::PI));
    Some(Isometry3::from_parts(
        Translation3::from(ray.origin.coords),
        rotation,
    ))
}
