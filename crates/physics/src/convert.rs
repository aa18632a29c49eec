//! glam (f64) <-> nalgebra (rapier `Real`) conversions.

use glam::{DQuat, DVec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

pub fn to_vector(v: DVec3) -> Vector<Real> {
    vector![v.x as Real, v.y as Real, v.z as Real]
}

pub fn to_point(v: DVec3) -> Point<Real> {
    point![v.x as Real, v.y as Real, v.z as Real]
}

pub fn from_vector(v: &Vector<Real>) -> DVec3 {
    DVec3::new(v.x as f64, v.y as f64, v.z as f64)
}

pub fn to_rotation(q: DQuat) -> Rotation<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(
        q.w as Real,
        q.x as Real,
        q.y as Real,
        q.z as Real,
    ))
}

pub fn from_rotation(r: &Rotation<Real>) -> DQuat {
    DQuat::from_xyzw(r.i as f64, r.j as f64, r.k as f64, r.w as f64).normalize()
}
