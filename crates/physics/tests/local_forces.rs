use crimescene_common::{
    BodyId, PhysicsBackend, PhysicsError, Pose, apply_local_force, apply_local_force_at_origin,
};
use crimescene_physics::{BodyDesc, FIXED_TIMESTEP, RapierWorld, Shape};
use glam::{DQuat, DVec3};

/// A 1 kg box yawed a quarter turn, floating without gravity.
fn turned_box(world: &mut RapierWorld) -> BodyId {
    world
        .add_body(BodyDesc::dynamic(
            Pose::new(
                DVec3::new(0.0, 2.0, 0.0),
                DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2),
            ),
            Shape::Cuboid {
                half_extents: DVec3::splat(0.5),
            },
            1.0,
        ))
        .unwrap()
}

#[test]
fn local_force_follows_body_orientation() {
    let mut world = RapierWorld::new(DVec3::ZERO);
    let body = turned_box(&mut world);

    // Local +X is world -Z after a quarter turn about Y.
    apply_local_force_at_origin(&mut world, body, DVec3::new(60.0, 0.0, 0.0)).unwrap();
    world.step(FIXED_TIMESTEP, &mut []);

    let v = world.linear_velocity(body).unwrap();
    assert!((v.z + 1.0).abs() < 1e-3, "v = {v}");
    assert!(v.x.abs() < 1e-3 && v.y.abs() < 1e-3, "v = {v}");
}

#[test]
fn off_centre_local_force_spins_the_body() {
    let mut world = RapierWorld::new(DVec3::ZERO);
    let body = turned_box(&mut world);

    apply_local_force(
        &mut world,
        body,
        DVec3::new(60.0, 0.0, 0.0),
        DVec3::new(0.0, 0.0, 0.5),
    )
    .unwrap();
    world.step(FIXED_TIMESTEP, &mut []);

    let w = world.angular_velocity(body).unwrap();
    assert!(w.y.abs() > 0.1, "w = {w}");
}

#[test]
fn local_force_on_missing_body_is_reported() {
    let mut world = RapierWorld::new(DVec3::ZERO);
    let ghost = BodyId::from_parts(42, 0);
    assert_eq!(
        apply_local_force_at_origin(&mut world, ghost, DVec3::X),
        Err(PhysicsError::UnknownBody(ghost))
    );
}
