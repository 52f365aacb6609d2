//! Composition and caching behaviour of transforms

use glam::{Mat4, Quat, Vec3};
use pose_core::{PoseError, Transform};
use std::f32::consts::FRAC_PI_2;

fn translated(x: f32, y: f32, z: f32) -> Transform {
    let mut t = Transform::new();
    t.set_position(Vec3::new(x, y, z)).unwrap();
    t
}

fn scaled(s: f32) -> Transform {
    let mut t = Transform::new();
    t.set_scale(Vec3::splat(s)).unwrap();
    t
}

fn assert_matrix_eq(actual: Mat4, expected: Mat4) {
    assert!(
        actual.abs_diff_eq(expected, 1e-5),
        "matrices differ:\n{actual}\n{expected}"
    );
}

#[test]
fn test_default_is_identity_and_clean() {
    let t = Transform::new();
    assert!(!t.is_dirty());
    assert!(t.is_identity());
    assert_eq!(t.matrix(), Mat4::IDENTITY);
    assert_eq!(t.rebuild_count(), 0);
}

#[test]
fn test_one_rebuild_per_mutation() {
    let mut t = Transform::new();
    t.translate(Vec3::X).unwrap();
    assert!(t.is_dirty());
    assert_eq!(t.rebuild_count(), 0);

    for _ in 0..3 {
        t.matrix();
    }
    assert_eq!(t.rebuild_count(), 1);
    assert!(!t.is_dirty());

    t.set_rotation(FRAC_PI_2, Vec3::Z).unwrap();
    t.matrix();
    t.matrix();
    assert_eq!(t.rebuild_count(), 2);
}

#[test]
fn test_identity_compose_identity() {
    let a = Transform::new();
    let b = Transform::new();
    assert_matrix_eq(a.compose(&b).matrix(), Mat4::IDENTITY);
}

#[test]
fn test_translate_compose_identity_both_ways() {
    let t = translated(1.0, 2.0, 3.0);
    let identity = Transform::new();
    let expected = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));

    assert_matrix_eq(t.compose(&identity).matrix(), expected);
    assert_matrix_eq(identity.compose(&t).matrix(), expected);
}

#[test]
fn test_translate_compose_translate() {
    let t = translated(1.0, 2.0, 3.0);
    assert_matrix_eq(
        t.compose(&t).matrix(),
        Mat4::from_translation(Vec3::new(2.0, 4.0, 6.0)),
    );
}

#[test]
fn test_scale_compose_scale() {
    let s = scaled(2.0);
    assert_matrix_eq(s.compose(&s).matrix(), Mat4::from_scale(Vec3::splat(4.0)));
}

#[test]
fn test_rotations_with_scale_and_translation_both_orders() {
    let rot_x = Quat::from_rotation_x(FRAC_PI_2);
    let rot_y = Quat::from_rotation_y(-FRAC_PI_2);

    let mut a = Transform::new();
    a.set_position(Vec3::new(1.0, 2.0, 3.0))
        .unwrap()
        .set_rotation(FRAC_PI_2, Vec3::X)
        .unwrap()
        .set_scale(Vec3::new(1.0, 2.0, 3.0))
        .unwrap();

    let mut b = Transform::new();
    b.set_position(Vec3::new(-4.0, 0.5, 0.0))
        .unwrap()
        .set_rotation(-FRAC_PI_2, Vec3::Y)
        .unwrap()
        .set_scale(Vec3::splat(2.0))
        .unwrap();

    let translation = Mat4::from_translation(Vec3::new(-3.0, 2.5, 3.0));
    let scale = Mat4::from_scale(Vec3::new(2.0, 4.0, 6.0));

    let ab = translation * Mat4::from_quat(rot_x) * Mat4::from_quat(rot_y) * scale;
    assert_matrix_eq(a.compose(&b).matrix(), ab);

    let ba = translation * Mat4::from_quat(rot_y) * Mat4::from_quat(rot_x) * scale;
    assert_matrix_eq(b.compose(&a).matrix(), ba);
}

#[test]
fn test_compose_into_reuses_target() {
    let a = translated(1.0, 0.0, 0.0);
    let b = scaled(3.0);
    let mut target = translated(9.0, 9.0, 9.0);
    target.matrix();

    a.compose_into(&b, &mut target);
    assert!(target.is_dirty());
    assert_matrix_eq(
        target.matrix(),
        Mat4::from_translation(Vec3::X) * Mat4::from_scale(Vec3::splat(3.0)),
    );
}

#[test]
fn test_initial_pose_applied_before_components() {
    let mut t = Transform::with_initial_pose(
        Vec3::new(0.0, 1.0, 0.0),
        Quat::from_rotation_z(FRAC_PI_2),
        Vec3::splat(2.0),
    )
    .unwrap();
    t.set_position(Vec3::X).unwrap();

    // T(initial + position) · R(initial) · R(rotation) · S(scale · initial)
    let p = t.transform_point(Vec3::X);
    assert!(p.abs_diff_eq(Vec3::new(1.0, 3.0, 0.0), 1e-5), "{p}");
}

#[test]
fn test_negative_scale_rejected_and_state_kept() {
    let mut t = Transform::new();
    t.set_scale(Vec3::new(1.0, 2.0, 3.0)).unwrap();
    t.matrix();

    let err = t.set_scale(Vec3::new(1.0, -1.0, 1.0)).unwrap_err();
    assert!(matches!(err, PoseError::InvalidArgument(_)));
    assert_eq!(t.scale(), Vec3::new(1.0, 2.0, 3.0));
    assert!(!t.is_dirty());
}

#[test]
fn test_non_finite_input_rejected_before_mutation() {
    let mut t = translated(1.0, 1.0, 1.0);
    assert!(t.set_position(Vec3::new(f32::NAN, 0.0, 0.0)).is_err());
    assert!(t.set_rotation(1.0, Vec3::ZERO).is_err());
    assert!(
        t.apply_rotation(|_| Quat::from_xyzw(f32::INFINITY, 0.0, 0.0, 1.0))
            .is_err()
    );
    assert_eq!(t.position(), Vec3::ONE);
    assert_eq!(t.rotation(), Quat::IDENTITY);
}

#[test]
fn test_lerp_into() {
    let a = translated(0.0, 0.0, 0.0);
    let mut b = translated(10.0, 0.0, 0.0);
    b.set_rotation(FRAC_PI_2, Vec3::Y).unwrap();

    let mut target = Transform::new();
    a.lerp_into(&b, 0.5, &mut target);
    assert!(target.position().abs_diff_eq(Vec3::new(5.0, 0.0, 0.0), 1e-5));
    assert!(
        target
            .rotation()
            .abs_diff_eq(Quat::from_rotation_y(FRAC_PI_2 / 2.0), 1e-5)
    );
}

#[test]
fn test_set_copies_everything() {
    let mut source = translated(1.0, 2.0, 3.0);
    source.set_scale(Vec3::splat(0.5)).unwrap();

    let mut t = Transform::new();
    t.set(&source);
    assert_eq!(t, source);
    assert_eq!(t.matrix(), source.matrix());
}
