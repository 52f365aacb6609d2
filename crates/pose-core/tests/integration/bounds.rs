//! Bounding-box overlap and world re-derivation

use glam::{Mat4, Quat, Vec3};
use pose_core::bounds::{BoundingBox, compute_local_bounds, overlaps_with, world_bounds};
use test_case::test_case;

fn unit_box_at(offset: Vec3) -> BoundingBox {
    BoundingBox::new(offset, offset + Vec3::ONE).unwrap()
}

#[test_case(Vec3::new(1.0, 0.0, 0.0) ; "shared x face")]
#[test_case(Vec3::new(0.0, -1.0, 0.0) ; "shared y face")]
#[test_case(Vec3::new(0.0, 0.0, 1.0) ; "shared z face")]
#[test_case(Vec3::new(1.0, 1.0, 1.0) ; "shared corner")]
fn test_touching_boxes_do_not_overlap(offset: Vec3) {
    let a = unit_box_at(Vec3::ZERO);
    let b = unit_box_at(offset);
    assert!(!overlaps_with(&a, &b));
    assert!(!overlaps_with(&b, &a));
}

#[test_case(Vec3::new(0.5, 0.5, 0.5) ; "diagonal")]
#[test_case(Vec3::new(0.0, 0.0, 0.0) ; "identical")]
#[test_case(Vec3::new(-0.9, 0.1, -0.2) ; "mostly apart")]
fn test_intersecting_boxes_overlap(offset: Vec3) {
    let a = unit_box_at(Vec3::ZERO);
    let b = unit_box_at(offset);
    assert!(overlaps_with(&a, &b));
    assert_eq!(overlaps_with(&a, &b), overlaps_with(&b, &a));
}

#[test]
fn test_world_bounds_under_rotation() {
    let local = compute_local_bounds(&[Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0)]).unwrap();
    let world = Mat4::from_rotation_translation(
        Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
        Vec3::new(10.0, 0.0, 0.0),
    );

    let placed = world_bounds(&local, &world);
    assert!(placed.min().abs_diff_eq(Vec3::new(8.0, -1.0, -3.0), 1e-5));
    assert!(placed.max().abs_diff_eq(Vec3::new(12.0, 1.0, 3.0), 1e-5));

    // The local box is a value; deriving world bounds never changes it
    assert_eq!(local.min(), Vec3::new(-1.0, -2.0, -3.0));
    assert_eq!(local.center(), Vec3::ZERO);
    assert_eq!(local.size(), Vec3::new(2.0, 4.0, 6.0));
}

#[test]
fn test_empty_vertices_rejected() {
    assert!(compute_local_bounds(&[]).is_err());
}
