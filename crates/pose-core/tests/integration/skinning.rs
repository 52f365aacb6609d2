//! End-to-end skinning: skeleton + clip + mesh weights

use glam::{Mat4, Quat, Vec3};
use pose_core::animation::{AnimationClip, BoneChannel, KeyBehaviour};
use pose_core::skeleton::{Bone, NodeData, Skeleton, SkinningOptions, VertexSkinWeights};
use pose_core::{Mesh, ModelInstance, PlaybackOptions, PoseEvaluator};
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

/// Two-segment tentacle standing on +Y, with the root moved to (0,0,10)
fn tentacle() -> Arc<Skeleton> {
    let root = NodeData::new("root", Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)))
        .with_child(
            NodeData::new("base", Mat4::IDENTITY)
                .with_child(NodeData::new("tip", Mat4::from_translation(Vec3::Y)))
                .with_mesh(0),
        );
    let bones = vec![
        Bone::new("base", Mat4::IDENTITY),
        Bone::new("tip", Mat4::from_translation(Vec3::NEG_Y)),
    ];
    Arc::new(Skeleton::new(root, bones).unwrap())
}

fn tentacle_mesh() -> Arc<Mesh> {
    let positions = vec![
        Vec3::ZERO,
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 2.0, 0.0),
    ];
    let weights = vec![
        VertexSkinWeights::single(0),
        VertexSkinWeights::from_influences(&[(0, 0.5), (1, 0.5)]).unwrap(),
        VertexSkinWeights::single(1),
    ];
    Arc::new(Mesh::new("tentacle", positions, weights).unwrap())
}

fn bend(skeleton: &Skeleton) -> pose_core::BoundClip {
    let channel = BoneChannel::new("tip")
        .with_position_key(0.0, Vec3::Y)
        .with_rotation_key(0.0, Quat::IDENTITY)
        .with_rotation_key(1.0, Quat::from_rotation_z(FRAC_PI_2))
        .with_behaviours(KeyBehaviour::Constant, KeyBehaviour::Constant);
    Arc::new(AnimationClip::new("bend", 1.0, 1.0, vec![channel]).unwrap())
        .bind(skeleton)
        .unwrap()
}

#[test]
fn test_bind_pose_leaves_mesh_unchanged() {
    let skeleton = tentacle();
    let evaluator = PoseEvaluator::new(&skeleton).unwrap();
    let mesh = tentacle_mesh();

    // The root offset is cancelled by the global inverse
    let skinned = mesh
        .skin(evaluator.skinning_matrices(), &SkinningOptions::default())
        .unwrap();
    for (a, b) in skinned.iter().zip(mesh.positions()) {
        assert!(a.abs_diff_eq(*b, 1e-5), "{a} != {b}");
    }
}

#[test]
fn test_bent_tip_moves_only_weighted_vertices() {
    let skeleton = tentacle();
    let clip = bend(&skeleton);
    let mut evaluator = PoseEvaluator::new(&skeleton).unwrap();
    let matrices = evaluator.evaluate(&skeleton, &clip, 1.0).unwrap();

    let mesh = tentacle_mesh();
    let skinned = mesh.skin(matrices, &SkinningOptions::default()).unwrap();

    // Base vertex untouched, tip vertex rotated about the joint at y=1
    assert!(skinned[0].abs_diff_eq(Vec3::ZERO, 1e-5));
    assert!(skinned[2].abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), 1e-5));
    // The joint itself is fixed under both bones
    assert!(skinned[1].abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
}

#[test]
fn test_skinning_matrix_contract() {
    let skeleton = tentacle();
    let clip = bend(&skeleton);
    let mut evaluator = PoseEvaluator::new(&skeleton).unwrap();
    evaluator.evaluate(&skeleton, &clip, 0.5).unwrap();

    for (index, bone) in skeleton.bones().iter().enumerate() {
        let node = skeleton.tree().find(&bone.name).unwrap();
        let expected = skeleton.global_inverse()
            * evaluator.world_transform(node).unwrap()
            * bone.offset;
        assert!(evaluator.skinning_matrices()[index].abs_diff_eq(expected, 1e-6));
    }
}

#[test]
fn test_unnormalised_weights_are_kept() {
    let weights = VertexSkinWeights::new([0, 1, 0, 0], [0.3, 0.3, 0.0, 0.0]).unwrap();
    assert!((weights.weight_sum() - 0.6).abs() < 1e-6);

    let matrices = [
        Mat4::from_translation(Vec3::X),
        Mat4::from_translation(Vec3::X),
    ];
    let normalised = pose_core::skeleton::skin_position(
        Vec3::ZERO,
        &weights,
        &matrices,
        &SkinningOptions::default(),
    );
    assert!(normalised.abs_diff_eq(Vec3::X, 1e-6));

    let raw = pose_core::skeleton::skin_position(
        Vec3::ZERO,
        &weights,
        &matrices,
        &SkinningOptions {
            normalize_weights: false,
            ..Default::default()
        },
    );
    assert!(raw.abs_diff_eq(Vec3::new(0.6, 0.0, 0.0), 1e-6));
}

#[test]
fn test_model_instance_frame_loop() {
    let _ = env_logger::builder().is_test(true).try_init();

    let skeleton = tentacle();
    let mut instance = ModelInstance::new(Arc::clone(&skeleton), vec![tentacle_mesh()]).unwrap();
    instance
        .play(bend(&skeleton), PlaybackOptions {
            speed: 1.0,
            looping: false,
        })
        .unwrap();

    for _ in 0..4 {
        instance.update(0.3).unwrap();
    }
    assert!(instance.player().unwrap().is_finished());

    let skinned = instance
        .skinned_positions(0, &SkinningOptions::default())
        .unwrap();
    assert!(skinned[2].abs_diff_eq(Vec3::new(-1.0, 1.0, 0.0), 1e-5));
}
