//! Clip sampling, binding and playback

use glam::{Mat4, Quat, Vec3};
use pose_core::animation::{AnimationClip, BoneChannel, KeyBehaviour};
use pose_core::pose::LocalPose;
use pose_core::skeleton::{Bone, NodeData, Skeleton};
use pose_core::{AnimationPlayer, PlaybackOptions, PoseError, PoseEvaluator};
use pretty_assertions::assert_eq;
use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;
use test_case::test_case;

fn biped() -> Skeleton {
    let root = NodeData::new("root", Mat4::IDENTITY).with_child(
        NodeData::new("pelvis", Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)))
            .with_child(NodeData::new("thigh_l", Mat4::from_translation(Vec3::X)))
            .with_child(NodeData::new("thigh_r", Mat4::from_translation(Vec3::NEG_X))),
    );
    Skeleton::new(
        root,
        vec![
            Bone::new("pelvis", Mat4::from_translation(Vec3::NEG_Y)),
            Bone::new("thigh_l", Mat4::from_translation(Vec3::new(-1.0, -1.0, 0.0))),
            Bone::new("thigh_r", Mat4::from_translation(Vec3::new(1.0, -1.0, 0.0))),
        ],
    )
    .unwrap()
}

#[test_case(0.0 ; "at the key")]
#[test_case(-3.0 ; "before the key")]
#[test_case(0.1 ; "just after")]
#[test_case(7.5 ; "mid clip")]
#[test_case(250.0 ; "far past the end")]
fn test_single_key_constant_everywhere(time: f64) {
    let channel = BoneChannel::new("pelvis")
        .with_position_key(0.0, Vec3::new(0.25, 1.5, -2.0))
        .with_behaviours(KeyBehaviour::Constant, KeyBehaviour::Constant);

    let pose = channel.sample(time, 10.0, &LocalPose::IDENTITY);
    assert_eq!(pose.position, Vec3::new(0.25, 1.5, -2.0));
}

#[test]
fn test_repeat_after_duration_matches_start() {
    let duration = 2.0;
    let channel = BoneChannel::new("pelvis")
        .with_position_key(0.0, Vec3::ZERO)
        .with_position_key(1.0, Vec3::new(0.0, 4.0, 0.0))
        .with_position_key(2.0, Vec3::new(2.0, 0.0, 0.0))
        .with_rotation_key(0.0, Quat::IDENTITY)
        .with_rotation_key(2.0, Quat::from_rotation_y(FRAC_PI_2))
        .with_behaviours(KeyBehaviour::Repeat, KeyBehaviour::Repeat);

    let early = channel.sample(0.1, duration, &LocalPose::IDENTITY);
    let late = channel.sample(duration + 0.1, duration, &LocalPose::IDENTITY);

    assert!(early.position.abs_diff_eq(late.position, 1e-4));
    assert!(early.rotation.abs_diff_eq(late.rotation, 1e-4));
    assert!(early.scale.abs_diff_eq(late.scale, 1e-4));
}

#[test]
fn test_unknown_bone_fails_at_bind() {
    let clip = Arc::new(
        AnimationClip::new(
            "wave",
            10.0,
            25.0,
            vec![
                BoneChannel::new("pelvis").with_position_key(0.0, Vec3::ZERO),
                BoneChannel::new("wing").with_position_key(0.0, Vec3::ZERO),
            ],
        )
        .unwrap(),
    );

    let err = clip.bind(&biped()).unwrap_err();
    assert_eq!(
        err,
        PoseError::MissingBoneReference {
            owner: "clip 'wave'".to_string(),
            bone: "wing".to_string(),
        }
    );
}

#[test]
fn test_empty_key_lists_fall_back_to_rest() {
    let skeleton = biped();
    let clip = Arc::new(
        AnimationClip::new("hold", 5.0, 25.0, vec![BoneChannel::new("thigh_l")]).unwrap(),
    )
    .bind(&skeleton)
    .unwrap();

    let mut evaluator = PoseEvaluator::new(&skeleton).unwrap();
    let matrices = evaluator.evaluate(&skeleton, &clip, 2.0).unwrap().to_vec();
    for m in matrices {
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }
}

#[test]
fn test_default_behaviour_uses_rest_pose_outside_keys() {
    let skeleton = biped();
    let channel = BoneChannel::new("thigh_r")
        .with_position_key(2.0, Vec3::new(-1.0, -0.5, 0.0))
        .with_position_key(4.0, Vec3::new(-1.0, -1.0, 0.0));
    let clip = Arc::new(AnimationClip::new("kick", 6.0, 25.0, vec![channel]).unwrap())
        .bind(&skeleton)
        .unwrap();

    let mut evaluator = PoseEvaluator::new(&skeleton).unwrap();
    let thigh = skeleton.tree().find("thigh_r").unwrap();

    let before = *evaluator
        .sample(&skeleton, &clip, 1.0)
        .unwrap()
        .get(thigh)
        .unwrap();
    assert!(before.position.abs_diff_eq(Vec3::NEG_X, 1e-6));

    let inside = *evaluator
        .sample(&skeleton, &clip, 3.0)
        .unwrap()
        .get(thigh)
        .unwrap();
    assert!(inside.position.abs_diff_eq(Vec3::new(-1.0, -0.75, 0.0), 1e-6));

    let after = *evaluator
        .sample(&skeleton, &clip, 5.0)
        .unwrap()
        .get(thigh)
        .unwrap();
    assert!(after.position.abs_diff_eq(Vec3::NEG_X, 1e-6));
}

#[test]
fn test_linear_extrapolation_continues_the_slope() {
    let channel = BoneChannel::new("pelvis")
        .with_position_key(0.0, Vec3::ZERO)
        .with_position_key(1.0, Vec3::new(0.0, 0.0, 2.0))
        .with_behaviours(KeyBehaviour::Linear, KeyBehaviour::Linear);

    let after = channel.sample(3.0, 1.0, &LocalPose::IDENTITY);
    assert!(after.position.abs_diff_eq(Vec3::new(0.0, 0.0, 6.0), 1e-5));

    let before = channel.sample(-1.0, 1.0, &LocalPose::IDENTITY);
    assert!(before.position.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-5));
}

#[test]
fn test_shared_clip_drives_independent_instances() {
    let skeleton = Arc::new(biped());
    let channel = BoneChannel::new("pelvis")
        .with_position_key(0.0, Vec3::Y)
        .with_position_key(10.0, Vec3::new(0.0, 2.0, 0.0));
    let clip = Arc::new(AnimationClip::new("rise", 10.0, 10.0, vec![channel]).unwrap());

    let mut fast = AnimationPlayer::new(
        Arc::clone(&clip).bind(&skeleton).unwrap(),
        PlaybackOptions {
            speed: 2.0,
            looping: false,
        },
    )
    .unwrap();
    let mut slow = AnimationPlayer::new(
        clip.bind(&skeleton).unwrap(),
        PlaybackOptions {
            speed: 0.5,
            looping: false,
        },
    )
    .unwrap();

    fast.update(0.25);
    slow.update(0.25);
    assert_eq!(fast.time(), 5.0);
    assert_eq!(slow.time(), 1.25);

    let mut a = PoseEvaluator::new(&skeleton).unwrap();
    let mut b = PoseEvaluator::new(&skeleton).unwrap();
    a.evaluate(&skeleton, fast.clip(), fast.time()).unwrap();
    b.evaluate(&skeleton, slow.clip(), slow.time()).unwrap();

    let pelvis = skeleton.tree().find("pelvis").unwrap();
    let ya = a.world_transform(pelvis).unwrap().w_axis.y;
    let yb = b.world_transform(pelvis).unwrap().w_axis.y;
    assert!((ya - 1.5).abs() < 1e-5);
    assert!((yb - 1.125).abs() < 1e-5);
}
