//! Transform, skeleton and keyframe-animation core for real-time 3D engines
//!
//! The crate takes fully parsed node hierarchies, bones, skin weights and
//! animation clips from an asset loader and produces, per frame, the flat
//! array of skinning matrices a renderer uploads plus world-space bounds.
//!
//! ```text
//! clip + time ─▶ PoseEvaluator ─▶ local poses ─▶ node world transforms
//!                                                  × bone offsets
//!                                               ─▶ skinning matrices, world AABBs
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use glam::{Mat4, Vec3};
//! use pose_core::{
//!     AnimationClip, Bone, BoneChannel, KeyBehaviour, Mesh, ModelInstance, NodeData,
//!     PlaybackOptions, Skeleton, VertexSkinWeights,
//! };
//!
//! let root = NodeData::new("root", Mat4::IDENTITY)
//!     .with_child(NodeData::new("body", Mat4::IDENTITY).with_mesh(0));
//! let skeleton = Arc::new(Skeleton::new(root, vec![Bone::new("body", Mat4::IDENTITY)])?);
//!
//! let positions = vec![Vec3::ZERO, Vec3::ONE];
//! let weights = vec![VertexSkinWeights::single(0); 2];
//! let mesh = Arc::new(Mesh::new("body", positions, weights)?);
//!
//! let channel = BoneChannel::new("body")
//!     .with_position_key(0.0, Vec3::ZERO)
//!     .with_position_key(25.0, Vec3::new(0.0, 2.0, 0.0))
//!     .with_behaviours(KeyBehaviour::Constant, KeyBehaviour::Repeat);
//! let clip = Arc::new(AnimationClip::new("jump", 25.0, 25.0, vec![channel])?);
//!
//! let mut instance = ModelInstance::new(Arc::clone(&skeleton), vec![mesh])?;
//! instance.play(clip.bind(&skeleton)?, PlaybackOptions::default())?;
//!
//! let matrices = instance.update(0.5)?;
//! assert_eq!(matrices.len(), 1);
//!
//! let bounds = instance.world_bounds().unwrap();
//! assert!(bounds.min().abs_diff_eq(Vec3::new(0.0, 1.0, 0.0), 1e-5));
//! # Ok::<(), pose_core::PoseError>(())
//! ```

pub mod animation;
pub mod bounds;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod pose;
pub mod skeleton;
pub mod transform;

// Re-export common types
pub use animation::{
    AnimationClip, AnimationPlayer, BoneChannel, BoundClip, KeyBehaviour, Keyframe,
    PlaybackOptions,
};
pub use bounds::{Aabb, BoundingBox, compute_local_bounds, overlaps_with, world_bounds};
pub use error::{PoseError, Result};
pub use evaluator::PoseEvaluator;
pub use model::{Mesh, ModelInstance};
pub use pose::{LocalPose, Pose};
pub use skeleton::{
    Bone, BoneId, NodeData, NodeId, NodeTree, Skeleton, SkinningOptions, VertexSkinWeights,
};
pub use transform::Transform;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
