//! Per-instance pose evaluation
//!
//! A [`PoseEvaluator`] owns the mutable per-frame state of one model
//! instance: the current local pose, the node world transforms and the
//! skinning matrices handed to the renderer. The [`Skeleton`] and clips it
//! reads from stay immutable and can be shared between instances.

use crate::animation::BoundClip;
use crate::error::{PoseError, Result};
use crate::pose::Pose;
use crate::skeleton::{NodeId, Skeleton};
use glam::Mat4;

/// Samples clips and turns poses into world and skinning matrices
#[derive(Debug, Clone)]
pub struct PoseEvaluator {
    pose: Pose,
    locals: Vec<Mat4>,
    worlds: Vec<Mat4>,
    skinning: Vec<Mat4>,
}

impl PoseEvaluator {
    /// Create an evaluator holding the bind pose of `skeleton`
    pub fn new(skeleton: &Skeleton) -> Result<Self> {
        let tree = skeleton.tree();
        let mut evaluator = Self {
            pose: Pose::rest(tree),
            locals: Vec::with_capacity(tree.len()),
            worlds: Vec::with_capacity(tree.len()),
            skinning: Vec::with_capacity(skeleton.bone_count()),
        };
        write_matrices(
            skeleton,
            &evaluator.pose,
            &mut evaluator.locals,
            &mut evaluator.worlds,
            &mut evaluator.skinning,
        )?;
        Ok(evaluator)
    }

    /// Sample `clip` at `time` ticks into the evaluator's pose
    ///
    /// Nodes without a channel keep their rest pose.
    pub fn sample(&mut self, skeleton: &Skeleton, clip: &BoundClip, time: f64) -> Result<&Pose> {
        let tree = skeleton.tree();
        if clip.node_count() != tree.len() {
            return Err(PoseError::invalid(format!(
                "clip '{}' was bound to a different hierarchy ({} nodes, skeleton has {})",
                clip.clip().name(),
                clip.node_count(),
                tree.len()
            )));
        }

        self.pose.reset_to_rest(tree);
        clip.sample_into(tree, time, &mut self.pose)?;
        Ok(&self.pose)
    }

    /// Apply `pose` to the hierarchy and rebuild world and skinning matrices
    ///
    /// Returns the skinning matrices, indexed by bone.
    pub fn apply_pose(&mut self, skeleton: &Skeleton, pose: &Pose) -> Result<&[Mat4]> {
        if pose.len() != skeleton.tree().len() {
            return Err(PoseError::invalid(format!(
                "pose has {} nodes, skeleton has {}",
                pose.len(),
                skeleton.tree().len()
            )));
        }
        self.pose.clone_from(pose);
        write_matrices(
            skeleton,
            &self.pose,
            &mut self.locals,
            &mut self.worlds,
            &mut self.skinning,
        )?;
        Ok(&self.skinning)
    }

    /// Sample `clip` at `time` and apply the result
    pub fn evaluate(&mut self, skeleton: &Skeleton, clip: &BoundClip, time: f64) -> Result<&[Mat4]> {
        self.sample(skeleton, clip, time)?;
        write_matrices(
            skeleton,
            &self.pose,
            &mut self.locals,
            &mut self.worlds,
            &mut self.skinning,
        )?;
        Ok(&self.skinning)
    }

    /// Return to the bind pose
    pub fn reset_to_bind_pose(&mut self, skeleton: &Skeleton) -> Result<&[Mat4]> {
        self.pose.reset_to_rest(skeleton.tree());
        write_matrices(
            skeleton,
            &self.pose,
            &mut self.locals,
            &mut self.worlds,
            &mut self.skinning,
        )?;
        Ok(&self.skinning)
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// World transform of `node` as of the last applied pose
    pub fn world_transform(&self, node: NodeId) -> Option<Mat4> {
        self.worlds.get(node.index()).copied()
    }

    pub fn world_transforms(&self) -> &[Mat4] {
        &self.worlds
    }

    /// Skinning matrices as of the last applied pose, indexed by bone
    pub fn skinning_matrices(&self) -> &[Mat4] {
        &self.skinning
    }
}

fn write_matrices(
    skeleton: &Skeleton,
    pose: &Pose,
    locals: &mut Vec<Mat4>,
    worlds: &mut Vec<Mat4>,
    skinning: &mut Vec<Mat4>,
) -> Result<()> {
    let tree = skeleton.tree();

    // Unanimated nodes use their loaded matrix verbatim
    locals.clear();
    locals.extend(tree.nodes().iter().enumerate().map(|(i, node)| {
        let id = NodeId(i as u32);
        match pose.get(id) {
            Some(local) if pose.is_animated(id) => local.to_matrix(),
            _ => node.local_transform(),
        }
    }));

    worlds.resize(tree.len(), Mat4::IDENTITY);
    tree.world_transforms(locals, worlds)?;
    skeleton.skinning_matrices_into(worlds, skinning)
}
