//! Local (parent-relative) poses for every node of a skeleton hierarchy

use crate::error::{PoseError, Result};
use crate::skeleton::{NodeId, NodeTree};
use glam::{Mat4, Quat, Vec3};

/// Position/rotation/scale of one node relative to its parent
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalPose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub const fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Decompose an affine matrix (no shear) into a local pose
    pub fn from_matrix(matrix: &Mat4) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Matrix in translate · rotate · scale order
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Interpolate position and scale linearly, rotation spherically
    pub fn lerp(&self, other: &LocalPose, factor: f32) -> LocalPose {
        LocalPose {
            position: self.position.lerp(other.position, factor),
            rotation: self.rotation.slerp(other.rotation, factor),
            scale: self.scale.lerp(other.scale, factor),
        }
    }
}

impl Default for LocalPose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One local pose per node of a [`NodeTree`], indexed by [`NodeId`]
///
/// Nodes that were never written keep their exact rest matrix when the pose
/// is applied, so an unanimated hierarchy reproduces the loaded bind pose
/// bit for bit.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    locals: Vec<LocalPose>,
    animated: Vec<bool>,
}

impl Pose {
    /// The rest pose of `tree`
    pub fn rest(tree: &NodeTree) -> Self {
        Self {
            locals: tree.nodes().iter().map(|node| node.rest_pose()).collect(),
            animated: vec![false; tree.len()],
        }
    }

    /// Reset every node to the rest pose of `tree`
    pub fn reset_to_rest(&mut self, tree: &NodeTree) {
        self.locals.clear();
        self.locals
            .extend(tree.nodes().iter().map(|node| node.rest_pose()));
        self.animated.clear();
        self.animated.resize(tree.len(), false);
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }

    pub fn get(&self, node: NodeId) -> Option<&LocalPose> {
        self.locals.get(node.index())
    }

    /// Overwrite the local pose of `node`; out-of-range ids are ignored
    pub fn set(&mut self, node: NodeId, pose: LocalPose) {
        if let Some(slot) = self.locals.get_mut(node.index()) {
            *slot = pose;
            self.animated[node.index()] = true;
        }
    }

    /// Whether `node` was written since the last reset
    pub fn is_animated(&self, node: NodeId) -> bool {
        self.animated.get(node.index()).copied().unwrap_or(false)
    }

    pub fn locals(&self) -> &[LocalPose] {
        &self.locals
    }

    /// Blend towards `other` by `factor` (0.0 = self, 1.0 = other) into `target`
    ///
    /// This is the composition hook for layers that cross-fade clips; the
    /// evaluator itself only ever produces a single pose.
    pub fn blend_into(&self, other: &Pose, factor: f32, target: &mut Pose) -> Result<()> {
        if self.len() != other.len() {
            return Err(PoseError::invalid(format!(
                "cannot blend poses of {} and {} nodes",
                self.len(),
                other.len()
            )));
        }

        target.locals.clear();
        target.locals.extend(
            self.locals
                .iter()
                .zip(&other.locals)
                .map(|(a, b)| a.lerp(b, factor)),
        );
        target.animated.clear();
        target.animated.extend(
            self.animated
                .iter()
                .zip(&other.animated)
                .map(|(a, b)| *a || *b),
        );
        Ok(())
    }
}
