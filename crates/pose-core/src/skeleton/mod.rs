//! Skeletons: named bones bound to a node hierarchy
//!
//! A [`Skeleton`] owns the immutable [`NodeTree`] handed over by the asset
//! loader and a list of [`Bone`]s, each associated with the node of the same
//! name. The per-bone matrix supplied to the renderer is
//!
//! ```text
//! skinning(bone) = global_inverse · world(owner_node(bone)) · bone.offset
//! ```
//!
//! # Example
//!
//! ```rust
//! use glam::{Mat4, Vec3};
//! use pose_core::skeleton::{Bone, NodeData, Skeleton};
//!
//! let root = NodeData::new("root", Mat4::IDENTITY)
//!     .with_child(NodeData::new("arm", Mat4::from_translation(Vec3::X)));
//! let bones = vec![Bone::new("arm", Mat4::from_translation(Vec3::NEG_X))];
//!
//! let skeleton = Skeleton::new(root, bones)?;
//! let worlds = skeleton.rest_world_transforms()?;
//! let arm = skeleton.find_bone("arm").unwrap();
//!
//! // In the bind pose every skinning matrix is the identity
//! assert_eq!(skeleton.skinning_matrix(arm, &worlds), Some(Mat4::IDENTITY));
//! # Ok::<(), pose_core::PoseError>(())
//! ```

mod node;
mod skin;

pub use node::{Node, NodeData, NodeId, NodeTree};
pub use skin::{MAX_INFLUENCES, SkinningOptions, VertexSkinWeights, skin_position, skin_positions};

use crate::error::{PoseError, Result};
use glam::Mat4;
use std::collections::HashMap;

/// Index of a bone inside a [`Skeleton`]; also the index used by vertex skin weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneId(pub u16);

impl BoneId {
    pub fn new(index: u16) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A named bone with its inverse bind matrix
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Bone {
    /// Unique within a skeleton; matches the name of the owning node
    pub name: String,
    /// Maps a vertex from mesh (bind-pose) space into bone space
    pub offset: Mat4,
}

impl Bone {
    pub fn new(name: impl Into<String>, offset: Mat4) -> Self {
        Self {
            name: name.into(),
            offset,
        }
    }
}

/// Bones bound to a node hierarchy
#[derive(Debug, Clone)]
pub struct Skeleton {
    tree: NodeTree,
    bones: Vec<Bone>,
    bone_nodes: Vec<NodeId>,
    by_name: HashMap<String, BoneId>,
    global_inverse: Mat4,
}

impl Skeleton {
    /// Bind `bones` to the hierarchy described by `root`
    ///
    /// Every bone must name a node of the hierarchy
    /// ([`PoseError::MissingBoneReference`] otherwise) and bone names must be
    /// unique. The global inverse transform defaults to the inverse of the
    /// root node's local transform.
    pub fn new(root: NodeData, bones: Vec<Bone>) -> Result<Self> {
        let tree = NodeTree::from_data(root)?;

        if bones.len() > usize::from(u16::MAX) + 1 {
            return Err(PoseError::invalid(format!(
                "skeleton has {} bones, at most {} are addressable",
                bones.len(),
                usize::from(u16::MAX) + 1
            )));
        }

        let mut by_name = HashMap::with_capacity(bones.len());
        let mut bone_nodes = Vec::with_capacity(bones.len());

        for (index, bone) in bones.iter().enumerate() {
            if !bone.offset.is_finite() {
                return Err(PoseError::invalid(format!(
                    "bone '{}' has a non-finite offset matrix",
                    bone.name
                )));
            }

            let node = tree
                .find(&bone.name)
                .ok_or_else(|| PoseError::missing_bone("skeleton hierarchy", &bone.name))?;

            // bounded by the length check above
            let id = BoneId(index as u16);
            if by_name.insert(bone.name.clone(), id).is_some() {
                return Err(PoseError::invalid(format!(
                    "duplicate bone name '{}'",
                    bone.name
                )));
            }
            bone_nodes.push(node);
        }

        let root_local = tree
            .node(tree.root())
            .map_or(Mat4::IDENTITY, Node::local_transform);
        let global_inverse = invert(&root_local, "root node transform")?;

        log::debug!(
            "Bound {} bones to a hierarchy of {} nodes",
            bones.len(),
            tree.len()
        );

        Ok(Self {
            tree,
            bones,
            bone_nodes,
            by_name,
            global_inverse,
        })
    }

    /// Replace the global inverse transform applied in front of every skinning matrix
    pub fn with_global_inverse(mut self, global_inverse: Mat4) -> Result<Self> {
        if !global_inverse.is_finite() {
            return Err(PoseError::invalid("global inverse transform must be finite"));
        }
        self.global_inverse = global_inverse;
        Ok(self)
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index())
    }

    /// Find a bone by name
    pub fn find_bone(&self, name: &str) -> Option<BoneId> {
        self.by_name.get(name).copied()
    }

    /// Bone record by name
    pub fn bone_by_name(&self, name: &str) -> Option<&Bone> {
        self.find_bone(name).and_then(|id| self.bone(id))
    }

    /// Node that supplies the world transform of `bone`
    pub fn bone_node(&self, bone: BoneId) -> Option<NodeId> {
        self.bone_nodes.get(bone.index()).copied()
    }

    /// Owning node of the bone called `name`
    pub fn node_of(&self, name: &str) -> Option<NodeId> {
        self.find_bone(name).and_then(|id| self.bone_node(id))
    }

    pub fn global_inverse(&self) -> Mat4 {
        self.global_inverse
    }

    /// World transforms of every node in the rest pose
    pub fn rest_world_transforms(&self) -> Result<Vec<Mat4>> {
        let mut worlds = vec![Mat4::IDENTITY; self.tree.len()];
        self.tree
            .world_transforms(&self.tree.rest_locals(), &mut worlds)?;
        Ok(worlds)
    }

    /// Skinning matrix of `bone` given the world transforms of every node
    pub fn skinning_matrix(&self, bone: BoneId, worlds: &[Mat4]) -> Option<Mat4> {
        let node = self.bone_node(bone)?;
        let world = worlds.get(node.index())?;
        let offset = self.bones[bone.index()].offset;
        Some(self.global_inverse * *world * offset)
    }

    /// Fill `out` with one skinning matrix per bone, indexed by [`BoneId`]
    pub fn skinning_matrices_into(&self, worlds: &[Mat4], out: &mut Vec<Mat4>) -> Result<()> {
        if worlds.len() != self.tree.len() {
            return Err(PoseError::invalid(format!(
                "expected {} world transforms, got {}",
                self.tree.len(),
                worlds.len()
            )));
        }

        out.clear();
        out.extend(
            self.bones
                .iter()
                .zip(&self.bone_nodes)
                .map(|(bone, node)| self.global_inverse * worlds[node.index()] * bone.offset),
        );
        Ok(())
    }
}

/// Invert `matrix`, rejecting singular input
///
/// Small but valid scales (unit conversion roots) have tiny determinants, so
/// only an exactly singular matrix or a non-finite inverse is an error.
fn invert(matrix: &Mat4, what: &str) -> Result<Mat4> {
    let inverse = matrix.inverse();
    if matrix.determinant() == 0.0 || !inverse.is_finite() {
        return Err(PoseError::invalid(format!("{what} is not invertible")));
    }
    Ok(inverse)
}
