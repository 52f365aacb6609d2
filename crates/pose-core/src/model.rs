//! Meshes and animated model instances
//!
//! [`Mesh`] and [`Skeleton`] data is loaded once and shared through [`Arc`];
//! a [`ModelInstance`] adds the per-instance state: a root [`Transform`], a
//! [`PoseEvaluator`] and an optional [`AnimationPlayer`].

use crate::animation::{AnimationPlayer, BoundClip, PlaybackOptions};
use crate::bounds::{BoundingBox, compute_local_bounds, world_bounds};
use crate::error::{PoseError, Result};
use crate::evaluator::PoseEvaluator;
use crate::skeleton::{Skeleton, SkinningOptions, VertexSkinWeights, skin_positions};
use crate::transform::Transform;
use glam::{Mat4, Vec3};
use std::sync::Arc;

/// Bind-pose vertex positions with optional skin weights
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    name: String,
    positions: Vec<Vec3>,
    skin_weights: Vec<VertexSkinWeights>,
    local_bounds: BoundingBox,
    /// Bones with a non-zero weight on any vertex, sorted
    weighted_bones: Vec<u16>,
    /// Whether some skinned vertex has no weight at all and stays in bind pose
    has_unweighted_vertices: bool,
}

impl Mesh {
    /// Create a mesh and compute its local bounds
    ///
    /// `skin_weights` is either empty (static mesh) or holds one entry per
    /// position.
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        skin_weights: Vec<VertexSkinWeights>,
    ) -> Result<Self> {
        let name = name.into();
        if !skin_weights.is_empty() && skin_weights.len() != positions.len() {
            return Err(PoseError::invalid(format!(
                "mesh '{name}' has {} positions but {} skin weight entries",
                positions.len(),
                skin_weights.len()
            )));
        }
        let local_bounds = compute_local_bounds(&positions)?;

        let mut weighted_bones: Vec<u16> = skin_weights
            .iter()
            .flat_map(|w| w.influences().map(|(bone, _)| bone))
            .collect();
        weighted_bones.sort_unstable();
        weighted_bones.dedup();
        let has_unweighted_vertices = skin_weights.iter().any(|w| w.influences().next().is_none());

        Ok(Self {
            name,
            positions,
            skin_weights,
            local_bounds,
            weighted_bones,
            has_unweighted_vertices,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn skin_weights(&self) -> &[VertexSkinWeights] {
        &self.skin_weights
    }

    pub fn is_skinned(&self) -> bool {
        !self.skin_weights.is_empty()
    }

    /// Bounds of the bind-pose positions
    pub fn local_bounds(&self) -> &BoundingBox {
        &self.local_bounds
    }

    /// Bones that carry weight on at least one vertex
    pub fn weighted_bones(&self) -> &[u16] {
        &self.weighted_bones
    }

    /// Check every weighted bone index against `skeleton`
    pub fn validate_skin(&self, skeleton: &Skeleton) -> Result<()> {
        let owner = format!("mesh '{}'", self.name);
        self.skin_weights
            .iter()
            .try_for_each(|w| w.validate(skeleton.bone_count(), &owner))
    }

    /// Deform the bind-pose positions with per-bone skinning matrices
    ///
    /// Static meshes return their positions unchanged.
    pub fn skin(&self, matrices: &[Mat4], options: &SkinningOptions) -> Result<Vec<Vec3>> {
        if !self.is_skinned() {
            return Ok(self.positions.clone());
        }
        skin_positions(&self.positions, &self.skin_weights, matrices, options)
    }
}

/// One placed, animated copy of a skeleton and its meshes
#[derive(Debug)]
pub struct ModelInstance {
    skeleton: Arc<Skeleton>,
    meshes: Vec<Arc<Mesh>>,
    transform: Transform,
    evaluator: PoseEvaluator,
    player: Option<AnimationPlayer>,
}

impl ModelInstance {
    /// Create an instance in the bind pose at the origin
    ///
    /// Every mesh index referenced by a node must exist in `meshes`, and
    /// every skinned mesh must only reference bones of `skeleton`.
    pub fn new(skeleton: Arc<Skeleton>, meshes: Vec<Arc<Mesh>>) -> Result<Self> {
        for node in skeleton.tree().nodes() {
            if let Some(&index) = node.meshes().iter().find(|&&m| m >= meshes.len()) {
                return Err(PoseError::invalid(format!(
                    "node '{}' references mesh {index}, only {} meshes were supplied",
                    node.name(),
                    meshes.len()
                )));
            }
        }
        for mesh in &meshes {
            mesh.validate_skin(&skeleton)?;
        }

        let evaluator = PoseEvaluator::new(&skeleton)?;
        Ok(Self {
            skeleton,
            meshes,
            transform: Transform::new(),
            evaluator,
            player: None,
        })
    }

    pub fn skeleton(&self) -> &Arc<Skeleton> {
        &self.skeleton
    }

    pub fn meshes(&self) -> &[Arc<Mesh>] {
        &self.meshes
    }

    /// Placement of the whole model in the world
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    pub fn evaluator(&self) -> &PoseEvaluator {
        &self.evaluator
    }

    pub fn player(&self) -> Option<&AnimationPlayer> {
        self.player.as_ref()
    }

    /// Start playing `clip` from the beginning
    pub fn play(&mut self, clip: BoundClip, options: PlaybackOptions) -> Result<()> {
        if clip.node_count() != self.skeleton.tree().len() {
            return Err(PoseError::invalid(format!(
                "clip '{}' was not bound to this model's skeleton",
                clip.clip().name()
            )));
        }
        self.player = Some(AnimationPlayer::new(clip, options)?);
        Ok(())
    }

    /// Stop playback and return to the bind pose
    pub fn stop(&mut self) -> Result<()> {
        self.player = None;
        self.evaluator.reset_to_bind_pose(&self.skeleton)?;
        Ok(())
    }

    /// Advance playback and return the skinning matrices for this frame
    pub fn update(&mut self, delta_seconds: f64) -> Result<&[Mat4]> {
        match self.player.as_mut() {
            Some(player) => {
                player.update(delta_seconds);
                self.evaluator
                    .evaluate(&self.skeleton, player.clip(), player.time())
            }
            None => Ok(self.evaluator.skinning_matrices()),
        }
    }

    /// CPU-skinned positions of mesh `index` in model space
    pub fn skinned_positions(&self, index: usize, options: &SkinningOptions) -> Result<Vec<Vec3>> {
        let mesh = self
            .meshes
            .get(index)
            .ok_or_else(|| PoseError::invalid(format!("no mesh at index {index}")))?;
        mesh.skin(self.evaluator.skinning_matrices(), options)
    }

    /// World bounds of the model as of the last update
    ///
    /// A static mesh's local box is carried through its node's current world
    /// transform. A skinned mesh is deformed by bone matrices, not by its
    /// node, so its box is carried through the skinning matrix of every bone
    /// that weights it and the boxes are unioned. A vertex whose weights sum
    /// to one is a convex blend of those placements and lies inside the
    /// union; vertices with no weight keep their bind position. Everything
    /// is then placed by the model transform. Returns None when no node
    /// carries a mesh.
    pub fn world_bounds(&self) -> Option<BoundingBox> {
        let model = self.transform.matrix();
        let worlds = self.evaluator.world_transforms();
        let skinning = self.evaluator.skinning_matrices();

        let mut bounds: Option<BoundingBox> = None;
        let mut include = |placed: BoundingBox| {
            bounds = Some(match bounds.take() {
                Some(acc) => acc.union(&placed),
                None => placed,
            });
        };

        for (node, world) in self.skeleton.tree().nodes().iter().zip(worlds) {
            for mesh in node.meshes().iter().filter_map(|&m| self.meshes.get(m)) {
                if !mesh.is_skinned() {
                    include(world_bounds(mesh.local_bounds(), &(model * *world)));
                    continue;
                }
                for matrix in mesh
                    .weighted_bones()
                    .iter()
                    .filter_map(|&bone| skinning.get(usize::from(bone)))
                {
                    include(world_bounds(mesh.local_bounds(), &(model * *matrix)));
                }
                if mesh.has_unweighted_vertices {
                    include(world_bounds(mesh.local_bounds(), &model));
                }
            }
        }
        bounds
    }
}
