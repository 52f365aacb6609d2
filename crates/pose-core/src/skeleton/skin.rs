//! Per-vertex bone weights and CPU vertex skinning
//!
//! Weights are stored exactly as the loader provides them. Nothing here
//! forces them to sum to 1: [`VertexSkinWeights::normalized`] is available to
//! callers, and the CPU skinning path normalises when
//! [`SkinningOptions::normalize_weights`] is set.

use crate::error::{PoseError, Result};
use glam::{Mat4, Vec3};

/// Number of bone influences stored per vertex
pub const MAX_INFLUENCES: usize = 4;

/// Options for controlling CPU skinning
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct SkinningOptions {
    /// Divide the blended position by the total weight of the vertex
    pub normalize_weights: bool,
    /// Influences below this weight are ignored
    pub weight_threshold: f32,
}

impl Default for SkinningOptions {
    fn default() -> Self {
        Self {
            normalize_weights: true,
            weight_threshold: 0.001,
        }
    }
}

/// Up to four (bone index, weight) pairs for one vertex, zero padded
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexSkinWeights {
    pub bone_indices: [u16; MAX_INFLUENCES],
    pub bone_weights: [f32; MAX_INFLUENCES],
}

impl VertexSkinWeights {
    /// Create weights from raw slots; weights must be finite and non-negative
    pub fn new(
        bone_indices: [u16; MAX_INFLUENCES],
        bone_weights: [f32; MAX_INFLUENCES],
    ) -> Result<Self> {
        if let Some(bad) = bone_weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
            return Err(PoseError::invalid(format!(
                "skin weight must be finite and non-negative, got {bad}"
            )));
        }
        Ok(Self {
            bone_indices,
            bone_weights,
        })
    }

    /// Full weight on a single bone
    pub fn single(bone: u16) -> Self {
        Self {
            bone_indices: [bone, 0, 0, 0],
            bone_weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// Build from an arbitrary influence list, keeping the heaviest four
    pub fn from_influences(influences: &[(u16, f32)]) -> Result<Self> {
        let mut sorted = influences.to_vec();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

        if sorted.len() > MAX_INFLUENCES {
            log::debug!(
                "Dropping {} of {} bone influences below weight {}",
                sorted.len() - MAX_INFLUENCES,
                sorted.len(),
                sorted[MAX_INFLUENCES - 1].1
            );
            sorted.truncate(MAX_INFLUENCES);
        }

        let mut bone_indices = [0u16; MAX_INFLUENCES];
        let mut bone_weights = [0.0f32; MAX_INFLUENCES];
        for (slot, (bone, weight)) in sorted.into_iter().enumerate() {
            bone_indices[slot] = bone;
            bone_weights[slot] = weight;
        }
        Self::new(bone_indices, bone_weights)
    }

    /// Sum of the four weights
    pub fn weight_sum(&self) -> f32 {
        self.bone_weights.iter().sum()
    }

    /// Copy with weights scaled to sum to 1 (unchanged if all weights are zero)
    pub fn normalized(&self) -> Self {
        let total = self.weight_sum();
        if total <= 0.0 {
            return *self;
        }
        let mut out = *self;
        for weight in &mut out.bone_weights {
            *weight /= total;
        }
        out
    }

    /// Non-zero influences
    pub fn influences(&self) -> impl Iterator<Item = (u16, f32)> + '_ {
        self.bone_indices
            .iter()
            .copied()
            .zip(self.bone_weights.iter().copied())
            .filter(|(_, weight)| *weight > 0.0)
    }

    /// Check that every weighted slot addresses a bone below `bone_count`
    pub fn validate(&self, bone_count: usize, owner: &str) -> Result<()> {
        match self
            .influences()
            .find(|(bone, _)| usize::from(*bone) >= bone_count)
        {
            Some((bone, _)) => Err(PoseError::missing_bone(owner, format!("#{bone}"))),
            None => Ok(()),
        }
    }
}

/// Deform a single bind-pose position with per-bone skinning matrices
///
/// Influences that address a bone outside `matrices` are skipped; meshes are
/// validated against their skeleton before they reach this point. A vertex
/// with no usable influence keeps its bind position.
pub fn skin_position(
    position: Vec3,
    weights: &VertexSkinWeights,
    matrices: &[Mat4],
    options: &SkinningOptions,
) -> Vec3 {
    let mut blended = Vec3::ZERO;
    let mut total_weight = 0.0f32;

    for (bone, weight) in weights.influences() {
        if weight < options.weight_threshold {
            continue;
        }
        let Some(matrix) = matrices.get(usize::from(bone)) else {
            continue;
        };
        blended += matrix.transform_point3(position) * weight;
        total_weight += weight;
    }

    if total_weight < options.weight_threshold {
        return position;
    }
    if options.normalize_weights {
        blended /= total_weight;
    }
    blended
}

/// Deform bind-pose positions; `weights` must hold one entry per position
pub fn skin_positions(
    positions: &[Vec3],
    weights: &[VertexSkinWeights],
    matrices: &[Mat4],
    options: &SkinningOptions,
) -> Result<Vec<Vec3>> {
    if positions.len() != weights.len() {
        return Err(PoseError::invalid(format!(
            "{} positions but {} skin weight entries",
            positions.len(),
            weights.len()
        )));
    }

    Ok(positions
        .iter()
        .zip(weights)
        .map(|(position, w)| skin_position(*position, w, matrices, options))
        .collect())
}
