//! Animation clips and their binding to a skeleton

use super::channel::BoneChannel;
use crate::error::{PoseError, Result};
use crate::pose::Pose;
use crate::skeleton::{NodeId, NodeTree, Skeleton};
use std::collections::HashSet;
use std::sync::Arc;

/// Ticks per second assumed when a clip does not specify a usable rate
pub const DEFAULT_TICKS_PER_SECOND: f64 = 25.0;

/// A named, timed set of bone channels
///
/// Clips are immutable once built and are meant to be shared between model
/// instances through an [`Arc`]. Deserialize [`BoneChannel`]s and go through
/// [`AnimationClip::new`] so the channels are validated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct AnimationClip {
    name: String,
    duration: f64,
    ticks_per_second: f64,
    channels: Vec<BoneChannel>,
}

impl AnimationClip {
    /// Build a clip, validating every channel
    ///
    /// `duration` is in ticks and must be finite and non-negative. A
    /// `ticks_per_second` that is zero, negative or non-finite falls back to
    /// [`DEFAULT_TICKS_PER_SECOND`]. Two channels for the same bone are
    /// rejected with [`PoseError::MalformedKeyData`].
    pub fn new(
        name: impl Into<String>,
        duration: f64,
        ticks_per_second: f64,
        channels: Vec<BoneChannel>,
    ) -> Result<Self> {
        let name = name.into();

        if !duration.is_finite() || duration < 0.0 {
            return Err(PoseError::invalid(format!(
                "clip '{name}' has invalid duration {duration}"
            )));
        }

        let ticks_per_second = if ticks_per_second.is_finite() && ticks_per_second > 0.0 {
            ticks_per_second
        } else {
            log::warn!(
                "Clip '{name}' has unusable ticks per second {ticks_per_second}, using {DEFAULT_TICKS_PER_SECOND}"
            );
            DEFAULT_TICKS_PER_SECOND
        };

        let mut seen = HashSet::with_capacity(channels.len());
        for channel in &channels {
            channel.validate()?;
            if !seen.insert(channel.bone.as_str()) {
                return Err(PoseError::malformed(
                    &channel.bone,
                    format!("clip '{name}' has more than one channel for this bone"),
                ));
            }
        }

        Ok(Self {
            name,
            duration,
            ticks_per_second,
            channels,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Duration in ticks
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn ticks_per_second(&self) -> f64 {
        self.ticks_per_second
    }

    pub fn channels(&self) -> &[BoneChannel] {
        &self.channels
    }

    /// Channel animating `bone`, if any
    pub fn channel(&self, bone: &str) -> Option<&BoneChannel> {
        self.channels.iter().find(|c| c.bone == bone)
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration / self.ticks_per_second
    }

    pub fn seconds_to_ticks(&self, seconds: f64) -> f64 {
        seconds * self.ticks_per_second
    }

    /// Resolve every channel to a node of the skeleton's hierarchy
    pub fn resolve_targets(&self, skeleton: &Skeleton) -> Result<Vec<NodeId>> {
        self.channels
            .iter()
            .map(|channel| {
                skeleton.tree().find(&channel.bone).ok_or_else(|| {
                    PoseError::missing_bone(format!("clip '{}'", self.name), &channel.bone)
                })
            })
            .collect()
    }

    /// Bind a shared clip to `skeleton`
    pub fn bind(self: Arc<Self>, skeleton: &Skeleton) -> Result<BoundClip> {
        BoundClip::new(self, skeleton)
    }
}

/// A clip whose channels have been resolved against one skeleton
///
/// Binding happens once; sampling a bound clip never fails on name lookups.
#[derive(Debug, Clone)]
pub struct BoundClip {
    clip: Arc<AnimationClip>,
    targets: Vec<NodeId>,
    node_count: usize,
}

impl BoundClip {
    pub fn new(clip: Arc<AnimationClip>, skeleton: &Skeleton) -> Result<Self> {
        let targets = clip.resolve_targets(skeleton)?;

        log::debug!(
            "Bound clip '{}' ({} channels) to a hierarchy of {} nodes",
            clip.name(),
            targets.len(),
            skeleton.tree().len()
        );

        Ok(Self {
            clip,
            targets,
            node_count: skeleton.tree().len(),
        })
    }

    pub fn clip(&self) -> &Arc<AnimationClip> {
        &self.clip
    }

    /// Node count of the hierarchy this clip was bound to
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Channels paired with their target nodes
    pub fn channels(&self) -> impl Iterator<Item = (&BoneChannel, NodeId)> + '_ {
        self.clip.channels.iter().zip(self.targets.iter().copied())
    }

    /// Write the sampled local pose of every animated node into `pose`
    ///
    /// Nodes without a channel are left untouched; callers reset the pose to
    /// rest first when they want unanimated nodes at their bind transform.
    pub fn sample_into(&self, tree: &NodeTree, time: f64, pose: &mut Pose) -> Result<()> {
        if tree.len() != self.node_count || pose.len() != self.node_count {
            return Err(PoseError::invalid(format!(
                "clip '{}' was bound to {} nodes, got a hierarchy of {} and a pose of {}",
                self.clip.name,
                self.node_count,
                tree.len(),
                pose.len()
            )));
        }

        let duration = self.clip.duration;
        for (channel, node) in self.channels() {
            let rest = tree.rest_pose(node).unwrap_or_default();
            pose.set(node, channel.sample(time, duration, &rest));
        }
        Ok(())
    }
}
