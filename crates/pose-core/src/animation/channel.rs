//! Per-bone keyframe channels

use super::interpolation::sample_keys;
use super::types::{KeyBehaviour, Keyframe};
use crate::error::{PoseError, Result};
use crate::pose::LocalPose;
use glam::{Quat, Vec3};

/// Keyframe tracks animating one bone (or node) of a skeleton
///
/// The three key lists are independent: they may have different lengths and
/// timestamps. Each list must be sorted by non-decreasing time, which is
/// checked by [`BoneChannel::validate`] when the channel is added to a clip.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct BoneChannel {
    /// Name of the animated bone / node
    pub bone: String,
    pub position_keys: Vec<Keyframe<Vec3>>,
    pub rotation_keys: Vec<Keyframe<Quat>>,
    pub scale_keys: Vec<Keyframe<Vec3>>,
    /// Behaviour before the first key of each list
    pub pre_behaviour: KeyBehaviour,
    /// Behaviour after the last key of each list
    pub post_behaviour: KeyBehaviour,
}

impl BoneChannel {
    /// Create an empty channel for `bone`
    pub fn new(bone: impl Into<String>) -> Self {
        Self {
            bone: bone.into(),
            position_keys: Vec::new(),
            rotation_keys: Vec::new(),
            scale_keys: Vec::new(),
            pre_behaviour: KeyBehaviour::Default,
            post_behaviour: KeyBehaviour::Default,
        }
    }

    pub fn with_position_key(mut self, time: f64, position: Vec3) -> Self {
        self.position_keys.push(Keyframe::new(time, position));
        self
    }

    pub fn with_rotation_key(mut self, time: f64, rotation: Quat) -> Self {
        self.rotation_keys.push(Keyframe::new(time, rotation));
        self
    }

    pub fn with_scale_key(mut self, time: f64, scale: Vec3) -> Self {
        self.scale_keys.push(Keyframe::new(time, scale));
        self
    }

    pub fn with_behaviours(mut self, pre: KeyBehaviour, post: KeyBehaviour) -> Self {
        self.pre_behaviour = pre;
        self.post_behaviour = post;
        self
    }

    /// Whether all three key lists are empty
    pub fn is_empty(&self) -> bool {
        self.position_keys.is_empty() && self.rotation_keys.is_empty() && self.scale_keys.is_empty()
    }

    /// Time of the last key over all three lists
    pub fn end_time(&self) -> Option<f64> {
        let last = |times: Option<f64>, acc: Option<f64>| match (times, acc) {
            (Some(t), Some(a)) => Some(t.max(a)),
            (t, a) => t.or(a),
        };
        let mut end = None;
        end = last(self.position_keys.last().map(|k| k.time), end);
        end = last(self.rotation_keys.last().map(|k| k.time), end);
        last(self.scale_keys.last().map(|k| k.time), end)
    }

    /// Reject non-finite values, zero rotations and out-of-order timestamps
    pub fn validate(&self) -> Result<()> {
        self.validate_track("position", &self.position_keys, |v| v.is_finite())?;
        self.validate_track("rotation", &self.rotation_keys, |q| {
            q.is_finite() && q.length_squared() > 1e-12
        })?;
        self.validate_track("scale", &self.scale_keys, |v| {
            v.is_finite() && v.cmpge(Vec3::ZERO).all()
        })
    }

    fn validate_track<T>(
        &self,
        track: &str,
        keys: &[Keyframe<T>],
        valid_value: impl Fn(&T) -> bool,
    ) -> Result<()> {
        let mut previous = f64::NEG_INFINITY;
        for (index, key) in keys.iter().enumerate() {
            if !key.time.is_finite() {
                return Err(PoseError::malformed(
                    &self.bone,
                    format!("{track} key {index} has non-finite time {}", key.time),
                ));
            }
            if key.time < previous {
                return Err(PoseError::malformed(
                    &self.bone,
                    format!(
                        "{track} key {index} at time {} precedes the previous key at {previous}",
                        key.time
                    ),
                ));
            }
            if !valid_value(&key.value) {
                return Err(PoseError::malformed(
                    &self.bone,
                    format!("{track} key {index} has an invalid value"),
                ));
            }
            previous = key.time;
        }
        Ok(())
    }

    /// Sample the channel at `time` ticks
    ///
    /// `rest` supplies the components used by [`KeyBehaviour::Default`] and
    /// by empty key lists.
    pub fn sample(&self, time: f64, duration: f64, rest: &LocalPose) -> LocalPose {
        let (pre, post) = (self.pre_behaviour, self.post_behaviour);

        let mut scale = sample_keys(&self.scale_keys, time, duration, pre, post, rest.scale);
        // Only linear extrapolation can overshoot below zero; a mirrored rest scale is kept
        if self.extrapolates_linearly(&self.scale_keys, time) {
            scale = scale.max(Vec3::ZERO);
        }

        LocalPose {
            position: sample_keys(&self.position_keys, time, duration, pre, post, rest.position),
            rotation: sample_keys(&self.rotation_keys, time, duration, pre, post, rest.rotation)
                .normalize(),
            scale,
        }
    }

    fn extrapolates_linearly<T>(&self, keys: &[Keyframe<T>], time: f64) -> bool {
        match (keys.first(), keys.last()) {
            (Some(first), Some(last)) => {
                (time < first.time && self.pre_behaviour == KeyBehaviour::Linear)
                    || (time > last.time && self.post_behaviour == KeyBehaviour::Linear)
            }
            _ => false,
        }
    }
}
