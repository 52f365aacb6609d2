//! Common types for the animation system

use glam::{Quat, Vec3};

/// Policy for sampling a key list before its first or after its last key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyBehaviour {
    /// Use the node's rest-pose value for the component
    #[default]
    Default,
    /// Hold the nearest key's value
    Constant,
    /// Extrapolate along the nearest two keys
    Linear,
    /// Wrap the time by the clip duration and sample again
    Repeat,
}

/// A single timestamped value (time in ticks)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct Keyframe<T> {
    pub time: f64,
    pub value: T,
}

impl<T> Keyframe<T> {
    pub const fn new(time: f64, value: T) -> Self {
        Self { time, value }
    }
}

/// Values that can be interpolated between two keys
///
/// `factor` is 0.0 at `self` and 1.0 at `other`. Factors outside that range
/// extrapolate along the same segment.
pub trait Interpolate: Copy {
    fn interpolate(&self, other: &Self, factor: f32) -> Self;
}

impl Interpolate for f32 {
    fn interpolate(&self, other: &Self, factor: f32) -> Self {
        self + (other - self) * factor
    }
}

impl Interpolate for Vec3 {
    fn interpolate(&self, other: &Self, factor: f32) -> Self {
        *self + (*other - *self) * factor
    }
}

impl Interpolate for Quat {
    fn interpolate(&self, other: &Self, factor: f32) -> Self {
        if (0.0..=1.0).contains(&factor) {
            return self.slerp(*other, factor);
        }

        // Take the shorter arc, then scale the angle of the segment's delta rotation
        let other = if self.dot(*other) < 0.0 { -*other } else { *other };
        let (axis, angle) = (self.inverse() * other).to_axis_angle();
        if angle.abs() < 1e-6 {
            return *self;
        }
        (*self * Quat::from_axis_angle(axis, angle * factor)).normalize()
    }
}
