//! Position/rotation/scale transforms with a lazily rebuilt matrix
//!
//! A [`Transform`] stores its components plus an *initial pose* triple that is
//! applied before them. The 4x4 matrix is only rebuilt on the first read after
//! a mutation:
//!
//! ```text
//! M = T(initial_position + position) · R(initial_rotation) · R(rotation) · S(scale · initial_scale)
//! ```
//!
//! Translation is applied in world space after rotation and scale are applied
//! in object space (column vectors, glam convention).
//!
//! # Threading
//!
//! The matrix cache lives in [`Cell`]s, so a `Transform` is `Send` but not
//! `Sync`. Sharing one instance between threads requires external
//! synchronisation by the caller.
//!
//! # Example
//!
//! ```rust
//! use glam::Vec3;
//! use pose_core::transform::Transform;
//!
//! let mut transform = Transform::new();
//! transform
//!     .set_position(Vec3::new(1.0, 2.0, 3.0))?
//!     .set_scale(Vec3::splat(2.0))?;
//!
//! assert!(transform.is_dirty());
//! let p = transform.transform_point(Vec3::X);
//! assert_eq!(p, Vec3::new(3.0, 2.0, 3.0));
//! assert!(!transform.is_dirty());
//! # Ok::<(), pose_core::PoseError>(())
//! ```

use crate::error::{PoseError, Result};
use glam::{Mat4, Quat, Vec3};
use std::cell::Cell;

/// Tolerance used by [`Transform::is_identity`]
const IDENTITY_EPSILON: f32 = 1e-6;

/// Squared length below which a rotation axis or quaternion is degenerate
const DEGENERATE_LENGTH_SQUARED: f32 = 1e-12;

/// Position/rotation/scale triple with a cached composite matrix
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    initial_position: Vec3,
    initial_rotation: Quat,
    initial_scale: Vec3,
    matrix: Cell<Mat4>,
    dirty: Cell<bool>,
    rebuilds: Cell<u64>,
}

impl Transform {
    /// Create an identity transform (clean, cached matrix is identity)
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            initial_position: Vec3::ZERO,
            initial_rotation: Quat::IDENTITY,
            initial_scale: Vec3::ONE,
            matrix: Cell::new(Mat4::IDENTITY),
            dirty: Cell::new(false),
            rebuilds: Cell::new(0),
        }
    }

    /// Create a transform from explicit components
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Result<Self> {
        let mut transform = Self::new();
        transform
            .set_position(position)?
            .set_rotation_quat(rotation)?
            .set_scale(scale)?;
        Ok(transform)
    }

    /// Create an identity transform carrying an initial pose offset
    pub fn with_initial_pose(position: Vec3, rotation: Quat, scale: Vec3) -> Result<Self> {
        let mut transform = Self::new();
        transform.set_initial_pose(position, rotation, scale)?;
        Ok(transform)
    }

    /// Replace the initial pose offset applied before the mutable components
    pub fn set_initial_pose(
        &mut self,
        position: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Result<&mut Self> {
        check_finite("initial position", position)?;
        let rotation = checked_rotation("initial rotation", rotation)?;
        check_scale("initial scale", scale)?;

        self.initial_position = position;
        self.initial_rotation = rotation;
        self.initial_scale = scale;
        Ok(self.mark_dirty())
    }

    /// Set the position
    pub fn set_position(&mut self, position: Vec3) -> Result<&mut Self> {
        check_finite("position", position)?;
        self.position = position;
        Ok(self.mark_dirty())
    }

    /// Add an offset to the position
    pub fn translate(&mut self, offset: Vec3) -> Result<&mut Self> {
        check_finite("translation", offset)?;
        let position = self.position + offset;
        check_finite("position", position)?;
        self.position = position;
        Ok(self.mark_dirty())
    }

    /// Set the scale; any negative component is rejected and the transform is left unchanged
    pub fn set_scale(&mut self, scale: Vec3) -> Result<&mut Self> {
        check_scale("scale", scale)?;
        self.scale = scale;
        Ok(self.mark_dirty())
    }

    /// Set the rotation to `angle` radians around `axis`
    pub fn set_rotation(&mut self, angle: f32, axis: Vec3) -> Result<&mut Self> {
        if !angle.is_finite() {
            return Err(PoseError::invalid(format!(
                "rotation angle must be finite, got {angle}"
            )));
        }
        check_finite("rotation axis", axis)?;
        if axis.length_squared() < DEGENERATE_LENGTH_SQUARED {
            return Err(PoseError::invalid("rotation axis has zero length"));
        }

        self.rotation = Quat::from_axis_angle(axis.normalize(), angle);
        Ok(self.mark_dirty())
    }

    /// Set the rotation quaternion directly (normalised on the way in)
    pub fn set_rotation_quat(&mut self, rotation: Quat) -> Result<&mut Self> {
        self.rotation = checked_rotation("rotation", rotation)?;
        Ok(self.mark_dirty())
    }

    /// Replace the rotation with the result of `op` applied to the current rotation
    ///
    /// The result is validated before it is stored, so a failing operation
    /// leaves the transform untouched.
    pub fn apply_rotation<F>(&mut self, op: F) -> Result<&mut Self>
    where
        F: FnOnce(Quat) -> Quat,
    {
        self.rotation = checked_rotation("rotation", op(self.rotation))?;
        Ok(self.mark_dirty())
    }

    /// Copy every component (including the initial pose) from `other`
    pub fn set(&mut self, other: &Transform) -> &mut Self {
        self.position = other.position;
        self.rotation = other.rotation;
        self.scale = other.scale;
        self.initial_position = other.initial_position;
        self.initial_rotation = other.initial_rotation;
        self.initial_scale = other.initial_scale;
        self.mark_dirty()
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn initial_position(&self) -> Vec3 {
        self.initial_position
    }

    pub fn initial_rotation(&self) -> Quat {
        self.initial_rotation
    }

    pub fn initial_scale(&self) -> Vec3 {
        self.initial_scale
    }

    /// Position with the initial pose applied
    pub fn effective_position(&self) -> Vec3 {
        self.initial_position + self.position
    }

    /// Rotation with the initial pose applied
    pub fn effective_rotation(&self) -> Quat {
        self.initial_rotation * self.rotation
    }

    /// Scale with the initial pose applied
    pub fn effective_scale(&self) -> Vec3 {
        self.scale * self.initial_scale
    }

    /// Get the composite matrix, rebuilding it first if a mutation happened since the last read
    pub fn matrix(&self) -> Mat4 {
        if self.dirty.get() {
            self.matrix.set(compose_matrix(
                self.effective_position(),
                self.initial_rotation,
                self.rotation,
                self.effective_scale(),
            ));
            self.dirty.set(false);
            self.rebuilds.set(self.rebuilds.get() + 1);
        }
        self.matrix.get()
    }

    /// Whether the cached matrix is stale; never triggers a rebuild
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Number of times the matrix has been rebuilt over the lifetime of this instance
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.get()
    }

    /// Whether the effective position, rotation and scale are all identity
    pub fn is_identity(&self) -> bool {
        let rotation = self.effective_rotation();
        self.effective_position()
            .abs_diff_eq(Vec3::ZERO, IDENTITY_EPSILON)
            && self
                .effective_scale()
                .abs_diff_eq(Vec3::ONE, IDENTITY_EPSILON)
            && (rotation.abs_diff_eq(Quat::IDENTITY, IDENTITY_EPSILON)
                || rotation.abs_diff_eq(-Quat::IDENTITY, IDENTITY_EPSILON))
    }

    /// Combine this transform with `other` into a new transform
    ///
    /// Positions are summed, rotations multiplied (`self` then `other`,
    /// i.e. `self.rotation * other.rotation`) and scales multiplied component
    /// wise. The result carries no initial pose: both operands contribute
    /// their effective values.
    pub fn compose(&self, other: &Transform) -> Transform {
        let mut target = Transform::new();
        self.compose_into(other, &mut target);
        target
    }

    /// Combine this transform with `other`, writing the result into `target`
    pub fn compose_into(&self, other: &Transform, target: &mut Transform) {
        target.position = self.effective_position() + other.effective_position();
        target.rotation = (self.effective_rotation() * other.effective_rotation()).normalize();
        target.scale = self.effective_scale() * other.effective_scale();
        target.reset_initial_pose();
        target.mark_dirty();
    }

    /// Interpolate towards `other` into a new transform
    pub fn lerp(&self, other: &Transform, factor: f32) -> Transform {
        let mut target = Transform::new();
        self.lerp_into(other, factor, &mut target);
        target
    }

    /// Interpolate towards `other`, writing the result into `target`
    ///
    /// Position and scale are interpolated linearly, rotation spherically.
    pub fn lerp_into(&self, other: &Transform, factor: f32, target: &mut Transform) {
        target.position = self
            .effective_position()
            .lerp(other.effective_position(), factor);
        target.rotation = self
            .effective_rotation()
            .slerp(other.effective_rotation(), factor);
        target.scale = self
            .effective_scale()
            .lerp(other.effective_scale(), factor)
            .max(Vec3::ZERO);
        target.reset_initial_pose();
        target.mark_dirty();
    }

    /// Transform a point by the composite matrix
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.matrix().transform_point3(point)
    }

    fn reset_initial_pose(&mut self) {
        self.initial_position = Vec3::ZERO;
        self.initial_rotation = Quat::IDENTITY;
        self.initial_scale = Vec3::ONE;
    }

    fn mark_dirty(&mut self) -> &mut Self {
        self.dirty.set(true);
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Transform {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.rotation == other.rotation
            && self.scale == other.scale
            && self.initial_position == other.initial_position
            && self.initial_rotation == other.initial_rotation
            && self.initial_scale == other.initial_scale
    }
}

/// Build `T · R(initial) · R(rotation) · S` in that fixed order
pub fn compose_matrix(
    translation: Vec3,
    initial_rotation: Quat,
    rotation: Quat,
    scale: Vec3,
) -> Mat4 {
    Mat4::from_translation(translation)
        * Mat4::from_quat(initial_rotation)
        * Mat4::from_quat(rotation)
        * Mat4::from_scale(scale)
}

fn check_finite(what: &str, v: Vec3) -> Result<()> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(PoseError::invalid(format!("{what} must be finite, got {v}")))
    }
}

fn check_scale(what: &str, scale: Vec3) -> Result<()> {
    check_finite(what, scale)?;
    if scale.cmplt(Vec3::ZERO).any() {
        return Err(PoseError::invalid(format!(
            "{what} components must not be negative, got {scale}"
        )));
    }
    Ok(())
}

fn checked_rotation(what: &str, rotation: Quat) -> Result<Quat> {
    if !rotation.is_finite() {
        return Err(PoseError::invalid(format!("{what} must be finite")));
    }
    if rotation.length_squared() < DEGENERATE_LENGTH_SQUARED {
        return Err(PoseError::invalid(format!("{what} has zero length")));
    }
    Ok(rotation.normalize())
}
