//! Keyframe animation sampling
//!
//! This module provides the runtime side of skeletal animation:
//! - [`BoneChannel`]: independent position/rotation/scale key lists for one bone
//! - [`AnimationClip`]: an immutable, shareable set of channels
//! - [`BoundClip`]: a clip resolved against one skeleton's node hierarchy
//! - [`AnimationPlayer`]: a per-instance playback clock
//!
//! Time is measured in *ticks*; a clip's `ticks_per_second` converts wall time.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use glam::{Mat4, Vec3};
//! use pose_core::animation::{AnimationClip, BoneChannel, KeyBehaviour};
//! use pose_core::skeleton::{NodeData, Skeleton};
//!
//! let skeleton = Skeleton::new(
//!     NodeData::new("root", Mat4::IDENTITY).with_child(NodeData::new("hip", Mat4::IDENTITY)),
//!     vec![],
//! )?;
//!
//! let channel = BoneChannel::new("hip")
//!     .with_position_key(0.0, Vec3::ZERO)
//!     .with_position_key(10.0, Vec3::new(0.0, 1.0, 0.0))
//!     .with_behaviours(KeyBehaviour::Constant, KeyBehaviour::Repeat);
//!
//! let clip = Arc::new(AnimationClip::new("bob", 10.0, 25.0, vec![channel])?);
//! let bound = clip.bind(&skeleton)?;
//! assert_eq!(bound.channels().count(), 1);
//! # Ok::<(), pose_core::PoseError>(())
//! ```

mod channel;
mod clip;
mod interpolation;
mod player;
mod types;

pub use channel::BoneChannel;
pub use clip::{AnimationClip, BoundClip, DEFAULT_TICKS_PER_SECOND};
pub use interpolation::{find_key_index, sample_keys};
pub use player::{AnimationPlayer, PlaybackOptions};
pub use types::{Interpolate, KeyBehaviour, Keyframe};
