use thiserror::Error;

/// Error types for pose, skeleton and animation evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PoseError {
    /// A value passed across an API boundary was rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A channel, bone or skin weight names a bone the skeleton does not have
    #[error("Missing bone reference: '{bone}' (referenced by {owner})")]
    MissingBoneReference { owner: String, bone: String },

    /// Keyframe data that cannot be sampled
    #[error("Malformed key data in channel '{channel}': {reason}")]
    MalformedKeyData { channel: String, reason: String },
}

impl PoseError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn missing_bone(owner: impl Into<String>, bone: impl Into<String>) -> Self {
        Self::MissingBoneReference {
            owner: owner.into(),
            bone: bone.into(),
        }
    }

    pub(crate) fn malformed(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedKeyData {
            channel: channel.into(),
            reason: reason.into(),
        }
    }
}

/// Result type using PoseError
pub type Result<T> = std::result::Result<T, PoseError>;
