//! Integration tests for pose-core

mod animation;
mod bounds;
mod skinning;
mod transform;
