//! Playback clock for a bound clip

use super::clip::BoundClip;
use crate::error::{PoseError, Result};

/// How a player advances through its clip
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct PlaybackOptions {
    /// Multiplier applied to elapsed time; negative plays backwards
    pub speed: f64,
    /// Wrap at the end of the clip instead of stopping
    pub looping: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            looping: true,
        }
    }
}

/// Tracks the current time (in ticks) of one clip for one model instance
#[derive(Debug, Clone)]
pub struct AnimationPlayer {
    clip: BoundClip,
    options: PlaybackOptions,
    time_ticks: f64,
    finished: bool,
}

impl AnimationPlayer {
    pub fn new(clip: BoundClip, options: PlaybackOptions) -> Result<Self> {
        if !options.speed.is_finite() {
            return Err(PoseError::invalid(format!(
                "playback speed must be finite, got {}",
                options.speed
            )));
        }
        Ok(Self {
            clip,
            options,
            time_ticks: 0.0,
            finished: false,
        })
    }

    /// Advance by `delta_seconds` of wall time
    ///
    /// Looping players wrap into `[0, duration)`; others clamp to the clip
    /// ends and report [`is_finished`](Self::is_finished).
    pub fn update(&mut self, delta_seconds: f64) {
        if self.finished || !delta_seconds.is_finite() {
            return;
        }

        let clip = self.clip.clip();
        let duration = clip.duration();
        self.time_ticks += clip.seconds_to_ticks(delta_seconds) * self.options.speed;

        if duration <= 0.0 {
            self.time_ticks = 0.0;
            self.finished = !self.options.looping;
            return;
        }

        if self.options.looping {
            self.time_ticks = self.time_ticks.rem_euclid(duration);
        } else if self.time_ticks >= duration || (self.time_ticks <= 0.0 && self.options.speed < 0.0)
        {
            self.time_ticks = self.time_ticks.clamp(0.0, duration);
            self.finished = true;
        }
    }

    /// Current time in ticks
    pub fn time(&self) -> f64 {
        self.time_ticks
    }

    /// Jump to `ticks`, clearing the finished state
    pub fn set_time(&mut self, ticks: f64) {
        let duration = self.clip.clip().duration();
        self.time_ticks = if !ticks.is_finite() {
            0.0
        } else if self.options.looping && duration > 0.0 {
            ticks.rem_euclid(duration)
        } else {
            ticks.clamp(0.0, duration)
        };
        self.finished = false;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn restart(&mut self) {
        self.time_ticks = 0.0;
        self.finished = false;
    }

    pub fn clip(&self) -> &BoundClip {
        &self.clip
    }

    pub fn options(&self) -> &PlaybackOptions {
        &self.options
    }
}
