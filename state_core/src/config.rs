//! Decoder configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// What to do when a packet's frame counter is below the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameRegressionPolicy {
    /// Treat the packet as zero ticks after the previous one and log a warning
    #[default]
    Clamp,
    /// Refuse the packet with [`crate::DecodeError::FrameRegression`]
    Reject,
}

/// Configuration for [`crate::GameState`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Ticks between successive observations; also the touch look-back window
    pub tick_skip: usize,
    /// Entity slots allocated up front; doubled on demand
    pub initial_capacity: usize,
    /// Horizontal tolerance (uu) when matching source pads to canonical pads
    pub pad_match_tolerance: f32,
    /// Match pads against the standard arena table (false keeps source order)
    pub standard_map: bool,
    pub frame_regression: FrameRegressionPolicy,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            tick_skip: 8,
            initial_capacity: 64,
            pad_match_tolerance: 2.0,
            standard_map: true,
            frame_regression: FrameRegressionPolicy::Clamp,
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_skip == 0 {
            return Err(ConfigError::InvalidTickSkip);
        }
        if self.initial_capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }
        Ok(())
    }

    /// Length of the touch look-back window in seconds.
    pub fn tick_skip_time(&self) -> f32 {
        self.tick_skip as f32 * crate::constants::TICK_TIME
    }
}
