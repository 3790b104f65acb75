//! Error types for decoder construction and per-packet decoding.
//!
//! Heuristic estimates (touch windowing, boost pickups) never error; they
//! only miscount under heavy frame loss.

use bot_packet::Vector3;
use thiserror::Error;

/// Fatal at construction time.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error(
        "boost pad {index} at ({}, {}, {}) matches no pad of the standard arena",
        location.x, location.y, location.z
    )]
    UnmatchedBoostPad { index: usize, location: Vector3 },

    #[error("two source boost pads ({first} and {second}) map to canonical pad {canonical}")]
    DuplicateBoostPad {
        first: usize,
        second: usize,
        canonical: usize,
    },

    #[error("tick skip must be at least 1")]
    InvalidTickSkip,

    #[error("initial entity capacity must be at least 1")]
    InvalidCapacity,
}

/// Returned by [`crate::GameState::decode`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame counter went backwards: previous {previous}, current {current}")]
    FrameRegression { previous: u32, current: u32 },
}
