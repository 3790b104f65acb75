//! `state_core` — History-aware game state reconstruction from snapshots.
//!
//! # Module layout
//! - [`types`]      — Vector aliases, stable IDs, team and hitbox enums
//! - [`constants`]  — Tick timing, jump/boost/flip constants, arena tables
//! - [`physics`]    — Euler → matrix → quaternion, team mirroring
//! - [`air_state`]  — Pure jump/flip transition function
//! - [`car`]        — Per-car persistent record and its per-tick update
//! - [`boost_pads`] — Source → canonical pad permutation
//! - [`arena`]      — Growable per-entity storage keyed by spawn ID
//! - [`game_state`] — Aggregate decoder producing one [`Frame`] per packet
//! - [`config`]     — Decoder configuration
//! - [`error`]      — Configuration and decode errors

pub mod air_state;
pub mod arena;
pub mod boost_pads;
pub mod car;
pub mod config;
pub mod constants;
pub mod error;
pub mod game_state;
pub mod physics;
pub mod types;

pub use arena::{EntityArena, EntitySlot, TickCounters};
pub use boost_pads::BoostPadMap;
pub use car::Car;
pub use config::{DecoderConfig, FrameRegressionPolicy};
pub use error::{ConfigError, DecodeError};
pub use game_state::{Frame, GameState, PlayerFrame};
pub use physics::Pose;
pub use types::{HitboxType, Quat, RotMat, SpawnId, Team, Vec3};
