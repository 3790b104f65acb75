//! `bot_packet` — Per-tick snapshot and static field layout as supplied by the
//! bot-control interface.
//!
//! These types carry no behaviour beyond trivial accessors; all inference
//! happens in `state_core`.

pub mod field;
pub mod packet;

pub use field::{BoostPad, FieldInfo};
pub use packet::{
    AirState, BallInfo, BoostPadState, BoxShape, ControllerState, GameInfo, GamePacket,
    GameStateType, Physics, PlayerInfo, Rotator, ScoreInfo, TeamInfo, Touch, Vector3,
};
