//! Per-tick game snapshot.
//!
//! # Conventions
//! - Distances in unreal units (uu), angles in radians, time in seconds.
//! - `players` is ordered by the interface's transient index; the only
//!   identity that survives across packets is `PlayerInfo::spawn_id`.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Primitive geometry
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Euler orientation as reported by the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

impl Rotator {
    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }
}

/// Raw physical state of a car or ball.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Physics {
    pub location: Vector3,
    pub rotation: Rotator,
    pub velocity: Vector3,
    pub angular_velocity: Vector3,
}

/// Collision box dimensions of a car body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxShape {
    pub length: f32,
    pub width: f32,
    pub height: f32,
}

impl BoxShape {
    pub const fn new(length: f32, width: f32, height: f32) -> Self {
        Self {
            length,
            width,
            height,
        }
    }
}

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Coarse contact/motion phase of a car.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AirState {
    #[default]
    OnGround,
    Jumping,
    DoubleJumping,
    Dodging,
    InAir,
}

/// Match phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStateType {
    #[default]
    Inactive,
    /// 3-2-1 countdown before a kickoff; cars are frozen
    Countdown,
    /// Kickoff in progress, ball not yet hit
    Kickoff,
    Active,
    GoalScored,
    Replay,
    Paused,
    Ended,
}

impl GameStateType {
    /// Cars can move and collect boost.
    pub fn is_live(self) -> bool {
        matches!(self, GameStateType::Kickoff | GameStateType::Active)
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Controller input applied on the last tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    pub throttle: f32,
    pub steer: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
    pub jump: bool,
    pub boost: bool,
    pub handbrake: bool,
    pub use_item: bool,
}

/// Most recent ball contact by a player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    /// Game clock at the moment of contact
    pub game_seconds: f32,
    pub location: Vector3,
    pub normal: Vector3,
    pub ball_index: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInfo {
    pub score: u32,
    pub goals: u32,
    pub own_goals: u32,
    pub assists: u32,
    pub saves: u32,
    pub shots: u32,
    pub demolitions: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Stable identity for the lifetime of the car
    pub spawn_id: i32,
    pub name: String,
    /// 0 = blue, 1 = orange
    pub team: u32,
    pub physics: Physics,
    pub air_state: AirState,
    pub last_input: ControllerState,
    /// Boost amount, 0..=100
    pub boost: f32,
    /// Seconds until respawn, −1 while alive
    pub demolished_timeout: f32,
    pub is_supersonic: bool,
    pub is_bot: bool,
    pub score_info: ScoreInfo,
    pub hitbox: BoxShape,
    pub hitbox_offset: Vector3,
    pub latest_touch: Option<Touch>,
}

// ---------------------------------------------------------------------------
// Ball, teams, pads
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BallInfo {
    pub physics: Physics,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub team_index: u32,
    pub score: u32,
}

/// Per-tick pad status, in the interface's pad ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoostPadState {
    pub is_active: bool,
    /// Seconds since the pad was picked up (0 while active)
    pub timer: f32,
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameInfo {
    /// Monotonic physics frame counter
    pub frame_num: u32,
    pub seconds_elapsed: f32,
    pub game_time_remaining: f32,
    pub game_state_type: GameStateType,
}

/// One snapshot of the whole match.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GamePacket {
    pub game_info: GameInfo,
    pub players: Vec<PlayerInfo>,
    pub balls: Vec<BallInfo>,
    pub teams: Vec<TeamInfo>,
    pub boost_pads: Vec<BoostPadState>,
}

impl GamePacket {
    /// Score of team `index`, or 0 when the packet omits it.
    pub fn team_score(&self, index: usize) -> u32 {
        self.teams.get(index).map(|t| t.score).unwrap_or(0)
    }
}
