//! Fundamental types used across the decoder.

use nalgebra::{Matrix3, Vector3, Vector4};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Scalar type: f32 throughout, matching the precision of the source packets.
// ---------------------------------------------------------------------------

/// 3-vector for positions, velocities and directions
pub type Vec3 = Vector3<f32>;

/// 3×3 rotation matrix; columns are forward, left, up
pub type RotMat = Matrix3<f32>;

/// Quaternion stored as `[w, x, y, z]`
pub type Quat = Vector4<f32>;

/// Convert an interface vector into the decoder's vector type.
pub fn vec3(v: bot_packet::Vector3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

// ---------------------------------------------------------------------------
// Identifier types
// ---------------------------------------------------------------------------

/// Stable identity of a car across a match. Never the packet array index.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SpawnId(pub i32);

impl fmt::Display for SpawnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    #[default]
    Blue,
    Orange,
}

impl From<u32> for Team {
    fn from(value: u32) -> Self {
        match value {
            0 => Self::Blue,
            _ => Self::Orange,
        }
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        match team {
            Team::Blue => 0,
            Team::Orange => 1,
        }
    }
}

// ---------------------------------------------------------------------------
// Hitbox
// ---------------------------------------------------------------------------

/// The six car body classes. Discriminants follow the conventional numbering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitboxType {
    #[default]
    Octane = 0,
    Dominus = 1,
    Plank = 2,
    Breakout = 3,
    Hybrid = 4,
    Merc = 5,
}

impl HitboxType {
    pub const ALL: [HitboxType; 6] = [
        HitboxType::Octane,
        HitboxType::Dominus,
        HitboxType::Plank,
        HitboxType::Breakout,
        HitboxType::Hybrid,
        HitboxType::Merc,
    ];
}

impl fmt::Display for HitboxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HitboxType::Octane => "Octane",
            HitboxType::Dominus => "Dominus",
            HitboxType::Plank => "Plank",
            HitboxType::Breakout => "Breakout",
            HitboxType::Hybrid => "Hybrid",
            HitboxType::Merc => "Merc",
        };
        f.write_str(name)
    }
}
