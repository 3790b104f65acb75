//! Game constants: tick timing, jump/flip/boost mechanics, arena tables.

use crate::types::HitboxType;
use bot_packet::BoxShape;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

pub const TICKS_PER_SECOND: f32 = 120.0;

/// Duration of one physics tick (s)
pub const TICK_TIME: f32 = 1.0 / TICKS_PER_SECOND;

// ---------------------------------------------------------------------------
// Car mechanics
// ---------------------------------------------------------------------------

/// Shortest possible first-jump hold (s)
pub const MIN_JUMP_TIME: f32 = 0.025;

/// Grace period past `MIN_JUMP_TIME` before landing clears the jump (s)
pub const JUMP_RESET_TIME_PAD: f32 = 1.0 / 40.0;

/// Ticks a car stays on the ground after a jump starts
pub const JUMP_GROUND_TICKS: f32 = 6.0;

/// Boost stays active at least this long once pressed (12 ticks)
pub const MIN_BOOST_TIME: f32 = 0.1;

/// Window after the first jump during which a flip or double jump is allowed (s)
pub const DOUBLEJUMP_MAX_DELAY: f32 = 1.25;

/// Duration of dodge torque (s)
pub const FLIP_TORQUE_TIME: f32 = 0.65;

/// Dodge inputs whose components are all below this magnitude produce a stall
pub const DODGE_DEADZONE: f32 = 0.1;

/// Handbrake ramp per second while held
pub const POWERSLIDE_RISE_RATE: f32 = 5.0;

/// Handbrake ramp per second while released
pub const POWERSLIDE_FALL_RATE: f32 = 2.0;

// ---------------------------------------------------------------------------
// Hitboxes
// ---------------------------------------------------------------------------

/// Maximum per-axis deviation (uu) for a box to count as a known hitbox
pub const HITBOX_MATCH_TOLERANCE: f32 = 0.01;

/// Box dimensions of each hitbox class, in detection order.
pub const HITBOX_SHAPES: [(HitboxType, BoxShape); 6] = [
    (HitboxType::Octane, BoxShape::new(118.00738, 84.19941, 36.159073)),
    (HitboxType::Dominus, BoxShape::new(127.92678, 83.27995, 31.3)),
    (HitboxType::Plank, BoxShape::new(128.81978, 84.670364, 29.394402)),
    (HitboxType::Breakout, BoxShape::new(131.49236, 80.521, 30.3)),
    (HitboxType::Hybrid, BoxShape::new(127.01919, 82.18787, 34.159073)),
    (HitboxType::Merc, BoxShape::new(120.72023, 76.71031, 41.659073)),
];

// ---------------------------------------------------------------------------
// Standard arena boost pads
// ---------------------------------------------------------------------------

/// Canonical pad order for the standard arena.
///
/// Pad `i` and pad `33 - i` are point reflections of each other through the
/// field centre, so reversing the array gives the other team's view.
pub const BOOST_LOCATIONS: [[f32; 3]; 34] = [
    [0.0, -4240.0, 70.0],
    [-1792.0, -4184.0, 70.0],
    [1792.0, -4184.0, 70.0],
    [-3072.0, -4096.0, 73.0],
    [3072.0, -4096.0, 73.0],
    [-940.0, -3308.0, 70.0],
    [940.0, -3308.0, 70.0],
    [0.0, -2816.0, 70.0],
    [-3584.0, -2484.0, 70.0],
    [3584.0, -2484.0, 70.0],
    [-1788.0, -2300.0, 70.0],
    [1788.0, -2300.0, 70.0],
    [-2048.0, -1036.0, 70.0],
    [0.0, -1024.0, 70.0],
    [2048.0, -1036.0, 70.0],
    [-3584.0, 0.0, 73.0],
    [-1024.0, 0.0, 70.0],
    [1024.0, 0.0, 70.0],
    [3584.0, 0.0, 73.0],
    [-2048.0, 1036.0, 70.0],
    [0.0, 1024.0, 70.0],
    [2048.0, 1036.0, 70.0],
    [-1788.0, 2300.0, 70.0],
    [1788.0, 2300.0, 70.0],
    [-3584.0, 2484.0, 70.0],
    [3584.0, 2484.0, 70.0],
    [0.0, 2816.0, 70.0],
    [-940.0, 3310.0, 70.0],
    [940.0, 3308.0, 70.0],
    [-3072.0, 4096.0, 73.0],
    [3072.0, 4096.0, 73.0],
    [-1792.0, 4184.0, 70.0],
    [1792.0, 4184.0, 70.0],
    [0.0, 4240.0, 70.0],
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boost_table_is_point_symmetric() {
        let n = BOOST_LOCATIONS.len();
        for (i, pad) in BOOST_LOCATIONS.iter().enumerate() {
            let mirror = BOOST_LOCATIONS[n - 1 - i];
            assert!((pad[0] + mirror[0]).abs() <= 2.0, "pad {i} x");
            assert!((pad[1] + mirror[1]).abs() <= 2.0, "pad {i} y");
        }
    }

    #[test]
    fn min_boost_is_twelve_ticks() {
        assert!((MIN_BOOST_TIME / TICK_TIME - 12.0).abs() < 1e-3);
    }
}
