//! Jump / flip inference driven by the coarse air-state tag.
//!
//! The interface only reports which phase a car is in. Everything else
//! (how long the jump was held, whether a flip is still available, the dodge
//! torque axis) is reconstructed here from the sequence of tags.
//!
//! # Transitions
//! | new tag         | effect                                                       |
//! |-----------------|--------------------------------------------------------------|
//! | `OnGround`      | clear jump/flip flags, reset air time and flip timer          |
//! | `Jumping`       | restart jump timer when leaving the ground, accumulate it     |
//! | `InAir`         | airborne, jump no longer held                                 |
//! | `Dodging`       | on entry: restart flip timer, compute torque axis             |
//! | `DoubleJumping` | mark double jump used                                         |

use crate::{
    constants::{
        DODGE_DEADZONE, DOUBLEJUMP_MAX_DELAY, FLIP_TORQUE_TIME, JUMP_GROUND_TICKS,
        JUMP_RESET_TIME_PAD, MIN_JUMP_TIME, TICK_TIME,
    },
    types::Vec3,
};
use bot_packet::{AirState, ControllerState};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Jump and flip part of a car record.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JumpState {
    pub on_ground: bool,
    pub has_jumped: bool,
    /// Jump currently providing upward force
    pub is_jumping: bool,
    /// Duration of the last jump; kept after landing for the landing cooldown
    pub jump_time: f32,
    pub has_flipped: bool,
    pub has_double_jumped: bool,
    pub air_time_since_jump: f32,
    pub flip_time: f32,
    /// Dodge torque axis, zero for a stall
    pub flip_torque: Vec3,
}

impl Default for JumpState {
    fn default() -> Self {
        Self {
            on_ground: false,
            has_jumped: false,
            is_jumping: false,
            jump_time: 0.0,
            has_flipped: false,
            has_double_jumped: false,
            air_time_since_jump: 0.0,
            flip_time: 0.0,
            flip_torque: Vec3::zeros(),
        }
    }
}

impl JumpState {
    /// A flip or double jump is still available.
    pub fn can_flip(&self) -> bool {
        !self.has_double_jumped
            && !self.has_flipped
            && self.air_time_since_jump < DOUBLEJUMP_MAX_DELAY
    }

    /// Dodge torque is still being applied.
    pub fn is_flipping(&self) -> bool {
        self.has_flipped && self.flip_time < FLIP_TORQUE_TIME
    }
}

/// Torque axis for a dodge started with `input`.
///
/// The dodge direction is `(-pitch, yaw + roll)`. When both components are
/// inside the deadzone the dodge is a stall and produces no torque.
pub fn dodge_torque(input: &ControllerState) -> Vec3 {
    let dir = Vector2::new(-input.pitch, input.yaw + input.roll);
    if dir.x.abs() < DODGE_DEADZONE && dir.y.abs() < DODGE_DEADZONE {
        return Vec3::zeros();
    }
    let dir = dir.normalize();
    Vec3::new(-dir.y, dir.x, 0.0)
}

/// Advance `state` by one observation in which the tag moved `prev → next`
/// over `elapsed` seconds.
pub fn transition(
    state: &JumpState,
    prev: AirState,
    next: AirState,
    input: &ControllerState,
    elapsed: f32,
) -> JumpState {
    let mut s = *state;

    match next {
        AirState::OnGround => {
            s.on_ground = true;
            s.is_jumping = false;
            // Landing cooldown: a long jump keeps has_jumped through the landing tick.
            let long_jump = s.jump_time > MIN_JUMP_TIME + JUMP_RESET_TIME_PAD;
            if !(long_jump && prev != AirState::OnGround) {
                s.has_jumped = false;
            }
            s.has_flipped = false;
            s.has_double_jumped = false;
            s.air_time_since_jump = 0.0;
            s.flip_time = 0.0;
        }
        AirState::Jumping => {
            if prev == AirState::OnGround {
                s.jump_time = 0.0;
            }
            s.jump_time += elapsed;
            // wheels stay in contact for the first few ticks of a jump
            s.on_ground = s.jump_time < (JUMP_GROUND_TICKS + 0.5) * TICK_TIME;
            s.is_jumping = true;
            s.has_jumped = true;
        }
        AirState::InAir => {
            s.on_ground = false;
            s.is_jumping = false;
        }
        AirState::Dodging => {
            s.on_ground = false;
            s.is_jumping = false;
            if prev != AirState::Dodging {
                s.flip_time = 0.0;
                s.flip_torque = dodge_torque(input);
            }
            s.has_flipped = true;
        }
        AirState::DoubleJumping => {
            s.on_ground = false;
            s.is_jumping = false;
            s.has_double_jumped = true;
        }
    }

    if s.has_jumped && !s.is_jumping {
        s.air_time_since_jump += elapsed;
    } else {
        s.air_time_since_jump = 0.0;
    }

    if s.has_flipped {
        s.flip_time += elapsed;
    }

    s
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bot_packet::AirState::*;

    const DT: f32 = TICK_TIME;

    fn idle() -> ControllerState {
        ControllerState::default()
    }

    fn run(tags: &[AirState]) -> JumpState {
        let mut s = JumpState::default();
        let mut prev = OnGround;
        for &tag in tags {
            s = transition(&s, prev, tag, &idle(), DT);
            prev = tag;
        }
        s
    }

    #[test]
    fn on_ground_clears_flags() {
        let s = JumpState {
            has_flipped: true,
            has_double_jumped: true,
            is_jumping: true,
            air_time_since_jump: 0.4,
            flip_time: 0.3,
            ..Default::default()
        };
        let s = transition(&s, InAir, OnGround, &idle(), DT);
        assert!(s.on_ground);
        assert!(!s.is_jumping);
        assert!(!s.has_flipped);
        assert!(!s.has_double_jumped);
        assert_eq!(s.flip_time, 0.0);
        assert_eq!(s.air_time_since_jump, 0.0);
    }

    #[test]
    fn jump_timer_restarts_when_leaving_ground() {
        let s = JumpState {
            jump_time: 0.5,
            ..Default::default()
        };
        let s = transition(&s, OnGround, Jumping, &idle(), DT);
        assert_abs_diff_eq!(s.jump_time, DT, epsilon = 1e-7);
        assert!(s.has_jumped);
        assert!(s.is_jumping);

        let s = transition(&s, Jumping, Jumping, &idle(), 2.0 * DT);
        assert_abs_diff_eq!(s.jump_time, 3.0 * DT, epsilon = 1e-7);
    }

    #[test]
    fn grounded_only_for_first_six_jump_ticks() {
        let mut s = JumpState::default();
        let mut prev = OnGround;
        for tick in 1..=8 {
            s = transition(&s, prev, Jumping, &idle(), DT);
            prev = Jumping;
            assert_eq!(s.on_ground, tick <= 6, "tick {tick}");
        }
    }

    #[test]
    fn in_air_releases_jump() {
        let s = run(&[Jumping, InAir]);
        assert!(!s.on_ground);
        assert!(!s.is_jumping);
        assert!(s.has_jumped);
        assert_abs_diff_eq!(s.air_time_since_jump, DT, epsilon = 1e-7);
    }

    #[test]
    fn jump_then_double_jump_sequence() {
        let mut s = JumpState::default();
        let mut prev = OnGround;
        for (i, tag) in [OnGround, Jumping, InAir, DoubleJumping].into_iter().enumerate() {
            s = transition(&s, prev, tag, &idle(), DT);
            prev = tag;
            if i == 1 {
                assert!(s.has_jumped, "has_jumped after tick 2");
            }
        }
        assert!(s.has_double_jumped);
        assert!(!s.can_flip());
    }

    #[test]
    fn flip_available_until_delay_expires() {
        let mut s = run(&[Jumping, InAir]);
        assert!(s.can_flip());
        // 1.25 s of air time = 150 ticks
        for _ in 0..150 {
            s = transition(&s, InAir, InAir, &idle(), DT);
        }
        assert!(!s.can_flip());
    }

    #[test]
    fn stall_input_gives_no_torque() {
        let input = ControllerState {
            pitch: -0.05,
            yaw: 0.02,
            roll: 0.01,
            ..Default::default()
        };
        let s = transition(&run(&[Jumping, InAir]), InAir, Dodging, &input, DT);
        assert_eq!(s.flip_torque, Vec3::zeros());
        assert!(s.has_flipped);
    }

    #[test]
    fn front_flip_torque_axis() {
        let input = ControllerState {
            pitch: -1.0,
            ..Default::default()
        };
        let s = transition(&run(&[Jumping, InAir]), InAir, Dodging, &input, DT);
        assert_abs_diff_eq!(s.flip_torque, Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-6);
        assert!(s.is_flipping());
        assert!(!s.can_flip());
    }

    #[test]
    fn diagonal_torque_is_normalized() {
        let input = ControllerState {
            pitch: -1.0,
            yaw: 1.0,
            ..Default::default()
        };
        let t = dodge_torque(&input);
        assert_abs_diff_eq!(t.norm(), 1.0, epsilon = 1e-6);
        assert_eq!(t.z, 0.0);
    }

    #[test]
    fn torque_fixed_for_duration_of_dodge() {
        let start = ControllerState {
            pitch: -1.0,
            ..Default::default()
        };
        let later = ControllerState {
            yaw: 1.0,
            ..Default::default()
        };
        let s = transition(&run(&[Jumping, InAir]), InAir, Dodging, &start, DT);
        let s2 = transition(&s, Dodging, Dodging, &later, DT);
        assert_eq!(s2.flip_torque, s.flip_torque);
        assert_abs_diff_eq!(s2.flip_time, 2.0 * DT, epsilon = 1e-7);
    }

    #[test]
    fn flip_torque_expires() {
        let input = ControllerState {
            pitch: -1.0,
            ..Default::default()
        };
        let mut s = transition(&run(&[Jumping, InAir]), InAir, Dodging, &input, DT);
        for _ in 0..80 {
            s = transition(&s, Dodging, Dodging, &input, DT);
        }
        assert!(s.has_flipped);
        assert!(!s.is_flipping());
    }

    #[test]
    fn short_jump_landing_clears_immediately() {
        // one tick of jump: well under MIN_JUMP_TIME + pad
        let s = run(&[Jumping, InAir, OnGround]);
        assert!(!s.has_jumped);
    }

    #[test]
    fn long_jump_landing_holds_one_update() {
        let mut tags = vec![Jumping; 10];
        tags.push(InAir);
        tags.push(OnGround);
        let s = run(&tags);
        assert!(s.jump_time > MIN_JUMP_TIME + JUMP_RESET_TIME_PAD);
        assert!(s.has_jumped, "still set on the landing update");

        let s = transition(&s, OnGround, OnGround, &idle(), DT);
        assert!(!s.has_jumped, "cleared on the following update");
    }
}
