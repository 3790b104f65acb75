//! Car: persistent per-vehicle record and its per-observation update.
//!
//! A record is created the first time a spawn ID appears and is mutated on
//! every packet that contains that spawn ID. Team and hitbox are fixed at
//! creation.
//!
//! # Unsupported fields
//! The interface has no way to report which car was bumped or the state of
//! the turtle auto-flip. `bump_victim_id`, `is_autoflipping`,
//! `autoflip_timer` and `autoflip_direction` are never written after
//! creation.

use crate::{
    air_state::{self, JumpState},
    constants::{
        HITBOX_MATCH_TOLERANCE, HITBOX_SHAPES, MIN_BOOST_TIME, POWERSLIDE_FALL_RATE,
        POWERSLIDE_RISE_RATE, TICKS_PER_SECOND, TICK_TIME,
    },
    physics::Pose,
    types::{HitboxType, SpawnId, Team, Vec3},
};
use bot_packet::{AirState, BoxShape, PlayerInfo, Touch};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Identify the hitbox class from the body dimensions.
///
/// First class within [`HITBOX_MATCH_TOLERANCE`] on every axis wins; an
/// unknown body falls back to Octane.
pub fn detect_hitbox(shape: &BoxShape) -> HitboxType {
    HITBOX_SHAPES
        .iter()
        .find(|(_, known)| {
            (shape.length - known.length).abs() <= HITBOX_MATCH_TOLERANCE
                && (shape.width - known.width).abs() <= HITBOX_MATCH_TOLERANCE
                && (shape.height - known.height).abs() <= HITBOX_MATCH_TOLERANCE
        })
        .map(|(kind, _)| *kind)
        .unwrap_or(HitboxType::Octane)
}

/// Nearest whole tick of a game timestamp; negative times map to tick 0.
fn seconds_to_ticks(seconds: f32) -> u64 {
    (f64::from(seconds) * f64::from(TICKS_PER_SECOND))
        .round()
        .max(0.0) as u64
}

/// Reconstructed state of one car.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub team: Team,
    pub hitbox_type: HitboxType,
    /// Ticks with a ball touch within the last `tick_skip` ticks
    pub ball_touches: u32,
    pub bump_victim_id: Option<SpawnId>,

    /// Seconds until respawn, 0 when alive
    pub demo_respawn_timer: f32,
    /// Time spent continuously supersonic (s)
    pub supersonic_time: f32,
    /// Boost amount in [0, 1]
    pub boost_amount: f32,
    /// Time boost has been continuously active (s)
    pub boost_active_time: f32,
    /// Powerslide ramp in [0, 1]
    pub handbrake: f32,
    /// Jump input held on the last tick
    pub is_holding_jump: bool,
    pub jump: JumpState,

    pub is_autoflipping: bool,
    pub autoflip_timer: f32,
    pub autoflip_direction: f32,

    pub physics: Pose,
    pub inverted_physics: Pose,

    tick_skip: usize,
    /// Oldest first, newest last
    ball_touch_ticks: VecDeque<bool>,
    prev_air_state: AirState,
    /// Game clock in whole ticks, advanced by elapsed ticks
    clock_ticks: u64,
}

impl Car {
    /// Create a record for a car seen for the first time.
    pub fn new(player: &PlayerInfo, game_seconds: f32, tick_skip: usize) -> Self {
        let physics = Pose::from_car_physics(&player.physics);
        let inverted_physics = physics.mirrored();
        Self {
            team: Team::from(player.team),
            hitbox_type: detect_hitbox(&player.hitbox),
            ball_touches: 0,
            bump_victim_id: None,
            demo_respawn_timer: 0.0,
            supersonic_time: 0.0,
            boost_amount: player.boost / 100.0,
            boost_active_time: 0.0,
            handbrake: 0.0,
            is_holding_jump: false,
            jump: JumpState::default(),
            is_autoflipping: false,
            autoflip_timer: 0.0,
            autoflip_direction: 0.0,
            physics,
            inverted_physics,
            tick_skip,
            ball_touch_ticks: VecDeque::from(vec![false; tick_skip]),
            prev_air_state: player.air_state,
            clock_ticks: seconds_to_ticks(game_seconds),
        }
    }

    /// Fold one observation of this car into the record.
    ///
    /// `latest_touch` must belong to this car; `ticks_elapsed` is the number of
    /// physics ticks since the previous observation.
    pub fn update(
        &mut self,
        player: &PlayerInfo,
        latest_touch: Option<&Touch>,
        ticks_elapsed: u32,
    ) {
        let elapsed = TICK_TIME * ticks_elapsed as f32;
        self.clock_ticks += u64::from(ticks_elapsed);

        self.advance_touch_window(ticks_elapsed, latest_touch);

        self.demo_respawn_timer = player.demolished_timeout.max(0.0);

        if player.is_supersonic {
            self.supersonic_time += elapsed;
        } else {
            self.supersonic_time = 0.0;
        }

        self.boost_amount = player.boost / 100.0;
        self.update_boost(player.last_input.boost, elapsed);
        self.update_handbrake(player.last_input.handbrake, elapsed);

        self.is_holding_jump = player.last_input.jump;
        self.jump = air_state::transition(
            &self.jump,
            self.prev_air_state,
            player.air_state,
            &player.last_input,
            elapsed,
        );

        self.physics = Pose::from_car_physics(&player.physics);
        self.inverted_physics = self.physics.mirrored();

        self.prev_air_state = player.air_state;
    }

    fn advance_touch_window(&mut self, ticks_elapsed: u32, latest_touch: Option<&Touch>) {
        let shift = (ticks_elapsed as usize).min(self.tick_skip);
        for _ in 0..shift {
            self.ball_touch_ticks.pop_front();
            self.ball_touch_ticks.push_back(false);
        }

        if let Some(touch) = latest_touch {
            // touches stamped after the clock count as this tick
            let ticks_since_touch = self
                .clock_ticks
                .saturating_sub(seconds_to_ticks(touch.game_seconds))
                as usize;
            if ticks_since_touch < self.tick_skip {
                let idx = self.ball_touch_ticks.len() - 1 - ticks_since_touch;
                self.ball_touch_ticks[idx] = true;
            }
        }

        self.ball_touches = self.ball_touch_ticks.iter().filter(|&&t| t).count() as u32;
    }

    fn update_boost(&mut self, boost_held: bool, elapsed: f32) {
        if self.boost_active_time > 0.0 {
            // boost stays on for at least MIN_BOOST_TIME after a press
            if !boost_held && self.boost_active_time + f32::EPSILON >= MIN_BOOST_TIME {
                self.boost_active_time = 0.0;
            } else {
                self.boost_active_time += elapsed;
            }
        } else if boost_held {
            self.boost_active_time = elapsed;
        }
    }

    fn update_handbrake(&mut self, held: bool, elapsed: f32) {
        if held {
            self.handbrake += POWERSLIDE_RISE_RATE * elapsed;
        } else {
            self.handbrake -= POWERSLIDE_FALL_RATE * elapsed;
        }
        self.handbrake = self.handbrake.clamp(0.0, 1.0);
    }

    // -----------------------------------------------------------------------
    // Derived state
    // -----------------------------------------------------------------------

    pub fn is_blue(&self) -> bool {
        self.team == Team::Blue
    }

    pub fn is_orange(&self) -> bool {
        self.team == Team::Orange
    }

    pub fn is_demoed(&self) -> bool {
        self.demo_respawn_timer > 0.0
    }

    pub fn is_boosting(&self) -> bool {
        self.boost_active_time > 0.0
    }

    pub fn is_supersonic(&self) -> bool {
        self.supersonic_time > 0.0
    }

    pub fn on_ground(&self) -> bool {
        self.jump.on_ground
    }

    pub fn has_jumped(&self) -> bool {
        self.jump.has_jumped
    }

    pub fn has_flipped(&self) -> bool {
        self.jump.has_flipped
    }

    pub fn has_double_jumped(&self) -> bool {
        self.jump.has_double_jumped
    }

    pub fn can_flip(&self) -> bool {
        self.jump.can_flip()
    }

    pub fn is_flipping(&self) -> bool {
        self.jump.is_flipping()
    }

    pub fn flip_torque(&self) -> Vec3 {
        self.jump.flip_torque
    }

    /// Always false: bump victims are not reported by the interface.
    pub fn had_car_contact(&self) -> bool {
        self.bump_victim_id.is_some()
    }

    pub fn tick_skip(&self) -> usize {
        self.tick_skip
    }

    /// Game clock of the last update, in ticks.
    pub fn clock_ticks(&self) -> u64 {
        self.clock_ticks
    }

    /// Air state seen on the last update.
    pub fn prev_air_state(&self) -> AirState {
        self.prev_air_state
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use bot_packet::ControllerState;
    use proptest::prelude::*;

    fn player() -> PlayerInfo {
        PlayerInfo {
            spawn_id: 1,
            team: 1,
            boost: 33.0,
            demolished_timeout: -1.0,
            hitbox: HITBOX_SHAPES[3].1,
            ..Default::default()
        }
    }

    fn with_input(input: ControllerState) -> PlayerInfo {
        PlayerInfo {
            last_input: input,
            ..player()
        }
    }

    fn touch_at(t: f32) -> Touch {
        Touch {
            game_seconds: t,
            ..Default::default()
        }
    }

    #[test]
    fn creation_detects_team_and_hitbox() {
        let car = Car::new(&player(), 0.0, 8);
        assert_eq!(car.team, Team::Orange);
        assert!(car.is_orange());
        assert_eq!(car.hitbox_type, HitboxType::Breakout);
        assert_abs_diff_eq!(car.boost_amount, 0.33, epsilon = 1e-6);
    }

    #[test]
    fn every_known_hitbox_detected() {
        for (kind, shape) in HITBOX_SHAPES {
            assert_eq!(detect_hitbox(&shape), kind);
        }
    }

    #[test]
    fn unknown_hitbox_falls_back_to_octane() {
        assert_eq!(detect_hitbox(&BoxShape::new(1.0, 2.0, 3.0)), HitboxType::Octane);
    }

    #[test]
    fn demolished_timeout_maps_to_timer() {
        let mut car = Car::new(&player(), 0.0, 8);
        car.update(&player(), None, 1);
        assert_eq!(car.demo_respawn_timer, 0.0);
        assert!(!car.is_demoed());

        let demoed = PlayerInfo {
            demolished_timeout: 2.5,
            ..player()
        };
        car.update(&demoed, None, 1);
        assert_eq!(car.demo_respawn_timer, 2.5);
        assert!(car.is_demoed());
    }

    #[test]
    fn supersonic_time_accumulates_and_resets() {
        let mut car = Car::new(&player(), 0.0, 8);
        let fast = PlayerInfo {
            is_supersonic: true,
            ..player()
        };
        car.update(&fast, None, 8);
        car.update(&fast, None, 8);
        assert_abs_diff_eq!(car.supersonic_time, 16.0 * TICK_TIME, epsilon = 1e-6);
        car.update(&player(), None, 8);
        assert_eq!(car.supersonic_time, 0.0);
    }

    #[test]
    fn touch_marks_window_slot() {
        let mut car = Car::new(&player(), 10.0, 8);
        // clock becomes 10 + 8 ticks; touch happened 3 ticks ago
        let t = 10.0 + 5.0 * TICK_TIME;
        car.update(&player(), Some(&touch_at(t)), 8);
        assert_eq!(car.ball_touches, 1);

        // the same touch is out of the window 8 ticks later
        car.update(&player(), Some(&touch_at(t)), 8);
        assert_eq!(car.ball_touches, 0);
    }

    #[test]
    fn touches_count_distinct_ticks() {
        let mut car = Car::new(&player(), 0.0, 8);
        car.update(&player(), Some(&touch_at(0.0)), 1);
        car.update(&player(), Some(&touch_at(2.0 * TICK_TIME)), 1);
        assert_eq!(car.ball_touches, 2);
        // window slides past the first touch after 7 more ticks
        car.update(&player(), None, 7);
        assert_eq!(car.ball_touches, 1);
    }

    #[test]
    fn clock_holds_over_long_match() {
        let mut car = Car::new(&player(), 0.0, 8);
        // ten minutes of 8-tick packets
        for _ in 0..9000 {
            car.update(&player(), None, 8);
        }
        assert_eq!(car.clock_ticks(), 72_000);

        // touch 7 ticks old is still inside the window
        let t = 71_993.0 * TICK_TIME;
        car.update(&player(), Some(&touch_at(t)), 0);
        assert_eq!(car.ball_touches, 1);
    }

    #[test]
    fn stale_touch_ignored() {
        let mut car = Car::new(&player(), 5.0, 8);
        car.update(&player(), Some(&touch_at(1.0)), 1);
        assert_eq!(car.ball_touches, 0);
    }

    #[test]
    fn boost_held_for_minimum_duration() {
        let press = with_input(ControllerState {
            boost: true,
            ..Default::default()
        });
        let release = player();
        let mut car = Car::new(&release, 0.0, 1);

        car.update(&press, None, 1);
        assert!(car.is_boosting());
        // released after a tap: boost stays active until 12 ticks have passed
        for _ in 0..11 {
            car.update(&release, None, 1);
            assert!(car.is_boosting());
        }
        car.update(&release, None, 1);
        assert!(!car.is_boosting());
    }

    #[test]
    fn fresh_press_sets_elapsed() {
        let press = with_input(ControllerState {
            boost: true,
            ..Default::default()
        });
        let mut car = Car::new(&player(), 0.0, 8);
        car.update(&press, None, 8);
        assert_abs_diff_eq!(car.boost_active_time, 8.0 * TICK_TIME, epsilon = 1e-7);
        car.update(&press, None, 8);
        assert_abs_diff_eq!(car.boost_active_time, 16.0 * TICK_TIME, epsilon = 1e-6);
    }

    #[test]
    fn handbrake_ramps() {
        let held = with_input(ControllerState {
            handbrake: true,
            ..Default::default()
        });
        let mut car = Car::new(&player(), 0.0, 8);
        car.update(&held, None, 12);
        assert_abs_diff_eq!(car.handbrake, 0.5, epsilon = 1e-5);
        car.update(&held, None, 120);
        assert_eq!(car.handbrake, 1.0);
        car.update(&player(), None, 30);
        assert_abs_diff_eq!(car.handbrake, 0.5, epsilon = 1e-5);
    }

    #[test]
    fn air_state_sequence_through_record() {
        let mut car = Car::new(&player(), 0.0, 8);
        let tags = [
            AirState::OnGround,
            AirState::Jumping,
            AirState::InAir,
            AirState::DoubleJumping,
        ];
        for (i, tag) in tags.into_iter().enumerate() {
            let p = PlayerInfo {
                air_state: tag,
                ..player()
            };
            car.update(&p, None, 1);
            if i == 1 {
                assert!(car.has_jumped());
            }
        }
        assert!(car.has_double_jumped());
        assert!(!car.can_flip());
        assert_eq!(car.prev_air_state(), AirState::DoubleJumping);
    }

    #[test]
    fn unsupported_fields_untouched() {
        let mut car = Car::new(&player(), 0.0, 8);
        car.update(&player(), None, 8);
        assert_eq!(car.bump_victim_id, None);
        assert!(!car.had_car_contact());
        assert!(!car.is_autoflipping);
        assert_eq!(car.autoflip_timer, 0.0);
    }

    #[test]
    fn inverted_physics_tracks_physics() {
        let mut p = player();
        p.physics.location.x = 300.0;
        p.physics.location.y = -1000.0;
        let mut car = Car::new(&player(), 0.0, 8);
        car.update(&p, None, 1);
        assert_eq!(car.inverted_physics.position, Vec3::new(-300.0, 1000.0, 0.0));
    }

    proptest! {
        #[test]
        fn prop_touch_count_within_window(
            tick_skip in 1usize..16,
            steps in proptest::collection::vec((0u32..20, proptest::option::of(0u32..24)), 1..60),
        ) {
            let mut car = Car::new(&player(), 0.0, tick_skip);
            let mut clock = 0.0f32;
            for (ticks, touch_ago) in steps {
                clock += ticks as f32 * TICK_TIME;
                let touch = touch_ago.map(|ago| touch_at(clock - ago as f32 * TICK_TIME));
                car.update(&player(), touch.as_ref(), ticks);
                prop_assert!(car.ball_touches as usize <= tick_skip);
            }
        }

        #[test]
        fn prop_handbrake_bounded(
            start in -2.0f32..3.0,
            steps in proptest::collection::vec((any::<bool>(), 0u32..200), 1..50),
        ) {
            let mut car = Car::new(&player(), 0.0, 8);
            car.handbrake = start;
            for (held, ticks) in steps {
                let p = with_input(ControllerState { handbrake: held, ..Default::default() });
                car.update(&p, None, ticks);
                prop_assert!((0.0..=1.0).contains(&car.handbrake));
            }
        }
    }
}
