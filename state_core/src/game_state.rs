//! Aggregate decoder: one [`GameState`] per match, one [`Frame`] per packet.
//!
//! # Processing steps per packet
//! 1. Elapsed ticks from the frame counter (zero on the first call)
//! 2. Grow entity capacity to cover the packet's roster
//! 3. Scores and boost pads (canonical order + mirror)
//! 4. Ball pose + mirror
//! 5. Per-entity update, keyed by spawn ID
//! 6. Last-touch attribution

use crate::{
    arena::{EntityArena, EntitySlot, TickCounters},
    boost_pads::BoostPadMap,
    car::Car,
    config::{DecoderConfig, FrameRegressionPolicy},
    error::{ConfigError, DecodeError},
    physics::Pose,
    types::SpawnId,
};
use bot_packet::{FieldInfo, GameInfo, GamePacket, GameStateType, PlayerInfo, ScoreInfo};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{trace, warn};

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Decoded state of one car in one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerFrame {
    pub car: Car,
    /// Touched the ball within the last tick-skip window
    pub ball_touched: bool,
    /// Boost pickups counted so far this match
    pub boost_pickups: u32,
    pub score: ScoreInfo,
    pub counters: TickCounters,
    /// Tick-counter estimate of ground contact
    pub on_ground: bool,
}

impl PlayerFrame {
    pub fn has_jump(&self) -> bool {
        self.counters.has_jump()
    }

    pub fn has_flip(&self) -> bool {
        self.counters.has_flip()
    }
}

/// Everything decoded from one packet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Frame {
    pub frame_num: u32,
    pub ticks_elapsed: u32,
    pub game_seconds: f32,
    pub game_state_type: GameStateType,
    pub blue_score: u32,
    pub orange_score: u32,
    pub last_touch: Option<SpawnId>,
    pub ball: Pose,
    pub inverted_ball: Pose,
    pub boost_pads: Vec<bool>,
    pub inverted_boost_pads: Vec<bool>,
    pub boost_pad_timers: Vec<f32>,
    pub inverted_boost_pad_timers: Vec<f32>,
    /// Entities present in this packet only
    pub players: BTreeMap<SpawnId, PlayerFrame>,
}

impl Frame {
    pub fn player(&self, id: SpawnId) -> Option<&PlayerFrame> {
        self.players.get(&id)
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Persistent decoder state for one match.
#[derive(Debug)]
pub struct GameState {
    config: DecoderConfig,
    pad_map: BoostPadMap,
    arena: EntityArena,
    last_frame_num: Option<u32>,
    last_touch: Option<SpawnId>,
    ball: Pose,
    inverted_ball: Pose,
    boost_pads: Vec<bool>,
    boost_pad_timers: Vec<f32>,
}

impl GameState {
    /// Build a decoder for the arena described by `field`.
    pub fn new(field: &FieldInfo, config: DecoderConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pad_map = if config.standard_map {
            BoostPadMap::standard(field, config.pad_match_tolerance)?
        } else {
            BoostPadMap::identity(field)
        };
        let num_pads = pad_map.len();
        Ok(Self {
            arena: EntityArena::with_capacity(config.initial_capacity),
            config,
            pad_map,
            last_frame_num: None,
            last_touch: None,
            ball: Pose::default(),
            inverted_ball: Pose::default(),
            boost_pads: vec![false; num_pads],
            boost_pad_timers: vec![0.0; num_pads],
        })
    }

    /// Fold `packet` into the persistent state and return the decoded frame.
    pub fn decode(&mut self, packet: &GamePacket) -> Result<Frame, DecodeError> {
        let info = &packet.game_info;

        // ----------------------------------------------------------------
        // Step 1: elapsed ticks
        // ----------------------------------------------------------------
        let ticks_elapsed = self.ticks_since_last(info.frame_num)?;
        self.last_frame_num = Some(info.frame_num);
        trace!(
            frame = info.frame_num,
            ticks_elapsed,
            players = packet.players.len(),
            "decoding packet"
        );

        // ----------------------------------------------------------------
        // Step 2: capacity
        // ----------------------------------------------------------------
        self.arena.reserve_for(packet.players.len());

        // ----------------------------------------------------------------
        // Step 3: pads
        // ----------------------------------------------------------------
        self.pad_map
            .apply(&packet.boost_pads, &mut self.boost_pads, &mut self.boost_pad_timers);

        // ----------------------------------------------------------------
        // Step 4: ball
        // ----------------------------------------------------------------
        if let Some(ball) = packet.balls.first() {
            self.ball = Pose::from_ball_physics(&ball.physics);
            self.inverted_ball = self.ball.mirrored();
        }

        // ----------------------------------------------------------------
        // Step 5: entities
        // ----------------------------------------------------------------
        let live = info.game_state_type.is_live();
        let window = self.config.tick_skip_time();
        let mut players = BTreeMap::new();
        for player in &packet.players {
            let id = SpawnId(player.spawn_id);
            let ball_touched = player
                .latest_touch
                .is_some_and(|t| info.seconds_elapsed - t.game_seconds < window);
            let (slot, entity_ticks) = self.update_entity(player, info, live);
            let on_ground = slot.counters.advance(player.air_state, entity_ticks);
            players.insert(
                id,
                PlayerFrame {
                    car: slot.car.clone(),
                    ball_touched,
                    boost_pickups: slot.boost_pickups,
                    score: slot.score,
                    counters: slot.counters,
                    on_ground,
                },
            );
        }

        // ----------------------------------------------------------------
        // Step 6: last touch
        // ----------------------------------------------------------------
        if let Some(id) = latest_toucher(&packet.players) {
            self.last_touch = Some(id);
        }

        Ok(Frame {
            frame_num: info.frame_num,
            ticks_elapsed,
            game_seconds: info.seconds_elapsed,
            game_state_type: info.game_state_type,
            blue_score: packet.team_score(0),
            orange_score: packet.team_score(1),
            last_touch: self.last_touch,
            ball: self.ball.clone(),
            inverted_ball: self.inverted_ball.clone(),
            boost_pads: self.boost_pads.clone(),
            inverted_boost_pads: self.boost_pads.iter().rev().copied().collect(),
            boost_pad_timers: self.boost_pad_timers.clone(),
            inverted_boost_pad_timers: self.boost_pad_timers.iter().rev().copied().collect(),
            players,
        })
    }

    fn ticks_since_last(&self, frame_num: u32) -> Result<u32, DecodeError> {
        let Some(previous) = self.last_frame_num else {
            return Ok(0);
        };
        if frame_num >= previous {
            return Ok(frame_num - previous);
        }
        match self.config.frame_regression {
            FrameRegressionPolicy::Clamp => {
                warn!(
                    previous,
                    current = frame_num,
                    "frame counter regressed; assuming no ticks elapsed"
                );
                Ok(0)
            }
            FrameRegressionPolicy::Reject => Err(DecodeError::FrameRegression {
                previous,
                current: frame_num,
            }),
        }
    }

    /// Returns the slot and the ticks since the entity was last observed.
    fn update_entity(
        &mut self,
        player: &PlayerInfo,
        info: &GameInfo,
        live: bool,
    ) -> (&mut EntitySlot, u32) {
        let id = SpawnId(player.spawn_id);
        let touch = player.latest_touch.as_ref();
        let tick_skip = self.config.tick_skip;

        let (slot, created) = self.arena.get_or_insert_with(id, || {
            EntitySlot::new(id, Car::new(player, info.seconds_elapsed, tick_skip))
        });
        let ticks = if created {
            0
        } else {
            // a regressed counter saturates to 0, matching the clamp policy
            info.frame_num.saturating_sub(slot.last_seen_frame)
        };
        slot.last_seen_frame = info.frame_num;

        if !created && live && player.boost / 100.0 > slot.car.boost_amount {
            // approximate: any rise in boost is one pickup
            slot.boost_pickups += 1;
        }
        slot.car.update(player, touch, ticks);
        slot.score = player.score_info;
        if let Some(t) = touch {
            slot.last_ball_touch_time = Some(t.game_seconds);
        }
        (slot, ticks)
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn car(&self, id: SpawnId) -> Option<&Car> {
        self.arena.get(id).map(|slot| &slot.car)
    }

    /// Every tracked car, including ones absent from the latest packet.
    pub fn cars(&self) -> impl Iterator<Item = (SpawnId, &Car)> {
        self.arena.iter().map(|slot| (slot.id, &slot.car))
    }

    pub fn slot(&self, id: SpawnId) -> Option<&EntitySlot> {
        self.arena.get(id)
    }

    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    pub fn tracked_count(&self) -> usize {
        self.arena.len()
    }

    pub fn last_touch(&self) -> Option<SpawnId> {
        self.last_touch
    }

    pub fn pad_map(&self) -> &BoostPadMap {
        &self.pad_map
    }
}

/// Spawn ID with the most recent touch; ties go to the lowest ID.
fn latest_toucher(players: &[PlayerInfo]) -> Option<SpawnId> {
    players
        .iter()
        .filter_map(|p| p.latest_touch.map(|t| (SpawnId(p.spawn_id), t.game_seconds)))
        .fold(None, |best: Option<(SpawnId, f32)>, (id, time)| match best {
            Some((best_id, best_time))
                if best_time > time || (best_time == time && best_id < id) =>
            {
                Some((best_id, best_time))
            }
            _ => Some((id, time)),
        })
        .map(|(id, _)| id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BOOST_LOCATIONS, TICK_TIME};
    use approx::assert_abs_diff_eq;
    use bot_packet::{BoostPad, BoostPadState, TeamInfo, Touch, Vector3};

    fn standard_field() -> FieldInfo {
        FieldInfo::new(
            BOOST_LOCATIONS
                .iter()
                .map(|c| BoostPad {
                    location: Vector3::new(c[0], c[1], c[2]),
                    is_full_boost: c[2] > 71.0,
                })
                .collect(),
        )
    }

    fn decoder() -> GameState {
        GameState::new(&standard_field(), DecoderConfig::default()).unwrap()
    }

    fn player(id: i32) -> PlayerInfo {
        PlayerInfo {
            spawn_id: id,
            team: (id % 2) as u32,
            boost: 33.0,
            demolished_timeout: -1.0,
            ..Default::default()
        }
    }

    fn packet(frame_num: u32, players: Vec<PlayerInfo>) -> GamePacket {
        GamePacket {
            game_info: GameInfo {
                frame_num,
                seconds_elapsed: frame_num as f32 * TICK_TIME,
                game_state_type: GameStateType::Active,
                ..Default::default()
            },
            players,
            balls: vec![Default::default()],
            teams: vec![
                TeamInfo {
                    team_index: 0,
                    score: 2,
                },
                TeamInfo {
                    team_index: 1,
                    score: 1,
                },
            ],
            boost_pads: vec![
                BoostPadState {
                    is_active: true,
                    timer: 0.0
                };
                BOOST_LOCATIONS.len()
            ],
        }
    }

    #[test]
    fn first_decode_has_zero_elapsed() {
        let mut gs = decoder();
        let f = gs.decode(&packet(500, vec![player(1)])).unwrap();
        assert_eq!(f.ticks_elapsed, 0);
        let f = gs.decode(&packet(508, vec![player(1)])).unwrap();
        assert_eq!(f.ticks_elapsed, 8);
    }

    #[test]
    fn regression_clamped_by_default() {
        let mut gs = decoder();
        gs.decode(&packet(100, vec![player(1)])).unwrap();
        let f = gs.decode(&packet(90, vec![player(1)])).unwrap();
        assert_eq!(f.ticks_elapsed, 0);
        let f = gs.decode(&packet(98, vec![player(1)])).unwrap();
        assert_eq!(f.ticks_elapsed, 8);
    }

    #[test]
    fn regression_rejected_when_configured() {
        let config = DecoderConfig {
            frame_regression: FrameRegressionPolicy::Reject,
            ..Default::default()
        };
        let mut gs = GameState::new(&standard_field(), config).unwrap();
        gs.decode(&packet(100, vec![player(1)])).unwrap();
        let err = gs.decode(&packet(90, vec![player(1)])).unwrap_err();
        assert_eq!(
            err,
            DecodeError::FrameRegression {
                previous: 100,
                current: 90
            }
        );
        // rejected packet leaves the counter untouched
        let f = gs.decode(&packet(108, vec![player(1)])).unwrap();
        assert_eq!(f.ticks_elapsed, 8);
    }

    #[test]
    fn unmatched_pad_fails_construction() {
        let mut field = standard_field();
        field.boost_pads[0].location = Vector3::new(10.0, 10.0, 70.0);
        let err = GameState::new(&field, DecoderConfig::default()).unwrap_err();
        assert!(matches!(err, ConfigError::UnmatchedBoostPad { index: 0, .. }));
    }

    #[test]
    fn invalid_config_fails_construction() {
        let config = DecoderConfig {
            tick_skip: 0,
            ..Default::default()
        };
        assert_eq!(
            GameState::new(&standard_field(), config).unwrap_err(),
            ConfigError::InvalidTickSkip
        );
    }

    #[test]
    fn roster_growth_keeps_existing_records() {
        let mut gs = decoder();
        let first: Vec<PlayerInfo> = (0..64).map(player).collect();
        gs.decode(&packet(10, first.clone())).unwrap();
        assert_eq!(gs.capacity(), 64);
        let before: Vec<EntitySlot> = (0..64)
            .map(|i| gs.slot(SpawnId(i)).unwrap().clone())
            .collect();

        let mut grown = first;
        grown.extend((64..70).map(player));
        // same frame: zero ticks, so existing records must not move
        gs.decode(&packet(10, grown)).unwrap();
        assert_eq!(gs.capacity(), 128);
        assert_eq!(gs.tracked_count(), 70);
        for (i, old) in before.iter().enumerate() {
            assert_eq!(gs.slot(SpawnId(i as i32)), Some(old));
        }
        for i in 64..70 {
            let slot = gs.slot(SpawnId(i)).unwrap();
            assert_eq!(slot.boost_pickups, 0);
            assert_eq!(slot.counters, TickCounters::default());
            assert_eq!(slot.car.ball_touches, 0);
        }
    }

    #[test]
    fn pickup_counted_only_while_live() {
        let mut gs = decoder();
        let mut p = player(3);
        p.boost = 40.0;
        gs.decode(&packet(0, vec![p.clone()])).unwrap();
        p.boost = 55.0;
        let f = gs.decode(&packet(8, vec![p.clone()])).unwrap();
        assert_eq!(f.player(SpawnId(3)).unwrap().boost_pickups, 1);

        let mut gs = decoder();
        p.boost = 40.0;
        let mut pkt = packet(0, vec![p.clone()]);
        pkt.game_info.game_state_type = GameStateType::Countdown;
        gs.decode(&pkt).unwrap();
        p.boost = 55.0;
        let mut pkt = packet(8, vec![p]);
        pkt.game_info.game_state_type = GameStateType::Countdown;
        let f = gs.decode(&pkt).unwrap();
        assert_eq!(f.player(SpawnId(3)).unwrap().boost_pickups, 0);
    }

    #[test]
    fn boost_spend_is_not_pickup() {
        let mut gs = decoder();
        let mut p = player(3);
        p.boost = 60.0;
        gs.decode(&packet(0, vec![p.clone()])).unwrap();
        p.boost = 20.0;
        let f = gs.decode(&packet(8, vec![p])).unwrap();
        assert_eq!(f.player(SpawnId(3)).unwrap().boost_pickups, 0);
    }

    fn touching(id: i32, t: f32) -> PlayerInfo {
        PlayerInfo {
            latest_touch: Some(Touch {
                game_seconds: t,
                ..Default::default()
            }),
            ..player(id)
        }
    }

    #[test]
    fn last_touch_ties_go_to_lowest_id() {
        let mut gs = decoder();
        let f = gs
            .decode(&packet(120, vec![touching(9, 0.5), touching(4, 0.5), touching(6, 0.2)]))
            .unwrap();
        assert_eq!(f.last_touch, Some(SpawnId(4)));
    }

    #[test]
    fn last_touch_most_recent_wins_and_persists() {
        let mut gs = decoder();
        let f = gs
            .decode(&packet(120, vec![touching(1, 0.4), touching(2, 0.9)]))
            .unwrap();
        assert_eq!(f.last_touch, Some(SpawnId(2)));
        let f = gs.decode(&packet(128, vec![player(1), player(2)])).unwrap();
        assert_eq!(f.last_touch, Some(SpawnId(2)));
        assert_eq!(gs.last_touch(), Some(SpawnId(2)));
    }

    #[test]
    fn ball_touched_within_tick_skip_window() {
        let mut gs = decoder();
        // current time 1.0 s; window 8 ticks
        let now = 120;
        let recent = 1.0 - 3.0 * TICK_TIME;
        let old = 1.0 - 20.0 * TICK_TIME;
        let f = gs
            .decode(&packet(now, vec![touching(1, recent), touching(2, old), player(3)]))
            .unwrap();
        assert!(f.player(SpawnId(1)).unwrap().ball_touched);
        assert!(!f.player(SpawnId(2)).unwrap().ball_touched);
        assert!(!f.player(SpawnId(3)).unwrap().ball_touched);
        assert_eq!(gs.slot(SpawnId(2)).unwrap().last_ball_touch_time, Some(old));
    }

    #[test]
    fn pads_and_mirror() {
        let mut gs = decoder();
        let mut pkt = packet(0, vec![]);
        pkt.boost_pads[0] = BoostPadState {
            is_active: false,
            timer: 3.5,
        };
        let f = gs.decode(&pkt).unwrap();
        let n = BOOST_LOCATIONS.len();
        assert!(!f.boost_pads[0]);
        assert!(!f.inverted_boost_pads[n - 1]);
        assert!(f.inverted_boost_pads[0]);
        assert_eq!(f.inverted_boost_pad_timers[n - 1], 3.5);
    }

    #[test]
    fn scores_and_ball_mirror() {
        let mut gs = decoder();
        let mut pkt = packet(0, vec![]);
        pkt.balls[0].physics.location = Vector3::new(100.0, -200.0, 93.0);
        let f = gs.decode(&pkt).unwrap();
        assert_eq!(f.blue_score, 2);
        assert_eq!(f.orange_score, 1);
        assert_abs_diff_eq!(f.inverted_ball.position.x, -100.0);
        assert_abs_diff_eq!(f.inverted_ball.position.y, 200.0);
        assert_abs_diff_eq!(f.inverted_ball.position.z, 93.0);
    }

    #[test]
    fn absent_entity_stays_tracked() {
        let mut gs = decoder();
        gs.decode(&packet(0, vec![player(1), player(2)])).unwrap();
        let f = gs.decode(&packet(8, vec![player(2)])).unwrap();
        assert!(f.player(SpawnId(1)).is_none());
        assert!(gs.car(SpawnId(1)).is_some());
        assert_eq!(gs.cars().count(), 2);
    }

    #[test]
    fn returning_entity_touch_window_decays() {
        let mut gs = decoder();
        gs.decode(&packet(0, vec![player(1), player(2)])).unwrap();
        for frame in (8..=800).step_by(8) {
            gs.decode(&packet(frame, vec![player(2)])).unwrap();
        }

        // back after 100 packets, touching the ball on this tick
        let t = 808.0 * TICK_TIME;
        let f = gs.decode(&packet(808, vec![touching(1, t), player(2)])).unwrap();
        let car = &f.player(SpawnId(1)).unwrap().car;
        assert_eq!(car.clock_ticks(), 808);
        assert_eq!(car.ball_touches, 1);

        for frame in [816, 824, 832] {
            let f = gs.decode(&packet(frame, vec![touching(1, t), player(2)])).unwrap();
            assert_eq!(f.player(SpawnId(1)).unwrap().car.ball_touches, 0);
        }
        let f = gs.decode(&packet(840, vec![touching(1, t)])).unwrap();
        assert!(!f.player(SpawnId(1)).unwrap().ball_touched);
        assert_eq!(gs.slot(SpawnId(1)).unwrap().last_seen_frame, 840);
    }

    #[test]
    fn identity_keyed_not_index_keyed() {
        let mut gs = decoder();
        let mut a = player(5);
        a.boost = 10.0;
        let mut b = player(6);
        b.boost = 90.0;
        gs.decode(&packet(0, vec![a.clone(), b.clone()])).unwrap();
        // array order swapped: records must follow spawn IDs
        let f = gs.decode(&packet(8, vec![b, a])).unwrap();
        assert_abs_diff_eq!(f.player(SpawnId(5)).unwrap().car.boost_amount, 0.1, epsilon = 1e-6);
        assert_eq!(f.player(SpawnId(5)).unwrap().boost_pickups, 0);
        assert_eq!(f.player(SpawnId(6)).unwrap().boost_pickups, 0);
    }

    #[test]
    fn non_standard_field_uses_source_order() {
        let field = FieldInfo::new(vec![BoostPad::default(); 3]);
        let config = DecoderConfig {
            standard_map: false,
            ..Default::default()
        };
        let mut gs = GameState::new(&field, config).unwrap();
        let mut pkt = packet(0, vec![]);
        pkt.boost_pads.truncate(3);
        pkt.boost_pads[2].is_active = false;
        let f = gs.decode(&pkt).unwrap();
        assert_eq!(f.boost_pads, vec![true, true, false]);
        assert_eq!(f.inverted_boost_pads, vec![false, true, true]);
    }
}
