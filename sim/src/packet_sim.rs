//! Packet generator.
//!
//! Steps every scripted car, the ball and the boost pads at the physics tick
//! rate and emits a [`GamePacket`] every `tick_skip` ticks, with:
//! - random dropped observations (frame skipping)
//! - boost pad pickups and respawn timers
//! - ball touches with per-car latest-touch records

use crate::{car_script::TICK_RATE, scenarios::Scenario};
use bot_packet::{
    BallInfo, BoostPadState, GameInfo, GamePacket, GameStateType, Physics, TeamInfo, Touch,
    Vector3,
};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

const BALL_RADIUS: f32 = 92.75;
const BALL_GRAVITY: f32 = -650.0;
const BALL_RESTITUTION: f32 = 0.6;
const ARENA_HALF_X: f32 = 4096.0;
const ARENA_HALF_Y: f32 = 5120.0;
/// Car-centre to ball-centre distance counted as a touch
const TOUCH_DISTANCE: f32 = 150.0;
const GOAL_HALF_WIDTH: f32 = 893.0;
const GOAL_HEIGHT: f32 = 642.0;
const SMALL_PAD_RADIUS: f32 = 144.0;
const BIG_PAD_RADIUS: f32 = 208.0;
const SMALL_PAD_RESPAWN: f32 = 4.0;
const BIG_PAD_RESPAWN: f32 = 10.0;

/// Simulated ball state.
#[derive(Clone, Debug)]
struct SimBall {
    position: [f32; 3],
    velocity: [f32; 3],
}

impl SimBall {
    fn kickoff() -> Self {
        Self {
            position: [0.0, 0.0, BALL_RADIUS],
            velocity: [0.0; 3],
        }
    }

    fn step(&mut self, dt: f32) {
        if self.position[2] > BALL_RADIUS || self.velocity[2] > 0.0 {
            self.velocity[2] += BALL_GRAVITY * dt;
        }
        for axis in 0..3 {
            self.position[axis] += self.velocity[axis] * dt;
        }
        if self.position[2] < BALL_RADIUS {
            self.position[2] = BALL_RADIUS;
            self.velocity[2] = -self.velocity[2] * BALL_RESTITUTION;
        }
        for (axis, half) in [(0, ARENA_HALF_X), (1, ARENA_HALF_Y)] {
            if self.position[axis].abs() > half {
                self.position[axis] = self.position[axis].clamp(-half, half);
                self.velocity[axis] = -self.velocity[axis];
            }
        }
    }

    fn to_info(&self) -> BallInfo {
        let [x, y, z] = self.position;
        let [vx, vy, vz] = self.velocity;
        BallInfo {
            physics: Physics {
                location: Vector3::new(x, y, z),
                velocity: Vector3::new(vx, vy, vz),
                ..Default::default()
            },
        }
    }
}

/// Simulated pad in source order.
#[derive(Clone, Debug)]
struct SimPad {
    location: Vector3,
    is_full_boost: bool,
    /// Seconds until respawn, 0 when available
    timer: f32,
}

/// Produces the packet stream for one scenario.
pub struct PacketSimulator {
    scenario: Scenario,
    rng: ChaCha8Rng,
    ball: SimBall,
    pads: Vec<SimPad>,
    touches: HashMap<i32, Touch>,
    scores: [u32; 2],
}

impl PacketSimulator {
    pub fn new(scenario: Scenario) -> Self {
        let pads = scenario
            .field
            .boost_pads
            .iter()
            .map(|p| SimPad {
                location: p.location,
                is_full_boost: p.is_full_boost,
                timer: 0.0,
            })
            .collect();
        Self {
            rng: ChaCha8Rng::seed_from_u64(scenario.seed),
            ball: SimBall::kickoff(),
            pads,
            touches: HashMap::new(),
            scores: [0, 0],
            scenario,
        }
    }

    /// Run the whole scenario and return every emitted packet in order.
    pub fn run(mut self) -> Vec<GamePacket> {
        let dt = 1.0 / TICK_RATE;
        let tick_skip = self.scenario.tick_skip.max(1);
        let mut packets = Vec::new();
        let mut next_emit = 0u32;

        for tick in 0..self.scenario.duration_ticks {
            let phase = self.scenario.phase_at(tick);
            let frozen = matches!(phase, GameStateType::Countdown | GameStateType::Inactive);

            if !frozen {
                for car in self.scenario.cars.iter_mut().filter(|c| c.is_present(tick)) {
                    car.step(tick);
                }
                self.ball.step(dt);
                self.detect_touches(tick);
                self.check_goal();
            }
            self.update_pads(tick, dt, phase.is_live());

            if tick == next_emit {
                packets.push(self.snapshot(tick, phase));
                next_emit += tick_skip;
                // drop a few observations to simulate frame skipping
                while next_emit < self.scenario.duration_ticks
                    && self.rng.gen::<f64>() < self.scenario.drop_prob
                {
                    next_emit += tick_skip;
                }
            }
        }

        packets
    }

    fn detect_touches(&mut self, tick: u32) {
        let game_seconds = tick as f32 / TICK_RATE;
        for car in self.scenario.cars.iter().filter(|c| c.is_present(tick)) {
            if car.is_demolished() {
                continue;
            }
            let d: [f32; 3] = std::array::from_fn(|a| self.ball.position[a] - car.position[a]);
            let dist = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
            if dist > TOUCH_DISTANCE || dist < f32::EPSILON {
                continue;
            }
            let normal = Vector3::new(d[0] / dist, d[1] / dist, d[2] / dist);
            self.touches.insert(
                car.spawn_id,
                Touch {
                    game_seconds,
                    location: Vector3::new(car.position[0], car.position[1], car.position[2]),
                    normal,
                    ball_index: 0,
                },
            );
            // push the ball away from the car
            let push = car.speed().max(500.0) * 1.2;
            self.ball.velocity = [normal.x * push, normal.y * push, (normal.z * push).max(200.0)];
        }
    }

    /// Count a goal and reset the ball when it crosses a goal line.
    fn check_goal(&mut self) {
        let [x, y, z] = self.ball.position;
        if y.abs() < ARENA_HALF_Y - BALL_RADIUS || x.abs() > GOAL_HALF_WIDTH || z > GOAL_HEIGHT {
            return;
        }
        // ball in the orange goal scores for blue
        let team = if y > 0.0 { 0 } else { 1 };
        self.scores[team] += 1;
        self.ball = SimBall::kickoff();
    }

    fn update_pads(&mut self, tick: u32, dt: f32, live: bool) {
        for pad in &mut self.pads {
            if pad.timer > 0.0 {
                pad.timer = (pad.timer - dt).max(0.0);
                continue;
            }
            if !live {
                continue;
            }
            let radius = if pad.is_full_boost {
                BIG_PAD_RADIUS
            } else {
                SMALL_PAD_RADIUS
            };
            let taker = self.scenario.cars.iter_mut().find(|car| {
                car.is_present(tick)
                    && !car.is_demolished()
                    && car.boost < 100.0
                    && (car.position[0] - pad.location.x).hypot(car.position[1] - pad.location.y)
                        < radius
            });
            if let Some(car) = taker {
                if pad.is_full_boost {
                    car.collect_boost(100.0);
                    pad.timer = BIG_PAD_RESPAWN;
                } else {
                    car.collect_boost(12.0);
                    pad.timer = SMALL_PAD_RESPAWN;
                }
            }
        }
    }

    fn snapshot(&self, tick: u32, phase: GameStateType) -> GamePacket {
        let players = self
            .scenario
            .cars
            .iter()
            .filter(|c| c.is_present(tick))
            .map(|c| c.to_player_info(self.touches.get(&c.spawn_id).copied()))
            .collect();
        GamePacket {
            game_info: GameInfo {
                frame_num: self.scenario.start_frame + tick,
                seconds_elapsed: tick as f32 / TICK_RATE,
                game_time_remaining: (self.scenario.duration_ticks - tick) as f32 / TICK_RATE,
                game_state_type: phase,
            },
            players,
            balls: vec![self.ball.to_info()],
            teams: vec![
                TeamInfo {
                    team_index: 0,
                    score: self.scores[0],
                },
                TeamInfo {
                    team_index: 1,
                    score: self.scores[1],
                },
            ],
            boost_pads: self
                .pads
                .iter()
                .map(|p| BoostPadState {
                    is_active: p.timer <= 0.0,
                    timer: p.timer,
                })
                .collect(),
        }
    }
}
