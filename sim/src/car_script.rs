//! Scripted cars and their kinematics.
//!
//! Each car follows a list of timed manoeuvres. Motion is a crude kinematic
//! approximation good enough to produce plausible packets; only the air-state
//! tags and inputs need to be realistic for the decoder.

use bot_packet::{
    AirState, BoxShape, ControllerState, Physics, PlayerInfo, Rotator, ScoreInfo, Touch, Vector3,
};
use serde::{Deserialize, Serialize};
use state_core::{constants::HITBOX_SHAPES, HitboxType};

/// Ticks per second of the simulated game
pub const TICK_RATE: f32 = 120.0;

const GRAVITY: f32 = -650.0;
const GROUND_Z: f32 = 17.0;
const JUMP_IMPULSE: f32 = 292.0;
const DODGE_IMPULSE: f32 = 500.0;
const THROTTLE_ACCEL: f32 = 1000.0;
const BOOST_ACCEL: f32 = 991.7;
const BOOST_USE_PER_SEC: f32 = 33.3;
const MAX_DRIVE_SPEED: f32 = 1410.0;
const MAX_SPEED: f32 = 2300.0;
const SUPERSONIC_SPEED: f32 = 2200.0;
const COAST_DECEL: f32 = 525.0;
const TURN_RATE: f32 = 1.5;

/// What a car does from a given tick onward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Maneuver {
    /// No input; wait on the ground
    Idle,
    Drive {
        throttle: f32,
        steer: f32,
        boost: bool,
        handbrake: bool,
    },
    /// Hold jump
    Jump,
    /// Release everything and let gravity act
    Fall,
    DoubleJump,
    /// Dodge with the given stick input
    Dodge { pitch: f32, yaw: f32, roll: f32 },
    /// Exploded; respawns after the given seconds
    Demolished { respawn: f32 },
}

/// A car driven by a timed script.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScriptedCar {
    pub spawn_id: i32,
    pub name: String,
    pub team: u32,
    pub hitbox: HitboxType,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    /// (pitch, yaw, roll)
    pub rotation: [f32; 3],
    /// 0..100
    pub boost: f32,
    /// `(start_tick, manoeuvre)`, sorted by start tick
    pub script: Vec<(u32, Maneuver)>,
    /// Car joins the match at this tick
    pub appear_at: Option<u32>,
    pub score: ScoreInfo,
    #[serde(skip)]
    air_state: AirState,
    #[serde(skip)]
    input: ControllerState,
    #[serde(skip)]
    demolished_timeout: f32,
    #[serde(skip)]
    prev_maneuver: Option<Maneuver>,
}

impl ScriptedCar {
    pub fn new(spawn_id: i32, team: u32, position: [f32; 3], yaw: f32) -> Self {
        Self {
            spawn_id,
            name: format!("bot{spawn_id}"),
            team,
            hitbox: HitboxType::Octane,
            position,
            velocity: [0.0; 3],
            rotation: [0.0, yaw, 0.0],
            boost: 33.0,
            script: vec![(0, Maneuver::Idle)],
            appear_at: None,
            score: ScoreInfo::default(),
            air_state: AirState::OnGround,
            input: ControllerState::default(),
            demolished_timeout: -1.0,
            prev_maneuver: None,
        }
    }

    pub fn with_script(mut self, script: Vec<(u32, Maneuver)>) -> Self {
        self.script = script;
        self
    }

    pub fn with_hitbox(mut self, hitbox: HitboxType) -> Self {
        self.hitbox = hitbox;
        self
    }

    /// True if the car is part of the match at `tick`.
    pub fn is_present(&self, tick: u32) -> bool {
        self.appear_at.map_or(true, |t| tick >= t)
    }

    /// Manoeuvre active at `tick`: the last one whose start is not after it.
    pub fn maneuver_at(&self, tick: u32) -> Maneuver {
        self.script
            .iter()
            .filter(|(start, _)| *start <= tick)
            .last()
            .map(|(_, m)| m.clone())
            .unwrap_or(Maneuver::Idle)
    }

    pub fn air_state(&self) -> AirState {
        self.air_state
    }

    pub fn speed(&self) -> f32 {
        let [vx, vy, vz] = self.velocity;
        (vx * vx + vy * vy + vz * vz).sqrt()
    }

    /// Advance one physics tick.
    pub fn step(&mut self, tick: u32) {
        let dt = 1.0 / TICK_RATE;
        let maneuver = self.maneuver_at(tick);
        let entered = self.prev_maneuver.as_ref() != Some(&maneuver);
        self.input = ControllerState::default();

        if self.demolished_timeout > 0.0 {
            self.demolished_timeout -= dt;
            if self.demolished_timeout <= 0.0 {
                self.demolished_timeout = -1.0;
            }
        }

        match &maneuver {
            Maneuver::Idle => {
                self.velocity = [0.0; 3];
                self.settle();
            }
            Maneuver::Drive {
                throttle,
                steer,
                boost,
                handbrake,
            } => {
                self.input.throttle = *throttle;
                self.input.steer = *steer;
                self.input.handbrake = *handbrake;
                self.drive(*throttle, *steer, *boost, dt);
                self.settle();
            }
            Maneuver::Jump => {
                self.input.jump = true;
                if entered && self.air_state == AirState::OnGround {
                    self.velocity[2] = JUMP_IMPULSE;
                }
                self.air_state = AirState::Jumping;
                self.fly(dt);
            }
            Maneuver::Fall => {
                if self.air_state != AirState::OnGround {
                    if matches!(self.air_state, AirState::Jumping) {
                        self.air_state = AirState::InAir;
                    }
                    self.fly(dt);
                }
            }
            Maneuver::DoubleJump => {
                self.input.jump = true;
                if entered {
                    self.velocity[2] += JUMP_IMPULSE;
                }
                self.air_state = AirState::DoubleJumping;
                self.fly(dt);
            }
            &Maneuver::Dodge { pitch, yaw, roll } => {
                self.input.jump = entered;
                self.input.pitch = pitch;
                self.input.yaw = yaw;
                self.input.roll = roll;
                if entered {
                    let heading = self.rotation[1];
                    let fwd = -pitch;
                    let side = yaw + roll;
                    let (sin, cos) = heading.sin_cos();
                    self.velocity[0] += DODGE_IMPULSE * (fwd * cos - side * sin);
                    self.velocity[1] += DODGE_IMPULSE * (fwd * sin + side * cos);
                }
                self.air_state = AirState::Dodging;
                self.rotation[0] -= pitch * 5.5 * dt;
                self.fly(dt);
            }
            Maneuver::Demolished { respawn } => {
                if entered {
                    self.demolished_timeout = *respawn;
                }
                self.velocity = [0.0; 3];
                self.settle();
            }
        }

        self.prev_maneuver = Some(maneuver);
    }

    fn drive(&mut self, throttle: f32, steer: f32, boost: bool, dt: f32) {
        self.rotation[1] += steer * TURN_RATE * dt;
        let heading = self.rotation[1];
        let prev = (self.velocity[0].powi(2) + self.velocity[1].powi(2)).sqrt();
        let mut speed = prev + throttle * THROTTLE_ACCEL * dt;
        let boosting = boost && self.boost > 0.0;
        self.input.boost = boost;
        if boosting {
            speed += BOOST_ACCEL * dt;
            self.boost = (self.boost - BOOST_USE_PER_SEC * dt).max(0.0);
        }
        // above throttle speed only boost keeps the car going
        let cap = if boosting {
            MAX_SPEED
        } else {
            MAX_DRIVE_SPEED.max(prev - COAST_DECEL * dt)
        };
        speed = speed.clamp(0.0, cap.min(MAX_SPEED));
        self.velocity = [speed * heading.cos(), speed * heading.sin(), 0.0];
        self.position[0] += self.velocity[0] * dt;
        self.position[1] += self.velocity[1] * dt;
    }

    fn fly(&mut self, dt: f32) {
        self.velocity[2] += GRAVITY * dt;
        for axis in 0..3 {
            self.position[axis] += self.velocity[axis] * dt;
        }
        if self.position[2] <= GROUND_Z && self.velocity[2] <= 0.0 {
            self.settle();
        }
    }

    fn settle(&mut self) {
        self.position[2] = GROUND_Z;
        self.velocity[2] = 0.0;
        self.rotation[0] = 0.0;
        self.rotation[2] = 0.0;
        self.air_state = AirState::OnGround;
    }

    /// Grant boost from a pad.
    pub fn collect_boost(&mut self, amount: f32) {
        self.boost = (self.boost + amount).min(100.0);
    }

    pub fn is_demolished(&self) -> bool {
        self.demolished_timeout > 0.0
    }

    /// Snapshot of this car as the bot interface reports it.
    pub fn to_player_info(&self, latest_touch: Option<Touch>) -> PlayerInfo {
        let [x, y, z] = self.position;
        let [vx, vy, vz] = self.velocity;
        let [pitch, yaw, roll] = self.rotation;
        PlayerInfo {
            spawn_id: self.spawn_id,
            name: self.name.clone(),
            team: self.team,
            physics: Physics {
                location: Vector3::new(x, y, z),
                rotation: Rotator::new(pitch, yaw, roll),
                velocity: Vector3::new(vx, vy, vz),
                angular_velocity: Vector3::default(),
            },
            air_state: self.air_state,
            last_input: self.input,
            boost: self.boost.round(),
            demolished_timeout: self.demolished_timeout,
            is_supersonic: self.speed() >= SUPERSONIC_SPEED,
            is_bot: true,
            score_info: self.score,
            hitbox: hitbox_shape(self.hitbox),
            hitbox_offset: Vector3::new(13.88, 0.0, 20.75),
            latest_touch,
        }
    }
}

/// Body dimensions reported for a hitbox class.
pub fn hitbox_shape(kind: HitboxType) -> BoxShape {
    HITBOX_SHAPES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, shape)| *shape)
        .unwrap_or(HITBOX_SHAPES[0].1)
}
