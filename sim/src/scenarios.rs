//! Scenario definitions.
//!
//! Each scenario is a named set of scripted cars on the standard arena plus a
//! game-phase schedule. All scenarios are deterministic given the same seed.

use crate::{
    car_script::{Maneuver, ScriptedCar},
    packet_sim::PacketSimulator,
};
use bot_packet::{BoostPad, FieldInfo, GamePacket, GameStateType, Vector3};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use state_core::{constants::BOOST_LOCATIONS, HitboxType};
use std::f32::consts::{FRAC_PI_2, PI};

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// 2v2 kickoff: countdown, boost grabs, simultaneous ball contact
    Kickoff,
    /// One car cycling through jumps, flips, double jumps and a stall
    JumpFlip,
    /// 3v3 random play with a third of the observations dropped
    FrameSkip,
    /// 64 cars, then 6 more join mid-match
    RosterGrowth,
}

/// A fully configured scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    /// Physics ticks between emitted packets
    pub tick_skip: u32,
    pub duration_ticks: u32,
    /// Frame counter value at tick 0
    pub start_frame: u32,
    /// Chance of dropping each further observation
    pub drop_prob: f64,
    /// `(start_tick, phase)`, sorted by start tick
    pub phases: Vec<(u32, GameStateType)>,
    pub field: FieldInfo,
    pub cars: Vec<ScriptedCar>,
}

impl Scenario {
    /// Build the named scenario. Uses `seed` for repeatability.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        match kind {
            ScenarioKind::Kickoff => Self::kickoff(seed),
            ScenarioKind::JumpFlip => Self::jump_flip(seed),
            ScenarioKind::FrameSkip => Self::frame_skip(seed),
            ScenarioKind::RosterGrowth => Self::roster_growth(seed),
        }
    }

    pub fn with_tick_skip(mut self, tick_skip: u32) -> Self {
        self.tick_skip = tick_skip.max(1);
        self
    }

    /// Game phase at `tick`.
    pub fn phase_at(&self, tick: u32) -> GameStateType {
        self.phases
            .iter()
            .filter(|(start, _)| *start <= tick)
            .last()
            .map(|(_, phase)| *phase)
            .unwrap_or(GameStateType::Active)
    }

    /// Run the simulation and return the emitted packets.
    pub fn packets(&self) -> Vec<GamePacket> {
        PacketSimulator::new(self.clone()).run()
    }

    // -----------------------------------------------------------------------
    // Scenario 1: Kickoff
    // -----------------------------------------------------------------------
    fn kickoff(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let go = 360;
        let charge = |boost| Maneuver::Drive {
            throttle: 1.0,
            steer: 0.0,
            boost,
            handbrake: false,
        };

        // diagonal cars charge the ball, back cars head for the corner boost
        let cars = vec![
            ScriptedCar::new(0, 0, [-2048.0, -2560.0, 17.0], 2560f32.atan2(2048.0))
                .with_script(vec![(0, Maneuver::Idle), (go, charge(true))]),
            ScriptedCar::new(1, 0, [0.0, -4608.0, 17.0], 512f32.atan2(-3072.0))
                .with_hitbox(HitboxType::Dominus)
                .with_script(vec![(0, Maneuver::Idle), (go, charge(false))]),
            ScriptedCar::new(2, 1, [2048.0, 2560.0, 17.0], (-2560f32).atan2(-2048.0))
                .with_script(vec![(0, Maneuver::Idle), (go, charge(true))]),
            ScriptedCar::new(3, 1, [0.0, 4608.0, 17.0], (-512f32).atan2(3072.0))
                .with_hitbox(HitboxType::Plank)
                .with_script(vec![(0, Maneuver::Idle), (go, charge(false))]),
        ];

        Scenario {
            name: "kickoff".into(),
            seed,
            tick_skip: 8,
            duration_ticks: 1200,
            start_frame: 1000,
            drop_prob: 0.0,
            phases: vec![
                (0, GameStateType::Countdown),
                (go, GameStateType::Kickoff),
                (go + 240, GameStateType::Active),
            ],
            field: shuffled_field(&mut rng),
            cars,
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 2: Jump / flip
    // -----------------------------------------------------------------------
    fn jump_flip(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let drive = |boost, steer, handbrake| Maneuver::Drive {
            throttle: 1.0,
            steer,
            boost,
            handbrake,
        };

        let flipper = ScriptedCar::new(0, 0, [0.0, -2000.0, 17.0], FRAC_PI_2).with_script(vec![
            (0, drive(false, 0.0, false)),
            // long jump into a front flip
            (120, Maneuver::Jump),
            (132, Maneuver::Fall),
            (150, Maneuver::Dodge { pitch: -1.0, yaw: 0.0, roll: 0.0 }),
            (230, Maneuver::Fall),
            (400, drive(false, 0.5, false)),
            // tap jump, then double jump
            (480, Maneuver::Jump),
            (482, Maneuver::Fall),
            (520, Maneuver::DoubleJump),
            (530, Maneuver::Fall),
            (640, drive(false, -0.5, false)),
            // stall: dodge input inside the deadzone
            (700, Maneuver::Jump),
            (708, Maneuver::Fall),
            (720, Maneuver::Dodge { pitch: -0.05, yaw: 0.02, roll: 0.01 }),
            (760, Maneuver::Fall),
            (900, drive(false, 1.0, true)),
            (1000, drive(true, 0.0, false)),
        ]);

        let tapper = ScriptedCar::new(1, 1, [1500.0, 2000.0, 17.0], -FRAC_PI_2)
            .with_hitbox(HitboxType::Breakout)
            .with_script(vec![
                (0, Maneuver::Idle),
                // boost tap shorter than the minimum boost time
                (60, drive(true, 0.0, false)),
                (64, drive(false, 0.0, false)),
                (200, drive(false, 0.8, true)),
                (260, drive(false, 0.0, false)),
                (400, Maneuver::Demolished { respawn: 3.0 }),
                (800, drive(false, 0.3, false)),
            ]);

        Scenario {
            name: "jump_flip".into(),
            seed,
            tick_skip: 8,
            duration_ticks: 1200,
            start_frame: 0,
            drop_prob: 0.0,
            phases: vec![(0, GameStateType::Active)],
            field: shuffled_field(&mut rng),
            cars: vec![flipper, tapper],
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 3: Frame skip
    // -----------------------------------------------------------------------
    fn frame_skip(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
        let duration_ticks = 2400;

        let cars = (0..6)
            .map(|i| {
                let team = (i % 2) as u32;
                let side = if team == 0 { -1.0 } else { 1.0 };
                let x = (i / 2) as f32 * 1500.0 - 1500.0;
                let yaw = if team == 0 { FRAC_PI_2 } else { -FRAC_PI_2 };
                let script = random_script(&mut rng, duration_ticks);
                ScriptedCar::new(i, team, [x, side * 3000.0, 17.0], yaw)
                    .with_hitbox(HitboxType::ALL[i as usize % HitboxType::ALL.len()])
                    .with_script(script)
            })
            .collect();

        Scenario {
            name: "frame_skip".into(),
            seed,
            tick_skip: 8,
            duration_ticks,
            start_frame: 50_000,
            drop_prob: 0.35,
            phases: vec![(0, GameStateType::Active)],
            field: shuffled_field(&mut rng),
            cars,
        }
    }

    // -----------------------------------------------------------------------
    // Scenario 4: Roster growth
    // -----------------------------------------------------------------------
    fn roster_growth(seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));
        let duration_ticks = 600;
        let join_at = 240;

        let cars = (0..70)
            .map(|i| {
                let col = (i % 10) as f32;
                let row = (i / 10) as f32;
                let team = (i % 2) as u32;
                let yaw = rng.gen::<f32>() * 2.0 * PI - PI;
                let mut car = ScriptedCar::new(
                    i,
                    team,
                    [col * 700.0 - 3150.0, row * 1200.0 - 4000.0, 17.0],
                    yaw,
                )
                .with_hitbox(HitboxType::ALL[i as usize % HitboxType::ALL.len()])
                .with_script(vec![(
                    0,
                    Maneuver::Drive {
                        throttle: 0.3,
                        steer: rng.gen::<f32>() * 2.0 - 1.0,
                        boost: false,
                        handbrake: false,
                    },
                )]);
                if i >= 64 {
                    car.appear_at = Some(join_at);
                }
                car
            })
            .collect();

        Scenario {
            name: "roster_growth".into(),
            seed,
            tick_skip: 8,
            duration_ticks,
            start_frame: 0,
            drop_prob: 0.0,
            phases: vec![(0, GameStateType::Active)],
            field: shuffled_field(&mut rng),
            cars,
        }
    }
}

/// Random sequence of drives, jumps and flips covering `duration` ticks.
fn random_script(rng: &mut ChaCha8Rng, duration: u32) -> Vec<(u32, Maneuver)> {
    let mut script = Vec::new();
    let mut t = 0;
    while t < duration {
        match rng.gen_range(0..4) {
            0 | 1 => {
                script.push((
                    t,
                    Maneuver::Drive {
                        throttle: rng.gen_range(0.2..1.0),
                        steer: rng.gen_range(-1.0..1.0),
                        boost: rng.gen_bool(0.3),
                        handbrake: rng.gen_bool(0.1),
                    },
                ));
                t += rng.gen_range(60..180);
            }
            2 => {
                let hold = rng.gen_range(2..24);
                script.push((t, Maneuver::Jump));
                script.push((t + hold, Maneuver::Fall));
                t += hold + rng.gen_range(60..120);
            }
            _ => {
                script.push((t, Maneuver::Jump));
                script.push((t + 8, Maneuver::Fall));
                script.push((
                    t + 20,
                    Maneuver::Dodge {
                        pitch: rng.gen_range(-1.0..1.0),
                        yaw: rng.gen_range(-1.0..1.0),
                        roll: 0.0,
                    },
                ));
                script.push((t + 80, Maneuver::Fall));
                t += 140;
            }
        }
    }
    script
}

/// The standard arena pads in canonical order.
pub fn standard_field() -> FieldInfo {
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

/// The standard arena pads in a random source order, as a bot interface may
/// list them.
pub fn shuffled_field(rng: &mut ChaCha8Rng) -> FieldInfo {
    let mut field = standard_field();
    field.boost_pads.shuffle(rng);
    field
}
