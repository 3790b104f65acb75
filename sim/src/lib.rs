//! `sim` — Scenario simulator: scripted cars, packet generation, replay logs.

pub mod car_script;
pub mod packet_sim;
pub mod replay;
pub mod scenarios;

pub use car_script::{Maneuver, ScriptedCar};
pub use packet_sim::PacketSimulator;
pub use replay::{load_log, save_log, PacketLog};
pub use scenarios::{Scenario, ScenarioKind};
