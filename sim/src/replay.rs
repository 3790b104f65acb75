//! Replay: serialize/deserialize packet logs for offline decoding.

use bot_packet::{FieldInfo, GamePacket};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// A recorded packet stream together with the field it was played on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PacketLog {
    pub scenario_name: String,
    pub seed: u64,
    pub tick_skip: u32,
    pub field: FieldInfo,
    /// All packets in emission order
    pub packets: Vec<GamePacket>,
}

/// Save a packet log to a JSON file.
pub fn save_log(log: &PacketLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer(writer, log)?;
    Ok(())
}

/// Load a packet log from a JSON file.
pub fn load_log(path: &Path) -> anyhow::Result<PacketLog> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let log: PacketLog = serde_json::from_reader(reader)?;
    Ok(log)
}
