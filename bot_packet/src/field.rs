//! Static arena layout, delivered once before the first packet.

use crate::packet::Vector3;
use serde::{Deserialize, Serialize};

/// One boost pad as listed by the interface (source ordering).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoostPad {
    pub location: Vector3,
    /// Large (100) pad vs small (12) pad
    pub is_full_boost: bool,
}

/// Field description. Only the pad table matters to the decoder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub boost_pads: Vec<BoostPad>,
}

impl FieldInfo {
    pub fn new(boost_pads: Vec<BoostPad>) -> Self {
        Self { boost_pads }
    }

    pub fn num_boosts(&self) -> usize {
        self.boost_pads.len()
    }
}
