//! Per-entity storage keyed by spawn ID.
//!
//! Slots live in a single table whose capacity doubles on demand. A slot's
//! offset never changes once assigned, so growth only appends empty slots.

use crate::{
    car::Car,
    constants::{DOUBLEJUMP_MAX_DELAY, TICKS_PER_SECOND},
    types::SpawnId,
};
use bot_packet::{AirState, ScoreInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Ticks of ground contact after a jump before the jump is considered over
const JUMP_SETTLE_TICKS: u32 = 6;

/// Coarse jump bookkeeping in whole ticks, kept alongside the car record.
///
/// Unlike [`crate::air_state::JumpState`] this ignores input and timers and
/// only counts ticks per air-state tag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickCounters {
    /// Zero while the first jump is available
    pub ticks_since_jump: u32,
    pub ticks_since_flip: u32,
    pub used_double_jump_or_flip: bool,
    pub air_ticks_since_jump_ended: u32,
}

impl TickCounters {
    /// Advance by one observation tagged `air_state`, `ticks` after the last.
    /// Returns the on-ground estimate for this observation.
    pub fn advance(&mut self, air_state: AirState, ticks: u32) -> bool {
        match air_state {
            AirState::OnGround => {
                if self.ticks_since_jump > 0 {
                    self.ticks_since_jump += ticks;
                }
                self.air_ticks_since_jump_ended = 0;
                self.used_double_jump_or_flip = false;
                // just after a jump the tag can read OnGround before the wheels leave
                if self.ticks_since_jump == 0 || self.ticks_since_jump > JUMP_SETTLE_TICKS {
                    self.ticks_since_jump = 0;
                    self.ticks_since_flip = 0;
                    true
                } else {
                    false
                }
            }
            AirState::Jumping => {
                self.ticks_since_jump += ticks;
                self.ticks_since_flip = 0;
                self.air_ticks_since_jump_ended = 0;
                self.used_double_jump_or_flip = false;
                self.ticks_since_jump <= JUMP_SETTLE_TICKS
            }
            AirState::InAir => {
                if self.ticks_since_jump > 0 {
                    self.air_ticks_since_jump_ended += ticks;
                }
                false
            }
            AirState::DoubleJumping => {
                self.used_double_jump_or_flip = true;
                false
            }
            AirState::Dodging => {
                self.used_double_jump_or_flip = true;
                self.ticks_since_flip += ticks;
                false
            }
        }
    }

    /// First jump still available.
    pub fn has_jump(&self) -> bool {
        self.ticks_since_jump == 0
    }

    /// Second jump or flip still available.
    pub fn has_flip(&self) -> bool {
        let max_air_ticks = (DOUBLEJUMP_MAX_DELAY * TICKS_PER_SECOND) as u32;
        self.air_ticks_since_jump_ended < max_air_ticks && !self.used_double_jump_or_flip
    }
}

/// Everything the decoder keeps about one entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySlot {
    pub id: SpawnId,
    pub car: Car,
    pub counters: TickCounters,
    /// Game time of the entity's most recent ball touch
    pub last_ball_touch_time: Option<f32>,
    pub boost_pickups: u32,
    pub score: ScoreInfo,
    /// Frame number of the last packet that contained the entity
    pub last_seen_frame: u32,
}

impl EntitySlot {
    pub fn new(id: SpawnId, car: Car) -> Self {
        Self {
            id,
            car,
            counters: TickCounters::default(),
            last_ball_touch_time: None,
            boost_pickups: 0,
            score: ScoreInfo::default(),
            last_seen_frame: 0,
        }
    }
}

/// Growable table of entity slots with a stable-ID index.
#[derive(Clone, Debug, Default)]
pub struct EntityArena {
    slots: Vec<Option<EntitySlot>>,
    index: HashMap<SpawnId, usize>,
}

impl EntityArena {
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || None);
        Self {
            slots,
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Double the capacity until it is at least `count`. Returns true if the
    /// table grew.
    pub fn reserve_for(&mut self, count: usize) -> bool {
        let old = self.capacity();
        if count <= old {
            return false;
        }
        let mut new = old.max(1);
        while new < count {
            new *= 2;
        }
        self.slots.resize_with(new, || None);
        debug!(from = old, to = new, "entity capacity grown");
        true
    }

    pub fn contains(&self, id: SpawnId) -> bool {
        self.index.contains_key(&id)
    }

    /// Table offset of `id`, if tracked.
    pub fn offset_of(&self, id: SpawnId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn get(&self, id: SpawnId) -> Option<&EntitySlot> {
        let offset = self.offset_of(id)?;
        self.slots[offset].as_ref()
    }

    pub fn get_mut(&mut self, id: SpawnId) -> Option<&mut EntitySlot> {
        let offset = self.offset_of(id)?;
        self.slots[offset].as_mut()
    }

    /// Store `slot` at the next free offset, growing if the table is full.
    /// An already tracked ID is replaced in place.
    pub fn insert(&mut self, slot: EntitySlot) -> &mut EntitySlot {
        let offset = self.offset_or_assign(slot.id);
        self.slots[offset].insert(slot)
    }

    /// Slot for `id`, created with `make` if untracked. The flag is true when
    /// the slot was created by this call.
    pub fn get_or_insert_with(
        &mut self,
        id: SpawnId,
        make: impl FnOnce() -> EntitySlot,
    ) -> (&mut EntitySlot, bool) {
        let created = !self.contains(id);
        let offset = self.offset_or_assign(id);
        (self.slots[offset].get_or_insert_with(make), created)
    }

    fn offset_or_assign(&mut self, id: SpawnId) -> usize {
        if let Some(offset) = self.offset_of(id) {
            return offset;
        }
        let offset = self.index.len();
        self.reserve_for(offset + 1);
        self.index.insert(id, offset);
        debug!(%id, offset, "tracking new entity");
        offset
    }

    /// Occupied slots in offset order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySlot> {
        self.slots.iter().flatten()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
