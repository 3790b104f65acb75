//! Boost pad ordering: maps the interface's pad list onto a canonical,
//! team-symmetric order so that reversing the activity vector yields the
//! other team's view.

use crate::{constants::BOOST_LOCATIONS, error::ConfigError};
use bot_packet::{BoostPadState, FieldInfo};
use tracing::warn;

/// Fixed permutation from source pad index to canonical pad index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoostPadMap {
    /// `order[source_idx] = canonical_idx`
    order: Vec<usize>,
    num_canonical: usize,
}

impl BoostPadMap {
    /// Match every source pad to the standard arena table by horizontal
    /// position. Fails if any pad has no counterpart within `tolerance` or if
    /// two pads land on the same canonical slot.
    pub fn standard(field: &FieldInfo, tolerance: f32) -> Result<Self, ConfigError> {
        let mut order = Vec::with_capacity(field.boost_pads.len());
        let mut claimed: Vec<Option<usize>> = vec![None; BOOST_LOCATIONS.len()];

        for (index, pad) in field.boost_pads.iter().enumerate() {
            let loc = pad.location;
            let canonical = BOOST_LOCATIONS
                .iter()
                .position(|c| {
                    (c[0] - loc.x).abs() <= tolerance && (c[1] - loc.y).abs() <= tolerance
                })
                .ok_or(ConfigError::UnmatchedBoostPad {
                    index,
                    location: loc,
                })?;
            if let Some(first) = claimed[canonical] {
                return Err(ConfigError::DuplicateBoostPad {
                    first,
                    second: index,
                    canonical,
                });
            }
            claimed[canonical] = Some(index);
            order.push(canonical);
        }

        Ok(Self {
            order,
            num_canonical: BOOST_LOCATIONS.len(),
        })
    }

    /// Keep the source order. Mirroring by reversal is only meaningful when
    /// the arena's pad list is itself symmetric.
    pub fn identity(field: &FieldInfo) -> Self {
        let n = field.boost_pads.len();
        Self {
            order: (0..n).collect(),
            num_canonical: n,
        }
    }

    /// Length of the canonical pad vector.
    pub fn len(&self) -> usize {
        self.num_canonical
    }

    pub fn is_empty(&self) -> bool {
        self.num_canonical == 0
    }

    /// Canonical index of source pad `source_idx`.
    pub fn canonical_index(&self, source_idx: usize) -> Option<usize> {
        self.order.get(source_idx).copied()
    }

    /// Scatter the packet's pad states into canonical order.
    pub fn apply(&self, pads: &[BoostPadState], active: &mut [bool], timers: &mut [f32]) {
        if pads.len() > self.order.len() {
            warn!(
                expected = self.order.len(),
                received = pads.len(),
                "packet carries more boost pads than the field layout; extras ignored"
            );
        }
        for (pad, &canonical) in pads.iter().zip(&self.order) {
            active[canonical] = pad.is_active;
            timers[canonical] = pad.timer;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bot_packet::{BoostPad, Vector3};

    /// Standard pads listed in a scrambled order with sub-unit jitter.
    fn scrambled_field() -> FieldInfo {
        let n = BOOST_LOCATIONS.len();
        let pads = (0..n)
            .map(|i| {
                let c = BOOST_LOCATIONS[(i * 7) % n];
                BoostPad {
                    location: Vector3::new(c[0] + 0.5, c[1] - 0.75, c[2]),
                    is_full_boost: c[2] > 71.0,
                }
            })
            .collect();
        FieldInfo::new(pads)
    }

    #[test]
    fn standard_mapping_recovers_permutation() {
        let map = BoostPadMap::standard(&scrambled_field(), 2.0).unwrap();
        let n = BOOST_LOCATIONS.len();
        assert_eq!(map.len(), n);
        for i in 0..n {
            assert_eq!(map.canonical_index(i), Some((i * 7) % n));
        }
    }

    #[test]
    fn unmatched_pad_is_fatal() {
        let mut field = scrambled_field();
        field.boost_pads[5].location = Vector3::new(123.0, 456.0, 70.0);
        let err = BoostPadMap::standard(&field, 2.0).unwrap_err();
        assert!(matches!(err, ConfigError::UnmatchedBoostPad { index: 5, .. }));
    }

    #[test]
    fn tolerance_is_horizontal_only() {
        let mut field = scrambled_field();
        field.boost_pads[0].location.z += 500.0;
        assert!(BoostPadMap::standard(&field, 2.0).is_ok());
        field.boost_pads[0].location.x += 3.0;
        assert!(BoostPadMap::standard(&field, 2.0).is_err());
    }

    #[test]
    fn duplicate_pad_is_fatal() {
        let mut field = scrambled_field();
        field.boost_pads[1].location = field.boost_pads[0].location;
        let err = BoostPadMap::standard(&field, 2.0).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateBoostPad { first: 0, second: 1, .. }));
    }

    #[test]
    fn apply_scatters_into_canonical_order() {
        let map = BoostPadMap::standard(&scrambled_field(), 2.0).unwrap();
        let n = map.len();
        let mut pads = vec![BoostPadState { is_active: true, timer: 0.0 }; n];
        pads[1] = BoostPadState {
            is_active: false,
            timer: 2.0,
        };
        let mut active = vec![false; n];
        let mut timers = vec![0.0; n];
        map.apply(&pads, &mut active, &mut timers);
        assert!(!active[7]);
        assert_eq!(timers[7], 2.0);
        assert_eq!(active.iter().filter(|&&a| a).count(), n - 1);
    }

    #[test]
    fn identity_keeps_source_order() {
        let field = FieldInfo::new(vec![BoostPad::default(); 3]);
        let map = BoostPadMap::identity(&field);
        assert_eq!(map.len(), 3);
        assert_eq!(map.canonical_index(2), Some(2));
        assert_eq!(map.canonical_index(3), None);
    }
}
