// Quantized time grid of note onsets

use std::collections::BTreeMap;

use super::notes::NoteEvent;

/// Note events bucketed by quantized start position
#[derive(Debug, Clone, Default)]
pub struct TimeGrid {
    /// Grid step in ticks (may be fractional when ticks-per-quarter is not a multiple of the divisions)
    resolution: f64,
    /// Slot number -> events whose start snaps to that slot, in input order
    buckets: BTreeMap<u64, Vec<NoteEvent>>,
}

impl TimeGrid {
    /// Quantize `events` onto a grid of `ticks_per_quarter / divisions_per_quarter` ticks.
    ///
    /// Start ticks are snapped to the nearest slot, halves rounding to even.
    pub fn build(events: &[NoteEvent], ticks_per_quarter: u16, divisions_per_quarter: u16) -> Self {
        let resolution = ticks_per_quarter.max(1) as f64 / divisions_per_quarter.max(1) as f64;
        let mut buckets: BTreeMap<u64, Vec<NoteEvent>> = BTreeMap::new();

        for event in events {
            let slot = (event.start_tick as f64 / resolution).round_ties_even() as u64;
            buckets.entry(slot).or_default().push(*event);
        }

        Self { resolution, buckets }
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Buckets in ascending position order, positions in ticks
    pub fn iter(&self) -> impl Iterator<Item = (f64, &[NoteEvent])> + '_ {
        self.buckets
            .iter()
            .map(move |(&slot, events)| (slot as f64 * self.resolution, events.as_slice()))
    }
}
