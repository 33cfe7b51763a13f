// Monophonic reduction of the time grid

use serde::{Deserialize, Serialize};

use super::grid::TimeGrid;
use super::notes::NoteEvent;

/// Strategy used to collapse simultaneous notes into a single line
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "strategy")]
pub enum Reduction {
    /// Greedy left-to-right pass; an onset overlapping the sounding note only
    /// replaces it when clearly higher or louder.
    SalienceOverride {
        /// Replace when the candidate is more than this many semitones higher
        #[serde(default = "default_pitch_margin")]
        pitch_margin: u8,
        /// ...or when its velocity exceeds the current one times this ratio
        #[serde(default = "default_velocity_ratio")]
        velocity_ratio: f64,
    },
    /// Highest pitch at each grid position, no overlap handling
    Skyline,
}

impl Default for Reduction {
    fn default() -> Self {
        Self::SalienceOverride {
            pitch_margin: default_pitch_margin(),
            velocity_ratio: default_velocity_ratio(),
        }
    }
}

fn default_pitch_margin() -> u8 {
    3
}

fn default_velocity_ratio() -> f64 {
    1.2
}

impl Reduction {
    pub fn reduce(&self, grid: &TimeGrid) -> Vec<NoteEvent> {
        match *self {
            Reduction::SalienceOverride { pitch_margin, velocity_ratio } => {
                salience_override(grid, pitch_margin, velocity_ratio)
            }
            Reduction::Skyline => skyline(grid),
        }
    }
}

fn salience_override(grid: &TimeGrid, pitch_margin: u8, velocity_ratio: f64) -> Vec<NoteEvent> {
    let mut melody: Vec<NoteEvent> = Vec::new();
    let mut last_note_end = 0u64;

    for (position, bucket) in grid.iter() {
        let Some(candidate) = most_salient(bucket) else {
            continue;
        };

        if position < last_note_end as f64 {
            let Some(current) = melody.last_mut() else {
                continue;
            };
            let higher = candidate.pitch as u16 > current.pitch as u16 + pitch_margin as u16;
            let louder = candidate.velocity as f64 > current.velocity as f64 * velocity_ratio;
            if higher || louder {
                *current = candidate;
                last_note_end = candidate.end_tick;
            }
        } else {
            melody.push(candidate);
            last_note_end = candidate.end_tick;
        }
    }

    melody
}

/// Extract the skyline melody: at each grid position, keep only the highest pitch.
fn skyline(grid: &TimeGrid) -> Vec<NoteEvent> {
    grid.iter()
        .filter_map(|(_, bucket)| {
            let mut iter = bucket.iter();
            let first = *iter.next()?;
            Some(iter.fold(first, |best, e| if e.pitch > best.pitch { *e } else { best }))
        })
        .collect()
}

/// Highest `pitch * 0.7 + velocity * 0.3`, first one wins on ties
fn most_salient(bucket: &[NoteEvent]) -> Option<NoteEvent> {
    let mut iter = bucket.iter();
    let first = *iter.next()?;
    Some(iter.fold(first, |best, e| if e.salience() > best.salience() { *e } else { best }))
}
