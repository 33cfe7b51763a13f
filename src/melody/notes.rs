// Note event extraction: pairs note-on/note-off messages per pitch

use std::collections::HashMap;

use crate::midi::{MessageKind, Track};

/// A closed note, in absolute ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub pitch: u8,
    pub start_tick: u64,
    pub end_tick: u64,
    pub velocity: u8,
}

impl NoteEvent {
    pub fn duration_ticks(&self) -> u64 {
        self.end_tick - self.start_tick
    }

    /// Weighted prominence used to choose between simultaneous notes
    pub fn salience(&self) -> f64 {
        self.pitch as f64 * 0.7 + self.velocity as f64 * 0.3
    }
}

/// Extract closed note events from the given tracks.
///
/// Open notes are keyed by pitch only. A second note-on for an open pitch
/// restarts it; a note-off with nothing open is ignored; notes never closed
/// are dropped. The result is sorted by start tick, ties keeping scan order.
pub fn extract_note_events(tracks: &[Track], indices: &[usize]) -> Vec<NoteEvent> {
    let mut events = Vec::new();

    for track in indices.iter().filter_map(|&i| tracks.get(i)) {
        let mut abs_tick: u64 = 0;
        // pitch -> (start_tick, velocity)
        let mut open: HashMap<u8, (u64, u8)> = HashMap::new();

        for msg in &track.messages {
            abs_tick += msg.delta as u64;

            match msg.kind {
                MessageKind::NoteOn { key, velocity, .. } if velocity > 0 => {
                    open.insert(key, (abs_tick, velocity));
                }
                MessageKind::NoteOn { key, .. } | MessageKind::NoteOff { key, .. } => {
                    if let Some((start_tick, velocity)) = open.remove(&key) {
                        events.push(NoteEvent {
                            pitch: key,
                            start_tick,
                            end_tick: abs_tick,
                            velocity,
                        });
                    }
                }
                _ => {}
            }
        }

        if !open.is_empty() {
            log::debug!("Dropped {} unterminated notes", open.len());
        }
    }

    events.sort_by_key(|e| e.start_tick);
    events
}
