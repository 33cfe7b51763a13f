// Bell sequence timing: absolute ticks to relative, playable delays

use serde::{Deserialize, Serialize};

use super::bells::BellMap;
use super::notes::NoteEvent;
use super::tempo::ticks_to_ms;

/// One bell strike of the output sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BellEvent {
    /// Bell name
    #[serde(rename = "note")]
    pub bell: String,
    /// Milliseconds to wait before striking: from the start for the first
    /// event, from the end of the previous event's ring otherwise
    #[serde(rename = "time")]
    pub delay_ms: u64,
    /// Ring time in seconds
    pub duration: f64,
}

/// Timing limits applied when building a sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceTiming {
    pub ticks_per_quarter: u16,
    pub tempo_us: u32,
    pub min_gap_ms: u64,
    pub min_duration_ms: u64,
}

/// Map a monophonic melody onto bells and re-time it as relative delays.
///
/// Every note rings for at least `min_duration_ms`, and every strike after
/// the first waits at least `min_gap_ms` after the previous ring ends.
pub fn build_sequence(melody: &[NoteEvent], bells: &BellMap, timing: &SequenceTiming) -> Vec<BellEvent> {
    let mut sequence = Vec::with_capacity(melody.len());
    let mut prev_end_ms: i64 = 0;

    for (i, note) in melody.iter().enumerate() {
        let Some(bell) = bells.nearest_bell(note.pitch) else {
            continue;
        };

        let start_ms = ticks_to_ms(note.start_tick, timing.ticks_per_quarter, timing.tempo_us);
        let end_ms = ticks_to_ms(note.end_tick, timing.ticks_per_quarter, timing.tempo_us);
        let duration_ms = (end_ms - start_ms).max(timing.min_duration_ms as i64);

        let delay_ms = if i == 0 {
            start_ms
        } else {
            (start_ms - prev_end_ms).max(timing.min_gap_ms as i64)
        };

        sequence.push(BellEvent {
            bell: bell.to_string(),
            delay_ms: delay_ms.max(0) as u64,
            duration: duration_ms as f64 / 1000.0,
        });

        prev_end_ms = start_ms + duration_ms;
    }

    sequence
}

/// Absolute strike times in milliseconds when each delay is waited after
/// the previous ring ends.
pub fn absolute_onsets(sequence: &[BellEvent]) -> Vec<u64> {
    let mut onsets = Vec::with_capacity(sequence.len());
    let mut clock = 0u64;
    for event in sequence {
        clock += event.delay_ms;
        onsets.push(clock);
        clock += (event.duration * 1000.0).round() as u64;
    }
    onsets
}
