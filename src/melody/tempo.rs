// Tempo resolution: only the first tempo event in the file is honored

use crate::midi::{MessageKind, Track};

/// Return the first tempo value (microseconds per quarter note) found when
/// scanning tracks in file order, or `default_tempo_us` if there is none.
pub fn resolve_tempo(tracks: &[Track], default_tempo_us: u32) -> u32 {
    tracks
        .iter()
        .flat_map(|track| track.messages.iter())
        .find_map(|msg| match msg.kind {
            MessageKind::Tempo(tempo) => Some(tempo),
            _ => None,
        })
        .unwrap_or(default_tempo_us)
}

/// Convert a tick position to whole milliseconds (truncated) at a fixed tempo.
pub fn ticks_to_ms(tick: u64, ticks_per_quarter: u16, tempo_us: u32) -> i64 {
    let tpq = ticks_per_quarter.max(1) as f64;
    let seconds = tick as f64 * tempo_us as f64 * 1e-6 / tpq;
    (seconds * 1000.0) as i64
}
