// Per-track descriptive features used for melodic track selection

use serde::{Deserialize, Serialize};

use crate::midi::{MessageKind, Track};

/// Denominator used for note density
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DensityBasis {
    /// Notes per (longest message delta + 1)
    #[default]
    LongestGap,
    /// Notes per (track length in ticks + 1)
    TrackLength,
}

/// Summary statistics for one track
#[derive(Debug, Clone)]
pub struct TrackFeatures {
    pub track_index: usize,
    pub note_count: usize,
    /// Onset-counted pitch class histogram, L1-normalized (12 bins)
    pub pitch_class_histogram: Vec<f64>,
    /// Raw onset counts per MIDI pitch (128 bins)
    pub pitch_histogram: Vec<f64>,
    pub avg_pitch: f64,
    pub pitch_range: u8,
    pub note_density: f64,
    pub melodic_score: f64,
}

impl TrackFeatures {
    /// Compute features for a track, or `None` if it has no sounding note-on
    /// or uses the percussion channel.
    pub fn analyze(track_index: usize, track: &Track, basis: DensityBasis) -> Option<Self> {
        if track.is_percussion() {
            return None;
        }

        let pitches: Vec<u8> = track
            .messages
            .iter()
            .filter(|m| m.kind.is_sounding_note_on())
            .filter_map(|m| match m.kind {
                MessageKind::NoteOn { key, .. } => Some(key),
                _ => None,
            })
            .collect();

        if pitches.is_empty() {
            return None;
        }

        let note_count = pitches.len();
        let avg_pitch = pitches.iter().map(|&p| p as f64).sum::<f64>() / note_count as f64;
        let max = pitches.iter().copied().max().unwrap_or(0);
        let min = pitches.iter().copied().min().unwrap_or(0);
        let pitch_range = max - min;

        let span = match basis {
            DensityBasis::LongestGap => track.longest_delta() as f64,
            DensityBasis::TrackLength => track.length_ticks() as f64,
        };
        let note_density = note_count as f64 / (span + 1.0);

        let mut pitch_class_histogram = vec![0.0f64; 12];
        let mut pitch_histogram = vec![0.0f64; 128];
        for &pitch in &pitches {
            pitch_class_histogram[(pitch % 12) as usize] += 1.0;
            pitch_histogram[(pitch & 0x7F) as usize] += 1.0;
        }
        l1_normalize(&mut pitch_class_histogram);

        Some(Self {
            track_index,
            note_count,
            pitch_class_histogram,
            pitch_histogram,
            avg_pitch,
            pitch_range,
            note_density,
            melodic_score: melodic_score(avg_pitch, pitch_range, note_density),
        })
    }
}

/// Higher register, a wide-but-capped ambitus and a capped density score higher.
pub fn melodic_score(avg_pitch: f64, pitch_range: u8, note_density: f64) -> f64 {
    avg_pitch / 127.0 * 0.3
        + (pitch_range as f64 / 36.0).min(1.0) * 0.4
        + (note_density * 10.0).min(1.0) * 0.3
}

/// Sum of absolute bin differences
pub fn l1_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum()
}

fn l1_normalize(arr: &mut [f64]) {
    let sum: f64 = arr.iter().sum();
    if sum > 0.0 {
        for v in arr.iter_mut() {
            *v /= sum;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::TrackBuilder;

    #[test]
    fn histogram_sums_to_one() {
        let track = TrackBuilder::new()
            .note(60, 0, 100, 90)
            .note(72, 100, 200, 90)
            .note(67, 200, 300, 90)
            .build();
        let f = TrackFeatures::analyze(4, &track, DensityBasis::LongestGap).unwrap();

        assert_eq!(f.track_index, 4);
        assert_eq!(f.note_count, 3);
        assert!((f.pitch_class_histogram.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!((f.pitch_class_histogram[0] - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(f.pitch_histogram[60], 1.0);
        assert_eq!(f.pitch_range, 12);
        assert!((f.avg_pitch - 199.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn density_basis_changes_denominator() {
        // deltas: 0, 100, 0, 100, 0, 100 -> longest 100, length 300
        let track = TrackBuilder::new()
            .note(60, 0, 100, 90)
            .note(62, 100, 200, 90)
            .note(64, 200, 300, 90)
            .build();
        let gap = TrackFeatures::analyze(0, &track, DensityBasis::LongestGap).unwrap();
        let len = TrackFeatures::analyze(0, &track, DensityBasis::TrackLength).unwrap();

        assert!((gap.note_density - 3.0 / 101.0).abs() < 1e-12);
        assert!((len.note_density - 3.0 / 301.0).abs() < 1e-12);
    }

    #[test]
    fn zero_velocity_note_ons_are_not_counted() {
        let track = TrackBuilder::new()
            .note(60, 0, 100, 90)
            .note(64, 200, 300, 0)
            .build();
        let f = TrackFeatures::analyze(0, &track, DensityBasis::LongestGap).unwrap();

        assert_eq!(f.note_count, track.note_on_count());
        assert_eq!(f.note_count, 1);
        assert_eq!(f.pitch_histogram[64], 0.0);
        assert_eq!(f.pitch_range, 0);
    }

    #[test]
    fn percussion_and_silent_tracks_are_skipped() {
        let drums = TrackBuilder::new().channel(9).note(36, 0, 10, 100).build();
        assert!(TrackFeatures::analyze(0, &drums, DensityBasis::LongestGap).is_none());

        let silent = TrackBuilder::new().tempo(0, 500_000).build();
        assert!(TrackFeatures::analyze(0, &silent, DensityBasis::LongestGap).is_none());
    }

    #[test]
    fn score_caps_range_and_density() {
        let capped = melodic_score(127.0, 48, 5.0);
        assert!((capped - 1.0).abs() < 1e-12);

        let low = melodic_score(0.0, 18, 0.05);
        assert!((low - (0.5 * 0.4 + 0.5 * 0.3)).abs() < 1e-12);
    }
}
