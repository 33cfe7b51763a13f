// End-to-end extraction from Standard MIDI File bytes

use std::collections::HashSet;

use carillon_lib::config::ExtractionConfig;
use carillon_lib::melody::{absolute_onsets, BellEvent, MelodyExtractor, Reduction, TrackSelection};
use carillon_lib::midi::{self, MidiFile, Track, TrackBuilder};

const BELLS: [&str; 5] = ["Do", "Ré", "Mi", "Fa", "Sol"];

fn lead() -> Track {
    // Upper-register tune with overlapping ornaments and a fast run
    let mut builder = TrackBuilder::new().name("Lead").tempo(0, 400_000);
    let tune = [72u8, 74, 76, 79, 77, 76, 74, 72, 71, 74, 79, 84];
    for (i, &pitch) in tune.iter().enumerate() {
        let start = i as u64 * 240;
        builder = builder.note(pitch, start, start + 300, 90 + (i as u8 % 3) * 10);
    }
    for i in 0..8u64 {
        let start = 2880 + i * 40;
        builder = builder.note(76 + (i % 4) as u8, start, start + 30, 80);
    }
    builder.build()
}

fn bass() -> Track {
    let mut builder = TrackBuilder::new().name("Bass").channel(1).channel_message(0);
    for bar in 0..4u64 {
        builder = builder.note(36 + (bar % 2) as u8 * 7, bar * 960, bar * 960 + 900, 70);
    }
    builder.build()
}

fn chords() -> Track {
    let mut builder = TrackBuilder::new().name("Pad").channel(2);
    for bar in 0..4u64 {
        for pitch in [60u8, 64, 67] {
            builder = builder.note(pitch, bar * 960, bar * 960 + 960, 50);
        }
    }
    builder.build()
}

fn drums() -> Track {
    let mut builder = TrackBuilder::new().name("Drums").channel(9);
    for beat in 0..16u64 {
        builder = builder.note(if beat % 2 == 0 { 36 } else { 38 }, beat * 240, beat * 240 + 60, 120);
    }
    builder.build()
}

fn song() -> MidiFile {
    MidiFile {
        ticks_per_quarter: 480,
        tracks: vec![lead(), bass(), chords(), drums()],
    }
}

/// Encode and re-parse so the whole byte path is exercised
fn roundtrip(file: &MidiFile) -> MidiFile {
    let bytes = midi::encode(file).expect("encode");
    midi::parse_bytes(&bytes).expect("parse")
}

fn assert_playable(sequence: &[BellEvent], config: &ExtractionConfig) {
    for (i, event) in sequence.iter().enumerate() {
        assert!(BELLS.contains(&event.bell.as_str()), "unknown bell {}", event.bell);
        assert!(
            event.duration >= config.min_duration_ms as f64 / 1000.0,
            "event {} rings for {}s",
            i,
            event.duration
        );
        if i > 0 {
            assert!(event.delay_ms >= config.min_gap_ms, "event {} waits {}ms", i, event.delay_ms);
        }
    }

    let onsets = absolute_onsets(sequence);
    assert!(onsets.windows(2).all(|w| w[0] < w[1]), "onsets {:?}", onsets);
}

#[test]
fn multi_track_song_yields_playable_sequence() {
    let file = roundtrip(&song());
    let extractor = MelodyExtractor::default();
    let extraction = extractor.analyze(&file);

    assert_eq!(extraction.tempo_us, 400_000);
    assert!(!extraction.selected_tracks.contains(&3), "drums were selected");
    assert!(!extraction.sequence.is_empty());
    assert_eq!(extraction.sequence.len(), extraction.melody.len());
    assert_playable(&extraction.sequence, extractor.config());
}

#[test]
fn every_policy_combination_is_playable() {
    let file = roundtrip(&song());

    for policy in [TrackSelection::ClusterRepresentatives, TrackSelection::DominantCluster] {
        for reduction in [Reduction::default(), Reduction::Skyline] {
            let config = ExtractionConfig {
                track_selection: policy,
                reduction,
                ..Default::default()
            };
            let extraction = MelodyExtractor::new(config.clone()).analyze(&file);
            assert!(!extraction.sequence.is_empty(), "{:?}/{:?}", policy, reduction);
            assert_playable(&extraction.sequence, &config);

            if policy == TrackSelection::DominantCluster {
                assert_eq!(extraction.selected_tracks.len(), 1);
            }
        }
    }
}

#[test]
fn extraction_is_deterministic_across_threads() {
    let file = roundtrip(&song());
    let expected = MelodyExtractor::default().extract(&file);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let file = file.clone();
            std::thread::spawn(move || MelodyExtractor::default().extract(&file))
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().expect("worker"), expected);
    }
}

#[test]
fn percussion_only_file_is_empty_not_an_error() {
    let file = roundtrip(&MidiFile {
        ticks_per_quarter: 480,
        tracks: vec![drums(), drums()],
    });

    let extraction = MelodyExtractor::default().analyze(&file);
    assert!(extraction.selected_tracks.is_empty());
    assert!(extraction.sequence.is_empty());
}

#[test]
fn single_melodic_track_is_selected_directly() {
    let file = roundtrip(&MidiFile {
        ticks_per_quarter: 480,
        tracks: vec![
            TrackBuilder::new().name("Conductor").tempo(0, 250_000).build(),
            TrackBuilder::new()
                .note(62, 0, 480, 100)
                .note(65, 960, 1440, 100)
                .build(),
        ],
    });

    let extraction = MelodyExtractor::default().analyze(&file);
    assert_eq!(extraction.selected_tracks, vec![1]);

    // 240 BPM: 480 ticks = 250 ms, lifted to the 300 ms floor
    let bells: Vec<(&str, u64, f64)> = extraction
        .sequence
        .iter()
        .map(|e| (e.bell.as_str(), e.delay_ms, e.duration))
        .collect();
    assert_eq!(bells, vec![("Ré", 0, 0.3), ("Fa", 250, 0.3)]);
}

#[test]
fn overlapping_fifth_maps_to_sol() {
    let file = roundtrip(&MidiFile {
        ticks_per_quarter: 480,
        tracks: vec![TrackBuilder::new()
            .note(60, 0, 480, 100)
            .note(67, 240, 720, 110)
            .build()],
    });

    let sequence = MelodyExtractor::default().extract(&file);
    assert_eq!(
        sequence,
        vec![BellEvent { bell: "Sol".into(), delay_ms: 250, duration: 0.5 }]
    );
}

#[test]
fn unterminated_notes_are_dropped() {
    let file = roundtrip(&MidiFile {
        ticks_per_quarter: 480,
        tracks: vec![TrackBuilder::new()
            .note(64, 0, 480, 100)
            .unterminated(67, 960, 100)
            .build()],
    });

    let extraction = MelodyExtractor::default().analyze(&file);
    assert_eq!(extraction.note_count, 1);
    let bells: HashSet<&str> = extraction.sequence.iter().map(|e| e.bell.as_str()).collect();
    assert_eq!(bells, HashSet::from(["Mi"]));
}

#[test]
fn parse_file_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("song.mid");
    std::fs::write(&path, midi::encode(&song()).unwrap()).unwrap();

    let file = midi::parse_file(&path).unwrap();
    assert_eq!(file.tracks.len(), 4);
    assert_eq!(file.tracks[3].name.as_deref(), Some("Drums"));
    assert!(file.tracks[3].is_percussion());

    assert!(midi::parse_file(&dir.path().join("missing.mid")).is_err());
}
