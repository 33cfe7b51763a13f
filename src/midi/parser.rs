// MIDI file parser built on midly

use std::path::Path;

use super::{MessageKind, MidiError, MidiFile, TimedMessage, Track, FALLBACK_TICKS_PER_QUARTER};

/// Parse a MIDI file from disk.
pub fn parse_file(path: &Path) -> Result<MidiFile, MidiError> {
    let data = std::fs::read(path)?;
    parse_bytes(&data)
}

/// Parse Standard MIDI File bytes into the pipeline's message model.
///
/// Timecode-based files and files declaring zero ticks per beat fall back to
/// 480 ticks per quarter note.
pub fn parse_bytes(data: &[u8]) -> Result<MidiFile, MidiError> {
    let smf = midly::Smf::parse(data).map_err(|e| MidiError::Parse(e.to_string()))?;

    let mut ticks_per_quarter = FALLBACK_TICKS_PER_QUARTER;
    match smf.header.timing {
        midly::Timing::Metrical(tpb) if tpb.as_int() > 0 => ticks_per_quarter = tpb.as_int(),
        timing => {
            log::warn!(
                "Unsupported timing {:?}, assuming {} ticks per quarter note",
                timing, FALLBACK_TICKS_PER_QUARTER
            );
        }
    }

    let tracks = smf.tracks.iter().map(|events| convert_track(events)).collect();

    Ok(MidiFile { ticks_per_quarter, tracks })
}

fn convert_track(events: &[midly::TrackEvent<'_>]) -> Track {
    let mut name = None;
    let mut messages = Vec::with_capacity(events.len());

    for event in events {
        let kind = match event.kind {
            midly::TrackEventKind::Midi { channel, message } => {
                let ch = channel.as_int();
                match message {
                    midly::MidiMessage::NoteOn { key, vel } => MessageKind::NoteOn {
                        channel: ch,
                        key: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    midly::MidiMessage::NoteOff { key, vel } => MessageKind::NoteOff {
                        channel: ch,
                        key: key.as_int(),
                        velocity: vel.as_int(),
                    },
                    _ => MessageKind::Other { channel: Some(ch) },
                }
            }
            midly::TrackEventKind::Meta(midly::MetaMessage::Tempo(t)) => MessageKind::Tempo(t.as_int()),
            midly::TrackEventKind::Meta(midly::MetaMessage::TrackName(raw)) => {
                if name.is_none() {
                    name = Some(String::from_utf8_lossy(raw).trim().to_string());
                }
                MessageKind::Other { channel: None }
            }
            _ => MessageKind::Other { channel: None },
        };

        messages.push(TimedMessage {
            delta: event.delta.as_int(),
            kind,
        });
    }

    Track { name, messages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

    fn note_on(delta: u32, key: u8, vel: u8) -> TrackEvent<'static> {
        TrackEvent {
            delta: delta.into(),
            kind: TrackEventKind::Midi {
                channel: 2.into(),
                message: MidiMessage::NoteOn { key: key.into(), vel: vel.into() },
            },
        }
    }

    fn encode(timing: Timing, tracks: Vec<Vec<TrackEvent<'static>>>) -> Vec<u8> {
        let mut smf = Smf::new(Header::new(Format::Parallel, timing));
        smf.tracks = tracks;
        let mut out = Vec::new();
        smf.write_std(&mut out).expect("write smf");
        out
    }

    #[test]
    fn parses_notes_tempo_and_name() {
        let end = TrackEvent { delta: 0.into(), kind: TrackEventKind::Meta(MetaMessage::EndOfTrack) };
        let bytes = encode(
            Timing::Metrical(96.into()),
            vec![vec![
                TrackEvent { delta: 0.into(), kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Melody")) },
                TrackEvent { delta: 0.into(), kind: TrackEventKind::Meta(MetaMessage::Tempo(600_000.into())) },
                note_on(0, 64, 100),
                note_on(48, 64, 0),
                end,
            ]],
        );

        let file = parse_bytes(&bytes).unwrap();
        assert_eq!(file.ticks_per_quarter, 96);
        assert_eq!(file.tracks.len(), 1);

        let track = &file.tracks[0];
        assert_eq!(track.name.as_deref(), Some("Melody"));
        assert_eq!(track.messages[1].kind, MessageKind::Tempo(600_000));
        assert_eq!(
            track.messages[2].kind,
            MessageKind::NoteOn { channel: 2, key: 64, velocity: 100 }
        );
        assert_eq!(track.messages[3].delta, 48);
        assert_eq!(track.messages[4].kind, MessageKind::Other { channel: None });
    }

    #[test]
    fn timecode_timing_falls_back() {
        let bytes = encode(Timing::Timecode(midly::Fps::Fps25, 40), vec![vec![note_on(0, 60, 90)]]);
        let file = parse_bytes(&bytes).unwrap();
        assert_eq!(file.ticks_per_quarter, FALLBACK_TICKS_PER_QUARTER);
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let err = parse_bytes(b"definitely not midi").unwrap_err();
        assert!(matches!(err, MidiError::Parse(_)));
    }
}
