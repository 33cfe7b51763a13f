// Standard MIDI File encoding of the message model

use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use super::{MessageKind, MidiError, MidiFile};

/// Encode a [`MidiFile`] as SMF format 1 bytes.
///
/// Channel messages other than notes are written as program changes and
/// channel-less ones as empty markers, so deltas and channels survive a
/// round trip through [`super::parse_bytes`].
pub fn encode(file: &MidiFile) -> Result<Vec<u8>, MidiError> {
    let header = Header::new(Format::Parallel, Timing::Metrical(file.ticks_per_quarter.into()));
    let mut smf = Smf::new(header);

    for track in &file.tracks {
        let mut events: Vec<TrackEvent<'_>> = Vec::with_capacity(track.messages.len() + 2);

        if let Some(name) = &track.name {
            events.push(TrackEvent {
                delta: 0.into(),
                kind: TrackEventKind::Meta(MetaMessage::TrackName(name.as_bytes())),
            });
        }

        for msg in &track.messages {
            let kind = match msg.kind {
                MessageKind::NoteOn { channel, key, velocity } => TrackEventKind::Midi {
                    channel: channel.into(),
                    message: MidiMessage::NoteOn { key: key.into(), vel: velocity.into() },
                },
                MessageKind::NoteOff { channel, key, velocity } => TrackEventKind::Midi {
                    channel: channel.into(),
                    message: MidiMessage::NoteOff { key: key.into(), vel: velocity.into() },
                },
                MessageKind::Tempo(tempo) => TrackEventKind::Meta(MetaMessage::Tempo(tempo.into())),
                MessageKind::Other { channel: Some(channel) } => TrackEventKind::Midi {
                    channel: channel.into(),
                    message: MidiMessage::ProgramChange { program: 0.into() },
                },
                MessageKind::Other { channel: None } => TrackEventKind::Meta(MetaMessage::Marker(b"")),
            };
            events.push(TrackEvent { delta: msg.delta.into(), kind });
        }

        events.push(TrackEvent {
            delta: 0.into(),
            kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
        });
        smf.tracks.push(events);
    }

    let mut out = Vec::new();
    smf.write_std(&mut out)?;
    Ok(out)
}
