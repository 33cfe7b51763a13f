// MIDI file model handed to the melody pipeline
//
// The parser flattens midly's borrowed event stream into an owned, minimal
// message model: only the fields the extraction stages read are kept.

pub mod builder;
pub mod parser;
pub mod writer;

pub use builder::TrackBuilder;
pub use parser::{parse_bytes, parse_file};
pub use writer::encode;

/// Default tempo (microseconds per quarter note) when a file has no tempo event: 120 BPM
pub const DEFAULT_TEMPO_US: u32 = 500_000;

/// Ticks per quarter note assumed when the header is unusable
pub const FALLBACK_TICKS_PER_QUARTER: u16 = 480;

/// MIDI channel index reserved for percussion (channel 10 in 1-based numbering)
pub const PERCUSSION_CHANNEL: u8 = 9;

/// A parsed Standard MIDI File
#[derive(Debug, Clone, PartialEq)]
pub struct MidiFile {
    pub ticks_per_quarter: u16,
    pub tracks: Vec<Track>,
}

/// One track: an ordered sequence of delta-timed messages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    /// Name from the track-name meta event, if any
    pub name: Option<String>,
    pub messages: Vec<TimedMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedMessage {
    /// Ticks since the previous message in the same track
    pub delta: u32,
    pub kind: MessageKind,
}

/// The subset of MIDI messages the pipeline distinguishes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageKind {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    /// Set-tempo meta event, microseconds per quarter note
    Tempo(u32),
    /// Anything else; channel is set for channel voice messages
    Other { channel: Option<u8> },
}

impl MessageKind {
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MessageKind::NoteOn { channel, .. } | MessageKind::NoteOff { channel, .. } => Some(channel),
            MessageKind::Tempo(_) => None,
            MessageKind::Other { channel } => channel,
        }
    }

    /// Note-on with a non-zero velocity
    pub fn is_sounding_note_on(&self) -> bool {
        matches!(self, MessageKind::NoteOn { velocity, .. } if *velocity > 0)
    }
}

impl Track {
    pub fn new(name: Option<String>, messages: Vec<TimedMessage>) -> Self {
        Self { name, messages }
    }

    /// Display name, falling back to `Track {index}`
    pub fn display_name(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("Track {}", index))
    }

    /// Number of note-on messages with velocity > 0
    pub fn note_on_count(&self) -> usize {
        self.messages.iter().filter(|m| m.kind.is_sounding_note_on()).count()
    }

    /// True if any message in the track is on the percussion channel
    pub fn is_percussion(&self) -> bool {
        self.messages
            .iter()
            .any(|m| m.kind.channel() == Some(PERCUSSION_CHANNEL))
    }

    /// Total length in ticks (sum of all deltas)
    pub fn length_ticks(&self) -> u64 {
        self.messages.iter().map(|m| m.delta as u64).sum()
    }

    /// Largest single delta in the track
    pub fn longest_delta(&self) -> u32 {
        self.messages.iter().map(|m| m.delta).max().unwrap_or(0)
    }
}

/// Error type for MIDI input
#[derive(Debug, thiserror::Error)]
pub enum MidiError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid MIDI data: {0}")]
    Parse(String),
}
