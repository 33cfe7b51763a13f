// Track construction from absolute-tick notes

use super::{MessageKind, TimedMessage, Track};

/// Builds a [`Track`] from notes given in absolute ticks.
///
/// Messages are ordered by tick; at equal ticks note-offs come before
/// note-ons, and otherwise insertion order is kept.
#[derive(Debug, Clone, Default)]
pub struct TrackBuilder {
    name: Option<String>,
    channel: u8,
    // (absolute tick, order key, kind)
    pending: Vec<(u64, u8, MessageKind)>,
}

impl TrackBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Channel used by subsequent notes
    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel & 0x0F;
        self
    }

    pub fn tempo(mut self, tick: u64, microseconds_per_quarter: u32) -> Self {
        self.pending.push((tick, 0, MessageKind::Tempo(microseconds_per_quarter)));
        self
    }

    pub fn note(mut self, pitch: u8, start_tick: u64, end_tick: u64, velocity: u8) -> Self {
        let channel = self.channel;
        self.pending.push((start_tick, 2, MessageKind::NoteOn { channel, key: pitch, velocity }));
        self.pending.push((end_tick.max(start_tick), 1, MessageKind::NoteOff { channel, key: pitch, velocity: 0 }));
        self
    }

    /// A note-on with no matching note-off
    pub fn unterminated(mut self, pitch: u8, start_tick: u64, velocity: u8) -> Self {
        let channel = self.channel;
        self.pending.push((start_tick, 2, MessageKind::NoteOn { channel, key: pitch, velocity }));
        self
    }

    /// A non-note message on the current channel (e.g. a program change)
    pub fn channel_message(mut self, tick: u64) -> Self {
        let channel = self.channel;
        self.pending.push((tick, 0, MessageKind::Other { channel: Some(channel) }));
        self
    }

    pub fn build(mut self) -> Track {
        self.pending.sort_by_key(|&(tick, order, _)| (tick, order));

        let mut last_tick = 0u64;
        let messages = self
            .pending
            .into_iter()
            .map(|(tick, _, kind)| {
                let delta = (tick - last_tick) as u32;
                last_tick = tick;
                TimedMessage { delta, kind }
            })
            .collect();

        Track::new(self.name, messages)
    }
}
