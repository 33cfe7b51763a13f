// Bell playback
//
// The scheduler only knows bell names and waits; sound comes from a
// `BellStrike` implementation (the cpal-backed `BellVoices` in practice).

pub mod output;
pub mod samples;

pub use output::{BellVoices, CpalOutput};
pub use samples::{BellSample, SampleBank};

use std::time::Duration;

use crate::config::{PlaybackConfig, PlaybackDiscipline};
use crate::melody::BellEvent;

/// Something that can sound a bell by name
pub trait BellStrike {
    /// Start the bell ringing without blocking. Returns false if the bell
    /// has no sound available.
    fn strike(&self, bell: &str) -> bool;
}

/// Source of waits, swappable for tests
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Outcome of one playback run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackReport {
    pub struck: usize,
    pub missing: usize,
}

/// Plays bell sequences in order, honoring each event's delay
pub struct Player<S, C = SystemClock> {
    sink: S,
    clock: C,
    discipline: PlaybackDiscipline,
    missing_pause: Duration,
}

impl<S: BellStrike> Player<S, SystemClock> {
    pub fn new(sink: S, config: &PlaybackConfig) -> Self {
        Self::with_clock(sink, SystemClock, config)
    }
}

impl<S: BellStrike, C: Clock> Player<S, C> {
    pub fn with_clock(sink: S, clock: C, config: &PlaybackConfig) -> Self {
        Self {
            sink,
            clock,
            discipline: config.discipline,
            missing_pause: Duration::from_millis(config.missing_sample_pause_ms),
        }
    }

    /// Play the whole sequence, blocking until the last bell has rung out.
    pub fn play(&self, sequence: &[BellEvent]) -> PlaybackReport {
        log::info!("Playing {} notes", sequence.len());
        match self.discipline {
            PlaybackDiscipline::Sequential => self.play_sequential(sequence),
            PlaybackDiscipline::Overlapped => self.play_overlapped(sequence),
        }
    }

    fn play_sequential(&self, sequence: &[BellEvent]) -> PlaybackReport {
        let mut report = PlaybackReport::default();

        for (i, event) in sequence.iter().enumerate() {
            self.clock.sleep(Duration::from_millis(event.delay_ms));

            if self.sink.strike(&event.bell) {
                log::info!("Bell {} - note {}/{}", event.bell, i + 1, sequence.len());
                report.struck += 1;
                self.clock.sleep(ring_time(event));
            } else {
                log::warn!("Missing sample for {}", event.bell);
                report.missing += 1;
                self.clock.sleep(self.missing_pause);
            }
        }

        report
    }

    fn play_overlapped(&self, sequence: &[BellEvent]) -> PlaybackReport {
        let mut report = PlaybackReport::default();
        let mut elapsed = Duration::ZERO;
        let mut ring_until = Duration::ZERO;

        for (i, event) in sequence.iter().enumerate() {
            let delay = Duration::from_millis(event.delay_ms);
            self.clock.sleep(delay);
            elapsed += delay;

            if self.sink.strike(&event.bell) {
                log::info!("Bell {} - note {}/{}", event.bell, i + 1, sequence.len());
                report.struck += 1;
                ring_until = ring_until.max(elapsed + ring_time(event));
            } else {
                log::warn!("Missing sample for {}", event.bell);
                report.missing += 1;
            }
        }

        self.clock.sleep(ring_until.saturating_sub(elapsed));
        report
    }
}

fn ring_time(event: &BellEvent) -> Duration {
    Duration::from_millis((event.duration.max(0.0) * 1000.0).round() as u64)
}

/// Error type for playback
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    #[error("No bell samples loaded")]
    NoSamples,

    #[error("Failed to load sample for {bell}: {reason}")]
    Sample { bell: String, reason: String },

    #[error("Audio device error: {0}")]
    Device(String),
}
