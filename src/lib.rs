// Carillon - MIDI melody extraction for a five-bell carillon
// Main library entry point

pub mod config;
pub mod http;
pub mod melody;
pub mod midi;
pub mod playback;

pub use config::Config;
pub use melody::{BellEvent, Extraction, MelodyExtractor};
pub use midi::{MidiError, MidiFile};
