// Melody extraction for bell playback
//
// Stages run strictly forward and share no state:
// tempo + track selection -> note events -> time grid -> monophonic
// reduction -> bell mapping and re-timing.

pub mod bells;
pub mod clustering;
pub mod features;
pub mod grid;
pub mod notes;
pub mod pipeline;
pub mod reduction;
pub mod selection;
pub mod sequence;
pub mod tempo;

pub use bells::{Bell, BellMap};
pub use features::{DensityBasis, TrackFeatures};
pub use grid::TimeGrid;
pub use notes::NoteEvent;
pub use pipeline::{Extraction, MelodyExtractor};
pub use reduction::Reduction;
pub use selection::TrackSelection;
pub use sequence::{absolute_onsets, BellEvent};
