// Melody extraction pipeline: tracks -> selected notes -> grid -> melody -> bells

use crate::config::ExtractionConfig;
use crate::midi::MidiFile;

use super::grid::TimeGrid;
use super::notes::{extract_note_events, NoteEvent};
use super::selection::{select_melody_tracks, SelectionParams};
use super::sequence::{build_sequence, BellEvent, SequenceTiming};
use super::tempo::resolve_tempo;

/// Everything the pipeline derived from one file
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub tempo_us: u32,
    pub ticks_per_quarter: u16,
    pub selected_tracks: Vec<usize>,
    /// Note events extracted from the selected tracks
    pub note_count: usize,
    /// Monophonic line before bell mapping
    pub melody: Vec<NoteEvent>,
    pub sequence: Vec<BellEvent>,
}

/// Stateless melody extractor configured once and reusable across files
#[derive(Debug, Clone, Default)]
pub struct MelodyExtractor {
    config: ExtractionConfig,
}

impl MelodyExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extract the bell sequence. An empty result means no melody was found.
    pub fn extract(&self, midi: &MidiFile) -> Vec<BellEvent> {
        self.analyze(midi).sequence
    }

    /// Run the whole pipeline, keeping intermediate results.
    pub fn analyze(&self, midi: &MidiFile) -> Extraction {
        let cfg = &self.config;
        log::info!("Analyzing MIDI file: {} tracks", midi.tracks.len());

        let tempo_us = resolve_tempo(&midi.tracks, cfg.default_tempo_us);
        let mut extraction = Extraction {
            tempo_us,
            ticks_per_quarter: midi.ticks_per_quarter,
            ..Default::default()
        };

        let params = SelectionParams {
            policy: cfg.track_selection,
            max_clusters: cfg.max_clusters,
            density_basis: cfg.density_basis,
        };
        extraction.selected_tracks = select_melody_tracks(&midi.tracks, &params);
        if extraction.selected_tracks.is_empty() {
            log::warn!("No melodic track found");
            return extraction;
        }
        log::info!("Selected tracks: {:?}", extraction.selected_tracks);

        let events = extract_note_events(&midi.tracks, &extraction.selected_tracks);
        extraction.note_count = events.len();
        if events.is_empty() {
            log::warn!("No notes extracted");
            return extraction;
        }

        let grid = TimeGrid::build(&events, midi.ticks_per_quarter, cfg.grid_divisions_per_quarter);
        log::debug!("Grid: {} positions at {} ticks", grid.len(), grid.resolution());
        extraction.melody = cfg.reduction.reduce(&grid);

        let timing = SequenceTiming {
            ticks_per_quarter: midi.ticks_per_quarter,
            tempo_us,
            min_gap_ms: cfg.min_gap_ms,
            min_duration_ms: cfg.min_duration_ms,
        };
        extraction.sequence = build_sequence(&extraction.melody, &cfg.bells, &timing);

        log::info!("Extracted melody: {} notes", extraction.sequence.len());
        extraction
    }
}
