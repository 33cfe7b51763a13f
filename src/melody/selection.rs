// Melodic track selection

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::clustering::{pairwise_l1, ward_clusters, ClusterResult};
use super::features::{DensityBasis, TrackFeatures};
use crate::midi::Track;

/// Policy used to pick melody-bearing tracks among several candidates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrackSelection {
    /// Cluster pitch-class histograms and keep the most melodic track of every cluster
    #[default]
    ClusterRepresentatives,
    /// Cluster raw pitch histograms and keep one track from the cluster holding the most notes
    DominantCluster,
}

/// Parameters for [`select_melody_tracks`]
#[derive(Debug, Clone, Copy)]
pub struct SelectionParams {
    pub policy: TrackSelection,
    pub max_clusters: usize,
    pub density_basis: DensityBasis,
}

/// Return the indices of the tracks most likely to carry the melody.
///
/// Percussion tracks and tracks without sounding notes never qualify. An
/// empty result means no melodic track was found.
pub fn select_melody_tracks(tracks: &[Track], params: &SelectionParams) -> Vec<usize> {
    let candidates: Vec<TrackFeatures> = tracks
        .iter()
        .enumerate()
        .filter_map(|(i, track)| TrackFeatures::analyze(i, track, params.density_basis))
        .collect();

    for f in &candidates {
        log::debug!(
            "Track {}: {} notes, avg pitch {:.1}, range {}, density {:.4}, score {:.3}",
            f.track_index, f.note_count, f.avg_pitch, f.pitch_range, f.note_density, f.melodic_score
        );
    }

    match candidates.len() {
        0 => Vec::new(),
        1 => vec![candidates[0].track_index],
        _ => match params.policy {
            TrackSelection::ClusterRepresentatives => cluster_representatives(&candidates, params.max_clusters),
            TrackSelection::DominantCluster => dominant_cluster(&candidates, params.max_clusters),
        },
    }
}

fn cluster_representatives(candidates: &[TrackFeatures], max_clusters: usize) -> Vec<usize> {
    let histograms: Vec<&[f64]> = candidates.iter().map(|f| f.pitch_class_histogram.as_slice()).collect();
    let clusters = cluster_by(&histograms, max_clusters);

    (1..=clusters.n_clusters)
        .filter_map(|id| most_melodic(clusters.members(id).into_iter().map(|i| &candidates[i])))
        .map(|f| f.track_index)
        .collect()
}

fn dominant_cluster(candidates: &[TrackFeatures], max_clusters: usize) -> Vec<usize> {
    let histograms: Vec<&[f64]> = candidates.iter().map(|f| f.pitch_histogram.as_slice()).collect();
    let clusters = cluster_by(&histograms, max_clusters);

    let mut best: Option<(usize, Vec<usize>)> = None;
    for id in 1..=clusters.n_clusters {
        let members = clusters.members(id);
        let total: usize = members.iter().map(|&i| candidates[i].note_count).sum();
        if best.as_ref().map_or(true, |(best_total, _)| total > *best_total) {
            best = Some((total, members));
        }
    }

    best.and_then(|(_, members)| most_melodic(members.into_iter().map(|i| &candidates[i])))
        .map(|f| vec![f.track_index])
        .unwrap_or_default()
}

fn cluster_by(histograms: &[&[f64]], max_clusters: usize) -> ClusterResult {
    let distances: Array2<f64> = pairwise_l1(histograms);
    let clusters = ward_clusters(&distances, max_clusters.min(histograms.len()));
    log::debug!("Cluster labels: {:?}", clusters.labels);
    clusters
}

/// Highest melodic score, first one wins on ties
fn most_melodic<'a>(mut features: impl Iterator<Item = &'a TrackFeatures>) -> Option<&'a TrackFeatures> {
    let first = features.next()?;
    Some(features.fold(first, |best, f| if f.melodic_score > best.melodic_score { f } else { best }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::TrackBuilder;

    fn params(policy: TrackSelection) -> SelectionParams {
        SelectionParams { policy, max_clusters: 3, density_basis: DensityBasis::LongestGap }
    }

    fn scale(base: u8, count: u64, step: u64) -> TrackBuilder {
        let mut builder = TrackBuilder::new();
        for i in 0..count {
            let pitch = base + [0u8, 2, 4, 5, 7, 9, 11][(i % 7) as usize];
            builder = builder.note(pitch, i * step, i * step + step, 90);
        }
        builder
    }

    #[test]
    fn no_candidates_yields_empty() {
        let tracks = vec![
            TrackBuilder::new().tempo(0, 500_000).build(),
            TrackBuilder::new().channel(9).note(36, 0, 100, 100).build(),
        ];
        assert!(select_melody_tracks(&tracks, &params(TrackSelection::ClusterRepresentatives)).is_empty());
    }

    #[test]
    fn single_candidate_is_selected_directly() {
        let tracks = vec![
            TrackBuilder::new().tempo(0, 500_000).build(),
            TrackBuilder::new().channel(9).note(36, 0, 100, 100).build(),
            TrackBuilder::new().note(60, 0, 100, 100).build(),
        ];
        assert_eq!(select_melody_tracks(&tracks, &params(TrackSelection::ClusterRepresentatives)), vec![2]);
        assert_eq!(select_melody_tracks(&tracks, &params(TrackSelection::DominantCluster)), vec![2]);
    }

    #[test]
    fn one_representative_per_cluster() {
        // Two similar C-major lines (different register) and one drone on F#
        let tracks = vec![
            scale(48, 14, 120).build(),
            scale(72, 14, 120).build(),
            TrackBuilder::new().note(42, 0, 1680, 70).build(),
        ];
        // the two scales share a histogram and stay one cluster even with k = 3;
        // the higher one wins it
        let selected = select_melody_tracks(&tracks, &params(TrackSelection::ClusterRepresentatives));
        assert_eq!(selected, vec![1, 2]);

        let mut two = params(TrackSelection::ClusterRepresentatives);
        two.max_clusters = 2;
        assert_eq!(select_melody_tracks(&tracks, &two), vec![1, 2]);
    }

    #[test]
    fn octave_doublings_yield_one_representative() {
        let tracks = vec![
            scale(48, 14, 120).build(),
            scale(60, 14, 120).build(),
            scale(72, 14, 120).build(),
            TrackBuilder::new().note(42, 0, 1680, 70).build(),
        ];
        let selected = select_melody_tracks(&tracks, &params(TrackSelection::ClusterRepresentatives));
        assert_eq!(selected, vec![2, 3]);
    }

    #[test]
    fn dominant_cluster_picks_busiest_group() {
        let tracks = vec![
            TrackBuilder::new().note(40, 0, 960, 70).note(40, 960, 1920, 70).build(),
            scale(72, 21, 60).build(),
            scale(72, 14, 60).build(),
        ];
        let mut p = params(TrackSelection::DominantCluster);
        p.max_clusters = 2;
        let selected = select_melody_tracks(&tracks, &p);
        assert_eq!(selected.len(), 1);
        assert!(selected[0] == 1 || selected[0] == 2);
    }
}
