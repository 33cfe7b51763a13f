// Bell sample loading (WAV via hound)

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::PlaybackError;

/// A decoded bell recording, mixed down to mono
#[derive(Debug, Clone)]
pub struct BellSample {
    pub samples: Arc<[f32]>,
    pub sample_rate: u32,
}

impl BellSample {
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate.max(1) as f64
    }
}

/// Decoded samples keyed by bell name
#[derive(Debug, Clone, Default)]
pub struct SampleBank {
    samples: HashMap<String, BellSample>,
}

impl SampleBank {
    /// Load every configured sample. Failures are logged and that bell is left out.
    pub fn load(paths: &BTreeMap<String, PathBuf>) -> Self {
        let mut samples = HashMap::new();

        for (bell, path) in paths {
            match load_wav(bell, path) {
                Ok(sample) => {
                    log::info!("Loaded sample: {} ({:.2}s)", bell, sample.duration_secs());
                    samples.insert(bell.clone(), sample);
                }
                Err(e) => log::error!("{}", e),
            }
        }

        Self { samples }
    }

    pub fn get(&self, bell: &str) -> Option<&BellSample> {
        self.samples.get(bell)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// Decode a WAV file into a mono f32 sample.
pub fn load_wav(bell: &str, path: &Path) -> Result<BellSample, PlaybackError> {
    let fail = |reason: String| PlaybackError::Sample {
        bell: bell.to_string(),
        reason,
    };

    let mut reader = hound::WavReader::open(path)
        .map_err(|e| fail(format!("opening {}: {}", path.display(), e)))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<Vec<f32>, _>>()
            .map_err(|e| fail(e.to_string()))?,
        hound::SampleFormat::Int => {
            let max = (1i64 << (spec.bits_per_sample.clamp(1, 32) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|value| value as f32 / max))
                .collect::<Result<Vec<f32>, _>>()
                .map_err(|e| fail(e.to_string()))?
        }
    };

    let mono: Vec<f32> = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();

    Ok(BellSample {
        samples: mono.into(),
        sample_rate: spec.sample_rate,
    })
}
