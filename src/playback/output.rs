// Audio output: a small cpal mixer that overlays ringing bells

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;

use super::samples::{BellSample, SampleBank};
use super::{BellStrike, PlaybackError};

/// A sample currently sounding
struct Voice {
    samples: Arc<[f32]>,
    position: f64,
    /// Source frames advanced per output frame
    step: f64,
}

/// Default output device with a voice mixer.
///
/// The stream is not `Send`; keep this on the thread that plays.
pub struct CpalOutput {
    _stream: cpal::Stream,
    voices: Arc<Mutex<Vec<Voice>>>,
    sample_rate: u32,
}

impl CpalOutput {
    pub fn open() -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| PlaybackError::Device("No default output device found".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| PlaybackError::Device(format!("Failed to get default output config: {}", e)))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(PlaybackError::Device(
                "Only F32 sample format is supported for output".to_string(),
            ));
        }

        let stream_config: cpal::StreamConfig = config.into();
        let channels = stream_config.channels.max(1) as usize;
        let sample_rate = stream_config.sample_rate.0;

        let voices: Arc<Mutex<Vec<Voice>>> = Arc::new(Mutex::new(Vec::new()));
        let mixer_voices = Arc::clone(&voices);

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let mut voices = mixer_voices.lock();
                    for frame in data.chunks_mut(channels) {
                        let value = next_frame(&mut voices);
                        frame.fill(value);
                    }
                    voices.retain(|v| (v.position as usize) < v.samples.len());
                },
                |err| log::error!("Output stream error: {}", err),
                None,
            )
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        stream
            .play()
            .map_err(|e| PlaybackError::Device(e.to_string()))?;

        log::info!("Opened audio output at {} Hz, {} channels", sample_rate, channels);

        Ok(Self {
            _stream: stream,
            voices,
            sample_rate,
        })
    }

    /// Start a sample; it mixes with anything still ringing.
    pub fn trigger(&self, sample: &BellSample) {
        self.voices.lock().push(Voice {
            samples: Arc::clone(&sample.samples),
            position: 0.0,
            step: sample.sample_rate as f64 / self.sample_rate.max(1) as f64,
        });
    }
}

/// Sum every voice at its current position and advance it
fn next_frame(voices: &mut [Voice]) -> f32 {
    let mut mixed = 0.0f32;
    for voice in voices.iter_mut() {
        if let Some(&s) = voice.samples.get(voice.position as usize) {
            mixed += s;
        }
        voice.position += voice.step;
    }
    mixed.clamp(-1.0, 1.0)
}

/// Bell samples routed to an audio output
pub struct BellVoices {
    bank: SampleBank,
    output: CpalOutput,
}

impl BellVoices {
    pub fn new(bank: SampleBank, output: CpalOutput) -> Result<Self, PlaybackError> {
        if bank.is_empty() {
            log::error!("No bell samples loaded");
            return Err(PlaybackError::NoSamples);
        }
        Ok(Self { bank, output })
    }
}

impl BellStrike for BellVoices {
    fn strike(&self, bell: &str) -> bool {
        match self.bank.get(bell) {
            Some(sample) => {
                self.output.trigger(sample);
                true
            }
            None => false,
        }
    }
}
