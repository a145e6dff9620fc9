use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use tracing::{info, warn};

use crate::error::MediaError;

use super::AudioInput;

/// Default system input. The audio callback stores the RMS of each buffer;
/// [`AudioInput::level`] just reads the last value.
pub struct SystemMicrophone {
    level: Arc<AtomicU32>,
    _stream: Stream,
}

impl SystemMicrophone {
    pub fn open() -> Result<Self, MediaError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| MediaError::MicrophoneUnavailable("no default input device".into()))?;
        let supported = device
            .default_input_config()
            .map_err(|err| MediaError::MicrophoneUnavailable(err.to_string()))?;
        let format = supported.sample_format();
        let config: StreamConfig = supported.config();
        let level = Arc::new(AtomicU32::new(0f32.to_bits()));

        let stream = match format {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, level.clone()),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, level.clone()),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, level.clone()),
            other => {
                return Err(MediaError::MicrophoneUnavailable(format!(
                    "unsupported sample format {other:?}"
                )));
            }
        }?;
        stream
            .play()
            .map_err(|err| MediaError::MicrophoneUnavailable(err.to_string()))?;

        info!(
            device = %device.name().unwrap_or_else(|_| "unknown".into()),
            channels = config.channels,
            sample_rate = config.sample_rate.0,
            "system microphone opened"
        );
        Ok(Self {
            level,
            _stream: stream,
        })
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    level: Arc<AtomicU32>,
) -> Result<Stream, MediaError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    device
        .build_input_stream(
            config,
            move |data: &[T], _| {
                if data.is_empty() {
                    return;
                }
                let sum: f32 = data
                    .iter()
                    .map(|&s| {
                        let v = f32::from_sample(s);
                        v * v
                    })
                    .sum();
                let rms = (sum / data.len() as f32).sqrt().clamp(0.0, 1.0);
                level.store(rms.to_bits(), Ordering::Relaxed);
            },
            move |err| warn!(error = %err, "microphone stream error"),
            None,
        )
        .map_err(|err| MediaError::MicrophoneUnavailable(err.to_string()))
}

impl AudioInput for SystemMicrophone {
    fn level(&mut self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Relaxed))
    }
}
