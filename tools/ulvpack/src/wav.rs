//! WAV input.

use std::path::Path;

use hound::WavReader;
use tracing::debug;

use crate::error::{Result, UlvError};
use crate::waveform::{SampleFormat, Waveform};

/// Read a WAV file as a mono waveform in its native format.
///
/// Multichannel audio is averaged down to one channel.
pub fn read_wav(path: &Path) -> Result<Waveform> {
    let unreadable = |source: hound::Error| UlvError::AudioUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let reader = WavReader::open(path).map_err(unreadable)?;
    let spec = reader.spec();
    debug!(
        channels = spec.channels,
        rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "opened {}",
        path.display()
    );

    let (format, interleaved) = match spec.sample_format {
        hound::SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if !matches!(bits, 8 | 16 | 24 | 32) {
                return Err(UlvError::UnsupportedSampleFormat { bits, kind: "integer" });
            }
            // 8-bit WAV data is unsigned; hound recentres it on zero.
            let (format, offset) = if bits == 8 {
                (SampleFormat::Unsigned { bits }, 128.0)
            } else {
                (SampleFormat::Signed { bits }, 0.0)
            };
            let samples = reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| f64::from(v) + offset))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(unreadable)?;
            (format, samples)
        }
        hound::SampleFormat::Float => {
            if spec.bits_per_sample != 32 {
                let bits = spec.bits_per_sample;
                return Err(UlvError::UnsupportedSampleFormat { bits, kind: "float" });
            }
            let samples = reader
                .into_samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(unreadable)?;
            (SampleFormat::Float, samples)
        }
    };

    let samples = downmix(&interleaved, spec.channels as usize, format);
    Ok(Waveform::new(samples, spec.sample_rate, format))
}

fn downmix(interleaved: &[f64], channels: usize, format: SampleFormat) -> Vec<f64> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| format.cast(frame.iter().sum::<f64>() / channels as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};
    use tempfile::TempDir;

    #[test]
    fn test_read_stereo_i16_downmixes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stereo.wav");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for (l, r) in [(100i16, 200i16), (-5, 2), (32767, 32767)] {
            writer.write_sample(l).unwrap();
            writer.write_sample(r).unwrap();
        }
        writer.finalize().unwrap();

        let wave = read_wav(&path).unwrap();
        assert_eq!(wave.sample_rate, 22050);
        assert_eq!(wave.format, SampleFormat::Signed { bits: 16 });
        // -1.5 rounds to even
        assert_eq!(wave.samples, vec![150.0, -2.0, 32767.0]);
    }

    #[test]
    fn test_read_mono_float() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mono.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.0f32, 0.5, -1.0] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let wave = read_wav(&path).unwrap();
        assert_eq!(wave.format, SampleFormat::Float);
        assert_eq!(wave.samples, vec![0.0, 0.5, -1.0]);
    }

    #[test]
    fn test_read_8bit_as_unsigned() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lofi.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 8,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [-128i8, 0, 127] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let wave = read_wav(&path).unwrap();
        assert_eq!(wave.format, SampleFormat::Unsigned { bits: 8 });
        assert_eq!(wave.samples, vec![0.0, 128.0, 255.0]);
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = read_wav(Path::new("/nonexistent/song.wav")).unwrap_err();
        assert!(matches!(err, UlvError::AudioUnreadable { .. }));
    }

    #[test]
    fn test_garbage_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.wav");
        std::fs::write(&path, b"definitely not a riff file").unwrap();
        assert!(matches!(read_wav(&path), Err(UlvError::AudioUnreadable { .. })));
    }
}
