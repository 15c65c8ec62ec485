//! PCM waveforms and their native sample representations.

use crate::error::{Result, UlvError};

/// Native representation of a PCM sample.
///
/// Integer widths must be in `1..=MAX_BITS`; see [`SampleFormat::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleFormat {
    Signed { bits: u16 },
    Unsigned { bits: u16 },
    /// Nominal range `[-1.0, 1.0]`.
    Float,
}

/// Widest integer sample the pipeline accepts.
pub const MAX_BITS: u16 = 32;

impl SampleFormat {
    pub fn validate(&self) -> Result<()> {
        match *self {
            SampleFormat::Signed { bits } | SampleFormat::Unsigned { bits }
                if bits == 0 || bits > MAX_BITS =>
            {
                let kind = if matches!(self, SampleFormat::Signed { .. }) {
                    "signed"
                } else {
                    "unsigned"
                };
                Err(UlvError::UnsupportedSampleFormat { bits, kind })
            }
            _ => Ok(()),
        }
    }

    /// Value range mapped onto `[0, 255]` by the quantizer.
    /// Only meaningful for widths accepted by [`SampleFormat::validate`].
    pub fn range(&self) -> (f64, f64) {
        match *self {
            SampleFormat::Signed { bits } => {
                let half = (1u64 << (bits - 1)) as f64;
                (-half, half - 1.0)
            }
            SampleFormat::Unsigned { bits } => (0.0, ((1u64 << bits) - 1) as f64),
            SampleFormat::Float => (-1.0, 1.0),
        }
    }

    /// Bring an intermediate value back into this representation.
    ///
    /// Integer formats round half to even and saturate at the type bounds.
    pub fn cast(&self, value: f64) -> f64 {
        match self {
            SampleFormat::Float => value as f32 as f64,
            _ => {
                let (lo, hi) = self.range();
                value.round_ties_even().clamp(lo, hi)
            }
        }
    }
}

/// One mono track of samples in playback order.
#[derive(Clone, Debug, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f64>,
    pub sample_rate: u32,
    pub format: SampleFormat,
}

impl Waveform {
    pub fn new(samples: Vec<f64>, sample_rate: u32, format: SampleFormat) -> Self {
        Self { samples, sample_rate, format }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranges() {
        assert_eq!(SampleFormat::Signed { bits: 16 }.range(), (-32768.0, 32767.0));
        assert_eq!(SampleFormat::Unsigned { bits: 8 }.range(), (0.0, 255.0));
        assert_eq!(SampleFormat::Float.range(), (-1.0, 1.0));
    }

    #[test]
    fn test_cast_saturates_and_rounds_even() {
        let fmt = SampleFormat::Signed { bits: 16 };
        assert_eq!(fmt.cast(40000.0), 32767.0);
        assert_eq!(fmt.cast(-40000.0), -32768.0);
        assert_eq!(fmt.cast(2.5), 2.0);
        assert_eq!(fmt.cast(3.5), 4.0);
        assert_eq!(SampleFormat::Float.cast(0.25), 0.25);
    }

    #[test]
    fn test_validate_widths() {
        assert!(SampleFormat::Signed { bits: 24 }.validate().is_ok());
        assert!(SampleFormat::Unsigned { bits: 8 }.validate().is_ok());
        assert!(SampleFormat::Float.validate().is_ok());
        assert!(matches!(
            SampleFormat::Signed { bits: 0 }.validate(),
            Err(UlvError::UnsupportedSampleFormat { bits: 0, kind: "signed" })
        ));
        assert!(matches!(
            SampleFormat::Unsigned { bits: 65 }.validate(),
            Err(UlvError::UnsupportedSampleFormat { bits: 65, kind: "unsigned" })
        ));
    }

    #[test]
    fn test_duration() {
        let w = Waveform::new(vec![0.0; 2984], 29840, SampleFormat::Float);
        assert!((w.duration_secs() - 0.1).abs() < 1e-12);
    }
}
