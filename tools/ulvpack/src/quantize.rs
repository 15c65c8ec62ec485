//! 8-bit quantization for the board's DAC.

use crate::waveform::{SampleFormat, Waveform};

/// Map one sample from its format's range onto `0..=255`.
///
/// Values outside the range clamp to the nearest end, halves round to even.
pub fn quantize_sample(value: f64, format: SampleFormat) -> u8 {
    let (lo, hi) = format.range();
    let scaled = (value - lo) * 255.0 / (hi - lo);
    scaled.round_ties_even().clamp(0.0, 255.0) as u8
}

pub fn quantize(wave: &Waveform) -> Vec<u8> {
    wave.samples.iter().map(|&v| quantize_sample(v, wave.format)).collect()
}
