//! Band-limited resampling to the playback clock.
//!
//! The whole track is taken to the frequency domain in one transform, its
//! spectrum is truncated or zero-padded to the new length and transformed
//! back. This treats the signal as periodic, which is fine for a song that
//! starts and ends in silence.

use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;
use tracing::debug;

use crate::waveform::Waveform;

/// `round(len * target_rate / source_rate)`, ties to even.
pub fn resampled_len(len: usize, source_rate: u32, target_rate: u32) -> usize {
    if source_rate == 0 {
        return 0;
    }
    let q = len as u128 * target_rate as u128;
    let sr = source_rate as u128;
    let (base, rem) = (q / sr, q % sr);
    let up = match (2 * rem).cmp(&sr) {
        std::cmp::Ordering::Greater => 1,
        std::cmp::Ordering::Equal => base & 1,
        std::cmp::Ordering::Less => 0,
    };
    (base + up) as usize
}

/// Resample `wave` to `target_rate`, keeping its native sample format.
pub fn resample(wave: &Waveform, target_rate: u32) -> Waveform {
    let num = resampled_len(wave.len(), wave.sample_rate, target_rate);
    if num == 0 {
        return Waveform::new(Vec::new(), target_rate, wave.format);
    }
    if num == wave.len() {
        return Waveform::new(wave.samples.clone(), target_rate, wave.format);
    }

    debug!(
        from = wave.sample_rate,
        to = target_rate,
        samples = wave.len(),
        out = num,
        "resampling"
    );

    let samples = fourier_resample(&wave.samples, num)
        .into_iter()
        .map(|v| wave.format.cast(v))
        .collect();
    Waveform::new(samples, target_rate, wave.format)
}

fn fourier_resample(input: &[f64], num: usize) -> Vec<f64> {
    let nx = input.len();
    let mut planner = FftPlanner::<f64>::new();

    let mut spectrum: Vec<Complex64> = input.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    planner.plan_fft_forward(nx).process(&mut spectrum);

    // Half spectrum of the output, bins 0..=num/2.
    let n = num.min(nx);
    let mut half = vec![Complex64::new(0.0, 0.0); num / 2 + 1];
    let keep = n / 2 + 1;
    half[..keep].copy_from_slice(&spectrum[..keep]);
    if n % 2 == 0 {
        if num < nx {
            half[n / 2] *= 2.0;
        } else if num > nx {
            half[n / 2] *= 0.5;
        }
    }
    drop(spectrum);

    // Rebuild a Hermitian spectrum so the inverse is real.
    let mut full = vec![Complex64::new(0.0, 0.0); num];
    full[0] = Complex64::new(half[0].re, 0.0);
    for k in 1..num.div_ceil(2) {
        full[k] = half[k];
        full[num - k] = half[k].conj();
    }
    if num % 2 == 0 {
        full[num / 2] = Complex64::new(half[num / 2].re, 0.0);
    }
    planner.plan_fft_inverse(num).process(&mut full);

    // Inverse is unnormalized: 1/num, then the num/nx amplitude correction.
    let scale = 1.0 / nx as f64;
    full.into_iter().map(|c| c.re * scale).collect()
}
