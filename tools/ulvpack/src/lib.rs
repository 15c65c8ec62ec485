//! ulvpack - animatronic program packer library
//!
//! Turns a song and four actuator toggle lists into a `.ulv` flash image:
//! audio is resampled to the DAC clock and quantized to 8 bits, the
//! actuators are sampled against the mechanism clock, and both streams are
//! interleaved behind a length header.

pub mod encoder;
pub mod error;
pub mod image;
pub mod mechanism;
pub mod params;
pub mod program;
pub mod quantize;
pub mod resample;
pub mod wav;
pub mod waveform;

use tracing::{debug, info};

pub use encoder::EncodedStream;
pub use error::{Result, UlvError};
pub use mechanism::{Channel, MechanismProgram};
pub use params::{EncodeParams, OverflowPolicy};
pub use waveform::{SampleFormat, Waveform};

/// Encode a waveform and a mechanism program into a complete image.
///
/// Pure: no files are touched. Fails before producing anything if the
/// image would not fit and `params.overflow` is [`OverflowPolicy::Reject`].
pub fn encode_program(
    wave: &Waveform,
    program: &MechanismProgram,
    params: &EncodeParams,
) -> Result<EncodedStream> {
    params.validate()?;
    wave.format.validate()?;

    let resampled = resample::resample(wave, params.target_sample_rate);
    let mut audio = quantize::quantize(&resampled);
    debug!(samples = audio.len(), seconds = resampled.duration_secs(), "audio quantized");

    if params.overflow == OverflowPolicy::Truncate {
        let max = params.max_audio_len();
        if audio.len() > max {
            info!(
                "truncating audio from {:.2} s to {:.2} s to fit {} bytes of flash",
                audio.len() as f64 / params.target_sample_rate as f64,
                max as f64 / params.target_sample_rate as f64,
                params.capacity
            );
            audio.truncate(max);
        }
    }

    let mech_len = params.mechanism_len(audio.len());
    let mechanism = mechanism::schedule(program, params.mech_rate, mech_len);
    encoder::encode(&audio, &mechanism, params)
}
