//! Program image encoder
//!
//! Layout of a `.ulv` image:
//!
//! | Offset | Size            | Contents                                   |
//! |--------|-----------------|--------------------------------------------|
//! | 0      | 4               | payload length, little-endian u32          |
//! | 4      | payload length  | interleaved stream                         |
//!
//! The stream is a mechanism byte followed by up to P audio bytes, repeated,
//! where `P = 2 * sample_rate / mech_rate`. The firmware reads it strictly in
//! order and never seeks.

use std::path::Path;

use tracing::warn;

use crate::error::{Result, UlvError};
use crate::params::{EncodeParams, HEADER_LEN, OverflowPolicy};

/// A finished image, header included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedStream {
    bytes: Vec<u8>,
    audio_len: usize,
    mechanism_len: usize,
}

impl EncodedStream {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Write the image to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }

    pub fn payload_length(&self) -> u32 {
        (self.audio_len + self.mechanism_len) as u32
    }

    pub fn audio_len(&self) -> usize {
        self.audio_len
    }

    pub fn mechanism_len(&self) -> usize {
        self.mechanism_len
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Check `4 + payload` against the flash size.
///
/// Returns the full image size. Only [`OverflowPolicy::Allow`] lets an
/// oversized image through, with a warning. Under
/// [`OverflowPolicy::Truncate`] the audio must already be cut to
/// [`EncodeParams::max_audio_len`], so an oversized payload is an error.
pub fn check_capacity(payload: u64, params: &EncodeParams) -> Result<u64> {
    let required = HEADER_LEN + payload;
    if required > params.capacity {
        if params.overflow != OverflowPolicy::Allow {
            return Err(UlvError::CapacityExceeded { required, capacity: params.capacity });
        }
        warn!("Too many bytes to write! ({}/{})", required, params.capacity);
    }
    Ok(required)
}

/// Interleave quantized audio with mechanism bytes and prepend the header.
pub fn encode(audio: &[u8], mechanism: &[u8], params: &EncodeParams) -> Result<EncodedStream> {
    params.validate()?;
    let period = params.interleave_period();

    let payload = (audio.len() + mechanism.len()) as u64;
    let required = check_capacity(payload, params)?;
    let length = u32::try_from(payload).map_err(|_| {
        UlvError::InvalidParams(format!(
            "payload of {} bytes does not fit the 32-bit header",
            payload
        ))
    })?;

    let mut bytes = Vec::with_capacity(required as usize);
    bytes.extend_from_slice(&length.to_le_bytes());

    let mut mech = mechanism.iter();
    for (i, chunk) in audio.chunks(period).enumerate() {
        let &m = mech
            .next()
            .ok_or(UlvError::MechanismUnderrun { audio_index: i * period })?;
        bytes.push(m);
        bytes.extend_from_slice(chunk);
    }
    // Trailing mechanism bytes only happen when called with a longer
    // sequence than the audio needs; they still count in the header.
    bytes.extend(mech);

    Ok(EncodedStream { bytes, audio_len: audio.len(), mechanism_len: mechanism.len() })
}
