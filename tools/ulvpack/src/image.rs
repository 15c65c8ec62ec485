//! Decoding of `.ulv` images
//!
//! Splits an image back into its audio and mechanism streams the same way
//! the firmware walks it, and rebuilds the toggle timeline it will play.

use crate::error::{Result, UlvError};
use crate::mechanism::{CHANNEL_COUNT, Channel};
use crate::params::HEADER_LEN;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgramImage {
    pub payload_length: u32,
    pub audio: Vec<u8>,
    pub mechanism: Vec<u8>,
}

impl ProgramImage {
    pub fn decode(bytes: &[u8], period: usize) -> Result<Self> {
        if period == 0 {
            return Err(UlvError::InvalidParams("interleave period must be non-zero".to_string()));
        }
        let header: [u8; 4] = bytes
            .get(..HEADER_LEN as usize)
            .and_then(|h| h.try_into().ok())
            .ok_or_else(|| {
                UlvError::MalformedImage(format!(
                    "{} bytes is too short for a header",
                    bytes.len()
                ))
            })?;
        let payload_length = u32::from_le_bytes(header);

        let payload = &bytes[HEADER_LEN as usize..];
        if payload.len() != payload_length as usize {
            return Err(UlvError::MalformedImage(format!(
                "header announces {} payload bytes but {} follow",
                payload_length,
                payload.len()
            )));
        }

        let mut audio = Vec::with_capacity(payload.len());
        let mut mechanism = Vec::with_capacity(payload.len() / (period + 1) + 1);
        for block in payload.chunks(period + 1) {
            mechanism.push(block[0]);
            audio.extend_from_slice(&block[1..]);
        }

        Ok(Self { payload_length, audio, mechanism })
    }

    /// The firmware refuses to play an image whose length has its top byte set.
    pub fn firmware_playable(&self) -> bool {
        self.payload_length >> 24 == 0
    }

    pub fn duration_secs(&self, sample_rate: u32) -> f64 {
        self.audio.len() as f64 / sample_rate as f64
    }
}

/// Channel toggle instants as the firmware will play them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MechanismTimeline {
    pub toggles: [Vec<f64>; CHANNEL_COUNT],
}

impl MechanismTimeline {
    pub fn from_bytes(mechanism: &[u8], mech_rate: u32) -> Self {
        let mut toggles: [Vec<f64>; CHANNEL_COUNT] = Default::default();
        let mut prev = 0u8;

        let nibbles = mechanism.iter().flat_map(|b| [b & 0x0F, b >> 4]);
        for (half_tick, nibble) in nibbles.enumerate() {
            let changed = nibble ^ prev;
            for channel in Channel::ALL {
                if changed & channel.bit() != 0 {
                    toggles[channel.index()].push(half_tick as f64 / mech_rate as f64);
                }
            }
            prev = nibble;
        }
        Self { toggles }
    }

    pub fn toggles(&self, channel: Channel) -> &[f64] {
        &self.toggles[channel.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_splits_streams() {
        let mut bytes = 13u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0xA1, 10, 11, 12, 13, 0xA2, 14, 15, 16, 17, 0xA3, 18, 19]);
        let image = ProgramImage::decode(&bytes, 4).unwrap();
        assert_eq!(image.payload_length, 13);
        assert_eq!(image.mechanism, vec![0xA1, 0xA2, 0xA3]);
        assert_eq!(image.audio, (10..20).collect::<Vec<u8>>());
        assert_eq!(image.audio.len() + image.mechanism.len(), image.payload_length as usize);
        assert!(image.firmware_playable());
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        assert!(matches!(ProgramImage::decode(&[1, 0], 4), Err(UlvError::MalformedImage(_))));
        let mut bytes = 5u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0, 1, 2]);
        assert!(matches!(ProgramImage::decode(&bytes, 4), Err(UlvError::MalformedImage(_))));
    }

    #[test]
    fn test_oversized_header_not_playable() {
        let image = ProgramImage { payload_length: 1 << 24, audio: vec![], mechanism: vec![] };
        assert!(!image.firmware_playable());
    }

    #[test]
    fn test_timeline_from_bytes() {
        let timeline = MechanismTimeline::from_bytes(&[0x00, 0x11, 0x31], 40);
        assert_eq!(timeline.toggles(Channel::Legs), &[0.05]);
        assert_eq!(timeline.toggles(Channel::Mouth), &[0.125]);
        assert!(timeline.toggles(Channel::LeftEye).is_empty());
    }
}
