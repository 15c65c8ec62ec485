//! Encoding parameters
//!
//! Playback clocks and the flash budget of the target board. The defaults
//! match the shipped firmware: a 29.84 kHz DAC clock, a 40 Hz mechanism
//! clock and a 16 MiB SPI flash.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, UlvError};

pub const TARGET_SAMPLE_RATE: u32 = 29840;
pub const MECH_RATE: u32 = 40;
pub const FLASH_BYTES: u64 = 16_777_216;

/// Size of the little-endian payload length that opens every image.
pub const HEADER_LEN: u64 = 4;

/// What to do when an image would not fit in flash.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Fail before anything is written.
    #[default]
    Reject,
    /// Warn and keep the full image.
    Allow,
    /// Drop trailing audio until the image fits.
    Truncate,
}

impl FromStr for OverflowPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "allow" => Ok(Self::Allow),
            "truncate" => Ok(Self::Truncate),
            other => Err(format!(
                "unknown overflow policy '{}' (expected reject, allow or truncate)",
                other
            )),
        }
    }
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reject => "reject",
            Self::Allow => "allow",
            Self::Truncate => "truncate",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeParams {
    pub target_sample_rate: u32,
    pub mech_rate: u32,
    /// Flash size in bytes, header included.
    pub capacity: u64,
    pub overflow: OverflowPolicy,
}

impl Default for EncodeParams {
    fn default() -> Self {
        Self {
            target_sample_rate: TARGET_SAMPLE_RATE,
            mech_rate: MECH_RATE,
            capacity: FLASH_BYTES,
            overflow: OverflowPolicy::Reject,
        }
    }
}

impl EncodeParams {
    pub fn validate(&self) -> Result<()> {
        if self.target_sample_rate == 0 || self.mech_rate == 0 {
            return Err(UlvError::InvalidParams(
                "sample rate and mechanism rate must be non-zero".to_string(),
            ));
        }
        if (2 * self.target_sample_rate as u64) % self.mech_rate as u64 != 0 {
            return Err(UlvError::InvalidParams(format!(
                "2 * {} Hz is not a multiple of the {} Hz mechanism clock",
                self.target_sample_rate, self.mech_rate
            )));
        }
        if self.capacity <= HEADER_LEN {
            return Err(UlvError::InvalidParams(format!(
                "flash size {} leaves no room for a payload",
                self.capacity
            )));
        }
        Ok(())
    }

    /// Audio bytes between two mechanism bytes (P).
    pub fn interleave_period(&self) -> usize {
        (2 * self.target_sample_rate as usize) / self.mech_rate as usize
    }

    /// Mechanism bytes needed to cover `audio_len` samples, rounded up.
    pub fn mechanism_len(&self, audio_len: usize) -> usize {
        let num = audio_len as u64 * self.mech_rate as u64;
        let den = 2 * self.target_sample_rate as u64;
        num.div_ceil(den) as usize
    }

    /// Longest audio run whose image still fits in `capacity`.
    pub fn max_audio_len(&self) -> usize {
        let budget = self.capacity.saturating_sub(HEADER_LEN);
        let block = self.interleave_period() as u64 + 1;
        let full = budget / block;
        let rest = budget % block;
        (full * (block - 1) + rest.saturating_sub(1)) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_period() {
        assert_eq!(EncodeParams::default().interleave_period(), 1492);
    }

    #[test]
    fn test_mechanism_len_rounds_up() {
        let p = EncodeParams::default();
        assert_eq!(p.mechanism_len(0), 0);
        assert_eq!(p.mechanism_len(1), 1);
        assert_eq!(p.mechanism_len(1492), 1);
        assert_eq!(p.mechanism_len(1493), 2);
        assert_eq!(p.mechanism_len(2984), 2);
    }

    #[test]
    fn test_validate_rejects_fractional_period() {
        let p = EncodeParams { target_sample_rate: 29840, mech_rate: 33, ..Default::default() };
        assert!(matches!(p.validate(), Err(UlvError::InvalidParams(_))));
        let p = EncodeParams { mech_rate: 0, ..Default::default() };
        assert!(p.validate().is_err());
        assert!(EncodeParams::default().validate().is_ok());
    }

    #[test]
    fn test_max_audio_len_fits_exactly() {
        let p = EncodeParams { capacity: 4 + 1493 * 3 + 2, ..Default::default() };
        let n = p.max_audio_len();
        assert_eq!(n, 1492 * 3 + 1);
        assert_eq!(4 + n + p.mechanism_len(n), p.capacity as usize);
        assert!(4 + (n + 1) + p.mechanism_len(n + 1) > p.capacity as usize);
    }

    #[test]
    fn test_overflow_policy_parse() {
        assert_eq!("Truncate".parse::<OverflowPolicy>(), Ok(OverflowPolicy::Truncate));
        assert!("drop".parse::<OverflowPolicy>().is_err());
    }
}
