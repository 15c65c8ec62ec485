//! Control program files
//!
//! Plain text, one item per line:
//!
//! ```text
//! song.wav
//! 0.5 1.25 2.0        <- legs
//! 0.1 0.2 0.3 0.4     <- mouth
//!                     <- left eye (no toggles)
//! 3.0                 <- right eye
//! ```

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{Result, UlvError};
use crate::mechanism::{Channel, MechanismProgram};

#[derive(Clone, Debug, PartialEq)]
pub struct ControlProgram {
    /// Audio file name as written, relative to the program file.
    pub audio: String,
    pub mechanism: MechanismProgram,
}

impl ControlProgram {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| UlvError::ProgramFileUnreadable {
                path: path.to_path_buf(),
                source,
            })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let audio = lines.next().map(str::trim_end).unwrap_or_default();
        if audio.is_empty() {
            return Err(UlvError::MissingAudioName);
        }

        let mut mechanism = MechanismProgram::default();
        for (channel, line) in Channel::ALL.into_iter().zip(lines) {
            // audio name is line 1
            let line_no = channel.index() + 2;
            let toggles = parse_toggles(line, line_no)?;
            if toggles.windows(2).any(|w| w[1] < w[0]) {
                warn!("{} toggles on line {} are not in ascending order", channel, line_no);
            }
            mechanism.set_toggles(channel, toggles);
        }

        Ok(Self { audio: audio.to_string(), mechanism })
    }

    /// Where the audio lives, given the program file's own path.
    pub fn audio_path(&self, program_path: &Path) -> PathBuf {
        match program_path.parent() {
            Some(dir) => dir.join(&self.audio),
            None => PathBuf::from(&self.audio),
        }
    }

    /// `<audio stem>.ulv` next to the program file.
    pub fn default_output(&self, program_path: &Path) -> PathBuf {
        self.audio_path(program_path).with_extension("ulv")
    }
}

fn parse_toggles(line: &str, line_no: usize) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite() && *t >= 0.0)
                .ok_or_else(|| UlvError::InvalidToggleData {
                    line: line_no,
                    token: token.to_string(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_program() {
        let p = ControlProgram::parse("song.wav\n0.5 1.25 2\n0.1 0.2\n\n3.0\n").unwrap();
        assert_eq!(p.audio, "song.wav");
        assert_eq!(p.mechanism.toggles(Channel::Legs), &[0.5, 1.25, 2.0]);
        assert_eq!(p.mechanism.toggles(Channel::Mouth), &[0.1, 0.2]);
        assert!(p.mechanism.toggles(Channel::LeftEye).is_empty());
        assert_eq!(p.mechanism.toggles(Channel::RightEye), &[3.0]);
    }

    #[test]
    fn test_missing_lines_are_silent_channels() {
        let p = ControlProgram::parse("song.wav\r\n1.0\r\n").unwrap();
        assert_eq!(p.audio, "song.wav");
        assert_eq!(p.mechanism.toggles(Channel::Legs), &[1.0]);
        assert!(p.mechanism.toggles(Channel::RightEye).is_empty());
    }

    #[test]
    fn test_invalid_token_names_line() {
        let err = ControlProgram::parse("song.wav\n\n0.1 abc\n").unwrap_err();
        match err {
            UlvError::InvalidToggleData { line, token } => {
                assert_eq!(line, 3);
                assert_eq!(token, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_negative_and_nan_rejected() {
        assert!(ControlProgram::parse("a.wav\n-1\n").is_err());
        assert!(ControlProgram::parse("a.wav\nNaN\n").is_err());
    }

    #[test]
    fn test_missing_audio_name() {
        assert!(matches!(ControlProgram::parse(""), Err(UlvError::MissingAudioName)));
        assert!(matches!(ControlProgram::parse("   \n1.0"), Err(UlvError::MissingAudioName)));
    }

    #[test]
    fn test_paths_relative_to_program() {
        let p = ControlProgram::parse("track.wav\n").unwrap();
        let program = Path::new("songs/show.txt");
        assert_eq!(p.audio_path(program), Path::new("songs/track.wav"));
        assert_eq!(p.default_output(program), Path::new("songs/track.ulv"));
    }
}
