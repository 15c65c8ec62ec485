//! Error types for the ulvpack library.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, UlvError>;

#[derive(Debug, Error)]
pub enum UlvError {
    #[error("invalid file! could not read control program '{}': {source}", .path.display())]
    ProgramFileUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// `line` is 1-based within the control program file.
    #[error("line {line} includes invalid data! ({token:?})")]
    InvalidToggleData { line: usize, token: String },

    #[error("control program does not name an audio file on its first line")]
    MissingAudioName,

    #[error("could not read audio '{}': {source}", .path.display())]
    AudioUnreadable {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("unsupported sample format: {bits}-bit {kind}")]
    UnsupportedSampleFormat { bits: u16, kind: &'static str },

    #[error("too many bytes to write! ({required}/{capacity})")]
    CapacityExceeded { required: u64, capacity: u64 },

    #[error("ran out of mechanism bytes before audio sample {audio_index}")]
    MechanismUnderrun { audio_index: usize },

    #[error("invalid encoding parameters: {0}")]
    InvalidParams(String),

    #[error("malformed program image: {0}")]
    MalformedImage(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}
