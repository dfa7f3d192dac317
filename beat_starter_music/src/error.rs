// Error type for the music crate.
//
// Generation itself never fails: unresolved roots, unknown scale names and
// malformed meters are replaced by defaults at the point of use. What remains
// are name resolution for callers that want to know, configuration loading,
// and the final write of the sequence.

use beat_starter_smf::SmfError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MusicError {
    #[error("Invalid note name: {0:?}")]
    InvalidNoteName(String),

    #[error(transparent)]
    Sequence(#[from] SmfError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
