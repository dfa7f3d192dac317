// Error type for sequence encoding, writing and inspection.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmfError {
    #[error("I/O error while writing sequence: {0}")]
    Io(#[from] std::io::Error),

    #[error("delta time {0} exceeds the largest encodable quantity (2^28 - 1)")]
    DeltaTooLarge(u64),

    #[error("{0} tracks exceed the 65535 a file header can declare")]
    TooManyTracks(usize),

    #[error("variable-length quantity truncated")]
    TruncatedQuantity,

    #[error("malformed sequence data: {0}")]
    Parse(#[from] midly::Error),
}
