use std::io;

/// Fatal failures of a conversion run.
///
/// Malformed input is not an error: invalid bytes are passed through as
/// [`Unit::Raw`](crate::decode::Unit::Raw) and only counted.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("apply offset failed: offset {requested} is past the end of input ({available} bytes)")]
    OffsetBeyondInput { requested: u64, available: u64 },
    #[error("error while reading: {0}")]
    SourceRead(#[source] io::Error),
    #[error("error while writing: {0}")]
    SinkWrite(#[source] io::Error),
    #[error("block size must be greater than zero")]
    InvalidBlockSize,
}
