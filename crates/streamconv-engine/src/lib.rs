//! Streaming UTF-8 conversion engine.
//!
//! Reads a byte stream in bounded blocks, decodes it into code points without
//! splitting multi-byte sequences across reads, applies an ordered list of
//! [`Transform`]s and writes the result in blocks of at most `block_size`
//! bytes.
//!
//! ```
//! use streamconv_engine::{StreamConfig, Transform, convert};
//!
//! let config = StreamConfig {
//!     transforms: vec![Transform::TrimSpaces, Transform::ToLower],
//!     ..StreamConfig::default()
//! };
//! let mut out = Vec::new();
//! convert(&b"  HELLO world  "[..], &mut out, &config).unwrap();
//! assert_eq!(out, b"hello world");
//! ```

pub mod block;
pub mod decode;
pub mod error;
pub mod stream;
pub mod transform;


// Re-export key types for easier usage
pub use block::{BlockReader, BlockWriter, ReadStatus, TrailingTrim};
pub use error::ConvertError;
pub use stream::{ConvertSummary, Converter, StreamConfig, convert};
pub use transform::{Action, Pipeline, Transform, TrimState, UnknownTransform};
