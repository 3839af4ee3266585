//! Block-level I/O: reading bounded chunks from the source and assembling
//! bounded output blocks for the sink.

pub mod reader;
pub mod writer;

pub use reader::{BlockReader, ReadStatus};
pub use writer::{BlockWriter, TrailingTrim};
