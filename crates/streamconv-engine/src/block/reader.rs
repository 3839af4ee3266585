use std::io::{self, ErrorKind, Read};

use crate::error::ConvertError;

/// Whether more blocks may follow the one just read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    More,
    /// End of input or byte limit reached; this block is the last.
    Finished,
}

/// Pulls fixed-size blocks from a source, honoring a total byte limit.
pub struct BlockReader<R> {
    inner: R,
    block_size: usize,
    /// Maximum bytes to read after the offset; 0 means unbounded.
    limit: u64,
    total_read: u64,
}

impl<R: Read> BlockReader<R> {
    pub fn new(inner: R, block_size: usize, limit: u64) -> Self {
        Self {
            inner,
            block_size,
            limit,
            total_read: 0,
        }
    }

    /// Bytes read so far, not counting the skipped offset.
    pub fn total_read(&self) -> u64 {
        self.total_read
    }

    /// Discards exactly `offset` bytes from the source.
    pub fn skip(&mut self, offset: u64) -> Result<(), ConvertError> {
        if offset == 0 {
            return Ok(());
        }
        let skipped = io::copy(&mut (&mut self.inner).take(offset), &mut io::sink())
            .map_err(ConvertError::SourceRead)?;
        if skipped < offset {
            return Err(ConvertError::OffsetBeyondInput {
                requested: offset,
                available: skipped,
            });
        }
        log::debug!("skipped {skipped} bytes of offset");
        Ok(())
    }

    /// Reads the next block into `chunk`, replacing its contents.
    ///
    /// Keeps reading until the block is full, so a short block only ever
    /// means end of input.
    pub fn read_block(&mut self, chunk: &mut Vec<u8>) -> Result<ReadStatus, ConvertError> {
        let want = self.request_len();
        chunk.clear();
        chunk.resize(want, 0);

        let mut filled = 0;
        while filled < want {
            match self.inner.read(&mut chunk[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ConvertError::SourceRead(e)),
            }
        }
        chunk.truncate(filled);
        self.total_read += filled as u64;

        if filled < want || self.limit_reached() {
            Ok(ReadStatus::Finished)
        } else {
            Ok(ReadStatus::More)
        }
    }

    fn limit_reached(&self) -> bool {
        self.limit > 0 && self.total_read >= self.limit
    }

    fn request_len(&self) -> usize {
        if self.limit == 0 {
            return self.block_size;
        }
        let remaining = self.limit.saturating_sub(self.total_read);
        remaining.min(self.block_size as u64) as usize
    }
}
