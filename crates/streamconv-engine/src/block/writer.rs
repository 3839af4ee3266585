use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::error::ConvertError;

/// How trailing whitespace is removed once leading trim is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrailingTrim {
    /// Strip trailing whitespace from every emitted block.
    ///
    /// Whitespace at the end of a block is removed even when more text
    /// follows in the next block. Kept as the default for compatibility.
    #[default]
    PerBlock,
    /// Hold whitespace back until the next non-whitespace unit, dropping it
    /// only at the end of the stream.
    Stream,
}

impl fmt::Display for TrailingTrim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailingTrim::PerBlock => f.write_str("per-block"),
            TrailingTrim::Stream => f.write_str("stream"),
        }
    }
}

impl FromStr for TrailingTrim {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "per-block" => Ok(TrailingTrim::PerBlock),
            "stream" => Ok(TrailingTrim::Stream),
            other => Err(format!(
                "unknown trailing trim policy: {other} (expected per-block or stream)"
            )),
        }
    }
}

/// Accumulates one block of encoded output, bounded by `block_size`.
pub struct BlockWriter {
    block_size: usize,
    policy: TrailingTrim,
    buf: Vec<u8>,
    /// Length of `buf` up to and including the last non-whitespace unit.
    content_end: usize,
    /// Whitespace held back under [`TrailingTrim::Stream`]. Unbounded: a long
    /// whitespace run is buffered in full until content follows it.
    pending: Vec<u8>,
    /// Bytes at the front of `pending` already committed to earlier blocks.
    pending_start: usize,
}

impl BlockWriter {
    pub fn new(block_size: usize, policy: TrailingTrim) -> Self {
        Self {
            block_size,
            policy,
            buf: Vec::with_capacity(block_size),
            content_end: 0,
            pending: Vec::new(),
            pending_start: 0,
        }
    }

    /// Encoded bytes of the current, unflushed block.
    pub fn block(&self) -> &[u8] {
        &self.buf
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Held-back whitespace not yet committed to any block.
    pub fn pending_whitespace(&self) -> &[u8] {
        &self.pending[self.pending_start..]
    }

    /// Tries to append a kept code point.
    ///
    /// Returns false if the code point does not fit. The code point is then
    /// not taken, though held-back whitespace ahead of it may have been
    /// committed to the block. `trimming` is true once leading trim is done
    /// on a stream that trims spaces.
    pub fn push_char(&mut self, ch: char, trimming: bool) -> bool {
        let mut encoded = [0u8; 4];
        let encoded = ch.encode_utf8(&mut encoded).as_bytes();

        if ch.is_whitespace() {
            if trimming && self.policy == TrailingTrim::Stream {
                self.pending.extend_from_slice(encoded);
                return true;
            }
            if !self.fits(encoded.len()) {
                return false;
            }
            self.buf.extend_from_slice(encoded);
            return true;
        }

        self.push_content(encoded)
    }

    /// Tries to append an invalid byte span verbatim.
    pub fn push_raw(&mut self, bytes: &[u8]) -> bool {
        self.push_content(bytes)
    }

    /// Writes the current block to `sink` and starts a new one.
    ///
    /// With `trim_trailing` set under [`TrailingTrim::PerBlock`], trailing
    /// whitespace is cut from the block first. Returns the bytes written.
    pub fn flush_block<W: Write>(
        &mut self,
        sink: &mut W,
        trim_trailing: bool,
    ) -> Result<usize, ConvertError> {
        if trim_trailing && self.policy == TrailingTrim::PerBlock {
            self.buf.truncate(self.content_end);
        }
        let written = self.buf.len();
        if written > 0 {
            sink.write_all(&self.buf).map_err(ConvertError::SinkWrite)?;
        }
        self.buf.clear();
        self.content_end = 0;
        Ok(written)
    }

    /// Writes bytes straight to the sink, outside any block.
    ///
    /// Used for the undecodable tail at end of stream. Whitespace still
    /// pending is written ahead of it since the tail is not whitespace.
    pub fn write_verbatim<W: Write>(
        &mut self,
        sink: &mut W,
        bytes: &[u8],
    ) -> Result<usize, ConvertError> {
        if bytes.is_empty() {
            return Ok(0);
        }
        let pending = self.pending_whitespace();
        for piece in pending.chunks(self.block_size.max(1)) {
            sink.write_all(piece).map_err(ConvertError::SinkWrite)?;
        }
        sink.write_all(bytes).map_err(ConvertError::SinkWrite)?;
        let written = pending.len() + bytes.len();
        self.pending.clear();
        self.pending_start = 0;
        Ok(written)
    }

    fn push_content(&mut self, bytes: &[u8]) -> bool {
        if !self.commit_pending() || !self.fits(bytes.len()) {
            return false;
        }
        self.buf.extend_from_slice(bytes);
        self.content_end = self.buf.len();
        true
    }

    /// Moves as much held-back whitespace into the block as fits, cut on a
    /// code point boundary. Returns true once none is left.
    fn commit_pending(&mut self) -> bool {
        let rest = &self.pending[self.pending_start..];
        if rest.is_empty() {
            return true;
        }

        let room = self.block_size.saturating_sub(self.buf.len());
        let mut take = room.min(rest.len());
        while take < rest.len() && is_continuation(rest[take]) {
            take -= 1;
        }
        if take == 0 && self.buf.is_empty() {
            take = 1;
            while take < rest.len() && is_continuation(rest[take]) {
                take += 1;
            }
        }
        self.buf.extend_from_slice(&rest[..take]);
        self.pending_start += take;

        if self.pending_start < self.pending.len() {
            return false;
        }
        self.pending.clear();
        self.pending_start = 0;
        true
    }

    /// The first unit of a block is always accepted so every block makes
    /// progress, even when `block_size` is narrower than one code point.
    fn fits(&self, additional: usize) -> bool {
        self.buf.is_empty() || self.buf.len() + additional <= self.block_size
    }
}

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}
