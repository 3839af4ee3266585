use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::block::{BlockReader, BlockWriter, ReadStatus, TrailingTrim};
use crate::decode::{Unit, Units, decode_head};
use crate::error::ConvertError;
use crate::transform::{Action, Pipeline, Transform, TrimState};

/// Validated settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Bytes discarded from the source before processing.
    pub offset: u64,
    /// Maximum bytes read from the source after the offset; 0 means unbounded.
    pub limit: u64,
    /// Maximum bytes read per iteration and held in one output block.
    pub block_size: usize,
    pub transforms: Vec<Transform>,
    #[serde(default)]
    pub trailing_trim: TrailingTrim,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 0,
            block_size: 1000,
            transforms: Vec::new(),
            trailing_trim: TrailingTrim::default(),
        }
    }
}

/// Totals reported after a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    /// Bytes read after the offset.
    pub bytes_read: u64,
    pub bytes_written: u64,
    /// Loop iterations, including the final drain of rejected units.
    pub blocks: u64,
    /// Malformed byte spans passed through verbatim.
    pub invalid_units: u64,
}

/// Per-stream state carried from one block to the next.
///
/// Each call to [`Converter::process_block`] is one loop iteration, so tests
/// can feed arbitrary chunkings and inspect the carry and trim state between
/// them.
pub struct Converter {
    pipeline: Pipeline,
    writer: BlockWriter,
    /// Bytes left undecoded or rejected by the writer last iteration.
    carry: Vec<u8>,
    trim: TrimState,
    invalid_units: u64,
}

impl Converter {
    pub fn new(config: &StreamConfig) -> Result<Self, ConvertError> {
        if config.block_size == 0 {
            return Err(ConvertError::InvalidBlockSize);
        }
        Ok(Self {
            pipeline: Pipeline::new(config.transforms.clone()),
            writer: BlockWriter::new(config.block_size, config.trailing_trim),
            carry: Vec::new(),
            trim: TrimState::default(),
            invalid_units: 0,
        })
    }

    pub fn carry(&self) -> &[u8] {
        &self.carry
    }

    pub fn trim_state(&self) -> TrimState {
        self.trim
    }

    pub fn invalid_units(&self) -> u64 {
        self.invalid_units
    }

    /// True when the carry already holds a block's worth of decodable
    /// input, so the next iteration should drain it instead of reading more.
    ///
    /// Mappings that widen code points leave part of every block unwritten;
    /// without draining, the carry would grow with the input.
    pub fn backlogged(&self) -> bool {
        self.carry.len() >= self.writer.block_size() && decode_head(&self.carry).is_some()
    }

    /// Runs one iteration over `carry ++ input` and writes the resulting
    /// block. Returns the bytes written.
    pub fn process_block<W: Write>(
        &mut self,
        input: &[u8],
        sink: &mut W,
    ) -> Result<usize, ConvertError> {
        let mut buf = std::mem::take(&mut self.carry);
        buf.extend_from_slice(input);

        let mut units = Units::new(&buf);
        while let Some(unit) = units.peek() {
            let accepted = match unit {
                Unit::Raw(bytes) => {
                    self.pipeline.observe_raw(&mut self.trim);
                    let accepted = self.writer.push_raw(bytes);
                    if accepted {
                        self.invalid_units += 1;
                        log::trace!("passing through {} invalid bytes", bytes.len());
                    }
                    accepted
                }
                Unit::Char { ch, .. } => match self.pipeline.apply(ch, &mut self.trim) {
                    Action::Drop => true,
                    Action::Keep(mapped) => {
                        let trimming = self.trimming();
                        self.writer.push_char(mapped, trimming)
                    }
                },
            };
            if !accepted {
                break;
            }
            units.next();
        }
        self.carry = units.remainder().to_vec();

        let trimming = self.trimming();
        let written = self.writer.flush_block(sink, trimming)?;
        log::debug!(
            "block: {} bytes in, {written} bytes out, {} bytes carried",
            input.len(),
            self.carry.len()
        );
        Ok(written)
    }

    /// Ends the stream.
    ///
    /// Units the writer rejected for lack of room are still converted, in
    /// as many extra blocks as they need. Only the undecodable tail is
    /// written verbatim. Returns the bytes written and the blocks used.
    pub fn finish<W: Write>(&mut self, sink: &mut W) -> Result<(usize, u64), ConvertError> {
        let mut written = 0;
        let mut blocks = 0;
        while Units::new(&self.carry).peek().is_some() {
            written += self.process_block(&[], sink)?;
            blocks += 1;
        }

        let tail = std::mem::take(&mut self.carry);
        if !tail.is_empty() {
            log::debug!("flushing {} undecoded trailing bytes", tail.len());
        }
        written += self.writer.write_verbatim(sink, &tail)?;
        Ok((written, blocks))
    }

    fn trimming(&self) -> bool {
        self.pipeline.trims_spaces() && self.trim.leading_trim_done()
    }
}

/// Converts `source` into `sink` according to `config`.
///
/// Reads at most `block_size` bytes per iteration and reads nothing while the
/// carry is backlogged, so memory stays bounded by the block size regardless
/// of input length. The sink is flushed before returning.
pub fn convert<R: Read, W: Write>(
    source: R,
    mut sink: W,
    config: &StreamConfig,
) -> Result<ConvertSummary, ConvertError> {
    let mut converter = Converter::new(config)?;
    let mut reader = BlockReader::new(source, config.block_size, config.limit);
    reader.skip(config.offset)?;

    let mut summary = ConvertSummary::default();
    let mut chunk = Vec::with_capacity(config.block_size);
    loop {
        if converter.backlogged() {
            summary.bytes_written += converter.process_block(&[], &mut sink)? as u64;
            summary.blocks += 1;
            continue;
        }
        let status = reader.read_block(&mut chunk)?;
        summary.bytes_written += converter.process_block(&chunk, &mut sink)? as u64;
        summary.blocks += 1;
        if status == ReadStatus::Finished {
            break;
        }
    }

    let (written, blocks) = converter.finish(&mut sink)?;
    summary.bytes_written += written as u64;
    summary.blocks += blocks;
    sink.flush().map_err(ConvertError::SinkWrite)?;

    summary.bytes_read = reader.total_read();
    summary.invalid_units = converter.invalid_units();
    log::debug!("conversion finished: {summary:?}");
    Ok(summary)
}
