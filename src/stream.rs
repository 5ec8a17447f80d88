// Streaming marker decoder over std::io.
//
// StreamDecoder pulls input from any `Read` in fixed-size chunks, runs it
// through a MarkerDecoder and hands the output to any `Write` after every
// chunk. Large repeats stay symbolic in a SegmentBuffer and are written in
// bounded pieces, so memory stays bounded by one chunk's literal output plus
// the units of the markers it completed.

use std::io::{self, Read, Write};

use log::debug;
use thiserror::Error;

use crate::marker::decoder::{DecodeStats, MarkerDecoder};
use crate::marker::sink::{Run, SegmentBuffer};

/// Input chunk size.
pub const CHUNK_SIZE: usize = 64 * 1024; // 64 KiB

/// Upper bound on the scratch buffer used to write one repeated unit.
const PIECE_SIZE: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the I/O layer around the decoder. The marker grammar itself
/// is total and never produces an error.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("output limit exceeded: input expands to at least {produced} bytes, limit is {limit}")]
    OutputLimit { limit: u64, produced: u64 },
}

// ---------------------------------------------------------------------------
// StreamDecoder
// ---------------------------------------------------------------------------

/// Chunked decoder with progress tracking.
pub struct StreamDecoder<R: Read> {
    reader: R,
    decoder: MarkerDecoder<SegmentBuffer>,
    limit: Option<u64>,
    bytes_read: u64,
    bytes_written: u64,
    chunk: Vec<u8>,
}

impl<R: Read> StreamDecoder<R> {
    /// Create a streaming decoder with no output limit.
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, None)
    }

    /// Create a decoder that fails once the output would exceed `limit` bytes.
    pub fn with_limit(reader: R, limit: Option<u64>) -> Self {
        Self {
            reader,
            decoder: MarkerDecoder::with_sink(SegmentBuffer::new()),
            limit,
            bytes_read: 0,
            bytes_written: 0,
            chunk: vec![0u8; CHUNK_SIZE],
        }
    }

    /// Decode the whole input, writing output to `writer`.
    ///
    /// Returns the total number of bytes written.
    pub fn decode_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<u64, DecodeError> {
        while self.decode_chunk_to(writer)?.is_some() {}
        Ok(self.bytes_written)
    }

    /// Decode the next input chunk, writing whatever output it completes.
    ///
    /// Returns `Some(bytes_consumed)` while input remains, and `None` once
    /// the input is exhausted and any trailing marker text has been flushed.
    pub fn decode_chunk_to<W: Write + ?Sized>(
        &mut self,
        writer: &mut W,
    ) -> Result<Option<usize>, DecodeError> {
        let n = loop {
            match self.reader.read(&mut self.chunk) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(DecodeError::Io(e)),
            }
        };

        if n == 0 {
            self.decoder.finish_in_place();
            self.drain_to(writer)?;
            debug!(
                "stream decode done: {} bytes in, {} bytes out",
                self.bytes_read, self.bytes_written
            );
            return Ok(None);
        }

        self.decoder.push(&self.chunk[..n]);
        self.bytes_read += n as u64;
        self.drain_to(writer)?;
        Ok(Some(n))
    }

    fn drain_to<W: Write + ?Sized>(&mut self, writer: &mut W) -> Result<(), DecodeError> {
        let sink = self.decoder.sink_mut();
        if sink.is_empty() {
            return Ok(());
        }
        let produced = self.bytes_written.saturating_add(sink.total());
        if let Some(limit) = self.limit.filter(|&limit| produced > limit) {
            return Err(DecodeError::OutputLimit { limit, produced });
        }

        let (buf, runs) = sink.take();
        let mut start = 0;
        for run in &runs {
            writer.write_all(&buf[start..run.at])?;
            write_run(writer, run)?;
            start = run.at;
        }
        writer.write_all(&buf[start..])?;
        self.bytes_written = produced;
        Ok(())
    }

    /// Input bytes consumed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Output bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Markers expanded so far.
    pub fn markers_expanded(&self) -> u64 {
        self.decoder.stats().markers
    }

    /// Full decoder counters.
    pub fn stats(&self) -> DecodeStats {
        self.decoder.stats()
    }
}

/// Write `run.unit` `run.times` times through a scratch buffer of at most
/// `PIECE_SIZE` bytes (or one unit, if the unit is larger).
fn write_run<W: Write + ?Sized>(writer: &mut W, run: &Run) -> io::Result<()> {
    let unit_len = run.unit.len();
    if unit_len == 0 {
        return Ok(());
    }
    let per_piece = (PIECE_SIZE / unit_len).clamp(1, run.times.max(1));
    let piece = run.unit.repeat(per_piece);
    let mut left = run.times;
    while left > 0 {
        let n = per_piece.min(left);
        writer.write_all(&piece[..n * unit_len])?;
        left -= n;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
