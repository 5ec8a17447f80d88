// Push decoder over the marker state machine.
//
// MarkerDecoder owns the live state, the tentative marker text and a sink.
// Input may arrive in arbitrary chunks; chunk boundaries never change the
// result because the state machine only ever looks at one byte at a time.

use log::{debug, trace};

use super::sink::{Counter, Sink, Tally};
use super::state::{State, Step};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Counters collected while decoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    /// Input bytes consumed.
    pub bytes_in: u64,
    /// Output bytes handed to the sink (saturating).
    pub bytes_out: u64,
    /// Completed markers, including zero-count markers.
    pub markers: u64,
    /// Markers whose unit was cut short by end of input.
    pub truncated: u64,
    /// Tentative markers that fell back to literal text.
    pub reinterpreted: u64,
}

// ---------------------------------------------------------------------------
// MarkerDecoder
// ---------------------------------------------------------------------------

/// Incremental marker decoder writing into a [`Sink`].
#[derive(Debug)]
pub struct MarkerDecoder<S: Sink = Vec<u8>> {
    state: State,
    pending: Vec<u8>,
    sink: S,
    stats: DecodeStats,
}

impl MarkerDecoder<Vec<u8>> {
    /// Decoder collecting output into a `Vec<u8>`.
    pub fn new() -> Self {
        Self::with_sink(Vec::new())
    }

    /// Decoder whose output buffer starts with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_sink(Vec::with_capacity(capacity))
    }

    /// Drain the output produced so far.
    pub fn take_output(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.sink)
    }
}

impl Default for MarkerDecoder<Vec<u8>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sink> MarkerDecoder<S> {
    /// Decoder writing into `sink`.
    pub fn with_sink(sink: S) -> Self {
        Self {
            state: State::Plain,
            pending: Vec::new(),
            sink,
            stats: DecodeStats::default(),
        }
    }

    /// Feed a chunk of input.
    pub fn push(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push_byte(b);
        }
    }

    /// Feed a single byte.
    #[inline]
    pub fn push_byte(&mut self, byte: u8) {
        let state = std::mem::take(&mut self.state);
        let mut tally = Tally::new(&mut self.sink);
        let (next, step) = state.step(byte, &mut self.pending, &mut tally);
        let written = tally.count();
        self.state = next;
        self.stats.bytes_in += 1;
        self.stats.bytes_out = self.stats.bytes_out.saturating_add(written);
        self.record(step);
    }

    /// Signal end of input and return the sink.
    pub fn finish(mut self) -> S {
        self.finish_in_place();
        self.sink
    }

    /// Signal end of input without giving up the sink. The decoder is back in
    /// its initial state afterwards.
    pub fn finish_in_place(&mut self) {
        let state = std::mem::take(&mut self.state);
        let mut tally = Tally::new(&mut self.sink);
        let step = state.finish(&mut self.pending, &mut tally);
        let written = tally.count();
        self.stats.bytes_out = self.stats.bytes_out.saturating_add(written);
        if let Some(step) = step {
            self.record(step);
        }
    }

    /// Counters collected so far.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Current mode of the state machine.
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Output sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable output sink, for draining output mid-stream.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn record(&mut self, step: Step) {
        match step {
            Step::Expanded(marker) => {
                trace!("marker {marker} expanded to {} bytes", marker.expanded_len());
                self.stats.markers += 1;
            }
            Step::Truncated(marker) => {
                debug!("input ended inside the unit of marker {marker}; unit dropped");
                self.stats.truncated += 1;
            }
            Step::Reinterpreted { flushed } => {
                trace!(
                    "marker text reinterpreted as literal at input byte {} ({flushed} bytes)",
                    self.stats.bytes_in
                );
                self.stats.reinterpreted += 1;
            }
            Step::Literal | Step::Pending | Step::MarkerClosed(_) | Step::Captured => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience functions
// ---------------------------------------------------------------------------

/// Decompress `input` in one call.
pub fn decode(input: &[u8]) -> Vec<u8> {
    let mut decoder = MarkerDecoder::with_capacity(input.len());
    decoder.push(input);
    decoder.finish()
}

/// Decompress a string. Output that is not valid UTF-8 is converted lossily.
pub fn decode_str(input: &str) -> String {
    match String::from_utf8(decode(input.as_bytes())) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}

/// Length of the decompressed output, computed without materializing it.
pub fn decoded_len(input: &[u8]) -> u64 {
    let mut decoder = MarkerDecoder::with_sink(Counter::new());
    decoder.push(input);
    decoder.finish().len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
