// Output sinks for the marker state machine.
//
// The transition function only ever appends. A sink decides what appending
// means: a growable buffer, a length counter, or a segment list that keeps
// large repeats symbolic until they are written out.

/// Repeats up to this many bytes are expanded inline by `SegmentBuffer`.
pub const INLINE_REPEAT_MAX: usize = 64 * 1024;

/// Append-only destination for decoded bytes.
pub trait Sink {
    /// Append a single byte.
    fn put(&mut self, byte: u8);

    /// Append a slice verbatim.
    fn put_slice(&mut self, bytes: &[u8]);

    /// Append `unit` exactly `times` times.
    fn put_repeated(&mut self, unit: &[u8], times: usize) {
        for _ in 0..times {
            self.put_slice(unit);
        }
    }
}

/// Reserve room for `times` copies of a `unit_len`-byte unit if the
/// allocator allows it. Returns false when the hint was dropped.
fn reserve_hint(buf: &mut Vec<u8>, unit_len: usize, times: usize) -> bool {
    match unit_len.checked_mul(times) {
        Some(total) => buf.try_reserve(total).is_ok(),
        None => false,
    }
}

impl Sink for Vec<u8> {
    #[inline]
    fn put(&mut self, byte: u8) {
        self.push(byte);
    }

    #[inline]
    fn put_slice(&mut self, bytes: &[u8]) {
        self.extend_from_slice(bytes);
    }

    fn put_repeated(&mut self, unit: &[u8], times: usize) {
        if unit.is_empty() || times == 0 {
            return;
        }
        reserve_hint(self, unit.len(), times);
        for _ in 0..times {
            self.extend_from_slice(unit);
        }
    }
}

// ---------------------------------------------------------------------------
// Counter
// ---------------------------------------------------------------------------

/// Sink that only counts bytes. Used to measure decoded length without
/// materializing the output.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    len: u64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes counted so far (saturates at `u64::MAX`).
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Sink for Counter {
    #[inline]
    fn put(&mut self, _byte: u8) {
        self.len = self.len.saturating_add(1);
    }

    #[inline]
    fn put_slice(&mut self, bytes: &[u8]) {
        self.len = self.len.saturating_add(bytes.len() as u64);
    }

    fn put_repeated(&mut self, unit: &[u8], times: usize) {
        self.len = self.len.saturating_add(repeat_len(unit, times));
    }
}

// ---------------------------------------------------------------------------
// Tally
// ---------------------------------------------------------------------------

/// Pass-through sink that counts the bytes forwarded to `inner`.
pub(crate) struct Tally<'a, S: Sink + ?Sized> {
    inner: &'a mut S,
    count: u64,
}

impl<'a, S: Sink + ?Sized> Tally<'a, S> {
    pub(crate) fn new(inner: &'a mut S) -> Self {
        Self { inner, count: 0 }
    }

    pub(crate) fn count(&self) -> u64 {
        self.count
    }
}

impl<S: Sink + ?Sized> Sink for Tally<'_, S> {
    #[inline]
    fn put(&mut self, byte: u8) {
        self.count = self.count.saturating_add(1);
        self.inner.put(byte);
    }

    #[inline]
    fn put_slice(&mut self, bytes: &[u8]) {
        self.count = self.count.saturating_add(bytes.len() as u64);
        self.inner.put_slice(bytes);
    }

    fn put_repeated(&mut self, unit: &[u8], times: usize) {
        self.count = self.count.saturating_add(repeat_len(unit, times));
        self.inner.put_repeated(unit, times);
    }
}

// ---------------------------------------------------------------------------
// SegmentBuffer
// ---------------------------------------------------------------------------

/// A repeat kept symbolic: `unit` emitted `times` times, positioned before
/// byte `at` of the accompanying literal buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub at: usize,
    pub unit: Vec<u8>,
    pub times: usize,
}

impl Run {
    /// Bytes this run expands to (saturating).
    pub fn len(&self) -> u64 {
        repeat_len(&self.unit, self.times)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Growable buffer that expands small repeats inline and records large ones
/// as [`Run`]s, so a marker such as `(2x9000000000000000000)` costs one unit
/// of memory until a writer consumes it piece by piece.
#[derive(Debug, Default)]
pub struct SegmentBuffer {
    buf: Vec<u8>,
    runs: Vec<Run>,
}

impl SegmentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes held, counting runs at their expanded size (saturating).
    pub fn total(&self) -> u64 {
        self.runs
            .iter()
            .fold(self.buf.len() as u64, |acc, run| acc.saturating_add(run.len()))
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty() && self.runs.is_empty()
    }

    /// Drain the literal bytes and the runs positioned within them.
    pub fn take(&mut self) -> (Vec<u8>, Vec<Run>) {
        (std::mem::take(&mut self.buf), std::mem::take(&mut self.runs))
    }
}

impl Sink for SegmentBuffer {
    #[inline]
    fn put(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    #[inline]
    fn put_slice(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn put_repeated(&mut self, unit: &[u8], times: usize) {
        if unit.is_empty() || times == 0 {
            return;
        }
        match unit.len().checked_mul(times) {
            Some(total) if total <= INLINE_REPEAT_MAX => self.buf.put_repeated(unit, times),
            _ => self.runs.push(Run {
                at: self.buf.len(),
                unit: unit.to_vec(),
                times,
            }),
        }
    }
}

#[inline]
fn repeat_len(unit: &[u8], times: usize) -> u64 {
    (unit.len() as u64).saturating_mul(times as u64)
}
