// Marker grammar as an explicit transition function.
//
// One byte in, one state out. Bytes consumed while a marker is still
// tentative are held in `pending`; if the parse derails they are flushed
// verbatim and the breaking byte is re-dispatched as if seen in PLAIN.
//
//   Plain  --(-->  Open  --digit-->  Count  --x-->  Repeat  --)-->  Capture
//                                                                    |
//   Plain  <------------- unit full: emit unit `repeat` times ------+

use super::sink::Sink;

/// Upper bound on the capture buffer allocated up front. Larger units grow
/// on demand so a huge `count` in hostile input cannot force an allocation.
const MAX_UNIT_PREALLOC: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Marker
// ---------------------------------------------------------------------------

/// A parsed `(countxrepeat)` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    /// Number of bytes following the marker that form the repeat unit.
    pub count: usize,
    /// Number of times the unit is emitted.
    pub repeat: usize,
}

impl Marker {
    /// Bytes this marker expands to once its unit is complete.
    pub fn expanded_len(&self) -> u64 {
        (self.count as u64).saturating_mul(self.repeat as u64)
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}x{})", self.count, self.repeat)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Decoder mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum State {
    /// Copying bytes straight to the output.
    #[default]
    Plain,
    /// Just consumed `(`.
    Open,
    /// Accumulating the decimal count.
    Count { count: usize },
    /// Consumed `x`; accumulating the decimal repeat. `None` until the first
    /// digit arrives, so `(5x)` is not a marker.
    Repeat {
        count: usize,
        repeat: Option<usize>,
    },
    /// Marker closed; capturing `marker.count` opaque bytes.
    Capture { marker: Marker, unit: Vec<u8> },
}

/// What a single byte did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Appended to the output as-is.
    Literal,
    /// Held as tentative marker text.
    Pending,
    /// Completed a marker; capture begins.
    MarkerClosed(Marker),
    /// Stored in the capture unit.
    Captured,
    /// Completed a marker's unit (or closed a zero-count marker) and emitted
    /// its expansion.
    Expanded(Marker),
    /// End of input arrived before the marker's unit was complete. Nothing
    /// was emitted for it.
    Truncated(Marker),
    /// Broke a tentative marker. `flushed` bytes of marker text went out as
    /// literal text before the byte itself was re-dispatched.
    Reinterpreted { flushed: usize },
}

impl State {
    /// True when no marker is in progress.
    pub fn is_plain(&self) -> bool {
        matches!(self, State::Plain)
    }

    /// Consume one byte.
    pub fn step<S: Sink + ?Sized>(
        self,
        byte: u8,
        pending: &mut Vec<u8>,
        out: &mut S,
    ) -> (State, Step) {
        match self {
            State::Plain => plain(byte, pending, out),

            State::Open => match byte {
                b'0'..=b'9' => {
                    pending.push(byte);
                    (
                        State::Count {
                            count: digit_value(byte),
                        },
                        Step::Pending,
                    )
                }
                _ => derail(byte, pending, out),
            },

            State::Count { count } => match byte {
                b'0'..=b'9' => {
                    pending.push(byte);
                    (
                        State::Count {
                            count: accumulate(count, byte),
                        },
                        Step::Pending,
                    )
                }
                b'x' => {
                    pending.push(byte);
                    (
                        State::Repeat {
                            count,
                            repeat: None,
                        },
                        Step::Pending,
                    )
                }
                _ => derail(byte, pending, out),
            },

            State::Repeat { count, repeat } => match (byte, repeat) {
                (b'0'..=b'9', _) => {
                    pending.push(byte);
                    let repeat = Some(accumulate(repeat.unwrap_or(0), byte));
                    (State::Repeat { count, repeat }, Step::Pending)
                }
                (b')', Some(repeat)) => {
                    pending.clear();
                    let marker = Marker { count, repeat };
                    if count == 0 {
                        return (State::Plain, Step::Expanded(marker));
                    }
                    let unit = Vec::with_capacity(count.min(MAX_UNIT_PREALLOC));
                    (State::Capture { marker, unit }, Step::MarkerClosed(marker))
                }
                _ => derail(byte, pending, out),
            },

            State::Capture { marker, mut unit } => {
                unit.push(byte);
                if unit.len() < marker.count {
                    return (State::Capture { marker, unit }, Step::Captured);
                }
                out.put_repeated(&unit, marker.repeat);
                (State::Plain, Step::Expanded(marker))
            }
        }
    }

    /// End of input. Tentative marker text is flushed as literal. A capture
    /// unit cut short by the end of input is dropped: only completed markers
    /// contribute output.
    pub fn finish<S: Sink + ?Sized>(self, pending: &mut Vec<u8>, out: &mut S) -> Option<Step> {
        match self {
            State::Plain => None,
            State::Open | State::Count { .. } | State::Repeat { .. } => {
                let flushed = pending.len();
                out.put_slice(pending.as_slice());
                pending.clear();
                Some(Step::Reinterpreted { flushed })
            }
            State::Capture { marker, .. } => Some(Step::Truncated(marker)),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn plain<S: Sink + ?Sized>(byte: u8, pending: &mut Vec<u8>, out: &mut S) -> (State, Step) {
    if byte == b'(' {
        pending.clear();
        pending.push(byte);
        (State::Open, Step::Pending)
    } else {
        out.put(byte);
        (State::Plain, Step::Literal)
    }
}

fn derail<S: Sink + ?Sized>(byte: u8, pending: &mut Vec<u8>, out: &mut S) -> (State, Step) {
    let flushed = pending.len();
    out.put_slice(pending.as_slice());
    pending.clear();
    let (next, _) = plain(byte, pending, out);
    (next, Step::Reinterpreted { flushed })
}

#[inline]
fn digit_value(byte: u8) -> usize {
    usize::from(byte - b'0')
}

#[inline]
fn accumulate(acc: usize, byte: u8) -> usize {
    acc.saturating_mul(10).saturating_add(digit_value(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &[u8]) -> (Vec<u8>, Vec<Step>) {
        let mut state = State::Plain;
        let mut pending = Vec::new();
        let mut out = Vec::new();
        let mut steps = Vec::new();
        for &b in input {
            let (next, step) = state.step(b, &mut pending, &mut out);
            state = next;
            steps.push(step);
        }
        if let Some(step) = state.finish(&mut pending, &mut out) {
            steps.push(step);
        }
        (out, steps)
    }

    #[test]
    fn plain_bytes_are_literal() {
        let (out, steps) = run(b"AB");
        assert_eq!(out, b"AB");
        assert_eq!(steps, vec![Step::Literal, Step::Literal]);
    }

    #[test]
    fn marker_steps() {
        let (out, steps) = run(b"(2x3)ab");
        assert_eq!(out, b"ababab");
        let marker = Marker {
            count: 2,
            repeat: 3,
        };
        assert_eq!(
            steps,
            vec![
                Step::Pending,
                Step::Pending,
                Step::Pending,
                Step::Pending,
                Step::MarkerClosed(marker),
                Step::Captured,
                Step::Expanded(marker),
            ]
        );
    }

    #[test]
    fn open_then_letter_is_literal() {
        let (out, steps) = run(b"(a");
        assert_eq!(out, b"(a");
        assert_eq!(steps[1], Step::Reinterpreted { flushed: 1 });
    }

    #[test]
    fn open_then_x_is_literal() {
        let (out, _) = run(b"(x5)AB");
        assert_eq!(out, b"(x5)AB");
    }

    #[test]
    fn derail_on_paren_reopens() {
        let (out, _) = run(b"(12((1x2)Q");
        assert_eq!(out, b"(12(QQ");
    }

    #[test]
    fn repeat_without_digits_is_not_a_marker() {
        let (out, steps) = run(b"(5x)ABC");
        assert_eq!(out, b"(5x)ABC");
        assert_eq!(steps[3], Step::Reinterpreted { flushed: 3 });
    }

    #[test]
    fn leading_zeros_survive_reinterpretation() {
        let (out, _) = run(b"(007xq");
        assert_eq!(out, b"(007xq");
    }

    #[test]
    fn zero_count_is_a_no_op() {
        let (out, steps) = run(b"A(0x9)B");
        assert_eq!(out, b"AB");
        assert!(steps.contains(&Step::Expanded(Marker {
            count: 0,
            repeat: 9
        })));
    }

    #[test]
    fn zero_repeat_drops_unit() {
        let (out, _) = run(b"A(2x0)BCD");
        assert_eq!(out, b"AD");
    }

    #[test]
    fn pending_text_flushed_at_end() {
        let (out, steps) = run(b"AB(12x3");
        assert_eq!(out, b"AB(12x3");
        assert_eq!(steps.last(), Some(&Step::Reinterpreted { flushed: 5 }));
    }

    #[test]
    fn truncated_capture_emits_nothing() {
        let (out, steps) = run(b"(5x2)AB");
        assert!(out.is_empty());
        assert_eq!(
            steps.last(),
            Some(&Step::Truncated(Marker {
                count: 5,
                repeat: 2
            }))
        );

        let (out, _) = run(b"XY(3x4)Z");
        assert_eq!(out, b"XY");
    }

    #[test]
    fn huge_numbers_saturate() {
        let (state, _) = State::Count {
            count: usize::MAX / 2,
        }
        .step(b'9', &mut vec![b'('], &mut Vec::<u8>::new());
        assert_eq!(state, State::Count { count: usize::MAX });
    }

    #[test]
    fn marker_display() {
        let m = Marker {
            count: 8,
            repeat: 2,
        };
        assert_eq!(m.to_string(), "(8x2)");
        assert_eq!(m.expanded_len(), 16);
    }
}
