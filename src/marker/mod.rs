// Marker decompression core.
//
// - `state`: the transition function `(state, byte) -> (state, step)`
// - `sink`: append-only output destinations (buffer, counter, segment list)
// - `decoder`: MarkerDecoder: push bytes, finish, one-shot helpers

pub mod decoder;
pub mod sink;
pub mod state;

pub use decoder::{DecodeStats, MarkerDecoder, decode, decode_str, decoded_len};
pub use sink::{Counter, Run, SegmentBuffer, Sink};
pub use state::{Marker, State, Step};
