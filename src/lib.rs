//! Unmarker: decoder for `(countxrepeat)` repeat-marker compressed text.
//!
//! A marker `(NxM)` says: take the next `N` bytes and emit them `M` times.
//! Anything that only looks like the start of a marker is kept as literal
//! text, so every input decodes.
//!
//! The crate provides:
//! - The marker state machine and push decoder (`marker`)
//! - A chunked decoder over `Read`/`Write` (`stream`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use unmarker::marker::{decode, decoded_len};
//!
//! assert_eq!(decode(b"A(2x2)BCD(2x2)EFG"), b"ABCBCDEFEFG");
//! assert_eq!(decoded_len(b"X(8x2)(3x3)ABCY"), 18);
//! ```

pub mod io;
pub mod marker;
pub mod stream;

#[cfg(feature = "cli")]
pub mod cli;
