// File-level helpers around the marker decoder.
//
// Provides `decode_file()` and `measure_file()`. The compressed input is
// read fully into memory (puzzle inputs are small, and trimming trailing
// whitespace needs to see the end); output is streamed through a
// `BufWriter`. Optionally computes a SHA-256 of the decoded output
// (feature-gated behind `file-io`).

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::{debug, warn};
#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::marker::decoder::decoded_len;
use crate::stream::{DecodeError, StreamDecoder};

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

// ---------------------------------------------------------------------------
// Options and stats
// ---------------------------------------------------------------------------

/// Options for file decoding.
#[derive(Debug, Clone)]
pub struct FileOptions {
    /// Drop trailing ASCII whitespace (usually the final newline) from the
    /// input before decoding.
    pub trim_trailing_whitespace: bool,
    /// Fail with `DecodeError::OutputLimit` past this many output bytes.
    pub max_output: Option<u64>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            trim_trailing_whitespace: true,
            max_output: None,
        }
    }
}

/// Statistics returned by `decode_file()` and `measure_file()`.
#[derive(Debug, Clone)]
pub struct FileStats {
    /// Input bytes decoded (after trimming).
    pub input_size: u64,
    /// Decompressed length.
    pub output_size: u64,
    /// Markers expanded (`None` for `measure_file`).
    pub markers: Option<u64>,
    /// SHA-256 of the decoded output (if `file-io` is enabled and output
    /// was produced).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Hashing writer
// ---------------------------------------------------------------------------

struct HashingWriter<W: Write> {
    inner: W,
    #[cfg(feature = "file-io")]
    hasher: sha2::Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            #[cfg(feature = "file-io")]
            hasher: sha2::Sha256::new(),
        }
    }

    fn finish(self) -> (W, Option<[u8; 32]>) {
        #[cfg(feature = "file-io")]
        let digest = Some(self.hasher.finalize().into());
        #[cfg(not(feature = "file-io"))]
        let digest: Option<[u8; 32]> = None;
        (self.inner, digest)
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        #[cfg(feature = "file-io")]
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

// ---------------------------------------------------------------------------
// Input loading
// ---------------------------------------------------------------------------

/// Read a compressed input file, trimming trailing whitespace if asked.
pub fn read_input(path: &Path, opts: &FileOptions) -> Result<Vec<u8>, DecodeError> {
    let mut data = std::fs::read(path)?;
    if opts.trim_trailing_whitespace {
        let keep = data.trim_ascii_end().len();
        data.truncate(keep);
    }
    Ok(data)
}

// ---------------------------------------------------------------------------
// decode_file / decode_bytes_to
// ---------------------------------------------------------------------------

/// Decode `input` into any writer, hashing the output on the way.
pub fn decode_bytes_to<W: Write>(
    input: &[u8],
    writer: W,
    opts: &FileOptions,
) -> Result<(W, FileStats), DecodeError> {
    let mut hashing = HashingWriter::new(writer);
    let mut decoder = StreamDecoder::with_limit(input, opts.max_output);
    let output_size = decoder.decode_to(&mut hashing)?;
    hashing.flush()?;
    let markers = decoder.markers_expanded();
    let (writer, output_sha256) = hashing.finish();

    Ok((
        writer,
        FileStats {
            input_size: input.len() as u64,
            output_size,
            markers: Some(markers),
            output_sha256,
        },
    ))
}

/// Decode the file at `input_path`, writing the decompressed text to
/// `output_path`. On failure the output file is removed.
pub fn decode_file(
    input_path: &Path,
    output_path: &Path,
    opts: &FileOptions,
) -> Result<FileStats, DecodeError> {
    let input = read_input(input_path, opts)?;
    let out = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);
    let result = decode_bytes_to(&input, out, opts).and_then(|(writer, stats)| {
        writer.into_inner().map_err(|e| e.into_error())?;
        Ok(stats)
    });
    let stats = match result {
        Ok(stats) => stats,
        Err(e) => {
            // Don't leave a partial file behind.
            if let Err(rm) = std::fs::remove_file(output_path) {
                warn!("could not remove {}: {rm}", output_path.display());
            }
            return Err(e);
        }
    };

    debug!(
        "decoded {} -> {}: {} bytes in, {} bytes out",
        input_path.display(),
        output_path.display(),
        stats.input_size,
        stats.output_size
    );
    Ok(stats)
}

// ---------------------------------------------------------------------------
// measure_file
// ---------------------------------------------------------------------------

/// Decompressed length of the file at `input_path`, without producing the
/// output. `max_output` is not applied since nothing is allocated.
pub fn measure_file(input_path: &Path, opts: &FileOptions) -> Result<FileStats, DecodeError> {
    let input = read_input(input_path, opts)?;
    let output_size = decoded_len(&input);
    debug!(
        "measured {}: {} bytes in, {output_size} bytes out",
        input_path.display(),
        input.len()
    );
    Ok(FileStats {
        input_size: input.len() as u64,
        output_size,
        markers: None,
        output_sha256: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
