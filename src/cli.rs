// Command-line front end for unmarker.
//
// Subcommands decode a file, print the decompressed length, or run the
// built-in sample strings. Errors go to stderr and map to exit code 1.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};
use log::info;

use crate::io::{FileOptions, FileStats, decode_bytes_to, read_input};
use crate::marker::decoder::{decode_str, decoded_len};
use crate::stream::CHUNK_SIZE;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024;

/// Sample inputs printed by `samples`.
const SAMPLES: &[&str] = &[
    "ADVENT",
    "A(1x5)BC",
    "(3x3)XYZ",
    "A(2x2)BCD(2x2)EFG",
    "(6x1)(1x3)A",
    "X(8x2)(3x3)ABCY",
];

// ---------------------------------------------------------------------------
// Byte size parsing (supports K, M, G suffixes)
// ---------------------------------------------------------------------------

fn parse_byte_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty size string".into());
    }
    let (num_part, multiplier) = match s.as_bytes().last() {
        Some(b'k' | b'K') => (&s[..s.len() - 1], 1024u64),
        Some(b'm' | b'M') => (&s[..s.len() - 1], 1024 * 1024),
        Some(b'g' | b'G') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        _ => (s, 1u64),
    };
    let num: u64 = num_part
        .trim()
        .parse()
        .map_err(|e| format!("invalid size '{s}': {e}"))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size overflow: '{s}'"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Decoder for (NxM) repeat-marker compressed text.
#[derive(Parser, Debug)]
#[command(
    name = "unmarker",
    version,
    about = "Repeat-marker decompressor",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Decompress an input file.
    Decode(DecodeArgs),
    /// Print the decompressed length of an input file.
    Length(LengthArgs),
    /// Decode the built-in sample strings.
    Samples,
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Keep trailing whitespace (including the final newline) in the input.
    #[arg(long)]
    raw: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Input file.
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    /// Output file (default: stdout).
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "output_pos")]
    output: Option<PathBuf>,

    /// Write output to stdout.
    #[arg(short = 'c', long)]
    stdout: bool,

    /// Decode without writing output.
    #[arg(long = "check-only")]
    no_output: bool,

    /// Fail if the output would exceed this size (supports K/M/G suffix).
    #[arg(long = "max-output", value_parser = parse_byte_size)]
    max_output: Option<u64>,

    #[command(flatten)]
    input_opts: InputArgs,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,

    /// Output file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    output_pos: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LengthArgs {
    /// Input file.
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "input_pos")]
    input: Option<PathBuf>,

    #[command(flatten)]
    input_opts: InputArgs,

    /// Input file (positional form).
    #[arg(value_hint = ValueHint::FilePath)]
    input_pos: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Decode,
    Length,
    Samples,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    use_stdout: bool,
    no_output: bool,
    raw: bool,
    max_output: Option<u64>,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
}

impl Options {
    fn new(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            use_stdout: false,
            no_output: false,
            raw: false,
            max_output: None,
            input_file: None,
            output_file: None,
        }
    }

    fn file_options(&self) -> FileOptions {
        FileOptions {
            trim_trailing_whitespace: !self.raw,
            max_output: self.max_output,
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    match &cli.command {
        Cmd::Decode(args) => {
            let mut opts = Options::new(Command::Decode, &cli);
            opts.use_stdout = args.stdout;
            opts.no_output = args.no_output;
            opts.raw = args.input_opts.raw;
            opts.max_output = args.max_output;
            opts.input_file = args.input.clone().or_else(|| args.input_pos.clone());
            opts.output_file = args.output.clone().or_else(|| args.output_pos.clone());
            opts
        }
        Cmd::Length(args) => {
            let mut opts = Options::new(Command::Length, &cli);
            opts.raw = args.input_opts.raw;
            opts.input_file = args.input.clone().or_else(|| args.input_pos.clone());
            opts
        }
        Cmd::Samples => Options::new(Command::Samples, &cli),
        Cmd::Config => Options::new(Command::Config, &cli),
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("unmarker".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let _ = resolve_options(cli);
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn load_input(opts: &Options) -> Result<Vec<u8>, i32> {
    let Some(path) = &opts.input_file else {
        eprintln!("unmarker: no input file given");
        return Err(1);
    };
    read_input(path, &opts.file_options()).map_err(|e| {
        eprintln!("unmarker: input file: {}: {e}", path.display());
        1
    })
}

fn emit_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => eprintln!("{text}"),
        Err(e) => eprintln!("unmarker: json error: {e}"),
    }
}

fn hex(digest: &[u8]) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("unmarker version {version}");

    let file_io = cfg!(feature = "file-io") as u8;
    let ptr_size = std::mem::size_of::<*const ()>();

    eprintln!("FILE_IO={file_io}");
    eprintln!("CHUNK_SIZE={CHUNK_SIZE}");
    eprintln!("BUF_SIZE={BUF_SIZE}");
    eprintln!("sizeof(usize)={ptr_size}");

    0
}

// ---------------------------------------------------------------------------
// Samples command
// ---------------------------------------------------------------------------

fn cmd_samples(opts: &Options) -> i32 {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for sample in SAMPLES {
        let decoded = decode_str(sample);
        let line = if opts.verbose > 0 {
            writeln!(out, "{sample} -> {decoded} ({})", decoded.len())
        } else {
            writeln!(out, "{decoded}")
        };
        if let Err(e) = line {
            eprintln!("unmarker: write error: {e}");
            return 1;
        }
    }
    0
}

// ---------------------------------------------------------------------------
// Length command
// ---------------------------------------------------------------------------

fn cmd_length(opts: &Options) -> i32 {
    let input = match load_input(opts) {
        Ok(data) => data,
        Err(code) => return code,
    };

    let length = decoded_len(&input);
    info!("input size: {}, decompressed length: {length}", input.len());
    println!("{length}");

    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "length",
            "input_size": input.len(),
            "output_size": length,
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Decode command
// ---------------------------------------------------------------------------

/// Output file the decode command writes to, if any.
fn output_path(opts: &Options) -> Option<&Path> {
    match &opts.output_file {
        Some(path) if !opts.no_output && !opts.use_stdout => Some(path),
        _ => None,
    }
}

fn open_output(opts: &Options) -> Result<Box<dyn Write>, i32> {
    if opts.no_output {
        return Ok(Box::new(io::sink()));
    }
    let Some(path) = output_path(opts) else {
        return Ok(Box::new(BufWriter::with_capacity(
            BUF_SIZE,
            io::stdout().lock(),
        )));
    };
    if path.exists() && !opts.force {
        eprintln!(
            "unmarker: output file exists, use -f to overwrite: {}",
            path.display()
        );
        return Err(1);
    }
    match File::create(path) {
        Ok(f) => Ok(Box::new(BufWriter::with_capacity(BUF_SIZE, f))),
        Err(e) => {
            eprintln!("unmarker: output file: {}: {e}", path.display());
            Err(1)
        }
    }
}

fn report_decode(opts: &Options, stats: &FileStats) {
    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "unmarker: decoder: input size: {}, output size: {}, markers: {}",
            stats.input_size,
            stats.output_size,
            stats.markers.unwrap_or(0)
        );
    }
    if opts.json_output {
        emit_json(&serde_json::json!({
            "command": "decode",
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "markers": stats.markers,
            "output_sha256": stats.output_sha256.as_ref().map(|d| hex(d)),
        }));
    }
}

fn cmd_decode(opts: &Options) -> i32 {
    let input = match load_input(opts) {
        Ok(data) => data,
        Err(code) => return code,
    };
    let writer = match open_output(opts) {
        Ok(w) => w,
        Err(code) => return code,
    };

    let result = decode_bytes_to(&input, writer, &opts.file_options())
        .map_err(|e| format!("decode error: {e}"))
        .and_then(|(mut writer, stats)| {
            writer
                .flush()
                .map_err(|e| format!("write flush error: {e}"))?;
            Ok(stats)
        });

    match result {
        Ok(stats) => {
            report_decode(opts, &stats);
            0
        }
        Err(msg) => {
            eprintln!("unmarker: {msg}");
            if let Some(path) = output_path(opts) {
                if let Err(e) = std::fs::remove_file(path) {
                    eprintln!("unmarker: output file: {}: {e}", path.display());
                }
            }
            1
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let mut opts = resolve_options(cli);

    let default_filter = match (opts.quiet, opts.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    // Warn if -c overrides output filename.
    if opts.use_stdout && !opts.quiet {
        if let Some(path) = opts.output_file.take() {
            eprintln!(
                "unmarker: warning: -c option overrides output filename: {}",
                path.display()
            );
        }
    }

    let exit_code = match opts.command {
        Command::Decode => cmd_decode(&opts),
        Command::Length => cmd_length(&opts),
        Command::Samples => cmd_samples(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
