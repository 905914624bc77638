use std::fs::{self, File};
use std::io::{self, BufWriter, IsTerminal, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use forzadata_core::{
    DEFAULT_BIND_ADDR, DEFAULT_PORT, JsonLinesSink, Layout, SessionOptions, SessionSummary,
    UdpSource, decode_capture_file, run_session,
};
use glob::glob;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FORZADATA_BUILD_COMMIT"),
    " ",
    env!("FORZADATA_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "forzadata")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder for racing-simulator \"Data Out\" UDP telemetry (sled / dash layouts).",
    long_about = None,
    after_help = "Examples:\n  forzadata listen --port 5300 --format dash\n  forzadata listen --race-only -o session.jsonl\n  forzadata pcap decode capture.pcapng --port 5300 -o session.jsonl"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Receive telemetry datagrams on a UDP port and print them as JSON lines.
    Listen {
        /// Local address to bind
        #[arg(long, default_value = DEFAULT_BIND_ADDR)]
        bind: String,

        /// UDP port configured as "Data Out" in the game
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Packet layout sent by the game
        #[arg(long, value_enum, default_value_t = FormatArg::Dash)]
        format: FormatArg,

        /// Only emit packets while a race is on
        #[arg(long)]
        race_only: bool,

        /// Stop after this many datagrams
        #[arg(long)]
        max_packets: Option<u64>,

        /// Write JSON lines to this file instead of stdout
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON records
        #[arg(long)]
        pretty: bool,
    },
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Decode telemetry datagrams from a capture file into JSON lines.
    #[command(alias = "replay")]
    #[command(
        after_help = "Examples:\n  forzadata pcap decode capture.pcapng -o session.jsonl\n  forzadata pcap replay capture.pcap --format sled --stdout\n  forzadata pcap decode 'captures/*.pcapng' --port 5300 --stdout --summary"
    )]
    Decode {
        /// Path to a .pcap or .pcapng file (a glob matching one file is accepted)
        input: PathBuf,

        /// Only decode UDP datagrams sent to this port
        #[arg(long)]
        port: Option<u16>,

        /// Packet layout sent by the game
        #[arg(long, value_enum, default_value_t = FormatArg::Dash)]
        format: FormatArg,

        /// Only emit packets while a race is on
        #[arg(long)]
        race_only: bool,

        /// Output path (JSON lines)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write JSON lines to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Pretty-print JSON records
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON records (default)
        #[arg(long)]
        compact: bool,

        /// Exit with a non-zero code if any datagram was malformed
        #[arg(long)]
        strict: bool,

        /// Print the session summary as JSON on stderr
        #[arg(long)]
        summary: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Sled,
    Dash,
}

impl From<FormatArg> for Layout {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Sled => Layout::Sled,
            FormatArg::Dash => Layout::Dash,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Listen {
            bind,
            port,
            format,
            race_only,
            max_packets,
            output,
            pretty,
        } => {
            let options = SessionOptions {
                race_only,
                max_packets,
                ..SessionOptions::new(format.into())
            };
            cmd_listen(&bind, port, options, output, pretty)
        }
        Commands::Pcap { command } => match command {
            PcapCommands::Decode {
                input,
                port,
                format,
                race_only,
                output,
                stdout,
                pretty,
                compact,
                strict,
                summary,
            } => {
                let options = SessionOptions {
                    race_only,
                    ..SessionOptions::new(format.into())
                };
                let output = DecodeOutput {
                    path: output,
                    stdout,
                    pretty,
                    compact,
                };
                cmd_pcap_decode(input, port, options, output, cli.quiet, strict, summary)
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

/// `RUST_LOG` wins over the command-line verbosity.
fn init_tracing(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_listen(
    bind: &str,
    port: u16,
    options: SessionOptions,
    output: Option<PathBuf>,
    pretty: bool,
) -> Result<(), CliError> {
    let source = UdpSource::bind((bind, port)).map_err(|err| {
        CliError::new(
            format!("failed to bind {bind}:{port}: {err}"),
            Some("check that the address is local and the port is free".to_string()),
        )
    })?;

    let writer: Box<dyn Write> = match output.as_deref() {
        Some(path) => {
            create_parent_dir(path)?;
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(LineWriter::new(file))
        }
        None => Box::new(io::stdout().lock()),
    };
    let destination = output
        .as_deref()
        .map_or_else(|| "stdout".to_string(), |path| path.display().to_string());
    info!(
        layout = %options.layout,
        race_only = options.race_only,
        output = %destination,
        "starting live session"
    );

    let summary = run_session(source, options, json_sink(writer, pretty))
        .context("telemetry session failed")?;
    debug!(emitted = summary.emitted, malformed = summary.malformed, "live session ended");
    Ok(())
}

struct DecodeOutput {
    path: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
}

fn cmd_pcap_decode(
    input: PathBuf,
    port: Option<u16>,
    options: SessionOptions,
    output: DecodeOutput,
    quiet: bool,
    strict: bool,
    print_summary: bool,
) -> Result<(), CliError> {
    if output.pretty && output.compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }

    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    if resolved_input != input {
        debug!(
            pattern = %input.display(),
            input = %resolved_input.display(),
            "resolved input pattern"
        );
    }

    let output_path = if output.stdout {
        None
    } else {
        let path = output.path.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--output or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&path, &input_abs)?;
        Some(path)
    };

    info!(
        input = %resolved_input.display(),
        layout = %options.layout,
        port = ?port,
        "decoding capture"
    );
    let summary = match output_path.as_deref() {
        Some(path) => {
            create_parent_dir(path)?;
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let sink = json_sink(Box::new(BufWriter::new(file)), output.pretty);
            decode_capture_file(&resolved_input, port, options, sink)
                .context("PCAP/PCAPNG decoding failed")?
        }
        None => {
            let sink = json_sink(Box::new(io::stdout().lock()), output.pretty);
            decode_capture_file(&resolved_input, port, options, sink)
                .context("PCAP/PCAPNG decoding failed")?
        }
    };

    if print_summary {
        print_session_summary(&summary)?;
    }
    if let Some(path) = output_path.as_deref() {
        if !quiet {
            eprintln!("OK: {} records written -> {}", summary.emitted, path.display());
        }
    }
    if strict && summary.malformed > 0 {
        return Err(CliError::new(
            "malformed packets detected",
            Some(format!(
                "{} of {} datagrams did not match the {} layout; check --format and --port",
                summary.malformed, summary.datagrams_total, summary.layout
            )),
        ));
    }
    Ok(())
}

fn json_sink(writer: Box<dyn Write>, pretty: bool) -> JsonLinesSink<Box<dyn Write>> {
    if pretty {
        JsonLinesSink::pretty(writer)
    } else {
        JsonLinesSink::new(writer)
    }
}

fn print_session_summary(summary: &SessionSummary) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(summary).context("JSON serialization failed")?;
    eprintln!("{json}");
    Ok(())
}

fn create_parent_dir(path: &Path) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    Ok(())
}

fn ensure_distinct_output(output: &Path, input_abs: &Path) -> Result<(), CliError> {
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A parent that does not exist yet cannot hold the input.
    let Ok(output_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = output
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid output path: {}", output.display()))?;
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut message = format!("multiple files match pattern '{pattern}' ({count} matches)");
            let listed: Vec<String> = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect();
            message.push_str("; matches: ");
            message.push_str(&listed.join(", "));
            if count > 3 {
                message.push_str(", ...");
            }
            Err(CliError::new(
                message,
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
