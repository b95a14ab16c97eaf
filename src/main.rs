// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use lyrisync::model::format_timestamp;
use lyrisync::parsers::parse_auto;
use lyrisync::retime::Retimer;
use lyrisync::sync::{RenderSink, ScrollGovernor, SyncSession, TickUpdate};

/// CLI wrapper for log levels to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LevelFilter {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LevelFilter::Error,
            CliLogLevel::Warn => LevelFilter::Warn,
            CliLogLevel::Info => LevelFilter::Info,
            CliLogLevel::Debug => LevelFilter::Debug,
            CliLogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a lyric file and print the canonical timed model
    Parse(ParseArgs),

    /// Parse a lyric file and replay a synchronized playback session
    Simulate(SimulateArgs),

    /// Generate shell completions for lyrisync
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct ParseArgs {
    /// Input lyric file (LRC, Enhanced LRC, or TTML)
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Emit the full model as JSON instead of a summary
    #[arg(short, long)]
    json: bool,

    /// Apply the retiming pass before printing
    #[arg(short, long)]
    retime: bool,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input lyric file (LRC, Enhanced LRC, or TTML)
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Tick interval in milliseconds
    #[arg(short, long, default_value_t = 100)]
    interval_ms: u64,

    /// Playback time to start from, in milliseconds
    #[arg(short, long, default_value_t = 0)]
    from_ms: u64,

    /// Playback time to stop at; defaults to the last line's end
    #[arg(short, long)]
    until_ms: Option<u64>,
}

/// lyrisync - timed-lyric parsing and playback synchronization
///
/// Parses LRC, Enhanced LRC, and TTML lyric files into a canonical timed
/// model and can replay a synchronized session against a simulated clock.
#[derive(Parser, Debug)]
#[command(name = "lyrisync")]
#[command(version = "1.0.0")]
#[command(about = "Timed-lyric parsing and synchronization tool")]
#[command(long_about = "lyrisync parses timed lyric documents and drives a playback-synchronized view model.

EXAMPLES:
    lyrisync parse song.lrc                     # Summarize the parsed model
    lyrisync parse --json --retime song.ttml    # Retimed model as JSON
    lyrisync simulate song.lrc                  # Replay a playback session
    lyrisync simulate -i 250 song.ttml          # Coarser tick interval
    lyrisync completions bash > lyrisync.bash   # Generate bash completions

FORMATS:
    lrc       - [mm:ss.xx] line-timed lyrics
    enhanced  - LRC with <mm:ss.xx> inline word timing
    ttml      - timed-text markup, word- or line-timed")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", color, now, record.level(), record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Render sink that narrates events to stdout during simulation
struct StdoutSink {
    time_ms: u64,
    events: usize,
}

impl StdoutSink {
    fn new() -> Self {
        Self { time_ms: 0, events: 0 }
    }

    fn stamp(&self) -> String {
        format_timestamp(self.time_ms)
    }
}

impl RenderSink for StdoutSink {
    fn activate_line(&mut self, line: usize) {
        self.events += 1;
        println!("{} + line {} active", self.stamp(), line);
    }

    fn deactivate_line(&mut self, line: usize) {
        self.events += 1;
        println!("{} - line {} inactive", self.stamp(), line);
    }

    fn highlight_syllable(&mut self, line: usize, syllable: usize) {
        self.events += 1;
        println!("{}   line {} syllable {} highlighted", self.stamp(), line, syllable);
    }

    fn reset_syllable(&mut self, line: usize, syllable: usize) {
        self.events += 1;
        println!("{}   line {} syllable {} reset", self.stamp(), line, syllable);
    }

    fn scroll_to(&mut self, line: usize, animated: bool) {
        self.events += 1;
        let style = if animated { "scroll" } else { "jump" };
        println!("{} > {} to line {}", self.stamp(), style, line);
    }
}

fn main() -> Result<()> {
    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    let level = cli.log_level.map(LevelFilter::from).unwrap_or(LevelFilter::Info);
    CustomLogger::init(level)?;

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "lyrisync", &mut std::io::stdout());
            Ok(())
        }
        Commands::Parse(args) => run_parse(args),
        Commands::Simulate(args) => run_simulate(args),
    }
}

/// Load and parse a lyric file, treating "no document" as a user-facing
/// error at this boundary.
fn load_document(path: &PathBuf) -> Result<lyrisync::TimedDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read lyric file: {}", path.display()))?;

    parse_auto(&content)
        .ok_or_else(|| anyhow!("No synchronized lyrics found in {}", path.display()))
}

fn run_parse(args: ParseArgs) -> Result<()> {
    let mut document = load_document(&args.input_path)?;
    debug!("Parsed {} lines from {}", document.lines.len(), args.input_path.display());

    if args.retime {
        let adjusted = Retimer::new().retime_document(&mut document);
        info!("Retiming adjusted {} line ends", adjusted);
    }

    if args.json {
        println!("{}", document.to_json()?);
        return Ok(());
    }

    print!("{}", document);
    for line in &document.lines {
        println!("{}", line);
    }
    Ok(())
}

fn run_simulate(args: SimulateArgs) -> Result<()> {
    let mut document = load_document(&args.input_path)?;
    Retimer::new().retime_document(&mut document);

    let interval = args.interval_ms.max(1);
    let until = args
        .until_ms
        .or_else(|| document.lines.last().map(|line| line.end_ms))
        .unwrap_or(0);

    info!(
        "Simulating {} lines from {} to {} every {} ms",
        document.lines.len(),
        format_timestamp(args.from_ms),
        format_timestamp(until),
        interval
    );

    let mut session = SyncSession::new(document);
    let mut governor = ScrollGovernor::new();
    let mut sink = StdoutSink::new();

    let mut time_ms = args.from_ms;
    let mut ticks: u64 = 0;
    while time_ms <= until {
        let update = session.tick(time_ms);
        let scroll = governor.arbitrate(&update, time_ms);

        // Replay the update with the governed scroll decision.
        let governed = TickUpdate { scroll, ..update };
        sink.time_ms = time_ms;
        governed.apply(&mut sink);

        ticks += 1;
        time_ms += interval;
    }

    info!("Replayed {} ticks, {} renderer events", ticks, sink.events);
    Ok(())
}
