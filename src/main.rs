// logfind - main.rs
//
// Command-line entry point. Handles:
// 1. CLI argument parsing
// 2. Logging initialisation (debug mode support)
// 3. config.toml loading
// 4. Dispatch to find / preview / write

use clap::{Parser, Subcommand, ValueEnum};
use logfind::app::find::{self, FindOptions};
use logfind::app::logger::LoggerBuilder;
use logfind::app::preview;
use logfind::app::registry::LoggerRegistry;
use logfind::core::export::{self, ExportFormat};
use logfind::core::model::{group_records, ScanOutcome};
use logfind::core::window::Anchor;
use logfind::platform::config::{self, AppConfig, PlatformPaths};
use logfind::util::constants;
use logfind::util::error::{LogfindError, Result};
use logfind::util::logging;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "logfind", version, about)]
struct Cli {
    /// config.toml to use instead of the platform default.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search a log file by time window, minimum level and text.
    Find(FindArgs),
    /// Render sample records for a template and date format.
    Preview(PreviewArgs),
    /// Write one record through a named logger.
    Write(WriteArgs),
}

#[derive(clap::Args, Debug)]
struct FindArgs {
    /// Log file to search.
    path: PathBuf,

    /// Text to look for (empty matches every line).
    #[arg(default_value = "")]
    text: String,

    /// Anchor date/time of the window (default: now).
    #[arg(long)]
    date: Option<String>,

    /// Day offset from the anchor; negative looks back.
    #[arg(long, allow_hyphen_values = true)]
    days: Option<i64>,

    /// Minimum level name.
    #[arg(short, long)]
    level: Option<String>,

    /// Match text case-sensitively.
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Infer the field layout from the file.
    #[arg(long, conflicts_with = "fmt")]
    detect: bool,

    /// Template (or preset name) the file was written with.
    #[arg(long)]
    fmt: Option<String>,

    /// Date format (or date-format name) the file was written with.
    #[arg(long)]
    datefmt: Option<String>,

    /// Print grouped records instead of individual lines.
    #[arg(long)]
    records: bool,

    /// Write matches to a file instead of stdout.
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export format (default: from the export file extension).
    #[arg(long, value_enum, requires = "export")]
    format: Option<FormatArg>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

#[derive(clap::Args, Debug)]
struct PreviewArgs {
    /// Template or preset name.
    #[arg(long, default_value = "")]
    fmt: String,

    /// Date format or date-format name.
    #[arg(long, default_value = "")]
    datefmt: String,

    /// Message text.
    #[arg(long, default_value = "")]
    text: String,

    /// Render every preset with every date format.
    #[arg(long, conflicts_with_all = ["fmt", "datefmt", "text"])]
    all: bool,
}

#[derive(clap::Args, Debug)]
struct WriteArgs {
    /// Logger name; the file is <dir>/<name>.log.
    name: String,

    message: String,

    /// Level name (default: the logger's own level).
    #[arg(short, long)]
    level: Option<String>,

    /// Directory for the log file.
    #[arg(long)]
    dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, warnings) = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            logging::init(cli.debug, None);
            report(&e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(cli.debug, config.log_level.as_deref());
    for warning in &warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "logfind starting"
    );

    let result = match cli.command {
        Command::Find(args) => run_find(args, &config),
        Command::Preview(args) => run_preview(args),
        Command::Write(args) => run_write(args, &config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<(AppConfig, Vec<String>)> {
    match explicit {
        Some(path) => Ok(config::load_config_file(path)?),
        None => Ok(config::load_config(&PlatformPaths::resolve().config_file())),
    }
}

/// Print the error and its source chain to stderr.
fn report(error: &LogfindError) {
    let mut message = format!("Error: {error}");
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(&format!("\n  caused by: {cause}"));
        source = std::error::Error::source(cause);
    }
    eprintln!("{message}");
}

fn stdout_error(source: std::io::Error) -> LogfindError {
    LogfindError::Io {
        path: PathBuf::from("<stdout>"),
        operation: "write",
        source,
    }
}

fn run_find(args: FindArgs, config: &AppConfig) -> Result<()> {
    let registry = LoggerRegistry::from_config(config)?;
    let options = FindOptions {
        text: args.text,
        anchor: args.date.as_deref().map(Anchor::from).unwrap_or_default(),
        window_days: args.days.unwrap_or(config.find.window_days),
        min_level: args.level.unwrap_or_else(|| config.find.min_level.clone()),
        ignore_case: if args.case_sensitive {
            false
        } else {
            config.find.ignore_case
        },
        auto_detect_layout: args.detect || (config.find.auto_detect && args.fmt.is_none()),
        template: args
            .fmt
            .map(|fmt| constants::format_preset(&fmt).map_or(fmt, str::to_string)),
        datefmt: args
            .datefmt
            .map(|datefmt| constants::date_format(&datefmt).map_or(datefmt, str::to_string)),
    };

    let outcome: ScanOutcome = find::find_lines(&args.path, &options, registry.levels())?;

    if let Some(ref export_path) = args.export {
        let format = match args.format {
            Some(FormatArg::Csv) => ExportFormat::Csv,
            Some(FormatArg::Json) => ExportFormat::Json,
            None => ExportFormat::from_path(export_path),
        };
        let file = std::fs::File::create(export_path).map_err(|source| LogfindError::Io {
            path: export_path.clone(),
            operation: "create export file",
            source,
        })?;
        let count = export::export(
            &outcome.lines,
            std::io::BufWriter::new(file),
            export_path,
            format,
        )?;
        eprintln!("Exported {count} lines to {}", export_path.display());
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if args.records {
        for record in group_records(&outcome.lines) {
            writeln!(
                out,
                "--- lines {}-{} {} {}",
                record.first_line, record.last_line, record.level, record.timestamp
            )
            .map_err(stdout_error)?;
            write_verbatim(&mut out, &record.raw)?;
        }
    } else {
        for line in &outcome.lines {
            write_verbatim(&mut out, &line.text)?;
        }
    }
    out.flush().map_err(stdout_error)?;
    Ok(())
}

/// Write text as read from the log, adding a newline only when the last
/// line of the file had none.
fn write_verbatim(out: &mut impl Write, text: &str) -> Result<()> {
    out.write_all(text.as_bytes()).map_err(stdout_error)?;
    if !text.ends_with('\n') {
        out.write_all(b"\n").map_err(stdout_error)?;
    }
    Ok(())
}

fn run_preview(args: PreviewArgs) -> Result<()> {
    if args.all {
        for entry in preview::preview_all()? {
            println!("\nfmt=\"{}\", datefmt=\"{}\"", entry.preset, entry.date_format);
            println!("{}", entry.line);
        }
    } else {
        println!("{}", preview::preview(&args.fmt, &args.datefmt, &args.text)?);
    }
    Ok(())
}

fn run_write(args: WriteArgs, config: &AppConfig) -> Result<()> {
    let mut registry = LoggerRegistry::from_config(config)?;
    if let Some(dir) = args.dir {
        let builder = match config.loggers.get(&args.name) {
            Some(settings) => LoggerBuilder::from_settings(settings),
            None => LoggerBuilder::new(),
        };
        registry.declare(&args.name, builder.path(dir))?;
    }
    match args.level {
        Some(ref level) => registry.log(&args.name, level, &args.message)?,
        None => registry.get_or_create(&args.name)?.emit(&args.message)?,
    }
    Ok(())
}
