use assignment2doc::config::{self, ConfigSource};
use assignment2doc::validation;
use assignment2doc::{Document, OutputFormat, Payload, RenderError};
use clap::{Arg, Command};
use log::{debug, error, info, warn};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process;

const CONFIG_FILE_NAME: &str = "assignment2docrc.toml";

#[derive(Debug)]
enum AppError {
    InputError(io::Error),
    DumpError(io::Error),
    RenderError(RenderError),
    PathError(String),
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::RenderError(err)
    }
}

/// Verbosity level for output
#[derive(Debug, Clone, Copy, PartialEq)]
enum Verbosity {
    Quiet,   // Errors only
    Normal,  // Warnings and errors
    Verbose, // Progress information
}

impl Verbosity {
    fn from_matches(matches: &clap::ArgMatches) -> Self {
        if matches.get_flag("quiet") {
            Verbosity::Quiet
        } else if matches.get_flag("verbose") {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }

    /// Log filter used when `RUST_LOG` is not set.
    fn default_filter(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "warn",
            Verbosity::Verbose => "info",
        }
    }
}

/// Reads the JSON payload from `--input` or, without it, from stdin.
fn get_payload_input(matches: &clap::ArgMatches) -> Result<String, AppError> {
    if let Some(file_path) = matches.get_one::<String>("input") {
        fs::read_to_string(file_path).map_err(AppError::InputError)
    } else {
        io::read_to_string(io::stdin()).map_err(AppError::InputError)
    }
}

/// Get the configuration source based on CLI arguments or default behavior.
///
/// Priority order:
/// 1. If `--config` is explicitly provided, use that file
/// 2. If `assignment2docrc.toml` exists in current directory, use it
/// 3. Otherwise use default configuration
fn get_config_source(matches: &clap::ArgMatches) -> ConfigSource<'_> {
    if let Some(config_file) = matches.get_one::<String>("config") {
        return ConfigSource::File(config_file.as_str());
    }

    if std::path::Path::new(CONFIG_FILE_NAME).exists() {
        return ConfigSource::File(CONFIG_FILE_NAME);
    }

    ConfigSource::Default
}

fn get_output_dir(matches: &clap::ArgMatches) -> Result<PathBuf, AppError> {
    let current_dir = std::env::current_dir().map_err(|e| AppError::PathError(e.to_string()))?;

    Ok(matches
        .get_one::<String>("output-dir")
        .map(|p| current_dir.join(p))
        .unwrap_or(current_dir))
}

fn get_format(matches: &clap::ArgMatches) -> Result<OutputFormat, AppError> {
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("pdf");
    Ok(format.parse::<OutputFormat>()?)
}

fn run(matches: clap::ArgMatches) -> Result<(), AppError> {
    let verbosity = Verbosity::from_matches(&matches);
    let dry_run = matches.get_flag("dry-run");

    let format = get_format(&matches)?;
    let input = get_payload_input(&matches)?;
    let payload = Payload::from_json(&input)?;
    debug!("Decoded payload with id {:?}", payload.id);

    if let Some(dump_path) = matches.get_one::<String>("dump-blocks") {
        Document::parse(payload.content())
            .save_to_json_file(dump_path)
            .map_err(AppError::DumpError)?;
        info!("Saved classified blocks to {}", dump_path);
    }

    let warnings = validation::validate_payload(&payload);
    for warning in &warnings {
        warn!("{}", warning);
    }

    if dry_run {
        if verbosity != Verbosity::Quiet {
            for warning in &warnings {
                println!("warning: {}", warning);
            }
            println!(
                "Dry run complete: {} warning(s), {} would be written",
                warnings.len(),
                payload.output_filename(format)
            );
        }
        return Ok(());
    }

    let style = config::load_config_from_source(get_config_source(&matches));
    let output_dir = get_output_dir(&matches)?;

    info!("Rendering {} into {}", format.extension(), output_dir.display());
    let filename = assignment2doc::render_into_file(&payload, format, &style, &output_dir)?;

    println!("{}", filename);
    Ok(())
}

fn error_message(e: &AppError) -> String {
    match e {
        AppError::InputError(e) => format!("[X] Error reading input: {}", e),
        AppError::DumpError(e) => format!("[X] Error writing block dump: {}", e),
        AppError::RenderError(e) => format!("[X] Render error: {}", e),
        AppError::PathError(e) => format!("[X] Path error: {}", e),
    }
}

fn build_command() -> Command {
    Command::new("assignment2doc")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Render an assignment payload (JSON on stdin) into a DOCX or PDF document")
        .after_help(
            "EXAMPLES:\n  \
            echo '{\"topic\":\"Photosynthesis\",\"content\":\"# Overview\",\"id\":\"abc\"}' | assignment2doc\n  \
            assignment2doc --format docx -i payload.json -o out/\n  \
            assignment2doc -i payload.json --dry-run --dump-blocks blocks.json\n",
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_name("FORMAT")
                .help("Output format: pdf or docx (default: pdf)"),
        )
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE_PATH")
                .help("Read the JSON payload from a file instead of stdin"),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Directory the generated file is written to (defaults to the current directory)"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("CONFIG_FILE")
                .help("Path to layout configuration file (TOML format). Auto-detects assignment2docrc.toml if not specified"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log progress information on stderr")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("quiet"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Suppress everything on stderr except errors")
                .action(clap::ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Validate and classify the payload without generating a file")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dump-blocks")
                .long("dump-blocks")
                .value_name("FILE")
                .help("Write the classified blocks as JSON to FILE"),
        )
        .arg(
            Arg::new("get-default-configuration")
                .long("get-default-configuration")
                .help("Print a default assignment2docrc.toml to stdout and exit")
                .action(clap::ArgAction::SetTrue),
        )
}

fn main() {
    let matches = build_command().get_matches();

    // RUST_LOG wins over -v / -q
    let verbosity = Verbosity::from_matches(&matches);
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(verbosity.default_filter()),
    )
    .format_timestamp_millis()
    .init();

    if matches.get_flag("get-default-configuration") {
        println!("{}", config::default_config_toml());
        process::exit(0);
    }

    if let Err(e) = run(matches) {
        let message = error_message(&e);
        // the failure must reach stderr even when logging is switched off
        if log::log_enabled!(log::Level::Error) {
            error!("{}", message);
        } else {
            eprintln!("{}", message);
        }
        process::exit(1);
    }
}
