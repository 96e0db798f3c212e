//! Gestures CLI - Command-line interface for Synheart Gesture
//!
//! Commands:
//! - count: Count gestures in a recorded frame stream (batch mode)
//! - run: Process frame records from stdin (streaming mode)
//! - config: Print the effective detector configuration
//! - doctor: Diagnose configuration and environment

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use std::fs;
use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use synheart_gesture::pipeline::{count_records, GestureProcessor};
use synheart_gesture::stream::{parse_array, parse_ndjson};
use synheart_gesture::{
    GestureConfig, GestureError, ThresholdOverrides, GESTURE_VERSION, PRODUCER_NAME, STREAM_VERSION,
};

/// Gestures - count blinks, mouth openings and brow raises from blendshape streams
#[derive(Parser)]
#[command(name = "gestures")]
#[command(author = "Synheart AI Inc")]
#[command(version = GESTURE_VERSION)]
#[command(about = "Count facial gestures from per-frame blendshape scores", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count gestures in a recorded frame stream (batch mode)
    Count {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,

        #[command(flatten)]
        detector: DetectorArgs,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Process frame records from stdin, printing one snapshot per frame (streaming mode)
    Run {
        #[command(flatten)]
        detector: DetectorArgs,

        /// Flush output after each snapshot (--flush false to buffer)
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        flush: bool,

        /// Print the final report to stderr on exit
        #[arg(long)]
        report: bool,
    },

    /// Print the effective detector configuration
    Config {
        #[command(flatten)]
        detector: DetectorArgs,
    },

    /// Diagnose configuration and environment
    Doctor {
        /// Configuration file to check
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct DetectorArgs {
    /// Load detector configuration from a JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Blink threshold override (0-1)
    #[arg(long)]
    blink: Option<f64>,

    /// Mouth-open threshold override (0-1)
    #[arg(long)]
    mouth: Option<f64>,

    /// Brow raise threshold override (0-1, delta above baseline)
    #[arg(long)]
    brow: Option<f64>,
}

impl DetectorArgs {
    fn resolve(&self) -> Result<GestureConfig, GestureCliError> {
        let mut config = match &self.config {
            Some(path) => GestureConfig::from_file(path)?,
            None => GestureConfig::default(),
        };

        let overrides = ThresholdOverrides {
            blink: self.blink,
            mouth: self.mouth,
            brow_high: self.brow,
        };
        if !overrides.is_empty() {
            config.thresholds = config.thresholds.apply(&overrides);
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one record per line)
    Ndjson,
    /// JSON array of records
    Json,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e)).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), GestureCliError> {
    match cli.command {
        Commands::Count {
            input,
            input_format,
            detector,
            pretty,
        } => cmd_count(&input, input_format, &detector, pretty),

        Commands::Run {
            detector,
            flush,
            report,
        } => cmd_run(&detector, flush, report),

        Commands::Config { detector } => cmd_config(&detector),

        Commands::Doctor { config, json } => cmd_doctor(config.as_deref(), json),
    }
}

fn cmd_count(
    input: &Path,
    input_format: InputFormat,
    detector: &DetectorArgs,
    pretty: bool,
) -> Result<(), GestureCliError> {
    let config = detector.resolve()?;

    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let records = match input_format {
        InputFormat::Ndjson => parse_ndjson(&input_data)?,
        InputFormat::Json => parse_array(&input_data)?,
    };

    if records.is_empty() {
        return Err(GestureCliError::NoRecords);
    }
    info!("counting gestures over {} records", records.len());

    let report = count_records(&records, config)?;
    info!(
        "counted {} gestures over {} frames",
        report.counts.total(),
        report.frames_processed
    );
    if pretty {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(())
}

fn cmd_run(detector: &DetectorArgs, flush: bool, report: bool) -> Result<(), GestureCliError> {
    let config = detector.resolve()?;
    let mut processor = GestureProcessor::new(config)?;

    if atty::is(atty::Stream::Stdin) {
        warn!("reading frame records from an interactive terminal; pipe {STREAM_VERSION} NDJSON into stdin");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let snapshot = processor.process_json(trimmed).map_err(|e| {
            GestureCliError::ParseError(format!("Failed to process line {}: {}", line_num + 1, e))
        })?;

        if let Some(snapshot) = snapshot {
            writeln!(stdout, "{}", snapshot)?;
            if flush {
                stdout.flush()?;
            }
        }
    }
    stdout.flush()?;

    info!(
        "processed {} frames, {} gestures counted",
        processor.frames_processed(),
        processor.counts().total()
    );
    if report {
        eprintln!("{}", serde_json::to_string(&processor.report())?);
    }

    Ok(())
}

fn cmd_config(detector: &DetectorArgs) -> Result<(), GestureCliError> {
    let config = detector.resolve()?;
    println!("{}", config.to_json()?);
    Ok(())
}

fn cmd_doctor(config: Option<&Path>, json: bool) -> Result<(), GestureCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "gesture_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Gesture version {}", GESTURE_VERSION),
    });

    checks.push(DoctorCheck {
        name: "stream_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Input stream: {}", STREAM_VERSION),
    });

    if let Some(config_path) = config {
        let check = if config_path.exists() {
            match GestureConfig::from_file(config_path) {
                Ok(cfg) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "Config valid (blink {:.2}, mouth {:.2}, brow {:.2}, release {:.2})",
                        cfg.thresholds.blink,
                        cfg.thresholds.mouth,
                        cfg.thresholds.brow_high,
                        cfg.brow.low_threshold(cfg.thresholds.brow_high)
                    ),
                },
                Err(e) => DoctorCheck {
                    name: "config".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid config: {}", e),
                },
            }
        } else {
            DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Config file does not exist; defaults will be used".to_string(),
            }
        };
        checks.push(check);
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (streaming mode ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: GESTURE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Gestures Doctor Report");
        println!("======================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(GestureCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum GestureCliError {
    Io(io::Error),
    Gesture(GestureError),
    Json(serde_json::Error),
    NoRecords,
    DoctorFailed,
    ParseError(String),
}

impl From<io::Error> for GestureCliError {
    fn from(e: io::Error) -> Self {
        GestureCliError::Io(e)
    }
}

impl From<GestureError> for GestureCliError {
    fn from(e: GestureError) -> Self {
        GestureCliError::Gesture(e)
    }
}

impl From<serde_json::Error> for GestureCliError {
    fn from(e: serde_json::Error) -> Self {
        GestureCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GestureCliError> for CliError {
    fn from(e: GestureCliError) -> Self {
        match e {
            GestureCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GestureCliError::Gesture(e) => {
                let (code, hint) = match &e {
                    GestureError::InvalidThreshold { .. } | GestureError::InvalidConfig(_) => {
                        ("CONFIG_ERROR", "Run 'gestures config' to see the effective configuration")
                    }
                    GestureError::NonMonotonicTimestamp { .. } => {
                        ("ORDER_ERROR", "Frame timestamps must come from a monotonic clock")
                    }
                    _ => ("PARSE_ERROR", "Ensure input matches the gesture.frame_stream.v1 format"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            GestureCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GestureCliError::NoRecords => CliError {
                code: "NO_RECORDS".to_string(),
                message: "No records found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            GestureCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
            GestureCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_run(args: &[&str]) -> bool {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Run { flush, .. } => flush,
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_run_flushes_by_default() {
        assert!(parse_run(&["gestures", "run"]));
    }

    #[test]
    fn test_run_flush_can_be_disabled() {
        assert!(!parse_run(&["gestures", "run", "--flush", "false"]));
        assert!(parse_run(&["gestures", "run", "--flush", "true"]));
    }

    #[test]
    fn test_detector_overrides_apply() {
        let cli = Cli::try_parse_from(["gestures", "config", "--blink", "0.4", "--brow", "0.2"]).unwrap();
        let Commands::Config { detector } = cli.command else {
            panic!("expected config command");
        };
        let config = detector.resolve().unwrap();
        assert_eq!(config.thresholds.blink, 0.4);
        assert_eq!(config.thresholds.mouth, 0.5);
        assert_eq!(config.thresholds.brow_high, 0.2);
    }

    #[test]
    fn test_detector_rejects_out_of_range_override() {
        let cli = Cli::try_parse_from(["gestures", "config", "--mouth", "1.5"]).unwrap();
        let Commands::Config { detector } = cli.command else {
            panic!("expected config command");
        };
        assert!(matches!(
            detector.resolve(),
            Err(GestureCliError::Gesture(GestureError::InvalidThreshold { name: "mouth", .. }))
        ));
    }
}
