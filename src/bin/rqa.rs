//! RQA CLI - Command-line interface for Gaze RQA
//!
//! Commands:
//! - compute: Analyze one fixation sequence into a snapshot
//! - batch: Analyze labeled sequences for cross-participant comparison
//! - matrix: Print the recurrence matrix
//! - validate: Validate fixation records

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use gaze_rqa::adapter::FixationAdapter;
use gaze_rqa::config::RqaConfig;
use gaze_rqa::pipeline::RqaProcessor;
use gaze_rqa::types::{FixationSequence, RecurrenceMethod, RqaSnapshot};
use gaze_rqa::{RqaError, RQA_VERSION};

/// RQA - Recurrence quantification analysis for gaze fixations
#[derive(Parser)]
#[command(name = "rqa")]
#[command(version = RQA_VERSION)]
#[command(about = "Compute recurrence metrics from fixation sequences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that builds a matrix
#[derive(clap::Args)]
struct AnalysisArgs {
    /// Load configuration from a JSON file (flags below override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recurrence predicate
    #[arg(long, value_enum)]
    method: Option<MethodArg>,

    /// Distance threshold for the proximity method
    #[arg(long)]
    threshold: Option<f64>,

    /// Minimum line length
    #[arg(long)]
    min_line_length: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one fixation sequence
    Compute {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Participant or trial label recorded in the snapshot
        #[arg(long)]
        label: Option<String>,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Analyze a JSON array of {label, fixations} groups
    Batch {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "ndjson")]
        output_format: OutputFormat,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Print the recurrence matrix as nested JSON rows
    Matrix {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Validate fixation records
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormat,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// JSON array of fixations
    Json,
    /// Newline-delimited JSON (one fixation per line)
    Ndjson,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one snapshot per line)
    Ndjson,
    /// JSON array of snapshots
    Json,
    /// Pretty-printed JSON
    JsonPretty,
}

#[derive(Clone, Copy, ValueEnum)]
enum MethodArg {
    Labels,
    Proximity,
    Corrected,
}

impl From<MethodArg> for RecurrenceMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Labels => RecurrenceMethod::LabelOverlap,
            MethodArg::Proximity => RecurrenceMethod::Proximity,
            MethodArg::Corrected => RecurrenceMethod::SelfTransitionCorrected,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), RqaCliError> {
    match cli.command {
        Commands::Compute {
            input,
            output,
            input_format,
            output_format,
            label,
            analysis,
        } => cmd_compute(
            &input,
            &output,
            &input_format,
            &output_format,
            label.as_deref(),
            &analysis,
        ),

        Commands::Batch {
            input,
            output,
            output_format,
            analysis,
        } => cmd_batch(&input, &output, &output_format, &analysis),

        Commands::Matrix {
            input,
            input_format,
            analysis,
        } => cmd_matrix(&input, &input_format, &analysis),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, &input_format, json),
    }
}

fn cmd_compute(
    input: &Path,
    output: &Path,
    input_format: &InputFormat,
    output_format: &OutputFormat,
    label: Option<&str>,
    analysis: &AnalysisArgs,
) -> Result<(), RqaCliError> {
    let processor = build_processor(analysis)?;
    let fixations = read_fixations(input, input_format)?;
    FixationAdapter::ensure_valid(&fixations)?;

    tracing::info!(fixations = fixations.len(), "computing snapshot");
    let snapshot = processor.process(&fixations, label);

    write_output(output, &format_output(&[snapshot], output_format)?)
}

fn cmd_batch(
    input: &Path,
    output: &Path,
    output_format: &OutputFormat,
    analysis: &AnalysisArgs,
) -> Result<(), RqaCliError> {
    let processor = build_processor(analysis)?;
    let groups = FixationAdapter::parse_groups(&read_input(input)?)?;

    if groups.is_empty() {
        return Err(RqaCliError::NoSequences);
    }
    for group in &groups {
        FixationAdapter::ensure_valid(&group.fixations)?;
    }

    tracing::info!(sequences = groups.len(), "computing batch");
    let snapshots = processor.process_batch(&groups);

    write_output(output, &format_output(&snapshots, output_format)?)
}

fn cmd_matrix(
    input: &Path,
    input_format: &InputFormat,
    analysis: &AnalysisArgs,
) -> Result<(), RqaCliError> {
    let processor = build_processor(analysis)?;
    let fixations = read_fixations(input, input_format)?;
    FixationAdapter::ensure_valid(&fixations)?;

    let matrix = processor.build_matrix(&fixations);
    println!("{}", serde_json::to_string(&matrix)?);
    Ok(())
}

fn cmd_validate(input: &Path, input_format: &InputFormat, json: bool) -> Result<(), RqaCliError> {
    let fixations = read_fixations(input, input_format)?;
    let results = FixationAdapter::validate_sequence(&fixations);

    let report = ValidationReport {
        total_fixations: fixations.len(),
        valid_fixations: fixations.len() - results.len(),
        invalid_fixations: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                fixation_id: r.fixation_id,
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total fixations:   {}", report.total_fixations);
        println!("Valid fixations:   {}", report.valid_fixations);
        println!("Invalid fixations: {}", report.invalid_fixations);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Fixation {} (index {}): {}",
                    err.fixation_id, err.index, err.error
                );
            }
        }
    }

    if report.invalid_fixations > 0 {
        Err(RqaCliError::ValidationFailed(report.invalid_fixations))
    } else {
        Ok(())
    }
}

// Helper functions

fn build_processor(args: &AnalysisArgs) -> Result<RqaProcessor, RqaCliError> {
    let mut config = match &args.config {
        Some(path) => RqaConfig::from_json(&fs::read_to_string(path)?)?,
        None => RqaConfig::default(),
    };

    if let Some(method) = args.method {
        config = config.with_method(method.into());
    }
    if let Some(threshold) = args.threshold {
        config = config.with_proximity_threshold(threshold);
    }
    if let Some(min_line_length) = args.min_line_length {
        config = config.with_min_line_length(min_line_length);
    }

    tracing::debug!(?config, "resolved configuration");
    Ok(RqaProcessor::with_config(config)?)
}

fn read_input(input: &Path) -> Result<String, RqaCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn read_fixations(input: &Path, format: &InputFormat) -> Result<FixationSequence, RqaCliError> {
    let data = read_input(input)?;
    let fixations = match format {
        InputFormat::Json => FixationAdapter::parse_array(&data)?,
        InputFormat::Ndjson => FixationAdapter::parse_ndjson(&data)?,
    };
    Ok(fixations)
}

fn write_output(output: &Path, data: &str) -> Result<(), RqaCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn format_output(snapshots: &[RqaSnapshot], format: &OutputFormat) -> Result<String, RqaCliError> {
    match format {
        OutputFormat::Ndjson => {
            let mut lines: Vec<String> = Vec::new();
            for snapshot in snapshots {
                lines.push(serde_json::to_string(snapshot)?);
            }
            Ok(lines.join("\n") + "\n")
        }
        OutputFormat::Json => Ok(serde_json::to_string(snapshots)? + "\n"),
        OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(snapshots)? + "\n"),
    }
}

// Error types

#[derive(Debug)]
enum RqaCliError {
    Io(io::Error),
    Rqa(RqaError),
    Json(serde_json::Error),
    NoSequences,
    ValidationFailed(usize),
}

impl From<io::Error> for RqaCliError {
    fn from(e: io::Error) -> Self {
        RqaCliError::Io(e)
    }
}

impl From<RqaError> for RqaCliError {
    fn from(e: RqaError) -> Self {
        RqaCliError::Rqa(e)
    }
}

impl From<serde_json::Error> for RqaCliError {
    fn from(e: serde_json::Error) -> Self {
        RqaCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<RqaCliError> for CliError {
    fn from(e: RqaCliError) -> Self {
        match e {
            RqaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            RqaCliError::Rqa(RqaError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Check --config, --threshold and --min-line-length".to_string()),
            },
            RqaCliError::Rqa(e @ RqaError::InvalidFixation { .. }) => CliError {
                code: "VALIDATION_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'rqa validate' for details".to_string()),
            },
            RqaCliError::Rqa(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Ensure input is a JSON array of fixations".to_string()),
            },
            RqaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            RqaCliError::NoSequences => CliError {
                code: "NO_SEQUENCES".to_string(),
                message: "No labeled sequences found in input".to_string(),
                hint: Some("Expected [{\"label\": ..., \"fixations\": [...]}]".to_string()),
            },
            RqaCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} fixations failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_fixations: usize,
    valid_fixations: usize,
    invalid_fixations: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    fixation_id: u64,
    error: String,
}
