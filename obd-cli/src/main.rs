//! OBD Response Decoder CLI Application
//!
//! This is the command-line interface for the OBD response decoder.
//! It uses the obd-decoder library and adds:
//! - Signal set catalog loading from files
//! - Batch decoding of transcript files (in parallel)
//! - TOML job configuration
//! - Text and JSON report generation

use anyhow::{Context, Result};
use clap::Parser;
use obd_decoder::{CanIdFormat, Decoder, DecoderConfig, MidMessagePolicy};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::OutputFormat;
use report::FileResult;

/// OBD Response Decoder - Decode captured vehicle diagnostic responses
#[derive(Parser, Debug)]
#[command(name = "obd-cli")]
#[command(about = "Decode captured diagnostic responses into named signals", long_about = None)]
#[command(version)]
struct Args {
    /// Path to signal set catalog file(s) (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    signalset: Vec<PathBuf>,

    /// Path to response transcript file(s) (can be repeated)
    #[arg(short, long, value_name = "FILE")]
    response: Vec<PathBuf>,

    /// Vehicle model year used to resolve the signal set
    #[arg(short, long, value_name = "YEAR")]
    model_year: Option<u32>,

    /// Transcripts use extended 29-bit arbitration IDs
    #[arg(long)]
    extended_id: bool,

    /// Restart reassembly when a new message starts mid-collection
    /// instead of reporting a protocol error
    #[arg(long)]
    restart_on_new_message: bool,

    /// Emit a JSON report instead of text
    #[arg(long)]
    json: bool,

    /// Output file for the report (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to a batch job configuration file (job.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("OBD Response Decoder CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", obd_decoder::VERSION);

    if let Some(config_path) = &args.config {
        // Batch job mode driven by a TOML file
        config_mode(config_path, &args)
    } else if !args.signalset.is_empty() && !args.response.is_empty() {
        // Simple decode mode - everything from flags
        let model_year = args
            .model_year
            .context("--model-year is required when decoding from flags")?;

        let decode = config::DecodeConfig {
            id_format: if args.extended_id {
                CanIdFormat::TwentyNineBit
            } else {
                CanIdFormat::ElevenBit
            },
            mid_message_policy: if args.restart_on_new_message {
                MidMessagePolicy::Restart
            } else {
                MidMessagePolicy::Error
            },
            response_filter: None,
        };
        let output = config::OutputConfig {
            format: if args.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            },
            file: args.output.clone(),
        };

        run_job(&args.signalset, &args.response, model_year, &decode, &output)
    } else {
        // No arguments - show help
        println!("OBD Response Decoder - No input specified");
        println!("\nQuick Start:");
        println!("  obd-cli --signalset kia-ev9.json --response battery.txt --model-year 2024");
        println!("\nFor batch jobs:");
        println!("  obd-cli --config job.toml");
        println!("\nUse --help for more options");
        Ok(())
    }
}

/// Batch job mode - inputs and options come from a TOML file
fn config_mode(config_path: &Path, args: &Args) -> Result<()> {
    log::info!("Loading configuration from: {:?}", config_path);
    let job = config::load_config(config_path)?;

    // Command-line output flags override the job file
    let mut output = job.output.clone();
    if args.json {
        output.format = OutputFormat::Json;
    }
    if let Some(path) = &args.output {
        output.file = Some(path.clone());
    }

    run_job(
        &job.input.signalsets,
        &job.input.responses,
        job.vehicle.model_year,
        &job.decode,
        &output,
    )
}

/// Load catalogs, decode every transcript, render the report
fn run_job(
    signalsets: &[PathBuf],
    responses: &[PathBuf],
    model_year: u32,
    decode: &config::DecodeConfig,
    output: &config::OutputConfig,
) -> Result<()> {
    // Create decoder and load signal set catalogs
    let mut decoder = Decoder::new();
    for path in signalsets {
        decoder
            .add_signalset(path)
            .with_context(|| format!("Failed to load signal set {:?}", path))?;
    }

    let stats = decoder.database_stats();
    log::info!(
        "Signal database: {} set(s), {} request(s), {} signal(s)",
        stats.num_sets,
        stats.num_requests,
        stats.num_signals
    );

    let decoder_config = DecoderConfig::new()
        .with_id_format(decode.id_format)
        .with_mid_message_policy(decode.mid_message_policy);
    let decoder_config = match &decode.response_filter {
        Some(ids) => decoder_config.with_response_filter(ids.clone()),
        None => decoder_config,
    };

    // Transcripts are independent captures; decode them in parallel
    let results: Result<Vec<FileResult>> = responses
        .par_iter()
        .map(|path| {
            let transcript = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read transcript {:?}", path))?;
            let responses = decoder
                .decode_exchange(model_year, &transcript, decoder_config.clone())
                .with_context(|| format!("Failed to decode transcript {:?}", path))?;
            Ok(FileResult {
                file: path.clone(),
                responses,
            })
        })
        .collect();
    let results = results?;

    let rendered = match output.format {
        OutputFormat::Json => report::render_json(model_year, &results)?,
        OutputFormat::Text => report::render_text(model_year, &results),
    };

    match &output.file {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write report to {:?}", path))?;
            log::info!("Report written to {:?}", path);
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
