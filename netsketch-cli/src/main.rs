//! netsketch CLI - SPICE netlist extraction from circuit sketches.

use clap::{Parser, Subcommand, ValueEnum};
use netsketch::{InputFiles, NetSketchCore, NetSketchError, PipelineOptions, PipelineOutput, RenderConfig};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "netsketch")]
#[command(about = "Extract a SPICE netlist from a photographed circuit sketch", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a netlist from one image and its detector/OCR output
    Extract {
        /// Path to the sketch image
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// JSON array of detector hits ({"label", "box"})
        #[arg(short, long)]
        detections: PathBuf,

        /// JSON array of OCR fragments ({"text", "box", "confidence"})
        #[arg(long)]
        ocr: Option<PathBuf>,

        /// TOML file with pipeline thresholds
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// TrueType font for labels in the annotated image
        #[arg(long)]
        font: Option<PathBuf>,

        /// Write the masked image here
        #[arg(long)]
        masked_out: Option<PathBuf>,

        /// Write the annotated image here
        #[arg(long)]
        annotated_out: Option<PathBuf>,

        /// Write the result here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "spice")]
        format: OutputFormat,
    },

    /// Print the default pipeline configuration as TOML
    Defaults,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Netlist text
    Spice,
    /// Human-readable report
    Report,
    /// Netlist, nodes and stats as JSON
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Extract {
            image,
            detections,
            ocr,
            config,
            font,
            masked_out,
            annotated_out,
            output,
            format,
        } => {
            let inputs = InputFiles {
                image,
                detections,
                ocr,
            };
            let outputs = OutputPaths {
                masked: masked_out,
                annotated: annotated_out,
                result: output,
            };
            handle_extract(&inputs, config.as_deref(), font.as_deref(), &outputs, &format)
        }
        Commands::Defaults => handle_defaults(),
    };

    process::exit(exit_code);
}

struct OutputPaths {
    masked: Option<PathBuf>,
    annotated: Option<PathBuf>,
    result: Option<PathBuf>,
}

fn handle_extract(
    inputs: &InputFiles,
    config: Option<&Path>,
    font: Option<&Path>,
    outputs: &OutputPaths,
    format: &OutputFormat,
) -> i32 {
    match run_extract(inputs, config, font, outputs, format) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn run_extract(
    inputs: &InputFiles,
    config: Option<&Path>,
    font: Option<&Path>,
    outputs: &OutputPaths,
    format: &OutputFormat,
) -> Result<(), NetSketchError> {
    let options = match config {
        Some(path) => PipelineOptions::from_toml_file(path)?,
        None => PipelineOptions::default(),
    };
    let render = match font {
        Some(path) => RenderConfig::with_font_path(path)?,
        None => RenderConfig::with_system_font(),
    };

    let result = NetSketchCore::process_files(inputs, &options, &render)?;

    if let Some(path) = &outputs.masked {
        result.masked.save(path)?;
        tracing::info!("Masked image written to {}", path.display());
    }
    if let Some(path) = &outputs.annotated {
        result.annotated.save(path)?;
        tracing::info!("Annotated image written to {}", path.display());
    }

    let text = format_output(&result, format)?;
    match &outputs.result {
        Some(path) => std::fs::write(path, text)?,
        None => print!("{}", text),
    }
    Ok(())
}

fn format_output(result: &PipelineOutput, format: &OutputFormat) -> Result<String, NetSketchError> {
    match format {
        OutputFormat::Spice => Ok(result.netlist_text.clone()),
        OutputFormat::Report => Ok(result.report.clone()),
        OutputFormat::Json => Ok(format!("{}\n", result.to_json()?)),
    }
}

fn handle_defaults() -> i32 {
    match PipelineOptions::default().to_toml_string() {
        Ok(toml) => {
            print!("{}", toml);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}
