use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use fabstream_bitstream::{build_fabric_dependent_bitstream, BuildOptions, FabricBitstream};
use fabstream_db::{ConfigProtocol, Design, DesignDescription};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// fabstream - Fabric-dependent FPGA bitstream builder
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Reorder a design's bitstream for its configuration protocol
    Build {
        /// Design description (.toml or .json)
        design: PathBuf,

        /// Configuration protocol (standalone, scan_chain, frame_based, memory_bank)
        #[arg(short, long, default_value = "scan_chain")]
        protocol: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a design builds under every configuration protocol
    Check {
        /// Design description (.toml or .json)
        design: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One entry per line: bit index, address, data input
    Text,
    /// JSON document
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt().with_env_filter(log_level).init();

    match cli.command {
        Commands::Build {
            design,
            protocol,
            format,
            output,
        } => {
            let protocol: ConfigProtocol = protocol.parse()?;
            build_bitstream(&design, protocol, format, output.as_deref(), cli.verbose > 0)?;
        }

        Commands::Check { design } => {
            check_design(&design)?;
        }
    }

    Ok(())
}

/// Load a design description and build both databases
fn load_design(path: &Path) -> Result<(DesignDescription, Design)> {
    let description = DesignDescription::from_path(path)
        .with_context(|| format!("Failed to load design {}", path.display()))?;
    let design = description
        .build()
        .with_context(|| format!("Invalid design {}", path.display()))?;
    Ok((description, design))
}

fn build_options(description: &DesignDescription, verbose: bool) -> BuildOptions {
    BuildOptions {
        verbose,
        top_module: description.top.clone(),
    }
}

/// Build and write the fabric bitstream of a design
fn build_bitstream(
    design_file: &Path,
    protocol: ConfigProtocol,
    format: OutputFormat,
    output: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    info!("Building {} bitstream for {}", protocol, design_file.display());
    let (description, design) = load_design(design_file)?;

    let fabric_bitstream = build_fabric_dependent_bitstream(
        &design.bitstream_manager,
        &design.module_manager,
        protocol,
        &build_options(&description, verbose),
    )
    .with_context(|| format!("Failed to build {} bitstream", protocol))?;

    let rendered = render(&fabric_bitstream, format)?;
    match output {
        Some(path) => {
            fs::write(path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                "Wrote {} bits to {}",
                fabric_bitstream.num_bits(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn render(fabric_bitstream: &FabricBitstream, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => fabric_bitstream.to_text(),
        OutputFormat::Json => serde_json::to_string_pretty(fabric_bitstream)? + "\n",
    })
}

/// Build the design under every protocol and report the results
fn check_design(design_file: &Path) -> Result<()> {
    let (description, design) = load_design(design_file)?;
    let options = build_options(&description, false);

    println!(
        "{}: {} blocks, {} configuration bits",
        design_file.display(),
        design.bitstream_manager.num_blocks(),
        design.bitstream_manager.num_bits()
    );

    let mut failures = 0;
    for protocol in ConfigProtocol::ALL {
        match build_fabric_dependent_bitstream(
            &design.bitstream_manager,
            &design.module_manager,
            protocol,
            &options,
        ) {
            Ok(fabric_bitstream) => {
                println!("  {:<12} ok ({} bits)", protocol, fabric_bitstream.num_bits())
            }
            Err(e) => {
                failures += 1;
                println!("  {:<12} FAILED: {}", protocol, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} protocol(s) failed", failures);
    }
    Ok(())
}
