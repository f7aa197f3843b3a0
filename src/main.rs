/// abimcp entry point: generate MCP servers from Ethereum contract ABIs
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use abimcp_ethereum::codegen::{
    render_server, AbiParser, EventMapper, FunctionMapper, GenerationRequest, GeneratorConfig,
    ParsedAbi, ServerGenerator, TypeMapperConfig,
};
use abimcp_ethereum::source::{AbiSource, FileAbiSource};

#[derive(Parser)]
#[command(name = "abimcp")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate an MCP server from a contract ABI
    Generate {
        /// Path to the ABI JSON file (entry array or build artifact)
        abi_file: String,

        /// Deployed contract address
        #[arg(long)]
        address: String,

        /// Network the contract is deployed on
        #[arg(long, default_value = "mainnet")]
        network: String,

        /// Server name; defaults to the artifact name or detected standard
        #[arg(long)]
        name: Option<String>,

        /// Output directory; defaults to <config output dir>/<package name>
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Only generate read tools
        #[arg(long)]
        read_only: bool,

        /// Do not generate event resources
        #[arg(long)]
        no_events: bool,

        /// Do not generate utility tools
        #[arg(long)]
        no_utilities: bool,

        /// Make write tools broadcast by default instead of simulating
        #[arg(long)]
        no_simulate_default: bool,

        /// Generator config file (.toml or .json)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print generated files instead of writing them
        #[arg(long)]
        dry_run: bool,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show what a contract ABI would generate
    Inspect {
        /// Path to the ABI JSON file
        abi_file: String,

        /// Enable debug logging
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Generate { verbose, .. } | Commands::Inspect { verbose, .. } => *verbose,
    };
    init_tracing(verbose);

    match cli.command {
        Commands::Generate {
            abi_file,
            address,
            network,
            name,
            output_dir,
            read_only,
            no_events,
            no_utilities,
            no_simulate_default,
            config,
            dry_run,
            ..
        } => {
            let mut generator_config = match config {
                Some(path) => GeneratorConfig::load_from_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => GeneratorConfig::default(),
            };
            generator_config.apply_environment_overrides()?;
            if read_only {
                generator_config.read_only = true;
            }
            if no_events {
                generator_config.include_events = false;
            }
            if no_utilities {
                generator_config.include_utilities = false;
            }
            if no_simulate_default {
                generator_config.simulation_default = false;
            }

            let mut request = GenerationRequest::new(address, network);
            if let Some(name) = name {
                request = request.with_contract_name(name);
            }

            let parsed = load_abi(&abi_file).await?;
            let generator = ServerGenerator::new(generator_config)?;
            let server = render_server(&generator, &parsed, &request, TypeMapperConfig::default())
                .context("Failed to generate server")?;

            if dry_run {
                println!("🔍 Performing dry run - no files will be written");
                for file in &server.files {
                    println!("\n===== {} =====", file.path);
                    println!("{}", file.content);
                }
                return Ok(());
            }

            let output_dir =
                output_dir.unwrap_or_else(|| generator.config().output_dir.join(&server.package_name));

            println!("🚀 Writing MCP server '{}'...", server.server_name);
            let written = generator.write_to_disk(&server, &output_dir).await?;
            for path in &written {
                debug!(path = %path.display(), "Written");
            }

            println!("✅ Generated {} tools and {} resources", server.tool_count, server.resource_count);
            println!("📁 Generated files are located in: {}", output_dir.display());
        }
        Commands::Inspect { abi_file, .. } => {
            let parsed = load_abi(&abi_file).await?;
            print_summary(&parsed);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn load_abi(abi_file: &str) -> Result<ParsedAbi> {
    let fetched = FileAbiSource::new()
        .fetch(abi_file)
        .await
        .with_context(|| format!("Failed to load ABI from {}", abi_file))?;

    AbiParser::new()
        .parse_value(&fetched.abi)
        .with_context(|| format!("Failed to parse ABI from {}", abi_file))
}

fn print_summary(abi: &ParsedAbi) {
    println!("Contract ABI Summary");
    println!("====================");
    if let Some(name) = &abi.contract_name {
        println!("Contract: {}", name);
    }
    match abi.detected_standard {
        Some(standard) => println!("Detected standard: {}", standard.display_name()),
        None => println!("Detected standard: none"),
    }
    println!(
        "Functions: {} ({} read, {} write, {} payable)",
        abi.functions.len(),
        abi.read_functions().len(),
        abi.write_functions().len(),
        abi.payable_functions().len()
    );
    println!("Events: {}", abi.events.len());
    println!("Errors: {}", abi.errors.len());
    println!("Constructor: {}", if abi.constructor.is_some() { "yes" } else { "no" });
    println!("Fallback: {}, receive: {}", abi.has_fallback, abi.has_receive);

    let tools = FunctionMapper::default().map_functions(&abi.functions);
    if !tools.is_empty() {
        println!("\nTools:");
        for tool in &tools {
            println!("  [{}] {}  {}", tool.tool_type.as_str(), tool.signature(), tool.selector);
        }
    }

    let resources = EventMapper::default().map_events(&abi.events);
    if !resources.is_empty() {
        println!("\nResources:");
        for resource in &resources {
            println!("  {}", resource.uri_template);
        }
    }

    if !abi.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &abi.warnings {
            println!("  ⚠️  {}", warning);
        }
    }
}
