mod mcp;
mod tools;

use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use imagegen_contracts::requests::ImageGenerationRequest;
use imagegen_engine::{EngineConfig, ImageGenService};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::mcp::McpServer;

#[derive(Debug, Parser)]
#[command(
    name = "openrouter-image-mcp",
    version,
    about = "OpenRouter image generation MCP server"
)]
struct Cli {
    /// Directory generated images are written to.
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,
    /// Append JSONL audit events to this file.
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve MCP JSON-RPC over stdin/stdout (default).
    Serve,
    /// Generate one image and print the response envelope.
    Generate(GenerateArgs),
    /// Print the supported models.
    Models,
}

#[derive(Debug, Parser)]
struct GenerateArgs {
    #[arg(long)]
    prompt: String,
    #[arg(long)]
    model: Option<String>,
    #[arg(long)]
    save: bool,
    #[arg(long)]
    filename: Option<String>,
    #[arg(long)]
    full: bool,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("openrouter-image-mcp error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging();

    let mut config = EngineConfig::from_env();
    if let Some(out_dir) = cli.out_dir {
        config.output_dir = out_dir;
    }
    if let Some(events) = cli.events {
        config.events_path = Some(events);
    }
    let service = ImageGenService::from_config(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let server = McpServer::new(service);
            let stdin = io::stdin();
            server.serve(stdin.lock(), io::stdout().lock())?;
            Ok(0)
        }
        Command::Generate(args) => run_generate(&service, args),
        Command::Models => {
            println!("{}", service.list_models());
            Ok(0)
        }
    }
}

fn run_generate(service: &ImageGenService, args: GenerateArgs) -> Result<i32> {
    if args.prompt.trim().is_empty() {
        bail!("--prompt must not be empty");
    }
    let request = ImageGenerationRequest {
        model: args.model,
        save_to_file: Some(args.save),
        filename: args.filename,
        show_full_response: Some(args.full),
        ..ImageGenerationRequest::new(args.prompt)
    };
    let envelope = service
        .generate_image(&request)
        .with_context(|| "image generation failed")?;
    println!(
        "{}",
        envelope
            .to_pretty_json()
            .context("failed encoding response envelope")?
    );
    Ok(0)
}

/// Logs go to stderr; stdout is reserved for protocol traffic.
fn init_logging() {
    let default_level = if env::var("DEBUG").map(|v| !v.is_empty()).unwrap_or(false) {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}
