use clap::Parser;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod ask;
mod config;
mod error;
mod gemini;

/// Only logging switches; the request itself takes no arguments, and
/// anything else on the command line is rejected.
#[derive(Parser, Debug)]
#[command(name = "ask-once")]
#[command(about = "Ask Gemini how AI works and print the answer (takes no arguments)")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the answer
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else if cli.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting ask-once v{}", env!("CARGO_PKG_VERSION"));

    let config = config::Config::from_env()?;
    let client = gemini::GeminiClient::new(&config)?;
    info!("Using model {}", client.model().as_str());

    let mut stdout = tokio::io::stdout();
    ask::ask_once(&client, &mut stdout).await?;

    Ok(())
}
