use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use xcstrings_translator::config::{Config, Overrides};
use xcstrings_translator::env_file::Settings;

#[derive(Parser)]
#[command(name = "xcstrings-translator", version)]
#[command(about = "Translates Xcode String Catalogs (.xcstrings) using OpenAI", long_about = None)]
struct Cli {
    /// Path to the .xcstrings file
    input: PathBuf,

    /// Comma-separated list of target languages (e.g. fr,de,ja)
    #[arg(short, long, value_delimiter = ',')]
    languages: Vec<String>,

    /// API Key
    #[arg(short = 'k', long)]
    api_key: Option<String>,

    /// API host or proxy (e.g. api.openai.com or http://localhost:8080)
    #[arg(long)]
    host: Option<String>,

    /// Model name
    #[arg(short, long)]
    model: Option<String>,

    /// Number of keys translated concurrently
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Log every translation and the cause of every failure
    #[arg(short, long)]
    verbose: bool,

    /// Don't keep a copy of the original file as <input>.original
    #[arg(long)]
    skip_backup: bool,

    /// If set, all entries are re-translated, even if they have a value
    #[arg(short, long)]
    force: bool,

    /// Save only once at the end instead of after every batch
    #[arg(long)]
    no_checkpoint: bool,

    /// Settings file with LANGUAGES, OPENAI_API_KEY, OPENAI_HOST, MODEL
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            languages: self.languages.clone(),
            api_key: self.api_key.clone(),
            host: self.host.clone(),
            model: self.model.clone(),
            concurrency: self.concurrency,
            verbose: self.verbose,
            skip_backup: self.skip_backup,
            force: self.force,
            no_checkpoint: self.no_checkpoint,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Resolve configuration before touching the catalog
    let settings = Settings::load(&cli.env_file)?;
    let config = Config::resolve(cli.overrides(), &settings)?;

    // Initialize logging
    let level = if config.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("xcstrings_translator={}", level).parse()?),
        )
        .init();

    if !cli.input.is_file() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    info!(
        "Translating {} into {} with {}",
        cli.input.display(),
        config.languages.join(", "),
        config.openai_model
    );

    let summary = xcstrings_translator::run(&config, &cli.input).await?;

    info!("Done: {}", summary);
    Ok(())
}
