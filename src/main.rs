mod collector;
mod envelope;
mod error;
mod manual;
mod net;
mod output;
mod settings;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use scraper::Html;
use tracing::info;

use collector::Ecosystem;
use settings::Settings;

#[derive(Parser)]
#[command(
    name = "nix_search_collector",
    about = "Fetch the latest release of a package ecosystem as search-indexer JSON"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the latest release and write it as `{"packages": {...}}`
    Collect {
        #[arg(value_enum)]
        ecosystem: Ecosystem,
        /// Output file (default: <COLLECTOR_OUTPUT_DIR>/<ecosystem>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the latest release identifier only
    Latest {
        #[arg(value_enum)]
        ecosystem: Ecosystem,
    },
    /// Extract options from a locally saved manual page
    Extract {
        /// Path to the manual HTML
        file: PathBuf,
        /// Output file (default: <COLLECTOR_OUTPUT_DIR>/darwin.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("load COLLECTOR_* settings")?;
    info!(settings = ?settings, "Starting collector");

    match cli.command {
        Commands::Collect { ecosystem, output } => {
            let collector = ecosystem.collector(net::client(&settings)?, &settings);
            let release = collector
                .latest_release()
                .with_context(|| format!("{}: latest release", collector.name()))?;
            println!("Latest release: {}", release);

            let stream = collector
                .download_release(&release)
                .with_context(|| format!("{}: download {}", collector.name(), release))?;
            let path = output.unwrap_or_else(|| settings.output_dir.join(ecosystem.output_file()));
            write(stream, &path)?;
        }
        Commands::Latest { ecosystem } => {
            let collector = ecosystem.collector(net::client(&settings)?, &settings);
            println!("{}", collector.latest_release()?);
        }
        Commands::Extract { file, output } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("read {:?}", file))?;
            let html = Html::parse_document(&body);
            let stream = collector::darwin::enveloped(&html)?;
            let path = output
                .unwrap_or_else(|| settings.output_dir.join(Ecosystem::Darwin.output_file()));
            write(stream, &path)?;
        }
    }

    info!("Done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

fn write(stream: Box<dyn envelope::ReleaseStream>, path: &Path) -> anyhow::Result<()> {
    let bytes = output::write_release(stream, path)?;
    println!("Downloaded successfully to {} ({} bytes)", path.display(), bytes);
    Ok(())
}
