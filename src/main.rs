mod fetcher;
mod parser;
mod pipeline;
mod settings;
mod writer;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use tracing::info;

use settings::{MissingFieldPolicy, Overrides, Settings};

#[derive(Parser)]
#[command(
    name = "books_scraper",
    about = "Extract title, price and availability from a catalog listing page into CSV"
)]
struct Cli {
    /// Listing page to fetch [default: https://books.toscrape.com/index.html]
    #[arg(long)]
    url: Option<String>,
    /// Read a saved listing page instead of fetching one
    #[arg(short, long, conflicts_with = "url")]
    input: Option<PathBuf>,
    /// CSV file to write [default: books.csv]
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// What to do with an item missing its title, price or availability
    #[arg(long, value_enum)]
    on_missing_field: Option<MissingFieldPolicy>,
}

impl From<Cli> for Overrides {
    fn from(cli: Cli) -> Self {
        Overrides {
            source_url: cli.url,
            input_file: cli.input,
            output_path: cli.output,
            on_missing_field: cli.on_missing_field,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load(cli.into())?;
    info!(?settings, "Starting extraction");

    let code = match pipeline::run(&settings) {
        Ok(stats) => {
            stats.print();
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}", e);
            ExitCode::FAILURE
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    Ok(code)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
