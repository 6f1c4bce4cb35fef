use reqwest::blocking::Client;
use thiserror::Error;
use tracing::info;

use crate::fetcher::{self, FetchError};
use crate::parser::{self, blocks, ExtractStats, ItemError};
use crate::settings::Settings;
use crate::writer::{self, WriteError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] FetchError),
    #[error("Extraction aborted at {0}")]
    StructuralLookup(#[from] ItemError),
    #[error("Failed to save CSV file: {0}")]
    Write(#[from] WriteError),
}

pub fn run(settings: &Settings) -> Result<ExtractStats, PipelineError> {
    run_with(&Client::new(), settings)
}

/// Fetch → parse → project → write. Each stage must succeed before the
/// next starts; nothing is written unless extraction finished.
pub fn run_with(client: &Client, settings: &Settings) -> Result<ExtractStats, PipelineError> {
    let html = match &settings.input_file {
        Some(path) => fetcher::read_file(path)?,
        None => fetcher::fetch(client, &settings.source_url)?,
    };

    let document = blocks::parse(&html);
    let items = blocks::item_blocks(&document);
    println!("Extracting data from {} items...", items.len());
    let extraction = parser::extract_records(&items, settings.on_missing_field)?;

    let path = &settings.output_path;
    println!("Saving data to {}...", path.display());
    writer::write_records(&extraction.records, path)?;
    info!(rows = extraction.records.len(), "Wrote {}", path.display());
    println!(
        "Saved {} records to {}.",
        extraction.records.len(),
        path.display()
    );

    Ok(extraction.stats)
}
