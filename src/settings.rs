use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

pub const DEFAULT_SOURCE_URL: &str = "https://books.toscrape.com/index.html";
pub const DEFAULT_OUTPUT_PATH: &str = "books.csv";
const ENV_PREFIX: &str = "BOOKS";

/// What to do with an item block that lacks one of the expected fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MissingFieldPolicy {
    /// Stop the run on the first broken item; nothing is written.
    #[default]
    Abort,
    /// Log the broken item and leave it out of the output.
    Skip,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub source_url: String,
    /// Saved listing page to read instead of fetching `source_url`.
    #[serde(default)]
    pub input_file: Option<PathBuf>,
    pub output_path: PathBuf,
    pub on_missing_field: MissingFieldPolicy,
}

/// Values given on the command line. They win over the environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub source_url: Option<String>,
    pub input_file: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub on_missing_field: Option<MissingFieldPolicy>,
}

impl Settings {
    /// Defaults, then `BOOKS_*` environment variables, then `overrides`.
    pub fn load(overrides: Overrides) -> Result<Self> {
        Self::build(Environment::with_prefix(ENV_PREFIX), overrides)
    }

    fn build(env: Environment, overrides: Overrides) -> Result<Self> {
        let policy = overrides.on_missing_field.map(|p| match p {
            MissingFieldPolicy::Abort => "abort",
            MissingFieldPolicy::Skip => "skip",
        });

        Config::builder()
            .set_default("source_url", DEFAULT_SOURCE_URL)?
            .set_default("output_path", DEFAULT_OUTPUT_PATH)?
            .set_default("on_missing_field", "abort")?
            .add_source(env)
            .set_override_option("source_url", overrides.source_url)?
            .set_override_option("input_file", overrides.input_file.map(path_value))?
            .set_override_option("output_path", overrides.output_path.map(path_value))?
            .set_override_option("on_missing_field", policy)?
            .build()
            .context("Failed to load settings")?
            .try_deserialize()
            .context("Invalid settings")
    }
}

fn path_value(path: PathBuf) -> String {
    path.to_string_lossy().into_owned()
}
