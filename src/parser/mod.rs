pub mod blocks;
pub mod extract;

use scraper::ElementRef;
use thiserror::Error;
use tracing::{debug, warn};

use crate::settings::MissingFieldPolicy;
use extract::{ExtractError, Record};

/// A structural lookup failure, tagged with the 1-based item position.
#[derive(Debug, Error)]
#[error("item {position}: {source}")]
pub struct ItemError {
    pub position: usize,
    #[source]
    pub source: ExtractError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub matched: usize,
    pub extracted: usize,
    pub skipped: usize,
}

impl ExtractStats {
    pub fn print(&self) {
        println!(
            "Extracted {} of {} items ({} skipped).",
            self.extracted, self.matched, self.skipped
        );
    }
}

#[derive(Debug)]
pub struct Extraction {
    pub records: Vec<Record>,
    pub stats: ExtractStats,
}

/// Project every item block, in order, applying `policy` to broken items.
pub fn extract_records(
    items: &[ElementRef<'_>],
    policy: MissingFieldPolicy,
) -> Result<Extraction, ItemError> {
    let mut records = Vec::with_capacity(items.len());
    let mut skipped = 0usize;

    for (i, item) in items.iter().enumerate() {
        let position = i + 1;
        match extract::project(*item) {
            Ok(record) => {
                debug!(position, title = %record.title, "Extracted item");
                records.push(record);
            }
            Err(source) => match policy {
                MissingFieldPolicy::Abort => return Err(ItemError { position, source }),
                MissingFieldPolicy::Skip => {
                    warn!(position, "Skipping item: {}", source);
                    skipped += 1;
                }
            },
        }
    }

    let stats = ExtractStats {
        matched: items.len(),
        extracted: records.len(),
        skipped,
    };
    Ok(Extraction { records, stats })
}
