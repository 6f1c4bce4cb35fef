use std::sync::LazyLock;

use scraper::{ElementRef, Selector};
use thiserror::Error;

const HEADING: &str = "h3";
const HEADING_LINK: &str = "a";
const PRICE: &str = "p.price_color";
const AVAILABILITY: &str = "p.instock.availability";

static HEADING_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(HEADING).unwrap());
static HEADING_LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(HEADING_LINK).unwrap());
static PRICE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse(PRICE).unwrap());
static AVAILABILITY_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(AVAILABILITY).unwrap());

/// One extracted catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub price: String,
    pub availability: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("missing {field}: nothing matches `{selector}`")]
    MissingField {
        field: &'static str,
        selector: &'static str,
    },
}

/// Project an item block onto a `Record`.
pub fn project(item: ElementRef<'_>) -> Result<Record, ExtractError> {
    Ok(Record {
        title: title(item)?,
        price: trimmed_text(item, &PRICE_SEL, "price", PRICE)?,
        availability: trimmed_text(item, &AVAILABILITY_SEL, "availability", AVAILABILITY)?,
    })
}

/// The heading link's `title` attribute, verbatim. The visible link text
/// is often truncated ("A Light in the ...") so it is not used.
fn title(item: ElementRef<'_>) -> Result<String, ExtractError> {
    let missing = |selector| ExtractError::MissingField {
        field: "title",
        selector,
    };

    let heading = first(item, &HEADING_SEL).ok_or(missing(HEADING))?;
    let link = first(heading, &HEADING_LINK_SEL).ok_or(missing("h3 a"))?;
    match link.value().attr("title") {
        Some(title) if !title.is_empty() => Ok(title.to_string()),
        _ => Err(missing("h3 a[title]")),
    }
}

fn trimmed_text(
    item: ElementRef<'_>,
    sel: &Selector,
    field: &'static str,
    selector: &'static str,
) -> Result<String, ExtractError> {
    let node = first(item, sel).ok_or(ExtractError::MissingField { field, selector })?;
    Ok(node.text().collect::<String>().trim().to_string())
}

fn first<'a>(scope: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    scope.select(sel).next()
}

// ── Tests ──
