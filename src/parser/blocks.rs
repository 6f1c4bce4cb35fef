use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

/// One catalog entry on the listing page.
static ITEM_BLOCK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article.product_pod").unwrap());

/// Lenient HTML5 parse; malformed markup is repaired, never rejected.
pub fn parse(raw: &str) -> Html {
    Html::parse_document(raw)
}

/// Every item block in document order. An empty result is not an error.
pub fn item_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&ITEM_BLOCK).collect()
}
