mod canonical;
mod stock;

pub use canonical::LinkCanonicalizer;
pub use stock::StockPredicate;

use scraper::{ElementRef, Html, Selector};

use crate::config::SourceConfig;
use crate::error::{Result, WatchError};
use crate::models::AvailabilityRecord;
use crate::utils::text::{clean_text, selection_text};

/// Immutable description of how one listing page becomes availability records.
///
/// Extraction is pure: the same document always yields the same records, and a
/// selector that matches nothing yields no records (or empty text) rather than
/// an error.
#[derive(Debug, Clone)]
pub struct ExtractionSpec {
    pub name: String,
    pub url: String,
    list: Selector,
    link: Selector,
    stock: Selector,
    predicate: StockPredicate,
    canonicalizer: LinkCanonicalizer,
}

impl ExtractionSpec {
    pub fn from_config(source: &SourceConfig) -> Result<Self> {
        Ok(Self {
            name: source.name.clone(),
            url: source.url.clone(),
            list: parse_selector(&source.list_selector)?,
            link: parse_selector(&source.link_selector)?,
            stock: parse_selector(&source.stock_selector)?,
            predicate: StockPredicate::compile(&source.stock_rule)?,
            canonicalizer: LinkCanonicalizer::compile(source.link_rewrite.as_ref())?,
        })
    }

    pub fn extract_from_html(&self, html: &str) -> Vec<AvailabilityRecord> {
        let document = Html::parse_document(html);
        self.extract(&document)
    }

    /// One record per direct child of every list container, in document order.
    pub fn extract(&self, document: &Html) -> Vec<AvailabilityRecord> {
        document
            .select(&self.list)
            .flat_map(|container| container.children().filter_map(ElementRef::wrap))
            .map(|entry| self.extract_entry(entry))
            .collect()
    }

    fn extract_entry(&self, entry: ElementRef<'_>) -> AvailabilityRecord {
        let link_nodes: Vec<ElementRef<'_>> = entry.select(&self.link).collect();

        // A missing href collapses to the empty link.
        let href = link_nodes
            .first()
            .and_then(|node| node.value().attr("href"))
            .unwrap_or_default();
        let title = clean_text(&selection_text(link_nodes.iter().copied()));
        let indicator = selection_text(entry.select(&self.stock));

        AvailabilityRecord::new(
            self.canonicalizer.canonicalize(href),
            title,
            self.predicate.is_in_stock(&indicator),
        )
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| WatchError::InvalidSelector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}
