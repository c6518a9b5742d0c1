// src/heuristics/mod.rs

mod generic;

pub use generic::RegexExtractor;

use crate::catalog::ItemTag;
use crate::document::QuoteDocument;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Quoted price used when the document has no recognisable total.
pub const DEFAULT_FALLBACK_PRICE: f64 = 1200.0;

/// Where the quoted price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Document,
    Fallback,
}

/// Which total to keep when a quote lists several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalStrategy {
    /// First labelled amount in reading order.
    #[default]
    First,
    /// Largest labelled amount, for layouts that print sub-totals before the grand total.
    Largest,
}

/// Everything we pull out of a quote's text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedFields {
    pub total_price: f64,
    pub price_source: PriceSource,
    pub registration_number: Option<String>,
    pub detected_items: BTreeSet<ItemTag>,
}

impl ExtractedFields {
    /// Result for a document we could not read at all.
    pub fn empty(fallback_price: f64) -> Self {
        Self {
            total_price: fallback_price,
            price_source: PriceSource::Fallback,
            registration_number: None,
            detected_items: BTreeSet::new(),
        }
    }

    /// How many of the three fields came from the document itself.
    pub fn coverage(&self) -> (usize, usize) {
        let filled = [
            self.price_source == PriceSource::Document,
            self.registration_number.is_some(),
            !self.detected_items.is_empty(),
        ]
        .iter()
        .filter(|&&v| v)
        .count();
        (filled, 3)
    }
}

/// Turns quote text into structured fields. Never fails: misses degrade to defaults.
pub trait Extractor {
    fn extract(&self, document: &QuoteDocument) -> ExtractedFields;
}
