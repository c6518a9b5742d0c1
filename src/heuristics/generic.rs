use super::{ExtractedFields, Extractor, PriceSource, TotalStrategy};
use crate::catalog::{ITEM_KEYWORDS, ItemTag};
use crate::document::QuoteDocument;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::debug;

// "Total", "Montant" or "TTC", then on the same line an amount like
// "1 250,00", "18500,00" or "980.50". Thousands may be split by a space,
// a no-break space or a narrow no-break space. The amount must stand alone:
// no digit, '.' or ',' right before it, and no further digits after the
// two decimals, so "1.250,00" is not misread as 1.25 or 250.
static TOTAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:total|montant|ttc)\b[^\n]*?[^\d.,\n](\d+(?:[ \x{00A0}\x{202F}]\d{3})*[.,]\d{2})(?:[^\d,.]|[.,]\D|[.,]?$)",
    )
    .unwrap()
});

// 14 digits, plain or grouped 3-3-3-5 ("123 456 789 00012").
static SIRET_GROUPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{3}[ \x{00A0}]?\d{3}[ \x{00A0}]?\d{3}[ \x{00A0}]?\d{5}\b").unwrap()
});

static SIRET_PLAIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{14}\b").unwrap());

/// Keyword-anchored regex extraction.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    strategy: TotalStrategy,
    fallback_price: f64,
}

impl RegexExtractor {
    pub fn new(strategy: TotalStrategy, fallback_price: f64) -> Self {
        Self {
            strategy,
            fallback_price,
        }
    }
}

impl Default for RegexExtractor {
    fn default() -> Self {
        Self::new(TotalStrategy::First, super::DEFAULT_FALLBACK_PRICE)
    }
}

impl Extractor for RegexExtractor {
    fn extract(&self, document: &QuoteDocument) -> ExtractedFields {
        let text = document.text();
        if text.trim().is_empty() {
            return ExtractedFields::empty(self.fallback_price);
        }

        let (total_price, price_source) = match extract_total(text, self.strategy) {
            Some(price) if price > 0.0 => (price, PriceSource::Document),
            found => {
                debug!(found = ?found, fallback = self.fallback_price, "No usable total, using fallback");
                (self.fallback_price, PriceSource::Fallback)
            }
        };

        ExtractedFields {
            total_price,
            price_source,
            registration_number: extract_registration_number(text),
            detected_items: detect_items(text),
        }
    }
}

// ---------------------------------------------------------------------------
// Field extractors
// ---------------------------------------------------------------------------

fn extract_total(text: &str, strategy: TotalStrategy) -> Option<f64> {
    let mut amounts = TOTAL_RE
        .captures_iter(text)
        .filter_map(|c| parse_european_amount(&c[1]));

    match strategy {
        TotalStrategy::First => amounts.next(),
        TotalStrategy::Largest => amounts.fold(None, |best: Option<f64>, v| {
            Some(best.map_or(v, |b| b.max(v)))
        }),
    }
}

/// "1 250,00" -> 1250.0
fn parse_european_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{202F}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok()
}

fn extract_registration_number(text: &str) -> Option<String> {
    if let Some(m) = SIRET_GROUPED_RE.find(text) {
        return Some(strip_whitespace(m.as_str()));
    }

    // Looser pass: digit groups may be split arbitrarily ("1234 5678 9000 12").
    let joined = join_digit_groups(text);
    SIRET_PLAIN_RE.find(&joined).map(|m| m.as_str().to_string())
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Drop whitespace that sits between two digits, keep everything else.
fn join_digit_groups(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if c.is_whitespace() {
            let after_digit = out.chars().last().is_some_and(|p| p.is_ascii_digit());
            let before_digit = chars[i + 1..]
                .iter()
                .find(|n| !n.is_whitespace())
                .is_some_and(|n| n.is_ascii_digit());
            if after_digit && before_digit {
                continue;
            }
        }
        out.push(c);
    }
    out
}

fn detect_items(text: &str) -> BTreeSet<ItemTag> {
    let lower = text.to_lowercase();
    ITEM_KEYWORDS
        .iter()
        .filter(|(keyword, _)| lower.contains(keyword))
        .map(|(_, tag)| *tag)
        .collect()
}
