// src/estimator.rs

use crate::catalog::{ItemTag, PriceCatalog, ProjectCategory, Region};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// One priced row of a fair estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EstimateLine {
    pub label: String,
    pub cost: f64,
}

/// Reference cost of the job. `total` is always positive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FairEstimate {
    pub total: f64,
    pub line_items: Vec<EstimateLine>,
}

/// Price the detected items for the region, or fall back to the flat
/// category cost when nothing priceable was detected.
pub fn estimate(
    catalog: &PriceCatalog,
    items: &BTreeSet<ItemTag>,
    category: ProjectCategory,
    region: Region,
) -> FairEstimate {
    let multiplier = catalog.multiplier(region);

    let line_items: Vec<EstimateLine> = items
        .iter()
        .filter_map(|tag| {
            catalog.item_cost(*tag).map(|base| EstimateLine {
                label: tag.to_string(),
                cost: base * multiplier,
            })
        })
        .collect();

    if line_items.is_empty() {
        let cost = catalog.category_cost(category) * multiplier;
        debug!(%category, %region, cost, "No priced items, using category estimate");
        return FairEstimate {
            total: cost,
            line_items: vec![EstimateLine {
                label: format!("Standard estimate ({category})"),
                cost,
            }],
        };
    }

    let total = line_items.iter().map(|l| l.cost).sum();
    debug!(%region, multiplier, lines = line_items.len(), total, "Itemised estimate");
    FairEstimate { total, line_items }
}
