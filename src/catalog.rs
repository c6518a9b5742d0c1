// src/catalog.rs

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Flat cost used when a category has no entry in the catalog.
pub const DEFAULT_CATEGORY_COST: f64 = 1000.0;

/// Multiplier used when a region has no entry in the catalog.
pub const DEFAULT_REGION_MULTIPLIER: f64 = 1.0;

/// A renovation item we can spot in a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTag {
    Painting,
    Kitchen,
    Shower,
    Toilet,
    Electrical,
    Tiling,
    Flooring,
    WaterHeater,
    Window,
}

impl ItemTag {
    pub const ALL: [ItemTag; 9] = [
        ItemTag::Painting,
        ItemTag::Kitchen,
        ItemTag::Shower,
        ItemTag::Toilet,
        ItemTag::Electrical,
        ItemTag::Tiling,
        ItemTag::Flooring,
        ItemTag::WaterHeater,
        ItemTag::Window,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ItemTag::Painting => "painting",
            ItemTag::Kitchen => "kitchen",
            ItemTag::Shower => "shower",
            ItemTag::Toilet => "toilet",
            ItemTag::Electrical => "electrical",
            ItemTag::Tiling => "tiling",
            ItemTag::Flooring => "flooring",
            ItemTag::WaterHeater => "water_heater",
            ItemTag::Window => "window",
        }
    }

    /// Reference (Paris) cost of the item.
    fn default_cost(self) -> f64 {
        match self {
            ItemTag::Painting => 1500.0,
            ItemTag::Kitchen => 6000.0,
            ItemTag::Shower => 2500.0,
            ItemTag::Toilet => 900.0,
            ItemTag::Electrical => 3000.0,
            ItemTag::Tiling => 1800.0,
            ItemTag::Flooring => 2200.0,
            ItemTag::WaterHeater => 1400.0,
            ItemTag::Window => 1000.0,
        }
    }
}

impl fmt::Display for ItemTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemTag::Painting => "Painting",
            ItemTag::Kitchen => "Kitchen",
            ItemTag::Shower => "Shower",
            ItemTag::Toilet => "Toilet",
            ItemTag::Electrical => "Electrical work",
            ItemTag::Tiling => "Tiling",
            ItemTag::Flooring => "Flooring",
            ItemTag::WaterHeater => "Water heater",
            ItemTag::Window => "Windows",
        };
        f.write_str(label)
    }
}

impl FromStr for ItemTag {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        ItemTag::ALL
            .into_iter()
            .find(|t| t.key() == wanted)
            .ok_or(UnknownKey(s.to_string()))
    }
}

/// Keyword -> tag table. Keywords are matched against lower-cased text.
pub const ITEM_KEYWORDS: &[(&str, ItemTag)] = &[
    ("peinture", ItemTag::Painting),
    ("painting", ItemTag::Painting),
    ("paint", ItemTag::Painting),
    ("cuisine", ItemTag::Kitchen),
    ("kitchen", ItemTag::Kitchen),
    ("douche", ItemTag::Shower),
    ("shower", ItemTag::Shower),
    ("toilette", ItemTag::Toilet),
    ("toilet", ItemTag::Toilet),
    ("électricité", ItemTag::Electrical),
    ("electricite", ItemTag::Electrical),
    ("tableau électrique", ItemTag::Electrical),
    ("electrical", ItemTag::Electrical),
    ("carrelage", ItemTag::Tiling),
    ("faïence", ItemTag::Tiling),
    ("tiling", ItemTag::Tiling),
    ("parquet", ItemTag::Flooring),
    ("flooring", ItemTag::Flooring),
    ("chauffe-eau", ItemTag::WaterHeater),
    ("ballon d'eau chaude", ItemTag::WaterHeater),
    ("water heater", ItemTag::WaterHeater),
    ("fenêtre", ItemTag::Window),
    ("fenetre", ItemTag::Window),
    ("window", ItemTag::Window),
];

/// The kind of job the user says the quote is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectCategory {
    Plumbing,
    Electricity,
    Painting,
    GeneralRenovation,
    Other,
}

impl ProjectCategory {
    pub const ALL: [ProjectCategory; 5] = [
        ProjectCategory::Plumbing,
        ProjectCategory::Electricity,
        ProjectCategory::Painting,
        ProjectCategory::GeneralRenovation,
        ProjectCategory::Other,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ProjectCategory::Plumbing => "plumbing",
            ProjectCategory::Electricity => "electricity",
            ProjectCategory::Painting => "painting",
            ProjectCategory::GeneralRenovation => "general_renovation",
            ProjectCategory::Other => "other",
        }
    }

    /// Lenient parse: anything unrecognised becomes `Other`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|e: UnknownKey| {
            warn!(category = %e.0, "Unknown project category, using 'other'");
            ProjectCategory::Other
        })
    }
}

impl fmt::Display for ProjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProjectCategory::Plumbing => "Plumbing",
            ProjectCategory::Electricity => "Electricity",
            ProjectCategory::Painting => "Painting",
            ProjectCategory::GeneralRenovation => "General Renovation",
            ProjectCategory::Other => "Other",
        };
        f.write_str(label)
    }
}

impl FromStr for ProjectCategory {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        ProjectCategory::ALL
            .into_iter()
            .find(|c| c.key() == wanted)
            .ok_or(UnknownKey(s.to_string()))
    }
}

/// Pricing region. Paris is the reference (multiplier 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Paris,
    IleDeFrance,
    Lyon,
    Marseille,
    Bordeaux,
    Lille,
    Province,
}

impl Region {
    pub const ALL: [Region; 7] = [
        Region::Paris,
        Region::IleDeFrance,
        Region::Lyon,
        Region::Marseille,
        Region::Bordeaux,
        Region::Lille,
        Region::Province,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Region::Paris => "paris",
            Region::IleDeFrance => "ile_de_france",
            Region::Lyon => "lyon",
            Region::Marseille => "marseille",
            Region::Bordeaux => "bordeaux",
            Region::Lille => "lille",
            Region::Province => "province",
        }
    }

    fn default_multiplier(self) -> f64 {
        match self {
            Region::Paris => 1.0,
            Region::IleDeFrance => 0.9,
            Region::Lyon => 0.85,
            Region::Marseille => 0.8,
            Region::Bordeaux => 0.8,
            Region::Lille => 0.75,
            Region::Province => 0.7,
        }
    }

    /// Lenient parse: anything unrecognised becomes `Paris`.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_else(|e: UnknownKey| {
            warn!(region = %e.0, "Unknown region, using 'paris'");
            Region::Paris
        })
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Region::Paris => "Paris",
            Region::IleDeFrance => "Île-de-France",
            Region::Lyon => "Lyon",
            Region::Marseille => "Marseille",
            Region::Bordeaux => "Bordeaux",
            Region::Lille => "Lille",
            Region::Province => "Province",
        };
        f.write_str(label)
    }
}

impl FromStr for Region {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_key(s);
        Region::ALL
            .into_iter()
            .find(|r| r.key() == wanted)
            .ok_or(UnknownKey(s.to_string()))
    }
}

/// "Île-de-France", "ile de france" and "ile-de-france" all map to "ile_de_france".
fn normalize_key(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
        .replace('î', "i")
}

#[derive(Debug, Error)]
#[error("unknown key: {0}")]
pub struct UnknownKey(pub String);

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cost for '{key}' must be a positive finite amount, got {value}")]
    NonPositiveCost { key: String, value: f64 },

    #[error("multiplier for region '{key}' must be in (0, 1], got {value}")]
    MultiplierOutOfRange { key: String, value: f64 },

    #[error("paris is the reference region, its multiplier must stay 1.0, got {value}")]
    ReferenceRegion { value: f64 },
}

/// Static pricing tables. Built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct PriceCatalog {
    items: HashMap<ItemTag, f64>,
    categories: HashMap<ProjectCategory, f64>,
    regions: HashMap<Region, f64>,
}

impl Default for PriceCatalog {
    fn default() -> Self {
        let items = ItemTag::ALL.iter().map(|t| (*t, t.default_cost())).collect();
        let categories = HashMap::from([
            (ProjectCategory::Plumbing, 600.0),
            (ProjectCategory::Electricity, 900.0),
            (ProjectCategory::Painting, 1200.0),
            (ProjectCategory::GeneralRenovation, 2000.0),
        ]);
        let regions = Region::ALL
            .iter()
            .map(|r| (*r, r.default_multiplier()))
            .collect();
        Self {
            items,
            categories,
            regions,
        }
    }
}

impl PriceCatalog {
    /// Start from the built-in tables and apply overrides keyed by snake_case names.
    /// Unknown keys are logged and skipped.
    pub fn with_overrides(
        items: &BTreeMap<String, f64>,
        categories: &BTreeMap<String, f64>,
        regions: &BTreeMap<String, f64>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::default();

        for (key, &cost) in items {
            check_cost(key, cost)?;
            match key.parse::<ItemTag>() {
                Ok(tag) => {
                    catalog.items.insert(tag, cost);
                }
                Err(_) => warn!(key = %key, "Ignoring unknown item in catalog override"),
            }
        }

        for (key, &cost) in categories {
            check_cost(key, cost)?;
            match key.parse::<ProjectCategory>() {
                Ok(category) => {
                    catalog.categories.insert(category, cost);
                }
                Err(_) => warn!(key = %key, "Ignoring unknown category in catalog override"),
            }
        }

        for (key, &multiplier) in regions {
            if !(multiplier > 0.0 && multiplier <= 1.0) {
                return Err(CatalogError::MultiplierOutOfRange {
                    key: key.clone(),
                    value: multiplier,
                });
            }
            match key.parse::<Region>() {
                Ok(Region::Paris) if multiplier != 1.0 => {
                    return Err(CatalogError::ReferenceRegion { value: multiplier });
                }
                Ok(region) => {
                    catalog.regions.insert(region, multiplier);
                }
                Err(_) => warn!(key = %key, "Ignoring unknown region in catalog override"),
            }
        }

        Ok(catalog)
    }

    pub fn item_cost(&self, tag: ItemTag) -> Option<f64> {
        self.items.get(&tag).copied()
    }

    pub fn category_cost(&self, category: ProjectCategory) -> f64 {
        self.categories
            .get(&category)
            .copied()
            .unwrap_or(DEFAULT_CATEGORY_COST)
    }

    pub fn multiplier(&self, region: Region) -> f64 {
        self.regions
            .get(&region)
            .copied()
            .unwrap_or(DEFAULT_REGION_MULTIPLIER)
    }
}

fn check_cost(key: &str, value: f64) -> Result<(), CatalogError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(CatalogError::NonPositiveCost {
            key: key.to_string(),
            value,
        })
    }
}
