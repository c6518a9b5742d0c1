use crate::catalog::{CatalogError, PriceCatalog, ProjectCategory, Region};
use crate::heuristics::{DEFAULT_FALLBACK_PRICE, TotalStrategy};
use crate::registry::{DEFAULT_REGISTRY_URL, DEFAULT_TIMEOUT_SECS};
use crate::verdict::{DEFAULT_RISK_THRESHOLD, VerdictPolicy};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use std::{fs, io, path::Path};
use thiserror::Error;
use toml_edit::{DocumentMut, value};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = ".config/quote_guard.toml";

/// Values that parse as TOML but cannot drive an analysis.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("fallback_price must be a positive finite amount, got {0}")]
    InvalidFallbackPrice(f64),

    #[error("registry.timeout_secs must be at least 1")]
    ZeroTimeout,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Quoted price assumed when the document has no readable total.
    #[serde(default = "default_fallback_price")]
    pub fallback_price: f64,
    /// Markup percent above which a quote is HIGH RISK.
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: i64,
    #[serde(default)]
    pub total_strategy: TotalStrategy,
    #[serde(default = "default_category")]
    pub default_category: String,
    #[serde(default = "default_region")]
    pub default_region: String,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub catalog: CatalogOverrides,
}

fn default_fallback_price() -> f64 {
    DEFAULT_FALLBACK_PRICE
}

fn default_risk_threshold() -> i64 {
    DEFAULT_RISK_THRESHOLD
}

fn default_category() -> String {
    ProjectCategory::GeneralRenovation.key().to_string()
}

fn default_region() -> String {
    Region::Paris.key().to_string()
}

#[derive(Debug, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_registry_url() -> String {
    DEFAULT_REGISTRY_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Per-key overrides of the built-in price tables, keyed by snake_case names.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogOverrides {
    #[serde(default)]
    pub items: BTreeMap<String, f64>,
    #[serde(default)]
    pub categories: BTreeMap<String, f64>,
    #[serde(default)]
    pub regions: BTreeMap<String, f64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_price: default_fallback_price(),
            risk_threshold: default_risk_threshold(),
            total_strategy: TotalStrategy::default(),
            default_category: default_category(),
            default_region: default_region(),
            registry: RegistryConfig::default(),
            catalog: CatalogOverrides::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fallback_price.is_finite() && self.fallback_price > 0.0) {
            return Err(ConfigError::InvalidFallbackPrice(self.fallback_price));
        }
        if self.registry.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// Like `load`, but a missing file means built-in defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn price_catalog(&self) -> Result<PriceCatalog, CatalogError> {
        PriceCatalog::with_overrides(
            &self.catalog.items,
            &self.catalog.categories,
            &self.catalog.regions,
        )
    }

    pub fn verdict_policy(&self) -> VerdictPolicy {
        VerdictPolicy::new(self.risk_threshold)
    }

    pub fn registry_timeout(&self) -> Duration {
        Duration::from_secs(self.registry.timeout_secs)
    }

    pub fn category(&self) -> ProjectCategory {
        ProjectCategory::parse_lenient(&self.default_category)
    }

    pub fn region(&self) -> Region {
        Region::parse_lenient(&self.default_region)
    }
}

/// A top-level setting `configure` can write back to the file.
#[derive(Debug, Clone, PartialEq)]
pub enum Setting {
    DefaultCategory(ProjectCategory),
    DefaultRegion(Region),
    FallbackPrice(f64),
    RiskThreshold(i64),
}

/// Rewrite top-level keys in place, keeping comments and layout.
/// Creates the file (and its directory) if it does not exist yet.
pub fn update_settings(
    path: impl AsRef<Path>,
    settings: &[Setting],
) -> Result<(), Box<dyn std::error::Error>> {
    let path = path.as_ref();
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    let mut doc = content.parse::<DocumentMut>()?;

    for setting in settings {
        match setting {
            Setting::DefaultCategory(c) => doc["default_category"] = value(c.key()),
            Setting::DefaultRegion(r) => doc["default_region"] = value(r.key()),
            Setting::FallbackPrice(p) => doc["fallback_price"] = value(*p),
            Setting::RiskThreshold(t) => doc["risk_threshold"] = value(*t),
        }
        info!(setting = ?setting, "Updated config");
    }

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(path, doc.to_string())?;
    Ok(())
}
