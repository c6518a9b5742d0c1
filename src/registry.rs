// src/registry.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};
use urlencoding::encode;

pub const DEFAULT_REGISTRY_URL: &str = "https://recherche-entreprises.api.gouv.fr/search";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanyStatus {
    Active,
    Closed,
    /// Registry unreachable or number missing; the user has to check by hand.
    Unknown,
}

impl fmt::Display for CompanyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompanyStatus::Active => f.write_str("ACTIVE"),
            CompanyStatus::Closed => f.write_str("CLOSED"),
            CompanyStatus::Unknown => f.write_str("CHECK MANUALLY"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyInfo {
    pub name: String,
    pub status: CompanyStatus,
    pub address: Option<String>,
}

impl CompanyInfo {
    pub fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            status: CompanyStatus::Unknown,
            address: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("registry request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("registry returned HTTP {0}")]
    Status(u16),

    #[error("no company registered under {0}")]
    NotFound(String),

    #[error("unexpected registry payload: {0}")]
    Malformed(String),
}

/// Something that can resolve a registration number to a company.
#[async_trait]
pub trait CompanyRegistry: Send + Sync {
    async fn lookup(&self, registration_number: &str) -> Result<CompanyInfo, LookupError>;
}

/// Public business-search API client. One GET, fixed timeout, no retry.
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LookupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    fn search_url(&self, registration_number: &str) -> String {
        format!("{}?q={}", self.base_url, encode(registration_number))
    }
}

#[async_trait]
impl CompanyRegistry for RegistryClient {
    async fn lookup(&self, registration_number: &str) -> Result<CompanyInfo, LookupError> {
        let url = self.search_url(registration_number);
        info!(url = %url, "Querying company registry");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "Registry returned non-OK status");
            return Err(LookupError::Status(status.as_u16()));
        }

        let body: Value = response.json().await?;
        parse_company(&body, registration_number)
    }
}

/// Accepts either a bare JSON array or `{"results": [...]}` and reads the first entry.
fn parse_company(body: &Value, registration_number: &str) -> Result<CompanyInfo, LookupError> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(obj) => obj
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| LookupError::Malformed("missing 'results' array".to_string()))?,
        other => {
            return Err(LookupError::Malformed(format!(
                "expected array or object, got {other}"
            )));
        }
    };

    let first = entries
        .first()
        .ok_or_else(|| LookupError::NotFound(registration_number.to_string()))?;

    let name = first_str(first, &[&["label"], &["nom_complet"], &["nom_raison_sociale"]])
        .unwrap_or("Unknown")
        .to_string();

    let status = match first.get("etat_administratif").and_then(Value::as_str) {
        Some("A") => CompanyStatus::Active,
        _ => CompanyStatus::Closed,
    };

    let address = first_str(
        first,
        &[
            &["first_matching_etablissement", "address"],
            &["first_matching_etablissement", "adresse"],
            &["siege", "adresse"],
        ],
    )
    .filter(|a| !a.trim().is_empty())
    .map(str::to_string);

    Ok(CompanyInfo {
        name,
        status,
        address,
    })
}

/// First non-null string found among the given key paths.
fn first_str<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    paths.iter().find_map(|path| {
        path.iter()
            .try_fold(value, |v, key| v.get(*key))
            .and_then(Value::as_str)
    })
}
