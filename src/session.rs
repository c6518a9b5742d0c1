// src/session.rs

use crate::catalog::{ProjectCategory, Region};
use crate::verdict::RiskLevel;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::VecDeque;

/// How many past scans a session remembers.
pub const HISTORY_LEN: usize = 5;

/// Short record of one finished analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub scan_id: String,
    pub category: ProjectCategory,
    pub region: Region,
    pub quoted_price: f64,
    pub fair_price: f64,
    pub risk_level: RiskLevel,
}

/// Caller-owned state for one user session. Never persisted.
#[derive(Debug, Default)]
pub struct SessionContext {
    /// Skip the registry lookup and report the company as unknown.
    pub demo_mode: bool,
    history: VecDeque<ScanSummary>,
}

impl SessionContext {
    pub fn new(demo_mode: bool) -> Self {
        Self {
            demo_mode,
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    /// Append a scan, dropping the oldest once the history is full.
    pub fn record(&mut self, summary: ScanSummary) {
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(summary);
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ScanSummary> {
        self.history.iter()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Stable fingerprint of a document's text, so re-scans of the same quote line up.
pub fn scan_id(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    digest[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(n: usize) -> ScanSummary {
        ScanSummary {
            scan_id: format!("scan{n}"),
            category: ProjectCategory::Painting,
            region: Region::Paris,
            quoted_price: 1000.0 + n as f64,
            fair_price: 1200.0,
            risk_level: RiskLevel::Safe,
        }
    }

    #[test]
    fn test_history_keeps_last_five() {
        let mut session = SessionContext::new(false);
        for n in 0..7 {
            session.record(summary(n));
        }
        assert_eq!(session.len(), HISTORY_LEN);
        let ids: Vec<&str> = session.history().map(|s| s.scan_id.as_str()).collect();
        assert_eq!(ids, vec!["scan2", "scan3", "scan4", "scan5", "scan6"]);
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = SessionContext::default();
        assert!(session.is_empty());
        assert!(!session.demo_mode);
    }

    #[test]
    fn test_scan_id_generation() {
        let id1 = scan_id("Total TTC: 1 250,00");
        let id2 = scan_id("Total TTC: 1 250,00");
        let id3 = scan_id("Total TTC: 1 260,00");

        assert_eq!(id1, id2);
        assert_ne!(id1, id3);
        assert_eq!(id1.len(), 12);
    }
}
