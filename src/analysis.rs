// src/analysis.rs

use crate::catalog::{PriceCatalog, ProjectCategory, Region};
use crate::document::QuoteDocument;
use crate::estimator;
use crate::heuristics::Extractor;
use crate::registry::{CompanyInfo, CompanyRegistry};
use crate::report::{self, QuoteAnalysis, REPORT_TITLE, Report, ReportDetails};
use crate::session::{self, ScanSummary, SessionContext};
use crate::verdict::VerdictPolicy;
use time::OffsetDateTime;
use tracing::{info, warn};

/// Runs one quote through extraction, company lookup, estimation and verdict.
pub struct Analyzer<E, R> {
    extractor: E,
    registry: R,
    catalog: PriceCatalog,
    policy: VerdictPolicy,
}

impl<E: Extractor, R: CompanyRegistry> Analyzer<E, R> {
    pub fn new(extractor: E, registry: R, catalog: PriceCatalog, policy: VerdictPolicy) -> Self {
        Self {
            extractor,
            registry,
            catalog,
            policy,
        }
    }

    /// Always produces a report; every miss along the way degrades to a default.
    pub async fn analyze(
        &self,
        document: &QuoteDocument,
        category: ProjectCategory,
        region: Region,
        session: &mut SessionContext,
    ) -> QuoteAnalysis {
        let fields = self.extractor.extract(document);
        let (filled, total) = fields.coverage();
        info!(
            filled,
            total,
            price = fields.total_price,
            price_source = ?fields.price_source,
            siret = ?fields.registration_number,
            items = fields.detected_items.len(),
            "Extraction result"
        );

        let company = self
            .company_for(fields.registration_number.as_deref(), session.demo_mode)
            .await;

        let estimate = estimator::estimate(&self.catalog, &fields.detected_items, category, region);
        let verdict = self.policy.classify(fields.total_price, estimate.total);
        info!(
            quoted = fields.total_price,
            fair = estimate.total,
            markup = verdict.markup_percent,
            risk = %verdict.risk_level,
            "Verdict"
        );

        session.record(ScanSummary {
            scan_id: session::scan_id(document.text()),
            category,
            region,
            quoted_price: fields.total_price,
            fair_price: estimate.total,
            risk_level: verdict.risk_level,
        });

        let report = Report {
            title: REPORT_TITLE.to_string(),
            date: OffsetDateTime::now_utc().date().to_string(),
            category,
            region,
            company_name: company.name,
            company_status: company.status,
            quoted_price: fields.total_price,
            fair_price: estimate.total,
            difference: verdict.delta,
            verdict: verdict.risk_level,
            line_items: estimate.line_items,
        };
        let details = ReportDetails {
            company_address: company.address,
            registration_number: fields.registration_number,
            price_source: fields.price_source,
            markup_percent: verdict.markup_percent,
            negotiation_script: report::verdict_script(&verdict, estimate.total, region),
        };
        QuoteAnalysis { report, details }
    }

    async fn company_for(&self, registration_number: Option<&str>, demo_mode: bool) -> CompanyInfo {
        let Some(number) = registration_number else {
            info!("No registration number found, skipping company lookup");
            return CompanyInfo::unknown();
        };
        if demo_mode {
            info!("Demo mode, skipping company lookup");
            return CompanyInfo::unknown();
        }

        match self.registry.lookup(number).await {
            Ok(company) => {
                info!(name = %company.name, status = %company.status, "Company found");
                company
            }
            Err(e) => {
                warn!(error = %e, "Company lookup unavailable, check manually");
                CompanyInfo::unknown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ItemTag;
    use crate::heuristics::{PriceSource, RegexExtractor};
    use crate::registry::{CompanyStatus, LookupError};
    use crate::verdict::RiskLevel;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every lookup with the same company, counting calls.
    struct FixedRegistry {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CompanyRegistry for FixedRegistry {
        async fn lookup(&self, registration_number: &str) -> Result<CompanyInfo, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(registration_number, "12345678900012");
            Ok(CompanyInfo {
                name: "DUPONT RENOVATION".to_string(),
                status: CompanyStatus::Active,
                address: Some("12 RUE DE RIVOLI 75004 PARIS".to_string()),
            })
        }
    }

    struct DownRegistry;

    #[async_trait]
    impl CompanyRegistry for DownRegistry {
        async fn lookup(&self, _: &str) -> Result<CompanyInfo, LookupError> {
            Err(LookupError::Status(503))
        }
    }

    fn analyzer<R: CompanyRegistry>(registry: R) -> Analyzer<RegexExtractor, R> {
        Analyzer::new(
            RegexExtractor::default(),
            registry,
            PriceCatalog::default(),
            VerdictPolicy::default(),
        )
    }

    const QUOTE: &str = "Entreprise Dupont\nSIRET : 123 456 789 00012\n\
                         Devis: Peinture, Cuisine, Douche\n\
                         Total TTC: 18500,00 €\n";

    #[tokio::test]
    async fn test_end_to_end_high_risk() {
        let analyzer = analyzer(FixedRegistry {
            calls: AtomicUsize::new(0),
        });
        let mut session = SessionContext::new(false);
        let doc = QuoteDocument::from_text(QUOTE);

        let QuoteAnalysis { report, details } = analyzer
            .analyze(&doc, ProjectCategory::GeneralRenovation, Region::Paris, &mut session)
            .await;

        let labels: Vec<String> = [ItemTag::Painting, ItemTag::Kitchen, ItemTag::Shower]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let got: Vec<String> = report.line_items.iter().map(|l| l.label.clone()).collect();
        assert_eq!(got, labels);

        assert_eq!(report.quoted_price, 18500.0);
        assert_eq!(details.price_source, PriceSource::Document);
        assert_eq!(report.fair_price, 10_000.0);
        assert_eq!(report.difference, 8500.0);
        assert_eq!(details.markup_percent, 85);
        assert_eq!(report.verdict, RiskLevel::HighRisk);
        assert!(details.negotiation_script.is_some());
        assert_eq!(details.registration_number.as_deref(), Some("12345678900012"));
        assert_eq!(report.company_name, "DUPONT RENOVATION");
        assert_eq!(report.company_status, CompanyStatus::Active);
        assert_eq!(analyzer.registry.calls.load(Ordering::SeqCst), 1);

        assert_eq!(session.len(), 1);
        let last = session.history().last().unwrap();
        assert_eq!(last.risk_level, RiskLevel::HighRisk);
        assert_eq!(last.scan_id, session::scan_id(QUOTE));
    }

    #[tokio::test]
    async fn test_registry_down_degrades() {
        let analyzer = analyzer(DownRegistry);
        let mut session = SessionContext::new(false);
        let doc = QuoteDocument::from_text(QUOTE);

        let report = analyzer
            .analyze(&doc, ProjectCategory::GeneralRenovation, Region::Paris, &mut session)
            .await
            .report;

        assert_eq!(report.company_status, CompanyStatus::Unknown);
        assert_eq!(report.company_name, "Unknown");
        assert_eq!(report.verdict, RiskLevel::HighRisk);
    }

    #[tokio::test]
    async fn test_demo_mode_skips_lookup() {
        let analyzer = analyzer(FixedRegistry {
            calls: AtomicUsize::new(0),
        });
        let mut session = SessionContext::new(true);
        let doc = QuoteDocument::from_text(QUOTE);

        let report = analyzer
            .analyze(&doc, ProjectCategory::Painting, Region::Lyon, &mut session)
            .await
            .report;

        assert_eq!(report.company_status, CompanyStatus::Unknown);
        assert_eq!(analyzer.registry.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_document_uses_fallbacks() {
        let analyzer = analyzer(FixedRegistry {
            calls: AtomicUsize::new(0),
        });
        let mut session = SessionContext::default();
        let doc = QuoteDocument::from_text("");

        let QuoteAnalysis { report, details } = analyzer
            .analyze(&doc, ProjectCategory::Painting, Region::Paris, &mut session)
            .await;

        // fallback 1200 against the flat 1200 painting estimate
        assert_eq!(report.quoted_price, 1200.0);
        assert_eq!(details.price_source, PriceSource::Fallback);
        assert_eq!(report.fair_price, 1200.0);
        assert_eq!(details.markup_percent, 0);
        assert_eq!(report.verdict, RiskLevel::Safe);
        assert_eq!(report.line_items.len(), 1);
        assert!(details.negotiation_script.is_none());
        assert_eq!(report.company_status, CompanyStatus::Unknown);
        assert_eq!(analyzer.registry.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_session_history_rolls() {
        let analyzer = analyzer(DownRegistry);
        let mut session = SessionContext::new(true);

        for n in 0..8 {
            let doc = QuoteDocument::from_text(format!("Total {n} 000,00"));
            analyzer
                .analyze(&doc, ProjectCategory::Other, Region::Province, &mut session)
                .await;
        }

        assert_eq!(session.len(), 5);
        let quoted: Vec<f64> = session.history().map(|s| s.quoted_price).collect();
        assert_eq!(quoted, vec![3000.0, 4000.0, 5000.0, 6000.0, 7000.0]);
    }
}
