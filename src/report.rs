// src/report.rs

use crate::catalog::{ProjectCategory, Region};
use crate::estimator::EstimateLine;
use crate::heuristics::PriceSource;
use crate::registry::CompanyStatus;
use crate::verdict::{RiskLevel, Verdict};
use serde::Serialize;
use std::fmt;

pub const REPORT_TITLE: &str = "QuoteGuard Analysis Report";

/// Export record: exactly what a document generator needs to render one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub date: String,
    pub category: ProjectCategory,
    pub region: Region,
    pub company_name: String,
    pub company_status: CompanyStatus,
    pub quoted_price: f64,
    pub fair_price: f64,
    pub difference: f64,
    pub verdict: RiskLevel,
    pub line_items: Vec<EstimateLine>,
}

impl Report {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Extra findings shown on the terminal but kept out of the export record.
#[derive(Debug, Clone, Serialize)]
pub struct ReportDetails {
    pub company_address: Option<String>,
    pub registration_number: Option<String>,
    pub price_source: PriceSource,
    pub markup_percent: i64,
    /// Message the customer can send back to the contractor; high-risk quotes only.
    pub negotiation_script: Option<String>,
}

/// Result of one analysis: the export record plus its details.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteAnalysis {
    pub report: Report,
    pub details: ReportDetails,
}

impl QuoteAnalysis {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Suggested reply asking the contractor to revise an overpriced quote.
pub fn negotiation_script(fair_price: f64, region: Region) -> String {
    format!(
        "Bonjour, après vérification des standards du marché ({region}), la moyenne pour ces \
         travaux est de {} €. Pouvez-vous revoir ce devis ?",
        group_thousands(fair_price)
    )
}

pub fn verdict_script(verdict: &Verdict, fair_price: f64, region: Region) -> Option<String> {
    (verdict.risk_level == RiskLevel::HighRisk).then(|| negotiation_script(fair_price, region))
}

/// Plain-text rendering for the terminal.
impl fmt::Display for QuoteAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (report, details) = (&self.report, &self.details);
        writeln!(f, "{} ({})", report.title, report.date)?;
        writeln!(f, "Project:   {} / {}", report.category, report.region)?;

        let siret = details.registration_number.as_deref().unwrap_or("not found");
        writeln!(f, "Company:   {} [{}] SIRET {siret}", report.company_name, report.company_status)?;
        writeln!(
            f,
            "Address:   {}",
            details.company_address.as_deref().unwrap_or("Address not detected")
        )?;

        let source = match details.price_source {
            PriceSource::Document => "",
            PriceSource::Fallback => " (not found in document, default used)",
        };
        writeln!(f, "Quoted:    €{}{source}", group_thousands(report.quoted_price))?;
        writeln!(f, "Fair:      €{}", group_thousands(report.fair_price))?;
        for line in &report.line_items {
            writeln!(f, "  - {:<32} €{}", line.label, group_thousands(line.cost))?;
        }
        writeln!(f, "Markup:    {:+}% vs market", details.markup_percent)?;
        writeln!(f, "Verdict:   {}", report.verdict)?;

        if report.difference > 0.0 {
            writeln!(f, "Possible overpayment of €{}", group_thousands(report.difference))?;
        } else {
            writeln!(f, "Estimated saving €{}", group_thousands(report.difference.abs()))?;
        }

        if let Some(script) = &details.negotiation_script {
            writeln!(f, "\nNegotiation script:\n  {script}")?;
        }
        Ok(())
    }
}

/// 18500.0 -> "18,500". Rounds to whole units.
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(verdict: RiskLevel, difference: f64) -> QuoteAnalysis {
        QuoteAnalysis {
            report: Report {
                title: REPORT_TITLE.to_string(),
                date: "2026-01-15".to_string(),
                category: ProjectCategory::GeneralRenovation,
                region: Region::Paris,
                company_name: "DUPONT RENOVATION".to_string(),
                company_status: CompanyStatus::Active,
                quoted_price: 10_000.0 + difference,
                fair_price: 10_000.0,
                difference,
                verdict,
                line_items: vec![EstimateLine {
                    label: "Kitchen".to_string(),
                    cost: 10_000.0,
                }],
            },
            details: ReportDetails {
                company_address: None,
                registration_number: Some("12345678900012".to_string()),
                price_source: PriceSource::Document,
                markup_percent: (difference / 100.0).round() as i64,
                negotiation_script: None,
            },
        }
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.4), "999");
        assert_eq!(group_thousands(1250.0), "1,250");
        assert_eq!(group_thousands(18500.0), "18,500");
        assert_eq!(group_thousands(1234567.0), "1,234,567");
        assert_eq!(group_thousands(-2500.0), "-2,500");
    }

    #[test]
    fn test_script_only_for_high_risk() {
        let high = Verdict {
            markup_percent: 85,
            risk_level: RiskLevel::HighRisk,
            delta: 8500.0,
        };
        let safe = Verdict {
            markup_percent: 10,
            risk_level: RiskLevel::Safe,
            delta: 1000.0,
        };
        let script = verdict_script(&high, 10_000.0, Region::Lyon).unwrap();
        assert!(script.contains("10,000 €"));
        assert!(script.contains("Lyon"));
        assert!(verdict_script(&safe, 10_000.0, Region::Lyon).is_none());
    }

    #[test]
    fn test_text_rendering() {
        let text = sample(RiskLevel::HighRisk, 8500.0).to_string();
        assert!(text.contains("Verdict:   HIGH RISK"));
        assert!(text.contains("Possible overpayment of €8,500"));
        assert!(text.contains("Address not detected"));
        assert!(text.contains("+85% vs market"));

        let text = sample(RiskLevel::Safe, -1500.0).to_string();
        assert!(text.contains("Estimated saving €1,500"));
    }

    #[test]
    fn test_export_record_has_exactly_listed_fields() {
        let json = sample(RiskLevel::Safe, 0.0).report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort_unstable();

        let mut expected = vec![
            "title",
            "date",
            "category",
            "region",
            "company_name",
            "company_status",
            "quoted_price",
            "fair_price",
            "difference",
            "verdict",
            "line_items",
        ];
        expected.sort_unstable();

        assert_eq!(keys, expected);
        assert_eq!(value["verdict"], "SAFE");
        assert_eq!(value["category"], "general_renovation");
    }

    #[test]
    fn test_analysis_json_nests_details() {
        let json = sample(RiskLevel::HighRisk, 8500.0).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["report"]["verdict"], "HIGH_RISK");
        assert_eq!(value["details"]["markup_percent"], 85);
        assert_eq!(value["details"]["registration_number"], "12345678900012");
    }
}
