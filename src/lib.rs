//! Renovation quote checking: pull the total, SIRET and work items out of a
//! quote, price the work for a region, and flag suspicious markups.

pub mod analysis;
pub mod catalog;
pub mod config;
pub mod document;
pub mod estimator;
pub mod heuristics;
pub mod registry;
pub mod report;
pub mod session;
pub mod verdict;

pub use analysis::Analyzer;
pub use catalog::{ItemTag, PriceCatalog, ProjectCategory, Region};
pub use document::{DocumentKind, QuoteDocument};
pub use estimator::{FairEstimate, estimate};
pub use heuristics::{ExtractedFields, Extractor, RegexExtractor};
pub use registry::{CompanyInfo, CompanyRegistry, RegistryClient};
pub use report::{QuoteAnalysis, Report, ReportDetails};
pub use session::SessionContext;
pub use verdict::{RiskLevel, Verdict, VerdictPolicy, classify};
