use clap::{Parser, Subcommand};
use quote_guard::config::{self, Config, Setting};
use quote_guard::{
    Analyzer, DocumentKind, ProjectCategory, QuoteDocument, Region, RegexExtractor,
    RegistryClient, SessionContext, document, report,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{Instrument, info, info_span, warn};
use tracing_subscriber::EnvFilter;

/// Check a renovation quote against fair market prices.
#[derive(Parser)]
#[command(name = "quote-guard", version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyse one or more quotes in a single session
    Analyze {
        /// Quote files (PDF, JPEG/PNG or plain text)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Project category (plumbing, electricity, painting, general_renovation, other)
        #[arg(long)]
        category: Option<String>,

        /// Region (paris, ile_de_france, lyon, marseille, bordeaux, lille, province)
        #[arg(long)]
        region: Option<String>,

        /// Override the detected MIME type, e.g. application/pdf
        #[arg(long)]
        mime: Option<String>,

        /// OCR output for images and scanned PDFs, one per quote in order
        /// (repeat the flag). Defaults to `<quote>.ocr.txt` when present.
        #[arg(long)]
        ocr_text: Vec<PathBuf>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,

        /// Skip the company registry lookup
        #[arg(long)]
        demo: bool,
    },
    /// Write default settings to the config file
    Configure {
        #[arg(long)]
        default_category: Option<String>,

        #[arg(long)]
        default_region: Option<String>,

        #[arg(long)]
        fallback_price: Option<f64>,

        #[arg(long)]
        risk_threshold: Option<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .init();

    match cli.command {
        Command::Analyze {
            files,
            category,
            region,
            mime,
            ocr_text,
            json,
            demo,
        } => {
            let cfg = Config::load_or_default(&cli.config)?;
            let category = category
                .as_deref()
                .map_or_else(|| cfg.category(), ProjectCategory::parse_lenient);
            let region = region
                .as_deref()
                .map_or_else(|| cfg.region(), Region::parse_lenient);
            let ocr_sources = document::pair_ocr_sources(&files, &ocr_text)?;

            let analyzer = Analyzer::new(
                RegexExtractor::new(cfg.total_strategy, cfg.fallback_price),
                RegistryClient::new(cfg.registry.base_url.clone(), cfg.registry_timeout())?,
                cfg.price_catalog()?,
                cfg.verdict_policy(),
            );
            let mut session = SessionContext::new(demo);

            for (path, ocr_path) in files.iter().zip(ocr_sources) {
                let span = info_span!("analyze", file = %path.display());
                let doc = span.in_scope(|| {
                    load_document(path, mime.as_deref(), ocr_path.as_deref())
                })?;
                let analysis = analyzer
                    .analyze(&doc, category, region, &mut session)
                    .instrument(span)
                    .await;

                if json {
                    println!("{}", analysis.to_json()?);
                } else {
                    println!("\n--- {} ---", path.display());
                    print!("{analysis}");
                }
            }

            if !json && session.len() > 1 {
                println!("\n--- Recent scans ---");
                for scan in session.history() {
                    println!(
                        "{}  {:<20} {:<14} €{:>8} vs €{:>8}  {}",
                        scan.scan_id,
                        scan.category.to_string(),
                        scan.region.to_string(),
                        report::group_thousands(scan.quoted_price),
                        report::group_thousands(scan.fair_price),
                        scan.risk_level
                    );
                }
            }
        }
        Command::Configure {
            default_category,
            default_region,
            fallback_price,
            risk_threshold,
        } => {
            let mut settings = Vec::new();
            if let Some(c) = default_category {
                settings.push(Setting::DefaultCategory(c.parse()?));
            }
            if let Some(r) = default_region {
                settings.push(Setting::DefaultRegion(r.parse()?));
            }
            if let Some(p) = fallback_price {
                if !(p.is_finite() && p > 0.0) {
                    return Err(format!("fallback price must be a positive amount, got {p}").into());
                }
                settings.push(Setting::FallbackPrice(p));
            }
            if let Some(t) = risk_threshold {
                settings.push(Setting::RiskThreshold(t));
            }

            if settings.is_empty() {
                println!("Nothing to change.");
                return Ok(());
            }
            config::update_settings(&cli.config, &settings)?;
            println!("Updated {}", cli.config.display());
        }
    }

    Ok(())
}

/// Read a quote from disk and turn it into text.
fn load_document(
    path: &Path,
    mime: Option<&str>,
    ocr_path: Option<&Path>,
) -> Result<QuoteDocument, Box<dyn std::error::Error>> {
    let bytes = fs::read(path)?;
    let ocr_text = ocr_path.map(fs::read_to_string).transpose()?;
    let kind = match mime {
        Some(m) => DocumentKind::from_mime(m).unwrap_or_else(|| {
            warn!(mime = %m, "Unsupported MIME type, sniffing file instead");
            DocumentKind::detect(path, &bytes)
        }),
        None => DocumentKind::detect(path, &bytes),
    };

    let doc = QuoteDocument::from_bytes(&bytes, kind, ocr_text);
    info!(kind = ?doc.kind(), bytes = bytes.len(), chars = doc.text().len(), "Loaded quote");
    Ok(doc)
}
