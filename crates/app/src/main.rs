use chrono::Utc;
use clap::{Parser, Subcommand};
use doc_evidence_core::{
    ingest_folder_units, Chunker, DocumentIndex, EvidenceItem, QdrantIndex, QueryRouter,
    RetrievalOrchestrator, SerperClient,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "doc-evidence", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Qdrant base URL
    #[arg(long, default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant collection holding the evidence units
    #[arg(long, default_value = "evidence_units")]
    qdrant_collection: String,
}

#[derive(Subcommand)]
enum Command {
    /// Chunk every PDF in a folder and index the evidence units.
    Ingest {
        /// Folder that contains PDFs recursively.
        #[arg(long)]
        folder: String,
    },
    /// Route a question and retrieve evidence from the chosen sources.
    Ask {
        /// The question to answer.
        #[arg(long)]
        query: String,
        /// Also print the routing explanation.
        #[arg(long, default_value_t = false)]
        explain: bool,
    },
    /// Show where a question would be routed, without retrieving.
    Route {
        /// The question to route.
        #[arg(long)]
        query: String,
    },
    /// Remove every indexed evidence unit.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let index = QdrantIndex::new(&cli.qdrant_url, &cli.qdrant_collection);

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "doc-evidence boot"
    );

    match cli.command {
        Command::Ingest { folder } => {
            let chunker =
                Chunker::with_defaults().map_err(|error| anyhow::anyhow!(error.to_string()))?;
            let report = ingest_folder_units(Path::new(&folder), &chunker)
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            if !report.skipped_files.is_empty() {
                warn!(
                    "skipped_files={} for folder={}",
                    report.skipped_files.len(),
                    folder
                );
                for skipped in &report.skipped_files {
                    warn!(path = %skipped.path.display(), reason = %skipped.reason, "skipped pdf");
                }
            }

            info!(folder = %folder, unit_count = %report.units.len(), "indexing evidence units");

            index
                .add(&report.units)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            for summary in &report.documents {
                println!(
                    "{}: {} units",
                    summary.fingerprint.filename, summary.unit_count
                );
            }
            println!(
                "{} units ingested at {}",
                report.units.len(),
                Utc::now().to_rfc3339()
            );
        }
        Command::Ask { query, explain } => {
            let router = QueryRouter::new();
            let web = SerperClient::from_env()
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            if web.is_none() {
                warn!("SERPER_API_KEY not set; web search disabled");
            }

            let has_documents = index
                .count()
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?
                > 0;
            let decision = router.route(&query, has_documents);
            info!(route = %decision.route, confidence = decision.confidence, "routed query");

            let orchestrator = RetrievalOrchestrator::new(index, web);
            let merged = orchestrator
                .retrieve(&query, &decision)
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;

            println!("query: {query}");
            println!(
                "route: {} (confidence {:.2}) {}",
                decision.route, decision.confidence, decision.reason
            );
            if explain {
                println!("{}", router.explain(&query, has_documents));
            }
            if !merged.web_available {
                println!("note: web search is unavailable; evidence is limited to documents");
            }
            if let Some(notice) = &merged.notice {
                println!("notice: {notice}");
            }

            for item in &merged.items {
                match item {
                    EvidenceItem::Document { unit, distance } => {
                        println!(
                            "[document] {} section={} pages={}-{} distance={:.4}",
                            unit.source_filename,
                            unit.section_title,
                            unit.page_start,
                            unit.page_end,
                            distance
                        );
                        println!("  {}", unit.content);
                    }
                    EvidenceItem::Web { result } => {
                        println!("[{}] {}", result.kind, result.title);
                        if !result.url.is_empty() {
                            println!("  {}", result.url);
                        }
                        if !result.snippet.is_empty() {
                            println!("  {}", result.snippet);
                        }
                    }
                }
            }
        }
        Command::Route { query } => {
            let router = QueryRouter::new();
            let has_documents = index
                .count()
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?
                > 0;
            let decision = router.route(&query, has_documents);

            println!("route: {}", decision.route);
            println!("confidence: {:.2}", decision.confidence);
            println!("reason: {}", decision.reason);
            println!("{}", router.explain(&query, has_documents));
        }
        Command::Clear => {
            index
                .clear()
                .await
                .map_err(|error| anyhow::anyhow!(error.to_string()))?;
            println!("corpus cleared");
        }
    }

    Ok(())
}
