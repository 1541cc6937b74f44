use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFingerprint {
    pub document_id: String,
    pub filename: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

/// One retrievable chunk with provenance. Created once by the chunker and
/// never mutated afterwards; ownership moves to the index on ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvidenceUnit {
    pub chunk_id: String,
    pub content: String,
    pub section_title: String,
    pub source_filename: String,
    pub page_start: u32,
    pub page_end: u32,
    pub sequence_index: u64,
    pub byte_length: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Document,
    Web,
    Hybrid,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Document => write!(f, "document"),
            Route::Web => write!(f, "web"),
            Route::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Outcome of routing a single query. Ephemeral; the reason string is
/// diagnostic output, nothing parses it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub route: Route,
    pub confidence: f64,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebSourceKind {
    Web,
    AnswerBox,
    KnowledgeGraph,
    News,
    Image,
}

impl fmt::Display for WebSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebSourceKind::Web => write!(f, "web"),
            WebSourceKind::AnswerBox => write!(f, "answer_box"),
            WebSourceKind::KnowledgeGraph => write!(f, "knowledge_graph"),
            WebSourceKind::News => write!(f, "news"),
            WebSourceKind::Image => write!(f, "image"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub kind: WebSourceKind,
}

/// A single piece of merged evidence; the variant is the source tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum EvidenceItem {
    Document { unit: EvidenceUnit, distance: f64 },
    Web { result: WebResult },
}

/// Ordered evidence from every consulted source, document items first when
/// both are present. `notice` distinguishes a structured "nothing found"
/// outcome from a collaborator error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedEvidence {
    pub items: Vec<EvidenceItem>,
    pub web_available: bool,
    pub notice: Option<String>,
}

impl MergedEvidence {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn document_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, EvidenceItem::Document { .. }))
            .count()
    }

    pub fn web_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, EvidenceItem::Web { .. }))
            .count()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChunkingOptions {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks of one section.
    pub chunk_overlap: usize,
    /// A header only starts a new section once the current one holds more
    /// than this much content.
    pub min_section_chars: usize,
    /// How far back from the window edge to look for a sentence break.
    pub sentence_window: usize,
    /// Probe length used when attributing a chunk to pages.
    pub attribution_probe: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1_000,
            chunk_overlap: 200,
            min_section_chars: 50,
            sentence_window: 200,
            attribution_probe: 100,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetrievalOptions {
    /// Fan-out for a pure document route.
    pub document_top_k: usize,
    /// Fan-out for the document half of a hybrid route.
    pub hybrid_document_top_k: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            document_top_k: 3,
            hybrid_document_top_k: 2,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RouterThresholds {
    pub web: f64,
    pub document: f64,
    pub hybrid_floor: f64,
}

impl Default for RouterThresholds {
    fn default() -> Self {
        // Asymmetric on purpose: ambiguous queries lean toward the
        // user's own corpus.
        Self {
            web: 0.7,
            document: 0.6,
            hybrid_floor: 0.4,
        }
    }
}
