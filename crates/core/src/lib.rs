pub mod chunking;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod orchestrator;
pub mod router;
pub mod stores;
pub mod traits;

pub use chunking::{Chunker, DEFAULT_SECTION_TITLE};
pub use embeddings::{Embedder, HashedNgramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IngestError, RetrieveError, SearchError};
pub use extractor::{extract_page_texts, LopdfExtractor, PageText, PageTextSource};
pub use ingest::{
    discover_pdf_files, ingest_folder_units, ingest_single_pdf, DocumentSummary, IngestionReport,
    SkippedPdf,
};
pub use models::{
    ChunkingOptions, DocumentFingerprint, EvidenceItem, EvidenceUnit, MergedEvidence,
    RetrievalOptions, Route, RouteDecision, RouterThresholds, WebResult, WebSourceKind,
};
pub use orchestrator::{RetrievalOrchestrator, NO_EVIDENCE_NOTICE, WEB_DISABLED_NOTICE};
pub use router::QueryRouter;
pub use stores::{QdrantIndex, SerperClient};
pub use traits::{DocumentIndex, ScoredUnit, WebSearchProvider};
