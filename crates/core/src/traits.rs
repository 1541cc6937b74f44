use crate::error::SearchError;
use crate::models::{EvidenceUnit, WebResult};
use async_trait::async_trait;

/// One index hit: the stored unit plus the relevance distance the backend
/// reported for it (smaller is closer).
#[derive(Debug, Clone)]
pub struct ScoredUnit {
    pub unit: EvidenceUnit,
    pub distance: f64,
}

/// The corpus index the orchestrator searches. Implementations own their
/// storage and ranking; an empty index returns an empty hit list.
#[async_trait]
pub trait DocumentIndex {
    async fn add(&self, units: &[EvidenceUnit]) -> Result<(), SearchError>;

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredUnit>, SearchError>;

    async fn clear(&self) -> Result<(), SearchError>;
}

/// Optional web-search capability. Absence is modelled with `Option` at the
/// call site, never by a failing implementation.
#[async_trait]
pub trait WebSearchProvider {
    async fn search(&self, query: &str) -> Result<Vec<WebResult>, SearchError>;
}
