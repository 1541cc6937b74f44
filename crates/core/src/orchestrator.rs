use crate::error::RetrieveError;
use crate::models::{EvidenceItem, MergedEvidence, RetrievalOptions, Route, RouteDecision, WebResult};
use crate::traits::{DocumentIndex, ScoredUnit, WebSearchProvider};

/// Returned instead of an empty list when the chosen source found nothing
/// and no web fallback is configured.
pub const WEB_DISABLED_NOTICE: &str =
    "no matching passages were found and web search is not configured";

/// Returned when every consulted source came back empty.
pub const NO_EVIDENCE_NOTICE: &str = "no evidence was found for this query";

/// Executes a routing decision against the corpus index and the optional
/// web capability, applies the fallback rules, and merges the results into
/// one source-tagged evidence list.
///
/// Zero results are a valid outcome; only collaborator failures become
/// errors, each wrapped with the stage it came from.
pub struct RetrievalOrchestrator<D, W> {
    documents: D,
    web: Option<W>,
    options: RetrievalOptions,
}

impl<D, W> RetrievalOrchestrator<D, W>
where
    D: DocumentIndex + Send + Sync,
    W: WebSearchProvider + Send + Sync,
{
    pub fn new(documents: D, web: Option<W>) -> Self {
        Self::with_options(documents, web, RetrievalOptions::default())
    }

    pub fn with_options(documents: D, web: Option<W>, options: RetrievalOptions) -> Self {
        Self {
            documents,
            web,
            options,
        }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        decision: &RouteDecision,
    ) -> Result<MergedEvidence, RetrieveError> {
        match decision.route {
            Route::Document => self.retrieve_documents(query).await,
            Route::Web => self.retrieve_web(query).await,
            Route::Hybrid => self.retrieve_hybrid(query).await,
        }
    }

    async fn retrieve_documents(&self, query: &str) -> Result<MergedEvidence, RetrieveError> {
        let hits = self
            .documents
            .search(query, self.options.document_top_k)
            .await
            .map_err(RetrieveError::DocumentSearch)?;

        if !hits.is_empty() {
            return Ok(MergedEvidence {
                items: hits.into_iter().map(document_item).collect(),
                web_available: self.web.is_some(),
                notice: None,
            });
        }

        // The corpus had nothing relevant; fall back to the web when it
        // exists, otherwise report the gap explicitly.
        match &self.web {
            Some(web) => {
                let results = web
                    .search(query)
                    .await
                    .map_err(RetrieveError::WebSearch)?;
                let notice = results
                    .is_empty()
                    .then(|| NO_EVIDENCE_NOTICE.to_string());

                Ok(MergedEvidence {
                    items: results.into_iter().map(web_item).collect(),
                    web_available: true,
                    notice,
                })
            }
            None => Ok(MergedEvidence {
                items: Vec::new(),
                web_available: false,
                notice: Some(WEB_DISABLED_NOTICE.to_string()),
            }),
        }
    }

    async fn retrieve_web(&self, query: &str) -> Result<MergedEvidence, RetrieveError> {
        match &self.web {
            Some(web) => {
                let results = web
                    .search(query)
                    .await
                    .map_err(RetrieveError::WebSearch)?;
                let notice = results
                    .is_empty()
                    .then(|| NO_EVIDENCE_NOTICE.to_string());

                Ok(MergedEvidence {
                    items: results.into_iter().map(web_item).collect(),
                    web_available: true,
                    notice,
                })
            }
            None => Ok(MergedEvidence {
                items: Vec::new(),
                web_available: false,
                notice: Some(WEB_DISABLED_NOTICE.to_string()),
            }),
        }
    }

    async fn retrieve_hybrid(&self, query: &str) -> Result<MergedEvidence, RetrieveError> {
        let document_search = self
            .documents
            .search(query, self.options.hybrid_document_top_k);

        let (document_hits, web_results) = match &self.web {
            Some(web) => {
                // The two sources have no data dependency; issue both at
                // once. Merge order below is fixed regardless of which
                // finishes first.
                let (documents, web_results) = tokio::join!(document_search, web.search(query));
                (
                    documents.map_err(RetrieveError::DocumentSearch)?,
                    web_results.map_err(RetrieveError::WebSearch)?,
                )
            }
            // Hybrid never fails just because web is disabled; it degrades
            // to document-only evidence.
            None => (
                document_search
                    .await
                    .map_err(RetrieveError::DocumentSearch)?,
                Vec::new(),
            ),
        };

        let mut items: Vec<EvidenceItem> = document_hits.into_iter().map(document_item).collect();
        items.extend(web_results.into_iter().map(web_item));

        let notice = items.is_empty().then(|| NO_EVIDENCE_NOTICE.to_string());

        Ok(MergedEvidence {
            items,
            web_available: self.web.is_some(),
            notice,
        })
    }
}

fn document_item(hit: ScoredUnit) -> EvidenceItem {
    EvidenceItem::Document {
        unit: hit.unit,
        distance: hit.distance,
    }
}

fn web_item(result: WebResult) -> EvidenceItem {
    EvidenceItem::Web { result }
}
