use crate::embeddings::{Embedder, HashedNgramEmbedder};
use crate::error::SearchError;
use crate::models::EvidenceUnit;
use crate::traits::{DocumentIndex, ScoredUnit};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

/// Vector index backed by the Qdrant HTTP API. Owns the embedder used for
/// both stored units and queries; cosine similarity, so the reported
/// distance is `1 - score`.
pub struct QdrantIndex {
    client: Client,
    endpoint: String,
    collection: String,
    embedder: HashedNgramEmbedder,
}

impl QdrantIndex {
    pub fn new(endpoint: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::with_embedder(endpoint, collection, HashedNgramEmbedder::default())
    }

    pub fn with_embedder(
        endpoint: impl Into<String>,
        collection: impl Into<String>,
        embedder: HashedNgramEmbedder,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            collection: collection.into(),
            embedder,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/collections/{}", self.endpoint, self.collection)
    }

    pub async fn ensure_collection(&self) -> Result<(), SearchError> {
        let response = self.client.get(self.collection_url()).send().await?;

        if response.status() == StatusCode::OK {
            return Ok(());
        }

        if !response.status().is_client_error() {
            return Err(SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        let response = self
            .client
            .put(self.collection_url())
            .json(&json!({
                "vectors": {
                    "size": self.embedder.dimensions(),
                    "distance": "Cosine",
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Request(format!(
                "qdrant collection setup failed with {}",
                response.status()
            )));
        }

        Ok(())
    }

    /// Number of stored units; a missing collection counts as zero.
    pub async fn count(&self) -> Result<u64, SearchError> {
        let response = self
            .client
            .post(format!("{}/points/count", self.collection_url()))
            .json(&json!({ "exact": true }))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        Ok(parsed
            .pointer("/result/count")
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

#[async_trait]
impl DocumentIndex for QdrantIndex {
    async fn add(&self, units: &[EvidenceUnit]) -> Result<(), SearchError> {
        if units.is_empty() {
            return Ok(());
        }

        self.ensure_collection().await?;

        let points = units
            .iter()
            .map(|unit| {
                let payload = serde_json::to_value(unit)?;
                Ok(json!({
                    "id": Uuid::new_v4().to_string(),
                    "vector": self.embedder.embed(&unit.content),
                    "payload": payload,
                }))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        let response = self
            .client
            .put(format!("{}/points?wait=true", self.collection_url()))
            .json(&json!({ "points": points }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredUnit>, SearchError> {
        let vector = self.embedder.embed(query);

        let response = self
            .client
            .post(format!("{}/points/search", self.collection_url()))
            .json(&json!({
                "vector": vector,
                "limit": k,
                "with_payload": true,
            }))
            .send()
            .await?;

        // An index nobody has ingested into yet is empty, not broken.
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        let parsed: Value = response.json().await?;
        parse_search_hits(&parsed)
    }

    async fn clear(&self) -> Result<(), SearchError> {
        let response = self.client.delete(self.collection_url()).send().await?;

        if !response.status().is_success() && response.status() != StatusCode::NOT_FOUND {
            return Err(SearchError::BackendResponse {
                backend: "qdrant".to_string(),
                details: response.status().to_string(),
            });
        }

        self.ensure_collection().await
    }
}

fn parse_search_hits(parsed: &Value) -> Result<Vec<ScoredUnit>, SearchError> {
    let hits = parsed
        .pointer("/result")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut result = Vec::new();
    for hit in hits {
        let payload = hit.pointer("/payload").cloned().unwrap_or(Value::Null);
        let unit: EvidenceUnit = serde_json::from_value(payload)?;
        let score = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);

        result.push(ScoredUnit {
            unit,
            distance: 1.0 - score,
        });
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_hits_round_trip_the_unit_payload() {
        let unit = EvidenceUnit {
            chunk_id: "abc".to_string(),
            content: "Check the relief valve.".to_string(),
            section_title: "Maintenance".to_string(),
            source_filename: "manual.pdf".to_string(),
            page_start: 3,
            page_end: 4,
            sequence_index: 9,
            byte_length: 23,
        };

        let parsed = json!({
            "result": [
                {
                    "id": "0196b2f5-0000-7000-8000-000000000000",
                    "score": 0.82,
                    "payload": serde_json::to_value(&unit).expect("unit serializes"),
                }
            ]
        });

        let hits = parse_search_hits(&parsed).expect("payload parses");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].unit, unit);
        assert!((hits[0].distance - 0.18).abs() < 1e-9);
    }

    #[test]
    fn missing_result_key_parses_as_empty() {
        let hits = parse_search_hits(&json!({"status": "ok"})).expect("parses");
        assert!(hits.is_empty());
    }

    #[test]
    fn malformed_payload_is_a_serialization_error() {
        let parsed = json!({
            "result": [ { "id": 1, "score": 0.5, "payload": {"nope": true} } ]
        });

        let error = parse_search_hits(&parsed).expect_err("payload is not a unit");
        assert!(matches!(error, SearchError::Serialization(_)));
    }
}
