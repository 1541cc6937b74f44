use crate::error::SearchError;
use crate::models::{WebResult, WebSourceKind};
use crate::traits::WebSearchProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://google.serper.dev";
pub const DEFAULT_RESULT_COUNT: usize = 5;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Web search via the Serper.dev API. Construct with [`SerperClient::from_env`]
/// so a missing API key becomes a typed `None` capability instead of a
/// call-time failure.
pub struct SerperClient {
    client: Client,
    api_key: String,
    base: Url,
}

impl SerperClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: &str) -> Result<Self, SearchError> {
        let base = Url::parse(endpoint)?;
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base,
        })
    }

    /// Reads `SERPER_API_KEY`; unset or blank means the capability is
    /// absent, which callers must handle before searching.
    pub fn from_env() -> Result<Option<Self>, SearchError> {
        match std::env::var("SERPER_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(Some(Self::new(key.trim().to_string())?)),
            _ => Ok(None),
        }
    }

    async fn post(&self, path: &str, payload: Value) -> Result<Value, SearchError> {
        let url = self.base.join(path)?;
        let response = self
            .client
            .post(url)
            .header("X-API-KEY", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: "serper".to_string(),
                details: response.status().to_string(),
            });
        }

        Ok(response.json().await?)
    }

    pub async fn search_news(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<WebResult>, SearchError> {
        let data = self
            .post(
                "/news",
                json!({
                    "q": query,
                    "num": num_results,
                    "type": "news",
                    "gl": "us",
                    "hl": "en",
                }),
            )
            .await?;

        Ok(parse_news_payload(&data, num_results))
    }

    pub async fn search_images(
        &self,
        query: &str,
        num_results: usize,
    ) -> Result<Vec<WebResult>, SearchError> {
        let data = self
            .post(
                "/images",
                json!({
                    "q": query,
                    "num": num_results,
                    "type": "images",
                    "gl": "us",
                }),
            )
            .await?;

        Ok(parse_images_payload(&data, num_results))
    }
}

#[async_trait]
impl WebSearchProvider for SerperClient {
    async fn search(&self, query: &str) -> Result<Vec<WebResult>, SearchError> {
        let data = self
            .post(
                "/search",
                json!({
                    "q": query,
                    "num": DEFAULT_RESULT_COUNT,
                    "gl": "us",
                    "hl": "en",
                }),
            )
            .await?;

        Ok(parse_search_payload(&data, DEFAULT_RESULT_COUNT))
    }
}

fn text_at<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

/// Organic hits in provider order, with the answer box and then the
/// knowledge graph promoted to the front when present.
fn parse_search_payload(data: &Value, limit: usize) -> Vec<WebResult> {
    let mut results = Vec::new();

    if let Some(organic) = data.pointer("/organic").and_then(Value::as_array) {
        for hit in organic.iter().take(limit) {
            results.push(WebResult {
                title: text_at(hit, "/title").to_string(),
                url: text_at(hit, "/link").to_string(),
                snippet: text_at(hit, "/snippet").to_string(),
                kind: WebSourceKind::Web,
            });
        }
    }

    if let Some(answer_box) = data.pointer("/answerBox") {
        let title = match text_at(answer_box, "/title") {
            "" => "Answer Box",
            title => title,
        };
        let snippet = match text_at(answer_box, "/answer") {
            "" => text_at(answer_box, "/snippet"),
            answer => answer,
        };

        results.insert(
            0,
            WebResult {
                title: title.to_string(),
                url: text_at(answer_box, "/link").to_string(),
                snippet: snippet.to_string(),
                kind: WebSourceKind::AnswerBox,
            },
        );
    }

    if let Some(knowledge_graph) = data.pointer("/knowledgeGraph") {
        let title = match text_at(knowledge_graph, "/title") {
            "" => "Knowledge Graph",
            title => title,
        };

        results.insert(
            0,
            WebResult {
                title: title.to_string(),
                url: text_at(knowledge_graph, "/website").to_string(),
                snippet: text_at(knowledge_graph, "/description").to_string(),
                kind: WebSourceKind::KnowledgeGraph,
            },
        );
    }

    results
}

fn parse_news_payload(data: &Value, limit: usize) -> Vec<WebResult> {
    let mut results = Vec::new();

    if let Some(news) = data.pointer("/news").and_then(Value::as_array) {
        for hit in news.iter().take(limit) {
            let snippet = match text_at(hit, "/date") {
                "" => text_at(hit, "/snippet").to_string(),
                date => format!("{date}: {}", text_at(hit, "/snippet")),
            };

            results.push(WebResult {
                title: text_at(hit, "/title").to_string(),
                url: text_at(hit, "/link").to_string(),
                snippet,
                kind: WebSourceKind::News,
            });
        }
    }

    results
}

fn parse_images_payload(data: &Value, limit: usize) -> Vec<WebResult> {
    let mut results = Vec::new();

    if let Some(images) = data.pointer("/images").and_then(Value::as_array) {
        for hit in images.iter().take(limit) {
            results.push(WebResult {
                title: text_at(hit, "/title").to_string(),
                url: text_at(hit, "/link").to_string(),
                // The snippet carries the direct image URL.
                snippet: text_at(hit, "/imageUrl").to_string(),
                kind: WebSourceKind::Image,
            });
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organic_results_parse_in_provider_order() {
        let data = json!({
            "organic": [
                {"title": "First", "link": "https://a.example", "snippet": "one"},
                {"title": "Second", "link": "https://b.example", "snippet": "two"},
            ]
        });

        let results = parse_search_payload(&data, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "First");
        assert_eq!(results[1].title, "Second");
        assert!(results.iter().all(|r| r.kind == WebSourceKind::Web));
    }

    #[test]
    fn answer_box_and_knowledge_graph_lead_the_results() {
        let data = json!({
            "organic": [
                {"title": "Organic", "link": "https://a.example", "snippet": "body"},
            ],
            "answerBox": {"title": "Direct", "link": "https://b.example", "answer": "42"},
            "knowledgeGraph": {
                "title": "Acme Corp",
                "website": "https://acme.example",
                "description": "Maker of everything.",
            },
        });

        let results = parse_search_payload(&data, 5);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].kind, WebSourceKind::KnowledgeGraph);
        assert_eq!(results[1].kind, WebSourceKind::AnswerBox);
        assert_eq!(results[1].snippet, "42");
        assert_eq!(results[2].kind, WebSourceKind::Web);
    }

    #[test]
    fn answer_box_falls_back_to_snippet_and_default_title() {
        let data = json!({
            "answerBox": {"snippet": "from snippet"}
        });

        let results = parse_search_payload(&data, 5);
        assert_eq!(results[0].title, "Answer Box");
        assert_eq!(results[0].snippet, "from snippet");
    }

    #[test]
    fn organic_results_respect_the_limit() {
        let organic: Vec<Value> = (0..10)
            .map(|i| json!({"title": format!("r{i}"), "link": "https://x", "snippet": ""}))
            .collect();
        let data = json!({ "organic": organic });

        assert_eq!(parse_search_payload(&data, 3).len(), 3);
    }

    #[test]
    fn news_snippets_carry_the_publication_date() {
        let data = json!({
            "news": [
                {"title": "Launch", "link": "https://n.example", "snippet": "it shipped", "date": "2 days ago"},
            ]
        });

        let results = parse_news_payload(&data, 3);
        assert_eq!(results[0].kind, WebSourceKind::News);
        assert_eq!(results[0].snippet, "2 days ago: it shipped");
    }

    #[test]
    fn image_results_keep_the_direct_image_url() {
        let data = json!({
            "images": [
                {"title": "Diagram", "link": "https://page.example", "imageUrl": "https://img.example/d.png"},
            ]
        });

        let results = parse_images_payload(&data, 3);
        assert_eq!(results[0].kind, WebSourceKind::Image);
        assert_eq!(results[0].snippet, "https://img.example/d.png");
    }
}
