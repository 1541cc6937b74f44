use crate::models::{Route, RouteDecision, RouterThresholds};
use regex::Regex;
use std::sync::LazyLock;

/// Keyword families that hint a query wants fresh or external information.
/// Each category contributes up to [`CATEGORY_SHARE`] of the web score.
const WEB_KEYWORD_CATEGORIES: [(&str, &[&str]); 5] = [
    (
        "temporal",
        &[
            "latest", "recent", "current", "today", "now", "2024", "2025", "this year",
        ],
    ),
    (
        "explanatory",
        &["explain", "how does", "what is", "why does", "how to"],
    ),
    (
        "comparative",
        &[
            "vs",
            "versus",
            "compare",
            "comparison",
            "alternative",
            "better than",
        ],
    ),
    (
        "current_data",
        &["price", "cost", "stock", "market", "trend", "news", "update"],
    ),
    (
        "general_knowledge",
        &["define", "definition", "meaning", "who is", "what are"],
    ),
];

/// Phrases that explicitly point back at uploaded material.
const DOCUMENT_PHRASES: [&str; 8] = [
    "according to",
    "in the document",
    "from the file",
    "mentioned in",
    "states that",
    "document says",
    "written in",
    "specified in",
];

const CATEGORY_SHARE: f64 = 0.2;
const QUESTION_PATTERN_BONUS: f64 = 0.3;
const RECENCY_BONUS: f64 = 0.4;
const DOCUMENT_PHRASE_WEIGHT: f64 = 0.5;
const DOCUMENT_PATTERN_WEIGHT: f64 = 0.3;
const CONTENT_PATTERN_WEIGHT: f64 = 0.4;
const DEFAULT_DOCUMENT_CONFIDENCE: f64 = 0.5;

static QUESTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bhow\s+(?:to|do|does|can)\b",
        r"\bwhat\s+(?:is|are|does)\b",
        r"\bwhy\s+(?:is|are|does|do)\b",
        r"\bwhen\s+(?:is|are|was|were)\b",
        r"\bwhere\s+(?:is|are|can)\b",
    ])
});

static RECENCY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b(?:today|now|currently|this\s+(?:year|month|week))\b",
        r"\b202[4-9]\b",
        r"\b(?:latest|recent|new|updated)\b",
    ])
});

static DOCUMENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bin\s+(?:the|this|that)\s+(?:document|file|pdf|report)\b",
        r"\baccording\s+to\b",
        r"\bmentioned\s+(?:in|above|below)\b",
        r"\bsection\s+\d+\b",
        r"\bpage\s+\d+\b",
        r"\bchapter\s+\d+\b",
    ])
});

static CONTENT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\bwhat\s+does\s+(?:the|this)\s+document\s+say\b",
        r"\bfind\s+(?:in|from)\s+(?:the|this)\b",
        r"\bsummarize\s+(?:the|this)\b",
        r"\blist\s+(?:all|the)\b",
    ])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("routing pattern is valid"))
        .collect()
}

/// Scores a query against web and document heuristics and picks an
/// evidence source. Pure over its inputs: no hidden state, deterministic,
/// and total, so every string gets exactly one decision.
#[derive(Debug, Clone, Default)]
pub struct QueryRouter {
    thresholds: RouterThresholds,
}

impl QueryRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: RouterThresholds) -> Self {
        Self { thresholds }
    }

    pub fn route(&self, query: &str, has_documents: bool) -> RouteDecision {
        if !has_documents {
            return RouteDecision {
                route: Route::Web,
                confidence: 1.0,
                reason: "no documents available".to_string(),
            };
        }

        let query = query.to_lowercase();
        let web_score = web_score(&query);
        let document_score = document_score(&query);

        if web_score > self.thresholds.web {
            RouteDecision {
                route: Route::Web,
                confidence: web_score,
                reason: "query suggests need for current or external information".to_string(),
            }
        } else if document_score > self.thresholds.document {
            RouteDecision {
                route: Route::Document,
                confidence: document_score,
                reason: "query appears to reference document content".to_string(),
            }
        } else if web_score > self.thresholds.hybrid_floor
            && document_score > self.thresholds.hybrid_floor
        {
            RouteDecision {
                route: Route::Hybrid,
                confidence: (web_score + document_score) / 2.0,
                reason: "query could benefit from both sources".to_string(),
            }
        } else {
            RouteDecision {
                route: Route::Document,
                confidence: DEFAULT_DOCUMENT_CONFIDENCE,
                reason: "defaulting to uploaded documents".to_string(),
            }
        }
    }

    /// User-facing explanation of where evidence for this query would come
    /// from.
    pub fn explain(&self, query: &str, has_documents: bool) -> &'static str {
        match self.route(query, has_documents).route {
            Route::Web => {
                "The web will be searched because this query involves current \
                 information, comparisons, or general knowledge that may not be \
                 in the uploaded documents."
            }
            Route::Document => {
                "The uploaded documents will be searched because this query \
                 appears to ask about content they provide."
            }
            Route::Hybrid => {
                "Both the uploaded documents and the web will be searched to \
                 combine specific content with current information."
            }
        }
    }
}

fn web_score(query: &str) -> f64 {
    let mut score = 0.0;

    for (_category, keywords) in WEB_KEYWORD_CATEGORIES {
        let hits = keywords
            .iter()
            .filter(|keyword| query.contains(*keyword))
            .count();
        score += (hits as f64 / keywords.len() as f64).min(1.0) * CATEGORY_SHARE;
    }

    if QUESTION_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(query))
    {
        score += QUESTION_PATTERN_BONUS;
    }

    if RECENCY_PATTERNS
        .iter()
        .any(|pattern| pattern.is_match(query))
    {
        score += RECENCY_BONUS;
    }

    score.min(1.0)
}

fn document_score(query: &str) -> f64 {
    let mut score = 0.0;

    for phrase in DOCUMENT_PHRASES {
        if query.contains(phrase) {
            score += DOCUMENT_PHRASE_WEIGHT;
        }
    }

    for pattern in DOCUMENT_PATTERNS.iter() {
        if pattern.is_match(query) {
            score += DOCUMENT_PATTERN_WEIGHT;
        }
    }

    for pattern in CONTENT_PATTERNS.iter() {
        if pattern.is_match(query) {
            score += CONTENT_PATTERN_WEIGHT;
        }
    }

    score.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_corpus_always_routes_to_web() {
        let router = QueryRouter::new();

        for query in [
            "anything at all",
            "according to the document, what is section 3?",
            "",
        ] {
            let decision = router.route(query, false);
            assert_eq!(decision.route, Route::Web);
            assert_eq!(decision.confidence, 1.0);
        }
    }

    #[test]
    fn routing_is_deterministic() {
        let router = QueryRouter::new();
        let query = "compare the latest market trends for 2025";

        let first = router.route(query, true);
        let second = router.route(query, true);

        assert_eq!(first.route, second.route);
        assert_eq!(first.confidence, second.confidence);
        assert_eq!(first.reason, second.reason);
    }

    #[test]
    fn confidence_stays_in_unit_interval() {
        let router = QueryRouter::new();

        let queries = [
            "what is the latest price, cost, stock, market, trend, news, update today now currently",
            "according to the document mentioned in section 1 page 2 chapter 3 summarize the list all",
            "plain query with no signals",
            "日本語のクエリ",
        ];

        for query in queries {
            for has_documents in [true, false] {
                let decision = router.route(query, has_documents);
                assert!(decision.confidence >= 0.0 && decision.confidence <= 1.0);
            }
        }
    }

    #[test]
    fn recency_and_market_terms_route_to_web() {
        let router = QueryRouter::new();
        let decision = router.route("What is the latest stock price of Acme Corp?", true);

        assert_eq!(decision.route, Route::Web);
        assert!(decision.confidence > 0.7);
    }

    #[test]
    fn document_references_route_to_documents() {
        let router = QueryRouter::new();
        let decision = router.route(
            "According to the document, what is mentioned in section 3?",
            true,
        );

        assert_eq!(decision.route, Route::Document);
        assert!(decision.confidence > 0.6);
    }

    #[test]
    fn mixed_signals_fall_into_the_hybrid_band() {
        let router = QueryRouter::new();
        // Web side lands around 0.45 (recency cue plus scattered keyword
        // hits), the document side at 0.5 (one explicit phrase), so neither
        // hard branch fires and both clear the hybrid floor.
        let decision = router.route("the policy states that rates were updated recently", true);

        assert_eq!(decision.route, Route::Hybrid);
        assert!(decision.confidence > 0.4 && decision.confidence < 0.6);
    }

    #[test]
    fn unmatched_queries_default_to_documents() {
        let router = QueryRouter::new();
        let decision = router.route("hydraulic pump torque values", true);

        assert_eq!(decision.route, Route::Document);
        assert_eq!(decision.confidence, DEFAULT_DOCUMENT_CONFIDENCE);
    }

    #[test]
    fn thresholds_are_overridable() {
        let strict = QueryRouter::with_thresholds(RouterThresholds {
            web: 0.99,
            document: 0.99,
            hybrid_floor: 0.99,
        });

        // Neither score can clear 0.99 with a plain query, so the default
        // branch must win.
        let decision = strict.route("What is the latest stock price of Acme Corp?", true);
        assert_eq!(decision.route, Route::Document);
        assert_eq!(decision.confidence, DEFAULT_DOCUMENT_CONFIDENCE);
    }

    #[test]
    fn explain_matches_the_chosen_route() {
        let router = QueryRouter::new();

        assert!(router
            .explain("What is the latest stock price of Acme Corp?", true)
            .contains("web"));
        assert!(router
            .explain("summarize the findings in the document", true)
            .contains("documents"));
    }
}
