use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::StatusCode, routing::get, Json, Router};
use engine::ingest::{build_handle_with, load_documents};
use engine::{Bm25Params, IndexCache, IndexHandle, Model, SearchResult, TokenStream, TokenizerKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub const MAX_K: usize = 100;
const SNIPPET_CHARS: usize = 500;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
    #[serde(default)]
    pub model: Option<String>,
}
fn default_k() -> usize { 3 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub model: Model,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct CompareResponse {
    pub query: String,
    pub tfidf: Vec<SearchHit>,
    pub bm25: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: String,
    pub score: f64,
    pub title: Option<String>,
    pub snippet: String,
}

/// Built once at startup and shared read-only by every request.
#[derive(Clone)]
pub struct AppState {
    pub handle: Arc<IndexHandle>,
    pub tokenizer: Arc<dyn TokenStream>,
    pub titles: Arc<HashMap<String, String>>,
}

type ApiError = (StatusCode, String);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub corpus: String,
    pub tokenizer: TokenizerKind,
    pub bm25: Bm25Params,
}

impl AppConfig {
    fn cache_key(&self) -> String {
        format!("{}|{:?}|{}|{}", self.corpus, self.tokenizer, self.bm25.k1, self.bm25.b)
    }
}

/// Load the corpus and fetch its indices from `cache`, building them only
/// if no handle exists yet for this corpus and configuration.
pub fn load_state(cache: &IndexCache, config: &AppConfig) -> Result<AppState> {
    let docs = load_documents(&config.corpus)?;
    let titles: HashMap<String, String> = docs
        .iter()
        .filter_map(|d| d.title.clone().map(|t| (d.id.clone(), t)))
        .collect();
    let tokenizer: Arc<dyn TokenStream> = Arc::from(config.tokenizer.provider());
    let handle = cache.get_or_build(&config.cache_key(), || {
        build_handle_with(docs, tokenizer.as_ref(), config.bm25)
    })?;
    tracing::info!(
        num_docs = handle.corpus().len(),
        num_terms = handle.corpus().vocabulary().len(),
        "indices ready"
    );
    Ok(AppState { handle, tokenizer, titles: Arc::new(titles) })
}

pub fn build_app(cache: &IndexCache, config: &AppConfig) -> Result<Router> {
    let app_state = load_state(cache, config)?;

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/compare", get(compare_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

fn api_error(err: engine::Error) -> ApiError {
    let status = match err {
        engine::Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
        engine::Error::NotBuilt { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    tracing::warn!(%status, error = %err, "rejected request");
    (status, err.to_string())
}

fn run_query(state: &AppState, model: Model, q: &str, k: usize) -> Result<Vec<SearchHit>, ApiError> {
    let q_tokens = state.tokenizer.tokenize(q);
    let results = state.handle.search(model, &q_tokens, k.min(MAX_K)).map_err(api_error)?;
    // Capture raw query terms for highlighting
    let raw_terms: Vec<&str> = q.split_whitespace().collect();
    Ok(results.iter().map(|r| to_hit(state, r, &raw_terms)).collect())
}

fn to_hit(state: &AppState, result: &SearchResult, raw_terms: &[&str]) -> SearchHit {
    SearchHit {
        doc_id: result.doc_id.clone(),
        score: result.score,
        title: state.titles.get(&result.doc_id).cloned(),
        snippet: highlight_terms(&result.preview(SNIPPET_CHARS), raw_terms),
    }
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<SearchResponse>, ApiError> {
    let start = std::time::Instant::now();
    let model = match params.model.as_deref() {
        Some(m) => m.parse::<Model>().map_err(api_error)?,
        None => Model::TfIdf,
    };
    let results = run_query(&state, model, &params.q, params.k)?;
    let elapsed = start.elapsed();
    Ok(Json(SearchResponse { query: params.q, model, took_s: elapsed.as_secs_f64(), total_hits: results.len(), results }))
}

pub async fn compare_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Result<Json<CompareResponse>, ApiError> {
    let tfidf = run_query(&state, Model::TfIdf, &params.q, params.k)?;
    let bm25 = run_query(&state, Model::Bm25, &params.q, params.k)?;
    Ok(Json(CompareResponse { query: params.q, tfidf, bm25 }))
}

pub async fn doc_handler(State(state): State<AppState>, Path(doc_id): Path<String>) -> Result<Json<serde_json::Value>, ApiError> {
    match state.handle.corpus().find(&doc_id) {
        Some(doc) => Ok(Json(serde_json::json!({
            "doc_id": doc.doc_id,
            "title": state.titles.get(&doc.doc_id),
            "text": doc.raw_text,
        }))),
        None => Err((StatusCode::NOT_FOUND, format!("document '{doc_id}' not found"))),
    }
}

fn highlight_terms(snippet: &str, terms: &[&str]) -> String {
    let mut s = snippet.to_string();
    for t in terms {
        if t.trim().is_empty() { continue; }
        let Ok(pat) = regex::RegexBuilder::new(&regex::escape(t))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };
        s = pat.replace_all(&s, |caps: &regex::Captures| format!("<em>{}</em>", &caps[0])).to_string();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn state_reuses_cached_handle() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("c.txt");
        fs::write(&corpus, "space moon\n\nbaseball game\n").unwrap();
        let config = AppConfig {
            corpus: corpus.to_string_lossy().into_owned(),
            tokenizer: TokenizerKind::Whitespace,
            bm25: Bm25Params::default(),
        };
        let cache = IndexCache::new();
        let first = load_state(&cache, &config).unwrap();
        let second = load_state(&cache, &config).unwrap();
        assert!(Arc::ptr_eq(&first.handle, &second.handle));

        let tuned = AppConfig { bm25: Bm25Params { k1: 1.2, b: 0.5 }, ..config };
        let third = load_state(&cache, &tuned).unwrap();
        assert!(!Arc::ptr_eq(&first.handle, &third.handle));
        assert_eq!(third.handle.bm25().params().k1, 1.2);
    }

    #[test]
    fn highlights_case_insensitively() {
        assert_eq!(highlight_terms("Moon and moon", &["MOON"]), "<em>Moon</em> and <em>moon</em>");
        assert_eq!(highlight_terms("a+b", &["a+b", " "]), "<em>a+b</em>");
    }
}
