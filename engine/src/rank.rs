//! Top-K selection shared by both indices, so their results are comparable
//! side by side.

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::SearchResult;

/// Rank raw per-document scores: drop non-positive scores, order by score
/// descending with ties broken by ascending corpus position, keep `top_k`.
///
/// Returns `(position, score)` pairs.
pub fn select_top_k(scores: &[f64], top_k: usize) -> Vec<(usize, f64)> {
    let mut scored: Vec<(usize, f64)> = scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, score)| score.is_finite() && *score > 0.0)
        .collect();
    // Deterministic: score desc, then position asc.
    scored.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.truncate(top_k);
    scored
}

/// A ranking model that scores every document of its corpus for a query.
pub trait RankingModel {
    fn name(&self) -> &'static str;

    fn is_built(&self) -> bool;

    /// One raw score per corpus position.
    fn score_all(&self, query_tokens: &[String]) -> Result<Vec<f64>>;

    /// The corpus this model was built over.
    fn corpus(&self) -> Result<&Corpus>;

    fn search(&self, query_tokens: &[String], top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k < 1 {
            return Err(Error::invalid("top_k must be at least 1"));
        }
        let corpus = self.corpus()?;
        let scores = self.score_all(query_tokens)?;
        let results = select_top_k(&scores, top_k)
            .into_iter()
            .filter_map(|(pos, score)| {
                corpus.get(pos).map(|doc| SearchResult {
                    doc_id: doc.doc_id.clone(),
                    score,
                    raw_text: doc.raw_text.clone(),
                })
            })
            .collect::<Vec<_>>();
        tracing::debug!(model = self.name(), top_k, hits = results.len(), "search");
        Ok(results)
    }
}
