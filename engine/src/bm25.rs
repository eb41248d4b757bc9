//! Okapi BM25 over per-document term frequencies.
//!
//! For each query token (a multiset: repeats count once per occurrence):
//! `idf(t) * f(t,d) * (k1 + 1) / (f(t,d) + k1 * (1 - b + b * |d| / avgdl))`
//! with `idf(t) = ln((N - df + 0.5) / (df + 0.5) + 1)`.

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::rank::RankingModel;
use crate::{DocIndex, TermId};
use std::sync::Arc;

const NAME: &str = "bm25";

/// BM25 parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25Params {
    /// Term-frequency saturation.
    pub k1: f64,
    /// Length normalization, in `[0, 1]`.
    pub b: f64,
}

impl Default for Bm25Params {
    fn default() -> Self {
        Self { k1: 1.5, b: 0.75 }
    }
}

impl Bm25Params {
    fn validate(&self) -> Result<()> {
        if !(self.k1.is_finite() && self.k1 >= 0.0) {
            return Err(Error::invalid(format!("k1 must be >= 0, got {}", self.k1)));
        }
        if !(0.0..=1.0).contains(&self.b) {
            return Err(Error::invalid(format!("b must be in [0, 1], got {}", self.b)));
        }
        Ok(())
    }
}

/// Okapi IDF, never negative.
pub fn okapi_idf(num_docs: usize, doc_freq: u32) -> f64 {
    let n = num_docs as f64;
    let df = doc_freq as f64;
    ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    doc: DocIndex,
    term_frequency: u32,
}

#[derive(Debug)]
struct Trained {
    corpus: Arc<Corpus>,
    avgdl: f64,
    idf: Vec<f64>,
    postings: Vec<Vec<Posting>>,
}

#[derive(Debug, Default)]
pub struct Bm25Index {
    params: Bm25Params,
    trained: Option<Trained>,
}

impl Bm25Index {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: Bm25Params) -> Result<Self> {
        params.validate()?;
        Ok(Self { params, trained: None })
    }

    pub fn params(&self) -> Bm25Params {
        self.params
    }

    pub fn build(
        &mut self,
        tokenized_docs: Vec<Vec<String>>,
        doc_ids: Vec<String>,
        raw_docs: Vec<String>,
    ) -> Result<()> {
        let corpus = Corpus::new(tokenized_docs, doc_ids, raw_docs)?;
        self.fit(Arc::new(corpus));
        Ok(())
    }

    pub fn fit(&mut self, corpus: Arc<Corpus>) {
        let stats = corpus.stats();
        let n = stats.num_docs();
        let num_terms = corpus.vocabulary().len();

        let idf = (0..num_terms as TermId)
            .map(|tid| okapi_idf(n, stats.doc_freq(tid)))
            .collect();
        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); num_terms];
        for doc in 0..n {
            for &(tid, tf) in stats.term_freqs(doc) {
                postings[tid as usize].push(Posting { doc, term_frequency: tf });
            }
        }
        let avgdl = stats.avg_doc_len();

        tracing::debug!(num_docs = n, num_terms, avgdl, "built bm25 index");
        self.trained = Some(Trained { corpus, avgdl, idf, postings });
    }

    fn trained(&self) -> Result<&Trained> {
        self.trained.as_ref().ok_or(Error::NotBuilt { model: NAME })
    }

    pub fn avg_doc_len(&self) -> Result<f64> {
        Ok(self.trained()?.avgdl)
    }
}

impl RankingModel for Bm25Index {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_built(&self) -> bool {
        self.trained.is_some()
    }

    fn score_all(&self, query_tokens: &[String]) -> Result<Vec<f64>> {
        let t = self.trained()?;
        let stats = t.corpus.stats();
        let Bm25Params { k1, b } = self.params;
        let mut scores = vec![0.0f64; t.corpus.len()];

        for token in query_tokens {
            let Some(tid) = t.corpus.vocabulary().get(token) else {
                continue;
            };
            let idf = t.idf[tid as usize];
            for posting in &t.postings[tid as usize] {
                let tf = posting.term_frequency as f64;
                let dl = stats.doc_len(posting.doc) as f64;
                // avgdl > 0 whenever a posting exists
                let tf_norm = (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * dl / t.avgdl));
                scores[posting.doc] += idf * tf_norm;
            }
        }
        Ok(scores)
    }

    fn corpus(&self) -> Result<&Corpus> {
        Ok(&self.trained()?.corpus)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    fn index(docs: &[&str]) -> Bm25Index {
        let mut idx = Bm25Index::new();
        idx.build(
            docs.iter().map(|d| toks(d)).collect(),
            (0..docs.len()).map(|i| format!("d{i}")).collect(),
            docs.iter().map(|d| d.to_string()).collect(),
        )
        .unwrap();
        idx
    }

    #[test]
    fn unbuilt_index_refuses_queries() {
        let idx = Bm25Index::new();
        assert_eq!(idx.search(&toks("a"), 1), Err(Error::NotBuilt { model: "bm25" }));
    }

    #[test]
    fn rejects_bad_params() {
        assert!(Bm25Index::with_params(Bm25Params { k1: 1.2, b: 1.5 }).is_err());
        assert!(Bm25Index::with_params(Bm25Params { k1: -1.0, b: 0.5 }).is_err());
        assert!(Bm25Index::with_params(Bm25Params { k1: 1.2, b: 0.5 }).is_ok());
    }

    #[test]
    fn idf_stays_positive_for_ubiquitous_terms() {
        assert!(okapi_idf(3, 3) > 0.0);
        assert!(okapi_idf(3, 1) > okapi_idf(3, 2));
    }

    #[test]
    fn matches_formula_by_hand() {
        let idx = index(&["a b", "c"]);
        let scores = idx.score_all(&toks("a")).unwrap();
        let (k1, b) = (1.5, 0.75);
        let idf = ((2.0 - 1.0 + 0.5) / (1.0 + 0.5) + 1.0f64).ln();
        let expected = idf * (1.0 * (k1 + 1.0)) / (1.0 + k1 * (1.0 - b + b * 2.0 / 1.5));
        assert!((scores[0] - expected).abs() < 1e-12);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn repeated_query_terms_add_up() {
        let idx = index(&["a b", "c"]);
        let once = idx.score_all(&toks("a")).unwrap();
        let twice = idx.score_all(&toks("a a")).unwrap();
        assert!((twice[0] - 2.0 * once[0]).abs() < 1e-12);
    }

    #[test]
    fn higher_tf_ranks_first() {
        let idx = index(&["rust programming", "rust rust rust", "python"]);
        let results = idx.search(&toks("rust"), 10).unwrap();
        assert_eq!(results[0].doc_id, "d1");
        assert_eq!(results.len(), 2);
    }
}
