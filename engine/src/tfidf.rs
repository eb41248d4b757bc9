//! Vector-space retrieval: TF-IDF weighting with cosine similarity.
//!
//! Document vectors are L2-normalized at build time and stored as postings
//! per term, so scoring a query is a sparse dot product. IDF values are
//! frozen at build time; queries never change them.

use crate::corpus::Corpus;
use crate::error::{Error, Result};
use crate::rank::RankingModel;
use crate::{DocIndex, TermId};
use std::collections::BTreeMap;
use std::sync::Arc;

const NAME: &str = "tfidf";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting {
    pub doc: DocIndex,
    /// Normalized tf-idf weight.
    pub weight: f64,
}

#[derive(Debug)]
struct Trained {
    corpus: Arc<Corpus>,
    idf: Vec<f64>,
    /// Indexed by term id; each list sorted by document position.
    postings: Vec<Vec<Posting>>,
}

/// Smoothed IDF: `ln((1 + N) / (1 + df)) + 1`.
pub fn smooth_idf(num_docs: usize, doc_freq: u32) -> f64 {
    ((1.0 + num_docs as f64) / (1.0 + doc_freq as f64)).ln() + 1.0
}

#[derive(Debug, Default)]
pub struct VectorSpaceIndex {
    trained: Option<Trained>,
}

impl VectorSpaceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the inputs and build over a fresh corpus.
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

    /// Build over an already validated corpus, reusing its vocabulary.
    pub fn fit(&mut self, corpus: Arc<Corpus>) {
        let stats = corpus.stats();
        let n = stats.num_docs();
        let num_terms = corpus.vocabulary().len();

        let idf: Vec<f64> = (0..num_terms as TermId)
            .map(|tid| smooth_idf(n, stats.doc_freq(tid)))
            .collect();

        let mut postings: Vec<Vec<Posting>> = vec![Vec::new(); num_terms];
        for doc in 0..n {
            let freqs = stats.term_freqs(doc);
            let weights: Vec<(TermId, f64)> = freqs
                .iter()
                .map(|&(tid, tf)| (tid, tf as f64 * idf[tid as usize]))
                .collect();
            let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
            if norm == 0.0 {
                continue;
            }
            for (tid, w) in weights {
                postings[tid as usize].push(Posting { doc, weight: w / norm });
            }
        }

        tracing::debug!(num_docs = n, num_terms, "built tf-idf index");
        self.trained = Some(Trained { corpus, idf, postings });
    }

    fn trained(&self) -> Result<&Trained> {
        self.trained.as_ref().ok_or(Error::NotBuilt { model: NAME })
    }

    /// Build-time IDF of a term, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Result<Option<f64>> {
        let t = self.trained()?;
        Ok(t.corpus.vocabulary().get(term).map(|tid| t.idf[tid as usize]))
    }

    /// Project query tokens into the document space: raw counts times IDF,
    /// L2-normalized, unknown terms dropped. Ordered by term id.
    fn query_vector(t: &Trained, query_tokens: &[String]) -> Vec<(TermId, f64)> {
        let mut counts: BTreeMap<TermId, u32> = BTreeMap::new();
        for token in query_tokens {
            if let Some(tid) = t.corpus.vocabulary().get(token) {
                *counts.entry(tid).or_insert(0) += 1;
            }
        }
        let weights: Vec<(TermId, f64)> = counts
            .into_iter()
            .map(|(tid, tf)| (tid, tf as f64 * t.idf[tid as usize]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Vec::new();
        }
        weights.into_iter().map(|(tid, w)| (tid, w / norm)).collect()
    }
}

impl RankingModel for VectorSpaceIndex {
    fn name(&self) -> &'static str {
        NAME
    }

    fn is_built(&self) -> bool {
        self.trained.is_some()
    }

    fn score_all(&self, query_tokens: &[String]) -> Result<Vec<f64>> {
        let t = self.trained()?;
        let mut scores = vec![0.0f64; t.corpus.len()];
        // cosine since both sides are normalized
        for (tid, q_w) in Self::query_vector(t, query_tokens) {
            for p in &t.postings[tid as usize] {
                scores[p.doc] += q_w * p.weight;
            }
        }
        Ok(scores)
    }

    fn corpus(&self) -> Result<&Corpus> {
        Ok(&self.trained()?.corpus)
    }
}
