//! Vocabulary and term statistics, built in one read-only pass over the
//! tokenized corpus and shared by both ranking models.

use crate::TermId;
use std::collections::HashMap;

/// Term to id mapping. Ids follow order of first appearance.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    terms: HashMap<String, TermId>,
    by_id: Vec<String>,
}

impl Vocabulary {
    pub fn get(&self, term: &str) -> Option<TermId> {
        self.terms.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.by_id.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    fn intern(&mut self, term: &str) -> TermId {
        if let Some(&id) = self.terms.get(term) {
            return id;
        }
        let id = self.by_id.len() as TermId;
        self.terms.insert(term.to_string(), id);
        self.by_id.push(term.to_string());
        id
    }
}

/// Exact frequency counts over the corpus.
#[derive(Debug, Clone, Default)]
pub struct TermStatistics {
    /// Per document: (term, raw frequency), sorted by term id.
    doc_term_freqs: Vec<Vec<(TermId, u32)>>,
    /// Per term: number of documents containing it.
    doc_freq: Vec<u32>,
    /// Per document: token count.
    doc_lengths: Vec<u32>,
}

impl TermStatistics {
    pub fn num_docs(&self) -> usize {
        self.doc_lengths.len()
    }

    pub fn doc_freq(&self, term: TermId) -> u32 {
        self.doc_freq.get(term as usize).copied().unwrap_or(0)
    }

    pub fn term_freqs(&self, doc: usize) -> &[(TermId, u32)] {
        self.doc_term_freqs.get(doc).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Raw frequency of `term` in document `doc`.
    pub fn term_freq(&self, doc: usize, term: TermId) -> u32 {
        let freqs = self.term_freqs(doc);
        freqs
            .binary_search_by_key(&term, |&(t, _)| t)
            .map(|i| freqs[i].1)
            .unwrap_or(0)
    }

    pub fn doc_len(&self, doc: usize) -> u32 {
        self.doc_lengths.get(doc).copied().unwrap_or(0)
    }

    /// Mean token count over the corpus; 0 for an empty corpus.
    pub fn avg_doc_len(&self) -> f64 {
        if self.doc_lengths.is_empty() {
            return 0.0;
        }
        let total: u64 = self.doc_lengths.iter().map(|&l| l as u64).sum();
        total as f64 / self.doc_lengths.len() as f64
    }
}

/// Scan the tokenized corpus once and derive the vocabulary and counts.
pub fn build<S: AsRef<str>>(tokenized_docs: &[Vec<S>]) -> (Vocabulary, TermStatistics) {
    let mut vocab = Vocabulary::default();
    let mut stats = TermStatistics {
        doc_term_freqs: Vec::with_capacity(tokenized_docs.len()),
        doc_freq: Vec::new(),
        doc_lengths: Vec::with_capacity(tokenized_docs.len()),
    };

    for tokens in tokenized_docs {
        let mut tf_counts: HashMap<TermId, u32> = HashMap::new();
        for token in tokens {
            let tid = vocab.intern(token.as_ref());
            *tf_counts.entry(tid).or_insert(0) += 1;
        }
        stats.doc_freq.resize(vocab.len(), 0);
        for &tid in tf_counts.keys() {
            stats.doc_freq[tid as usize] += 1;
        }
        let mut freqs: Vec<(TermId, u32)> = tf_counts.into_iter().collect();
        freqs.sort_unstable_by_key(|&(tid, _)| tid);
        stats.doc_term_freqs.push(freqs);
        stats.doc_lengths.push(tokens.len() as u32);
    }

    tracing::debug!(
        num_docs = stats.num_docs(),
        num_terms = vocab.len(),
        avgdl = stats.avg_doc_len(),
        "built vocabulary"
    );
    (vocab, stats)
}
