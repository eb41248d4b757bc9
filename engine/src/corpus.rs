use crate::error::{Error, Result};
use crate::vocab::{self, TermStatistics, Vocabulary};
use crate::Document;
use std::collections::HashSet;

/// Validated, immutable set of documents with the vocabulary and term
/// statistics derived from them. Corpus order defines document positions.
#[derive(Debug, Clone)]
pub struct Corpus {
    documents: Vec<Document>,
    vocabulary: Vocabulary,
    stats: TermStatistics,
}

impl Corpus {
    /// The three lists must have equal length and positional correspondence,
    /// and `doc_ids` must be unique and non-empty.
    pub fn new(
        tokenized_docs: Vec<Vec<String>>,
        doc_ids: Vec<String>,
        raw_docs: Vec<String>,
    ) -> Result<Self> {
        if tokenized_docs.is_empty() {
            return Err(Error::invalid("corpus must contain at least one document"));
        }
        if tokenized_docs.len() != doc_ids.len() || doc_ids.len() != raw_docs.len() {
            return Err(Error::invalid(format!(
                "length mismatch: {} token lists, {} doc ids, {} raw documents",
                tokenized_docs.len(),
                doc_ids.len(),
                raw_docs.len()
            )));
        }
        let mut seen: HashSet<&str> = HashSet::with_capacity(doc_ids.len());
        for id in &doc_ids {
            if id.is_empty() {
                return Err(Error::invalid("empty doc id"));
            }
            if !seen.insert(id.as_str()) {
                return Err(Error::invalid(format!("duplicate doc id '{id}'")));
            }
        }

        let (vocabulary, stats) = vocab::build(&tokenized_docs);
        let documents = tokenized_docs
            .into_iter()
            .zip(doc_ids)
            .zip(raw_docs)
            .enumerate()
            .map(|(position, ((tokens, doc_id), raw_text))| Document {
                doc_id,
                position,
                raw_text,
                tokens,
            })
            .collect();

        Ok(Self { documents, vocabulary, stats })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, position: usize) -> Option<&Document> {
        self.documents.get(position)
    }

    pub fn find(&self, doc_id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.doc_id == doc_id)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn stats(&self) -> &TermStatistics {
        &self.stats
    }
}
