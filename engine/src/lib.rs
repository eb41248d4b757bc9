//! In-memory retrieval engine with two independent ranking models over the
//! same tokenized corpus: TF-IDF with cosine similarity, and Okapi BM25.
//!
//! Both indices are built once from a [`Corpus`] and are read-only
//! afterwards, so a built [`IndexHandle`] can be shared across threads.

pub mod bm25;
pub mod corpus;
pub mod error;
pub mod handle;
pub mod ingest;
pub mod rank;
pub mod tfidf;
pub mod tokenizer;
pub mod vocab;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use bm25::{Bm25Index, Bm25Params};
pub use corpus::Corpus;
pub use error::{Error, Result};
pub use handle::{IndexCache, IndexHandle};
pub use rank::RankingModel;
pub use tfidf::VectorSpaceIndex;
pub use tokenizer::{EnglishTokenizer, TokenStream, TokenizerKind, WhitespaceTokenizer};
pub use vocab::{TermStatistics, Vocabulary};

pub type TermId = u32;
/// Position of a document in corpus order.
pub type DocIndex = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub doc_id: String,
    pub position: DocIndex,
    pub raw_text: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub doc_id: String,
    pub score: f64,
    pub raw_text: String,
}

impl SearchResult {
    /// First `max_chars` characters of the raw text, with `...` appended
    /// when truncated.
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.raw_text.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// Which index a host wants to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    TfIdf,
    Bm25,
}

impl Model {
    pub const ALL: [Model; 2] = [Model::TfIdf, Model::Bm25];

    pub fn as_str(&self) -> &'static str {
        match self {
            Model::TfIdf => "tfidf",
            Model::Bm25 => "bm25",
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Model {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tfidf" | "tf-idf" => Ok(Model::TfIdf),
            "bm25" => Ok(Model::Bm25),
            other => Err(Error::InvalidInput(format!("unknown model '{other}'"))),
        }
    }
}
