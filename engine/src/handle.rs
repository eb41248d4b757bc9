use crate::bm25::{Bm25Index, Bm25Params};
use crate::corpus::Corpus;
use crate::error::Result;
use crate::rank::RankingModel;
use crate::tfidf::VectorSpaceIndex;
use crate::{Model, SearchResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Both indices built over one corpus. Immutable once returned from
/// [`IndexHandle::build`], so it can be shared read-only across threads.
#[derive(Debug)]
pub struct IndexHandle {
    corpus: Arc<Corpus>,
    tfidf: VectorSpaceIndex,
    bm25: Bm25Index,
}

impl IndexHandle {
    pub fn build(
        tokenized_docs: Vec<Vec<String>>,
        doc_ids: Vec<String>,
        raw_docs: Vec<String>,
    ) -> Result<Self> {
        Self::build_with(tokenized_docs, doc_ids, raw_docs, Bm25Params::default())
    }

    pub fn build_with(
        tokenized_docs: Vec<Vec<String>>,
        doc_ids: Vec<String>,
        raw_docs: Vec<String>,
        bm25_params: Bm25Params,
    ) -> Result<Self> {
        let mut bm25 = Bm25Index::with_params(bm25_params)?;
        let corpus = Arc::new(Corpus::new(tokenized_docs, doc_ids, raw_docs)?);
        let mut tfidf = VectorSpaceIndex::new();
        tfidf.fit(Arc::clone(&corpus));
        bm25.fit(Arc::clone(&corpus));
        tracing::debug!(
            num_docs = corpus.len(),
            num_terms = corpus.vocabulary().len(),
            "built index handle"
        );
        Ok(Self { corpus, tfidf, bm25 })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn tfidf(&self) -> &VectorSpaceIndex {
        &self.tfidf
    }

    pub fn bm25(&self) -> &Bm25Index {
        &self.bm25
    }

    pub fn model(&self, model: Model) -> &dyn RankingModel {
        match model {
            Model::TfIdf => &self.tfidf,
            Model::Bm25 => &self.bm25,
        }
    }

    pub fn search(
        &self,
        model: Model,
        query_tokens: &[String],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        self.model(model).search(query_tokens, top_k)
    }
}

type Slot = Arc<Mutex<Option<Arc<IndexHandle>>>>;

/// Build-once guard: hands out one shared handle per corpus key. Concurrent
/// callers asking for the same key wait for a single build.
#[derive(Default)]
pub struct IndexCache {
    slots: Mutex<HashMap<String, Slot>>,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached handle for `key`, building it with `build` if absent.
    /// A failed build leaves the slot empty so a later call can retry.
    pub fn get_or_build<F>(&self, key: &str, build: F) -> Result<Arc<IndexHandle>>
    where
        F: FnOnce() -> Result<IndexHandle>,
    {
        let slot: Slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key.to_string()).or_default())
        };
        let mut guard = slot.lock();
        if let Some(handle) = guard.as_ref() {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(build()?);
        tracing::info!(key, num_docs = handle.corpus().len(), "cached index");
        *guard = Some(Arc::clone(&handle));
        Ok(handle)
    }

    pub fn get(&self, key: &str) -> Option<Arc<IndexHandle>> {
        let slot = self.slots.lock().get(key).cloned()?;
        let guard = slot.lock();
        guard.clone()
    }

    pub fn evict(&self, key: &str) -> bool {
        self.slots.lock().remove(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn tiny() -> Result<IndexHandle> {
        IndexHandle::build(
            vec![vec!["a".into()], vec!["b".into()]],
            vec!["x".into(), "y".into()],
            vec!["A".into(), "B".into()],
        )
    }

    #[test]
    fn handle_dispatches_by_model() {
        let h = tiny().unwrap();
        for m in Model::ALL {
            let r = h.search(m, &["b".to_string()], 5).unwrap();
            assert_eq!(r.len(), 1);
            assert_eq!(r[0].doc_id, "y");
            assert_eq!(h.model(m).name(), m.as_str());
        }
    }

    #[test]
    fn builds_once_under_contention() {
        let cache = Arc::new(IndexCache::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let builds = Arc::clone(&builds);
                thread::spawn(move || {
                    cache
                        .get_or_build("tiny", || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            tiny()
                        })
                        .unwrap()
                })
            })
            .collect();
        let handles: Vec<_> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(handles.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn failed_build_can_retry() {
        let cache = IndexCache::new();
        let err = cache.get_or_build("k", || Err(Error::InvalidInput("boom".into())));
        assert!(err.is_err());
        assert!(cache.get("k").is_none());
        assert!(cache.get_or_build("k", tiny).is_ok());
        assert!(cache.get("k").is_some());
        assert!(cache.evict("k"));
    }
}
