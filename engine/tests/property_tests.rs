use engine::{IndexHandle, Model, RankingModel};
use proptest::collection::vec as prop_vec;
use proptest::prelude::*;
use proptest::sample::select;

const WORDS: &[&str] = &["space", "moon", "launch", "game", "series", "vote", "tax", "orbit"];

fn token_strategy() -> impl Strategy<Value = String> {
    select(WORDS).prop_map(String::from)
}

fn corpus_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop_vec(prop_vec(token_strategy(), 0..10), 1..12)
}

fn query_strategy() -> impl Strategy<Value = Vec<String>> {
    prop_vec(prop_oneof![token_strategy(), Just("unseen".to_string())], 0..6)
}

fn build(docs: &[Vec<String>]) -> IndexHandle {
    IndexHandle::build(
        docs.to_vec(),
        (0..docs.len()).map(|i| format!("d{i}")).collect(),
        docs.iter().map(|d| d.join(" ")).collect(),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn prop_search_is_deterministic(docs in corpus_strategy(), query in query_strategy(), k in 1usize..8) {
        let h = build(&docs);
        let rebuilt = build(&docs);
        for model in Model::ALL {
            let first = h.search(model, &query, k).unwrap();
            let second = h.search(model, &query, k).unwrap();
            let third = rebuilt.search(model, &query, k).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(&first, &third);
        }
    }

    #[test]
    fn prop_top_k_bound_and_positivity(docs in corpus_strategy(), query in query_strategy(), k in 1usize..8) {
        let h = build(&docs);
        for model in Model::ALL {
            let results = h.search(model, &query, k).unwrap();
            let positive = h.model(model).score_all(&query).unwrap().iter().filter(|s| **s > 0.0).count();
            prop_assert!(results.len() <= k);
            prop_assert_eq!(results.len(), positive.min(k));
            prop_assert!(results.iter().all(|r| r.score > 0.0));
        }
    }

    #[test]
    fn prop_results_ordered_with_stable_ties(docs in corpus_strategy(), query in query_strategy()) {
        let h = build(&docs);
        for model in Model::ALL {
            let results = h.search(model, &query, docs.len()).unwrap();
            for pair in results.windows(2) {
                let pos = |id: &str| h.corpus().find(id).map(|d| d.position).unwrap();
                prop_assert!(pair[0].score >= pair[1].score);
                if pair[0].score == pair[1].score {
                    prop_assert!(pos(&pair[0].doc_id) < pos(&pair[1].doc_id));
                }
            }
        }
    }

    #[test]
    fn prop_cosine_is_bounded(docs in corpus_strategy(), query in query_strategy()) {
        let h = build(&docs);
        for score in h.tfidf().score_all(&query).unwrap() {
            prop_assert!((0.0..=1.0 + 1e-9).contains(&score));
        }
    }
}
