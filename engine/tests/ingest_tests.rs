use engine::ingest::{build_handle, build_handle_with, load_documents, RawDocument};
use engine::{Bm25Params, EnglishTokenizer, Error, Model, TokenStream, WhitespaceTokenizer};
use std::fs;
use tempfile::tempdir;

#[test]
fn loads_jsonl_json_and_txt_in_path_order() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("a.jsonl"),
        "{\"id\":\"n1\",\"title\":\"Moon\",\"body\":\"Moon mission launch\"}\n\n{\"id\":\"n2\",\"body\":\"Baseball game\"}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("b.json"),
        r#"[{"id":"j1","body":"Tax vote"}]"#,
    )
    .unwrap();
    fs::write(dir.path().join("c.txt"), "Shuttle launch\n\n\nWorld series\n").unwrap();
    fs::write(dir.path().join("ignored.csv"), "x,y").unwrap();

    let docs = load_documents(dir.path()).unwrap();
    let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["n1", "n2", "j1", "c_0", "c_1"]);
    assert_eq!(docs[0].title.as_deref(), Some("Moon"));
    assert_eq!(docs[4].body, "World series");
}

#[test]
fn single_json_object_is_one_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("one.json");
    fs::write(&path, r#"{"id":"solo","title":"Orbit","body":"Orbital debris report"}"#).unwrap();
    let docs = load_documents(&path).unwrap();
    assert_eq!(
        docs,
        vec![RawDocument {
            id: "solo".into(),
            title: Some("Orbit".into()),
            body: "Orbital debris report".into(),
        }]
    );
}

#[test]
fn json_scalar_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("n.json");
    fs::write(&path, "42").unwrap();
    assert!(load_documents(&path).is_err());
}

#[test]
fn bm25_params_reach_the_index() {
    let docs = vec![
        RawDocument { id: "a".into(), title: None, body: "term".into() },
        RawDocument { id: "b".into(), title: None, body: "term filler filler".into() },
    ];
    let flat = Bm25Params { k1: 1.2, b: 0.0 };
    let handle = build_handle_with(docs.clone(), &WhitespaceTokenizer, flat).unwrap();
    assert_eq!(handle.bm25().params(), flat);
    // without length normalization both documents score the same
    let results = handle.search(Model::Bm25, &["term".to_string()], 2).unwrap();
    assert_eq!(results[0].score, results[1].score);

    let bad = build_handle_with(docs, &WhitespaceTokenizer, Bm25Params { k1: 1.2, b: 2.0 });
    assert!(matches!(bad, Err(Error::InvalidInput(_))));
}

#[test]
fn rejects_unsupported_file_and_missing_path() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("corpus.csv");
    fs::write(&csv, "a,b").unwrap();
    assert!(load_documents(&csv).is_err());
    assert!(load_documents(dir.path().join("missing")).is_err());
}

#[test]
fn malformed_json_reports_the_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.jsonl");
    fs::write(&path, "{\"id\":\"x\"}\n").unwrap();
    let err = load_documents(&path).unwrap_err();
    assert!(format!("{err:#}").contains("bad.jsonl"));
}

#[test]
fn builds_searchable_handle_from_raw_documents() {
    let docs = vec![
        RawDocument { id: "a".into(), title: None, body: "The Moon missions were launched".into() },
        RawDocument { id: "b".into(), title: None, body: "Baseball's World Series game".into() },
    ];
    let tokenizer = EnglishTokenizer;
    let handle = build_handle(docs, &tokenizer).unwrap();
    for model in Model::ALL {
        let results = handle.search(model, &tokenizer.tokenize("moon mission"), 3).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, "a");
        assert_eq!(results[0].raw_text, "The Moon missions were launched");
    }
}
