//! Host-side corpus loading: raw documents from JSON, JSONL or plain-text
//! files, then tokenized and indexed in one go.

use crate::bm25::Bm25Params;
use crate::handle::IndexHandle;
use crate::tokenizer::TokenStream;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub body: String,
}

const EXTENSIONS: &[&str] = &["json", "jsonl", "txt"];

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|s| s.to_str())
}

/// Load every document under `path`, a single file or a directory walked
/// recursively in path order.
pub fn load_documents<P: AsRef<Path>>(path: P) -> Result<Vec<RawDocument>> {
    let input_path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() && extension(p).is_some_and(|ext| EXTENSIONS.contains(&ext)) {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        match extension(input_path) {
            Some(ext) if EXTENSIONS.contains(&ext) => files.push(input_path.to_path_buf()),
            _ => bail!("unsupported corpus file {}", input_path.display()),
        }
    } else {
        bail!("corpus path {} does not exist", input_path.display());
    }

    let mut docs = Vec::new();
    for file in files {
        let loaded = match extension(&file) {
            Some("jsonl") => load_jsonl(&file),
            Some("json") => load_json(&file),
            _ => load_txt(&file),
        }
        .with_context(|| format!("loading {}", file.display()))?;
        docs.extend(loaded);
    }
    tracing::info!(path = %input_path.display(), num_docs = docs.len(), "loaded corpus");
    Ok(docs)
}

fn load_jsonl(file: &Path) -> Result<Vec<RawDocument>> {
    let reader = BufReader::new(File::open(file)?);
    let mut docs = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: RawDocument =
            serde_json::from_str(&line).with_context(|| format!("line {}", lineno + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

fn load_json(file: &Path) -> Result<Vec<RawDocument>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(arr) => arr
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(Into::into))
            .collect(),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => bail!("expected a JSON object or array"),
    }
}

/// Documents separated by one or more blank lines; ids are `<stem>_<n>`.
fn load_txt(file: &Path) -> Result<Vec<RawDocument>> {
    let text = fs::read_to_string(file)?;
    let stem = file.file_stem().and_then(|s| s.to_str()).unwrap_or("doc");
    Ok(split_paragraphs(&text)
        .into_iter()
        .enumerate()
        .map(|(n, body)| RawDocument { id: format!("{stem}_{n}"), title: None, body })
        .collect())
}

fn split_paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}

/// Tokenize every document body with `tokenizer` and build both indices.
pub fn build_handle(
    docs: Vec<RawDocument>,
    tokenizer: &dyn TokenStream,
) -> crate::Result<IndexHandle> {
    build_handle_with(docs, tokenizer, Bm25Params::default())
}

pub fn build_handle_with(
    docs: Vec<RawDocument>,
    tokenizer: &dyn TokenStream,
    bm25_params: Bm25Params,
) -> crate::Result<IndexHandle> {
    let mut tokenized = Vec::with_capacity(docs.len());
    let mut ids = Vec::with_capacity(docs.len());
    let mut raw = Vec::with_capacity(docs.len());
    for doc in docs {
        tokenized.push(tokenizer.tokenize(&doc.body));
        ids.push(doc.id);
        raw.push(doc.body);
    }
    IndexHandle::build_with(tokenized, ids, raw, bm25_params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraphs_split_on_blank_runs() {
        let parts = split_paragraphs("one\ntwo\n\n\n  \nthree\n");
        assert_eq!(parts, vec!["one\ntwo".to_string(), "three".to_string()]);
        assert!(split_paragraphs("\n\n").is_empty());
    }
}
