/// Errors surfaced by index construction and search.
///
/// An empty result list is not an error: a query that matches nothing
/// returns `Ok(vec![])`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// `search` was called on an index that has not been built.
    #[error("{model} model not trained: call build first")]
    NotBuilt { model: &'static str },
    /// Mismatched input lengths, duplicate doc ids, empty corpus or `top_k < 1`.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
