use thiserror::Error;

/// Failures surfaced by the search orchestrator.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The request named a domain other than cluster, gene or domain.
    #[error("unknown search domain: {0:?}")]
    UnknownDomain(String),

    #[error("catalog query failed: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl From<crate::model::types::UnknownDomainTag> for SearchError {
    fn from(tag: crate::model::types::UnknownDomainTag) -> Self {
        Self::UnknownDomain(tag.0)
    }
}
