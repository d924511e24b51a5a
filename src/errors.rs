use thiserror::Error;

/// Fatal graph assembly failures. The graph is never partially built: any of
/// these aborts construction before a model is handed out.
#[derive(Error, Debug)]
pub enum GraphBuildError {
    #[error("missing critical node class: {0}")]
    MissingCriticalNode(String),
    #[error(transparent)]
    Load(#[from] LoadError),
}

/// Wire-format loading failures. Individual malformed edges are dropped with
/// a warning instead; this covers documents that cannot be read at all.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("invalid graph document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
    #[error("graph document i/o: {0}")]
    Io(#[from] std::io::Error),
}

/// Persistent training-spot cache failures. Load failures degrade to an empty
/// cache; save failures surface so the owner can retry or log.
#[derive(Error, Debug)]
pub enum SpotCacheError {
    #[error("spot cache i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("spot cache serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}
