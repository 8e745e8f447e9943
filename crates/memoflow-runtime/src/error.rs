use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoError {
    #[error("no output function configured")]
    NotConfigured,

    #[error("source {key} exposes no pull, push or generate capability")]
    UnsupportedSourceKind { key: String },
}

impl MemoError {
    #[must_use]
    pub fn unsupported(key: &impl fmt::Debug) -> Self {
        Self::UnsupportedSourceKind {
            key: format!("{key:?}"),
        }
    }
}
