use crate::types::variable::Variable;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelCacheError {
    #[error("No cached model archive at '{0}'")]
    NotFound(PathBuf),

    #[error("Failed to create model directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to read cache file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to write cache file '{0}'")]
    Write(PathBuf, #[source] std::io::Error),

    #[error("Failed to delete cache file '{0}'")]
    Delete(PathBuf, #[source] std::io::Error),

    #[error("Failed to decompress model archive '{0}'")]
    Decompress(PathBuf, #[source] std::io::Error),

    #[error("Failed to compress model data")]
    Compress(#[source] std::io::Error),

    #[error("Failed to decode model from '{0}'")]
    Decode(PathBuf, #[source] Box<bincode::error::DecodeError>),

    #[error("Failed to encode model data")]
    Encode(#[source] Box<bincode::error::EncodeError>),

    #[error("Model in '{path}' has format version {found}, expected {expected}")]
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },

    #[error("Model in '{path}' was trained for {found}, expected {expected}")]
    VariableMismatch {
        path: PathBuf,
        found: Variable,
        expected: Variable,
    },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
