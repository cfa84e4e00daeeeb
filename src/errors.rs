//! Error types

use std::path::PathBuf;

/// Everything that can go wrong while building or exporting a model.
///
/// Lookups that may legitimately find nothing (tag queries, neighbours at the
/// ends of the list) return `Option` instead of an error.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A face is too small or collapsed to answer a geometric query
    /// (fewer than three vertices, zero area, mismatched UV count, ...).
    #[error("(InvalidGeometry) {0}")]
    InvalidGeometry(String),

    /// The polygon fit could not map the source shape into the target frame.
    #[error("(FitFailed) {0}")]
    FitFailed(String),

    /// A `Face2D` was lifted back to 3D without having been projected first.
    #[error("(MissingProjectionContext) the 2D face carries no projection details")]
    MissingProjectionContext,

    /// A node handle that does not (or no longer) exist in the model.
    #[error("(UnknownNode) node {0} is not part of this model")]
    UnknownNode(String),

    /// A vertex handle that does not (or no longer) exist in the model.
    #[error("(UnknownVertex) vertex {0} is not part of this model")]
    UnknownVertex(String),

    /// A hole index past the end of a node's inner loops.
    #[error("(UnknownHole) node has {count} holes, index {index} requested")]
    UnknownHole { index: usize, count: usize },

    /// A list splice that would make the node chain run into itself.
    #[error("(InvalidLink) {0}")]
    InvalidLink(String),

    /// Writing the mesh or material file failed.
    #[error("(ExportFailed) could not write {}: {source}", .path.display())]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ModelError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        ModelError::InvalidGeometry(msg.into())
    }

    pub(crate) fn fit(msg: impl Into<String>) -> Self {
        ModelError::FitFailed(msg.into())
    }
}

pub type ModelResult<T> = Result<T, ModelError>;
