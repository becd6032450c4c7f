//! Error types for graph building.
//!
//! A graph build fails as a whole: the first failed lookup aborts the
//! traversal and is reported through [`GraphError`]. Layout never fails; see
//! [`crate::layout::InvalidEdge`] for how malformed input is reported there.

use thiserror::Error;

use crate::{
    catalog::{EntityKind, FetchError},
    traversal::Epoch,
};

/// The main error type for graph building.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("failed to fetch {kind} {id}: {message}")]
    Transport {
        kind: EntityKind,
        id: String,
        message: String,
    },

    #[error("graph build {epoch} was superseded by a newer build")]
    Superseded { epoch: Epoch },
}

impl GraphError {
    /// Attaches the entity being fetched to a catalog failure.
    pub fn from_fetch(kind: EntityKind, id: &str, err: FetchError) -> Self {
        match err {
            FetchError::NotFound { kind, id } => Self::NotFound { kind, id },
            FetchError::Transport(message) => Self::Transport {
                kind,
                id: id.to_string(),
                message,
            },
        }
    }

    /// Returns `true` if the build was abandoned for a newer one rather than failing.
    pub fn is_superseded(&self) -> bool {
        matches!(self, Self::Superseded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fetch_not_found() {
        let err = GraphError::from_fetch(
            EntityKind::Run,
            "r1",
            FetchError::NotFound {
                kind: EntityKind::Run,
                id: "r1".into(),
            },
        );
        assert_eq!(
            err,
            GraphError::NotFound {
                kind: EntityKind::Run,
                id: "r1".into()
            }
        );
        assert_eq!(err.to_string(), "run r1 not found");
    }

    #[test]
    fn test_from_fetch_transport() {
        let err = GraphError::from_fetch(
            EntityKind::Data,
            "d1",
            FetchError::Transport("timeout".into()),
        );
        assert_eq!(err.to_string(), "failed to fetch data d1: timeout");
        assert!(!err.is_superseded());
    }
}
