//! Generation counter that lets a newer graph build supersede an older one.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::Serialize;

use crate::error::GraphError;

/// Generation number of a graph build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Shared source of epochs. Clones observe the same counter.
#[derive(Debug, Clone, Default)]
pub struct EpochCounter(Arc<AtomicU64>);

impl EpochCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recently issued epoch.
    pub fn current(&self) -> Epoch {
        Epoch(self.0.load(Ordering::SeqCst))
    }

    /// Issues a new epoch, making every earlier one stale.
    pub fn advance(&self) -> Epoch {
        Epoch(self.0.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// A guard that stays valid until the next [`EpochCounter::advance`].
    pub fn guard(&self) -> EpochGuard {
        EpochGuard {
            counter: self.clone(),
            epoch: self.current(),
        }
    }
}

/// Ties a traversal run to the epoch it was started in.
#[derive(Debug, Clone)]
pub struct EpochGuard {
    counter: EpochCounter,
    epoch: Epoch,
}

impl EpochGuard {
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn is_current(&self) -> bool {
        self.counter.current() == self.epoch
    }

    /// Fails with [`GraphError::Superseded`] once a newer epoch was issued.
    pub fn check(&self) -> Result<(), GraphError> {
        if self.is_current() {
            Ok(())
        } else {
            Err(GraphError::Superseded { epoch: self.epoch })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_invalidates_guard() {
        let counter = EpochCounter::new();
        let first = counter.advance();
        let guard = counter.guard();

        assert_eq!(guard.epoch(), first);
        assert!(guard.check().is_ok());

        let second = counter.advance();
        assert!(second > first);
        assert!(!guard.is_current());
        assert_eq!(
            guard.check(),
            Err(GraphError::Superseded { epoch: first })
        );
    }

    #[test]
    fn test_clones_share_counter() {
        let counter = EpochCounter::new();
        let clone = counter.clone();
        clone.advance();

        assert_eq!(counter.current().value(), 1);
        assert_eq!(counter.current().to_string(), "#1");
    }
}
