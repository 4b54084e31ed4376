//! Re-entrancy guard

use crate::{VotingError, VotingResult};
use std::sync::atomic::{AtomicBool, Ordering};

/// "Operation in progress" flag for a guarded operation
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: AtomicBool,
}

impl ReentrancyGuard {
    /// Create an idle guard
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the operation as in progress.
    ///
    /// Fails with `ReentrantCall` if it already is. The flag is released when
    /// the returned guard drops, on success and failure paths alike.
    pub fn enter(&self) -> VotingResult<OperationGuard<'_>> {
        if self
            .entered
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(VotingError::ReentrantCall);
        }
        Ok(OperationGuard { flag: &self.entered })
    }

    /// Whether a guarded operation is running
    pub fn is_entered(&self) -> bool {
        self.entered.load(Ordering::Acquire)
    }
}

/// Held for the duration of a guarded operation
#[derive(Debug)]
pub struct OperationGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_entry_rejected() {
        let guard = ReentrancyGuard::new();
        let held = guard.enter().unwrap();
        assert!(guard.is_entered());
        assert_eq!(guard.enter().unwrap_err(), VotingError::ReentrantCall);
        drop(held);
        assert!(!guard.is_entered());
    }

    #[test]
    fn test_released_on_error_path() {
        fn failing(guard: &ReentrancyGuard) -> VotingResult<()> {
            let _held = guard.enter()?;
            Err(VotingError::EmptyProposal)
        }

        let guard = ReentrancyGuard::new();
        assert!(failing(&guard).is_err());
        assert!(!guard.is_entered());
        assert!(guard.enter().is_ok());
    }
}
