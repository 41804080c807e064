//! Per-target busy flags
//!
//! A target is `Processing` exactly while a [`BusyGuard`] for it is alive.

use crate::error::PipelineError;
use cutout_asset::TargetId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Whether a removal is running for a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyState {
    Idle,
    Processing,
}

/// Busy flags shared by every invocation of one pipeline
#[derive(Debug, Clone, Default)]
pub struct BusyFlags {
    processing: Arc<DashMap<TargetId, ()>>,
}

impl BusyFlags {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `target` as processing
    ///
    /// # Errors
    /// Returns [`PipelineError::AlreadyProcessing`] if the target is busy
    pub fn try_acquire(&self, target: TargetId) -> Result<BusyGuard, PipelineError> {
        match self.processing.entry(target) {
            Entry::Occupied(_) => Err(PipelineError::AlreadyProcessing(target)),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(BusyGuard {
                    processing: Arc::clone(&self.processing),
                    target,
                })
            }
        }
    }

    #[must_use]
    pub fn state(&self, target: TargetId) -> BusyState {
        if self.processing.contains_key(&target) {
            BusyState::Processing
        } else {
            BusyState::Idle
        }
    }
}

/// Returns its target to `Idle` when dropped
#[derive(Debug)]
pub struct BusyGuard {
    processing: Arc<DashMap<TargetId, ()>>,
    target: TargetId,
}

impl BusyGuard {
    #[inline]
    #[must_use]
    pub fn target(&self) -> TargetId {
        self.target
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.processing.remove(&self.target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_marks_processing_until_dropped() {
        let flags = BusyFlags::new();
        let target = TargetId::new();

        let guard = flags.try_acquire(target).unwrap();
        assert_eq!(flags.state(target), BusyState::Processing);
        drop(guard);
        assert_eq!(flags.state(target), BusyState::Idle);
    }

    #[test]
    fn second_acquire_is_rejected() {
        let flags = BusyFlags::new();
        let target = TargetId::new();

        let _guard = flags.try_acquire(target).unwrap();
        assert!(matches!(
            flags.try_acquire(target),
            Err(PipelineError::AlreadyProcessing(id)) if id == target
        ));
    }

    #[test]
    fn targets_are_independent() {
        let flags = BusyFlags::new();
        let _a = flags.try_acquire(TargetId::new()).unwrap();
        assert!(flags.try_acquire(TargetId::new()).is_ok());
    }

    #[test]
    fn panic_releases_flag() {
        let flags = BusyFlags::new();
        let target = TargetId::new();
        let shared = flags.clone();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = shared.try_acquire(target).unwrap();
            panic!("stage blew up");
        }));
        assert!(result.is_err());
        assert_eq!(flags.state(target), BusyState::Idle);
    }
}
