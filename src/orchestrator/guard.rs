use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::RunError;

/// In-process single-flight lock keyed by campaign id.
///
/// Clones share the same set, so every handle held by one process sees the
/// same in-flight runs. It does not coordinate separate processes.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<Mutex<HashSet<String>>>,
}

impl RunGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `campaign_id`, or fail with `AlreadyRunning` if a run holds it.
    pub fn try_acquire(&self, campaign_id: &str) -> Result<RunPermit, RunError> {
        let mut running = lock(&self.running);
        if !running.insert(campaign_id.to_string()) {
            return Err(RunError::AlreadyRunning {
                campaign_id: campaign_id.to_string(),
            });
        }
        Ok(RunPermit {
            campaign_id: campaign_id.to_string(),
            running: Arc::clone(&self.running),
        })
    }

    pub fn is_running(&self, campaign_id: &str) -> bool {
        lock(&self.running).contains(campaign_id)
    }
}

/// Held for the duration of a run; releases the campaign on drop.
#[derive(Debug)]
pub struct RunPermit {
    campaign_id: String,
    running: Arc<Mutex<HashSet<String>>>,
}

impl RunPermit {
    pub fn campaign_id(&self) -> &str {
        &self.campaign_id
    }
}

impl Drop for RunPermit {
    fn drop(&mut self) {
        lock(&self.running).remove(&self.campaign_id);
    }
}

// A panic while holding the lock leaves the set itself consistent.
fn lock(running: &Mutex<HashSet<String>>) -> MutexGuard<'_, HashSet<String>> {
    running.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_for_same_campaign_fails() {
        let guard = RunGuard::new();
        let _permit = guard.try_acquire("camp-1").unwrap();
        let err = guard.try_acquire("camp-1").unwrap_err();
        assert!(matches!(err, RunError::AlreadyRunning { .. }));
    }

    #[test]
    fn test_different_campaigns_do_not_block() {
        let guard = RunGuard::new();
        let a = guard.try_acquire("camp-1").unwrap();
        let b = guard.try_acquire("camp-2").unwrap();
        assert_eq!(a.campaign_id(), "camp-1");
        assert_eq!(b.campaign_id(), "camp-2");
    }

    #[test]
    fn test_drop_releases_permit() {
        let guard = RunGuard::new();
        {
            let _permit = guard.try_acquire("camp-1").unwrap();
            assert!(guard.is_running("camp-1"));
        }
        assert!(!guard.is_running("camp-1"));
        assert!(guard.try_acquire("camp-1").is_ok());
    }

    #[test]
    fn test_clones_share_state() {
        let guard = RunGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire("camp-1").unwrap();
        assert!(other.try_acquire("camp-1").is_err());
    }
}
