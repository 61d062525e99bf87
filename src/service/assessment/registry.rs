//! Per-session exclusion for in-flight transitions
//!
//! The repository holds every session. This registry only tracks which ids
//! have a transition running. A caller that finds the id already leased gets
//! `SessionBusy` instead of waiting, so two transitions never interleave on
//! one session. An entry lives exactly as long as its lease.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as SessionLock, OwnedMutexGuard};

use crate::model::SessionId;
use crate::service::assessment::AssessmentError;

type LockTable = Mutex<HashMap<SessionId, Arc<SessionLock<()>>>>;

#[derive(Default)]
pub struct SessionRegistry {
    locks: Arc<LockTable>,
}

/// Exclusive right to run one transition on a session
///
/// Dropping the lease releases the session and clears its registry entry.
pub struct SessionLease {
    id: SessionId,
    locks: Arc<LockTable>,
    _guard: OwnedMutexGuard<()>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, id: SessionId) -> Result<SessionLease, AssessmentError> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        let slot = Arc::clone(locks.entry(id).or_default());
        let guard = slot
            .try_lock_owned()
            .map_err(|_| AssessmentError::SessionBusy(id))?;

        Ok(SessionLease {
            id,
            locks: Arc::clone(&self.locks),
            _guard: guard,
        })
    }

    /// Number of sessions with a transition in flight
    #[cfg(test)]
    pub fn in_flight(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);

        // Table entry plus the one held by this lease's guard
        let unshared = locks
            .get(&self.id)
            .is_some_and(|slot| Arc::strong_count(slot) == 2);

        if unshared {
            locks.remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_busy() {
        let registry = SessionRegistry::new();
        let id = uuid::Uuid::new_v4();

        let lease = registry.try_acquire(id).unwrap();
        let err = registry.try_acquire(id).err().unwrap();
        assert!(matches!(err, AssessmentError::SessionBusy(busy) if busy == id));

        drop(lease);
        assert!(registry.try_acquire(id).is_ok());
    }

    #[test]
    fn test_released_leases_leave_no_entries() {
        let registry = SessionRegistry::new();
        let id = uuid::Uuid::new_v4();

        let lease = registry.try_acquire(id).unwrap();
        assert_eq!(registry.in_flight(), 1);

        // A rejected attempt must not keep the entry alive
        assert!(registry.try_acquire(id).is_err());
        drop(lease);
        assert_eq!(registry.in_flight(), 0);

        for _ in 0..100 {
            drop(registry.try_acquire(uuid::Uuid::new_v4()).unwrap());
        }
        assert_eq!(registry.in_flight(), 0);
    }

    #[test]
    fn test_sessions_are_independent() {
        let registry = SessionRegistry::new();
        let (a, b) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4());

        let _held = registry.try_acquire(a).unwrap();
        assert!(registry.try_acquire(b).is_ok());
        assert_eq!(registry.in_flight(), 1);
    }

    #[tokio::test]
    async fn test_lease_can_cross_tasks() {
        let registry = Arc::new(SessionRegistry::new());
        let id = uuid::Uuid::new_v4();

        let lease = registry.try_acquire(id).unwrap();
        let holder = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            drop(lease);
        });

        assert!(registry.try_acquire(id).is_err());
        holder.await.unwrap();
        assert!(registry.try_acquire(id).is_ok());
    }
}
