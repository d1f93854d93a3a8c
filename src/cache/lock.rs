use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

/// Acquire the shared side of a container lock.
///
/// A poisoned lock is recovered rather than propagated: the data behind it is
/// a reload snapshot, and the next full reload replaces it anyway.
pub(crate) fn rw_read<'a, T>(
    lock: &'a RwLock<T>,
    container: &'static str,
    op: &'static str,
) -> RwLockReadGuard<'a, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                container,
                lock_kind = "rwlock.read",
                result = "poisoned_recovered",
                hint = "entries may be stale until the next full reload",
                "Recovered from poisoned cache lock"
            );
            poisoned.into_inner()
        }
    }
}

/// Acquire the exclusive side of a container lock. Every mutation goes
/// through here, including single-key deletes.
pub(crate) fn rw_write<'a, T>(
    lock: &'a RwLock<T>,
    container: &'static str,
    op: &'static str,
) -> RwLockWriteGuard<'a, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                container,
                lock_kind = "rwlock.write",
                result = "poisoned_recovered",
                hint = "entries may be stale until the next full reload",
                "Recovered from poisoned cache lock"
            );
            poisoned.into_inner()
        }
    }
}
