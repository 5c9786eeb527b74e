//! Concurrent access safety for tree mutations
//!
//! Provides per-directory locking so mutations on the same parent path are
//! mutually exclusive. Materialization takes the shared side of the lock;
//! shifts and swaps on the same directory take the exclusive side.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-directory lock manager.
///
/// Keyed by normalized parent path, so operations on different directories
/// proceed concurrently while shift/swap sequences on one directory are
/// serialized.
pub struct PathLockManager {
    locks: Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>,
}

impl PathLockManager {
    pub fn new() -> Self {
        Self {
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Get or create the lock for a normalized parent path.
    ///
    /// Returns an Arc to the directory's lock, usable for read or write
    /// guards.
    pub fn get_lock(&self, parent: &str) -> Arc<RwLock<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(parent) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Double-check after acquiring the write lock (another thread might
        // have created it).
        map.entry(parent.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// Locks for a pair of parent paths in deterministic (sorted) order.
    ///
    /// Cross-folder paste must hold both parents exclusively; acquiring in
    /// sorted order prevents lock-order inversion between two concurrent
    /// pastes in opposite directions. When both paths are the same directory
    /// a single lock is returned.
    pub fn get_lock_pair(
        &self,
        first: &str,
        second: &str,
    ) -> (Arc<RwLock<()>>, Option<Arc<RwLock<()>>>) {
        if first == second {
            return (self.get_lock(first), None);
        }
        let (lo, hi) = if first <= second {
            (first, second)
        } else {
            (second, first)
        };
        (self.get_lock(lo), Some(self.get_lock(hi)))
    }
}

impl Default for PathLockManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn concurrent_reads_on_same_directory() {
        let manager = Arc::new(PathLockManager::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..10 {
            let manager = manager.clone();
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                let lock = manager.get_lock("/notes");
                let _guard = lock.read();
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn writes_on_same_directory_are_serialized() {
        let manager = Arc::new(PathLockManager::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for _ in 0..5 {
            let manager = manager.clone();
            let counter = counter.clone();
            handles.push(thread::spawn(move || {
                let lock = manager.get_lock("/notes");
                let _guard = lock.write();
                let current = counter.load(Ordering::SeqCst);
                thread::yield_now();
                counter.store(current + 1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        // No lost updates: writes ran one at a time.
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn different_directories_do_not_block() {
        let manager = Arc::new(PathLockManager::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = vec![];
        for i in 0..6 {
            let manager = manager.clone();
            let counter = counter.clone();
            let parent = if i % 2 == 0 { "/a" } else { "/b" };
            handles.push(thread::spawn(move || {
                let lock = manager.get_lock(parent);
                let _guard = lock.write();
                counter.fetch_add(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn lock_pair_is_order_independent() {
        let manager = PathLockManager::new();
        let (a1, b1) = manager.get_lock_pair("/a", "/b");
        let (a2, b2) = manager.get_lock_pair("/b", "/a");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(Arc::ptr_eq(&b1.unwrap(), &b2.unwrap()));

        let (_, same) = manager.get_lock_pair("/a", "/a");
        assert!(same.is_none());
    }
}
