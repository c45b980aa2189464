use std::sync::atomic::{AtomicU64, Ordering};

/// Counter that returns unique IDs.
///
/// Meant to live in a `static`, one per id namespace, so ids stay unique across every tree
/// in the process.
#[derive(Debug)]
pub struct IdCounter {
    value: AtomicU64,
}

impl IdCounter {
    pub const fn new() -> Self {
        Self {
            // Start from 1 so 0 never shows up in logs or snapshots.
            value: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase() {
        let counter = IdCounter::new();
        let first = counter.next();
        let second = counter.next();
        assert_eq!(first, 1);
        assert!(second > first);
    }
}
