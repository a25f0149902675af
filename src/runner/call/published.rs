//! Single-writer, lock-free-reader publication slot.
//!
//! Writers swap in a new value and retire the old one through the epoch collector, so a reader
//! that loaded the old value keeps a valid `Arc` for as long as it needs it.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam::epoch::{self, Atomic, Owned};

pub struct Published<T> {
    slot: Atomic<Option<Arc<T>>>,
}

impl<T> Published<T> {
    pub fn new() -> Self {
        Published {
            slot: Atomic::null(),
        }
    }

    pub fn load(&self) -> Option<Arc<T>> {
        let guard = epoch::pin();
        let shared = self.slot.load(Ordering::Acquire, &guard);
        // SAFETY: the slot is only freed through `defer_destroy`, which waits for this pin.
        unsafe { shared.as_ref() }.and_then(|value| value.clone())
    }

    /// Replaces the published value. Callers serialize writes themselves.
    pub fn publish(&self, value: Option<Arc<T>>) {
        let guard = epoch::pin();
        let old = self.slot.swap(Owned::new(value), Ordering::AcqRel, &guard);
        if !old.is_null() {
            // SAFETY: `old` is unreachable from the slot now; pinned readers finish first.
            unsafe { guard.defer_destroy(old) };
        }
    }
}

impl<T> Default for Published<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Published<T> {
    fn drop(&mut self) {
        // SAFETY: `&mut self` means no reader can still observe the slot.
        unsafe {
            let guard = epoch::unprotected();
            let current = self.slot.load(Ordering::Relaxed, guard);
            if !current.is_null() {
                drop(current.into_owned());
            }
        }
    }
}
