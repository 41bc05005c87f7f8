//! Two-phase stage/define buffer handoff.

use std::collections::HashMap;

use parking_lot::Mutex;

use dynload_types::UnitName;

/// Thread-safe table of byte buffers awaiting definition.
///
/// A producer that has just emitted bytes for a unit stages them here, then
/// triggers a load request that is guaranteed to observe and consume exactly
/// that buffer. Ownership transfers into the table at [`stage`] and out at
/// [`take_if_present`]; no other accessor exists, so a buffer can never be
/// read twice.
///
/// The lock is held only for the duration of a single map operation — never
/// across emission — so re-entrant load requests from inside the emitter
/// cannot deadlock.
///
/// [`stage`]: PendingTable::stage
/// [`take_if_present`]: PendingTable::take_if_present
#[derive(Default)]
pub struct PendingTable {
    inner: Mutex<HashMap<String, Box<[u8]>>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the pending buffer for `name`.
    pub fn stage(&self, name: &UnitName, bytes: impl Into<Box<[u8]>>) {
        self.inner.lock().insert(name.as_str().to_string(), bytes.into());
    }

    /// Atomically remove and return the buffer staged for `name`.
    pub fn take_if_present(&self, name: &UnitName) -> Option<Box<[u8]>> {
        self.inner.lock().remove(name.as_str())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn stage_then_take() {
        let table = PendingTable::new();
        let name = UnitName::new("dyn.pkgA.Widget");
        table.stage(&name, vec![1, 2, 3]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.take_if_present(&name).as_deref(), Some(&[1u8, 2, 3][..]));
        // Consumed: a second take observes nothing.
        assert!(table.take_if_present(&name).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn stage_replaces() {
        let table = PendingTable::new();
        let name = UnitName::new("dyn.pkgA.Widget");
        table.stage(&name, vec![1]);
        table.stage(&name, vec![2]);
        assert_eq!(table.take_if_present(&name).as_deref(), Some(&[2u8][..]));
    }

    #[test]
    fn no_buffer_is_taken_twice_across_threads() {
        let table = Arc::new(PendingTable::new());
        let name = UnitName::new("dyn.pkgA.Widget");
        table.stage(&name, vec![7; 64]);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let table = Arc::clone(&table);
            let name = name.clone();
            handles.push(std::thread::spawn(move || {
                table.take_if_present(&name).is_some()
            }));
        }
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
