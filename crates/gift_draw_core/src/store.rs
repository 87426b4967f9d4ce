//! Entry persistence capability and its in-process implementation.
//!
//! Implementations own entry records exclusively. `reveal` must be a single
//! atomic conditional write ("set `revealed_at` only if it is absent");
//! read-then-write races and is not an acceptable implementation.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::entry::{Entry, EntryView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed { drawn_name: String },
    AlreadyRevealed,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Transient backend failure. The caller may retry the whole request.
    #[error("entry store unavailable: {0}")]
    Unavailable(String),
    #[error("entry {entry_id} is malformed: {detail}")]
    CorruptRecord { entry_id: String, detail: String },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

pub trait EntryStore {
    /// Persists every entry of one draw, or none of them.
    fn create_batch(&self, entries: &[Entry]) -> Result<(), StoreError>;

    fn get_by_entry_id(&self, entry_id: &str) -> Result<Option<EntryView>, StoreError>;

    fn reveal(&self, entry_id: &str, revealed_at: &str) -> Result<RevealOutcome, StoreError>;
}

/// Strongly consistent store backed by a mutex-guarded map.
///
/// Used for local runs and tests; every operation holds the lock for its
/// whole duration, which makes `reveal` a true compare-and-set.
#[derive(Debug, Default)]
pub struct MemoryEntryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full record, including the drawn name. Intended for inspection only.
    pub fn entry(&self, entry_id: &str) -> Option<Entry> {
        self.lock()
            .ok()
            .and_then(|entries| entries.get(entry_id).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("entry map lock poisoned".to_string()))
    }
}

impl EntryStore for MemoryEntryStore {
    fn create_batch(&self, entries: &[Entry]) -> Result<(), StoreError> {
        let mut stored = self.lock()?;
        if let Some(existing) = entries
            .iter()
            .find(|entry| stored.contains_key(&entry.entry_id))
        {
            return Err(StoreError::Unavailable(format!(
                "entry {} already exists",
                existing.entry_id
            )));
        }

        for entry in entries {
            stored.insert(entry.entry_id.clone(), entry.clone());
        }
        Ok(())
    }

    fn get_by_entry_id(&self, entry_id: &str) -> Result<Option<EntryView>, StoreError> {
        Ok(self.lock()?.get(entry_id).map(Entry::view))
    }

    fn reveal(&self, entry_id: &str, revealed_at: &str) -> Result<RevealOutcome, StoreError> {
        let mut stored = self.lock()?;
        let Some(entry) = stored.get_mut(entry_id) else {
            return Ok(RevealOutcome::NotFound);
        };

        if entry.revealed_at.is_some() {
            return Ok(RevealOutcome::AlreadyRevealed);
        }

        entry.revealed_at = Some(revealed_at.to_string());
        Ok(RevealOutcome::Revealed {
            drawn_name: entry.drawn_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(entry_id: &str, viewer: &str, drawn_name: &str) -> Entry {
        Entry {
            entry_id: entry_id.to_string(),
            draw_id: "draw-1".to_string(),
            intended_viewer: viewer.to_string(),
            drawn_name: drawn_name.to_string(),
            created_at: "2026-12-01T10:00:00+00:00".to_string(),
            revealed_at: None,
        }
    }

    #[test]
    fn reveal_succeeds_once_then_reports_already_revealed() {
        let store = MemoryEntryStore::new();
        store
            .create_batch(&[entry("e-1", "Ana", "Bo")])
            .expect("batch should persist");

        let first = store
            .reveal("e-1", "2026-12-02T00:00:00+00:00")
            .expect("reveal should not fail");
        let second = store
            .reveal("e-1", "2026-12-02T00:00:01+00:00")
            .expect("reveal should not fail");

        assert_eq!(
            first,
            RevealOutcome::Revealed {
                drawn_name: "Bo".to_string()
            }
        );
        assert_eq!(second, RevealOutcome::AlreadyRevealed);
        assert_eq!(
            store
                .entry("e-1")
                .expect("entry should exist")
                .revealed_at
                .as_deref(),
            Some("2026-12-02T00:00:00+00:00")
        );
    }

    #[test]
    fn reveal_of_unknown_entry_is_not_found() {
        let store = MemoryEntryStore::new();
        let outcome = store
            .reveal("missing", "2026-12-02T00:00:00+00:00")
            .expect("reveal should not fail");
        assert_eq!(outcome, RevealOutcome::NotFound);
        assert!(store.is_empty());
    }

    #[test]
    fn get_by_entry_id_tracks_reveal_state() {
        let store = MemoryEntryStore::new();
        store
            .create_batch(&[entry("e-1", "Ana", "Bo")])
            .expect("batch should persist");

        let before = store
            .get_by_entry_id("e-1")
            .expect("lookup should not fail")
            .expect("entry should exist");
        assert!(!before.revealed);

        store
            .reveal("e-1", "2026-12-02T00:00:00+00:00")
            .expect("reveal should not fail");
        let after = store
            .get_by_entry_id("e-1")
            .expect("lookup should not fail")
            .expect("entry should exist");
        assert!(after.revealed);
        assert_eq!(after.intended_viewer, "Ana");

        assert_eq!(
            store
                .get_by_entry_id("missing")
                .expect("lookup should not fail"),
            None
        );
    }

    #[test]
    fn create_batch_is_all_or_nothing_on_id_collision() {
        let store = MemoryEntryStore::new();
        store
            .create_batch(&[entry("e-1", "Ana", "Bo")])
            .expect("batch should persist");

        let error = store
            .create_batch(&[entry("e-2", "Bo", "Cy"), entry("e-1", "Cy", "Ana")])
            .expect_err("colliding batch should fail");

        assert!(error.is_retryable());
        assert_eq!(store.len(), 1);
        assert!(store.entry("e-2").is_none());
    }

    #[test]
    fn concurrent_reveals_have_exactly_one_winner() {
        for racers in [1usize, 2, 8, 32] {
            let store = MemoryEntryStore::new();
            store
                .create_batch(&[entry("e-1", "Ana", "Bo")])
                .expect("batch should persist");

            let outcomes: Vec<RevealOutcome> = std::thread::scope(|scope| {
                let handles: Vec<_> = (0..racers)
                    .map(|racer| {
                        let store = &store;
                        scope.spawn(move || {
                            store
                                .reveal("e-1", &format!("2026-12-02T00:00:{racer:02}+00:00"))
                                .expect("reveal should not fail")
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().expect("racer thread panicked"))
                    .collect()
            });

            let winners = outcomes
                .iter()
                .filter(|outcome| matches!(outcome, RevealOutcome::Revealed { .. }))
                .count();
            let losers = outcomes
                .iter()
                .filter(|outcome| **outcome == RevealOutcome::AlreadyRevealed)
                .count();
            assert_eq!(winners, 1, "racers={racers}");
            assert_eq!(losers, racers - 1, "racers={racers}");
        }
    }
}
