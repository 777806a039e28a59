//! Best score across runs
//!
//! A single integer persisted under a fixed key. Read once at startup,
//! written whenever a finished run beats it.

use crate::persistence::{KeyValueStore, PersistenceError, load_json, save_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighScore {
    pub best: u64,
}

impl HighScore {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "sprintSquadHighScore";

    pub fn new(best: u64) -> Self {
        Self { best }
    }

    /// Load the stored best; a missing or unreadable value starts at zero
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match load_json::<u64>(store, Self::STORAGE_KEY) {
            Ok(Some(best)) => {
                log::info!("Loaded high score {}", best);
                Self { best }
            }
            Ok(None) => {
                log::info!("No high score stored, starting fresh");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring stored high score: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), PersistenceError> {
        save_json(store, Self::STORAGE_KEY, &self.best)?;
        log::info!("High score saved ({})", self.best);
        Ok(())
    }

    /// Would `score` replace the current best?
    pub fn qualifies(&self, score: u64) -> bool {
        score > self.best
    }

    /// Keep `score` if it is a new best and persist it. Returns whether it was kept.
    pub fn record(&mut self, score: u64, store: &mut dyn KeyValueStore) -> bool {
        if !self.qualifies(score) {
            return false;
        }
        self.best = score;
        if let Err(e) = self.save(store) {
            log::warn!("Could not persist high score: {}", e);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{FileStore, MemoryStore};

    #[test]
    fn test_record_only_improvements() {
        let mut store = MemoryStore::new();
        let mut hs = HighScore::new(100);
        assert!(!hs.record(100, &mut store));
        assert!(!hs.record(40, &mut store));
        assert!(hs.record(140, &mut store));
        assert_eq!(HighScore::load(&store).best, 140);
    }

    #[test]
    fn test_garbage_value_starts_fresh() {
        let mut store = MemoryStore::new();
        store.set(HighScore::STORAGE_KEY, "\"lots\"").unwrap();
        assert_eq!(HighScore::load(&store), HighScore::default());
    }

    #[test]
    fn test_survives_restart_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sprint-squad.json");
        {
            let mut store = FileStore::open(&path).unwrap();
            let mut hs = HighScore::load(&store);
            assert_eq!(hs.best, 0);
            assert!(hs.record(250, &mut store));
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(HighScore::load(&store).best, 250);
    }
}
