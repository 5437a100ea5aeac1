use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::app_dirs::AppDirs;
use crate::difficulty::Difficulty;
use crate::error::Result;

pub const MIN_TIMER_SECS: u32 = 3;
pub const MAX_TIMER_SECS: u32 = 60;

const HIGH_SCORE_KEY: &str = "highscore";
const TIMERS_KEY: &str = "timers";

/// Per-difficulty countdown length chosen by the player
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomTimers {
    pub easy: u32,
    pub medium: u32,
    pub hard: u32,
}

impl Default for CustomTimers {
    fn default() -> Self {
        Self {
            easy: Difficulty::Easy.config().default_timer_secs,
            medium: Difficulty::Medium.config().default_timer_secs,
            hard: Difficulty::Hard.config().default_timer_secs,
        }
    }
}

impl CustomTimers {
    pub fn get(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Medium => self.medium,
            Difficulty::Hard => self.hard,
        }
    }

    /// Stores `secs` clamped to the slider range and returns the stored value
    pub fn set(&mut self, difficulty: Difficulty, secs: u32) -> u32 {
        let secs = secs.clamp(MIN_TIMER_SECS, MAX_TIMER_SECS);
        match difficulty {
            Difficulty::Easy => self.easy = secs,
            Difficulty::Medium => self.medium = secs,
            Difficulty::Hard => self.hard = secs,
        }
        secs
    }
}

/// Everything that survives between runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SavedState {
    pub high_score: u32,
    pub timers: CustomTimers,
}

/// Persistence boundary. Loading never fails: anything unreadable is a default.
pub trait Store {
    fn load(&self) -> SavedState;
    fn save(&self, state: &SavedState) -> Result<()>;
}

/// Two keys stored as two files in one directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new() -> Self {
        let dir = AppDirs::data_dir().unwrap_or_else(|| PathBuf::from("tabelline_data"));
        Self { dir }
    }

    pub fn with_dir<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn read_key(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.dir.join(key)).ok()
    }

    fn load_high_score(&self) -> u32 {
        self.read_key(HIGH_SCORE_KEY)
            .and_then(|s| s.trim().parse::<u32>().ok())
            .unwrap_or_default()
    }

    fn load_timers(&self) -> CustomTimers {
        let Some(raw) = self.read_key(TIMERS_KEY) else {
            return CustomTimers::default();
        };
        match serde_json::from_str::<CustomTimers>(&raw) {
            Ok(mut timers) => {
                for d in Difficulty::ALL {
                    timers.set(d, timers.get(d));
                }
                timers
            }
            Err(e) => {
                tracing::warn!("ignoring unreadable timers: {e}");
                CustomTimers::default()
            }
        }
    }
}

impl Default for FileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for FileStore {
    fn load(&self) -> SavedState {
        SavedState {
            high_score: self.load_high_score(),
            timers: self.load_timers(),
        }
    }

    fn save(&self, state: &SavedState) -> Result<()> {
        let timers = serde_json::to_vec(&state.timers)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(self.dir.join(HIGH_SCORE_KEY), state.high_score.to_string())?;
        fs::write(self.dir.join(TIMERS_KEY), timers)?;
        Ok(())
    }
}

/// In-memory store; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<SavedState>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: SavedState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            saves: Arc::default(),
        }
    }

    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl Store for MemoryStore {
    fn load(&self) -> SavedState {
        self.state.lock().map(|s| *s).unwrap_or_default()
    }

    fn save(&self, state: &SavedState) -> Result<()> {
        let mut current = self
            .state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "store poisoned"))?;
        *current = *state;
        if let Ok(mut n) = self.saves.lock() {
            *n += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TabellineError;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_saved_state() {
        let dir = tempdir().unwrap();
        let store = FileStore::with_dir(dir.path());
        let state = SavedState {
            high_score: 187,
            timers: CustomTimers {
                easy: 30,
                medium: 12,
                hard: 5,
            },
        };
        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn save_into_unusable_dir_is_an_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let store = FileStore::with_dir(blocker.join("data"));
        assert_matches!(
            store.save(&SavedState::default()),
            Err(TabellineError::Io(_))
        );
    }

    #[test]
    fn missing_files_load_defaults() {
        let dir = tempdir().unwrap();
        let store = FileStore::with_dir(dir.path().join("nothing-here"));
        assert_eq!(store.load(), SavedState::default());
        assert_eq!(store.load().timers.get(Difficulty::Medium), 15);
    }

    #[test]
    fn keys_are_plain_files() {
        let dir = tempdir().unwrap();
        let store = FileStore::with_dir(dir.path());
        store
            .save(&SavedState {
                high_score: 42,
                timers: CustomTimers::default(),
            })
            .unwrap();

        let high = fs::read_to_string(dir.path().join("highscore")).unwrap();
        assert_eq!(high, "42");
        let timers: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("timers")).unwrap()).unwrap();
        assert_eq!(timers["easy"], 20);
        assert_eq!(timers["medium"], 15);
        assert_eq!(timers["hard"], 10);
    }

    #[test]
    fn corrupt_values_fall_back_independently() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("highscore"), "not a number").unwrap();
        fs::write(
            dir.path().join("timers"),
            r#"{"easy":25,"medium":15,"hard":8}"#,
        )
        .unwrap();
        let store = FileStore::with_dir(dir.path());
        let state = store.load();
        assert_eq!(state.high_score, 0);
        assert_eq!(state.timers.easy, 25);
        assert_eq!(state.timers.hard, 8);

        fs::write(dir.path().join("highscore"), "99\n").unwrap();
        fs::write(dir.path().join("timers"), "{broken").unwrap();
        let state = store.load();
        assert_eq!(state.high_score, 99);
        assert_eq!(state.timers, CustomTimers::default());
    }

    #[test]
    fn out_of_range_timers_are_clamped_on_load() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("timers"),
            r#"{"easy":0,"medium":15,"hard":600}"#,
        )
        .unwrap();
        let timers = FileStore::with_dir(dir.path()).load().timers;
        assert_eq!(timers.easy, MIN_TIMER_SECS);
        assert_eq!(timers.hard, MAX_TIMER_SECS);
    }

    #[test]
    fn custom_timers_clamp() {
        let mut timers = CustomTimers::default();
        assert_eq!(timers.set(Difficulty::Easy, 1), 3);
        assert_eq!(timers.set(Difficulty::Hard, 120), 60);
        assert_eq!(timers.set(Difficulty::Medium, 30), 30);
        assert_eq!(timers.get(Difficulty::Medium), 30);
    }

    #[test]
    fn memory_store_shares_state_between_clones() {
        let store = MemoryStore::new();
        let handle = store.clone();
        store
            .save(&SavedState {
                high_score: 5,
                timers: CustomTimers::default(),
            })
            .unwrap();
        assert_eq!(handle.load().high_score, 5);
        assert_eq!(handle.save_count(), 1);
    }
}
