//! Flat-file habit store.
//!
//! One habit per line in append order. Every operation re-reads the whole
//! file; mutations hold an exclusive lock on `<store>.lock` from the read
//! until the commit so concurrent invocations serialize.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::allocator::next_id;
use super::config::Config;
use super::is_blank;
use super::rewrite::{self, Change, Mutation};
use crate::error::{HabitError, Result};
use crate::points::draw_increment;
use crate::record::{self, HabitRecord};

/// Result of recording a completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// The habit as written back
    pub record: HabitRecord,
    /// Points added by this completion
    pub increment: u64,
    /// Whether this completion passed a gate
    pub gate_crossed: bool,
    /// Reward earned by the gate, as it read before any replacement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claimed_reward: Option<String>,
}

/// Storage for habits, backed by one text file.
#[derive(Debug, Clone)]
pub struct HabitStore {
    path: PathBuf,
}

/// Held for the duration of a mutation.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl HabitStore {
    /// Open the store at `path`, creating it (and its directory) if needed.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or opened for writing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| HabitError::io(parent, e))?;
        }

        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        options.open(&path).map_err(|e| HabitError::io(&path, e))?;

        Ok(Self { path })
    }

    /// Open the store named by the configuration, `~/.habit` by default.
    pub fn open_default(config: &Config) -> Result<Self> {
        Self::open(config.store_path()?)
    }

    /// Get the store file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a habit with no points and no gates. Returns its new id.
    pub fn add(&self, name: &str, reward: &str) -> Result<u64> {
        let _lock = self.lock()?;
        let content = self.read()?;
        let id = next_id(&content);

        let mut line = String::new();
        if !content.is_empty() && !content.ends_with(b"\n") {
            line.push('\n');
        }
        line.push_str(&record::encode(&HabitRecord::new(id, name, reward)));

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| HabitError::io(&self.path, e))?;
        file.write_all(line.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|e| HabitError::io(&self.path, e))?;

        debug!(id, "added habit");
        Ok(id)
    }

    /// All decodable habits in file order. Malformed lines are skipped with
    /// a warning.
    pub fn list(&self) -> Result<Vec<HabitRecord>> {
        Ok(decode_all(&self.read()?))
    }

    /// The habit with `id`.
    pub fn get(&self, id: u64) -> Result<HabitRecord> {
        self.list()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(HabitError::NotFound(id))
    }

    /// Record a completion worth a random `[1, 10]` points drawn from `rng`.
    pub fn record<R: Rng + ?Sized>(&self, id: u64, rng: &mut R) -> Result<RecordOutcome> {
        self.record_increment(id, draw_increment(rng))
    }

    /// Record a completion worth exactly `increment` points.
    pub fn record_increment(&self, id: u64, increment: u64) -> Result<RecordOutcome> {
        self.record_increment_with_next_reward(id, increment, None)
    }

    /// Record a random completion and, if it passes a gate, replace the
    /// claimed reward with `next_reward` in the same transaction.
    pub fn record_with_next_reward<R: Rng + ?Sized>(
        &self,
        id: u64,
        rng: &mut R,
        next_reward: Option<String>,
    ) -> Result<RecordOutcome> {
        self.record_increment_with_next_reward(id, draw_increment(rng), next_reward)
    }

    /// [`record_with_next_reward`](Self::record_with_next_reward) with a fixed
    /// `increment`.
    pub fn record_increment_with_next_reward(
        &self,
        id: u64,
        increment: u64,
        next_reward: Option<String>,
    ) -> Result<RecordOutcome> {
        let change = self.apply(
            id,
            &Mutation::Record {
                increment,
                next_reward,
            },
        )?;
        match change {
            Change::Updated {
                record,
                gate_crossed,
                claimed_reward,
            } => Ok(RecordOutcome {
                record,
                increment,
                gate_crossed,
                claimed_reward,
            }),
            Change::Removed(record) => Ok(RecordOutcome {
                record,
                increment,
                gate_crossed: false,
                claimed_reward: None,
            }),
        }
    }

    /// Replace the reward of habit `id`; nothing else changes.
    pub fn update_reward(&self, id: u64, reward: &str) -> Result<HabitRecord> {
        let change = self.apply(
            id,
            &Mutation::UpdateReward {
                reward: reward.to_string(),
            },
        )?;
        Ok(change.into_record())
    }

    /// Remove habit `id`. Returns the removed habit.
    pub fn delete(&self, id: u64) -> Result<HabitRecord> {
        Ok(self.apply(id, &Mutation::Delete)?.into_record())
    }

    /// Run one rewrite transaction.
    ///
    /// When no habit carries `id` nothing is written and the store stays
    /// byte-for-byte identical.
    pub fn apply(&self, id: u64, mutation: &Mutation) -> Result<Change> {
        let _lock = self.lock()?;
        let source = self.read()?;
        let plan = rewrite::plan(&source, id, mutation);

        let Some(change) = plan.change else {
            debug!(id, "no habit matched, store left untouched");
            return Err(HabitError::NotFound(id));
        };

        rewrite::commit(&self.path, &plan.content).map_err(|e| HabitError::io(&self.path, e))?;
        Ok(change)
    }

    fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path).map_err(|e| HabitError::io(&self.path, e))
    }

    fn lock(&self) -> Result<StoreLock> {
        let mut lock_path = self.path.clone().into_os_string();
        lock_path.push(".lock");
        let lock_path = PathBuf::from(lock_path);

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| HabitError::io(&lock_path, e))?;
        file.lock_exclusive()
            .map_err(|e| HabitError::io(&lock_path, e))?;
        Ok(StoreLock { file })
    }
}

fn decode_all(content: &[u8]) -> Vec<HabitRecord> {
    content
        .split(|b| *b == b'\n')
        .enumerate()
        .filter(|(_, line)| !is_blank(line))
        .filter_map(|(index, line)| match record::decode_bytes(line) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(line = index + 1, "skipping habit: {e}");
                None
            }
        })
        .collect()
}
