mod allocator;
mod config;
pub mod rewrite;
pub mod store;

pub use allocator::next_id;
pub use config::{Config, RewardsConfig, StoreConfig};
pub use rewrite::Mutation;
pub use store::{HabitStore, RecordOutcome};

use std::path::{Path, PathBuf};

use crate::error::{HabitError, Result};

/// Blank or whitespace-only store line.
pub(crate) fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Name of the store file in the home directory.
pub const STORE_FILE_NAME: &str = ".habit";

/// Returns `~/.config/habit[-dev]/` based on HABIT_ENV, without creating it.
///
/// Set HABIT_ENV=dev to use development data directory.
pub fn data_dir_path() -> PathBuf {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HABIT_ENV").unwrap_or_else(|_| "production".to_string());

    if env == "dev" {
        base_dir.join("habit-dev")
    } else {
        base_dir.join("habit")
    }
}

/// Returns [`data_dir_path`], creating the directory if needed.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = data_dir_path();
    std::fs::create_dir_all(&dir)
        .map_err(|e| HabitError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

/// Returns `~/.habit`.
///
/// # Errors
/// Returns an error if the home directory cannot be determined.
pub fn default_store_path() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(STORE_FILE_NAME))
        .ok_or_else(|| HabitError::DataDir("could not determine home directory".into()))
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> Result<PathBuf> {
    match path.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .ok_or_else(|| HabitError::DataDir("could not determine home directory".into())),
        None if path == "~" => dirs::home_dir()
            .ok_or_else(|| HabitError::DataDir("could not determine home directory".into())),
        None => Ok(Path::new(path).to_path_buf()),
    }
}
