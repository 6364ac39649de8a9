//! Read-filter-write transaction shared by every in-place mutation.
//!
//! The new store content is built completely in memory from the current
//! content before anything touches the disk, then committed by writing a temp
//! file next to the store and renaming it over the original. A failure at any
//! point leaves the original file as it was.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::is_blank;
use crate::gate::check_gate;
use crate::record::{self, HabitRecord};

/// A change to one habit, identified by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mutation {
    /// A completion: add `increment` points and check for a gate. When a gate
    /// is passed and `next_reward` is set, it replaces the claimed reward.
    Record {
        increment: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_reward: Option<String>,
    },
    /// Replace the reward text, nothing else
    UpdateReward { reward: String },
    /// Drop the habit
    Delete,
}

/// What a mutation did to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Updated {
        record: HabitRecord,
        gate_crossed: bool,
        /// Reward earned by passing a gate, as it read before the update
        claimed_reward: Option<String>,
    },
    Removed(HabitRecord),
}

impl Change {
    pub fn gate_crossed(&self) -> bool {
        matches!(
            self,
            Change::Updated {
                gate_crossed: true,
                ..
            }
        )
    }

    /// The record as written back, or as it was before removal.
    pub fn into_record(self) -> HabitRecord {
        match self {
            Change::Updated { record, .. } => record,
            Change::Removed(record) => record,
        }
    }
}

impl Mutation {
    fn apply(&self, record: HabitRecord) -> Change {
        match self {
            Mutation::Record {
                increment,
                next_reward,
            } => {
                let score = record.score.saturating_add(*increment);
                let gate = check_gate(score, record.gates_passed);
                if !gate.crossed {
                    return Change::Updated {
                        record: HabitRecord { score, ..record },
                        gate_crossed: false,
                        claimed_reward: None,
                    };
                }
                let reward = next_reward.clone().unwrap_or_else(|| record.reward.clone());
                Change::Updated {
                    claimed_reward: Some(record.reward.clone()),
                    record: HabitRecord {
                        reward,
                        score,
                        gates_passed: gate.gates_passed,
                        ..record
                    },
                    gate_crossed: true,
                }
            }
            Mutation::UpdateReward { reward } => Change::Updated {
                record: HabitRecord {
                    reward: reward.clone(),
                    ..record
                },
                gate_crossed: false,
                claimed_reward: None,
            },
            Mutation::Delete => Change::Removed(record),
        }
    }
}

/// New store content plus the change made, if any record matched.
#[derive(Debug)]
pub struct Plan {
    pub content: Vec<u8>,
    pub change: Option<Change>,
}

/// Build the new store content for `mutation` applied to habit `id`.
///
/// Only the first record carrying `id` is transformed. Every other line,
/// malformed ones included, is copied byte for byte, so a line that is not
/// even UTF-8 survives the rewrite. Blank lines are dropped.
pub fn plan(source: &[u8], id: u64, mutation: &Mutation) -> Plan {
    let mut content = Vec::with_capacity(source.len() + 64);
    let mut change = None;

    for (index, raw) in source.split_inclusive(|b| *b == b'\n').enumerate() {
        let line_no = index + 1;
        if is_blank(raw) {
            continue;
        }

        match record::decode_bytes(raw) {
            Ok(record) if record.id == id && change.is_none() => {
                let applied = mutation.apply(record);
                if let Change::Updated { record, .. } = &applied {
                    content.extend_from_slice(record::encode(record).as_bytes());
                }
                change = Some(applied);
            }
            Ok(record) => {
                if record.id == id {
                    warn!(line = line_no, id, "duplicate habit id, leaving this copy unchanged");
                }
                push_verbatim(&mut content, raw);
            }
            Err(e) => {
                warn!(line = line_no, "keeping malformed habit line as is: {e}");
                push_verbatim(&mut content, raw);
            }
        }
    }

    Plan { content, change }
}

fn push_verbatim(content: &mut Vec<u8>, raw: &[u8]) {
    content.extend_from_slice(raw);
    if !raw.ends_with(b"\n") {
        content.push(b'\n');
    }
}

/// Atomically replace the file at `path` with `content`.
pub fn commit(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".habit-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    tmp.write_all(content)?;
    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), bytes = content.len(), "committed habit store");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TWO: &[u8] = b"1\tread\tcoffee\t0\t0\n2\twalk\tnap\t14\t0\n";

    fn record(increment: u64) -> Mutation {
        Mutation::Record {
            increment,
            next_reward: None,
        }
    }

    #[test]
    fn record_updates_score_and_gate() {
        let plan = plan(TWO, 2, &record(3));
        assert_eq!(plan.content, b"1\tread\tcoffee\t0\t0\n2\twalk\tnap\t17\t1\n");
        let change = plan.change.unwrap();
        assert!(change.gate_crossed());
        assert!(matches!(
            change,
            Change::Updated { claimed_reward: Some(ref r), .. } if r == "nap"
        ));
    }

    #[test]
    fn next_reward_replaces_claimed_reward_on_gate() {
        let mutation = Mutation::Record {
            increment: 3,
            next_reward: Some("sauna".into()),
        };
        let plan = plan(TWO, 2, &mutation);
        assert_eq!(plan.content, b"1\tread\tcoffee\t0\t0\n2\twalk\tsauna\t17\t1\n");
        match plan.change.unwrap() {
            Change::Updated {
                record,
                gate_crossed,
                claimed_reward,
            } => {
                assert!(gate_crossed);
                assert_eq!(claimed_reward.as_deref(), Some("nap"));
                assert_eq!(record.reward, "sauna");
            }
            other => panic!("unexpected change: {other:?}"),
        }
    }

    #[test]
    fn next_reward_is_ignored_without_a_gate() {
        let mutation = Mutation::Record {
            increment: 2,
            next_reward: Some("cake".into()),
        };
        let plan = plan(TWO, 1, &mutation);
        assert_eq!(plan.content, b"1\tread\tcoffee\t2\t0\n2\twalk\tnap\t14\t0\n");
        assert!(matches!(
            plan.change,
            Some(Change::Updated {
                gate_crossed: false,
                claimed_reward: None,
                ..
            })
        ));
    }

    #[test]
    fn update_reward_touches_only_reward() {
        let plan = plan(
            TWO,
            1,
            &Mutation::UpdateReward {
                reward: "cake".into(),
            },
        );
        assert_eq!(plan.content, b"1\tread\tcake\t0\t0\n2\twalk\tnap\t14\t0\n");
        let change = plan.change.unwrap();
        assert!(!change.gate_crossed());
        assert_eq!(change.into_record().reward, "cake");
    }

    #[test]
    fn delete_omits_target_only() {
        let plan = plan(TWO, 1, &Mutation::Delete);
        assert_eq!(plan.content, b"2\twalk\tnap\t14\t0\n");
        assert_eq!(
            plan.change,
            Some(Change::Removed(HabitRecord::new(1, "read", "coffee")))
        );
    }

    #[test]
    fn missing_id_reproduces_source() {
        let plan = plan(TWO, 99, &record(5));
        assert!(plan.change.is_none());
        assert_eq!(plan.content, TWO);
    }

    #[test]
    fn malformed_lines_pass_through_verbatim() {
        let source = b"1\tread\tcoffee\t0\t0\nnot a habit\n2\twalk\tnap\t0\t0\n";
        let plan = plan(source, 2, &Mutation::Delete);
        assert_eq!(plan.content, b"1\tread\tcoffee\t0\t0\nnot a habit\n");
    }

    #[test]
    fn invalid_utf8_lines_pass_through_verbatim() {
        let source = b"1\tread\tcoffee\t0\t0\n\xff\tbad\n";
        let plan = plan(source, 1, &record(4));
        assert_eq!(plan.content, b"1\tread\tcoffee\t4\t0\n\xff\tbad\n");
    }

    #[test]
    fn only_first_duplicate_is_transformed() {
        let source = b"3\ta\tx\t0\t0\n3\tb\ty\t0\t0\n";
        let plan = plan(source, 3, &Mutation::Delete);
        assert_eq!(plan.content, b"3\tb\ty\t0\t0\n");
    }

    #[test]
    fn missing_final_newline_is_repaired() {
        let plan = plan(b"1\tread\tcoffee\t0\t0\n2\twalk\tnap\t0\t0", 1, &Mutation::Delete);
        assert_eq!(plan.content, b"2\twalk\tnap\t0\t0\n");
    }

    #[test]
    fn record_mutation_json_omits_unset_next_reward() {
        let json = serde_json::to_value(record(4)).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "record", "increment": 4 }));
        let parsed: Mutation = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, record(4));
    }

    #[test]
    fn commit_replaces_file_and_leaves_no_temp_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store");
        fs::write(&path, "old\n").unwrap();

        commit(&path, b"new\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
        let entries: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn commit_into_missing_directory_fails_cleanly() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent").join("store");
        assert!(commit(&path, b"x\n").is_err());
        assert!(!path.exists());
    }
}
