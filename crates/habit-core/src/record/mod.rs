//! Habit records and their line format.

pub mod codec;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use codec::{decode, decode_bytes, encode};

/// One habit as persisted in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitRecord {
    /// Unique within a store, allocated as max + 1
    pub id: u64,
    pub name: String,
    /// Treat to claim when the next gate is passed
    pub reward: String,
    pub score: u64,
    #[serde(rename = "gates")]
    pub gates_passed: u64,
}

impl HabitRecord {
    /// A freshly added habit: no points, no gates.
    pub fn new(id: u64, name: impl Into<String>, reward: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            reward: reward.into(),
            score: 0,
            gates_passed: 0,
        }
    }
}

/// The five fields of a record line, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordField {
    Id,
    Name,
    Reward,
    Score,
    Gates,
}

impl RecordField {
    pub const ALL: [RecordField; 5] = [
        RecordField::Id,
        RecordField::Name,
        RecordField::Reward,
        RecordField::Score,
        RecordField::Gates,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordField::Id => "id",
            RecordField::Name => "name",
            RecordField::Reward => "reward",
            RecordField::Score => "score",
            RecordField::Gates => "gates",
        }
    }
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is wrong with one part of a record line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// The line ended before this field
    Missing(RecordField),
    /// A numeric field held something other than a non-negative integer
    NotANumber { field: RecordField, value: String },
    /// The line has more than five tab-separated fields
    FieldCount(usize),
    /// The line is not UTF-8 text
    InvalidUtf8,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing(field) => write!(f, "{field} is missing"),
            FieldProblem::NotANumber { field, value } => {
                write!(f, "{field} is not a non-negative integer: '{value}'")
            }
            FieldProblem::FieldCount(n) => write!(f, "expected 5 fields, found {n}"),
            FieldProblem::InvalidUtf8 => f.write_str("line is not valid UTF-8"),
        }
    }
}

/// A line that could not be decoded into a [`HabitRecord`].
///
/// Every problem on the line is reported, not just the first one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub problems: Vec<FieldProblem>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("malformed record: ")?;
        for (i, problem) in self.problems.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}
