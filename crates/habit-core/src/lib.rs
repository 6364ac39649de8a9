//! # Habit Core Library
//!
//! This library provides the core business logic for `habit`, a command line
//! utility that reinforces habits through variable, randomized rewards.
//! The `habit` binary is a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Record codec**: one habit per line, tab-delimited, with escaping for
//!   tabs and newlines inside free-text fields
//! - **Gate engine**: decides when a habit's score has earned its reward
//! - **Storage**: a flat-file store rewritten atomically on every mutation,
//!   plus TOML-based configuration
//!
//! ## Key Components
//!
//! - [`HabitStore`]: Add / List / Record / UpdateReward / Delete
//! - [`HabitRecord`]: one persisted habit
//! - [`check_gate`]: gate progression rule
//! - [`Config`]: Application configuration management

pub mod error;
pub mod gate;
pub mod points;
pub mod record;
pub mod storage;

pub use error::{ConfigError, HabitError, Result};
pub use gate::{check_gate, points_to_next_gate, GateCheck, GATE_SIZE};
pub use record::{FieldProblem, HabitRecord, ParseError, RecordField};
pub use storage::{Config, HabitStore, Mutation, RecordOutcome};
