//! Gate engine.
//!
//! A gate is a score threshold at every multiple of [`GATE_SIZE`]. Crossing
//! one earns the habit's reward. A single completion passes at most one gate,
//! even when the score jump skips past several thresholds; the remaining
//! gates are picked up one per later completion.

use serde::{Deserialize, Serialize};

/// Points between two consecutive gates.
pub const GATE_SIZE: u64 = 15;

/// Outcome of a gate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateCheck {
    /// Gates passed after the check
    pub gates_passed: u64,
    /// Whether this check passed a new gate
    pub crossed: bool,
}

/// Decide whether `score` earns a new gate given the gates already passed.
pub fn check_gate(score: u64, gates_passed: u64) -> GateCheck {
    let crossed = score / GATE_SIZE > gates_passed;
    GateCheck {
        gates_passed: if crossed { gates_passed + 1 } else { gates_passed },
        crossed,
    }
}

/// Points still needed before the next gate can be passed.
///
/// Zero when a gate is already pending, i.e. the next completion passes one
/// regardless of the increment drawn.
pub fn points_to_next_gate(score: u64, gates_passed: u64) -> u64 {
    gates_passed
        .saturating_add(1)
        .saturating_mul(GATE_SIZE)
        .saturating_sub(score)
}
