//! Habit store commands for CLI.

use std::path::PathBuf;

use clap::Subcommand;
use habit_core::points::rewards_rng;
use habit_core::{points_to_next_gate, Config, HabitRecord, HabitStore};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Add a new habit
    Add {
        /// What you want to do regularly
        name: String,
        /// Treat to claim at the first gate
        reward: String,
    },
    /// List habits
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one habit
    Show {
        /// Habit ID
        id: u64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record that you performed a habit
    Done {
        /// Habit ID
        id: u64,
        /// Reward to aim for next, applied only if this completion passes a gate
        #[arg(long)]
        reward: Option<String>,
    },
    /// Change the reward of a habit
    Reward {
        /// Habit ID
        id: u64,
        /// New reward
        reward: String,
    },
    /// Delete a habit
    Delete {
        /// Habit ID
        id: u64,
    },
}

pub fn run(
    action: HabitAction,
    file: Option<PathBuf>,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = match file {
        Some(path) => HabitStore::open(path)?,
        None => HabitStore::open_default(config)?,
    };

    match action {
        HabitAction::Add { name, reward } => {
            let id = store.add(&name, &reward)?;
            println!("Habit added: {id}");
        }
        HabitAction::List { json } => {
            let habits = store.list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habits)?);
            } else if habits.is_empty() {
                println!("No habits found.");
            } else {
                for habit in &habits {
                    print_summary(habit);
                }
            }
        }
        HabitAction::Show { id, json } => {
            let habit = store.get(id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&habit)?);
            } else {
                print_summary(&habit);
                println!("      reward: {}", habit.reward);
            }
        }
        HabitAction::Done { id, reward } => {
            let mut rng = rewards_rng(config.rewards.seed);
            let next_requested = reward.is_some();
            let outcome = store.record_with_next_reward(id, &mut rng, reward)?;
            let habit = &outcome.record;
            println!(
                "{}: +{} points, you now have {} points",
                habit.name, outcome.increment, habit.score
            );

            match outcome.claimed_reward {
                Some(claimed) => {
                    println!("You've passed a gate, well done");
                    println!("Treat yourself to: {claimed}");
                    if next_requested {
                        println!("Next reward: {}", habit.reward);
                    } else {
                        println!("Pick a new reward with: habit reward {id} <REWARD>");
                    }
                }
                None => println!(
                    "{} points to the next gate",
                    points_to_next_gate(habit.score, habit.gates_passed)
                ),
            }
        }
        HabitAction::Reward { id, reward } => {
            let habit = store.update_reward(id, &reward)?;
            println!("Reward for '{}' is now: {}", habit.name, habit.reward);
        }
        HabitAction::Delete { id } => {
            let habit = store.delete(id)?;
            println!("Habit {} ('{}') deleted.", habit.id, habit.name);
        }
    }

    Ok(())
}

fn print_summary(habit: &HabitRecord) {
    println!(
        "{:>4}) {}  [points: {}, gates: {}, next gate in {}]",
        habit.id,
        habit.name,
        habit.score,
        habit.gates_passed,
        points_to_next_gate(habit.score, habit.gates_passed)
    );
}
