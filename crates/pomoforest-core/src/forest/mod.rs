//! The persisted forest: one tree per completed focus session.

mod entry;
mod store;

pub use entry::{ForestEntry, Percent, TREE_MARKER};
pub use store::HistoryStore;

/// Storage key the forest history is kept under.
pub const DEFAULT_HISTORY_KEY: &str = "pomodoro_forest_history";
