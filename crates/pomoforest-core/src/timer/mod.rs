mod session;
mod stage;

pub use session::{Session, SessionStatus, Transition};
pub use stage::{format_clock, tree_stage, TreeStage};

/// Length of one focus session in seconds (25 minutes).
pub const FOCUS_DURATION_SECS: u32 = 25 * 60;
