//! Focus session state machine.
//!
//! The session is deadline-based: entering `Running` fixes an absolute
//! deadline, and every `check()` recomputes the remaining seconds from it.
//! Nothing here owns a thread or a timer; the caller decides how often to
//! call `check()`.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//!         Running -> Completed -> Idle
//!         Running -> Failed    -> Idle
//! ```
//!
//! ## Usage
//!
//! ```
//! use pomoforest_core::timer::{Session, SessionStatus};
//!
//! let mut session = Session::new();
//! session.start(0);
//! session.check(1_500_000);
//! assert_eq!(session.status(), SessionStatus::Completed);
//! ```

use serde::{Deserialize, Serialize};

use super::stage::{format_clock, tree_stage, TreeStage};
use super::FOCUS_DURATION_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Idle,
    Running,
    Paused,
    Completed,
    Failed,
}

impl SessionStatus {
    /// `Completed` and `Failed` only leave through `reset`.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }

    /// Line shown above the tree for this status.
    pub fn message(self) -> &'static str {
        match self {
            SessionStatus::Idle => "Plant a seed of focus",
            SessionStatus::Running => "Breathe & Focus",
            SessionStatus::Paused => "Pause & Reflect",
            SessionStatus::Completed => "Mindfulness Achieved",
            SessionStatus::Failed => "Try Again",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionStatus::Idle => "IDLE",
            SessionStatus::Running => "RUNNING",
            SessionStatus::Paused => "PAUSED",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Failed => "FAILED",
        };
        f.pad(s)
    }
}

/// A successful state change. Rejected commands produce no transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    Resumed,
    Paused,
    GaveUp,
    Completed,
    Reset,
}

/// One focus session.
///
/// Only built through [`Session::new`] and [`Session::resume_from`], so
/// `remaining_secs` stays within `0..=FOCUS_DURATION_SECS` and is zero only
/// once `Completed`.
#[derive(Debug, Clone)]
pub struct Session {
    status: SessionStatus,
    remaining_secs: u32,
    /// Absolute deadline (ms since epoch). Only set while `Running`.
    deadline_ms: Option<u64>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A fresh `Idle` session with the full focus duration ahead.
    pub fn new() -> Self {
        Self {
            status: SessionStatus::Idle,
            remaining_secs: FOCUS_DURATION_SECS,
            deadline_ms: None,
        }
    }

    /// A `Paused` session with `remaining_secs` left, clamped to
    /// `1..=FOCUS_DURATION_SECS`.
    pub fn resume_from(remaining_secs: u32) -> Self {
        Self {
            status: SessionStatus::Paused,
            remaining_secs: remaining_secs.clamp(1, FOCUS_DURATION_SECS),
            deadline_ms: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    pub fn elapsed_secs(&self) -> u32 {
        FOCUS_DURATION_SECS.saturating_sub(self.remaining_secs)
    }

    pub fn tree_stage(&self) -> Option<TreeStage> {
        tree_stage(self.status, self.remaining_secs)
    }

    pub fn formatted_time(&self) -> String {
        format_clock(self.remaining_secs)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a fresh session or resume a paused one.
    pub fn start(&mut self, now_ms: u64) -> Option<Transition> {
        let transition = match self.status {
            SessionStatus::Idle => Transition::Started,
            SessionStatus::Paused => Transition::Resumed,
            _ => return None,
        };
        self.status = SessionStatus::Running;
        self.deadline_ms = Some(now_ms + u64::from(self.remaining_secs) * 1000);
        Some(transition)
    }

    /// Freeze the countdown. If the deadline has already passed the session
    /// completes instead.
    pub fn pause(&mut self, now_ms: u64) -> Option<Transition> {
        if self.status != SessionStatus::Running {
            return None;
        }
        if let Some(done) = self.check(now_ms) {
            return Some(done);
        }
        self.status = SessionStatus::Paused;
        self.deadline_ms = None;
        Some(Transition::Paused)
    }

    /// Abandon a running session. If the deadline has already passed the
    /// session completes instead.
    pub fn give_up(&mut self, now_ms: u64) -> Option<Transition> {
        if self.status != SessionStatus::Running {
            return None;
        }
        if let Some(done) = self.check(now_ms) {
            return Some(done);
        }
        self.status = SessionStatus::Failed;
        self.deadline_ms = None;
        Some(Transition::GaveUp)
    }

    /// Back to `Idle` with the full duration. Only from a terminal state.
    pub fn reset(&mut self) -> Option<Transition> {
        if !self.status.is_terminal() {
            return None;
        }
        *self = Self::new();
        Some(Transition::Reset)
    }

    /// Recompute the remaining time from the deadline.
    ///
    /// Returns `Some(Transition::Completed)` exactly once, on the check that
    /// reaches zero.
    pub fn check(&mut self, now_ms: u64) -> Option<Transition> {
        if self.status != SessionStatus::Running {
            return None;
        }
        let deadline = self.deadline_ms?;
        let left_ms = deadline.saturating_sub(now_ms);
        let left_secs = left_ms.div_ceil(1000).min(u64::from(self.remaining_secs)) as u32;
        self.remaining_secs = left_secs;
        if left_secs == 0 {
            self.status = SessionStatus::Completed;
            self.deadline_ms = None;
            return Some(Transition::Completed);
        }
        None
    }
}
