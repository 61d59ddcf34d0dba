//! # Pomoforest Core Library
//!
//! Business logic for the Pomoforest focus timer: a 25-minute session during
//! which a tree grows, and a persisted forest that gains one tree for every
//! session that runs to completion. The `pomoforest` CLI is a thin terminal
//! layer over this crate.
//!
//! ## Architecture
//!
//! - **Session**: a deadline-based state machine; the caller periodically
//!   invokes `check()` and the remaining time is recomputed from the deadline
//! - **Forest**: append-only history of completed sessions, stored as one
//!   JSON value in a key-value store (SQLite in production)
//! - **Audio**: ambient rain/fireplace loop gated by session status and mute
//! - **Controller / Driver**: the session component and its async loop
//!
//! ## Key Components
//!
//! - [`Session`]: focus session state machine
//! - [`HistoryStore`]: forest persistence
//! - [`AudioController`]: ambient sound gating
//! - [`FocusController`]: owns all of the above and applies side effects
//! - [`Config`]: application configuration management

pub mod audio;
pub mod clock;
pub mod controller;
pub mod driver;
pub mod error;
pub mod events;
pub mod forest;
pub mod storage;
pub mod timer;

pub use audio::{AudioBackend, AudioController, CommandPlayer, SilentPlayer, SoundType};
pub use clock::{Clock, ManualClock, TokioClock};
pub use controller::{Celebration, Command, FocusController, Snapshot};
pub use error::{AudioError, ConfigError, CoreError, DatabaseError};
pub use events::Event;
pub use forest::{ForestEntry, HistoryStore, Percent, DEFAULT_HISTORY_KEY};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use timer::{Session, SessionStatus, TreeStage, FOCUS_DURATION_SECS};
