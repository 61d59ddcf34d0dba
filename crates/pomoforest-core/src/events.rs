use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::audio::SoundType;
use crate::controller::Snapshot;
use crate::forest::ForestEntry;

/// Every state change in the system produces an Event.
/// The presentation layer renders from these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionResumed {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    SessionPaused {
        remaining_secs: u32,
        at: DateTime<Utc>,
    },
    /// The user gave up; the tree wilts.
    SessionFailed {
        elapsed_secs: u32,
        at: DateTime<Utc>,
    },
    /// The countdown reached zero and a tree was planted.
    SessionCompleted {
        entry: ForestEntry,
        forest_size: usize,
        at: DateTime<Utc>,
    },
    SessionReset {
        at: DateTime<Utc>,
    },
    /// The visible second changed while running.
    Countdown {
        remaining_secs: u32,
        formatted_time: String,
        at: DateTime<Utc>,
    },
    SoundChanged {
        sound: SoundType,
        at: DateTime<Utc>,
    },
    MuteChanged {
        muted: bool,
        at: DateTime<Utc>,
    },
    StateSnapshot(Snapshot),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::to_datetime;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::SessionPaused {
            remaining_secs: 1200,
            at: to_datetime(0),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "SessionPaused");
        assert_eq!(json["remaining_secs"], 1200);

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
