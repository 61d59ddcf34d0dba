use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::clock::to_datetime;

/// Marker stored for every completed tree.
pub const TREE_MARKER: &str = "🌲";

const POSITION_MIN: f64 = 5.0;
const POSITION_SPAN: f64 = 90.0;
const SCALE_MIN: f64 = 0.9;
const SCALE_SPAN: f64 = 0.3;

/// A percentage coordinate, stored as `"NN.NN%"`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percent(pub f64);

impl Percent {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(f64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Percent(n)),
            Raw::Text(text) => text
                .trim()
                .trim_end_matches('%')
                .trim()
                .parse::<f64>()
                .map(Percent)
                .map_err(serde::de::Error::custom),
        }
    }
}

/// One completed focus session, drawn as a tree in the forest.
///
/// Entries are immutable once planted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestEntry {
    /// Completion time in epoch milliseconds.
    pub id: i64,
    pub date: DateTime<Utc>,
    pub tree: String,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<Percent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<Percent>,
}

fn default_scale() -> f64 {
    1.0
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

impl ForestEntry {
    /// Plant a tree for a session completed at `completed_at_ms`, with a
    /// random position in 5..95% and a random scale in 0.9..1.2.
    pub fn plant<R: Rng + ?Sized>(rng: &mut R, completed_at_ms: u64) -> Self {
        let top = round_to(POSITION_MIN + rng.gen::<f64>() * POSITION_SPAN, 2);
        let left = round_to(POSITION_MIN + rng.gen::<f64>() * POSITION_SPAN, 2);
        let scale = round_to(SCALE_MIN + rng.gen::<f64>() * SCALE_SPAN, 3);
        Self {
            id: completed_at_ms as i64,
            date: to_datetime(completed_at_ms),
            tree: TREE_MARKER.to_string(),
            rotation: 0.0,
            scale,
            top: Some(Percent(top)),
            left: Some(Percent(left)),
        }
    }

    /// Stored position, or a deterministic spot derived from the entry's
    /// index in the list when it has none.
    pub fn position(&self, index: usize) -> (Percent, Percent) {
        let top = self
            .top
            .unwrap_or_else(|| Percent(((index * 40) % 90) as f64));
        let left = self
            .left
            .unwrap_or_else(|| Percent(((index * 20) % 80) as f64));
        (top, left)
    }
}
