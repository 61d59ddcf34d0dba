use serde::{Deserialize, Serialize};

use super::session::SessionStatus;
use super::FOCUS_DURATION_SECS;

const SPROUT_AFTER_SECS: u32 = 8 * 60;
const SAPLING_AFTER_SECS: u32 = 16 * 60;
const FULL_TREE_AFTER_SECS: u32 = 25 * 60;

/// Visual growth marker of the tree in the current session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeStage {
    Seedling,
    Sprout,
    Sapling,
    FullTree,
    Wilted,
}

impl TreeStage {
    pub fn emoji(self) -> &'static str {
        match self {
            TreeStage::Seedling => "🌱",
            TreeStage::Sprout => "🌿",
            TreeStage::Sapling => "🌳",
            TreeStage::FullTree => "🌲",
            TreeStage::Wilted => "🥀",
        }
    }

    /// 1..=4 for the growth stages, `None` for a wilted tree.
    pub fn growth_level(self) -> Option<u8> {
        match self {
            TreeStage::Seedling => Some(1),
            TreeStage::Sprout => Some(2),
            TreeStage::Sapling => Some(3),
            TreeStage::FullTree => Some(4),
            TreeStage::Wilted => None,
        }
    }
}

/// Derive the tree stage from the session status and remaining time.
pub fn tree_stage(status: SessionStatus, remaining_secs: u32) -> Option<TreeStage> {
    match status {
        SessionStatus::Idle => None,
        SessionStatus::Failed => Some(TreeStage::Wilted),
        SessionStatus::Completed => Some(TreeStage::FullTree),
        SessionStatus::Running | SessionStatus::Paused => {
            let elapsed = FOCUS_DURATION_SECS.saturating_sub(remaining_secs);
            let stage = if elapsed < SPROUT_AFTER_SECS {
                TreeStage::Seedling
            } else if elapsed < SAPLING_AFTER_SECS {
                TreeStage::Sprout
            } else if elapsed < FULL_TREE_AFTER_SECS {
                TreeStage::Sapling
            } else {
                TreeStage::FullTree
            };
            Some(stage)
        }
    }
}

/// `mm:ss`, both fields zero-padded.
pub fn format_clock(remaining_secs: u32) -> String {
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}
