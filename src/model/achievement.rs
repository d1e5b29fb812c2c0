//! Achievement types: collectibles unlocked by fishing activity.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// An entry of the fixed achievement catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// An achievement a user has earned, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedAchievement {
    pub achievement_id: String,
    pub unlocked_at: Timestamp,
}
