use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dependency::Dependency;
use super::quest::Quest;
use crate::error::StoreError;

/// A questline aggregate: the root row plus every quest, objective and
/// dependency it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Questline {
    pub id: String,
    pub name: String,
    pub quests: Vec<Quest>,
    pub dependencies: Vec<Dependency>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Request body for creating or replacing a questline.
///
/// Timestamps sent by clients are ignored; the repository owns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestlineInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub quests: Vec<Quest>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl QuestlineInput {
    /// Reject quests or objectives without an id.
    pub fn validate(&self) -> Result<(), StoreError> {
        for (i, quest) in self.quests.iter().enumerate() {
            if quest.id.is_empty() {
                return Err(StoreError::Validation(format!(
                    "quest at index {i} ('{}') has an empty id",
                    quest.title
                )));
            }
            if let Some(j) = quest.objectives.iter().position(|o| o.id.is_empty()) {
                return Err(StoreError::Validation(format!(
                    "objective at index {j} of quest '{}' has an empty id",
                    quest.id
                )));
            }
        }
        Ok(())
    }
}

impl From<Questline> for QuestlineInput {
    fn from(questline: Questline) -> Self {
        Self {
            id: Some(questline.id),
            name: questline.name,
            quests: questline.quests,
            dependencies: questline.dependencies,
        }
    }
}

/// List-view projection of a questline; computed, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestlineInfo {
    pub id: String,
    pub name: String,
    pub updated: DateTime<Utc>,
    pub total_quests: i64,
    pub completed_quests: i64,
}
