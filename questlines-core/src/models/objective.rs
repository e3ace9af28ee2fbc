use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Objective {
    pub id: String,
    #[serde(skip)]
    pub quest_id: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Display position within the owning quest; lower sorts first.
    #[serde(default)]
    pub sort_index: i64,
}
