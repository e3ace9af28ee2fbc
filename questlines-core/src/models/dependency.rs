use serde::{Deserialize, Serialize};

/// Directed edge between two quests of the same questline.
///
/// Edges are stored verbatim; cycles are allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from: String,
    pub to: String,
}
