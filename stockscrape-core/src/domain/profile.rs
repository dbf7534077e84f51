//! Company profile.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub sector: String,
    pub description: String,
    pub upcoming_events: Vec<String>,
    pub recent_events: Vec<String>,
}
