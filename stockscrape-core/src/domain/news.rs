//! News headlines.

use serde::{Deserialize, Serialize};

/// One headline, zipped from parallel title/summary/ticker/time/image columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub ticker: String,
    pub time: String,
    /// Thumbnail URL, empty when the item has none.
    pub image: String,
}
