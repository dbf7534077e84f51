//! Sections and the aggregate record they merge into.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::{Financial, HistoricalPoint, NewsItem, Profile, Statistics};

/// One logical category of data, fetched and bound independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Profile,
    News,
    Statistics,
    HistoricalSeries,
    Financial,
}

impl SectionKind {
    pub const ALL: [SectionKind; 5] = [
        SectionKind::Profile,
        SectionKind::News,
        SectionKind::Statistics,
        SectionKind::HistoricalSeries,
        SectionKind::Financial,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Profile => "profile",
            SectionKind::News => "news",
            SectionKind::Statistics => "statistics",
            SectionKind::HistoricalSeries => "historical_series",
            SectionKind::Financial => "financial",
        }
    }

    /// Sections whose record is a list of rows rather than one struct.
    pub fn is_row_layout(self) -> bool {
        matches!(self, SectionKind::News | SectionKind::HistoricalSeries)
    }

    /// Field paths a schema for this section may write.
    pub fn field_paths(self) -> Vec<String> {
        match self {
            SectionKind::Profile => field_paths::<Profile>(),
            SectionKind::News => field_paths::<NewsItem>(),
            SectionKind::Statistics => field_paths::<Statistics>(),
            SectionKind::HistoricalSeries => field_paths::<HistoricalPoint>(),
            SectionKind::Financial => field_paths::<Financial>(),
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown section {0:?} (expected profile, news, statistics, historical_series or financial)")]
pub struct SectionKindParseError(pub String);

impl FromStr for SectionKind {
    type Err = SectionKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "profile" => Ok(SectionKind::Profile),
            "news" => Ok(SectionKind::News),
            "statistics" | "stats" => Ok(SectionKind::Statistics),
            "historical_series" | "history" => Ok(SectionKind::HistoricalSeries),
            "financial" | "financials" => Ok(SectionKind::Financial),
            _ => Err(SectionKindParseError(s.to_string())),
        }
    }
}

/// The bound output of one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "section", content = "data", rename_all = "snake_case")]
pub enum SectionRecord {
    Profile(Profile),
    News(Vec<NewsItem>),
    Statistics(Statistics),
    HistoricalSeries(Vec<HistoricalPoint>),
    Financial(Financial),
}

impl SectionRecord {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionRecord::Profile(_) => SectionKind::Profile,
            SectionRecord::News(_) => SectionKind::News,
            SectionRecord::Statistics(_) => SectionKind::Statistics,
            SectionRecord::HistoricalSeries(_) => SectionKind::HistoricalSeries,
            SectionRecord::Financial(_) => SectionKind::Financial,
        }
    }
}

/// Everything known about one instrument after a run.
///
/// Each section owns one slot; a section that did not bind leaves its slot at
/// the zero value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockRecord {
    pub symbol: String,
    pub profile: Profile,
    pub news: Vec<NewsItem>,
    pub statistics: Statistics,
    pub history: Vec<HistoricalPoint>,
    pub financial: Financial,
}

impl StockRecord {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Self::default()
        }
    }

    /// Move a section's record into its slot. Sections never share a slot, so
    /// merge order does not matter.
    pub fn merge(&mut self, section: SectionRecord) {
        match section {
            SectionRecord::Profile(p) => self.profile = p,
            SectionRecord::News(n) => self.news = n,
            SectionRecord::Statistics(s) => self.statistics = s,
            SectionRecord::HistoricalSeries(h) => self.history = h,
            SectionRecord::Financial(f) => self.financial = f,
        }
    }
}

/// Leaf field paths of a record's zero value, nested records joined with `.`.
pub fn field_paths<T: Serialize + Default>() -> Vec<String> {
    let value = serde_json::to_value(T::default()).unwrap_or(Value::Null);
    let mut out = Vec::new();
    collect_paths("", &value, &mut out);
    out
}

fn collect_paths(prefix: &str, value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect_paths(&path, child, out);
            }
        }
        _ if !prefix.is_empty() => out.push(prefix.to_string()),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_paths_descend_into_nested_records() {
        let paths = SectionKind::Statistics.field_paths();
        assert!(paths.contains(&"profit_margin".to_string()));
        assert!(paths.contains(&"valuation_metrics.market_cap".to_string()));
        assert!(!paths.contains(&"valuation_metrics".to_string()));
        assert_eq!(paths.iter().filter(|p| !p.contains('.')).count(), 44);

        let paths = SectionKind::Financial.field_paths();
        assert!(paths.contains(&"income_statement.total_revenue".to_string()));
        assert!(paths.contains(&"balance_sheet.net_debt".to_string()));
    }

    #[test]
    fn section_names_parse_with_aliases() {
        for kind in SectionKind::ALL {
            assert_eq!(kind.as_str().parse::<SectionKind>().unwrap(), kind);
        }
        assert_eq!("history".parse::<SectionKind>().unwrap(), SectionKind::HistoricalSeries);
        assert!("quotes".parse::<SectionKind>().is_err());
    }

    #[test]
    fn merge_order_does_not_matter() {
        let profile = SectionRecord::Profile(Profile {
            name: "Vedanta Limited".into(),
            ..Profile::default()
        });
        let news = SectionRecord::News(vec![NewsItem {
            title: "A".into(),
            ..NewsItem::default()
        }]);

        let mut a = StockRecord::new("VEDL.NS");
        a.merge(profile.clone());
        a.merge(news.clone());
        let mut b = StockRecord::new("VEDL.NS");
        b.merge(news);
        b.merge(profile);
        assert_eq!(a, b);
    }

    #[test]
    fn section_record_reports_its_kind() {
        assert_eq!(
            SectionRecord::HistoricalSeries(Vec::new()).kind(),
            SectionKind::HistoricalSeries
        );
    }
}
