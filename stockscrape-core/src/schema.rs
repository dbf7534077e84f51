//! Positional schemas — the one place that knows "index 2 of `s_data` is the
//! profit margin, as a percentage".
//!
//! Two layouts exist:
//! - [`FieldSchema`]: each named field reads one position of a flat bucket.
//! - [`RowSchema`]: several buckets are zipped positionally into rows.
//!
//! Schemas are plain data (TOML in the site presets) and carry a blake3
//! fingerprint so a page-layout revision is visible in every report.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::normalize::UnitGrammar;

/// Declared magnitude for `scaled_float(M|B)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scale {
    M,
    B,
}

impl Scale {
    pub fn factor(self) -> f64 {
        match self {
            Scale::M => 1e6,
            Scale::B => 1e9,
        }
    }
}

/// How a matched string becomes a record value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Text,
    /// Monetary amount kept verbatim, e.g. `"1.2B"`.
    CurrencyText,
    PercentFloat,
    /// Normalized; an unsuffixed number is taken to be in the declared scale.
    ScaledFloat(Scale),
    PlainFloat,
    /// The whole bucket as a list. Takes no index.
    TextList,
    /// One row split on whitespace with the first `n` label tokens dropped.
    Columns(usize),
    /// One row of label tokens followed by numeric cells.
    FloatRow,
    /// `Oct 15, 2024` or `2024-10-15`.
    Date,
}

impl ValueType {
    /// Whether the type reads a single position (and therefore needs an index).
    pub fn is_positional(self) -> bool {
        !matches!(self, ValueType::TextList)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            ValueType::PercentFloat | ValueType::ScaledFloat(_) | ValueType::PlainFloat
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value type {0:?}")]
pub struct ValueTypeParseError(pub String);

impl FromStr for ValueType {
    type Err = ValueTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ValueTypeParseError(s.to_string());
        let t = s.trim();
        let simple = match t {
            "text" => Some(ValueType::Text),
            "currency_text" => Some(ValueType::CurrencyText),
            "percent_float" => Some(ValueType::PercentFloat),
            "plain_float" => Some(ValueType::PlainFloat),
            "text_list" => Some(ValueType::TextList),
            "float_row" => Some(ValueType::FloatRow),
            "date" => Some(ValueType::Date),
            _ => None,
        };
        if let Some(v) = simple {
            return Ok(v);
        }

        let (name, arg) = t
            .strip_suffix(')')
            .and_then(|rest| rest.split_once('('))
            .ok_or_else(err)?;
        match (name, arg.trim()) {
            ("scaled_float", "M" | "m") => Ok(ValueType::ScaledFloat(Scale::M)),
            ("scaled_float", "B" | "b") => Ok(ValueType::ScaledFloat(Scale::B)),
            ("columns", n) => n.parse().map(ValueType::Columns).map_err(|_| err()),
            _ => Err(err()),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Text => f.write_str("text"),
            ValueType::CurrencyText => f.write_str("currency_text"),
            ValueType::PercentFloat => f.write_str("percent_float"),
            ValueType::ScaledFloat(Scale::M) => f.write_str("scaled_float(M)"),
            ValueType::ScaledFloat(Scale::B) => f.write_str("scaled_float(B)"),
            ValueType::PlainFloat => f.write_str("plain_float"),
            ValueType::TextList => f.write_str("text_list"),
            ValueType::Columns(n) => write!(f, "columns({n})"),
            ValueType::FloatRow => f.write_str("float_row"),
            ValueType::Date => f.write_str("date"),
        }
    }
}

impl Serialize for ValueType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One named field read from one position of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Record field path; dots address nested records.
    pub field: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Selector key; defaults to the schema's `key`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// Ordered table of `(field, type, position)` over one or more flat buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    /// Default selector key for fields that do not name one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub grammar: UnitGrammar,
    pub fields: Vec<FieldSpec>,
}

impl FieldSchema {
    /// Schema whose fields read from `key` unless they say otherwise.
    pub fn over(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn with_grammar(mut self, grammar: UnitGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    /// Append a positional field on the default key.
    pub fn field(mut self, field: &str, value_type: ValueType, index: usize) -> Self {
        self.fields.push(FieldSpec {
            field: field.to_string(),
            value_type,
            key: None,
            index: Some(index),
        });
        self
    }

    /// Append a field on an explicit key. `index` is `None` for whole-list types.
    pub fn field_from(
        mut self,
        key: &str,
        field: &str,
        value_type: ValueType,
        index: Option<usize>,
    ) -> Self {
        self.fields.push(FieldSpec {
            field: field.to_string(),
            value_type,
            key: Some(key.to_string()),
            index,
        });
        self
    }

    /// Selector key a field reads from.
    pub fn key_of<'a>(&'a self, spec: &'a FieldSpec) -> Option<&'a str> {
        spec.key.as_deref().or(self.key.as_deref())
    }

    /// Per key, the list length implied by the highest declared index.
    pub fn expected_lengths(&self) -> BTreeMap<&str, usize> {
        let mut out: BTreeMap<&str, usize> = BTreeMap::new();
        for spec in &self.fields {
            let (Some(key), Some(index)) = (self.key_of(spec), spec.index) else {
                continue;
            };
            if !spec.value_type.is_positional() {
                continue;
            }
            let len = out.entry(key).or_insert(0);
            *len = (*len).max(index + 1);
        }
        out
    }
}

/// One column of a row layout: every entry of `key` feeds `field` of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub key: String,
}

/// Several buckets zipped by position into a list of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSchema {
    #[serde(default)]
    pub grammar: UnitGrammar,
    pub columns: Vec<ColumnSpec>,
}

impl RowSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_grammar(mut self, grammar: UnitGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub fn column(mut self, key: &str, field: &str, value_type: ValueType) -> Self {
        self.columns.push(ColumnSpec {
            field: field.to_string(),
            value_type,
            key: key.to_string(),
        });
        self
    }
}

/// A page's schema in either layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum Schema {
    Fields(FieldSchema),
    Rows(RowSchema),
}

impl Schema {
    /// Selector keys the schema reads, in declaration order (may repeat).
    pub fn keys(&self) -> Vec<&str> {
        match self {
            Schema::Fields(s) => s.fields.iter().filter_map(|f| s.key_of(f)).collect(),
            Schema::Rows(s) => s.columns.iter().map(|c| c.key.as_str()).collect(),
        }
    }

    /// Record field paths the schema writes.
    pub fn field_paths(&self) -> Vec<&str> {
        match self {
            Schema::Fields(s) => s.fields.iter().map(|f| f.field.as_str()).collect(),
            Schema::Rows(s) => s.columns.iter().map(|c| c.field.as_str()).collect(),
        }
    }

    /// Content hash of the schema table (hex, 64 chars).
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("schema serialization is infallible");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}
