//! Field mapper / schema binder — extraction buckets to typed values.
//!
//! Binding never fails. A field that cannot be read keeps its zero value and
//! the reason is appended to the warning list.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::dispatch::ExtractionResult;
use crate::normalize::{UnitClass, UnitGrammar};
use crate::schema::{ColumnSpec, FieldSchema, RowSchema, ValueType};
use crate::warning::BindingWarning;

/// A single bound value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    TextList(Vec<String>),
    FloatList(Vec<f64>),
    Date(Option<NaiveDate>),
}

impl FieldValue {
    /// Zero value for a declared type: empty text, `0.0`, empty list, no date.
    pub fn zero(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Text | ValueType::CurrencyText => FieldValue::Text(String::new()),
            ValueType::PercentFloat | ValueType::ScaledFloat(_) | ValueType::PlainFloat => {
                FieldValue::Float(0.0)
            }
            ValueType::TextList | ValueType::Columns(_) => FieldValue::TextList(Vec::new()),
            ValueType::FloatRow => FieldValue::FloatList(Vec::new()),
            ValueType::Date => FieldValue::Date(None),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(s) => Value::String(s.clone()),
            FieldValue::Float(v) => Value::from(*v),
            FieldValue::TextList(v) => Value::from(v.clone()),
            FieldValue::FloatList(v) => Value::from(v.clone()),
            FieldValue::Date(Some(d)) => Value::String(d.format("%Y-%m-%d").to_string()),
            FieldValue::Date(None) => Value::Null,
        }
    }
}

/// Bound values keyed by record field path (`a.b` addresses a nested record).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundFields(BTreeMap<String, FieldValue>);

impl BoundFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, value: FieldValue) {
        self.0.insert(path.into(), value);
    }

    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.0.get(path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge another page's fields into this one. Later pages win on overlap.
    pub fn extend(&mut self, other: BoundFields) {
        self.0.extend(other.0);
    }

    /// Nested JSON object built from the dotted paths.
    pub fn to_json(&self) -> Value {
        let mut root = Map::new();
        for (path, value) in &self.0 {
            insert_path(&mut root, path, value.to_json());
        }
        Value::Object(root)
    }

    /// Decode into a record. A shape mismatch yields the zero record and a warning.
    pub fn decode<T: DeserializeOwned + Default>(&self, warnings: &mut Vec<BindingWarning>) -> T {
        match serde_json::from_value(self.to_json()) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(error = %e, "bound fields do not fit record");
                warnings.push(BindingWarning::RecordShape {
                    detail: e.to_string(),
                });
                T::default()
            }
        }
    }
}

fn insert_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            root.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = root
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            if let Value::Object(child) = slot {
                insert_path(child, rest, value);
            }
        }
    }
}

/// Bind a flat-bucket extraction onto a positional schema.
pub fn bind(extraction: &ExtractionResult, schema: &FieldSchema) -> (BoundFields, Vec<BindingWarning>) {
    let mut warnings = Vec::new();
    let mut fields = BoundFields::new();

    for (key, expected) in schema.expected_lengths() {
        if let Some(values) = extraction.get(key) {
            if values.len() != expected {
                warnings.push(BindingWarning::SchemaLengthMismatch {
                    key: key.to_string(),
                    expected,
                    actual: values.len(),
                });
            }
        }
    }

    for spec in &schema.fields {
        let missing = || BindingWarning::MissingSource {
            field: spec.field.clone(),
            key: schema.key_of(spec).unwrap_or_default().to_string(),
            index: spec.index,
        };
        let values = schema.key_of(spec).and_then(|key| extraction.get(key));

        let value = match (values, spec.value_type.is_positional()) {
            (None, _) => None,
            (Some(values), false) => Some(FieldValue::TextList(values.to_vec())),
            (Some(values), true) => spec
                .index
                .and_then(|i| values.get(i))
                .map(|raw| convert(raw, spec.value_type, schema.grammar, &spec.field, &mut warnings)),
        };

        let value = value.unwrap_or_else(|| {
            warnings.push(missing());
            FieldValue::zero(spec.value_type)
        });
        fields.insert(spec.field.clone(), value);
    }

    (fields, warnings)
}

/// Bind and decode into a record type in one step.
pub fn bind_record<T: DeserializeOwned + Default>(
    extraction: &ExtractionResult,
    schema: &FieldSchema,
) -> (T, Vec<BindingWarning>) {
    let (fields, mut warnings) = bind(extraction, schema);
    let record = fields.decode(&mut warnings);
    (record, warnings)
}

/// Zip column buckets positionally into rows.
///
/// Only `min(len)` rows over the present columns are produced; unequal lengths
/// add one `ListLengthMismatch`. Absent columns warn once and bind zero values.
pub fn bind_rows(extraction: &ExtractionResult, schema: &RowSchema) -> (Vec<BoundFields>, Vec<BindingWarning>) {
    let mut warnings = Vec::new();
    let mut columns: Vec<(&ColumnSpec, Option<&[String]>)> = Vec::with_capacity(schema.columns.len());
    let mut lengths: BTreeMap<String, usize> = BTreeMap::new();

    for column in &schema.columns {
        let values = extraction.get(&column.key);
        match values {
            Some(v) => {
                lengths.insert(column.key.clone(), v.len());
            }
            None => warnings.push(BindingWarning::MissingSource {
                field: column.field.clone(),
                key: column.key.clone(),
                index: None,
            }),
        }
        columns.push((column, values));
    }

    let kept = lengths.values().copied().min().unwrap_or(0);
    if lengths.values().any(|&len| len != kept) {
        warnings.push(BindingWarning::ListLengthMismatch {
            lengths: lengths.clone(),
            kept,
        });
    }

    let mut rows = Vec::with_capacity(kept);
    for i in 0..kept {
        let mut row = BoundFields::new();
        for (column, values) in &columns {
            let value = match values {
                Some(values) => {
                    let label = format!("{}[{i}]", column.field);
                    convert(&values[i], column.value_type, schema.grammar, &label, &mut warnings)
                }
                None => FieldValue::zero(column.value_type),
            };
            row.insert(column.field.clone(), value);
        }
        rows.push(row);
    }

    (rows, warnings)
}

/// Zip and decode each row into a record type.
pub fn bind_row_records<T: DeserializeOwned + Default>(
    extraction: &ExtractionResult,
    schema: &RowSchema,
) -> (Vec<T>, Vec<BindingWarning>) {
    let (rows, mut warnings) = bind_rows(extraction, schema);
    let records = rows.iter().map(|row| row.decode(&mut warnings)).collect();
    (records, warnings)
}

fn convert(
    raw: &str,
    value_type: ValueType,
    grammar: UnitGrammar,
    field: &str,
    warnings: &mut Vec<BindingWarning>,
) -> FieldValue {
    let mut number = |text: &str| -> f64 {
        let out = grammar.normalize(text);
        if out.failure.is_some() || !out.value.is_finite() {
            warnings.push(BindingWarning::NumericParseFailure {
                field: field.to_string(),
                raw: text.to_string(),
            });
            return 0.0;
        }
        out.value
    };

    match value_type {
        ValueType::Text | ValueType::CurrencyText => FieldValue::Text(raw.trim().to_string()),
        ValueType::PercentFloat | ValueType::PlainFloat => FieldValue::Float(number(raw)),
        ValueType::ScaledFloat(scale) => {
            let out = grammar.normalize(raw);
            let value = if out.failure.is_none() && out.unit == UnitClass::Plain {
                out.value * scale.factor()
            } else {
                out.value
            };
            if out.failure.is_some() || !value.is_finite() {
                warnings.push(BindingWarning::NumericParseFailure {
                    field: field.to_string(),
                    raw: raw.to_string(),
                });
                return FieldValue::Float(0.0);
            }
            FieldValue::Float(value)
        }
        ValueType::TextList => FieldValue::TextList(vec![raw.trim().to_string()]),
        ValueType::Columns(skip) => FieldValue::TextList(
            raw.split_whitespace().skip(skip).map(str::to_string).collect(),
        ),
        ValueType::FloatRow => {
            let cells: Vec<&str> = raw
                .split_whitespace()
                .skip_while(|token| !looks_numeric(token))
                .collect();
            FieldValue::FloatList(cells.into_iter().map(number).collect())
        }
        ValueType::Date => {
            let date = parse_date(raw);
            if date.is_none() {
                warnings.push(BindingWarning::DateParseFailure {
                    field: field.to_string(),
                    raw: raw.to_string(),
                });
            }
            FieldValue::Date(date)
        }
    }
}

/// First cell of a table row after its label: a number, or the `--` placeholder.
fn looks_numeric(token: &str) -> bool {
    if token == "--" {
        return true;
    }
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() => true,
        Some('-' | '+' | '(' | '.') => chars.next().is_some_and(|c| c.is_ascii_digit() || c == '.'),
        _ => false,
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%b %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%B %d, %Y"))
        .ok()
}
