//! Soft binding failures. These are recorded and returned, never raised.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A field-level problem found while binding an extraction onto a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingWarning {
    /// The selector key is absent, or its list has no entry at the schema position.
    #[error("{field}: no value in {key:?} at {index:?}")]
    MissingSource {
        field: String,
        key: String,
        index: Option<usize>,
    },

    /// The list length differs from what the schema's highest index implies.
    #[error("{key:?} has {actual} values, schema expects {expected}")]
    SchemaLengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("{field}: {raw:?} is not a recognized number")]
    NumericParseFailure { field: String, raw: String },

    #[error("{field}: {raw:?} is not a recognized date")]
    DateParseFailure { field: String, raw: String },

    /// Positionally correlated columns differ in length; rows were truncated.
    #[error("row columns differ in length {lengths:?}, kept {kept} rows")]
    ListLengthMismatch {
        lengths: BTreeMap<String, usize>,
        kept: usize,
    },

    /// Bound values could not be decoded into the section's record type.
    #[error("bound fields do not fit the record: {detail}")]
    RecordShape { detail: String },
}

impl BindingWarning {
    pub fn is_missing_source(&self) -> bool {
        matches!(self, BindingWarning::MissingSource { .. })
    }

    pub fn is_length_mismatch(&self) -> bool {
        matches!(self, BindingWarning::SchemaLengthMismatch { .. })
    }

    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            BindingWarning::NumericParseFailure { .. } | BindingWarning::DateParseFailure { .. }
        )
    }

    pub fn is_list_mismatch(&self) -> bool {
        matches!(self, BindingWarning::ListLengthMismatch { .. })
    }
}
