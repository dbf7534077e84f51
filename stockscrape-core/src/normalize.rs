//! Numeric normalizer — raw table text to `f64`.
//!
//! The normalizer is total: every input produces a value. Text that does not
//! parse yields `0.0` together with a [`NumericParseFailure`] so the caller can
//! record it as a warning instead of losing it in a log stream.
//!
//! Two grammars are supported:
//! - `Baseline`: trailing `%` (÷100), `M` (×1e6), `B` (×1e9), else plain decimal.
//! - `Extended`: baseline plus thousands separators, parenthesized negatives,
//!   and `K` (×1e3) / `T` (×1e12) suffixes. Opt-in per schema.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which suffixes and decorations the normalizer accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitGrammar {
    #[default]
    Baseline,
    Extended,
}

/// Unit detected on a numeric token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitClass {
    Plain,
    Percent,
    Thousands,
    Millions,
    Billions,
    Trillions,
}

impl UnitClass {
    /// True for the K/M/B/T magnitude suffixes.
    pub fn is_magnitude(self) -> bool {
        matches!(
            self,
            UnitClass::Thousands | UnitClass::Millions | UnitClass::Billions | UnitClass::Trillions
        )
    }

    fn apply(self, number: f64) -> f64 {
        match self {
            UnitClass::Plain => number,
            UnitClass::Percent => number / 100.0,
            UnitClass::Thousands => number * 1e3,
            UnitClass::Millions => number * 1e6,
            UnitClass::Billions => number * 1e9,
            UnitClass::Trillions => number * 1e12,
        }
    }
}

/// A parsed numeric value with the unit it was written in.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericToken {
    pub raw: String,
    pub unit: UnitClass,
    pub value: f64,
}

/// Text that matched no recognized numeric pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("not a recognized number: {raw:?}")]
pub struct NumericParseFailure {
    pub raw: String,
}

/// Outcome of a total normalization: always a value, maybe a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub value: f64,
    pub unit: UnitClass,
    pub failure: Option<NumericParseFailure>,
}

impl Normalized {
    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// Normalize with the baseline grammar.
pub fn normalize(raw: &str) -> Normalized {
    UnitGrammar::Baseline.normalize(raw)
}

impl UnitGrammar {
    /// Total normalization: `0.0` plus a failure record when `raw` does not parse.
    pub fn normalize(self, raw: &str) -> Normalized {
        match self.tokenize(raw) {
            Ok(token) => Normalized {
                value: token.value,
                unit: token.unit,
                failure: None,
            },
            Err(failure) => {
                tracing::debug!(raw = %failure.raw, grammar = ?self, "numeric text did not parse");
                Normalized {
                    value: 0.0,
                    unit: UnitClass::Plain,
                    failure: Some(failure),
                }
            }
        }
    }

    /// Parse `raw` into a token, or report why it is not a number.
    pub fn tokenize(self, raw: &str) -> Result<NumericToken, NumericParseFailure> {
        let fail = || NumericParseFailure {
            raw: raw.to_string(),
        };

        let trimmed = raw.trim();
        let (negated, body) = match self {
            UnitGrammar::Extended => strip_parens(trimmed),
            UnitGrammar::Baseline => (false, trimmed),
        };
        let (body, unit) = self.split_unit(body);

        let number = match self {
            UnitGrammar::Baseline => parse_decimal(body),
            UnitGrammar::Extended => parse_decimal(&strip_separators(body).ok_or_else(fail)?),
        }
        .ok_or_else(fail)?;

        let number = if negated { -number } else { number };
        Ok(NumericToken {
            raw: raw.to_string(),
            unit,
            value: unit.apply(number),
        })
    }

    fn split_unit(self, s: &str) -> (&str, UnitClass) {
        let Some(last) = s.chars().last() else {
            return (s, UnitClass::Plain);
        };
        let unit = match (last, self) {
            ('%', _) => UnitClass::Percent,
            ('M', _) => UnitClass::Millions,
            ('B', _) => UnitClass::Billions,
            ('K', UnitGrammar::Extended) => UnitClass::Thousands,
            ('T', UnitGrammar::Extended) => UnitClass::Trillions,
            _ => return (s, UnitClass::Plain),
        };
        let body = &s[..s.len() - last.len_utf8()];
        match self {
            // The suffix must follow the number directly.
            UnitGrammar::Baseline => (body, unit),
            UnitGrammar::Extended => (body.trim_end(), unit),
        }
    }
}

/// Finite decimal only: `inf`/`NaN` spellings count as failures.
fn parse_decimal(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn strip_parens(s: &str) -> (bool, &str) {
    match s.strip_prefix('(').and_then(|inner| inner.strip_suffix(')')) {
        Some(inner) => (true, inner.trim()),
        None => (false, s),
    }
}

/// Remove `,` thousands separators. Each group after the first must be three digits.
fn strip_separators(s: &str) -> Option<String> {
    if !s.contains(',') {
        return Some(s.to_string());
    }
    let int_end = s.find('.').unwrap_or(s.len());
    let (int_part, frac_part) = s.split_at(int_end);
    let mut groups = int_part.split(',');
    let head = groups.next()?;
    let head_digits = head.trim_start_matches(|c| c == '-' || c == '+');
    if head_digits.is_empty()
        || head_digits.len() > 3
        || !head_digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let mut out = String::with_capacity(s.len());
    out.push_str(head);
    for group in groups {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        out.push_str(group);
    }
    if frac_part.contains(',') {
        return None;
    }
    out.push_str(frac_part);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn baseline_suffixes() {
        assert_eq!(normalize("12.5%").value, 0.125);
        assert_eq!(normalize("3M").value, 3_000_000.0);
        assert_eq!(normalize("2B").value, 2_000_000_000.0);
        assert_eq!(normalize("100").value, 100.0);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let out = normalize("  1.5B \n");
        assert!(out.is_ok());
        assert_eq!(out.unit, UnitClass::Billions);
        assert_eq!(out.value, 1_500_000_000.0);
    }

    #[test]
    fn unparseable_yields_zero_and_one_failure() {
        let out = normalize("n/a");
        assert_eq!(out.value, 0.0);
        assert_eq!(
            out.failure,
            Some(NumericParseFailure {
                raw: "n/a".to_string()
            })
        );
    }

    #[test]
    fn bare_suffix_is_a_failure() {
        for raw in ["%", "M", "B", "", "   ", "--"] {
            let out = normalize(raw);
            assert_eq!(out.value, 0.0, "{raw:?}");
            assert!(out.failure.is_some(), "{raw:?}");
        }
    }

    #[test]
    fn non_finite_spellings_are_failures() {
        for raw in ["inf", "NaN", "-infinity"] {
            assert!(normalize(raw).failure.is_some(), "{raw:?}");
        }
    }

    #[test]
    fn baseline_rejects_extended_forms() {
        for raw in ["1,234", "(5.2)", "3K", "1.1T", "1.5 B", "12.5 %", "3 M"] {
            let out = normalize(raw);
            assert_eq!(out.value, 0.0, "{raw:?}");
            assert!(out.failure.is_some(), "{raw:?}");
        }
    }

    #[test]
    fn negative_values() {
        assert!(approx(normalize("-4.2%").value, -0.042));
        assert_eq!(normalize("-7M").value, -7_000_000.0);
    }

    #[test]
    fn extended_grammar() {
        let g = UnitGrammar::Extended;
        assert_eq!(g.normalize("1,234,567").value, 1_234_567.0);
        assert_eq!(g.normalize("(1,234.5)").value, -1_234.5);
        assert_eq!(g.normalize("3K").value, 3_000.0);
        assert_eq!(g.normalize("2.5T").value, 2.5e12);
        assert_eq!(g.normalize("(2M)").value, -2_000_000.0);
        assert_eq!(g.normalize("12.5%").value, 0.125);
        assert_eq!(g.normalize("1.5 B").value, 1.5e9);
        assert!(g.normalize("12.5 %").failure.is_none());
    }

    #[test]
    fn extended_rejects_malformed_separators() {
        let g = UnitGrammar::Extended;
        for raw in ["1,23", "12,3456", "1.000,5", ",100"] {
            assert!(g.normalize(raw).failure.is_some(), "{raw:?}");
        }
    }

    #[test]
    fn magnitude_units() {
        assert!(UnitClass::Millions.is_magnitude());
        assert!(!UnitClass::Percent.is_magnitude());
        assert!(!UnitClass::Plain.is_magnitude());
    }
}
