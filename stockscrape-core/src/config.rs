//! Site configuration: per section, the pages to fetch and how to read them.
//!
//! Everything site-specific lives here as data: URL templates, selector sets
//! and positional schemas. The built-in Yahoo preset is a TOML file compiled
//! into the crate; a custom site is another TOML file of the same shape.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::{SelectorError, SelectorSet, RAW_KEY};
use crate::domain::SectionKind;
use crate::schema::{Schema, ValueType};

const YAHOO_PRESET: &str = include_str!("../presets/yahoo.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse site TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0}")]
    Selector(#[from] SelectorError),

    #[error("section {0} is configured more than once")]
    DuplicateSection(SectionKind),

    #[error("section {0} has no pages")]
    NoPages(SectionKind),

    #[error("section {section}: pages must use the {expected} layout")]
    LayoutMismatch {
        section: SectionKind,
        expected: &'static str,
    },

    #[error("section {section}: field {field} names no selector key")]
    MissingKey { section: SectionKind, field: String },

    #[error("section {section}: schema reads {key:?}, which the page's selectors do not declare")]
    UndeclaredKey { section: SectionKind, key: String },

    #[error("section {section}: field {field} has type {value_type} but no index")]
    MissingIndex {
        section: SectionKind,
        field: String,
        value_type: ValueType,
    },

    #[error("section {section}: {field} is not a field of the section record")]
    UnknownField { section: SectionKind, field: String },

    #[error("section {section}: column {field} cannot have type {value_type}")]
    UnsupportedType {
        section: SectionKind,
        field: String,
        value_type: ValueType,
    },
}

/// One page of a section: where it lives, what to match, how to bind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// URL template; `{symbol}` is replaced with the instrument symbol.
    pub url: String,
    /// Empty means "return the raw document under `__raw__`".
    #[serde(default)]
    pub selectors: SelectorSet,
    pub schema: Schema,
}

impl PageConfig {
    pub fn url_for(&self, symbol: &str) -> String {
        self.url.replace("{symbol}", symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub kind: SectionKind,
    pub pages: Vec<PageConfig>,
}

impl SectionConfig {
    /// Schema fingerprint of each page, in page order.
    pub fn fingerprints(&self) -> Vec<String> {
        self.pages.iter().map(|p| p.schema.fingerprint()).collect()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let section = self.kind;
        if self.pages.is_empty() {
            return Err(ConfigError::NoPages(section));
        }
        let known: BTreeSet<String> = section.field_paths().into_iter().collect();

        for page in &self.pages {
            if page.selectors.contains(RAW_KEY) {
                return Err(SelectorError::ReservedName(RAW_KEY.to_string()).into());
            }

            match (&page.schema, section.is_row_layout()) {
                (Schema::Rows(rows), true) => {
                    for column in &rows.columns {
                        if !column.value_type.is_positional() {
                            return Err(ConfigError::UnsupportedType {
                                section,
                                field: column.field.clone(),
                                value_type: column.value_type,
                            });
                        }
                    }
                }
                (Schema::Fields(fields), false) => {
                    for spec in &fields.fields {
                        if fields.key_of(spec).is_none() {
                            return Err(ConfigError::MissingKey {
                                section,
                                field: spec.field.clone(),
                            });
                        }
                        if spec.value_type.is_positional() && spec.index.is_none() {
                            return Err(ConfigError::MissingIndex {
                                section,
                                field: spec.field.clone(),
                                value_type: spec.value_type,
                            });
                        }
                    }
                }
                (_, true) => {
                    return Err(ConfigError::LayoutMismatch {
                        section,
                        expected: "rows",
                    })
                }
                (_, false) => {
                    return Err(ConfigError::LayoutMismatch {
                        section,
                        expected: "fields",
                    })
                }
            }

            for key in page.schema.keys() {
                let declared = if page.selectors.is_empty() {
                    key == RAW_KEY
                } else {
                    page.selectors.contains(key)
                };
                if !declared {
                    return Err(ConfigError::UndeclaredKey {
                        section,
                        key: key.to_string(),
                    });
                }
            }

            for field in page.schema.field_paths() {
                if !known.contains(field) {
                    return Err(ConfigError::UnknownField {
                        section,
                        field: field.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A site: named, versioned list of section configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    #[serde(default)]
    pub version: String,
    pub sections: Vec<SectionConfig>,
}

impl SiteConfig {
    /// The built-in Yahoo Finance preset.
    pub fn yahoo() -> Result<Self, ConfigError> {
        Self::from_toml(YAHOO_PRESET)
    }

    /// Load and validate a site from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a site from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let site: SiteConfig = toml::from_str(content)?;
        site.validate()?;
        Ok(site)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for section in &self.sections {
            if !seen.insert(section.kind) {
                return Err(ConfigError::DuplicateSection(section.kind));
            }
            section.validate()?;
        }
        Ok(())
    }

    pub fn section(&self, kind: SectionKind) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Keep only the listed sections (configuration order is preserved).
    pub fn only(mut self, kinds: &[SectionKind]) -> Self {
        self.sections.retain(|s| kinds.contains(&s.kind));
        self
    }

    /// Site-level label for reports, e.g. `yahoo@2024-10`.
    pub fn label(&self) -> String {
        if self.version.is_empty() {
            self.name.clone()
        } else {
            format!("{}@{}", self.name, self.version)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        name = "test"

        [[sections]]
        kind = "statistics"

        [[sections.pages]]
        url = "https://example.test/{symbol}/stats"

        [sections.pages.selectors]
        s_data = "td.value"

        [sections.pages.schema]
        layout = "fields"
        key = "s_data"
        fields = [
            { field = "fiscal_year_end", type = "text", index = 0 },
            { field = "profit_margin", type = "percent_float", index = 2 },
        ]
    "#;

    #[test]
    fn yahoo_preset_is_valid() {
        let site = SiteConfig::yahoo().unwrap();
        assert_eq!(site.name, "yahoo");
        let kinds: Vec<_> = site.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SectionKind::ALL);
        assert_eq!(site.section(SectionKind::Financial).unwrap().pages.len(), 2);
    }

    #[test]
    fn minimal_site_parses() {
        let site = SiteConfig::from_toml(MINIMAL).unwrap();
        let page = &site.sections[0].pages[0];
        assert_eq!(page.url_for("VEDL.NS"), "https://example.test/VEDL.NS/stats");
        assert_eq!(site.label(), "test");
    }

    #[test]
    fn undeclared_key_is_rejected() {
        let toml_str = MINIMAL.replace(r#"key = "s_data""#, r#"key = "cells""#);
        let err = SiteConfig::from_toml(&toml_str).unwrap_err();
        assert!(
            matches!(err, ConfigError::UndeclaredKey { ref key, .. } if key == "cells"),
            "{err}"
        );
    }

    #[test]
    fn unknown_record_field_is_rejected() {
        let toml_str = MINIMAL.replace("profit_margin", "profit_marign");
        let err = SiteConfig::from_toml(&toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownField { .. }), "{err}");
    }

    #[test]
    fn scalar_field_without_index_is_rejected() {
        let toml_str = MINIMAL.replace(r#"type = "text", index = 0"#, r#"type = "text""#);
        let err = SiteConfig::from_toml(&toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::MissingIndex { .. }), "{err}");
    }

    #[test]
    fn invalid_css_fails_to_parse() {
        let toml_str = MINIMAL.replace("td.value", "td[");
        assert!(matches!(
            SiteConfig::from_toml(&toml_str).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn row_section_requires_rows_layout() {
        let toml_str = MINIMAL.replace(r#"kind = "statistics""#, r#"kind = "news""#);
        let err = SiteConfig::from_toml(&toml_str).unwrap_err();
        assert!(
            matches!(err, ConfigError::LayoutMismatch { expected: "rows", .. }),
            "{err}"
        );
    }

    #[test]
    fn duplicate_sections_are_rejected() {
        let mut site = SiteConfig::from_toml(MINIMAL).unwrap();
        site.sections.push(site.sections[0].clone());
        assert!(matches!(
            site.validate().unwrap_err(),
            ConfigError::DuplicateSection(SectionKind::Statistics)
        ));
    }

    #[test]
    fn only_filters_sections() {
        let site = SiteConfig::yahoo()
            .unwrap()
            .only(&[SectionKind::News, SectionKind::Profile]);
        let kinds: Vec<_> = site.sections.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, [SectionKind::Profile, SectionKind::News]);
    }

    #[test]
    fn fingerprints_are_per_page() {
        let site = SiteConfig::yahoo().unwrap();
        let prints = site.section(SectionKind::Financial).unwrap().fingerprints();
        assert_eq!(prints.len(), 2);
        assert_ne!(prints[0], prints[1]);
    }
}
