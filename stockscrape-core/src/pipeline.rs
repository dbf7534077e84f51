//! One section, end to end: fetch every page, dispatch selectors, bind.
//!
//! Fetching and binding are separate steps so a caller can observe the
//! `Fetched` state in between. Extraction results are plain data and may cross
//! threads; parsed documents never leave [`fetch_section`].

use serde::{Deserialize, Serialize};

use crate::bind::{bind, bind_rows, BoundFields};
use crate::config::SectionConfig;
use crate::data::{DocumentFetcher, FetchError};
use crate::dispatch::{dispatch, ExtractionResult};
use crate::domain::{SectionKind, SectionRecord};
use crate::schema::Schema;
use crate::warning::BindingWarning;

/// A bound section with its soft failures and the schema versions used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOutput {
    pub record: SectionRecord,
    pub warnings: Vec<BindingWarning>,
    /// Schema fingerprint per page.
    pub fingerprints: Vec<String>,
}

impl SectionOutput {
    pub fn kind(&self) -> SectionKind {
        self.record.kind()
    }
}

/// Fetch and dispatch every page of a section.
///
/// The first failing page aborts the section; no partial extraction is
/// returned.
pub fn fetch_section(
    fetcher: &dyn DocumentFetcher,
    section: &SectionConfig,
    symbol: &str,
) -> Result<Vec<ExtractionResult>, FetchError> {
    let mut extractions = Vec::with_capacity(section.pages.len());
    for page in &section.pages {
        let url = page.url_for(symbol);
        let doc = fetcher.fetch(&url)?;
        extractions.push(dispatch(&doc, &page.selectors));
    }
    Ok(extractions)
}

/// Bind a section's extractions (one per page, in page order) into its record.
///
/// Field pages merge into one record; row pages concatenate. A page whose
/// layout does not suit the section contributes nothing.
pub fn bind_section(section: &SectionConfig, extractions: &[ExtractionResult]) -> SectionOutput {
    let mut fields = BoundFields::new();
    let mut rows: Vec<BoundFields> = Vec::new();
    let mut warnings = Vec::new();

    for (page, extraction) in section.pages.iter().zip(extractions) {
        match &page.schema {
            Schema::Fields(schema) => {
                let (bound, w) = bind(extraction, schema);
                fields.extend(bound);
                warnings.extend(w);
            }
            Schema::Rows(schema) => {
                let (bound, w) = bind_rows(extraction, schema);
                rows.extend(bound);
                warnings.extend(w);
            }
        }
    }

    let record = match section.kind {
        SectionKind::Profile => SectionRecord::Profile(fields.decode(&mut warnings)),
        SectionKind::Statistics => SectionRecord::Statistics(fields.decode(&mut warnings)),
        SectionKind::Financial => SectionRecord::Financial(fields.decode(&mut warnings)),
        SectionKind::News => {
            SectionRecord::News(rows.iter().map(|r| r.decode(&mut warnings)).collect())
        }
        SectionKind::HistoricalSeries => {
            SectionRecord::HistoricalSeries(rows.iter().map(|r| r.decode(&mut warnings)).collect())
        }
    };

    SectionOutput {
        record,
        warnings,
        fingerprints: section.fingerprints(),
    }
}

/// [`fetch_section`] then [`bind_section`].
pub fn run_section(
    fetcher: &dyn DocumentFetcher,
    section: &SectionConfig,
    symbol: &str,
) -> Result<SectionOutput, FetchError> {
    let extractions = fetch_section(fetcher, section, symbol)?;
    Ok(bind_section(section, &extractions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageConfig;
    use crate::data::StaticFetcher;
    use crate::dispatch::SelectorSet;
    use crate::schema::{FieldSchema, RowSchema, ValueType};

    fn news_section() -> SectionConfig {
        SectionConfig {
            kind: SectionKind::News,
            pages: vec![PageConfig {
                url: "https://n.test/{symbol}/news".into(),
                selectors: SelectorSet::from_pairs([("title", "h3"), ("summary", "p")]).unwrap(),
                schema: Schema::Rows(
                    RowSchema::new()
                        .column("title", "title", ValueType::Text)
                        .column("summary", "summary", ValueType::Text),
                ),
            }],
        }
    }

    #[test]
    fn rows_decode_into_news_items() {
        let fetcher = StaticFetcher::new().page(
            "https://n.test/ABC/news",
            "<h3>A</h3><p>x</p><h3>B</h3><p>y</p>",
        );
        let out = run_section(&fetcher, &news_section(), "ABC").unwrap();
        let SectionRecord::News(items) = &out.record else {
            panic!("expected news");
        };
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].title, "B");
        assert_eq!(items[1].summary, "y");
        assert!(out.warnings.is_empty());
        assert_eq!(out.fingerprints.len(), 1);
    }

    #[test]
    fn failing_page_fails_the_section() {
        let section = SectionConfig {
            kind: SectionKind::Profile,
            pages: vec![
                PageConfig {
                    url: "https://p.test/one".into(),
                    selectors: SelectorSet::from_pairs([("name", "h1")]).unwrap(),
                    schema: Schema::Fields(FieldSchema::over("name").field("name", ValueType::Text, 0)),
                },
                PageConfig {
                    url: "https://p.test/two".into(),
                    selectors: SelectorSet::from_pairs([("sector", "dd")]).unwrap(),
                    schema: Schema::Fields(FieldSchema::over("sector").field("sector", ValueType::Text, 0)),
                },
            ],
        };
        let fetcher = StaticFetcher::new().page("https://p.test/one", "<h1>Acme</h1>");
        let err = run_section(&fetcher, &section, "X").unwrap_err();
        assert_eq!(err.url(), Some("https://p.test/two"));
    }

    #[test]
    fn field_pages_merge_into_one_record() {
        let section = SectionConfig {
            kind: SectionKind::Profile,
            pages: vec![
                PageConfig {
                    url: "https://p.test/one".into(),
                    selectors: SelectorSet::from_pairs([("name", "h1")]).unwrap(),
                    schema: Schema::Fields(FieldSchema::over("name").field("name", ValueType::Text, 0)),
                },
                PageConfig {
                    url: "https://p.test/two".into(),
                    selectors: SelectorSet::from_pairs([("sector", "dd")]).unwrap(),
                    schema: Schema::Fields(FieldSchema::over("sector").field("sector", ValueType::Text, 0)),
                },
            ],
        };
        let fetcher = StaticFetcher::new()
            .page("https://p.test/one", "<h1>Acme</h1>")
            .page("https://p.test/two", "<dl><dd>Materials</dd></dl>");
        let out = run_section(&fetcher, &section, "X").unwrap();
        let SectionRecord::Profile(profile) = out.record else {
            panic!("expected profile");
        };
        assert_eq!(profile.name, "Acme");
        assert_eq!(profile.sector, "Materials");
    }
}
