use crate::error::{Result, SectionParseError};
use crate::ingestion::Table;
use crate::normalize::normalize_cell;
use crate::utils::title_case;
use indexmap::IndexMap;
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReferenceEntry {
    pub country: String,
    pub region: String,
}

impl ReferenceEntry {
    pub fn new(country: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            country: country.into(),
            region: region.into(),
        }
    }
}

/// A country listed twice with different regions. The later region is the one kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceConflict {
    pub country: String,
    pub replaced_region: String,
    pub region: String,
}

#[derive(Debug, Clone)]
struct CountryRecord {
    display: String,
    region: String,
}

/// Lookup structures built once from the region/country reference table.
///
/// Safe to share read-only between parallel parses.
#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    countries: IndexMap<String, CountryRecord>,
    regions: IndexMap<String, String>,
    conflicts: Vec<ReferenceConflict>,
}

impl ReferenceIndex {
    pub fn build<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = ReferenceEntry>,
    {
        let mut index = Self::default();

        for entry in entries {
            let country = normalize_cell(&entry.country);
            if country.is_empty() {
                debug!("Skipping reference entry without a country (region '{}')", entry.region);
                continue;
            }
            let region_title = title_case(entry.region.trim());
            let region_upper = normalize_cell(&region_title);
            if region_upper.is_empty() {
                warn!(
                    "Reference table lists '{}' without a region; entry skipped",
                    country.upper()
                );
                continue;
            }

            let record = CountryRecord {
                display: country.title(),
                region: region_title.clone(),
            };

            // IndexMap keeps the first-seen position when a key is overwritten.
            if let Some(previous) = index.countries.insert(country.upper().to_string(), record) {
                if previous.region != region_title {
                    warn!(
                        "Reference table lists '{}' under both '{}' and '{}'; keeping '{}'",
                        country.upper(),
                        previous.region,
                        region_title,
                        region_title
                    );
                    index.conflicts.push(ReferenceConflict {
                        country: country.upper().to_string(),
                        replaced_region: previous.region,
                        region: region_title.clone(),
                    });
                }
            }

            index
                .regions
                .entry(region_upper.upper().to_string())
                .or_insert(region_title);
        }

        debug!(
            "Reference index built: {} countries across {} regions",
            index.countries.len(),
            index.regions.len()
        );

        index
    }

    /// Builds the index from an ingested table with `country` and `region` columns.
    pub fn from_table(table: &Table) -> Result<Self> {
        for column in ["country", "region"] {
            if !table.has_column(column) {
                return Err(SectionParseError::MissingColumn(column.to_string()));
            }
        }

        let entries: Vec<ReferenceEntry> = table
            .rows()
            .iter()
            .map(|row| {
                let text = |key: &str| {
                    row.get(key)
                        .map(|cell| cell.as_text().into_owned())
                        .unwrap_or_default()
                };
                ReferenceEntry::new(text("country"), text("region"))
            })
            .collect();

        Ok(Self::build(entries))
    }

    /// Region for an uppercase country key, as a title-cased display string.
    pub fn region_for_exact(&self, country_upper: &str) -> Option<&str> {
        self.countries
            .get(country_upper)
            .map(|record| record.region.as_str())
    }

    /// Uppercase country keys in first-insertion order.
    pub fn candidate_country_keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.countries.keys().map(String::as_str)
    }

    pub fn display_form(&self, country_upper: &str) -> Option<&str> {
        self.countries
            .get(country_upper)
            .map(|record| record.display.as_str())
    }

    /// Title-cased region when the uppercase text names a region of the table.
    pub fn region_for_label(&self, text_upper: &str) -> Option<&str> {
        self.regions.get(text_upper).map(String::as_str)
    }

    pub fn conflicts(&self) -> &[ReferenceConflict] {
        &self.conflicts
    }

    pub fn country_count(&self) -> usize {
        self.countries.len()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}
