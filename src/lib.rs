//! # Sectioned Report Parser
//!
//! A library for turning "pivot-style" spreadsheet exports, where month,
//! market/region and country are announced by banner rows between the data,
//! into flat rows that carry their full context.
//!
//! ## Core Concepts
//!
//! - **Header row**: a banner that changes the active context (`01-JANUARY`,
//!   `EUROPE_EUROPE MARKET`, `GERMANY`) and carries no data itself
//! - **Context**: the month/region/country inherited by following data rows
//! - **Noise row**: totals and known irrelevant banners, always dropped
//! - **Agency group**: the canonical bucket an agency name falls into through an
//!   ordered rule table
//! - **Approximate country match**: banners with a small typo are still resolved
//!   against the reference table, but only above a high similarity cutoff
//!
//! Reading and writing workbooks is left to the caller; this crate starts from
//! a grid of cells and ends with enriched rows.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sectioned_report_parser::*;
//!
//! let reference = ReferenceIndex::build(vec![
//!     ReferenceEntry::new("Germany", "Europe"),
//!     ReferenceEntry::new("Japan", "Asia"),
//! ]);
//!
//! let grid: Vec<Vec<CellValue>> = vec![
//!     vec!["AgencyGroup".into(), "Arrival Room".into()],
//!     vec!["01-JANUARY".into(), CellValue::Empty],
//!     vec!["GERMANY".into(), CellValue::Empty],
//!     vec!["ANEX-BERLIN".into(), "1.204,00".into()],
//! ];
//!
//! let config = ParserConfig::region_country_report();
//! let output = process_sectioned_report(&grid, &config, Some(&reference)).unwrap();
//! assert_eq!(output.rows[0].country.as_deref(), Some("Germany"));
//! ```

pub mod classifier;
pub mod config;
pub mod entity_groups;
pub mod error;
pub mod fuzzy;
pub mod ingestion;
pub mod normalize;
pub mod numeric;
pub mod reference;
pub mod schema;
pub mod utils;

pub use classifier::{month_banner, parse_rows, ParseContext, ParseMode, RowClass, SectionParser};
pub use config::*;
pub use entity_groups::{default_group_rules, EntityGroupMapper, GroupRule, DEFAULT_FALLBACK_GROUP};
pub use error::{Result, SectionParseError};
pub use fuzzy::{best_match, similarity, FuzzyMatch, DEFAULT_CUTOFF};
pub use ingestion::{locate_header_row, Table};
pub use normalize::{normalize_cell, normalize_column_name, CellText};
pub use numeric::{coerce, coerce_cell, MissingPolicy, Numeric, NumericConvention};
pub use reference::{ReferenceConflict, ReferenceEntry, ReferenceIndex};
pub use schema::*;
pub use utils::*;

use log::{debug, info};

pub struct SectionedReportProcessor;

impl SectionedReportProcessor {
    /// Locates the header row, builds the table and classifies every row below it.
    pub fn process(
        grid: &[Vec<CellValue>],
        config: &ParserConfig,
        reference: Option<&ReferenceIndex>,
    ) -> Result<ParseOutput> {
        config.validate()?;

        let table = Table::from_grid(grid, &config.header_row)?;
        if !table.is_empty() && !table.has_column(&config.primary_column) {
            return Err(SectionParseError::MissingColumn(config.primary_column.clone()));
        }

        info!(
            "Processing {:?} report: {} rows below the header row",
            config.hierarchy,
            table.len()
        );
        debug!("Columns: {}", table.columns().join(", "));

        parse_rows(config, reference, table.into_rows())
    }

    /// Builds a reference index from a grid whose first row names the
    /// `Country` and `Region` columns.
    pub fn load_reference(grid: &[Vec<CellValue>]) -> Result<ReferenceIndex> {
        let table = Table::from_header_row(grid, 0);
        let index = ReferenceIndex::from_table(&table)?;

        info!(
            "Reference table: {} countries across {} regions",
            index.country_count(),
            index.region_count()
        );
        if !index.conflicts().is_empty() {
            debug!(
                "{} countries were listed under more than one region",
                index.conflicts().len()
            );
        }

        Ok(index)
    }
}

pub fn process_sectioned_report(
    grid: &[Vec<CellValue>],
    config: &ParserConfig,
    reference: Option<&ReferenceIndex>,
) -> Result<ParseOutput> {
    SectionedReportProcessor::process(grid, config, reference)
}

pub fn load_reference_index(grid: &[Vec<CellValue>]) -> Result<ReferenceIndex> {
    SectionedReportProcessor::load_reference(grid)
}
