use crate::numeric::Numeric;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A single spreadsheet cell as handed over by the grid reader.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// The cell rendered as text. Numbers use their shortest display form,
    /// so `1234.0` becomes `"1234"`.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Empty => Cow::Borrowed(""),
            CellValue::Number(n) => Cow::Owned(n.to_string()),
            CellValue::Text(s) => Cow::Borrowed(s.as_str()),
        }
    }

    /// True for empty cells and text cells holding only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Number(_) => false,
            CellValue::Text(s) => s.trim().is_empty(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// One input row keyed by normalized column name, in source column order.
pub type RawRow = IndexMap<String, CellValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    MonthHeader,
    MarketHeader,
    CountryHeader,
    RegionHeader,
    NoiseRow,
    DataRow,
}

impl Verdict {
    pub fn is_header(&self) -> bool {
        matches!(
            self,
            Verdict::MonthHeader
                | Verdict::MarketHeader
                | Verdict::CountryHeader
                | Verdict::RegionHeader
        )
    }
}

/// A data row stamped with the context that was active when it was read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRow {
    pub month: String,
    pub market_or_region: String,
    pub country: Option<String>,
    /// The trimmed primary-column text (agency name).
    pub entity: String,
    pub entity_group: Option<String>,
    /// Non-numeric columns exactly as read.
    pub cells: RawRow,
    /// Numeric-designated columns after coercion.
    pub measures: IndexMap<String, Numeric>,
}

impl EnrichedRow {
    /// Calendar month number (1-12) when the month banner carries an English month name.
    pub fn month_number(&self) -> Option<u32> {
        crate::utils::month_number(&self.month)
    }

    /// Coerced value for a numeric column, `Missing` if the column was not designated.
    pub fn measure(&self, column: &str) -> Numeric {
        self.measures.get(column).copied().unwrap_or(Numeric::Missing)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseStats {
    pub rows_seen: usize,
    pub month_headers: usize,
    pub market_headers: usize,
    pub region_headers: usize,
    pub country_headers: usize,
    /// Month, market, region and country headers together.
    pub header_rows: usize,
    /// Country headers that were recognized only through approximate matching.
    pub fuzzy_countries: usize,
    pub noise_rows: usize,
    /// Data rows dropped because the required context was not active yet.
    pub orphaned_rows: usize,
    pub rows_emitted: usize,
}

impl ParseStats {
    pub(crate) fn record(&mut self, verdict: Verdict) {
        if verdict.is_header() {
            self.header_rows += 1;
        }
        match verdict {
            Verdict::MonthHeader => self.month_headers += 1,
            Verdict::MarketHeader => self.market_headers += 1,
            Verdict::RegionHeader => self.region_headers += 1,
            Verdict::CountryHeader => self.country_headers += 1,
            Verdict::NoiseRow => self.noise_rows += 1,
            Verdict::DataRow => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseOutput {
    pub rows: Vec<EnrichedRow>,
    pub stats: ParseStats,
}

impl ParseOutput {
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
