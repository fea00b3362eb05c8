use crate::entity_groups::{default_group_rules, GroupRule, DEFAULT_FALLBACK_GROUP};
use crate::error::{Result, SectionParseError};
use crate::fuzzy::DEFAULT_CUTOFF;
use crate::numeric::{MissingPolicy, NumericConvention};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum HierarchyMode {
    #[schemars(
        description = "Banner rows name a flat market (e.g. 'EUROPE_EUROPE MARKET' -> 'EUROPE'). No country level."
    )]
    MarketOnly,

    #[schemars(
        description = "Banner rows name a region or a country from the reference table. A region banner clears the active country; a country banner sets both."
    )]
    RegionCountry,
}

/// How the column-header row is recognized inside the raw grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "match", content = "text", rename_all = "snake_case")]
pub enum HeaderMatch {
    #[schemars(description = "The cell text equals this value exactly.")]
    Exact(String),

    #[schemars(description = "The cell text contains this value.")]
    Contains(String),
}

impl HeaderMatch {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            HeaderMatch::Exact(expected) => text.trim() == expected,
            HeaderMatch::Contains(needle) => text.contains(needle.as_str()),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            HeaderMatch::Exact(expected) => format!("exactly '{}'", expected),
            HeaderMatch::Contains(needle) => format!("text containing '{}'", needle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HeaderLocator {
    #[schemars(description = "Zero-based column scanned for the header row.")]
    pub column: usize,
    pub matcher: HeaderMatch,
}

/// Raw banner text and the market/region name it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HeaderLabel {
    pub label: String,
    pub canonical: String,
}

impl HeaderLabel {
    pub fn new(label: &str, canonical: &str) -> Self {
        Self {
            label: label.to_string(),
            canonical: canonical.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NumericColumns {
    #[schemars(description = "Only these columns are numeric. Names absent from the input are ignored.")]
    Listed(Vec<String>),

    #[schemars(description = "Every column except the primary column and these names is numeric.")]
    AllExcept(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct NumericPolicy {
    pub columns: NumericColumns,
    pub convention: NumericConvention,
    pub missing: MissingPolicy,
}

impl NumericPolicy {
    pub fn is_numeric(&self, column: &str, primary_column: &str) -> bool {
        if column == primary_column {
            return false;
        }
        match &self.columns {
            NumericColumns::Listed(names) => names.iter().any(|n| n == column),
            NumericColumns::AllExcept(names) => !names.iter().any(|n| n == column),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MonthCase {
    #[default]
    AsIs,
    Title,
}

/// Everything that steers a parse. Nothing is read from the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ParserConfig {
    pub hierarchy: HierarchyMode,

    pub header_row: HeaderLocator,

    #[schemars(description = "Normalized name of the column holding banners and agency names.")]
    pub primary_column: String,

    #[schemars(description = "Ordered banner label table. The first label equal to the uppercased text wins.")]
    #[serde(default)]
    pub header_labels: Vec<HeaderLabel>,

    #[schemars(description = "A row whose text contains any of these tokens is dropped.")]
    #[serde(default = "default_noise_tokens")]
    pub noise_tokens: Vec<String>,

    #[schemars(description = "A row whose text equals any of these labels is dropped.")]
    #[serde(default = "default_noise_labels")]
    pub noise_labels: Vec<String>,

    #[serde(default = "default_group_rules")]
    pub group_rules: Vec<GroupRule>,

    #[serde(default = "default_fallback_group")]
    pub fallback_group: String,

    #[schemars(description = "Stamp each data row with its agency group.")]
    #[serde(default)]
    pub group_entities: bool,

    pub numeric: NumericPolicy,

    #[serde(default = "default_fuzzy_cutoff")]
    pub fuzzy_cutoff: f64,

    #[serde(default)]
    pub month_case: MonthCase,

    #[schemars(description = "Drop data rows that have a region but no active country.")]
    #[serde(default)]
    pub require_country: bool,
}

fn default_noise_tokens() -> Vec<String> {
    ["TOTAL", "USER", "UTOPIA", "GRAND"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_noise_labels() -> Vec<String> {
    vec!["UK_UNITED KINGDOM".to_string()]
}

fn default_fallback_group() -> String {
    DEFAULT_FALLBACK_GROUP.to_string()
}

fn default_fuzzy_cutoff() -> f64 {
    DEFAULT_CUTOFF
}

pub fn default_market_labels() -> Vec<HeaderLabel> {
    vec![
        HeaderLabel::new("CIS_COMMONWEALTH OF INDEPENDENT STATES", "CIS"),
        HeaderLabel::new("DOMESTIC_DOMESTIC", "DOMESTIC"),
        HeaderLabel::new("EUROPE_EUROPE MARKET", "EUROPE"),
        HeaderLabel::new("MIDDLEEAST_MIDDLE EAST MARKET", "ORTA DOĞU"),
        HeaderLabel::new("OTHER_OTHER MARKETS", "OTHER"),
        HeaderLabel::new("FAR EASTERN_UZAK DOGU ULKERI", "FAR EAST"),
        HeaderLabel::new("FAR EASTER_UZAK DOGU ULKERI", "FAR EAST"),
    ]
}

pub fn default_market_numeric_columns() -> Vec<String> {
    [
        "arrival_room",
        "arrival_paidpax",
        "arrival_adult",
        "arrival_paidchd",
        "arrival_freechd",
        "arrival_baby",
        "night_room",
        "night_paidpax",
        "night_adult",
        "night_paidchd",
        "night_freechd",
        "night_baby",
        "local_revenue",
        "eur_revenue",
        "eur_rev.%",
        "eur_avg_perroom",
        "eur_avg_perpaidpax",
        "avg_paidpax_night",
        "avg_rm.night",
        "r.occ_%",
        "b.occ_%",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl ParserConfig {
    /// Agency report: month and market banners, agency groups, decimal-comma numbers
    /// with missing values kept.
    pub fn market_report() -> Self {
        Self {
            hierarchy: HierarchyMode::MarketOnly,
            header_row: HeaderLocator {
                column: 0,
                matcher: HeaderMatch::Exact("Agency".to_string()),
            },
            primary_column: "agency".to_string(),
            header_labels: default_market_labels(),
            noise_tokens: default_noise_tokens(),
            noise_labels: default_noise_labels(),
            group_rules: default_group_rules(),
            fallback_group: default_fallback_group(),
            group_entities: true,
            numeric: NumericPolicy {
                columns: NumericColumns::Listed(default_market_numeric_columns()),
                convention: NumericConvention::DecimalComma,
                missing: MissingPolicy::Keep,
            },
            fuzzy_cutoff: DEFAULT_CUTOFF,
            month_case: MonthCase::AsIs,
            require_country: false,
        }
    }

    /// Nationality report: month, region and country banners resolved against the
    /// reference table, every other column numeric with thousands dots, zero-filled.
    pub fn region_country_report() -> Self {
        Self {
            hierarchy: HierarchyMode::RegionCountry,
            header_row: HeaderLocator {
                column: 0,
                matcher: HeaderMatch::Contains("AgencyGroup".to_string()),
            },
            primary_column: "agencygroup".to_string(),
            header_labels: Vec::new(),
            noise_tokens: default_noise_tokens(),
            noise_labels: default_noise_labels(),
            group_rules: default_group_rules(),
            fallback_group: default_fallback_group(),
            group_entities: false,
            numeric: NumericPolicy {
                columns: NumericColumns::AllExcept(Vec::new()),
                convention: NumericConvention::ThousandsDotDecimalComma,
                missing: MissingPolicy::Zero,
            },
            fuzzy_cutoff: DEFAULT_CUTOFF,
            month_case: MonthCase::Title,
            require_country: false,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.primary_column.trim().is_empty() {
            return Err(SectionParseError::InvalidConfig(
                "primary_column must not be empty".to_string(),
            ));
        }

        if !(self.fuzzy_cutoff > 0.0 && self.fuzzy_cutoff <= 1.0) {
            return Err(SectionParseError::InvalidFuzzyCutoff(self.fuzzy_cutoff));
        }

        for (idx, label) in self.header_labels.iter().enumerate() {
            if label.label.trim().is_empty() || label.canonical.trim().is_empty() {
                return Err(SectionParseError::InvalidConfig(format!(
                    "Header label #{} has an empty label or canonical name",
                    idx
                )));
            }
        }

        if self.noise_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(SectionParseError::InvalidConfig(
                "noise_tokens must not contain empty tokens".to_string(),
            ));
        }

        for rule in &self.group_rules {
            if rule.label.trim().is_empty() {
                return Err(SectionParseError::InvalidConfig(
                    "Group rule with an empty label".to_string(),
                ));
            }
            if rule.patterns.is_empty() || rule.patterns.iter().any(|p| p.trim().is_empty()) {
                return Err(SectionParseError::InvalidConfig(format!(
                    "Group rule '{}' needs at least one non-empty pattern",
                    rule.label
                )));
            }
        }

        if self.fallback_group.trim().is_empty() {
            return Err(SectionParseError::InvalidConfig(
                "fallback_group must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON Schema of the configuration, for callers that build configs in other tools.
    pub fn json_schema() -> Result<serde_json::Value> {
        let schema = schemars::schema_for!(ParserConfig);
        Ok(serde_json::to_value(schema)?)
    }
}
