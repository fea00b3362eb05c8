use crate::config::{HierarchyMode, MonthCase, ParserConfig};
use crate::entity_groups::EntityGroupMapper;
use crate::error::{Result, SectionParseError};
use crate::fuzzy::best_match;
use crate::normalize::normalize_cell;
use crate::numeric::coerce_cell;
use crate::reference::ReferenceIndex;
use crate::schema::{EnrichedRow, ParseOutput, ParseStats, RawRow, Verdict};
use crate::utils::title_case;
use indexmap::IndexMap;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static MONTH_BANNER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}-\D").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    AwaitingMonth,
    Active,
}

/// Context inherited by data rows. One instance per parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseContext {
    pub active_month: Option<String>,
    pub active_market_or_region: Option<String>,
    pub active_country: Option<String>,
}

impl ParseContext {
    pub fn mode(&self) -> ParseMode {
        if self.active_month.is_some() {
            ParseMode::Active
        } else {
            ParseMode::AwaitingMonth
        }
    }

    fn enter_month(&mut self, month: Option<String>) {
        self.active_month = month;
    }

    fn enter_market(&mut self, market: String) {
        self.active_market_or_region = Some(market);
    }

    // Country sits below region, so a new region forgets it.
    fn enter_region(&mut self, region: String) {
        self.active_market_or_region = Some(region);
        self.active_country = None;
    }

    fn enter_country(&mut self, country: String, region: String) {
        self.active_country = Some(country);
        self.active_market_or_region = Some(region);
    }
}

/// What a single row turned out to be, with the values its transition needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowClass {
    Month(Option<String>),
    Market(String),
    Region(String),
    Country {
        country: String,
        region: String,
        fuzzy: bool,
    },
    Noise,
    Data,
}

impl RowClass {
    pub fn verdict(&self) -> Verdict {
        match self {
            RowClass::Month(_) => Verdict::MonthHeader,
            RowClass::Market(_) => Verdict::MarketHeader,
            RowClass::Region(_) => Verdict::RegionHeader,
            RowClass::Country { .. } => Verdict::CountryHeader,
            RowClass::Noise => Verdict::NoiseRow,
            RowClass::Data => Verdict::DataRow,
        }
    }
}

/// Month name carried by a banner such as `"01-JANUARY"`, or `None` when the
/// text is not a month banner. A banner with nothing after the hyphen, such as
/// `"01- "`, yields `Some("")`.
pub fn month_banner(text: &str) -> Option<&str> {
    // Trailing whitespace is part of the banner, `"01- "` still matches.
    let text = text.trim_start();
    if !MONTH_BANNER.is_match(text) {
        return None;
    }
    text.split_once('-').map(|(_, rest)| rest.trim())
}

/// Single-pass row classifier. Rows must be fed in file order.
pub struct SectionParser<'a> {
    config: &'a ParserConfig,
    reference: Option<&'a ReferenceIndex>,
    groups: EntityGroupMapper,
    header_labels: Vec<(String, String)>,
    noise_tokens: Vec<String>,
    noise_labels: Vec<String>,
    context: ParseContext,
    stats: ParseStats,
    fuzzy_cache: HashMap<String, Option<String>>,
}

impl<'a> SectionParser<'a> {
    pub fn new(config: &'a ParserConfig, reference: Option<&'a ReferenceIndex>) -> Result<Self> {
        config.validate()?;

        let reference = match config.hierarchy {
            HierarchyMode::RegionCountry => match reference {
                Some(index) => Some(index),
                None => {
                    return Err(SectionParseError::InvalidConfig(
                        "region_country hierarchy needs a reference index".to_string(),
                    ))
                }
            },
            HierarchyMode::MarketOnly => {
                if reference.is_some() {
                    debug!("Reference index ignored for market-only hierarchy");
                }
                None
            }
        };

        Ok(Self {
            config,
            reference,
            groups: EntityGroupMapper::new(&config.group_rules, &config.fallback_group),
            header_labels: config
                .header_labels
                .iter()
                .map(|h| (h.label.trim().to_uppercase(), h.canonical.clone()))
                .collect(),
            noise_tokens: uppercase_all(&config.noise_tokens),
            noise_labels: uppercase_all(&config.noise_labels),
            context: ParseContext::default(),
            stats: ParseStats::default(),
            fuzzy_cache: HashMap::new(),
        })
    }

    pub fn context(&self) -> &ParseContext {
        &self.context
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Classifies primary-column text without touching the context.
    pub fn classify(&mut self, text: &str) -> RowClass {
        if let Some(month) = month_banner(text) {
            let month = match self.config.month_case {
                MonthCase::AsIs => month.to_string(),
                MonthCase::Title => title_case(month),
            };
            return RowClass::Month(if month.is_empty() { None } else { Some(month) });
        }

        let cell = normalize_cell(text);
        let upper = cell.upper();
        if upper.is_empty() {
            return RowClass::Noise;
        }

        if let Some(canonical) = self.header_label(upper) {
            return match self.config.hierarchy {
                HierarchyMode::MarketOnly => RowClass::Market(canonical.to_string()),
                HierarchyMode::RegionCountry => RowClass::Region(canonical.to_string()),
            };
        }

        if let Some(reference) = self.reference {
            if let Some(region) = reference.region_for_label(upper) {
                return RowClass::Region(region.to_string());
            }
            if let Some(class) = country_class(reference, upper, false) {
                return class;
            }
        }

        if self.is_noise(upper) {
            return RowClass::Noise;
        }

        if let Some(reference) = self.reference {
            if let Some(matched) = self.fuzzy_country(reference, upper) {
                if let Some(class) = country_class(reference, &matched, true) {
                    return class;
                }
            }
        }

        RowClass::Data
    }

    /// Consumes one row, updating the context. Returns the enriched row for
    /// data rows whose context is complete.
    pub fn feed(&mut self, row: RawRow) -> Option<EnrichedRow> {
        self.stats.rows_seen += 1;

        let raw = row
            .get(&self.config.primary_column)
            .map(|cell| cell.as_text().into_owned())
            .unwrap_or_default();

        let class = self.classify(&raw);
        let text = raw.trim().to_string();
        self.stats.record(class.verdict());

        match class {
            RowClass::Month(month) => {
                debug!("Month banner '{}' -> {:?}", text, month);
                self.context.enter_month(month);
                None
            }
            RowClass::Market(market) => {
                debug!("Market banner '{}' -> {}", text, market);
                self.context.enter_market(market);
                None
            }
            RowClass::Region(region) => {
                debug!("Region banner '{}' -> {}", text, region);
                self.context.enter_region(region);
                None
            }
            RowClass::Country {
                country,
                region,
                fuzzy,
            } => {
                if fuzzy {
                    self.stats.fuzzy_countries += 1;
                    debug!("Approximate country '{}' -> {} ({})", text, country, region);
                } else {
                    debug!("Country banner '{}' -> {} ({})", text, country, region);
                }
                self.context.enter_country(country, region);
                None
            }
            RowClass::Noise => None,
            RowClass::Data => self.enrich(text, row),
        }
    }

    pub fn finish(self) -> ParseStats {
        self.stats
    }

    fn header_label(&self, upper: &str) -> Option<&str> {
        self.header_labels
            .iter()
            .find(|(label, _)| label == upper)
            .map(|(_, canonical)| canonical.as_str())
    }

    fn is_noise(&self, upper: &str) -> bool {
        self.noise_tokens.iter().any(|token| upper.contains(token.as_str()))
            || self.noise_labels.iter().any(|label| label == upper)
    }

    fn fuzzy_country(&mut self, reference: &ReferenceIndex, upper: &str) -> Option<String> {
        if let Some(hit) = self.fuzzy_cache.get(upper) {
            return hit.clone();
        }

        let hit = best_match(upper, reference.candidate_country_keys(), self.config.fuzzy_cutoff)
            .map(|m| {
                debug!("'{}' resembles '{}' (score {:.3})", upper, m.candidate, m.score);
                m.candidate.to_string()
            });

        self.fuzzy_cache.insert(upper.to_string(), hit.clone());
        hit
    }

    fn enrich(&mut self, entity: String, row: RawRow) -> Option<EnrichedRow> {
        let context = &self.context;
        let month = context.active_month.clone();
        let market = context.active_market_or_region.clone();
        let country = context.active_country.clone();

        let (month, market_or_region) = match (month, market) {
            (Some(month), Some(market)) => (month, market),
            _ => {
                self.stats.orphaned_rows += 1;
                return None;
            }
        };

        if self.config.require_country && country.is_none() {
            self.stats.orphaned_rows += 1;
            return None;
        }

        let primary = self.config.primary_column.as_str();
        let policy = &self.config.numeric;
        let mut cells = RawRow::new();
        let mut measures = IndexMap::new();

        for (column, value) in row {
            if column == primary {
                continue;
            }
            if policy.is_numeric(&column, primary) {
                let number = coerce_cell(&value, policy.convention).fill(policy.missing);
                measures.insert(column, number);
            } else {
                cells.insert(column, value);
            }
        }

        let entity_group = if self.config.group_entities {
            Some(self.groups.map_group(&entity).to_string())
        } else {
            None
        };

        self.stats.rows_emitted += 1;

        Some(EnrichedRow {
            month,
            market_or_region,
            country,
            entity,
            entity_group,
            cells,
            measures,
        })
    }
}

fn uppercase_all(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.trim().to_uppercase()).collect()
}

fn country_class(reference: &ReferenceIndex, upper: &str, fuzzy: bool) -> Option<RowClass> {
    let region = reference.region_for_exact(upper)?;
    let country = reference.display_form(upper)?;
    Some(RowClass::Country {
        country: country.to_string(),
        region: region.to_string(),
        fuzzy,
    })
}

/// Runs one full parse over rows in file order.
pub fn parse_rows<I>(
    config: &ParserConfig,
    reference: Option<&ReferenceIndex>,
    rows: I,
) -> Result<ParseOutput>
where
    I: IntoIterator<Item = RawRow>,
{
    let mut parser = SectionParser::new(config, reference)?;
    let rows: Vec<EnrichedRow> = rows
        .into_iter()
        .filter_map(|row| parser.feed(row))
        .collect();
    let stats = parser.finish();

    info!(
        "Parsed {} rows: {} emitted, {} headers, {} noise, {} orphaned",
        stats.rows_seen,
        stats.rows_emitted,
        stats.header_rows,
        stats.noise_rows,
        stats.orphaned_rows
    );

    Ok(ParseOutput { rows, stats })
}
