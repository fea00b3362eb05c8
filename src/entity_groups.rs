use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FALLBACK_GROUP: &str = "SORSAT";

/// One entry of the ordered agency-group table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GroupRule {
    #[schemars(description = "Canonical group label assigned when any pattern matches.")]
    pub label: String,

    #[schemars(
        description = "Patterns tried in order. A pattern matches when the uppercased name starts with it or contains it right after a space."
    )]
    pub patterns: Vec<String>,
}

impl GroupRule {
    pub fn new(label: &str, patterns: &[&str]) -> Self {
        Self {
            label: label.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// The agency grouping table used by the hotel agency report. Order matters:
/// the first group with a matching pattern wins.
pub fn default_group_rules() -> Vec<GroupRule> {
    vec![
        GroupRule::new("Anex Tour", &["ANEX-"]),
        GroupRule::new("AKAY TOUR", &["AKAY-"]),
        GroupRule::new("ARELES (EUROPEHOL)", &["ARELES-"]),
        GroupRule::new("BEDSOPIA / PRIME TRAVEL", &["BEDSOPIA"]),
        GroupRule::new("BOOKING.COM", &["BOOKING.COM"]),
        GroupRule::new("COMP", &["GM", "COMP 3", "SALES", "KONSER", "ATG", "PANDEMI"]),
        GroupRule::new("CORENDON", &["CORENDON"]),
        GroupRule::new("DESTINATION SERVICES", &["DESTINATION-"]),
        GroupRule::new("ETS", &["ETS"]),
        GroupRule::new("EUROPE HOLIDAY", &["EUHOLIDAY-"]),
        GroupRule::new("FIBULA TRAVEL", &["FIBULA-"]),
        GroupRule::new("FIT TURIZM", &["FIT HOL-", "FIT"]),
        GroupRule::new("GROUP", &["GROUP-"]),
        GroupRule::new("HOTELBEDS", &["HOTELBEDS-"]),
        GroupRule::new("HOUSE USE", &["HOUSE USE"]),
        GroupRule::new("INDIVIDUAL", &["INDIVIDUAL-"]),
        GroupRule::new("ITS", &["ITS-"]),
        GroupRule::new("KALANIT TOUR", &["KALANIT-"]),
        GroupRule::new("KEYF TRAVEL", &["KEYF TRAVEL-", "SUNQUEST-"]),
        GroupRule::new("KILIT GLOBAL", &["KILIT-"]),
        GroupRule::new("MEETING POINT", &["FTI-"]),
        GroupRule::new("MOTUS", &["MOTUS-"]),
        GroupRule::new("ODEON TOUR", &["ODEON-"]),
        GroupRule::new("PASSO TOUR", &["PASSO-"]),
        GroupRule::new("PENINSULA", &["PENINSULA-"]),
        GroupRule::new("PGM HOLIDAY", &["PGM HOLIDAY-"]),
        GroupRule::new("RUSTAR", &["RUSTAR"]),
        GroupRule::new("SETUR", &["SETUR"]),
        GroupRule::new("SONAR TOUR", &["SONAR-"]),
        GroupRule::new("SUMMER TOUR", &["SUMMER-"]),
        GroupRule::new("TATILBUDUR", &["TATILBUDUR"]),
        GroupRule::new("WEB", &["WEB-"]),
        GroupRule::new("ZEYDE TURIZM", &["ZEYDE TURIZM"]),
    ]
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    prefix: String,
    spaced: String,
}

/// Maps free-text agency names onto canonical group labels.
#[derive(Debug, Clone)]
pub struct EntityGroupMapper {
    groups: Vec<(String, Vec<CompiledPattern>)>,
    fallback: String,
}

impl EntityGroupMapper {
    pub fn new(rules: &[GroupRule], fallback: &str) -> Self {
        let groups = rules
            .iter()
            .map(|rule| {
                let patterns = rule
                    .patterns
                    .iter()
                    .map(|p| {
                        let prefix = p.to_uppercase();
                        let spaced = format!(" {}", prefix);
                        CompiledPattern { prefix, spaced }
                    })
                    .collect();
                (rule.label.clone(), patterns)
            })
            .collect();

        Self {
            groups,
            fallback: fallback.to_string(),
        }
    }

    pub fn map_group(&self, entity_name: &str) -> &str {
        let upper = entity_name.to_uppercase();

        self.groups
            .iter()
            .find(|(_, patterns)| {
                patterns
                    .iter()
                    .any(|p| upper.starts_with(&p.prefix) || upper.contains(&p.spaced))
            })
            .map(|(label, _)| label.as_str())
            .unwrap_or(self.fallback.as_str())
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

impl Default for EntityGroupMapper {
    fn default() -> Self {
        Self::new(&default_group_rules(), DEFAULT_FALLBACK_GROUP)
    }
}
