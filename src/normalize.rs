use crate::utils::title_case;
use once_cell::sync::Lazy;
use regex::Regex;

static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w%.]").unwrap());
// Excel escapes a line feed inside a header cell as the literal `_x000a_`.
static NEWLINE_ARTIFACT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)_x000a_").unwrap());
static UNDERSCORES: Lazy<Regex> = Lazy::new(|| Regex::new(r"_{2,}").unwrap());

/// Turns a header cell into a column key: `"EUR\nRevenue "` -> `"eur_revenue"`.
///
/// Idempotent: normalizing an already normalized name returns it unchanged.
pub fn normalize_column_name(name: &str) -> String {
    let s = name.trim();
    let s = NEWLINES.replace_all(s, "_");
    let s = WHITESPACE.replace_all(&s, "_");
    let mut s = DISALLOWED.replace_all(&s, "").into_owned();

    // Replacing one artifact can splice a new one together ("_x000a_x000a_").
    while NEWLINE_ARTIFACT.is_match(&s) {
        s = NEWLINE_ARTIFACT.replace_all(&s, "_").into_owned();
    }

    UNDERSCORES.replace_all(&s, "_").to_lowercase()
}

/// Cell text prepared for header and entity matching.
///
/// Only the uppercase form is stored; the title-case display form is derived
/// from it so both always agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CellText {
    upper: String,
}

impl CellText {
    pub fn upper(&self) -> &str {
        &self.upper
    }

    pub fn title(&self) -> String {
        title_case(&self.upper)
    }

    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }
}

pub fn normalize_cell(text: &str) -> CellText {
    CellText {
        upper: text.trim().to_uppercase(),
    }
}
