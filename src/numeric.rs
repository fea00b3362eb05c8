use crate::schema::CellValue;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of coercing a cell. `Missing` is kept distinct from zero so that
/// callers pick the fill policy themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Value(f64),
    Missing,
}

impl Numeric {
    pub fn value(self) -> Option<f64> {
        match self {
            Numeric::Value(v) => Some(v),
            Numeric::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Numeric::Missing)
    }

    pub fn or_zero(self) -> f64 {
        self.value().unwrap_or(0.0)
    }

    pub fn fill(self, policy: MissingPolicy) -> Numeric {
        match (self, policy) {
            (Numeric::Missing, MissingPolicy::Zero) => Numeric::Value(0.0),
            (other, _) => other,
        }
    }
}

/// Separator convention of a source report. Chosen by the caller, never guessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NumericConvention {
    #[schemars(
        description = "Comma is the decimal separator, spaces are ignored: '12,5' -> 12.5. Anything else left over makes the value missing."
    )]
    DecimalComma,

    #[schemars(
        description = "Periods are thousands separators and comma is the decimal separator: '1.234,56' -> 1234.56. Characters other than digits, '.' and '-' are discarded."
    )]
    ThousandsDotDecimalComma,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Leave unparseable cells as missing.
    Keep,
    /// Replace unparseable cells with 0.0.
    Zero,
}

pub fn coerce(text: &str, convention: NumericConvention) -> Numeric {
    let cleaned: String = match convention {
        NumericConvention::DecimalComma => text
            .trim()
            .chars()
            .filter(|c| *c != ' ')
            .map(|c| if c == ',' { '.' } else { c })
            .collect(),
        NumericConvention::ThousandsDotDecimalComma => text
            .chars()
            .filter(|c| *c != '.')
            .map(|c| if c == ',' { '.' } else { c })
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect(),
    };

    if cleaned.is_empty() {
        return Numeric::Missing;
    }

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Numeric::Value(v),
        _ => Numeric::Missing,
    }
}

/// Coerces a cell. Cells that already hold a number are returned as-is.
pub fn coerce_cell(cell: &CellValue, convention: NumericConvention) -> Numeric {
    match cell {
        CellValue::Empty => Numeric::Missing,
        CellValue::Number(n) if n.is_finite() => Numeric::Value(*n),
        CellValue::Number(_) => Numeric::Missing,
        CellValue::Text(s) => coerce(s, convention),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: NumericConvention = NumericConvention::DecimalComma;
    const B: NumericConvention = NumericConvention::ThousandsDotDecimalComma;

    #[test]
    fn test_decimal_comma() {
        assert_eq!(coerce("12,5", A), Numeric::Value(12.5));
        assert_eq!(coerce(" 1 200,75 ", A), Numeric::Value(1200.75));
        assert_eq!(coerce("42", A), Numeric::Value(42.0));
        assert_eq!(coerce("-3,25", A), Numeric::Value(-3.25));
    }

    #[test]
    fn test_decimal_comma_rejects_thousands_dots() {
        // "1.234,56" becomes "1.234.56" which is not a number under this convention
        assert_eq!(coerce("1.234,56", A), Numeric::Missing);
        assert_eq!(coerce("12 EUR", A), Numeric::Missing);
    }

    #[test]
    fn test_thousands_dot_decimal_comma() {
        assert_eq!(coerce("1.234,56", B), Numeric::Value(1234.56));
        assert_eq!(coerce("1.234.567", B), Numeric::Value(1234567.0));
        assert_eq!(coerce("€ 2.500,00", B), Numeric::Value(2500.0));
        assert_eq!(coerce("-17,5", B), Numeric::Value(-17.5));
        assert_eq!(coerce("%45", B), Numeric::Value(45.0));
    }

    #[test]
    fn test_malformed_input_is_missing() {
        for convention in [A, B] {
            assert_eq!(coerce("abc", convention), Numeric::Missing);
            assert_eq!(coerce("", convention), Numeric::Missing);
            assert_eq!(coerce("   ", convention), Numeric::Missing);
            assert_eq!(coerce("-", convention), Numeric::Missing);
        }
        assert_eq!(coerce("1-2", B), Numeric::Missing);
        assert_eq!(coerce("nan", A), Numeric::Missing);
        assert_eq!(coerce("inf", A), Numeric::Missing);
    }

    #[test]
    fn test_zero_fill_is_explicit() {
        let missing = coerce("n/a", B);
        assert!(missing.is_missing());
        assert_eq!(missing.fill(MissingPolicy::Keep), Numeric::Missing);
        assert_eq!(missing.fill(MissingPolicy::Zero), Numeric::Value(0.0));
        assert_eq!(Numeric::Value(3.0).fill(MissingPolicy::Zero), Numeric::Value(3.0));
        assert_eq!(missing.or_zero(), 0.0);
    }

    #[test]
    fn test_numeric_cells_pass_through() {
        assert_eq!(coerce_cell(&CellValue::Number(1234.5), B), Numeric::Value(1234.5));
        assert_eq!(coerce_cell(&CellValue::Empty, A), Numeric::Missing);
        assert_eq!(coerce_cell(&CellValue::Number(f64::NAN), A), Numeric::Missing);
        assert_eq!(coerce_cell(&CellValue::from("7,5"), A), Numeric::Value(7.5));
    }
}
