use chrono::Month;

/// Title-cases text the way report banners are displayed: the first letter of
/// every alphabetic run is uppercased and the rest lowercased.
///
/// # Examples
/// - `"UNITED KINGDOM"` -> `"United Kingdom"`
/// - `"COTE D'IVOIRE"` -> `"Cote D'Ivoire"`
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }

    out
}

/// Resolves an English month name ("JANUARY", "Jan", "january") to 1-12.
pub fn month_number(text: &str) -> Option<u32> {
    text.trim()
        .parse::<Month>()
        .ok()
        .map(|m| m.number_from_month())
}
