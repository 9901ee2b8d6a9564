//! Price normalization.

/// Currency markers shops append to prices.
const CURRENCY_MARKERS: &[&str] = &["&nbsp;", "РУБ", "руб", "₽"];

/// Normalizes a displayed price into the legacy duplicate key form.
///
/// Strips `&nbsp;`, `РУБ`, `руб`, `₽` and all whitespace (including
/// non-breaking spaces), then a trailing abbreviation dot. `"1 234 ₽"`,
/// `"1234РУБ"` and `"1234"` all normalize to `"1234"`.
pub fn normalize_price(raw: &str) -> String {
    let mut price = raw.to_string();
    for marker in CURRENCY_MARKERS {
        price = price.replace(marker, "");
    }
    let price: String = price.chars().filter(|c| !c.is_whitespace()).collect();
    price.trim_end_matches('.').to_string()
}
