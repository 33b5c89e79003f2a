// Currency-ish amount parsing.

/// Parse an amount cell such as `"$1,234.50"` or `" -12 "`.
///
/// Strips `,` thousands separators, `$` symbols and surrounding whitespace,
/// then parses a finite float. Missing, blank and non-numeric cells are `None`;
/// callers treat that as absent data, never as an error.
pub fn parse_amount(raw: Option<&str>) -> Option<f64> {
    let cleaned: String = raw?.chars().filter(|c| *c != ',' && *c != '$').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    // f64::from_str accepts "inf"/"nan"; neither is an amount.
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}
