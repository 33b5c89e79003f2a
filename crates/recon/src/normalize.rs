// Match-key normalization shared by the statement and every reference table.

/// Canonicalize a raw key so spreadsheet artifacts compare equal.
///
/// Trims whitespace, drops the leading `'` text marker, and strips leading
/// zeros from all-digit keys (`"0308607218"` and `"308607218"` both become
/// `"308607218"`, `"0000"` becomes `"0"`). Anything else passes through.
/// Missing values normalize to the empty string.
///
/// The result is a fixed point: `normalize_key(Some(&normalize_key(x))) ==
/// normalize_key(x)`. A doubled marker (`''12`) is therefore unwrapped fully.
pub fn normalize_key(raw: Option<&str>) -> String {
    let mut unquoted = raw.unwrap_or("").trim();
    while let Some(rest) = unquoted.strip_prefix('\'') {
        unquoted = rest.trim();
    }

    if !unquoted.is_empty() && unquoted.bytes().all(|b| b.is_ascii_digit()) {
        let stripped = unquoted.trim_start_matches('0');
        return if stripped.is_empty() { "0".to_string() } else { stripped.to_string() };
    }

    unquoted.to_string()
}
