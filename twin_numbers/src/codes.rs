//! Parsing of the structured identifiers found in result documents.

use crate::config::AnalysisErrors;

pub const PARTY_CODE_PREFIX: &str = "PARTY-";
pub const CANDIDATE_CODE_PREFIX: &str = "CANDIDATE-MP-";

/// Extracts the party number: everything after the last hyphen, or the whole
/// code when it has no hyphen.
///
/// ```
/// use twin_numbers::codes::parse_party_number;
/// assert_eq!(parse_party_number("PARTY-0005"), Ok(5));
/// assert_eq!(parse_party_number("11"), Ok(11));
/// ```
pub fn parse_party_number(code: &str) -> Result<u32, AnalysisErrors> {
    let suffix = match code.rfind('-') {
        Some(idx) => &code[idx + 1..],
        None => code,
    };
    parse_number(suffix).ok_or_else(|| AnalysisErrors::NotNumeric(code.to_string()))
}

/// Extracts the ballot number of a constituency candidate.
///
/// The code must start with `CANDIDATE-MP-<area_code>`, and the rest must be
/// an integer. Returns `None` otherwise.
pub fn parse_candidate_number(code: &str, area_code: &str) -> Option<u32> {
    let prefix = format!("{}{}", CANDIDATE_CODE_PREFIX, area_code);
    code.strip_prefix(prefix.as_str()).and_then(parse_number)
}

pub fn province_prefix(area_code: &str) -> &str {
    match area_code.char_indices().nth(2) {
        Some((idx, _)) => &area_code[..idx],
        None => area_code,
    }
}

/// `PARTY-0005` for 5.
pub fn party_code(number: u32) -> String {
    format!("{}{:04}", PARTY_CODE_PREFIX, number)
}

// Digits only: "+5", " 5" and "" are rejected, leading zeros are fine.
fn parse_number(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok()
}
