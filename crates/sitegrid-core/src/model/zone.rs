// ── Administrative zones ──
//
// Zones are numbered 1 to 15 and also written as roman numerals. Both
// forms normalize to the same integer; anything else becomes 0, which
// matches no real zone.

/// Highest zone number.
pub const MAX_ZONE: u32 = 15;

const NUMERALS: [&str; MAX_ZONE as usize] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII", "XIII", "XIV", "XV",
];

/// Normalize a zone token to its integer.
///
/// Integer-like strings pass through. Roman numerals `I`..`XV` are
/// matched case-insensitively. Everything else is 0.
pub fn normalize_zone(token: &str) -> u32 {
    let trimmed = token.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return trimmed.parse().unwrap_or(0);
    }
    NUMERALS
        .iter()
        .position(|n| n.eq_ignore_ascii_case(trimmed))
        .and_then(|idx| u32::try_from(idx + 1).ok())
        .unwrap_or(0)
}

/// The roman numeral for a zone, if it is in range.
pub fn zone_numeral(zone: u32) -> Option<&'static str> {
    let idx = usize::try_from(zone.checked_sub(1)?).ok()?;
    NUMERALS.get(idx).copied()
}
