//! Regional fallback policy for watch-provider lookups.

use crate::models::RawAvailabilityPayload;

/// Region used when the caller gives neither an override nor a geo-IP hint
pub const DEFAULT_REGION: &str = "US";

/// Regions tried, in order, after the caller's own region
pub const FALLBACK_REGIONS: [&str; 4] = ["IN", "TR", "US", "GB"];

/// Trims and upper-cases a caller-supplied country code. Blank input yields `None`.
pub fn normalize_region_code(code: &str) -> Option<String> {
    let code = code.trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_ascii_uppercase())
    }
}

/// Builds the ordered, de-duplicated list of regions to try.
///
/// The explicit override wins over the request hint; with neither the
/// primary region is [`DEFAULT_REGION`]. [`FALLBACK_REGIONS`] always follow.
pub fn preferred_regions(region_override: Option<&str>, region_hint: Option<&str>) -> Vec<String> {
    let primary = region_override
        .and_then(normalize_region_code)
        .or_else(|| region_hint.and_then(normalize_region_code))
        .unwrap_or_else(|| DEFAULT_REGION.to_string());

    let mut regions = Vec::with_capacity(FALLBACK_REGIONS.len() + 1);
    regions.push(primary);
    for region in FALLBACK_REGIONS {
        if !regions.iter().any(|r| r == region) {
            regions.push(region.to_string());
        }
    }
    regions
}

/// Returns the first region of `preferred` that has at least one offer in
/// `raw`. Regions carrying only a link are skipped.
pub fn resolve_region<'a>(raw: &RawAvailabilityPayload, preferred: &'a [String]) -> Option<&'a str> {
    preferred
        .iter()
        .find(|region| {
            raw.get(region.as_str())
                .is_some_and(|availability| availability.has_offers())
        })
        .map(String::as_str)
}
