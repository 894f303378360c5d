//! Provider normalization and grouping for a single resolved region.

use indexmap::IndexMap;
use std::collections::BTreeSet;

use crate::models::{GroupedProvider, OfferCategory, RegionalAvailability};

/// Display name every "Amazon ..." branding is folded into
pub const AMAZON_CANONICAL_NAME: &str = "Amazon Prime Video";

/// Maps brand variants of the same real-world provider onto one display name.
/// Matching is case-sensitive, as TMDB reports names.
pub fn canonical_provider_name(name: &str) -> &str {
    if name.contains("Amazon") {
        AMAZON_CANONICAL_NAME
    } else {
        name
    }
}

/// Groups the stream/rent/buy offers of one region into one entry per
/// canonical provider, tagged with every category it appears under.
///
/// The first offer seen for a provider (walking Stream, Rent, Buy in that
/// order) supplies its id, logo and priority. The result is sorted by display
/// priority with missing priorities last; ties keep first-seen order.
pub fn normalize(offers: &RegionalAvailability, country: &str) -> Vec<GroupedProvider> {
    let mut grouped: IndexMap<(String, String), GroupedProvider> = IndexMap::new();

    for category in OfferCategory::GROUPED {
        for offer in offers.offers(category) {
            let name = canonical_provider_name(&offer.provider_name);

            grouped
                .entry((name.to_string(), country.to_string()))
                .and_modify(|provider| {
                    provider.categories.insert(category);
                })
                .or_insert_with(|| GroupedProvider {
                    provider_name: name.to_string(),
                    provider_id: offer.provider_id,
                    logo_path: offer.logo_path.clone(),
                    display_priority: offer.display_priority,
                    categories: BTreeSet::from([category]),
                    country: country.to_string(),
                });
        }
    }

    let mut providers: Vec<GroupedProvider> = grouped.into_values().collect();
    // sort_by_key is stable
    providers.sort_by_key(|p| (p.display_priority.is_none(), p.display_priority));
    providers
}
