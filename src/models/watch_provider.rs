use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

// ============================================================================
// TMDB watch/providers API types
// ============================================================================

/// Response from GET /{movie|tv}/{id}/watch/providers
#[derive(Debug, Clone, Deserialize)]
pub struct WatchProvidersResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub results: Option<RawAvailabilityPayload>,
}

/// Per-country availability exactly as TMDB reports it, keyed by ISO-3166-1 code
pub type RawAvailabilityPayload = HashMap<String, RegionalAvailability>;

/// One upstream-reported offering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderOffer {
    pub provider_id: u64,
    pub provider_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    /// Lower is more prominent. Missing sorts after every present value.
    #[serde(default)]
    pub display_priority: Option<i32>,
}

/// Availability for a single country
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionalAvailability {
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub flatrate: Vec<ProviderOffer>,
    #[serde(default)]
    pub rent: Vec<ProviderOffer>,
    #[serde(default)]
    pub buy: Vec<ProviderOffer>,
    #[serde(default)]
    pub free: Vec<ProviderOffer>,
}

impl RegionalAvailability {
    /// Offers listed under the given category
    pub fn offers(&self, category: OfferCategory) -> &[ProviderOffer] {
        match category {
            OfferCategory::Stream => &self.flatrate,
            OfferCategory::Rent => &self.rent,
            OfferCategory::Buy => &self.buy,
            OfferCategory::Free => &self.free,
        }
    }

    /// A region is usable when any category lists at least one offer
    pub fn has_offers(&self) -> bool {
        OfferCategory::ALL
            .iter()
            .any(|category| !self.offers(*category).is_empty())
    }
}

/// Commercial model of an offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferCategory {
    Stream,
    Rent,
    Buy,
    Free,
}

impl OfferCategory {
    pub const ALL: [OfferCategory; 4] = [
        OfferCategory::Stream,
        OfferCategory::Rent,
        OfferCategory::Buy,
        OfferCategory::Free,
    ];

    /// Categories merged into grouped providers, in processing order.
    /// Free offers are passed through as-is.
    pub const GROUPED: [OfferCategory; 3] =
        [OfferCategory::Stream, OfferCategory::Rent, OfferCategory::Buy];
}

// ============================================================================
// Resolved output
// ============================================================================

/// A provider after brand normalization, tagged with every category it appears under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedProvider {
    pub provider_name: String,
    pub provider_id: u64,
    pub logo_path: Option<String>,
    pub display_priority: Option<i32>,
    pub categories: BTreeSet<OfferCategory>,
    pub country: String,
}

/// Watch-provider answer for one title, as returned to the UI and stored in the cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatchProviderResolution {
    /// Region the providers were taken from. `None` means nothing was found
    /// in any preferred region, which is a valid answer and not an error.
    pub resolved_region: Option<String>,
    /// TMDB deep link for the resolved region
    pub link: Option<String>,
    pub providers: Vec<GroupedProvider>,
    /// Free offers of the resolved region, untouched
    #[serde(default)]
    pub free: Vec<ProviderOffer>,
}

impl WatchProviderResolution {
    /// The negative answer: no region had usable offers
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty() && self.free.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_providers_response_deserialization() {
        let json = r#"{
            "id": 550,
            "results": {
                "US": {
                    "link": "https://www.themoviedb.org/movie/550-fight-club/watch?locale=US",
                    "flatrate": [
                        {"logo_path": "/hulu.jpg", "provider_id": 15, "provider_name": "Hulu", "display_priority": 2}
                    ],
                    "rent": [
                        {"logo_path": "/amzn.jpg", "provider_id": 10, "provider_name": "Amazon Video", "display_priority": 8}
                    ]
                },
                "GB": {
                    "link": "https://www.themoviedb.org/movie/550-fight-club/watch?locale=GB"
                }
            }
        }"#;

        let response: WatchProvidersResponse = serde_json::from_str(json).unwrap();
        let results = response.results.unwrap();

        let us = &results["US"];
        assert_eq!(us.flatrate.len(), 1);
        assert_eq!(us.flatrate[0].provider_name, "Hulu");
        assert_eq!(us.flatrate[0].display_priority, Some(2));
        assert_eq!(us.rent[0].logo_path.as_deref(), Some("/amzn.jpg"));
        assert!(us.buy.is_empty());
        assert!(us.has_offers());

        let gb = &results["GB"];
        assert!(gb.link.is_some());
        assert!(!gb.has_offers());
    }

    #[test]
    fn test_missing_results_deserializes_as_none() {
        let response: WatchProvidersResponse = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(response.results.is_none());
    }

    #[test]
    fn test_offer_without_priority() {
        let offer: ProviderOffer =
            serde_json::from_str(r#"{"provider_id": 8, "provider_name": "Netflix"}"#).unwrap();
        assert_eq!(offer.display_priority, None);
        assert_eq!(offer.logo_path, None);
    }

    #[test]
    fn test_free_only_region_is_usable() {
        let region = RegionalAvailability {
            free: vec![ProviderOffer {
                provider_id: 73,
                provider_name: "Tubi TV".to_string(),
                logo_path: None,
                display_priority: Some(20),
            }],
            ..Default::default()
        };
        assert!(region.has_offers());
        assert_eq!(region.offers(OfferCategory::Free).len(), 1);
        assert!(region.offers(OfferCategory::Stream).is_empty());
    }

    #[test]
    fn test_category_serialization() {
        let categories: BTreeSet<OfferCategory> =
            [OfferCategory::Rent, OfferCategory::Stream].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&categories).unwrap(),
            r#"["stream","rent"]"#
        );
    }

    #[test]
    fn test_empty_resolution() {
        let resolution = WatchProviderResolution::empty();
        assert!(resolution.is_empty());
        assert_eq!(resolution.resolved_region, None);
    }
}
