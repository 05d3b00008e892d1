//! Listing filters for the price tables

use serde::{Deserialize, Serialize};

use crate::{normalize_label, PriceObservation};

/// Region selector value that disables the region restriction
pub const ALL_REGIONS: &str = "All";

/// Search box plus region dropdown
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceFilter {
    /// Case-insensitive substring of the commodity name or the region
    pub search: Option<String>,
    /// Exact region, case-insensitive; `None` or "All" matches every region
    pub region: Option<String>,
}

impl PriceFilter {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn matches(&self, obs: &PriceObservation) -> bool {
        let matches_search = match self.search.as_deref().map(normalize_label) {
            Some(term) if !term.is_empty() => {
                obs.commodity_name.to_lowercase().contains(&term)
                    || obs.region.to_lowercase().contains(&term)
            }
            _ => true,
        };

        let matches_region = match self.region.as_deref() {
            None => true,
            Some(region) if region.trim().eq_ignore_ascii_case(ALL_REGIONS) => true,
            Some(region) => normalize_label(region) == normalize_label(&obs.region),
        };

        matches_search && matches_region
    }
}
