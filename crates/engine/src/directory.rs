use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use turf_models::{Actor, Capability, Role, Venue, VenueFilter};
use uuid::Uuid;

use crate::{BookingError, Engine, EngineResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFacets {
    pub cities: Vec<String>,
    pub game_types: Vec<String>,
}

fn selected(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

/// Applies the search box and the city / game type selectors.
///
/// Search is a case-insensitive substring match on name or description;
/// city and game type must match exactly.
pub fn filter_venues(venues: Vec<Venue>, filter: &VenueFilter) -> Vec<Venue> {
    let search = selected(&filter.search).map(str::to_lowercase);
    let city = selected(&filter.city);
    let game_type = selected(&filter.game_type);

    venues
        .into_iter()
        .filter(|v| match &search {
            Some(q) => v.name.to_lowercase().contains(q) || v.description.to_lowercase().contains(q),
            None => true,
        })
        .filter(|v| city.is_none_or(|c| v.city == c))
        .filter(|v| game_type.is_none_or(|g| v.game_type == g))
        .collect()
}

impl Engine {
    /// Venues for the directory, best rated first.
    ///
    /// Only admins may list inactive venues; everybody else sees active ones.
    pub async fn list_venues(&self, actor: &Actor, filter: &VenueFilter) -> EngineResult<Vec<Venue>> {
        self.allow(actor, Capability::BrowseVenues)?;

        let is_admin = matches!(actor.identity(), Some(i) if i.role == Role::Admin);
        let active = if is_admin { filter.active } else { Some(true) };

        let venues = self.store.list_venues(active).await?;
        Ok(filter_venues(venues, filter))
    }

    pub async fn get_venue(&self, actor: &Actor, venue_id: Uuid) -> EngineResult<Venue> {
        self.allow(actor, Capability::BrowseVenues)?;
        self.store
            .get_venue(venue_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("turf {venue_id}")))
    }

    pub async fn directory_facets(&self, actor: &Actor) -> EngineResult<DirectoryFacets> {
        self.allow(actor, Capability::BrowseVenues)?;

        let venues = self.store.list_venues(Some(true)).await?;
        let cities: BTreeSet<String> = venues.iter().map(|v| v.city.clone()).collect();
        let game_types: BTreeSet<String> = venues.iter().map(|v| v.game_type.clone()).collect();

        Ok(DirectoryFacets {
            cities: cities.into_iter().collect(),
            game_types: game_types.into_iter().collect(),
        })
    }
}
