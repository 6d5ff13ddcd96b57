use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use turf_models::{Actor, BookingDetail, Capability, NewTurf, PaymentStatus, Role, Vendor, VendorBooking, Venue};
use uuid::Uuid;

use crate::{BookingError, Engine, EngineResult};

/// Slot templates cover 09:00 to 22:00 in one-hour steps.
const OPENING_HOUR: u32 = 9;
const CLOSING_HOUR: u32 = 22;

const RECENT_BOOKINGS: usize = 10;
const DEFAULT_BUSINESS_NAME: &str = "New Vendor";
const UNKNOWN_PLAYER: &str = "Unknown";

pub fn hourly_slots() -> Vec<(NaiveTime, NaiveTime)> {
    (OPENING_HOUR..CLOSING_HOUR)
        .filter_map(|h| Some((NaiveTime::from_hms_opt(h, 0, 0)?, NaiveTime::from_hms_opt(h + 1, 0, 0)?)))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDashboard {
    pub vendor: Vendor,
    pub turfs: Vec<Venue>,
    pub recent_bookings: Vec<VendorBooking>,
    pub total_bookings: usize,
    pub total_revenue: f64,
}

fn normalize_turf(mut turf: NewTurf) -> EngineResult<NewTurf> {
    turf.name = turf.name.trim().to_string();
    turf.city = turf.city.trim().to_string();
    turf.game_type = turf.game_type.trim().to_string();
    turf.description = turf.description.trim().to_string();
    turf.address = turf.address.trim().to_string();

    for (field, value) in [("name", &turf.name), ("city", &turf.city), ("game type", &turf.game_type)] {
        if value.is_empty() {
            return Err(BookingError::validation(format!("{field} is required")));
        }
    }
    if !turf.price_per_hour.is_finite() || turf.price_per_hour <= 0.0 {
        return Err(BookingError::validation("price per hour must be positive"));
    }

    let mut facilities: Vec<String> = Vec::new();
    for facility in turf.facilities.iter().map(|f| f.trim()) {
        if !facility.is_empty() && !facilities.iter().any(|f| f == facility) {
            facilities.push(facility.to_string());
        }
    }
    turf.facilities = facilities;
    turf.image_url = turf
        .image_url
        .map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty());

    Ok(turf)
}

/// Attaches player names to bookings. Missing names fall back to a placeholder.
fn with_player_names(
    bookings: Vec<BookingDetail>,
    names: &HashMap<Uuid, String>,
) -> Vec<VendorBooking> {
    bookings
        .into_iter()
        .map(|b| VendorBooking {
            player_name: names
                .get(&b.booking.user_id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_PLAYER.to_string()),
            turf_name: b.turf_name,
            booking: b.booking,
        })
        .collect()
}

impl Engine {
    /// The actor's vendor record, created unapproved on first use.
    pub async fn vendor_profile(&self, actor: &Actor) -> EngineResult<Vendor> {
        let identity = self.require(actor, Capability::ManageOwnTurfs)?;
        self.ensure_vendor(identity.user_id, None, None).await
    }

    /// Gets or creates the vendor row of a user. Without a business name the
    /// profile's full name is used, then a placeholder.
    pub(crate) async fn ensure_vendor(
        &self,
        user_id: Uuid,
        business_name: Option<String>,
        business_address: Option<&str>,
    ) -> EngineResult<Vendor> {
        if let Some(vendor) = self.store.find_vendor_by_user(user_id).await? {
            return Ok(vendor);
        }

        let business_name = match business_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name.trim().to_string(),
            None => match self.store.find_profile(user_id).await {
                Ok(profile) => profile.and_then(|p| p.full_name),
                Err(e) => {
                    warn!("Profile lookup for {user_id} failed: {e:#}");
                    None
                }
            }
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BUSINESS_NAME.to_string()),
        };

        let vendor = self
            .store
            .create_vendor(user_id, &business_name, business_address)
            .await?;
        info!("Vendor {} ({}) registered for user {user_id}", vendor.id, vendor.business_name);
        Ok(vendor)
    }

    /// Lists a new venue with the standard hourly slot templates.
    pub async fn create_turf(&self, actor: &Actor, turf: NewTurf) -> EngineResult<Venue> {
        self.require(actor, Capability::ManageOwnTurfs)?;
        let turf = normalize_turf(turf)?;
        let vendor = self.vendor_profile(actor).await?;

        let venue = self
            .store
            .create_venue(vendor.id, &turf, &hourly_slots())
            .await?;
        info!("Vendor {} listed turf {} ({})", vendor.id, venue.id, venue.name);
        Ok(venue)
    }

    pub async fn vendor_dashboard(&self, actor: &Actor) -> EngineResult<VendorDashboard> {
        self.require(actor, Capability::ViewVendorBookings)?;
        let vendor = self.vendor_profile(actor).await?;

        let turfs = self.store.list_venues_for_vendor(vendor.id).await?;
        let turf_ids: Vec<Uuid> = turfs.iter().map(|t| t.id).collect();
        let bookings = self.store.list_bookings_for_vendor(&turf_ids).await?;

        let total_bookings = bookings.len();
        let total_revenue = bookings
            .iter()
            .filter(|b| b.booking.payment_status == PaymentStatus::Paid)
            .map(|b| b.booking.total_amount)
            .sum();

        let recent: Vec<BookingDetail> = bookings.into_iter().take(RECENT_BOOKINGS).collect();
        let mut player_ids: Vec<Uuid> = recent.iter().map(|b| b.booking.user_id).collect();
        player_ids.sort();
        player_ids.dedup();

        let names = self.store.profile_names(&player_ids).await.unwrap_or_else(|e| {
            warn!("Player name lookup failed, using placeholders: {e:#}");
            HashMap::new()
        });

        Ok(VendorDashboard {
            vendor,
            turfs,
            recent_bookings: with_player_names(recent, &names),
            total_bookings,
            total_revenue,
        })
    }

    /// Activates or deactivates a venue. Admins may touch any venue, vendors only their own.
    pub async fn set_turf_active(&self, actor: &Actor, venue_id: Uuid, active: bool) -> EngineResult<Venue> {
        let identity = actor.identity().ok_or(BookingError::Auth)?;
        let venue = self
            .store
            .get_venue(venue_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("turf {venue_id}")))?;

        match identity.role {
            Role::Admin => {
                self.require(actor, Capability::ModerateTurfs)?;
            }
            _ => {
                self.require(actor, Capability::ManageOwnTurfs)?;
                let owner = self.store.find_vendor_by_user(identity.user_id).await?;
                if owner.is_none_or(|v| v.id != venue.vendor_id) {
                    return Err(BookingError::Forbidden(format!("turf {venue_id} belongs to another vendor")));
                }
            }
        }

        if !self.store.set_venue_active(venue_id, active).await? {
            return Err(BookingError::NotFound(format!("turf {venue_id}")));
        }
        info!("Turf {venue_id} set active={active} by {}", identity.user_id);

        Ok(Venue { active, ..venue })
    }
}
