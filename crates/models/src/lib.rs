use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub mod policy;

pub use policy::{Actor, Capability, HomeView, Identity, Role};

/// A bookable venue, listed by a vendor.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Venue {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub description: String,
    pub address: String,
    pub city: String,
    pub game_type: String,
    pub price_per_hour: f64,
    #[sqlx(json)]
    pub facilities: Vec<String>,
    #[sqlx(json)]
    pub images: Vec<String>,
    pub rating: f64,
    pub total_reviews: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Date-independent hourly window of a venue.
///
/// `is_available` is the static default stored with the template. Per-date
/// availability is always recomputed from confirmed bookings and ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SlotTemplate {
    pub id: Uuid,
    pub turf_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_available: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    /// Payment status only ever moves forward out of `Pending`.
    /// Setting the current status again is allowed and changes nothing.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        self == next || self == PaymentStatus::Pending
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub turf_id: Uuid,
    pub user_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_amount: f64,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

/// A booking joined with the venue it was made for.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub booking: Booking,
    pub turf_name: String,
    pub turf_address: String,
    pub turf_game_type: String,
}

/// A booking as a vendor sees it, with the player's display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorBooking {
    #[serde(flatten)]
    pub booking: Booking,
    pub turf_name: String,
    pub player_name: String,
}

/// Fields needed to insert a booking row.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub turf_id: Uuid,
    pub user_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vendor {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub business_address: Option<String>,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
}

/// Venue listing row for the admin dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TurfWithVendor {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub venue: Venue,
    pub vendor_business_name: Option<String>,
}

/// Fields a vendor supplies when listing a new venue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTurf {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    pub city: String,
    pub game_type: String,
    pub price_per_hour: f64,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Directory search parameters. `None` or `"all"` disables a filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VenueFilter {
    pub active: Option<bool>,
    pub search: Option<String>,
    pub city: Option<String>,
    pub game_type: Option<String>,
}

/// One slot of a venue on a specific date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableSlot {
    pub slot_id: Uuid,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub bookable: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_vendors: i64,
    pub total_turfs: i64,
    pub total_bookings: i64,
    pub total_revenue: f64,
}

/// Payment request shown to the player as a scannable code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub booking_id: Uuid,
    pub payee: String,
    pub amount: f64,
    pub currency: String,
    pub note: String,
    pub uri: String,
    pub qr_code_url: String,
}

/// Result of a self-reported payment. `verified` is always false: nothing
/// checks that money actually arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentConfirmation {
    pub booking_id: Uuid,
    pub payment_status: PaymentStatus,
    pub verified: bool,
    pub changed: bool,
}
