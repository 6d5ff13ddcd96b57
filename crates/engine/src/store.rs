//! The Venue Directory Store seam.
//!
//! The engine only talks to persistence through [`DirectoryStore`].
//! [`SqliteStore`] is the production implementation on top of `turf-db`.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use turf_db::BookingInsert;
use turf_models::{
    Booking, BookingDetail, NewBooking, NewTurf, PaymentStatus, PlatformStats, Profile, Role,
    SlotTemplate, TurfWithVendor, Vendor, Venue,
};
use uuid::Uuid;

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn list_venues(&self, active: Option<bool>) -> Result<Vec<Venue>>;
    async fn get_venue(&self, venue_id: Uuid) -> Result<Option<Venue>>;
    async fn create_venue(
        &self,
        vendor_id: Uuid,
        turf: &NewTurf,
        slots: &[(NaiveTime, NaiveTime)],
    ) -> Result<Venue>;
    async fn set_venue_active(&self, venue_id: Uuid, active: bool) -> Result<bool>;
    async fn delete_venue(&self, venue_id: Uuid) -> Result<bool>;
    async fn list_venues_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<Venue>>;
    async fn list_recent_venues(&self, limit: i64) -> Result<Vec<TurfWithVendor>>;

    async fn list_slot_templates(&self, venue_id: Uuid) -> Result<Vec<SlotTemplate>>;

    async fn list_confirmed_bookings(&self, venue_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>>;
    /// Atomic insert-if-no-confirmed-booking on (venue, date, start time).
    async fn create_booking(&self, booking: &NewBooking) -> Result<BookingInsert>;
    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<BookingDetail>>;
    async fn update_booking_payment_status(&self, booking_id: Uuid, status: PaymentStatus) -> Result<bool>;
    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<BookingDetail>>;
    async fn list_bookings_for_vendor(&self, turf_ids: &[Uuid]) -> Result<Vec<BookingDetail>>;

    async fn find_vendor_by_user(&self, user_id: Uuid) -> Result<Option<Vendor>>;
    async fn create_vendor(
        &self,
        user_id: Uuid,
        business_name: &str,
        business_address: Option<&str>,
    ) -> Result<Vendor>;
    async fn list_vendors(&self) -> Result<Vec<Vendor>>;
    async fn set_vendor_approved(&self, vendor_id: Uuid, approved: bool) -> Result<bool>;
    async fn remove_vendor(&self, vendor_id: Uuid) -> Result<bool>;

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>>;
    async fn profile_names(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, String>>;
    async fn upsert_profile(&self, user_id: Uuid, full_name: Option<&str>) -> Result<()>;
    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>>;
    async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<()>;

    async fn platform_stats(&self) -> Result<PlatformStats>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl DirectoryStore for SqliteStore {
    async fn list_venues(&self, active: Option<bool>) -> Result<Vec<Venue>> {
        turf_db::list_venues(&self.pool, active).await
    }

    async fn get_venue(&self, venue_id: Uuid) -> Result<Option<Venue>> {
        turf_db::get_venue(&self.pool, venue_id).await
    }

    async fn create_venue(
        &self,
        vendor_id: Uuid,
        turf: &NewTurf,
        slots: &[(NaiveTime, NaiveTime)],
    ) -> Result<Venue> {
        turf_db::create_turf(&self.pool, vendor_id, turf, slots).await
    }

    async fn set_venue_active(&self, venue_id: Uuid, active: bool) -> Result<bool> {
        turf_db::set_turf_active(&self.pool, venue_id, active).await
    }

    async fn delete_venue(&self, venue_id: Uuid) -> Result<bool> {
        turf_db::delete_turf(&self.pool, venue_id).await
    }

    async fn list_venues_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<Venue>> {
        turf_db::list_turfs_for_vendor(&self.pool, vendor_id).await
    }

    async fn list_recent_venues(&self, limit: i64) -> Result<Vec<TurfWithVendor>> {
        turf_db::list_recent_turfs(&self.pool, limit).await
    }

    async fn list_slot_templates(&self, venue_id: Uuid) -> Result<Vec<SlotTemplate>> {
        turf_db::list_slot_templates(&self.pool, venue_id).await
    }

    async fn list_confirmed_bookings(&self, venue_id: Uuid, date: NaiveDate) -> Result<Vec<Booking>> {
        turf_db::list_confirmed_bookings(&self.pool, venue_id, date).await
    }

    async fn create_booking(&self, booking: &NewBooking) -> Result<BookingInsert> {
        turf_db::create_booking(&self.pool, booking).await
    }

    async fn get_booking(&self, booking_id: Uuid) -> Result<Option<BookingDetail>> {
        turf_db::get_booking(&self.pool, booking_id).await
    }

    async fn update_booking_payment_status(&self, booking_id: Uuid, status: PaymentStatus) -> Result<bool> {
        turf_db::update_booking_payment_status(&self.pool, booking_id, status).await
    }

    async fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<BookingDetail>> {
        turf_db::list_bookings_for_user(&self.pool, user_id).await
    }

    async fn list_bookings_for_vendor(&self, turf_ids: &[Uuid]) -> Result<Vec<BookingDetail>> {
        turf_db::list_bookings_for_turfs(&self.pool, turf_ids).await
    }

    async fn find_vendor_by_user(&self, user_id: Uuid) -> Result<Option<Vendor>> {
        turf_db::find_vendor_by_user(&self.pool, user_id).await
    }

    async fn create_vendor(
        &self,
        user_id: Uuid,
        business_name: &str,
        business_address: Option<&str>,
    ) -> Result<Vendor> {
        turf_db::create_vendor(&self.pool, user_id, business_name, business_address).await
    }

    async fn list_vendors(&self) -> Result<Vec<Vendor>> {
        turf_db::list_vendors(&self.pool).await
    }

    async fn set_vendor_approved(&self, vendor_id: Uuid, approved: bool) -> Result<bool> {
        turf_db::set_vendor_approved(&self.pool, vendor_id, approved).await
    }

    async fn remove_vendor(&self, vendor_id: Uuid) -> Result<bool> {
        turf_db::remove_vendor(&self.pool, vendor_id).await
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>> {
        turf_db::find_profile(&self.pool, user_id).await
    }

    async fn profile_names(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
        turf_db::profile_names(&self.pool, user_ids).await
    }

    async fn upsert_profile(&self, user_id: Uuid, full_name: Option<&str>) -> Result<()> {
        turf_db::upsert_profile(&self.pool, user_id, full_name).await
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<Role>> {
        turf_db::roles_for_user(&self.pool, user_id).await
    }

    async fn grant_role(&self, user_id: Uuid, role: Role) -> Result<()> {
        turf_db::grant_role(&self.pool, user_id, role).await
    }

    async fn platform_stats(&self) -> Result<PlatformStats> {
        turf_db::platform_stats(&self.pool).await
    }
}
