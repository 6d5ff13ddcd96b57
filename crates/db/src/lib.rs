use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};
use turf_models::{
    Booking, BookingDetail, BookingStatus, NewBooking, NewTurf, PaymentStatus, PlatformStats,
    Profile, Role, SlotTemplate, TurfWithVendor, Vendor, Venue,
};
use uuid::Uuid;

/// Opens a file database in WAL mode. Concurrent writers wait on the lock
/// instead of failing with `SQLITE_BUSY`.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;
    info!("Connected to database: {database_url}");
    Ok(pool)
}

/// Private in-memory database with migrations applied.
///
/// Held on a single connection that never expires; every new connection to
/// `sqlite::memory:` would otherwise see an empty database.
pub async fn connect_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Migrations applied");
    Ok(())
}

const TURF_COLUMNS: &str = "t.id, t.vendor_id, t.name, t.description, t.address, t.city, \
    t.game_type, t.price_per_hour, t.facilities, t.images, t.rating, t.total_reviews, \
    t.active, t.created_at";

const BOOKING_DETAIL_COLUMNS: &str = "t.name AS turf_name, t.address AS turf_address, \
    t.game_type AS turf_game_type";

const BOOKING_COLUMNS: &str = "b.id, b.turf_id, b.user_id, b.booking_date, b.start_time, \
    b.end_time, b.total_amount, b.payment_status, b.booking_status, b.payment_method, \
    b.created_at";

const VENDOR_COLUMNS: &str = "id, user_id, business_name, business_address, approved, created_at";

// --- Turfs ---

pub async fn list_venues(pool: &SqlitePool, active: Option<bool>) -> Result<Vec<Venue>> {
    let venues = match active {
        Some(active) => {
            let sql = format!(
                "SELECT {TURF_COLUMNS} FROM turfs t WHERE t.active = ? \
                 ORDER BY t.rating DESC, t.created_at DESC"
            );
            sqlx::query_as::<_, Venue>(&sql)
                .bind(active)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                "SELECT {TURF_COLUMNS} FROM turfs t ORDER BY t.rating DESC, t.created_at DESC"
            );
            sqlx::query_as::<_, Venue>(&sql).fetch_all(pool).await?
        }
    };
    Ok(venues)
}

pub async fn get_venue(pool: &SqlitePool, turf_id: Uuid) -> Result<Option<Venue>> {
    let sql = format!("SELECT {TURF_COLUMNS} FROM turfs t WHERE t.id = ?");
    let venue = sqlx::query_as::<_, Venue>(&sql)
        .bind(turf_id)
        .fetch_optional(pool)
        .await?;
    Ok(venue)
}

pub async fn list_turfs_for_vendor(pool: &SqlitePool, vendor_id: Uuid) -> Result<Vec<Venue>> {
    let sql = format!(
        "SELECT {TURF_COLUMNS} FROM turfs t WHERE t.vendor_id = ? ORDER BY t.created_at DESC"
    );
    let venues = sqlx::query_as::<_, Venue>(&sql)
        .bind(vendor_id)
        .fetch_all(pool)
        .await?;
    Ok(venues)
}

pub async fn list_recent_turfs(pool: &SqlitePool, limit: i64) -> Result<Vec<TurfWithVendor>> {
    let sql = format!(
        "SELECT {TURF_COLUMNS}, v.business_name AS vendor_business_name \
         FROM turfs t LEFT JOIN vendors v ON v.id = t.vendor_id \
         ORDER BY t.created_at DESC LIMIT ?"
    );
    let turfs = sqlx::query_as::<_, TurfWithVendor>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(turfs)
}

/// Inserts a turf and its slot templates in one transaction.
pub async fn create_turf(
    pool: &SqlitePool,
    vendor_id: Uuid,
    turf: &NewTurf,
    slots: &[(NaiveTime, NaiveTime)],
) -> Result<Venue> {
    let turf_id = Uuid::new_v4();
    let images: Vec<String> = turf.image_url.iter().cloned().collect();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO turfs (id, vendor_id, name, description, address, city, game_type, \
            price_per_hour, facilities, images, rating, total_reviews, active, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, 0, 1, ?)",
    )
    .bind(turf_id)
    .bind(vendor_id)
    .bind(&turf.name)
    .bind(&turf.description)
    .bind(&turf.address)
    .bind(&turf.city)
    .bind(&turf.game_type)
    .bind(turf.price_per_hour)
    .bind(Json(&turf.facilities))
    .bind(Json(&images))
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    for (start, end) in slots {
        sqlx::query(
            "INSERT INTO time_slots (id, turf_id, start_time, end_time, is_available) \
             VALUES (?, ?, ?, ?, 1)",
        )
        .bind(Uuid::new_v4())
        .bind(turf_id)
        .bind(*start)
        .bind(*end)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    info!("Turf {turf_id} created with {} slot templates", slots.len());

    get_venue(pool, turf_id)
        .await?
        .ok_or_else(|| anyhow!("turf {turf_id} missing after insert"))
}

pub async fn set_turf_active(pool: &SqlitePool, turf_id: Uuid, active: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE turfs SET active = ? WHERE id = ?")
        .bind(active)
        .bind(turf_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes a turf together with its slot templates and bookings.
pub async fn delete_turf(pool: &SqlitePool, turf_id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await?;
    sqlx::query("DELETE FROM bookings WHERE turf_id = ?")
        .bind(turf_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM time_slots WHERE turf_id = ?")
        .bind(turf_id)
        .execute(&mut *tx)
        .await?;
    let result = sqlx::query("DELETE FROM turfs WHERE id = ?")
        .bind(turf_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

// --- Slot templates ---

pub async fn list_slot_templates(pool: &SqlitePool, turf_id: Uuid) -> Result<Vec<SlotTemplate>> {
    let slots = sqlx::query_as::<_, SlotTemplate>(
        "SELECT id, turf_id, start_time, end_time, is_available \
         FROM time_slots WHERE turf_id = ? ORDER BY start_time",
    )
    .bind(turf_id)
    .fetch_all(pool)
    .await?;
    Ok(slots)
}

// --- Bookings ---

pub enum BookingInsert {
    Inserted(Booking),
    /// A confirmed booking already holds the (turf, date, start time) slot.
    Conflict,
}

/// True when the partial unique index on confirmed slots rejected a write.
fn is_slot_taken(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(e) if e.is_unique_violation())
}

/// Claims a slot with a single conditional insert.
///
/// The row is written only if no confirmed booking holds the same
/// (turf, date, start time); the partial unique index backs this up when two
/// writers race past the `NOT EXISTS` check.
pub async fn create_booking(pool: &SqlitePool, booking: &NewBooking) -> Result<BookingInsert> {
    let booking_id = Uuid::new_v4();

    let result = sqlx::query(
        "INSERT INTO bookings (id, turf_id, user_id, booking_date, start_time, end_time, \
            total_amount, payment_status, booking_status, payment_method, created_at) \
         SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, 'qr_code', ? \
         WHERE NOT EXISTS ( \
            SELECT 1 FROM bookings \
            WHERE turf_id = ? AND booking_date = ? AND start_time = ? AND booking_status = ?)",
    )
    .bind(booking_id)
    .bind(booking.turf_id)
    .bind(booking.user_id)
    .bind(booking.booking_date)
    .bind(booking.start_time)
    .bind(booking.end_time)
    .bind(booking.total_amount)
    .bind(PaymentStatus::Pending)
    .bind(BookingStatus::Confirmed)
    .bind(Utc::now())
    .bind(booking.turf_id)
    .bind(booking.booking_date)
    .bind(booking.start_time)
    .bind(BookingStatus::Confirmed)
    .execute(pool)
    .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            debug!("Slot {} {} on turf {} already taken", booking.booking_date, booking.start_time, booking.turf_id);
            Ok(BookingInsert::Conflict)
        }
        Ok(_) => {
            let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings b WHERE b.id = ?");
            let row = sqlx::query_as::<_, Booking>(&sql)
                .bind(booking_id)
                .fetch_one(pool)
                .await?;
            Ok(BookingInsert::Inserted(row))
        }
        Err(e) if is_slot_taken(&e) => {
            debug!("Slot {} {} on turf {} lost to a concurrent insert", booking.booking_date, booking.start_time, booking.turf_id);
            Ok(BookingInsert::Conflict)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn get_booking(pool: &SqlitePool, booking_id: Uuid) -> Result<Option<BookingDetail>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS}, {BOOKING_DETAIL_COLUMNS} \
         FROM bookings b JOIN turfs t ON t.id = b.turf_id WHERE b.id = ?"
    );
    let booking = sqlx::query_as::<_, BookingDetail>(&sql)
        .bind(booking_id)
        .fetch_optional(pool)
        .await?;
    Ok(booking)
}

pub async fn list_confirmed_bookings(
    pool: &SqlitePool,
    turf_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings b \
         WHERE b.turf_id = ? AND b.booking_date = ? AND b.booking_status = ? \
         ORDER BY b.start_time"
    );
    let bookings = sqlx::query_as::<_, Booking>(&sql)
        .bind(turf_id)
        .bind(date)
        .bind(BookingStatus::Confirmed)
        .fetch_all(pool)
        .await?;
    Ok(bookings)
}

pub async fn list_bookings_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<BookingDetail>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS}, {BOOKING_DETAIL_COLUMNS} \
         FROM bookings b JOIN turfs t ON t.id = b.turf_id \
         WHERE b.user_id = ? ORDER BY b.booking_date DESC, b.start_time DESC"
    );
    let bookings = sqlx::query_as::<_, BookingDetail>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(bookings)
}

pub async fn list_bookings_for_turfs(
    pool: &SqlitePool,
    turf_ids: &[Uuid],
) -> Result<Vec<BookingDetail>> {
    if turf_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
        "SELECT {BOOKING_COLUMNS}, {BOOKING_DETAIL_COLUMNS} \
         FROM bookings b JOIN turfs t ON t.id = b.turf_id WHERE b.turf_id IN ("
    ));
    let mut ids = qb.separated(", ");
    for id in turf_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY b.booking_date DESC, b.start_time DESC");

    let bookings = qb.build_query_as::<BookingDetail>().fetch_all(pool).await?;
    Ok(bookings)
}

/// Moves a booking's payment status forward.
///
/// Only a `pending` booking (or one already at `status`) is touched; returns
/// false when the booking is missing or sits in another state.
pub async fn update_booking_payment_status(
    pool: &SqlitePool,
    booking_id: Uuid,
    status: PaymentStatus,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE bookings SET payment_status = ? WHERE id = ? AND payment_status IN (?, ?)",
    )
    .bind(status)
    .bind(booking_id)
    .bind(PaymentStatus::Pending)
    .bind(status)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

// --- Vendors ---

pub async fn find_vendor_by_user(pool: &SqlitePool, user_id: Uuid) -> Result<Option<Vendor>> {
    let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE user_id = ?");
    let vendor = sqlx::query_as::<_, Vendor>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(vendor)
}

pub async fn get_vendor(pool: &SqlitePool, vendor_id: Uuid) -> Result<Option<Vendor>> {
    let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = ?");
    let vendor = sqlx::query_as::<_, Vendor>(&sql)
        .bind(vendor_id)
        .fetch_optional(pool)
        .await?;
    Ok(vendor)
}

pub async fn create_vendor(
    pool: &SqlitePool,
    user_id: Uuid,
    business_name: &str,
    business_address: Option<&str>,
) -> Result<Vendor> {
    let vendor_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO vendors (id, user_id, business_name, business_address, approved, created_at) \
         VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(vendor_id)
    .bind(user_id)
    .bind(business_name)
    .bind(business_address)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    info!("Vendor {vendor_id} created for user {user_id}");

    get_vendor(pool, vendor_id)
        .await?
        .ok_or_else(|| anyhow!("vendor {vendor_id} missing after insert"))
}

pub async fn list_vendors(pool: &SqlitePool) -> Result<Vec<Vendor>> {
    let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY created_at DESC");
    let vendors = sqlx::query_as::<_, Vendor>(&sql).fetch_all(pool).await?;
    Ok(vendors)
}

pub async fn set_vendor_approved(pool: &SqlitePool, vendor_id: Uuid, approved: bool) -> Result<bool> {
    let result = sqlx::query("UPDATE vendors SET approved = ? WHERE id = ?")
        .bind(approved)
        .bind(vendor_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes a vendor, everything hanging off its turfs, and the user's vendor role.
pub async fn remove_vendor(pool: &SqlitePool, vendor_id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let user_id: Option<Uuid> = sqlx::query_scalar("SELECT user_id FROM vendors WHERE id = ?")
        .bind(vendor_id)
        .fetch_optional(&mut *tx)
        .await?;
    let Some(user_id) = user_id else {
        return Ok(false);
    };

    sqlx::query(
        "DELETE FROM bookings WHERE turf_id IN (SELECT id FROM turfs WHERE vendor_id = ?)",
    )
    .bind(vendor_id)
    .execute(&mut *tx)
    .await?;
    sqlx::query(
        "DELETE FROM time_slots WHERE turf_id IN (SELECT id FROM turfs WHERE vendor_id = ?)",
    )
    .bind(vendor_id)
    .execute(&mut *tx)
    .await?;
    let turfs = sqlx::query("DELETE FROM turfs WHERE vendor_id = ?")
        .bind(vendor_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM vendors WHERE id = ?")
        .bind(vendor_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM user_roles WHERE user_id = ? AND role = ?")
        .bind(user_id)
        .bind(Role::Vendor)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!("Vendor {vendor_id} removed along with {} turf(s)", turfs.rows_affected());
    Ok(true)
}

// --- Profiles & roles ---

pub async fn upsert_profile(pool: &SqlitePool, user_id: Uuid, full_name: Option<&str>) -> Result<()> {
    sqlx::query(
        "INSERT INTO profiles (id, full_name, created_at) VALUES (?, ?, ?) \
         ON CONFLICT(id) DO UPDATE SET full_name = excluded.full_name",
    )
    .bind(user_id)
    .bind(full_name)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_profile(pool: &SqlitePool, user_id: Uuid) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT id, full_name FROM profiles WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(profile)
}

/// Display names for the given users. Users without a profile or name are absent.
pub async fn profile_names(pool: &SqlitePool, user_ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT id, full_name FROM profiles WHERE id IN (");
    let mut ids = qb.separated(", ");
    for id in user_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(")");

    let profiles = qb.build_query_as::<Profile>().fetch_all(pool).await?;
    Ok(profiles
        .into_iter()
        .filter_map(|p| p.full_name.map(|name| (p.id, name)))
        .collect())
}

pub async fn roles_for_user(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Role>> {
    let roles = sqlx::query_scalar::<_, Role>("SELECT role FROM user_roles WHERE user_id = ?")
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(roles)
}

pub async fn grant_role(pool: &SqlitePool, user_id: Uuid, role: Role) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO user_roles (user_id, role) VALUES (?, ?)")
        .bind(user_id)
        .bind(role)
        .execute(pool)
        .await?;
    Ok(())
}

// --- Stats ---

pub async fn platform_stats(pool: &SqlitePool) -> Result<PlatformStats> {
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
        .fetch_one(pool)
        .await?;
    let total_vendors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vendors")
        .fetch_one(pool)
        .await?;
    let total_turfs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM turfs")
        .fetch_one(pool)
        .await?;
    let total_bookings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await?;
    let total_revenue: f64 = sqlx::query_scalar(
        "SELECT CAST(COALESCE(SUM(total_amount), 0) AS REAL) FROM bookings WHERE payment_status = ?",
    )
    .bind(PaymentStatus::Paid)
    .fetch_one(pool)
    .await?;

    Ok(PlatformStats {
        total_users,
        total_vendors,
        total_turfs,
        total_bookings,
        total_revenue,
    })
}
