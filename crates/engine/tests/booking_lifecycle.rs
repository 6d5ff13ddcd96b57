use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use sqlx::SqlitePool;
use turf_engine::{BookingError, BookingRequest, Engine, PaymentSettings, Registration, SqliteStore};
use turf_models::{Actor, HomeView, NewTurf, PaymentStatus, Role, VenueFilter, Venue};
use uuid::Uuid;

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

fn at(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
}

fn settings() -> PaymentSettings {
    PaymentSettings {
        payee_vpa: "arena@upi".into(),
        payee_name: "GameZoneXP".into(),
        currency: "INR".into(),
    }
}

async fn setup() -> (SqlitePool, Engine) {
    let pool = turf_db::connect_memory().await.unwrap();
    let engine = Engine::new(Arc::new(SqliteStore::new(pool.clone())), settings()).with_today(june_first);
    (pool, engine)
}

fn arena() -> NewTurf {
    NewTurf {
        name: "Arena1".into(),
        description: "Floodlit 5-a-side".into(),
        address: "MG Road".into(),
        city: "Pune".into(),
        game_type: "Football".into(),
        price_per_hour: 500.0,
        facilities: vec!["Parking".into()],
        image_url: None,
    }
}

async fn vendor_with_turf(pool: &SqlitePool, engine: &Engine) -> (Actor, Venue) {
    let user_id = Uuid::new_v4();
    turf_db::upsert_profile(pool, user_id, Some("Ravi Turfs")).await.unwrap();
    turf_db::grant_role(pool, user_id, Role::Vendor).await.unwrap();
    let vendor = engine.resolve_actor(user_id).await.unwrap();
    let venue = engine.create_turf(&vendor, arena()).await.unwrap();
    (vendor, venue)
}

fn request(venue: &Venue, hour: u32) -> BookingRequest {
    BookingRequest {
        turf_id: venue.id,
        booking_date: june_first(),
        start_time: Some(at(hour)),
    }
}

#[tokio::test]
async fn fresh_turf_has_thirteen_bookable_slots() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;

    let slots = engine.availability(&Actor::Anonymous, venue.id, june_first()).await.unwrap();

    assert_eq!(slots.len(), 13);
    assert!(slots.iter().all(|s| s.bookable));
    assert_eq!(slots[0].start_time, at(9));
    assert_eq!(slots[12].end_time, at(22));
}

#[tokio::test]
async fn confirmed_booking_blocks_only_its_slot() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    let player = Actor::player(Uuid::new_v4());

    engine.create_booking(&player, &request(&venue, 14)).await.unwrap();

    let slots = engine.availability(&Actor::Anonymous, venue.id, june_first()).await.unwrap();
    for slot in &slots {
        assert_eq!(slot.bookable, slot.start_time != at(14), "slot {}", slot.start_time);
    }

    let next_day = june_first().succ_opt().unwrap();
    let other_day = engine.availability(&Actor::Anonymous, venue.id, next_day).await.unwrap();
    assert!(other_day.iter().all(|s| s.bookable));
}

#[tokio::test]
async fn booking_charges_hourly_price_with_pending_payment() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    let player_id = Uuid::new_v4();
    let player = Actor::player(player_id);

    let booking = engine.create_booking(&player, &request(&venue, 18)).await.unwrap();

    assert_eq!(booking.total_amount, 500.0);
    assert_eq!(booking.payment_status, PaymentStatus::Pending);
    assert_eq!(booking.user_id, player_id);
    assert_eq!(booking.end_time, at(19));

    let mine = engine.my_bookings(&player).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].turf_name, "Arena1");
}

#[tokio::test]
async fn concurrent_bookings_for_one_slot_yield_single_winner() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;

    let attempts = (0..8).map(|_| {
        let engine = engine.clone();
        let req = request(&venue, 20);
        async move { engine.create_booking(&Actor::player(Uuid::new_v4()), &req).await }
    });
    let results = futures::future::join_all(attempts).await;

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(BookingError::Conflict { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(conflicts, 7);

    let slots = engine.availability(&Actor::Anonymous, venue.id, june_first()).await.unwrap();
    assert_eq!(slots.iter().filter(|s| !s.bookable).count(), 1);
}

#[tokio::test]
async fn booking_a_taken_slot_reports_conflict_details() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;

    engine
        .create_booking(&Actor::player(Uuid::new_v4()), &request(&venue, 10))
        .await
        .unwrap();
    let err = engine
        .create_booking(&Actor::player(Uuid::new_v4()), &request(&venue, 10))
        .await
        .unwrap_err();

    match err {
        BookingError::Conflict { turf_id, date, start_time } => {
            assert_eq!(turf_id, venue.id);
            assert_eq!(date, june_first());
            assert_eq!(start_time, at(10));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_booking_requests_are_rejected() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    let player = Actor::player(Uuid::new_v4());

    let anonymous = engine.create_booking(&Actor::Anonymous, &request(&venue, 9)).await;
    assert!(matches!(anonymous, Err(BookingError::Auth)));

    let no_slot = BookingRequest {
        start_time: None,
        ..request(&venue, 9)
    };
    assert!(matches!(
        engine.create_booking(&player, &no_slot).await,
        Err(BookingError::Validation(_))
    ));

    let past = BookingRequest {
        booking_date: june_first().pred_opt().unwrap(),
        ..request(&venue, 9)
    };
    assert!(matches!(
        engine.create_booking(&player, &past).await,
        Err(BookingError::Validation(_))
    ));

    let after_hours = request(&venue, 23);
    assert!(matches!(
        engine.create_booking(&player, &after_hours).await,
        Err(BookingError::Validation(_))
    ));

    let unknown = BookingRequest {
        turf_id: Uuid::new_v4(),
        ..request(&venue, 9)
    };
    assert!(matches!(
        engine.create_booking(&player, &unknown).await,
        Err(BookingError::NotFound(_))
    ));
}

#[tokio::test]
async fn inactive_turf_is_hidden_and_unbookable() {
    let (pool, engine) = setup().await;
    let (vendor, venue) = vendor_with_turf(&pool, &engine).await;

    let updated = engine.set_turf_active(&vendor, venue.id, false).await.unwrap();
    assert!(!updated.active);

    let listed = engine.list_venues(&Actor::Anonymous, &VenueFilter::default()).await.unwrap();
    assert!(listed.is_empty());

    let admin = Actor::admin(Uuid::new_v4());
    let all = engine.list_venues(&admin, &VenueFilter::default()).await.unwrap();
    assert_eq!(all.len(), 1);

    let result = engine.create_booking(&Actor::player(Uuid::new_v4()), &request(&venue, 9)).await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn vendors_cannot_toggle_other_vendors_turfs() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    let (other_vendor, _) = vendor_with_turf(&pool, &engine).await;

    let result = engine.set_turf_active(&other_vendor, venue.id, false).await;
    assert!(matches!(result, Err(BookingError::Forbidden(_))));

    let player = engine.set_turf_active(&Actor::player(Uuid::new_v4()), venue.id, false).await;
    assert!(matches!(player, Err(BookingError::Forbidden(_))));
}

#[tokio::test]
async fn payment_request_and_idempotent_confirmation() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    let player = Actor::player(Uuid::new_v4());
    let booking = engine.create_booking(&player, &request(&venue, 16)).await.unwrap();

    let payment = engine.payment_request(&player, booking.id).await.unwrap();
    assert_eq!(payment.amount, 500.0);
    assert!(payment.uri.starts_with("upi://pay?pa=arena@upi&"));
    assert!(payment.uri.ends_with("tn=Turf%20Booking%20Payment%20-%20Arena1"));

    let first = engine.confirm_payment(&player, booking.id).await.unwrap();
    assert!(first.changed);
    assert!(!first.verified);
    assert_eq!(first.payment_status, PaymentStatus::Paid);

    let second = engine.confirm_payment(&player, booking.id).await.unwrap();
    assert!(!second.changed);
    assert_eq!(second.payment_status, PaymentStatus::Paid);

    let again = engine.payment_request(&player, booking.id).await;
    assert!(matches!(again, Err(BookingError::Validation(_))));
}

#[tokio::test]
async fn only_the_booking_owner_may_confirm_payment() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    let booking = engine
        .create_booking(&Actor::player(Uuid::new_v4()), &request(&venue, 12))
        .await
        .unwrap();

    let stranger = engine.confirm_payment(&Actor::player(Uuid::new_v4()), booking.id).await;
    assert!(matches!(stranger, Err(BookingError::Forbidden(_))));

    let anonymous = engine.confirm_payment(&Actor::Anonymous, booking.id).await;
    assert!(matches!(anonymous, Err(BookingError::Auth)));

    let missing = engine.confirm_payment(&Actor::player(Uuid::new_v4()), Uuid::new_v4()).await;
    assert!(matches!(missing, Err(BookingError::NotFound(_))));
}

#[tokio::test]
async fn vendor_dashboard_shows_player_names_and_paid_revenue() {
    let (pool, engine) = setup().await;
    let (vendor, venue) = vendor_with_turf(&pool, &engine).await;

    let named_id = Uuid::new_v4();
    turf_db::upsert_profile(&pool, named_id, Some("Asha")).await.unwrap();
    let named = Actor::player(named_id);
    let anonymous_player = Actor::player(Uuid::new_v4());

    let paid = engine.create_booking(&named, &request(&venue, 9)).await.unwrap();
    engine.create_booking(&anonymous_player, &request(&venue, 10)).await.unwrap();
    engine.confirm_payment(&named, paid.id).await.unwrap();

    let dashboard = engine.vendor_dashboard(&vendor).await.unwrap();
    assert_eq!(dashboard.vendor.business_name, "Ravi Turfs");
    assert!(!dashboard.vendor.approved);
    assert_eq!(dashboard.turfs.len(), 1);
    assert_eq!(dashboard.total_bookings, 2);
    assert_eq!(dashboard.total_revenue, 500.0);

    let mut names: Vec<&str> = dashboard
        .recent_bookings
        .iter()
        .map(|b| b.player_name.as_str())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Asha", "Unknown"]);
}

#[tokio::test]
async fn vendor_without_profile_gets_default_business_name() {
    let (pool, engine) = setup().await;
    let user_id = Uuid::new_v4();
    turf_db::grant_role(&pool, user_id, Role::Vendor).await.unwrap();
    let vendor = engine.resolve_actor(user_id).await.unwrap();

    let profile = engine.vendor_profile(&vendor).await.unwrap();
    assert_eq!(profile.business_name, "New Vendor");

    let same = engine.vendor_profile(&vendor).await.unwrap();
    assert_eq!(same.id, profile.id);
}

#[tokio::test]
async fn admin_moderation_flow() {
    let (pool, engine) = setup().await;
    let (vendor, venue) = vendor_with_turf(&pool, &engine).await;
    let admin_id = Uuid::new_v4();
    turf_db::grant_role(&pool, admin_id, Role::Admin).await.unwrap();
    let admin = engine.resolve_actor(admin_id).await.unwrap();
    assert_eq!(engine.home(&admin), HomeView::AdminDashboard);

    let dashboard = engine.admin_dashboard(&admin).await.unwrap();
    assert_eq!(dashboard.stats.total_turfs, 1);
    assert_eq!(dashboard.recent_turfs.len(), 1);
    assert_eq!(dashboard.recent_turfs[0].vendor_business_name.as_deref(), Some("Ravi Turfs"));
    let vendor_id = dashboard.vendors[0].id;

    engine.approve_vendor(&admin, vendor_id, true).await.unwrap();
    assert!(engine.vendor_profile(&vendor).await.unwrap().approved);

    let denied = engine.admin_dashboard(&vendor).await;
    assert!(matches!(denied, Err(BookingError::Forbidden(_))));

    engine.delete_turf(&admin, venue.id).await.unwrap();
    let gone = engine.get_venue(&Actor::Anonymous, venue.id).await;
    assert!(matches!(gone, Err(BookingError::NotFound(_))));

    engine.remove_vendor(&admin, vendor_id).await.unwrap();
    let missing = engine.remove_vendor(&admin, vendor_id).await;
    assert!(matches!(missing, Err(BookingError::NotFound(_))));
    assert_eq!(engine.platform_stats(&admin).await.unwrap().total_vendors, 0);
}

#[tokio::test]
async fn role_resolution_picks_highest_privilege() {
    let (pool, engine) = setup().await;
    let user_id = Uuid::new_v4();

    let fresh = engine.resolve_actor(user_id).await.unwrap();
    assert_eq!(engine.home(&fresh), HomeView::VenueDirectory);

    turf_db::grant_role(&pool, user_id, Role::Player).await.unwrap();
    turf_db::grant_role(&pool, user_id, Role::Vendor).await.unwrap();
    let actor = engine.resolve_actor(user_id).await.unwrap();
    assert_eq!(engine.home(&actor), HomeView::VendorDashboard);
    assert_eq!(engine.home(&Actor::Anonymous), HomeView::Landing);
}

#[tokio::test]
async fn store_failures_surface_as_store_errors() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    pool.close().await;

    let result = engine.availability(&Actor::Anonymous, venue.id, june_first()).await;
    assert!(matches!(result, Err(BookingError::Store(_))));

    let booking = engine.create_booking(&Actor::player(Uuid::new_v4()), &request(&venue, 9)).await;
    assert!(matches!(booking, Err(BookingError::Store(_))));
}

#[tokio::test]
async fn registering_as_vendor_unlocks_turf_management() {
    let (_pool, engine) = setup().await;
    let user_id = Uuid::new_v4();

    let fresh = engine.resolve_actor(user_id).await.unwrap();
    assert_eq!(fresh, Actor::player(user_id));
    let denied = engine.create_turf(&fresh, arena()).await;
    assert!(matches!(denied, Err(BookingError::Forbidden(_))));

    let registration = Registration {
        role: Role::Vendor,
        full_name: Some("Ravi".into()),
        business_name: Some(" Ravi Turfs ".into()),
        business_address: Some("12 MG Road, Pune".into()),
    };
    let vendor = engine.register(&fresh, registration).await.unwrap();
    assert_eq!(vendor, Actor::vendor(user_id));
    assert_eq!(engine.home(&vendor), HomeView::VendorDashboard);

    let venue = engine.create_turf(&vendor, arena()).await.unwrap();
    let profile = engine.vendor_profile(&vendor).await.unwrap();
    assert_eq!(venue.vendor_id, profile.id);
    assert_eq!(profile.business_name, "Ravi Turfs");
    assert_eq!(profile.business_address.as_deref(), Some("12 MG Road, Pune"));
}

#[tokio::test]
async fn registration_rejects_admin_and_anonymous_callers() {
    let (_pool, engine) = setup().await;
    let user_id = Uuid::new_v4();
    let as_role = |role| Registration {
        role,
        full_name: None,
        business_name: None,
        business_address: None,
    };

    let admin = engine.register(&Actor::player(user_id), as_role(Role::Admin)).await;
    assert!(matches!(admin, Err(BookingError::Forbidden(_))));
    assert_eq!(engine.resolve_actor(user_id).await.unwrap(), Actor::player(user_id));

    let anonymous = engine.register(&Actor::Anonymous, as_role(Role::Player)).await;
    assert!(matches!(anonymous, Err(BookingError::Auth)));

    let player = engine.register(&Actor::player(user_id), as_role(Role::Player)).await.unwrap();
    assert_eq!(player, Actor::player(user_id));
}

#[tokio::test]
async fn operator_grant_promotes_existing_user() {
    let (_pool, engine) = setup().await;
    let user_id = Uuid::new_v4();

    let admin = engine.grant_role(user_id, Role::Admin).await.unwrap();
    assert_eq!(admin, Actor::admin(user_id));

    let other = Uuid::new_v4();
    let vendor = engine.grant_role(other, Role::Vendor).await.unwrap();
    assert_eq!(vendor, Actor::vendor(other));
    assert_eq!(engine.vendor_profile(&vendor).await.unwrap().business_name, "New Vendor");
}

#[tokio::test]
async fn create_turf_checks_capability_before_the_body() {
    let (_pool, engine) = setup().await;
    let invalid = NewTurf {
        name: String::new(),
        price_per_hour: -1.0,
        ..arena()
    };

    let anonymous = engine.create_turf(&Actor::Anonymous, invalid.clone()).await;
    assert!(matches!(anonymous, Err(BookingError::Auth)));

    let player = engine.create_turf(&Actor::player(Uuid::new_v4()), invalid).await;
    assert!(matches!(player, Err(BookingError::Forbidden(_))));
}

#[tokio::test]
async fn my_bookings_include_the_venue_game_type() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    let player = Actor::player(Uuid::new_v4());
    engine.create_booking(&player, &request(&venue, 11)).await.unwrap();

    let mine = engine.my_bookings(&player).await.unwrap();
    assert_eq!(mine[0].turf_game_type, "Football");
    assert_eq!(mine[0].turf_address, "MG Road");
}

#[tokio::test]
async fn failed_payment_cannot_be_confirmed() {
    let (pool, engine) = setup().await;
    let (_, venue) = vendor_with_turf(&pool, &engine).await;
    let player = Actor::player(Uuid::new_v4());
    let booking = engine.create_booking(&player, &request(&venue, 13)).await.unwrap();

    assert!(turf_db::update_booking_payment_status(&pool, booking.id, PaymentStatus::Failed)
        .await
        .unwrap());

    let result = engine.confirm_payment(&player, booking.id).await;
    assert!(matches!(result, Err(BookingError::Validation(_))));
    let stored = turf_db::get_booking(&pool, booking.id).await.unwrap().unwrap();
    assert_eq!(stored.booking.payment_status, PaymentStatus::Failed);
}
