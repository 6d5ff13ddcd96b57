use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info, warn};
use turf_config::Config;
use turf_engine::{
    AdminDashboard, BookingError, BookingRequest, DirectoryFacets, Engine, Registration,
    VendorDashboard,
};
use turf_models::{
    AvailableSlot, Booking, BookingDetail, NewTurf, PaymentConfirmation, PaymentRequest, Venue,
    VenueFilter,
};
use uuid::Uuid;

use crate::auth::CurrentActor;
use crate::version_string;

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

#[derive(Clone)]
pub struct AppState {
    pub engine: Engine,
    pub jwt_key: Arc<DecodingKey>,
}

pub fn api_error(e: BookingError) -> (StatusCode, String) {
    let status = match &e {
        BookingError::Validation(_) => StatusCode::BAD_REQUEST,
        BookingError::Auth => StatusCode::UNAUTHORIZED,
        BookingError::Forbidden(_) => StatusCode::FORBIDDEN,
        BookingError::NotFound(_) => StatusCode::NOT_FOUND,
        BookingError::Conflict { .. } => StatusCode::CONFLICT,
        BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    match status {
        StatusCode::INTERNAL_SERVER_ERROR => error!("Store failure: {e:#}"),
        StatusCode::CONFLICT => warn!("{e}"),
        _ => {}
    }

    let message = match e {
        BookingError::Auth => "Please log in to continue".to_string(),
        other => other.to_string(),
    };
    (status, message)
}

// --- General ---

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "turfbook",
        "version": version_string()
    }))
}

async fn api_home(State(state): State<AppState>, CurrentActor(actor): CurrentActor) -> Json<serde_json::Value> {
    let view = state.engine.home(&actor);
    Json(json!({ "view": view, "actor": actor }))
}

async fn api_register(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<Registration>,
) -> ApiResult<serde_json::Value> {
    let actor = state.engine.register(&actor, body).await.map_err(api_error)?;
    let view = state.engine.home(&actor);
    Ok(Json(json!({ "view": view, "actor": actor })))
}

// --- Directory ---

async fn api_list_venues(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Query(filter): Query<VenueFilter>,
) -> ApiResult<Vec<Venue>> {
    state.engine.list_venues(&actor, &filter).await.map(Json).map_err(api_error)
}

async fn api_venue_facets(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<DirectoryFacets> {
    state.engine.directory_facets(&actor).await.map(Json).map_err(api_error)
}

async fn api_get_venue(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(venue_id): Path<Uuid>,
) -> ApiResult<Venue> {
    state.engine.get_venue(&actor, venue_id).await.map(Json).map_err(api_error)
}

#[derive(Deserialize)]
struct AvailabilityQuery {
    date: NaiveDate,
}

async fn api_availability(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(venue_id): Path<Uuid>,
    Query(params): Query<AvailabilityQuery>,
) -> ApiResult<Vec<AvailableSlot>> {
    state
        .engine
        .availability(&actor, venue_id, params.date)
        .await
        .map(Json)
        .map_err(api_error)
}

// --- Bookings ---

async fn api_create_booking(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<BookingRequest>,
) -> Result<(StatusCode, Json<Booking>), (StatusCode, String)> {
    let booking = state.engine.create_booking(&actor, &body).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn api_my_bookings(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<Vec<BookingDetail>> {
    state.engine.my_bookings(&actor).await.map(Json).map_err(api_error)
}

async fn api_payment_request(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<PaymentRequest> {
    state.engine.payment_request(&actor, booking_id).await.map(Json).map_err(api_error)
}

async fn api_confirm_payment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(booking_id): Path<Uuid>,
) -> ApiResult<PaymentConfirmation> {
    state.engine.confirm_payment(&actor, booking_id).await.map(Json).map_err(api_error)
}

// --- Vendor ---

async fn api_vendor_dashboard(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<VendorDashboard> {
    state.engine.vendor_dashboard(&actor).await.map(Json).map_err(api_error)
}

async fn api_create_turf(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(body): Json<NewTurf>,
) -> Result<(StatusCode, Json<Venue>), (StatusCode, String)> {
    let venue = state.engine.create_turf(&actor, body).await.map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(venue)))
}

#[derive(Deserialize)]
struct TurfActiveRequest {
    active: bool,
}

async fn api_set_turf_active(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(venue_id): Path<Uuid>,
    Json(body): Json<TurfActiveRequest>,
) -> ApiResult<Venue> {
    state
        .engine
        .set_turf_active(&actor, venue_id, body.active)
        .await
        .map(Json)
        .map_err(api_error)
}

// --- Admin ---

async fn api_admin_dashboard(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
) -> ApiResult<AdminDashboard> {
    state.engine.admin_dashboard(&actor).await.map(Json).map_err(api_error)
}

#[derive(Deserialize)]
struct VendorApprovalRequest {
    approved: bool,
}

async fn api_approve_vendor(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(vendor_id): Path<Uuid>,
    Json(body): Json<VendorApprovalRequest>,
) -> ApiResult<serde_json::Value> {
    state
        .engine
        .approve_vendor(&actor, vendor_id, body.approved)
        .await
        .map_err(api_error)?;
    Ok(Json(json!({ "status": "ok", "approved": body.approved })))
}

async fn api_remove_vendor(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(vendor_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.engine.remove_vendor(&actor, vendor_id).await.map_err(api_error)?;
    Ok(Json(json!({ "status": "ok" })))
}

async fn api_delete_turf(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(venue_id): Path<Uuid>,
) -> ApiResult<serde_json::Value> {
    state.engine.delete_turf(&actor, venue_id).await.map_err(api_error)?;
    Ok(Json(json!({ "status": "ok" })))
}

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health))
        .route("/home", get(api_home))
        .route("/register", post(api_register))
        .route("/venues", get(api_list_venues))
        .route("/venues/facets", get(api_venue_facets))
        .route("/venues/{id}", get(api_get_venue))
        .route("/venues/{id}/availability", get(api_availability))
        .route("/bookings", get(api_my_bookings).post(api_create_booking))
        .route("/bookings/{id}/payment", get(api_payment_request))
        .route("/bookings/{id}/payment/confirm", post(api_confirm_payment))
        .route("/vendor/dashboard", get(api_vendor_dashboard))
        .route("/vendor/turfs", post(api_create_turf))
        .route("/vendor/turfs/{id}", patch(api_set_turf_active))
        .route("/admin/dashboard", get(api_admin_dashboard))
        .route("/admin/vendors/{id}", patch(api_approve_vendor).delete(api_remove_vendor))
        .route("/admin/turfs/{id}", patch(api_set_turf_active).delete(api_delete_turf));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new("frontend/dist").fallback(ServeFile::new("frontend/dist/index.html")))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: &Config, engine: Engine) -> anyhow::Result<()> {
    info!("turfbook v{}", version_string());

    let state = AppState {
        engine,
        jwt_key: Arc::new(DecodingKey::from_secret(config.jwt_secret.as_bytes())),
    };
    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("Listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
