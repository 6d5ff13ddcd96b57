//! Bearer token identity.
//!
//! Access tokens are HS256 JWTs issued by the hosted identity backend; `sub`
//! carries the user id. The role is looked up in our own database.

use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use tracing::debug;
use turf_models::Actor;
use uuid::Uuid;

use crate::server::{AppState, api_error};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: i64,
}

fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    // Audience differs between deployments of the identity backend.
    validation.validate_aud = false;
    validation
}

pub fn user_id_from_token(token: &str, key: &DecodingKey) -> anyhow::Result<Uuid> {
    let data = decode::<Claims>(token, key, &validation())?;
    Ok(Uuid::parse_str(&data.claims.sub)?)
}

/// The caller of a request. No `Authorization` header means anonymous.
pub struct CurrentActor(pub Actor);

impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(CurrentActor(Actor::Anonymous));
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| (StatusCode::UNAUTHORIZED, "Malformed Authorization header".to_string()))?;

        actor_for_token(state, token).await.map(CurrentActor)
    }
}

/// Verifies a bearer token and resolves its subject to an actor with the
/// stored role.
pub async fn actor_for_token(state: &AppState, token: &str) -> Result<Actor, (StatusCode, String)> {
    let user_id = user_id_from_token(token, &state.jwt_key).map_err(|e| {
        debug!("Rejected access token: {e:#}");
        (StatusCode::UNAUTHORIZED, "Invalid or expired token, please log in again".to_string())
    })?;

    state.engine.resolve_actor(user_id).await.map_err(api_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::sync::Arc;
    use turf_engine::{Engine, PaymentSettings, Registration, SqliteStore};
    use turf_models::Role;

    fn token(sub: &str, secret: &str, expires_in: i64) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            exp: Utc::now().timestamp() + expires_in,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn valid_token_yields_subject() {
        let user_id = Uuid::new_v4();
        let key = DecodingKey::from_secret(b"s3cret");
        let parsed = user_id_from_token(&token(&user_id.to_string(), "s3cret", 3600), &key).unwrap();
        assert_eq!(parsed, user_id);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let key = DecodingKey::from_secret(b"s3cret");
        let forged = token(&Uuid::new_v4().to_string(), "other", 3600);
        assert!(user_id_from_token(&forged, &key).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let key = DecodingKey::from_secret(b"s3cret");
        let stale = token(&Uuid::new_v4().to_string(), "s3cret", -3600);
        assert!(user_id_from_token(&stale, &key).is_err());
    }

    #[test]
    fn subject_must_be_a_user_id() {
        let key = DecodingKey::from_secret(b"s3cret");
        assert!(user_id_from_token(&token("not-a-uuid", "s3cret", 3600), &key).is_err());
    }

    async fn state(secret: &str) -> AppState {
        let pool = turf_db::connect_memory().await.unwrap();
        let payments = PaymentSettings {
            payee_vpa: "arena@upi".into(),
            payee_name: "GameZoneXP".into(),
            currency: "INR".into(),
        };
        AppState {
            engine: Engine::new(Arc::new(SqliteStore::new(pool)), payments),
            jwt_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }

    #[tokio::test]
    async fn registered_vendor_token_resolves_to_vendor() {
        let state = state("s3cret").await;
        let user_id = Uuid::new_v4();
        let bearer = token(&user_id.to_string(), "s3cret", 3600);

        let before = actor_for_token(&state, &bearer).await.unwrap();
        assert_eq!(before, Actor::player(user_id));

        let registration = Registration {
            role: Role::Vendor,
            full_name: Some("Ravi".into()),
            business_name: Some("Ravi Turfs".into()),
            business_address: Some("MG Road".into()),
        };
        state.engine.register(&before, registration).await.unwrap();

        let after = actor_for_token(&state, &bearer).await.unwrap();
        assert_eq!(after, Actor::vendor(user_id));
    }

    #[tokio::test]
    async fn forged_token_is_unauthorized() {
        let state = state("s3cret").await;
        let forged = token(&Uuid::new_v4().to_string(), turf_config::DEFAULT_JWT_SECRET, 3600);
        let (status, _) = actor_for_token(&state, &forged).await.unwrap_err();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
