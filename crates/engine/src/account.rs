use serde::{Deserialize, Serialize};
use tracing::info;
use turf_models::{Actor, Role};
use uuid::Uuid;

use crate::{BookingError, Engine, EngineResult};

/// What a signed-in user supplies at sign-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
    /// Vendors only.
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_address: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Engine {
    /// Stores the caller's profile and role, and the business record for vendors.
    ///
    /// Admin cannot be self-assigned. Registering again is harmless: roles are
    /// additive and an existing vendor record is kept. Returns the actor as it
    /// resolves afterwards.
    pub async fn register(&self, actor: &Actor, registration: Registration) -> EngineResult<Actor> {
        let identity = *actor.identity().ok_or(BookingError::Auth)?;
        let user_id = identity.user_id;

        if registration.role == Role::Admin {
            return Err(BookingError::Forbidden("admin role is granted by an operator".to_string()));
        }

        match non_blank(registration.full_name) {
            Some(name) => self.store.upsert_profile(user_id, Some(&name)).await?,
            None if self.store.find_profile(user_id).await?.is_none() => {
                self.store.upsert_profile(user_id, None).await?
            }
            None => {}
        }

        self.store.grant_role(user_id, registration.role).await?;

        if registration.role == Role::Vendor {
            let address = non_blank(registration.business_address);
            self.ensure_vendor(user_id, non_blank(registration.business_name), address.as_deref())
                .await?;
        }
        info!("User {user_id} registered as {:?}", registration.role);

        self.resolve_actor(user_id).await
    }

    /// Operator path for roles users cannot pick themselves.
    pub async fn grant_role(&self, user_id: Uuid, role: Role) -> EngineResult<Actor> {
        self.store.grant_role(user_id, role).await?;
        if role == Role::Vendor {
            self.ensure_vendor(user_id, None, None).await?;
        }
        info!("Granted {role:?} to {user_id}");
        self.resolve_actor(user_id).await
    }
}
