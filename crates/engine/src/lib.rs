//! Availability and booking lifecycle for the turf marketplace.
//!
//! Every operation takes the acting [`Actor`] explicitly and checks it against
//! the capability table in `turf_models::policy` before touching the store.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use turf_models::{Actor, Capability, HomeView, Identity, Role};
use uuid::Uuid;

pub mod account;
pub mod admin;
pub mod availability;
pub mod booking;
pub mod directory;
pub mod error;
pub mod payment;
pub mod store;
pub mod vendor;

pub use account::Registration;
pub use admin::AdminDashboard;
pub use availability::mark_availability;
pub use booking::BookingRequest;
pub use directory::{DirectoryFacets, filter_venues};
pub use error::{BookingError, EngineResult};
pub use payment::{PaymentSettings, payment_request};
pub use store::{DirectoryStore, SqliteStore};
pub use vendor::{VendorDashboard, hourly_slots};

#[derive(Clone)]
pub struct Engine {
    store: Arc<dyn DirectoryStore>,
    payments: PaymentSettings,
    today: fn() -> NaiveDate,
}

impl Engine {
    pub fn new(store: Arc<dyn DirectoryStore>, payments: PaymentSettings) -> Self {
        Self {
            store,
            payments,
            today: local_today,
        }
    }

    /// Replaces the source of "today" used to reject bookings in the past.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn store(&self) -> &Arc<dyn DirectoryStore> {
        &self.store
    }

    /// Maps an authenticated user id to an actor, resolving the role from the store.
    pub async fn resolve_actor(&self, user_id: Uuid) -> EngineResult<Actor> {
        let roles = self.store.roles_for_user(user_id).await?;
        Ok(Actor::Authenticated(Identity {
            user_id,
            role: Role::resolve(&roles),
        }))
    }

    pub fn home(&self, actor: &Actor) -> HomeView {
        HomeView::for_actor(actor)
    }

    /// Checks a capability that needs a signed-in actor and returns its identity.
    pub(crate) fn require(&self, actor: &Actor, capability: Capability) -> EngineResult<Identity> {
        match actor {
            Actor::Anonymous => Err(BookingError::Auth),
            Actor::Authenticated(identity) if identity.role.can(capability) => Ok(*identity),
            Actor::Authenticated(identity) => Err(BookingError::Forbidden(format!(
                "{:?} cannot {capability:?}",
                identity.role
            ))),
        }
    }

    /// Checks a capability that anonymous actors may also hold.
    pub(crate) fn allow(&self, actor: &Actor, capability: Capability) -> EngineResult<()> {
        if actor.can(capability) {
            Ok(())
        } else if actor.identity().is_none() {
            Err(BookingError::Auth)
        } else {
            Err(BookingError::Forbidden(format!("{capability:?}")))
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
