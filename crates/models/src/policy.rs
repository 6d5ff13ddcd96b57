//! Roles, capabilities and the view each actor lands on.
//!
//! Every access decision in the workspace goes through [`Role::can`] /
//! [`Actor::can`]; nothing compares role strings ad hoc.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Player,
    Vendor,
    Admin,
}

impl Role {
    /// Picks one role out of the rows stored for a user.
    /// Admin wins over vendor, vendor over player; no rows means player.
    pub fn resolve(roles: &[Role]) -> Role {
        if roles.contains(&Role::Admin) {
            Role::Admin
        } else if roles.contains(&Role::Vendor) {
            Role::Vendor
        } else {
            Role::Player
        }
    }

    pub fn can(self, capability: Capability) -> bool {
        use Capability::*;
        match capability {
            BrowseVenues | ViewAvailability => true,
            CreateBooking | ViewOwnBookings | ConfirmPayment => true,
            ManageOwnTurfs | ViewVendorBookings => self == Role::Vendor,
            ViewPlatformStats | ApproveVendors | RemoveVendors | ModerateTurfs => {
                self == Role::Admin
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    BrowseVenues,
    ViewAvailability,
    CreateBooking,
    ViewOwnBookings,
    ConfirmPayment,
    ManageOwnTurfs,
    ViewVendorBookings,
    ViewPlatformStats,
    ApproveVendors,
    RemoveVendors,
    ModerateTurfs,
}

impl Capability {
    /// Capabilities available without signing in.
    pub fn is_public(self) -> bool {
        matches!(self, Capability::BrowseVenues | Capability::ViewAvailability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

/// Who is performing an operation. Passed explicitly into every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Actor {
    Anonymous,
    Authenticated(Identity),
}

impl Actor {
    pub fn player(user_id: Uuid) -> Self {
        Actor::Authenticated(Identity { user_id, role: Role::Player })
    }

    pub fn vendor(user_id: Uuid) -> Self {
        Actor::Authenticated(Identity { user_id, role: Role::Vendor })
    }

    pub fn admin(user_id: Uuid) -> Self {
        Actor::Authenticated(Identity { user_id, role: Role::Admin })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(identity) => Some(identity),
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        match self {
            Actor::Anonymous => capability.is_public(),
            Actor::Authenticated(identity) => identity.role.can(capability),
        }
    }
}

/// Top-level view presented to an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeView {
    Landing,
    VenueDirectory,
    VendorDashboard,
    AdminDashboard,
}

impl HomeView {
    pub fn for_actor(actor: &Actor) -> Self {
        match actor {
            Actor::Anonymous => HomeView::Landing,
            Actor::Authenticated(Identity { role: Role::Admin, .. }) => HomeView::AdminDashboard,
            Actor::Authenticated(Identity { role: Role::Vendor, .. }) => HomeView::VendorDashboard,
            Actor::Authenticated(Identity { role: Role::Player, .. }) => HomeView::VenueDirectory,
        }
    }
}
