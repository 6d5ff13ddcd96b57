use serde::{Deserialize, Serialize};
use tracing::info;
use turf_models::{Actor, Capability, PlatformStats, TurfWithVendor, Vendor};
use uuid::Uuid;

use crate::{BookingError, Engine, EngineResult};

const RECENT_TURFS: i64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub stats: PlatformStats,
    pub recent_turfs: Vec<TurfWithVendor>,
    pub vendors: Vec<Vendor>,
}

impl Engine {
    pub async fn platform_stats(&self, actor: &Actor) -> EngineResult<PlatformStats> {
        self.require(actor, Capability::ViewPlatformStats)?;
        Ok(self.store.platform_stats().await?)
    }

    /// Platform totals, the latest listed turfs and every vendor, newest first.
    pub async fn admin_dashboard(&self, actor: &Actor) -> EngineResult<AdminDashboard> {
        self.require(actor, Capability::ViewPlatformStats)?;

        let stats = self.store.platform_stats().await?;
        let recent_turfs = self.store.list_recent_venues(RECENT_TURFS).await?;
        let vendors = self.store.list_vendors().await?;

        Ok(AdminDashboard {
            stats,
            recent_turfs,
            vendors,
        })
    }

    pub async fn approve_vendor(&self, actor: &Actor, vendor_id: Uuid, approved: bool) -> EngineResult<()> {
        let identity = self.require(actor, Capability::ApproveVendors)?;
        if !self.store.set_vendor_approved(vendor_id, approved).await? {
            return Err(BookingError::NotFound(format!("vendor {vendor_id}")));
        }
        info!("Vendor {vendor_id} approved={approved} by admin {}", identity.user_id);
        Ok(())
    }

    /// Removes a vendor together with its turfs, their slots and bookings.
    pub async fn remove_vendor(&self, actor: &Actor, vendor_id: Uuid) -> EngineResult<()> {
        let identity = self.require(actor, Capability::RemoveVendors)?;
        if !self.store.remove_vendor(vendor_id).await? {
            return Err(BookingError::NotFound(format!("vendor {vendor_id}")));
        }
        info!("Vendor {vendor_id} removed by admin {}", identity.user_id);
        Ok(())
    }

    pub async fn delete_turf(&self, actor: &Actor, venue_id: Uuid) -> EngineResult<()> {
        let identity = self.require(actor, Capability::ModerateTurfs)?;
        if !self.store.delete_venue(venue_id).await? {
            return Err(BookingError::NotFound(format!("turf {venue_id}")));
        }
        info!("Turf {venue_id} deleted by admin {}", identity.user_id);
        Ok(())
    }
}
