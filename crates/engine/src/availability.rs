use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use tracing::debug;
use turf_models::{Actor, AvailableSlot, Booking, BookingStatus, Capability, SlotTemplate};
use uuid::Uuid;

use crate::{BookingError, Engine, EngineResult};

/// Marks each template bookable unless a confirmed booking starts at the same time.
///
/// The template's own `is_available` flag plays no part. Output is ordered by
/// start time.
pub fn mark_availability(templates: &[SlotTemplate], bookings: &[Booking]) -> Vec<AvailableSlot> {
    let booked: HashSet<NaiveTime> = bookings
        .iter()
        .filter(|b| b.booking_status == BookingStatus::Confirmed)
        .map(|b| b.start_time)
        .collect();

    let mut slots: Vec<AvailableSlot> = templates
        .iter()
        .map(|t| AvailableSlot {
            slot_id: t.id,
            start_time: t.start_time,
            end_time: t.end_time,
            bookable: !booked.contains(&t.start_time),
        })
        .collect();
    slots.sort_by_key(|s| s.start_time);
    slots
}

impl Engine {
    /// Slots of a venue on `date`, recomputed from live bookings on every call.
    pub async fn availability(
        &self,
        actor: &Actor,
        venue_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Vec<AvailableSlot>> {
        self.allow(actor, Capability::ViewAvailability)?;

        if self.store.get_venue(venue_id).await?.is_none() {
            return Err(BookingError::NotFound(format!("turf {venue_id}")));
        }
        self.slots_on(venue_id, date).await
    }

    pub(crate) async fn slots_on(
        &self,
        venue_id: Uuid,
        date: NaiveDate,
    ) -> EngineResult<Vec<AvailableSlot>> {
        let templates = self.store.list_slot_templates(venue_id).await?;
        let bookings = self.store.list_confirmed_bookings(venue_id, date).await?;
        let slots = mark_availability(&templates, &bookings);
        debug!(
            "Turf {venue_id} on {date}: {} of {} slots bookable",
            slots.iter().filter(|s| s.bookable).count(),
            slots.len()
        );
        Ok(slots)
    }
}
