use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use turf_db::BookingInsert;
use turf_models::{Actor, Booking, BookingDetail, Capability, NewBooking};
use uuid::Uuid;

use crate::{BookingError, Engine, EngineResult};

/// A player's request to claim one hourly slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingRequest {
    pub turf_id: Uuid,
    pub booking_date: NaiveDate,
    /// Start of the selected slot; `None` when nothing was picked.
    pub start_time: Option<NaiveTime>,
}

impl Engine {
    /// Claims a slot for the actor with `confirmed` status and `pending` payment.
    ///
    /// Availability is re-evaluated here, and the store insert is conditional on
    /// no confirmed booking holding the slot, so a lost race surfaces as
    /// [`BookingError::Conflict`].
    pub async fn create_booking(&self, actor: &Actor, request: &BookingRequest) -> EngineResult<Booking> {
        let identity = self.require(actor, Capability::CreateBooking)?;

        let start_time = request
            .start_time
            .ok_or_else(|| BookingError::validation("no slot selected"))?;

        if request.booking_date < (self.today)() {
            return Err(BookingError::validation(format!(
                "{} is in the past",
                request.booking_date
            )));
        }

        let venue = self
            .store
            .get_venue(request.turf_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("turf {}", request.turf_id)))?;
        if !venue.active {
            return Err(BookingError::validation(format!("{} is not accepting bookings", venue.name)));
        }

        let slots = self.slots_on(venue.id, request.booking_date).await?;
        let slot = slots
            .iter()
            .find(|s| s.start_time == start_time)
            .ok_or_else(|| BookingError::validation(format!("{} has no slot at {start_time}", venue.name)))?;

        let conflict = BookingError::Conflict {
            turf_id: venue.id,
            date: request.booking_date,
            start_time,
        };
        if !slot.bookable {
            return Err(conflict);
        }

        let new_booking = NewBooking {
            turf_id: venue.id,
            user_id: identity.user_id,
            booking_date: request.booking_date,
            start_time,
            end_time: slot.end_time,
            total_amount: venue.price_per_hour,
        };

        match self.store.create_booking(&new_booking).await? {
            BookingInsert::Inserted(booking) => {
                info!(
                    "Booking {} confirmed for {} {} at {} (payment pending)",
                    booking.id, booking.booking_date, booking.start_time, venue.name
                );
                Ok(booking)
            }
            BookingInsert::Conflict => {
                warn!(
                    "Lost race for turf {} on {} at {start_time}",
                    venue.id, request.booking_date
                );
                Err(conflict)
            }
        }
    }

    /// The actor's own bookings, newest date first.
    pub async fn my_bookings(&self, actor: &Actor) -> EngineResult<Vec<BookingDetail>> {
        let identity = self.require(actor, Capability::ViewOwnBookings)?;
        Ok(self.store.list_bookings_for_user(identity.user_id).await?)
    }
}
