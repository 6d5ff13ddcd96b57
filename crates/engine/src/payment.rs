//! Manual payment: show a UPI request as a QR code, then take the player's
//! word that they paid. Nothing here talks to a payment gateway.

use tracing::info;
use turf_models::{
    Actor, BookingDetail, Capability, PaymentConfirmation, PaymentRequest, PaymentStatus,
};
use urlencoding::encode;
use uuid::Uuid;

use crate::{BookingError, Engine, EngineResult};

const QR_CHART_URL: &str = "https://chart.googleapis.com/chart?chs=300x300&cht=qr";

#[derive(Debug, Clone)]
pub struct PaymentSettings {
    pub payee_vpa: String,
    pub payee_name: String,
    pub currency: String,
}

/// Encodes a VPA for the `pa` parameter. The `@` stays literal; several UPI
/// apps do not decode it.
fn encode_vpa(vpa: &str) -> String {
    encode(vpa).replace("%40", "@")
}

/// Builds the `upi://pay` request for a booking and the QR image URL encoding it.
pub fn payment_request(settings: &PaymentSettings, booking: &BookingDetail) -> PaymentRequest {
    let amount = booking.booking.total_amount;
    let note = format!("Turf Booking Payment - {}", booking.turf_name);
    let uri = format!(
        "upi://pay?pa={}&pn={}&am={:.2}&cu={}&tn={}",
        encode_vpa(&settings.payee_vpa),
        encode(&settings.payee_name),
        amount,
        encode(&settings.currency),
        encode(&note),
    );
    let qr_code_url = format!("{QR_CHART_URL}&chl={}&choe=UTF-8", encode(&uri));

    PaymentRequest {
        booking_id: booking.booking.id,
        payee: settings.payee_vpa.clone(),
        amount,
        currency: settings.currency.clone(),
        note,
        uri,
        qr_code_url,
    }
}

impl Engine {
    pub async fn payment_request(&self, actor: &Actor, booking_id: Uuid) -> EngineResult<PaymentRequest> {
        let booking = self.owned_booking(actor, booking_id).await?;
        if booking.booking.payment_status != PaymentStatus::Pending {
            return Err(BookingError::validation(format!(
                "booking {booking_id} is {}, not pending",
                booking.booking.payment_status
            )));
        }
        Ok(payment_request(&self.payments, &booking))
    }

    /// Records the player's own claim that they paid.
    ///
    /// Idempotent: a booking that is already `paid` is returned unchanged.
    pub async fn confirm_payment(&self, actor: &Actor, booking_id: Uuid) -> EngineResult<PaymentConfirmation> {
        let booking = self.owned_booking(actor, booking_id).await?;
        let current = booking.booking.payment_status;

        if current == PaymentStatus::Paid {
            return Ok(PaymentConfirmation {
                booking_id,
                payment_status: current,
                verified: false,
                changed: false,
            });
        }
        if !current.can_transition_to(PaymentStatus::Paid) {
            return Err(BookingError::validation(format!(
                "booking {booking_id} payment is {current}"
            )));
        }

        let updated = self
            .store
            .update_booking_payment_status(booking_id, PaymentStatus::Paid)
            .await?;
        if !updated {
            // The status moved between the read and the write.
            let latest = self
                .store
                .get_booking(booking_id)
                .await?
                .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))?;
            return match latest.booking.payment_status {
                PaymentStatus::Paid => Ok(PaymentConfirmation {
                    booking_id,
                    payment_status: PaymentStatus::Paid,
                    verified: false,
                    changed: false,
                }),
                other => Err(BookingError::validation(format!(
                    "booking {booking_id} payment is {other}"
                ))),
            };
        }
        info!("Booking {booking_id} marked paid by player (unverified)");

        Ok(PaymentConfirmation {
            booking_id,
            payment_status: PaymentStatus::Paid,
            verified: false,
            changed: true,
        })
    }

    async fn owned_booking(&self, actor: &Actor, booking_id: Uuid) -> EngineResult<BookingDetail> {
        let identity = self.require(actor, Capability::ConfirmPayment)?;
        let booking = self
            .store
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("booking {booking_id}")))?;
        if booking.booking.user_id != identity.user_id {
            return Err(BookingError::Forbidden(format!("booking {booking_id} belongs to another user")));
        }
        Ok(booking)
    }
}
