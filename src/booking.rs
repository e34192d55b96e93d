//! Booking workflow engine.
//!
//! A booking reserves one approved boat for a set of places. Its status
//! moves `Pending -> Approved` (owner action) or `Pending|Approved ->
//! Cancelled` (owner or booking user); `Cancelled` is terminal and
//! `Approved` never returns to `Pending`. Re-driving a transition on a
//! booking that already left the required state fails with `InvalidState`
//! rather than silently succeeding, so a retried request is distinguishable
//! from a real state change.
//!
//! The booking's `owner_id` is a snapshot of `boat.owner_id` taken at
//! creation, not a live reference: it keeps historical bookings actionable
//! and correctly scoped even if the boat is later deleted.

use crate::auth::{self, Action, Caller, Target};
use crate::catalog::Place;
use crate::error::{Error, Result};
use crate::fleet::{Boat, BoatStatus};
use crate::pricing::PricingService;
use crate::types::TimeStamp;
use crate::{ids, store};
use chrono::Utc;
use sled::Batch;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum BookingStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Approved => "Approved",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Booking {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub user_id: String,
    #[n(2)]
    pub boat_id: String,
    /// Snapshot of `boat.owner_id` at creation time.
    #[n(3)]
    pub owner_id: String,
    #[n(4)]
    pub booked_at: TimeStamp<Utc>,
    /// Resolved at creation by the pricing service, never caller-supplied,
    /// and unaffected by later price edits.
    #[n(5)]
    pub total_price: u64,
    #[n(6)]
    pub status: BookingStatus,
}

/// Itinerary join row, immutable after creation: a booking's destinations
/// can only be cancelled and re-created, never edited.
#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct BookingPlace {
    #[n(0)]
    pub booking_id: String,
    #[n(1)]
    pub place_id: String,
}

/// Booking with its place names joined in, for listing surfaces. A deleted
/// place falls back to its id.
#[derive(Debug, Clone)]
pub struct BookingView {
    pub booking: Booking,
    pub places: Vec<String>,
}

pub struct BookingService {
    instance: Arc<sled::Db>,
    pricing: PricingService,
}

impl BookingService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        let pricing = PricingService::new(instance.clone());
        Self { instance, pricing }
    }

    /// Create a booking for an approved boat. The requested places are
    /// deduplicated, the total is resolved server-side, and the booking row
    /// plus its itinerary rows commit in one batch; a failed resolution
    /// persists nothing.
    pub fn create(&self, caller: &Caller, boat_id: &str, place_ids: &[String]) -> Result<Booking> {
        auth::authorize(caller, Action::CreateBooking, &Target::Public)?;

        let boat: Boat = store::fetch_or(&self.instance, "boat", boat_id)?;
        if boat.status != BoatStatus::Approved {
            return Err(Error::invalid_state(
                "boat",
                &boat.id,
                boat.status.as_str(),
                "book",
            ));
        }

        let requested: BTreeSet<String> = place_ids.iter().cloned().collect();
        if requested.is_empty() {
            return Err(Error::validation("booking", "at least one place is required"));
        }

        let quote = self.pricing.resolve_total(&boat.id, &requested)?;

        let booking = Booking {
            id: ids::new_id(ids::BOOKING),
            user_id: caller.id.clone(),
            boat_id: boat.id.clone(),
            owner_id: boat.owner_id.clone(),
            booked_at: TimeStamp::now(),
            total_price: quote.total,
            status: BookingStatus::Pending,
        };

        let mut batch = Batch::default();
        batch.insert(
            booking.id.as_bytes(),
            store::to_cbor(&booking.id, &booking)?,
        );
        for place_id in &requested {
            let row = BookingPlace {
                booking_id: booking.id.clone(),
                place_id: place_id.clone(),
            };
            let key = ids::itinerary_key(&booking.id, place_id);
            batch.insert(key.as_bytes(), store::to_cbor(&key, &row)?);
        }
        self.instance.apply_batch(batch)?;

        tracing::info!(
            booking = %booking.id,
            boat = %booking.boat_id,
            user = %booking.user_id,
            total = booking.total_price,
            "booking created"
        );
        Ok(booking)
    }

    /// Bookings made by one user, newest first. Self or admin.
    pub fn list_for_user(&self, caller: &Caller, user_id: &str) -> Result<Vec<BookingView>> {
        auth::authorize(caller, Action::ViewBookings, &Target::Owned { owner_id: user_id })?;
        self.collect(|b| b.user_id == user_id)
    }

    /// Bookings against one owner's boats (by snapshot owner_id), newest
    /// first. Self or admin.
    pub fn list_for_owner(&self, caller: &Caller, owner_id: &str) -> Result<Vec<BookingView>> {
        auth::authorize(caller, Action::ViewBookings, &Target::Owned { owner_id })?;
        self.collect(|b| b.owner_id == owner_id)
    }

    /// Unrestricted admin listing, newest first.
    pub fn list_all(&self, caller: &Caller) -> Result<Vec<BookingView>> {
        auth::authorize(caller, Action::AuditBookings, &Target::Public)?;
        self.collect(|_| true)
    }

    fn collect(&self, keep: impl Fn(&Booking) -> bool) -> Result<Vec<BookingView>> {
        let bookings: Vec<Booking> = store::scan(&self.instance, ids::BOOKING)?;
        let mut views = Vec::new();
        for booking in bookings {
            if !keep(&booking) {
                continue;
            }
            views.push(self.view(booking)?);
        }
        views.sort_by(|a, b| b.booking.booked_at.cmp(&a.booking.booked_at));
        Ok(views)
    }

    fn view(&self, booking: Booking) -> Result<BookingView> {
        let rows: Vec<BookingPlace> =
            store::scan(&self.instance, &ids::itinerary_prefix(&booking.id))?;
        let mut places = Vec::with_capacity(rows.len());
        for row in rows {
            let name = match store::fetch::<Place>(&self.instance, &row.place_id)? {
                Some(place) => place.name,
                None => row.place_id,
            };
            places.push(name);
        }
        Ok(BookingView { booking, places })
    }

    /// Owner approval: `Pending -> Approved`. Only the snapshot owner may
    /// approve; approving an already-Approved or Cancelled booking fails.
    pub fn approve(&self, caller: &Caller, booking_id: &str) -> Result<Booking> {
        auth::screen(caller, Action::ApproveBooking)?;

        let outcome = self.instance.transaction(|tx| {
            let Some(raw) = tx.get(booking_id.as_bytes())? else {
                return store::abort(Error::not_found("booking", booking_id));
            };
            let mut booking: Booking = store::decode_tx(booking_id, &raw)?;
            if let Err(e) = auth::authorize(
                caller,
                Action::ApproveBooking,
                &Target::Owned {
                    owner_id: &booking.owner_id,
                },
            ) {
                return store::abort(e);
            }
            if booking.status != BookingStatus::Pending {
                return store::abort(Error::invalid_state(
                    "booking",
                    &booking.id,
                    booking.status.as_str(),
                    "approve",
                ));
            }
            booking.status = BookingStatus::Approved;
            tx.insert(booking.id.as_bytes(), store::encode_tx(&booking.id, &booking)?)?;
            Ok(booking)
        });
        let booking = store::unwrap_tx(outcome)?;

        tracing::info!(booking = %booking.id, owner = %booking.owner_id, "booking approved");
        Ok(booking)
    }

    /// Cancellation by either party: `Pending|Approved -> Cancelled`,
    /// terminal. Cancelling an already-Cancelled booking fails.
    pub fn cancel(&self, caller: &Caller, booking_id: &str) -> Result<Booking> {
        auth::screen(caller, Action::CancelBooking)?;

        let outcome = self.instance.transaction(|tx| {
            let Some(raw) = tx.get(booking_id.as_bytes())? else {
                return store::abort(Error::not_found("booking", booking_id));
            };
            let mut booking: Booking = store::decode_tx(booking_id, &raw)?;
            if let Err(e) = auth::authorize(
                caller,
                Action::CancelBooking,
                &Target::Parties {
                    user_id: &booking.user_id,
                    owner_id: &booking.owner_id,
                },
            ) {
                return store::abort(e);
            }
            if booking.status == BookingStatus::Cancelled {
                return store::abort(Error::invalid_state(
                    "booking",
                    &booking.id,
                    booking.status.as_str(),
                    "cancel",
                ));
            }
            booking.status = BookingStatus::Cancelled;
            tx.insert(booking.id.as_bytes(), store::encode_tx(&booking.id, &booking)?)?;
            Ok(booking)
        });
        let booking = store::unwrap_tx(outcome)?;

        tracing::info!(booking = %booking.id, by = %caller.id, "booking cancelled");
        Ok(booking)
    }
}
