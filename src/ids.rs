//! Identifier generation and key layout for the store.
//!
//! Every entity id is a uuid7 encoded with bech32m under a per-entity
//! human-readable prefix, so a key is self-describing ("boat_1...",
//! "booking_1..."). Composite rows live under slash-joined keys; the bech32
//! charset never contains '/', so composite keys parse unambiguously.

use bech32::{Bech32m, Hrp};
use uuid7::uuid7;

pub const USER: &str = "user_";
pub const PLACE: &str = "place_";
pub const BOAT: &str = "boat_";
pub const BOOKING: &str = "booking_";
pub const MESSAGE: &str = "msg_";

/// Mint a fresh id under one of the fixed prefixes above.
pub fn new_id(prefix: &str) -> String {
    // the prefixes are compile-time constants known to be valid hrps
    let hrp = Hrp::parse_unchecked(prefix);
    bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())
        .expect("bech32 encoding of a uuid7 under a fixed prefix cannot fail")
}

/// Email uniqueness index row, pointing at the owning user id.
pub(crate) fn email_key(email: &str) -> String {
    format!("email/{email}")
}

/// Price row for one (boat, place) pair.
pub(crate) fn price_key(boat_id: &str, place_id: &str) -> String {
    format!("price/{boat_id}/{place_id}")
}

/// Prefix covering every price row of one boat.
pub(crate) fn price_prefix(boat_id: &str) -> String {
    format!("price/{boat_id}/")
}

/// Itinerary join row for one (booking, place) pair.
pub(crate) fn itinerary_key(booking_id: &str, place_id: &str) -> String {
    format!("itinerary/{booking_id}/{place_id}")
}

/// Prefix covering every itinerary row of one booking.
pub(crate) fn itinerary_prefix(booking_id: &str) -> String {
    format!("itinerary/{booking_id}/")
}
