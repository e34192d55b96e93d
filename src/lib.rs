//! Role-scoped booking platform core.
//!
//! Guests browse a catalog of places and boats; users submit boats for
//! administrator review and book approved boats against per-place prices;
//! approval of a boat promotes its owner to `boat_owner`. Every operation
//! takes an explicit [`auth::Caller`] and runs through the authorization
//! gate before touching state. Records persist as CBOR in an embedded sled
//! store; the composite transitions (boat approval plus role promotion,
//! booking plus itinerary rows) commit atomically.
//!
//! Presentation, sessions and file storage are collaborator concerns: the
//! crate takes caller identity and file references as opaque inputs and
//! returns typed payloads or one error from [`error::Error`].

pub mod account;
pub mod auth;
pub mod booking;
pub mod catalog;
pub mod chat;
pub mod error;
pub mod fleet;
pub mod ids;
pub mod platform;
pub mod pricing;
mod store;
pub mod types;
