//! Boat lifecycle: submission, admin review and the role-promotion side
//! effect.
//!
//! A boat's status moves `pending -> approved` or `pending -> rejected`,
//! exactly once; resubmission means a new boat record. Approval is the only
//! path that promotes the owning account's role to `BoatOwner`, and the two
//! writes commit in one transaction so no reader ever observes an approved
//! boat with a stale owner role.

use crate::account::User;
use crate::auth::{self, Action, Caller, Role, Target};
use crate::error::{Error, Result};
use crate::{ids, store};
use sled::Batch;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum BoatStatus {
    #[n(0)]
    Pending,
    #[n(1)]
    Approved,
    #[n(2)]
    Rejected,
}

impl BoatStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoatStatus::Pending => "pending",
            BoatStatus::Approved => "approved",
            BoatStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Boat {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub boat_type: String,
    #[n(3)]
    pub capacity: u32,
    #[n(4)]
    pub photo: Option<String>,
    #[n(5)]
    pub owner_id: String,
    #[n(6)]
    pub status: BoatStatus,
}

#[derive(Debug, Default)]
pub struct BoatDraft {
    name: Option<String>,
    boat_type: Option<String>,
    capacity: u32,
    photo: Option<String>,
}

impl BoatDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
    pub fn set_boat_type(mut self, boat_type: &str) -> Self {
        self.boat_type = Some(boat_type.to_string());
        self
    }
    pub fn set_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }
    /// Opaque stored-file reference; never interpreted.
    pub fn set_photo(mut self, photo: &str) -> Self {
        self.photo = Some(photo.to_string());
        self
    }

    fn validate(self) -> Result<(String, String, u32, Option<String>)> {
        let name = match self.name {
            Some(n) if !n.trim().is_empty() => n,
            _ => return Err(Error::validation("boat", "name is required")),
        };
        let boat_type = match self.boat_type {
            Some(t) if !t.trim().is_empty() => t,
            _ => return Err(Error::validation("boat", "type is required")),
        };
        if self.capacity == 0 {
            return Err(Error::validation("boat", "capacity must be at least 1"));
        }
        Ok((name, boat_type, self.capacity, self.photo))
    }
}

pub struct FleetService {
    instance: Arc<sled::Db>,
}

impl FleetService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    /// Submit a boat for review. Any authenticated account may submit; the
    /// caller becomes the owner and the boat starts out pending.
    pub fn submit(&self, caller: &Caller, draft: BoatDraft) -> Result<Boat> {
        auth::authorize(caller, Action::SubmitBoat, &Target::Public)?;
        let (name, boat_type, capacity, photo) = draft.validate()?;
        let boat = Boat {
            id: ids::new_id(ids::BOAT),
            name,
            boat_type,
            capacity,
            photo,
            owner_id: caller.id.clone(),
            status: BoatStatus::Pending,
        };
        store::put(&self.instance, &boat.id, &boat)?;
        tracing::info!(boat = %boat.id, owner = %boat.owner_id, "boat submitted");
        Ok(boat)
    }

    /// Approve a pending boat and promote its owner to `BoatOwner` in the
    /// same transaction. Promotion never demotes an admin owner and is
    /// idempotent for accounts already holding `BoatOwner`.
    pub fn approve(&self, caller: &Caller, boat_id: &str) -> Result<Boat> {
        auth::authorize(caller, Action::ReviewBoat, &Target::Public)?;

        let outcome = self.instance.transaction(|tx| {
            let Some(raw) = tx.get(boat_id.as_bytes())? else {
                return store::abort(Error::not_found("boat", boat_id));
            };
            let mut boat: Boat = store::decode_tx(boat_id, &raw)?;
            if boat.status != BoatStatus::Pending {
                return store::abort(Error::invalid_state(
                    "boat",
                    &boat.id,
                    boat.status.as_str(),
                    "approve",
                ));
            }
            boat.status = BoatStatus::Approved;

            let Some(owner_raw) = tx.get(boat.owner_id.as_bytes())? else {
                return store::abort(Error::not_found("user", &boat.owner_id));
            };
            let mut owner: User = store::decode_tx(&boat.owner_id, &owner_raw)?;
            if owner.role == Role::User {
                owner.role = Role::BoatOwner;
            }

            tx.insert(boat.id.as_bytes(), store::encode_tx(&boat.id, &boat)?)?;
            tx.insert(owner.id.as_bytes(), store::encode_tx(&owner.id, &owner)?)?;
            Ok(boat)
        });
        let boat = store::unwrap_tx(outcome)?;

        tracing::info!(boat = %boat.id, owner = %boat.owner_id, "boat approved, owner promoted");
        Ok(boat)
    }

    /// Reject a pending boat. No role side effect.
    pub fn reject(&self, caller: &Caller, boat_id: &str) -> Result<Boat> {
        auth::authorize(caller, Action::ReviewBoat, &Target::Public)?;

        let outcome = self.instance.transaction(|tx| {
            let Some(raw) = tx.get(boat_id.as_bytes())? else {
                return store::abort(Error::not_found("boat", boat_id));
            };
            let mut boat: Boat = store::decode_tx(boat_id, &raw)?;
            if boat.status != BoatStatus::Pending {
                return store::abort(Error::invalid_state(
                    "boat",
                    &boat.id,
                    boat.status.as_str(),
                    "reject",
                ));
            }
            boat.status = BoatStatus::Rejected;
            tx.insert(boat.id.as_bytes(), store::encode_tx(&boat.id, &boat)?)?;
            Ok(boat)
        });
        let boat = store::unwrap_tx(outcome)?;

        tracing::info!(boat = %boat.id, "boat rejected");
        Ok(boat)
    }

    /// Admin hard delete, any status. The boat's price rows go in the same
    /// batch; bookings survive through their snapshot owner_id.
    pub fn delete(&self, caller: &Caller, boat_id: &str) -> Result<()> {
        auth::authorize(caller, Action::ReviewBoat, &Target::Public)?;
        let boat: Boat = store::fetch_or(&self.instance, "boat", boat_id)?;

        let mut batch = Batch::default();
        batch.remove(boat.id.as_bytes());
        for key in store::scan_keys(&self.instance, &ids::price_prefix(&boat.id))? {
            batch.remove(key);
        }
        self.instance.apply_batch(batch)?;

        tracing::info!(boat = %boat.id, "boat deleted");
        Ok(())
    }

    /// Admin review queue.
    pub fn list_pending(&self, caller: &Caller) -> Result<Vec<Boat>> {
        auth::authorize(caller, Action::ReviewBoat, &Target::Public)?;
        let mut boats: Vec<Boat> = store::scan(&self.instance, ids::BOAT)?;
        boats.retain(|b| b.status == BoatStatus::Pending);
        Ok(boats)
    }

    /// An account's own submissions, any status. A plain user sees their
    /// still-pending boat here. Self or admin.
    pub fn list_for_owner(&self, caller: &Caller, owner_id: &str) -> Result<Vec<Boat>> {
        auth::authorize(caller, Action::ViewOwnBoats, &Target::Owned { owner_id })?;
        let mut boats: Vec<Boat> = store::scan(&self.instance, ids::BOAT)?;
        boats.retain(|b| b.owner_id == owner_id);
        Ok(boats)
    }
}
