//! Authorization gate.
//!
//! A pure decision table keyed by (role, action), consulted by every service
//! before it touches state. The table yields one of four decisions:
//! `Allow`, `Deny`, `IfOwner` (caller id must match the target's owner) or
//! `IfParty` (caller must be one of the target's two parties).
//!
//! Role-only denials are checked with [`screen`] before anything is loaded,
//! so an unauthorized caller learns nothing about resource existence. The
//! ownership-sensitive half runs through [`authorize`] once the target is in
//! hand.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum Role {
    /// Unauthenticated caller. Never persisted on a user record.
    #[n(0)]
    Guest,
    #[n(1)]
    User,
    #[n(2)]
    BoatOwner,
    #[n(3)]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::User => "user",
            Role::BoatOwner => "boat_owner",
            Role::Admin => "admin",
        }
    }
}

/// Already-authenticated caller identity, threaded explicitly into every
/// service call. The core trusts it; credential checks happen elsewhere.
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    pub role: Role,
}

impl Caller {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Anonymous caller for public catalog reads.
    pub fn guest() -> Self {
        Self {
            id: String::new(),
            role: Role::Guest,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    BrowseCatalog,
    ManagePlaces,
    ManageAccounts,
    ListAccounts,
    ViewProfile,
    UpdateProfile,
    SubmitBoat,
    ReviewBoat,
    ViewOwnBoats,
    SetPrice,
    CreateBooking,
    ViewBookings,
    AuditBookings,
    ApproveBooking,
    CancelBooking,
    SendMessage,
    ViewThread,
}

/// The resource an action is aimed at, reduced to what the table needs.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// No ownership dimension (public reads, admin-wide operations).
    Public,
    /// A user account, with its stored role for the admin-immutability rule.
    Account { id: &'a str, role: Role },
    /// Anything with a single owner: boat, price row, owner-scoped listing.
    Owned { owner_id: &'a str },
    /// A booking's two parties (its user and the boat owner snapshot), or
    /// the two ends of a chat thread.
    Parties { user_id: &'a str, owner_id: &'a str },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    IfOwner,
    IfParty,
    Deny,
}

/// The fixed (role, action) rule table.
pub fn decision(role: Role, action: Action) -> Decision {
    use Action::*;
    use Decision::*;
    use Role::*;

    match (role, action) {
        // public catalog data is readable by everyone, guests included
        (_, BrowseCatalog) => Allow,

        (Admin, ManagePlaces | ManageAccounts | ListAccounts | ReviewBoat | AuditBookings) => Allow,
        (Admin, ViewProfile | ViewOwnBoats | ViewBookings) => Allow,
        (Admin, SubmitBoat | SendMessage) => Allow,
        (Admin, UpdateProfile) => IfOwner,
        // no admin bypass on the booking/price protocol: the exact legal
        // callers are the boat owner and the booking user
        (Admin, SetPrice | ApproveBooking) => IfOwner,
        (Admin, CancelBooking | ViewThread) => IfParty,

        (User | BoatOwner, SubmitBoat | SendMessage) => Allow,
        (User, CreateBooking) => Allow,
        (User | BoatOwner, ViewProfile | UpdateProfile) => IfOwner,
        (User | BoatOwner, ViewOwnBoats | ViewBookings | SetPrice) => IfOwner,
        (BoatOwner, ApproveBooking) => IfOwner,
        (User | BoatOwner, CancelBooking | ViewThread) => IfParty,

        _ => Deny,
    }
}

/// Role-level screen: rejects only callers whose role can never perform the
/// action, regardless of target. Run before any load.
pub fn screen(caller: &Caller, action: Action) -> Result<()> {
    if decision(caller.role, action) == Decision::Deny {
        return deny(caller, action, "role may not perform this action");
    }
    Ok(())
}

/// Full gate evaluation against a concrete target.
pub fn authorize(caller: &Caller, action: Action, target: &Target<'_>) -> Result<()> {
    // admin accounts are immutable and undeletable, for admins too
    if action == Action::ManageAccounts {
        if let Target::Account {
            role: Role::Admin, ..
        } = target
        {
            return deny(caller, action, "admin accounts are immutable");
        }
    }

    match decision(caller.role, action) {
        Decision::Allow => Ok(()),
        Decision::Deny => deny(caller, action, "role may not perform this action"),
        Decision::IfOwner => match target {
            Target::Owned { owner_id } if *owner_id == caller.id => Ok(()),
            Target::Account { id, .. } if *id == caller.id => Ok(()),
            _ => deny(caller, action, "caller does not own this resource"),
        },
        Decision::IfParty => match target {
            Target::Parties { user_id, owner_id }
                if *user_id == caller.id || *owner_id == caller.id =>
            {
                Ok(())
            }
            _ => deny(caller, action, "caller is not a party to this resource"),
        },
    }
}

fn deny<T>(caller: &Caller, action: Action, rule: &str) -> Result<T> {
    let who = if caller.id.is_empty() {
        "guest"
    } else {
        caller.id.as_str()
    };
    tracing::debug!(caller = who, role = caller.role.as_str(), ?action, rule, "denied");
    Err(Error::forbidden(who, format!("{action:?}: {rule}")))
}
