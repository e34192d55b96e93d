//! User accounts: registration, credential verification and the admin-side
//! account management surface.

use crate::auth::{self, Action, Caller, Role, Target};
use crate::error::{Error, Result};
use crate::{ids, store};
use sled::Batch;
use std::sync::Arc;
use uuid7::uuid7;

/// Stored credential: sha256 over a per-user random salt plus the password.
/// The scheme is a replaceable collaborator; only `derive`/`verify` leak out.
#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Credential {
    #[n(0)]
    salt: String,
    #[n(1)]
    digest: String,
}

impl Credential {
    pub fn derive(password: &str) -> Self {
        let salt = hex::encode(uuid7().as_bytes());
        let digest = sha256::digest(format!("{salt}{password}"));
        Self { salt, digest }
    }

    pub fn verify(&self, password: &str) -> bool {
        sha256::digest(format!("{}{password}", self.salt)) == self.digest
    }
}

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct User {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub email: String,
    #[n(3)]
    pub credential: Credential,
    #[n(4)]
    pub role: Role,
    #[n(5)]
    pub profile_image: Option<String>,
}

impl User {
    pub fn caller(&self) -> Caller {
        Caller::new(self.id.clone(), self.role)
    }
}

/// Draft for a new account, chained setter style.
#[derive(Debug, Default)]
pub struct AccountDraft {
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

impl AccountDraft {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }
    pub fn set_email(mut self, email: &str) -> Self {
        self.email = Some(email.to_string());
        self
    }
    pub fn set_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    fn validate(self) -> Result<(String, String, String)> {
        let name = match self.name {
            Some(n) if !n.trim().is_empty() => n,
            _ => return Err(Error::validation("account", "name is required")),
        };
        let email = match self.email {
            Some(e) if e.contains('@') && !e.trim().is_empty() => e,
            _ => return Err(Error::validation("account", "a valid email is required")),
        };
        let password = match self.password {
            Some(p) if !p.is_empty() => p,
            _ => return Err(Error::validation("account", "password is required")),
        };
        Ok((name, email, password))
    }
}

/// Headcount per non-admin role, for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleCounts {
    pub users: usize,
    pub boat_owners: usize,
}

pub struct IdentityService {
    instance: Arc<sled::Db>,
}

impl IdentityService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    /// Register a new account with `Role::User`. The email index row is
    /// claimed in the same transaction as the user row, so a duplicate email
    /// surfaces as `Conflict` and never half-registers.
    pub fn register(&self, draft: AccountDraft) -> Result<User> {
        let (name, email, password) = draft.validate()?;
        self.insert_account(name, email, password, Role::User)
    }

    /// Idempotent bootstrap of the administrator account. Returns the
    /// existing admin if the email is already claimed.
    pub fn ensure_admin(&self, name: &str, email: &str, password: &str) -> Result<User> {
        let email_key = ids::email_key(email);
        if let Some(id_raw) = self.instance.get(email_key.as_bytes())? {
            let id = String::from_utf8_lossy(&id_raw).to_string();
            return store::fetch_or(&self.instance, "user", &id);
        }
        let (name, email, password) = AccountDraft::new()
            .set_name(name)
            .set_email(email)
            .set_password(password)
            .validate()?;
        self.insert_account(name, email, password, Role::Admin)
    }

    /// Admin-created boat owner account.
    pub fn create_owner_account(&self, caller: &Caller, draft: AccountDraft) -> Result<User> {
        auth::authorize(caller, Action::ManageAccounts, &Target::Public)?;
        let (name, email, password) = draft.validate()?;
        self.insert_account(name, email, password, Role::BoatOwner)
    }

    fn insert_account(
        &self,
        name: String,
        email: String,
        password: String,
        role: Role,
    ) -> Result<User> {
        let user = User {
            id: ids::new_id(ids::USER),
            name,
            email,
            credential: Credential::derive(&password),
            role,
            profile_image: None,
        };
        let email_key = ids::email_key(&user.email);
        let raw = store::to_cbor(&user.id, &user)?;

        let outcome = self.instance.transaction(|tx| {
            if tx.get(email_key.as_bytes())?.is_some() {
                return store::abort(Error::conflict(&email_key, "email already registered"));
            }
            tx.insert(user.id.as_bytes(), raw.clone())?;
            tx.insert(email_key.as_bytes(), user.id.as_bytes())?;
            Ok(())
        });
        store::unwrap_tx(outcome)?;

        tracing::info!(user = %user.id, role = user.role.as_str(), "account created");
        Ok(user)
    }

    /// Verify credentials and hand back the caller identity. Failures never
    /// reveal whether the email exists.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<Caller> {
        let invalid = || Error::forbidden("guest", "invalid credentials");

        let email_key = ids::email_key(email);
        let id_raw = self.instance.get(email_key.as_bytes())?.ok_or_else(invalid)?;
        let id = String::from_utf8_lossy(&id_raw).to_string();
        let user: User = store::fetch(&self.instance, &id)?.ok_or_else(invalid)?;
        if !user.credential.verify(password) {
            return Err(invalid());
        }
        Ok(user.caller())
    }

    pub fn get_profile(&self, caller: &Caller, user_id: &str) -> Result<User> {
        auth::screen(caller, Action::ViewProfile)?;
        let user: User = store::fetch_or(&self.instance, "user", user_id)?;
        auth::authorize(
            caller,
            Action::ViewProfile,
            &Target::Account {
                id: &user.id,
                role: user.role,
            },
        )?;
        Ok(user)
    }

    /// Store an opaque stored-file reference on the caller's own account.
    pub fn set_profile_image(&self, caller: &Caller, file_ref: &str) -> Result<User> {
        auth::screen(caller, Action::UpdateProfile)?;
        let mut user: User = store::fetch_or(&self.instance, "user", &caller.id)?;
        auth::authorize(
            caller,
            Action::UpdateProfile,
            &Target::Account {
                id: &user.id,
                role: user.role,
            },
        )?;
        user.profile_image = Some(file_ref.to_string());
        store::put(&self.instance, &user.id, &user)?;
        Ok(user)
    }

    /// Admin edit of a non-admin account's name and email. A changed email
    /// re-points the email index in the same transaction.
    pub fn update_contact(
        &self,
        caller: &Caller,
        user_id: &str,
        name: &str,
        email: &str,
    ) -> Result<User> {
        auth::screen(caller, Action::ManageAccounts)?;
        let mut user: User = store::fetch_or(&self.instance, "user", user_id)?;
        auth::authorize(
            caller,
            Action::ManageAccounts,
            &Target::Account {
                id: &user.id,
                role: user.role,
            },
        )?;
        if name.trim().is_empty() {
            return Err(Error::validation("account", "name is required"));
        }
        if !email.contains('@') {
            return Err(Error::validation("account", "a valid email is required"));
        }

        let old_key = ids::email_key(&user.email);
        let new_key = ids::email_key(email);
        user.name = name.to_string();
        user.email = email.to_string();
        let raw = store::to_cbor(&user.id, &user)?;

        let outcome = self.instance.transaction(|tx| {
            if new_key != old_key {
                if tx.get(new_key.as_bytes())?.is_some() {
                    return store::abort(Error::conflict(&new_key, "email already registered"));
                }
                tx.remove(old_key.as_bytes())?;
                tx.insert(new_key.as_bytes(), user.id.as_bytes())?;
            }
            tx.insert(user.id.as_bytes(), raw.clone())?;
            Ok(())
        });
        store::unwrap_tx(outcome)?;
        Ok(user)
    }

    /// Admin hard delete. Admin accounts are undeletable (gate rule).
    pub fn delete_account(&self, caller: &Caller, user_id: &str) -> Result<()> {
        auth::screen(caller, Action::ManageAccounts)?;
        let user: User = store::fetch_or(&self.instance, "user", user_id)?;
        auth::authorize(
            caller,
            Action::ManageAccounts,
            &Target::Account {
                id: &user.id,
                role: user.role,
            },
        )?;

        let mut batch = Batch::default();
        batch.remove(user.id.as_bytes());
        batch.remove(ids::email_key(&user.email).as_bytes());
        self.instance.apply_batch(batch)?;

        tracing::info!(user = %user.id, "account deleted");
        Ok(())
    }

    /// Admin listing of accounts holding one role.
    pub fn list_accounts(&self, caller: &Caller, role: Role) -> Result<Vec<User>> {
        auth::authorize(caller, Action::ListAccounts, &Target::Public)?;
        let mut users: Vec<User> = store::scan(&self.instance, ids::USER)?;
        users.retain(|u| u.role == role);
        Ok(users)
    }

    /// Dashboard headcounts.
    pub fn role_counts(&self, caller: &Caller) -> Result<RoleCounts> {
        auth::authorize(caller, Action::ListAccounts, &Target::Public)?;
        let users: Vec<User> = store::scan(&self.instance, ids::USER)?;
        Ok(RoleCounts {
            users: users.iter().filter(|u| u.role == Role::User).count(),
            boat_owners: users.iter().filter(|u| u.role == Role::BoatOwner).count(),
        })
    }
}
