//! Append-only message log between an account and the administrator.
//!
//! Workflow-neutral: included for the visibility rule that a thread belongs
//! to its two participants only. Delivery is a collaborator concern.

use crate::account::User;
use crate::auth::{self, Action, Caller, Role, Target};
use crate::error::{Error, Result};
use crate::types::TimeStamp;
use crate::{ids, store};
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone, minicbor::Encode, minicbor::Decode)]
pub struct Message {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub sender_id: String,
    #[n(2)]
    pub receiver_id: String,
    #[n(3)]
    pub body: String,
    #[n(4)]
    pub sent_at: TimeStamp<Utc>,
}

pub struct ChatService {
    instance: Arc<sled::Db>,
}

impl ChatService {
    pub fn new(instance: Arc<sled::Db>) -> Self {
        Self { instance }
    }

    /// Append a message. A non-admin sender may only address an admin
    /// account; admins may address anyone.
    pub fn send(&self, caller: &Caller, receiver_id: &str, body: &str) -> Result<Message> {
        auth::authorize(caller, Action::SendMessage, &Target::Public)?;
        if body.trim().is_empty() {
            return Err(Error::validation("message", "body is required"));
        }
        let receiver: User = store::fetch_or(&self.instance, "user", receiver_id)?;
        if caller.role != Role::Admin && receiver.role != Role::Admin {
            return Err(Error::forbidden(
                &caller.id,
                "messages must involve the administrator",
            ));
        }

        let message = Message {
            id: ids::new_id(ids::MESSAGE),
            sender_id: caller.id.clone(),
            receiver_id: receiver.id,
            body: body.to_string(),
            sent_at: TimeStamp::now(),
        };
        store::put(&self.instance, &message.id, &message)?;
        Ok(message)
    }

    /// The thread between the caller and one peer, oldest first. The caller
    /// is structurally one of the two participants.
    pub fn thread(&self, caller: &Caller, other_id: &str) -> Result<Vec<Message>> {
        auth::authorize(
            caller,
            Action::ViewThread,
            &Target::Parties {
                user_id: &caller.id,
                owner_id: other_id,
            },
        )?;
        let _other: User = store::fetch_or(&self.instance, "user", other_id)?;

        let mut messages: Vec<Message> = store::scan(&self.instance, ids::MESSAGE)?;
        messages.retain(|m| {
            (m.sender_id == caller.id && m.receiver_id == other_id)
                || (m.sender_id == other_id && m.receiver_id == caller.id)
        });
        messages.sort_by(|a, b| a.sent_at.cmp(&b.sent_at));
        Ok(messages)
    }
}
