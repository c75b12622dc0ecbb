use anyhow::{Context, Result};
use thiserror::Error;

use stoa_campus::data_access::DataAccess;
use stoa_utils::utils::log_internal_error;

use crate::authorization;
use crate::data_access::MessageStore;
use crate::registry::ConnectionRegistry;
use crate::{Message, MessageDelivery, MessageId, UserId, UserSummary};

/// Send failures the wire layers phrase for their clients. The
/// [`NotPermitted`](SendMessageError::NotPermitted) text is the exact
/// string clients expect.
#[derive(Error, Debug)]
pub enum SendMessageError {
    #[error("You do not have permission to send messages to this user")]
    NotPermitted,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// The messaging service: resolves accounts, applies the role policy,
/// persists and only then pushes to whoever is connected.
#[derive(Clone)]
pub struct Messenger<S> {
    store: S,
    registry: ConnectionRegistry,
}

impl<S: DataAccess + MessageStore> Messenger<S> {
    pub fn new(store: S) -> Self {
        Messenger { store, registry: ConnectionRegistry::new() }
    }

    /// Live connections announce and retire their delivery channels here.
    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Sends a message from one account to another. Unknown accounts are a
    /// policy denial, not an internal error. On success the message is
    /// durably stored before any delivery attempt, and the returned payload
    /// is the one pushed to the receiver's live connection.
    pub async fn send_message(&self, from: UserId, to: UserId, content: String) -> Result<MessageDelivery, SendMessageError> {
        let sender = self.store
            .fetch_user(&from).await
            .with_context(|| format!("Couldn't fetch sending user {from}"))?
            .ok_or(SendMessageError::NotPermitted)?;

        let receiver = self.store
            .fetch_user(&to).await
            .with_context(|| format!("Couldn't fetch receiving user {to}"))?
            .ok_or(SendMessageError::NotPermitted)?;

        if !authorization::can_send(&self.store, &sender, &receiver).await {
            return Err(SendMessageError::NotPermitted);
        }

        let message = Message {
            id: uuid::Uuid::new_v4(),
            from,
            to,
            content,
            read: false,
            sent_at: chrono::Utc::now(),
        };

        self.store
            .create_message(&message).await
            .with_context(|| format!("Couldn't create message from {from} to {to}"))?;

        let delivery = MessageDelivery {
            message,
            sender: UserSummary::from(&sender),
            receiver: UserSummary::from(&receiver),
        };

        self.push_to_receiver(&delivery);

        Ok(delivery)
    }

    pub async fn conversation(&self, current_user: &UserId, other_user: &UserId) -> Result<Vec<Message>> {
        self.store
            .conversation(current_user, other_user).await
            .with_context(|| format!("Couldn't fetch conversation between {current_user} and {other_user}"))
    }

    pub async fn mark_read(&self, message_id: &MessageId) -> Result<bool> {
        self.store
            .mark_read(message_id).await
            .with_context(|| format!("Couldn't mark message {message_id} as read"))
    }

    // A missing registry entry and a closed channel both mean the receiver
    // is offline; the message already sits in the store either way.
    fn push_to_receiver(&self, delivery: &MessageDelivery) {
        match self.registry.lookup(&delivery.message.to) {
            Ok(Some(channel)) => {
                let _ = channel.send(delivery.clone());
            }
            Ok(None) => {}
            Err(e) => log_internal_error(e),
        }
    }
}
