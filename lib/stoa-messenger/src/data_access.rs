use std::future::Future;

use crate::{Message, MessageId, UserId};

macro_rules! async_result {
    ($t:ty) => {
        impl Future<Output = Result<$t, Self::Error>> + Send
    };
}

pub trait MessageStore: 'static + Send + Sync + Clone {
    type Error: 'static + std::error::Error + Send + Sync;

    fn create_message(&self, message: &Message) -> async_result!(());
    /// Everything the two users ever exchanged, oldest first.
    fn conversation(&self, user_a: &UserId, user_b: &UserId) -> async_result!(Vec<Message>);
    /// The most recent message between the pair, whichever direction it went.
    fn latest_message_between(&self, user_a: &UserId, user_b: &UserId) -> async_result!(Option<Message>);
    /// Idempotent. Returns false when no such message exists.
    fn mark_read(&self, message_id: &MessageId) -> async_result!(bool);
}
