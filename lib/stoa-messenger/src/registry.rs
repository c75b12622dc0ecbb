use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use anyhow::bail;
use tokio::sync::mpsc;

use crate::{MessageDelivery, UserId};

/// Who is reachable right now. Values are the sending half of each live
/// connection's outbound channel. Entries only ever live as long as the
/// process; nothing here is persisted.
#[derive(Clone)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<UserId, mpsc::UnboundedSender<MessageDelivery>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        ConnectionRegistry { connections: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Registers a delivery channel for the user. Announcing again replaces
    /// the previous channel: last writer wins.
    pub fn register(&self, user_id: UserId, sender: mpsc::UnboundedSender<MessageDelivery>) -> anyhow::Result<()> {
        let mut connections = match self.connections.write() {
            Ok(lock) => lock,
            Err(e) => bail!("Could not lock connection registry for write: {e}"),
        };
        connections.insert(user_id, sender);
        Ok(())
    }

    /// Removes every entry holding exactly this channel. Entries pointing at
    /// other channels stay, including a newer channel for the same user.
    pub fn deregister(&self, sender: &mpsc::UnboundedSender<MessageDelivery>) -> anyhow::Result<()> {
        let mut connections = match self.connections.write() {
            Ok(lock) => lock,
            Err(e) => bail!("Could not lock connection registry for write: {e}"),
        };
        connections.retain(|_, registered| !registered.same_channel(sender));
        Ok(())
    }

    pub fn lookup(&self, user_id: &UserId) -> anyhow::Result<Option<mpsc::UnboundedSender<MessageDelivery>>> {
        let connections = match self.connections.read() {
            Ok(lock) => lock,
            Err(e) => bail!("Could not lock connection registry for read: {e}"),
        };
        Ok(connections.get(user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup() {
        let registry = ConnectionRegistry::new();
        let user = uuid::Uuid::new_v4();
        let (sender, _receiver) = mpsc::unbounded_channel();

        registry.register(user, sender.clone()).unwrap();

        let found = registry.lookup(&user).unwrap().unwrap();
        assert!(found.same_channel(&sender));
    }

    #[test]
    fn lookup_of_unknown_user_is_none() {
        let registry = ConnectionRegistry::new();
        assert!(registry.lookup(&uuid::Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn reannounce_overwrites() {
        let registry = ConnectionRegistry::new();
        let user = uuid::Uuid::new_v4();
        let (first, _first_rx) = mpsc::unbounded_channel();
        let (second, _second_rx) = mpsc::unbounded_channel();

        registry.register(user, first.clone()).unwrap();
        registry.register(user, second.clone()).unwrap();

        let found = registry.lookup(&user).unwrap().unwrap();
        assert!(found.same_channel(&second));
        assert!(!found.same_channel(&first));
    }

    #[test]
    fn deregister_removes_only_that_channel() {
        let registry = ConnectionRegistry::new();
        let (user_a, user_b, user_c) = (uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), uuid::Uuid::new_v4());
        let (sender_a, _rx_a) = mpsc::unbounded_channel();
        let (sender_b, _rx_b) = mpsc::unbounded_channel();
        let (sender_c, _rx_c) = mpsc::unbounded_channel();

        registry.register(user_a, sender_a).unwrap();
        registry.register(user_b, sender_b.clone()).unwrap();
        registry.register(user_c, sender_c).unwrap();

        registry.deregister(&sender_b).unwrap();

        assert!(registry.lookup(&user_a).unwrap().is_some());
        assert!(registry.lookup(&user_b).unwrap().is_none());
        assert!(registry.lookup(&user_c).unwrap().is_some());
    }

    #[test]
    fn deregister_of_replaced_channel_keeps_current() {
        let registry = ConnectionRegistry::new();
        let user = uuid::Uuid::new_v4();
        let (stale, _stale_rx) = mpsc::unbounded_channel();
        let (current, _current_rx) = mpsc::unbounded_channel();

        registry.register(user, stale.clone()).unwrap();
        registry.register(user, current.clone()).unwrap();

        // the stale connection closing must not evict the newer one
        registry.deregister(&stale).unwrap();

        let found = registry.lookup(&user).unwrap().unwrap();
        assert!(found.same_channel(&current));
    }
}
