//! User → connection registry.
//!
//! Holds at most one connection per user id. A reverse index from
//! connection id to the user ids it carries makes cleanup on close
//! proportional to what that connection registered.

use std::collections::{HashMap, HashSet};

use crate::connection::{Connection, ConnectionId};

#[derive(Debug)]
pub struct Registry<C> {
    by_user: HashMap<String, C>,
    by_connection: HashMap<ConnectionId, HashSet<String>>,
}

impl<C: Connection> Registry<C> {
    pub fn new() -> Self {
        Self {
            by_user: HashMap::new(),
            by_connection: HashMap::new(),
        }
    }

    /// Map `user_id` to `conn`, evicting whatever entry the user had.
    ///
    /// Returns the evicted connection's id, if there was one.
    pub fn upsert(&mut self, user_id: &str, conn: C) -> Option<ConnectionId> {
        let conn_id = conn.id();
        let previous = self.by_user.insert(user_id.to_string(), conn);

        let evicted = previous.map(|old| old.id());
        if let Some(old_id) = evicted {
            self.unindex(old_id, user_id);
        }

        self.by_connection
            .entry(conn_id)
            .or_default()
            .insert(user_id.to_string());

        evicted
    }

    pub fn lookup(&self, user_id: &str) -> Option<&C> {
        self.by_user.get(user_id)
    }

    /// Remove every entry pointing at `conn_id`. Entries a newer connection
    /// created for the same user id are left alone.
    ///
    /// Returns the user ids that were removed.
    pub fn remove_connection(&mut self, conn_id: ConnectionId) -> Vec<String> {
        let Some(user_ids) = self.by_connection.remove(&conn_id) else {
            return Vec::new();
        };

        let mut removed = Vec::with_capacity(user_ids.len());
        for user_id in user_ids {
            let owned = self
                .by_user
                .get(&user_id)
                .is_some_and(|conn| conn.id() == conn_id);
            if owned {
                self.by_user.remove(&user_id);
                removed.push(user_id);
            }
        }
        removed
    }

    /// Whether `conn_id` currently backs at least one user id.
    pub fn is_identified(&self, conn_id: ConnectionId) -> bool {
        self.by_connection.contains_key(&conn_id)
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }

    fn unindex(&mut self, conn_id: ConnectionId, user_id: &str) {
        if let Some(user_ids) = self.by_connection.get_mut(&conn_id) {
            user_ids.remove(user_id);
            if user_ids.is_empty() {
                self.by_connection.remove(&conn_id);
            }
        }
    }
}

impl<C: Connection> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}
