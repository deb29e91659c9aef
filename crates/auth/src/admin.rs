//! Per-installation admin set.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use settlebook_core::OperatorId;

use crate::policy::AuthorizationPolicy;

/// One admitted operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminEntry {
    pub user_id: OperatorId,
    pub username: Option<String>,
    pub display_name: String,
    pub is_owner: bool,
}

/// The installation-wide set of operators allowed to drive bookkeeping
/// commands. Spans all groups; serializable so the transport layer can
/// persist it wherever it keeps its own state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSet {
    admins: BTreeMap<OperatorId, AdminEntry>,
}

impl AdminSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set seeded with the installation owner (always an admin).
    pub fn with_owner(owner_id: OperatorId, display_name: impl Into<String>) -> Self {
        let mut set = Self::new();
        set.add(AdminEntry {
            user_id: owner_id,
            username: None,
            display_name: display_name.into(),
            is_owner: true,
        });
        set
    }

    /// Insert or replace an entry.
    pub fn add(&mut self, entry: AdminEntry) {
        self.admins.insert(entry.user_id, entry);
    }

    /// Remove an entry; returns whether one existed.
    pub fn remove(&mut self, user_id: OperatorId) -> bool {
        self.admins.remove(&user_id).is_some()
    }

    pub fn is_admin(&self, user_id: OperatorId) -> bool {
        self.admins.contains_key(&user_id)
    }

    pub fn is_owner(&self, user_id: OperatorId) -> bool {
        self.admins.get(&user_id).is_some_and(|a| a.is_owner)
    }

    /// Entries ordered by user id, for stable listing.
    pub fn list(&self) -> impl Iterator<Item = &AdminEntry> {
        self.admins.values()
    }

    pub fn len(&self) -> usize {
        self.admins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.admins.is_empty()
    }
}

impl AuthorizationPolicy for AdminSet {
    fn can_operate(&self, operator_id: OperatorId) -> bool {
        self.is_admin(operator_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, name: &str) -> AdminEntry {
        AdminEntry {
            user_id: OperatorId::new(id),
            username: None,
            display_name: name.to_string(),
            is_owner: false,
        }
    }

    #[test]
    fn owner_is_always_an_admin() {
        let set = AdminSet::with_owner(OperatorId::new(1), "Owner");
        assert!(set.is_admin(OperatorId::new(1)));
        assert!(set.is_owner(OperatorId::new(1)));
        assert!(set.can_operate(OperatorId::new(1)));
    }

    #[test]
    fn add_and_remove_round_trip() {
        let mut set = AdminSet::with_owner(OperatorId::new(1), "Owner");
        set.add(entry(2, "alice"));

        assert!(set.can_operate(OperatorId::new(2)));
        assert!(!set.is_owner(OperatorId::new(2)));
        assert_eq!(set.len(), 2);

        assert!(set.remove(OperatorId::new(2)));
        assert!(!set.can_operate(OperatorId::new(2)));
        assert!(!set.remove(OperatorId::new(2)));
    }

    #[test]
    fn listing_is_ordered_by_user_id() {
        let mut set = AdminSet::new();
        set.add(entry(30, "c"));
        set.add(entry(10, "a"));
        set.add(entry(20, "b"));

        let ids: Vec<i64> = set.list().map(|a| a.user_id.as_i64()).collect();
        assert_eq!(ids, vec![10, 20, 30]);
    }
}
