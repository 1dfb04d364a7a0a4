//! RolesCache caches permission documents loaded from the roles table
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use models::authorization::ModulePermissions;
use models::RoleId;

/// Process-wide cache of role permission documents, keyed by role id.
/// The roles repo removes an entry whenever the role is mutated, so a
/// warm entry never outlives a role edit in this process.
#[derive(Clone, Default)]
pub struct RolesCacheImpl {
    roles_cache: Arc<Mutex<HashMap<RoleId, Vec<ModulePermissions>>>>,
}

impl RolesCacheImpl {
    pub fn contains(&self, id: RoleId) -> bool {
        let hash_map = self.roles_cache.lock().unwrap();
        hash_map.contains_key(&id)
    }

    pub fn get(&self, id: RoleId) -> Option<Vec<ModulePermissions>> {
        let hash_map = self.roles_cache.lock().unwrap();
        hash_map.get(&id).cloned()
    }

    pub fn add_permissions(&self, id: RoleId, permissions: &[ModulePermissions]) {
        let mut hash_map = self.roles_cache.lock().unwrap();
        hash_map.insert(id, permissions.to_vec());
    }

    pub fn remove(&self, id: RoleId) {
        let mut hash_map = self.roles_cache.lock().unwrap();
        hash_map.remove(&id);
    }

    pub fn clear(&self) {
        let mut hash_map = self.roles_cache.lock().unwrap();
        hash_map.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_cache() {
        let cache = RolesCacheImpl::default();
        let id = RoleId(1);
        let permissions = vec![ModulePermissions::new("coupons", vec![0, 1])];

        assert!(!cache.contains(id));
        assert_eq!(cache.get(id), None);

        cache.add_permissions(id, &permissions);
        assert!(cache.contains(id));
        assert_eq!(cache.get(id), Some(permissions));

        cache.remove(id);
        assert!(!cache.contains(id));

        cache.add_permissions(id, &[]);
        cache.clear();
        assert!(!cache.contains(id));
    }
}
