//! Tenant-wide principal directory.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use crate::rbac::{Principal, Rbac};

/// Maps principal IDs to their [`Rbac`] binding.
///
/// Safe for concurrent use. `add_user` is an atomic test-and-insert; any
/// other sequence of calls (e.g. `has_user` then `get_rbac`) is not atomic as
/// a whole.
///
/// # Example
///
/// ```
/// use saas_rbac::{Principal, RbacMatrix};
///
/// let matrix = RbacMatrix::new();
/// let merchant = Principal::new("merchant-1");
///
/// assert!(matrix.add_user(&merchant));
/// assert!(!matrix.add_user(&merchant));
/// assert!(matrix.del_user(&merchant));
/// assert!(!matrix.has_user(&merchant));
/// ```
#[derive(Debug, Default)]
pub struct RbacMatrix {
    rbacs: DashMap<String, Arc<Rbac>>,
}

impl RbacMatrix {
    /// Create an empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enrol a principal with an empty role set.
    ///
    /// The binding holds its own copy of `principal`. Returns `false` if the
    /// principal is already enrolled.
    pub fn add_user(&self, principal: &Principal) -> bool {
        match self.rbacs.entry(principal.id.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(Rbac::new(principal.clone())));
                debug!(principal = %principal.id, "principal enrolled");
                true
            }
        }
    }

    /// Remove a principal. Returns `false` if it was not enrolled.
    pub fn del_user(&self, principal: &Principal) -> bool {
        let removed = self.rbacs.remove(&principal.id).is_some();
        if removed {
            debug!(principal = %principal.id, "principal removed");
        }
        removed
    }

    /// Check if a principal is enrolled.
    pub fn has_user(&self, principal: &Principal) -> bool {
        self.rbacs.contains_key(&principal.id)
    }

    /// Get the binding for a principal.
    pub fn get_rbac(&self, principal: &Principal) -> Option<Arc<Rbac>> {
        self.get_rbac_by_id(&principal.id)
    }

    /// Get the binding for a principal ID.
    pub fn get_rbac_by_id(&self, principal_id: &str) -> Option<Arc<Rbac>> {
        self.rbacs.get(principal_id).map(|entry| Arc::clone(entry.value()))
    }

    /// IDs of every enrolled principal, sorted.
    pub fn principal_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.rbacs.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Number of enrolled principals.
    pub fn len(&self) -> usize {
        self.rbacs.len()
    }

    /// Check if no principal is enrolled.
    pub fn is_empty(&self) -> bool {
        self.rbacs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;

    #[test]
    fn test_user_lifecycle() {
        let matrix = RbacMatrix::new();
        let p = Principal::new("m-1");

        assert!(matrix.is_empty());
        assert!(matrix.add_user(&p));
        assert!(!matrix.add_user(&p));
        assert!(matrix.has_user(&p));
        assert_eq!(matrix.len(), 1);

        assert!(matrix.del_user(&p));
        assert!(!matrix.has_user(&p));
        assert!(!matrix.del_user(&p));
        assert!(matrix.get_rbac(&p).is_none());
    }

    #[test]
    fn test_add_user_binds_a_copy() {
        let matrix = RbacMatrix::new();
        let mut p = Principal::new("m-1").with_name("before");
        matrix.add_user(&p);

        p.name = "after".to_string();
        let rbac = matrix.get_rbac(&p).unwrap();
        assert_eq!(rbac.principal().name, "before");
    }

    #[test]
    fn test_get_rbac_returns_live_binding() {
        let matrix = RbacMatrix::new();
        let p = Principal::new("m-1");
        matrix.add_user(&p);

        let role = Arc::new(Role::new(1, "viewer"));
        matrix.get_rbac(&p).unwrap().add_role(&role).unwrap();

        assert!(matrix.get_rbac_by_id("m-1").unwrap().has_role(&role));
    }

    #[test]
    fn test_principal_ids_sorted() {
        let matrix = RbacMatrix::new();
        matrix.add_user(&Principal::new("b"));
        matrix.add_user(&Principal::new("a"));
        assert_eq!(matrix.principal_ids(), vec!["a".to_string(), "b".to_string()]);
    }
}
