//! # Per-principal role binding
//!
//! An [`Rbac`] binds one principal to the roles directly assigned to it.
//! It is not hierarchical itself; methods with `inherited` in their name
//! follow the parent chains stored inside each [`Role`].
//!
//! Two families of operations:
//! - **Role operations**: `add_role`, `get_role`, `del_role`, `roles`, `roles_inherited`
//! - **Permission operations**: `permit`, `revoke`, `has_perm`, `is_granted`, ...

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use tracing::debug;

use crate::error::{RbacError, RbacResult};
use crate::permissions::Permission;
use crate::role::{unique_by_id, Role};

/// An identity (user or merchant) that can be assigned roles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Principal {
    /// Opaque principal identifier.
    #[serde(rename = "user_id")]
    pub id: String,
    /// Display name.
    #[serde(rename = "user_name", default)]
    pub name: String,
    /// Free-text description.
    #[serde(rename = "user_desc", default)]
    pub description: String,
}

impl Principal {
    /// Create a principal with just an ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// One principal's directly assigned roles.
///
/// Roles are held by reference: [`Rbac::permit`] and [`Rbac::revoke`] on an
/// already registered role mutate the shared node, so the change applies to
/// every principal holding that role.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use saas_rbac::{Permission, Principal, Rbac, Role};
///
/// let rbac = Rbac::new(Principal::new("merchant-1"));
/// let viewer = Arc::new(Role::new(1, "viewer"));
/// let read = Arc::new(Permission::new(10, "read-reports"));
///
/// rbac.permit(&viewer, &read).unwrap();
/// assert!(rbac.has_role(&viewer));
/// assert!(rbac.is_granted(&viewer, &read));
///
/// // A second identical permit is a duplicate.
/// assert!(rbac.permit(&viewer, &read).is_err());
///
/// // Revoking without a permission drops the role assignment.
/// rbac.revoke(&viewer, None).unwrap();
/// assert!(!rbac.has_role(&viewer));
/// ```
#[derive(Debug)]
pub struct Rbac {
    principal: Principal,
    roles: DashMap<u32, Arc<Role>>,
}

impl Rbac {
    /// Create an empty binding for `principal`.
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            roles: DashMap::new(),
        }
    }

    /// The bound principal.
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Copy this role set onto another principal.
    ///
    /// The new binding shares the same role nodes.
    pub fn clone_for(&self, principal: Principal) -> Rbac {
        let cloned = Rbac::new(principal);
        for entry in self.roles.iter() {
            cloned.roles.insert(*entry.key(), Arc::clone(entry.value()));
        }
        cloned
    }

    /// Assign a role directly.
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleAlreadyAssigned`] if a role with this ID is assigned.
    pub fn add_role(&self, role: &Arc<Role>) -> RbacResult<()> {
        match self.roles.entry(role.id) {
            Entry::Occupied(_) => Err(RbacError::RoleAlreadyAssigned {
                principal: self.principal.id.clone(),
                role: role.id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(role));
                debug!(principal = %self.principal.id, role_id = role.id, "role assigned");
                Ok(())
            }
        }
    }

    /// Look up the registered node with the same ID as `role`.
    pub fn get_role(&self, role: &Role) -> Option<Arc<Role>> {
        self.get_role_by_id(role.id)
    }

    /// Look up a registered role by ID.
    pub fn get_role_by_id(&self, role_id: u32) -> Option<Arc<Role>> {
        self.roles.get(&role_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Remove a direct role assignment.
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleNotAssigned`] if no role with this ID is assigned.
    pub fn del_role(&self, role: &Role) -> RbacResult<()> {
        match self.roles.remove(&role.id) {
            Some(_) => {
                debug!(principal = %self.principal.id, role_id = role.id, "role removed");
                Ok(())
            }
            None => Err(RbacError::RoleNotAssigned {
                principal: self.principal.id.clone(),
                role: role.id,
            }),
        }
    }

    /// Directly assigned roles.
    pub fn roles(&self) -> Vec<Arc<Role>> {
        self.roles.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    /// Directly assigned roles plus all their ancestors, deduplicated by ID.
    pub fn roles_inherited(&self) -> Vec<Arc<Role>> {
        let mut all = Vec::new();
        for role in self.roles() {
            let ancestors = role.parents_deep();
            all.push(role);
            all.extend(ancestors);
        }
        unique_by_id(all, |role| role.id)
    }

    /// Check for a direct assignment.
    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains_key(&role.id)
    }

    /// Check for a direct assignment or an ancestor of an assigned role.
    pub fn has_role_inherited(&self, role: &Role) -> bool {
        self.has_role(role) || self.roles().iter().any(|assigned| assigned.has_ancestor(role))
    }

    /// Direct grants of every assigned role, deduplicated by ID.
    pub fn perms(&self) -> Vec<Arc<Permission>> {
        let all: Vec<Arc<Permission>> =
            self.roles().iter().flat_map(|role| role.permissions()).collect();
        unique_by_id(all, |perm| perm.id)
    }

    /// [`Role::permissions_deep`] of every assigned role, deduplicated by ID.
    pub fn perms_inherited(&self) -> Vec<Arc<Permission>> {
        let all: Vec<Arc<Permission>> = self
            .roles()
            .iter()
            .flat_map(|role| role.permissions_deep())
            .collect();
        unique_by_id(all, |perm| perm.id)
    }

    /// Check if any assigned role directly grants `perm`.
    pub fn has_perm(&self, perm: &Permission) -> bool {
        self.roles().iter().any(|role| role.is_granted(perm))
    }

    /// Check if any assigned role grants `perm` directly or by inheritance.
    pub fn has_perm_inherited(&self, perm: &Permission) -> bool {
        self.roles().iter().any(|role| role.is_grant_inherited(perm))
    }

    /// Grant `perm` through `role`.
    ///
    /// If a role with this ID is already assigned, `perm` is granted on that
    /// **existing** node, affecting every principal holding it. Otherwise
    /// `perm` is granted on `role` itself, which is then assigned to this
    /// principal.
    ///
    /// # Errors
    ///
    /// - [`RbacError::PermissionAlreadyGranted`] if the assigned node already
    ///   grants `perm`; of concurrent identical calls exactly one succeeds
    /// - [`RbacError::RoleAlreadyAssigned`] if another caller assigned the
    ///   role concurrently
    pub fn permit(&self, role: &Arc<Role>, perm: &Arc<Permission>) -> RbacResult<()> {
        if let Some(existing) = self.get_role(role) {
            if !existing.grant(perm) {
                return Err(RbacError::PermissionAlreadyGranted {
                    role: existing.id,
                    permission: perm.id,
                });
            }
            return Ok(());
        }

        role.grant(perm);
        self.add_role(role)
    }

    /// Revoke `perm` from `role`, or the role itself.
    ///
    /// With `None` the role assignment is removed (see [`Rbac::del_role`]).
    /// With `Some(perm)` the permission is revoked from the registered node,
    /// affecting every principal holding it; an unregistered role is a no-op.
    pub fn revoke(&self, role: &Role, perm: Option<&Permission>) -> RbacResult<()> {
        let Some(perm) = perm else {
            return self.del_role(role);
        };
        if let Some(existing) = self.get_role(role) {
            existing.revoke(perm);
        }
        Ok(())
    }

    /// Check the registered node for a direct grant.
    ///
    /// `false` if `role` is not assigned to this principal.
    pub fn is_granted(&self, role: &Role, perm: &Permission) -> bool {
        self.get_role(role)
            .map(|registered| registered.is_granted(perm))
            .unwrap_or(false)
    }

    /// Check the registered node for a direct or inherited grant.
    ///
    /// `false` if `role` is not assigned to this principal.
    pub fn is_grant_inherited(&self, role: &Role, perm: &Permission) -> bool {
        self.get_role(role)
            .map(|registered| registered.is_grant_inherited(perm))
            .unwrap_or(false)
    }

    /// True if [`Rbac::is_granted`] holds for any role in `roles`.
    pub fn any_granted(&self, roles: &[Arc<Role>], perm: &Permission) -> bool {
        roles.iter().any(|role| self.is_granted(role, perm))
    }

    /// True if [`Rbac::is_granted`] holds for every role in `roles`.
    pub fn all_granted(&self, roles: &[Arc<Role>], perm: &Permission) -> bool {
        roles.iter().all(|role| self.is_granted(role, perm))
    }

    /// True if [`Rbac::is_grant_inherited`] holds for any role in `roles`.
    pub fn any_grant_inherited(&self, roles: &[Arc<Role>], perm: &Permission) -> bool {
        roles.iter().any(|role| self.is_grant_inherited(role, perm))
    }

    /// True if [`Rbac::is_grant_inherited`] holds for every role in `roles`.
    pub fn all_grant_inherited(&self, roles: &[Arc<Role>], perm: &Permission) -> bool {
        roles.iter().all(|role| self.is_grant_inherited(role, perm))
    }

    /// Multi-line dump of direct and inherited state.
    pub fn prettify(&self) -> String {
        let join = |items: Vec<String>| items.join(",");
        format!(
            "\nRBAC:\n\tUser:{}\n\tPerms:{}\n\tPermsInherited:{}\n\tRoles:{}\n\tRolesInherited:{}\n",
            self.principal.id,
            join(self.perms().iter().map(|p| p.to_string()).collect()),
            join(self.perms_inherited().iter().map(|p| p.to_string()).collect()),
            join(self.roles().iter().map(|r| r.to_string()).collect()),
            join(self.roles_inherited().iter().map(|r| r.to_string()).collect()),
        )
    }
}

impl Serialize for Rbac {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut role_ids: Vec<u32> = self.roles.iter().map(|entry| *entry.key()).collect();
        role_ids.sort_unstable();

        let mut state = serializer.serialize_struct("Rbac", 2)?;
        state.serialize_field("user", &self.principal)?;
        state.serialize_field("roles", &role_ids)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: u32) -> Arc<Role> {
        Arc::new(Role::new(id, format!("role-{}", id)))
    }

    fn perm(id: u32) -> Arc<Permission> {
        Arc::new(Permission::new(id, format!("perm-{}", id)))
    }

    fn sorted_ids<T>(items: &[Arc<T>], id: impl Fn(&T) -> u32) -> Vec<u32> {
        let mut ids: Vec<u32> = items.iter().map(|item| id(item.as_ref())).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_add_get_del_role() {
        let rbac = Rbac::new(Principal::new("u-1"));
        let r = role(1);

        rbac.add_role(&r).unwrap();
        assert!(rbac.has_role(&r));
        assert!(Arc::ptr_eq(&rbac.get_role(&r).unwrap(), &r));

        let err = rbac.add_role(&r).unwrap_err();
        assert_eq!(
            err,
            RbacError::RoleAlreadyAssigned { principal: "u-1".to_string(), role: 1 }
        );

        rbac.del_role(&r).unwrap();
        assert!(rbac.get_role(&r).is_none());
        assert!(rbac.del_role(&r).unwrap_err().is_not_found());
    }

    #[test]
    fn test_roles_inherited_dedups_shared_ancestor() {
        let base = role(1);
        let a = role(2);
        let b = role(3);
        a.add_parent(&base).unwrap();
        b.add_parent(&base).unwrap();

        let rbac = Rbac::new(Principal::new("u-1"));
        rbac.add_role(&a).unwrap();
        rbac.add_role(&b).unwrap();

        assert_eq!(sorted_ids(&rbac.roles(), |r| r.id), vec![2, 3]);
        assert_eq!(sorted_ids(&rbac.roles_inherited(), |r| r.id), vec![1, 2, 3]);
        assert!(!rbac.has_role(&base));
        assert!(rbac.has_role_inherited(&base));
    }

    #[test]
    fn test_perms_and_perms_inherited() {
        let parent = role(1);
        let child = role(2);
        child.add_parent(&parent).unwrap();
        let p_parent = perm(10);
        let p_child = perm(20);
        parent.grant(&p_parent);
        child.grant(&p_child);

        let rbac = Rbac::new(Principal::new("u-1"));
        rbac.add_role(&child).unwrap();

        assert_eq!(sorted_ids(&rbac.perms(), |p| p.id), vec![20]);
        assert_eq!(sorted_ids(&rbac.perms_inherited(), |p| p.id), vec![10, 20]);
        assert!(rbac.has_perm(&p_child));
        assert!(!rbac.has_perm(&p_parent));
        assert!(rbac.has_perm_inherited(&p_parent));
    }

    #[test]
    fn test_permit_registered_role_mutates_shared_node() {
        let shared = role(1);
        let alice = Rbac::new(Principal::new("alice"));
        let bob = Rbac::new(Principal::new("bob"));
        alice.add_role(&shared).unwrap();
        bob.add_role(&shared).unwrap();

        let p = perm(10);
        alice.permit(&shared, &p).unwrap();
        assert!(bob.is_granted(&shared, &p));

        // A different value with the same ID resolves to the registered node.
        let twin = role(1);
        let err = alice.permit(&twin, &p).unwrap_err();
        assert_eq!(err, RbacError::PermissionAlreadyGranted { role: 1, permission: 10 });
        assert!(!twin.is_granted(&p));
    }

    #[test]
    fn test_revoke_permission_on_registered_role() {
        let r = role(1);
        let p = perm(10);
        let rbac = Rbac::new(Principal::new("u-1"));
        rbac.permit(&r, &p).unwrap();

        rbac.revoke(&r, Some(p.as_ref())).unwrap();
        assert!(!rbac.is_granted(&r, &p));
        assert!(rbac.has_role(&r));
    }

    #[test]
    fn test_revoke_on_unregistered_role_is_noop() {
        let r = role(1);
        let p = perm(10);
        r.grant(&p);

        let rbac = Rbac::new(Principal::new("u-1"));
        rbac.revoke(&r, Some(p.as_ref())).unwrap();
        assert!(r.is_granted(&p));

        assert!(rbac.revoke(&r, None).unwrap_err().is_not_found());
    }

    #[test]
    fn test_is_granted_requires_registration() {
        let r = role(1);
        let p = perm(10);
        r.grant(&p);

        let rbac = Rbac::new(Principal::new("u-1"));
        assert!(!rbac.is_granted(&r, &p));
        assert!(!rbac.is_grant_inherited(&r, &p));

        rbac.add_role(&r).unwrap();
        assert!(rbac.is_granted(&r, &p));
    }

    #[test]
    fn test_any_and_all_granted() {
        let parent = role(1);
        let r1 = role(2);
        let r2 = role(3);
        r2.add_parent(&parent).unwrap();
        let p = perm(10);
        r1.grant(&p);
        parent.grant(&p);

        let rbac = Rbac::new(Principal::new("u-1"));
        rbac.add_role(&r1).unwrap();
        rbac.add_role(&r2).unwrap();

        let both = vec![Arc::clone(&r1), Arc::clone(&r2)];
        assert!(rbac.any_granted(&both, &p));
        assert!(!rbac.all_granted(&both, &p));
        assert!(rbac.any_grant_inherited(&both, &p));
        assert!(rbac.all_grant_inherited(&both, &p));

        assert!(!rbac.any_granted(&[], &p));
        assert!(rbac.all_granted(&[], &p));
    }

    #[test]
    fn test_clone_for_shares_role_nodes() {
        let r = role(1);
        let rbac = Rbac::new(Principal::new("u-1"));
        rbac.add_role(&r).unwrap();

        let copy = rbac.clone_for(Principal::new("u-2"));
        assert_eq!(copy.principal().id, "u-2");
        assert!(Arc::ptr_eq(&copy.get_role(&r).unwrap(), &r));

        copy.del_role(&r).unwrap();
        assert!(rbac.has_role(&r));
    }

    #[test]
    fn test_rbac_serialize_and_prettify() {
        let rbac = Rbac::new(Principal::new("u-1").with_name("Alice"));
        rbac.permit(&role(2), &perm(10)).unwrap();
        rbac.add_role(&role(1)).unwrap();

        let json = serde_json::to_value(&rbac).unwrap();
        assert_eq!(json["user"]["user_id"], "u-1");
        assert_eq!(json["user"]["user_name"], "Alice");
        assert_eq!(json["roles"], serde_json::json!([1, 2]));

        assert!(rbac.prettify().contains("Perms:(permID:10,permName:perm-10)"));
    }
}
