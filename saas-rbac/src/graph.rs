//! # Role graph
//!
//! A per-tenant arena of shared [`Role`] and [`Permission`] nodes indexed by
//! ID, plus the single lock that serializes structural edits.
//!
//! Parent edges installed through [`RoleGraph::add_parent`] are checked and
//! inserted while holding the structural lock, so two concurrent edits can
//! never each pass their ancestor check and jointly close a cycle. Grants and
//! read-only queries do not take the lock.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::error::{RbacError, RbacResult};
use crate::permissions::Permission;
use crate::role::Role;

/// Arena of roles and permissions for one tenant.
///
/// # Example
///
/// ```
/// use saas_rbac::{Permission, Role, RoleGraph};
///
/// let graph = RoleGraph::new();
/// let admin = graph.register_role(Role::new(1, "admin")).unwrap();
/// let editor = graph.register_role(Role::new(2, "editor")).unwrap();
/// let publish = graph.register_permission(Permission::new(10, "publish")).unwrap();
///
/// admin.grant(&publish);
/// graph.add_parent(editor.id, admin.id).unwrap();
/// assert!(editor.is_grant_inherited(&publish));
///
/// assert!(graph.add_parent(admin.id, editor.id).is_err());
/// ```
#[derive(Debug, Default)]
pub struct RoleGraph {
    roles: DashMap<u32, Arc<Role>>,
    permissions: DashMap<u32, Arc<Permission>>,
    structure: Mutex<()>,
}

impl RoleGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role to the arena and return its shared handle.
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleExists`] if the ID is taken.
    pub fn register_role(&self, role: Role) -> RbacResult<Arc<Role>> {
        match self.roles.entry(role.id) {
            Entry::Occupied(_) => Err(RbacError::RoleExists(role.id)),
            Entry::Vacant(slot) => {
                let role = Arc::new(role);
                slot.insert(Arc::clone(&role));
                debug!(role_id = role.id, name = %role.name, "role registered");
                Ok(role)
            }
        }
    }

    /// Add a permission to the arena and return its shared handle.
    ///
    /// # Errors
    ///
    /// [`RbacError::PermissionExists`] if the ID is taken.
    pub fn register_permission(&self, permission: Permission) -> RbacResult<Arc<Permission>> {
        match self.permissions.entry(permission.id) {
            Entry::Occupied(_) => Err(RbacError::PermissionExists(permission.id)),
            Entry::Vacant(slot) => {
                let permission = Arc::new(permission);
                slot.insert(Arc::clone(&permission));
                debug!(permission_id = permission.id, name = %permission.name, "permission registered");
                Ok(permission)
            }
        }
    }

    /// Look up a role by ID.
    pub fn role(&self, role_id: u32) -> Option<Arc<Role>> {
        self.roles.get(&role_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a permission by ID.
    pub fn permission(&self, permission_id: u32) -> Option<Arc<Permission>> {
        self.permissions
            .get(&permission_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Every registered role, sorted by ID.
    pub fn roles(&self) -> Vec<Arc<Role>> {
        let mut roles: Vec<Arc<Role>> =
            self.roles.iter().map(|entry| Arc::clone(entry.value())).collect();
        roles.sort_by_key(|role| role.id);
        roles
    }

    /// Every registered permission, sorted by ID.
    pub fn permissions(&self) -> Vec<Arc<Permission>> {
        let mut permissions: Vec<Arc<Permission>> = self
            .permissions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        permissions.sort_by_key(|perm| perm.id);
        permissions
    }

    /// Install `child_id -> parent_id` under the structural lock.
    ///
    /// # Errors
    ///
    /// - [`RbacError::RoleNotFound`] if either ID is not registered
    /// - any error of [`Role::add_parent`]
    pub fn add_parent(&self, child_id: u32, parent_id: u32) -> RbacResult<()> {
        let _structure = self.structure.lock();
        let child = self.require_role(child_id)?;
        let parent = self.require_role(parent_id)?;
        child.add_parent(&parent)
    }

    /// Remove `child_id -> parent_id` under the structural lock.
    ///
    /// # Errors
    ///
    /// - [`RbacError::RoleNotFound`] if either ID is not registered
    /// - [`RbacError::ParentNotFound`] if the edge does not exist
    pub fn del_parent(&self, child_id: u32, parent_id: u32) -> RbacResult<()> {
        let _structure = self.structure.lock();
        let child = self.require_role(child_id)?;
        let parent = self.require_role(parent_id)?;
        child.del_parent(&parent)
    }

    /// Drop a role from the arena.
    ///
    /// Every registered child loses its edge to the role first. Principals
    /// that still hold the node keep it alive and unchanged.
    ///
    /// # Errors
    ///
    /// [`RbacError::RoleNotFound`] if the ID is not registered.
    pub fn remove_role(&self, role_id: u32) -> RbacResult<Arc<Role>> {
        let _structure = self.structure.lock();
        let role = self.require_role(role_id)?;

        for child in self.roles() {
            if child.parent_ids().contains(&role_id) {
                child.del_parent(&role)?;
            }
        }
        self.roles.remove(&role_id);
        debug!(role_id, "role removed from graph");
        Ok(role)
    }

    /// Drop a permission from the arena.
    ///
    /// Roles that were granted the permission keep their grant; revoke it from
    /// them explicitly if needed.
    ///
    /// # Errors
    ///
    /// [`RbacError::PermissionNotFound`] if the ID is not registered.
    pub fn remove_permission(&self, permission_id: u32) -> RbacResult<Arc<Permission>> {
        self.permissions
            .remove(&permission_id)
            .map(|(_, permission)| permission)
            .ok_or(RbacError::PermissionNotFound(permission_id))
    }

    fn require_role(&self, role_id: u32) -> RbacResult<Arc<Role>> {
        self.role(role_id).ok_or(RbacError::RoleNotFound(role_id))
    }
}
