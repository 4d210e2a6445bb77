//! # Roles
//!
//! A role is a named node owning a set of granted permissions and a set of
//! parent roles. Roles are shared as `Arc<Role>`: every principal and every
//! child role holding the same node sees its grants change together.
//!
//! ```text
//! roleHigh  (grants: dianshijv)
//!    ▲
//! roleMid   (grants: zongyi)
//!    ▲
//! roleLow   (grants: movie)
//! ```
//!
//! Inherited checks walk the parent edges upward. The walk is iterative with
//! an explicit visited set, so graph depth never grows the call stack.
//!
//! ## Structural edits
//!
//! Parent and grant sets are individually safe for concurrent use, but the
//! acyclic invariant is only checked at the instant [`Role::add_parent`]
//! runs. Two concurrent `add_parent` calls on different roles of the same
//! graph can each pass their check and jointly close a loop. Serialize
//! structural edits through [`RoleGraph`](crate::graph::RoleGraph) or an
//! equivalent single-writer discipline.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{RbacError, RbacResult};
use crate::permissions::Permission;

/// A hierarchical authorization node.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use saas_rbac::{Permission, Role};
///
/// let admin = Arc::new(Role::new(1, "admin"));
/// let editor = Arc::new(Role::new(2, "editor"));
/// let publish = Arc::new(Permission::new(10, "publish"));
///
/// admin.grant(&publish);
/// editor.add_parent(&admin).unwrap();
///
/// assert!(!editor.is_granted(&publish));
/// assert!(editor.is_grant_inherited(&publish));
/// assert!(admin.add_parent(&editor).is_err()); // would close a cycle
/// ```
pub struct Role {
    /// Role ID; the node's identity.
    pub id: u32,
    /// Role name.
    pub name: String,
    /// Free-text description.
    pub description: String,
    permissions: DashMap<u32, Arc<Permission>>,
    parents: DashMap<u32, Arc<Role>>,
}

impl Role {
    /// Create a role with no grants and no parents.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            permissions: DashMap::new(),
            parents: DashMap::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Grant a permission directly.
    ///
    /// Returns `false` without side effects if it was already granted.
    pub fn grant(&self, permission: &Arc<Permission>) -> bool {
        match self.permissions.entry(permission.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(permission));
                debug!(role_id = self.id, permission_id = permission.id, "permission granted");
                true
            }
        }
    }

    /// Revoke a direct grant. No-op if not granted.
    pub fn revoke(&self, permission: &Permission) {
        if self.permissions.remove(&permission.id).is_some() {
            debug!(role_id = self.id, permission_id = permission.id, "permission revoked");
        }
    }

    /// Check for a direct grant only.
    pub fn is_granted(&self, permission: &Permission) -> bool {
        self.permissions.contains_key(&permission.id)
    }

    /// Check for a direct grant or a grant on any ancestor, at any depth.
    pub fn is_grant_inherited(&self, permission: &Permission) -> bool {
        self.is_granted(permission) || self.any_ancestor(|role| role.is_granted(permission))
    }

    /// Check if `candidate` is a parent or an ancestor of a parent.
    pub fn has_ancestor(&self, candidate: &Role) -> bool {
        self.any_ancestor(|role| role.id == candidate.id)
    }

    /// Install a parent edge.
    ///
    /// # Errors
    ///
    /// - [`RbacError::ParentAlreadyDefined`] if `parent` is already a direct parent
    /// - [`RbacError::CycleDetected`] if `parent` is this role or already has
    ///   this role as an ancestor
    pub fn add_parent(&self, parent: &Arc<Role>) -> RbacResult<()> {
        if self.parents.contains_key(&parent.id) {
            return Err(RbacError::ParentAlreadyDefined {
                role: self.id,
                parent: parent.id,
            });
        }
        if parent.id == self.id || parent.has_ancestor(self) {
            warn!(role_id = self.id, parent_id = parent.id, "parent edge rejected: cycle");
            return Err(RbacError::CycleDetected {
                role: self.id,
                parent: parent.id,
            });
        }

        match self.parents.entry(parent.id) {
            Entry::Occupied(_) => Err(RbacError::ParentAlreadyDefined {
                role: self.id,
                parent: parent.id,
            }),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(parent));
                debug!(role_id = self.id, parent_id = parent.id, "parent edge added");
                Ok(())
            }
        }
    }

    /// Remove a parent edge.
    ///
    /// # Errors
    ///
    /// [`RbacError::ParentNotFound`] if the edge does not exist.
    pub fn del_parent(&self, parent: &Role) -> RbacResult<()> {
        match self.parents.remove(&parent.id) {
            Some(_) => {
                debug!(role_id = self.id, parent_id = parent.id, "parent edge removed");
                Ok(())
            }
            None => Err(RbacError::ParentNotFound {
                role: self.id,
                parent: parent.id,
            }),
        }
    }

    /// Direct parents, unordered.
    pub fn parents(&self) -> Vec<Arc<Role>> {
        self.parents.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    /// IDs of the direct parents.
    pub fn parent_ids(&self) -> Vec<u32> {
        self.parents.iter().map(|entry| *entry.key()).collect()
    }

    /// Every ancestor, deduplicated by ID.
    pub fn parents_deep(&self) -> Vec<Arc<Role>> {
        let mut ancestors = Vec::new();
        self.any_ancestor(|role| {
            ancestors.push(Arc::clone(role));
            false
        });
        ancestors
    }

    /// IDs of every ancestor, deduplicated.
    pub fn parent_ids_deep(&self) -> Vec<u32> {
        self.parents_deep().iter().map(|role| role.id).collect()
    }

    /// Direct grants only.
    pub fn permissions(&self) -> Vec<Arc<Permission>> {
        self.permissions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Direct grants plus the grants of the **direct** parents.
    ///
    /// Grandparents' grants are not included, unlike [`Role::parents_deep`]
    /// which walks the whole ancestor chain. Use
    /// [`Role::is_grant_inherited`] for an unbounded check.
    pub fn permissions_deep(&self) -> Vec<Arc<Permission>> {
        let mut all = self.permissions();
        for parent in self.parents() {
            all.extend(parent.permissions());
        }
        unique_by_id(all, |perm| perm.id)
    }

    /// Multi-line dump of direct and inherited state.
    pub fn prettify(&self) -> String {
        let join_perms = |perms: Vec<Arc<Permission>>| {
            perms.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(",")
        };
        let join_roles = |roles: Vec<Arc<Role>>| {
            roles.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(",")
        };

        format!(
            "\nRole:\n\t{}\n\tPerms:{}\n\tPermsDeep:{}\n\tParents:{}\n\tParentsDeep:{}\n",
            self,
            join_perms(self.permissions()),
            join_perms(self.permissions_deep()),
            join_roles(self.parents()),
            join_roles(self.parents_deep()),
        )
    }

    /// Depth-first walk over every ancestor, each visited once.
    ///
    /// Stops and returns `true` as soon as `visit` does. Parent sets are
    /// snapshotted before descending so no storage guard is held across a
    /// visit.
    fn any_ancestor(&self, mut visit: impl FnMut(&Arc<Role>) -> bool) -> bool {
        let mut seen = HashSet::new();
        let mut stack = self.parents();

        while let Some(role) = stack.pop() {
            if !seen.insert(role.id) {
                continue;
            }
            if visit(&role) {
                return true;
            }
            stack.extend(role.parents());
        }
        false
    }
}

/// Keep the first item for each ID, preserving order.
pub(crate) fn unique_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> u32) -> Vec<T> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(id(item))).collect()
}

fn sorted(mut ids: Vec<u32>) -> Vec<u32> {
    ids.sort_unstable();
    ids
}

impl std::fmt::Debug for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Role")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("permissions", &sorted(self.permissions().iter().map(|p| p.id).collect()))
            .field("parents", &sorted(self.parent_ids()))
            .finish()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(roleID:{},roleName:{})", self.id, self.name)
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Role", 5)?;
        state.serialize_field("id", &self.id)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("desc", &self.description)?;
        state.serialize_field(
            "permissions",
            &sorted(self.permissions().iter().map(|p| p.id).collect()),
        )?;
        state.serialize_field("parent_nodes", &sorted(self.parent_ids()))?;
        state.end()
    }
}
