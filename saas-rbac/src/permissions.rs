//! # Permissions
//!
//! Core permission types for the RBAC engine.
//! A permission is a named matrix mapping protected objects to the set of
//! operations allowed on them.

use parking_lot::Mutex;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::actions::Action;

/// A protected resource.
///
/// Objects are identified by their numeric ID; name and description are
/// informational.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Object {
    /// Object ID, unique within a tenant.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl Object {
    /// Create a new object.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// An action that can be allowed on an [`Object`].
///
/// Two operations sharing an ID are the same operation as far as any
/// permission matrix is concerned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Operation {
    /// Operation ID.
    pub id: u32,
    /// The named action.
    pub action: Action,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
}

impl Operation {
    /// Create a new operation.
    pub fn new(id: u32, action: Action) -> Self {
        Self {
            id,
            action,
            description: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A named bundle of `Object.id -> {Operation.id}` entries.
///
/// A single coarse lock guards the matrix; every method takes it, so a
/// `Permission` can be shared across threads without further
/// synchronization.
///
/// # Example
///
/// ```
/// use saas_rbac::actions::Action;
/// use saas_rbac::permissions::{Object, Operation, Permission};
///
/// let movies = Object::new(1, "movies");
/// let read = Operation::new(10, Action::Read);
///
/// let perm = Permission::new(100, "watch-movies");
/// assert!(perm.add_permission(&movies, &read));
/// assert!(perm.has_permission(&movies, &read));
///
/// // Omitting the operation clears the object's whole entry.
/// assert!(perm.del_permission(&movies, None));
/// assert!(!perm.has_permission(&movies, &read));
/// ```
#[derive(Debug)]
pub struct Permission {
    /// Permission ID; deduplication key across roles.
    pub id: u32,
    /// Permission name.
    pub name: String,
    matrix: Mutex<HashMap<u32, HashSet<u32>>>,
}

impl Permission {
    /// Create an empty permission.
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            matrix: Mutex::new(HashMap::new()),
        }
    }

    /// Allow `operation` on `object`.
    ///
    /// Idempotent; creates the operation set for the object on first use.
    /// Always succeeds.
    pub fn add_permission(&self, object: &Object, operation: &Operation) -> bool {
        self.matrix
            .lock()
            .entry(object.id)
            .or_default()
            .insert(operation.id);
        true
    }

    /// Remove `operation` from `object`, or the whole object entry.
    ///
    /// With `None` every operation for the object is cleared and `true` is
    /// returned. With `Some(op)` this returns `false` (and changes nothing)
    /// when the object has no entry.
    pub fn del_permission(&self, object: &Object, operation: Option<&Operation>) -> bool {
        let mut matrix = self.matrix.lock();
        match operation {
            None => {
                matrix.remove(&object.id);
                true
            }
            Some(op) => match matrix.get_mut(&object.id) {
                Some(ops) => {
                    ops.remove(&op.id);
                    true
                }
                None => false,
            },
        }
    }

    /// Check if `operation` is allowed on `object`.
    pub fn has_permission(&self, object: &Object, operation: &Operation) -> bool {
        self.matrix
            .lock()
            .get(&object.id)
            .map(|ops| ops.contains(&operation.id))
            .unwrap_or(false)
    }

    /// IDs of every object with a matrix entry, sorted.
    pub fn objects(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.matrix.lock().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Operation IDs allowed on `object`, sorted.
    pub fn operations(&self, object: &Object) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .matrix
            .lock()
            .get(&object.id)
            .map(|ops| ops.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    fn matrix_snapshot(&self) -> BTreeMap<u32, BTreeSet<u32>> {
        self.matrix
            .lock()
            .iter()
            .map(|(object, ops)| (*object, ops.iter().copied().collect()))
            .collect()
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Permission", 3)?;
        state.serialize_field("perm_id", &self.id)?;
        state.serialize_field("perm_name", &self.name)?;
        state.serialize_field("perm_matrix", &self.matrix_snapshot())?;
        state.end()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(permID:{},permName:{})", self.id, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (Object, Object, Operation, Operation) {
        (
            Object::new(1, "movie"),
            Object::new(2, "variety"),
            Operation::new(10, Action::Read),
            Operation::new(11, Action::Download),
        )
    }

    #[test]
    fn test_add_and_has_permission() {
        let (movie, variety, read, download) = fixtures();
        let perm = Permission::new(1, "movie-read");

        assert!(!perm.has_permission(&movie, &read));
        assert!(perm.add_permission(&movie, &read));
        assert!(perm.has_permission(&movie, &read));
        assert!(!perm.has_permission(&movie, &download));
        assert!(!perm.has_permission(&variety, &read));
    }

    #[test]
    fn test_add_permission_is_idempotent() {
        let (movie, _, read, _) = fixtures();
        let perm = Permission::new(1, "movie-read");

        assert!(perm.add_permission(&movie, &read));
        assert!(perm.add_permission(&movie, &read));
        assert_eq!(perm.operations(&movie), vec![10]);
    }

    #[test]
    fn test_operations_keyed_by_id() {
        let (movie, _, read, _) = fixtures();
        let perm = Permission::new(1, "movie-read");
        perm.add_permission(&movie, &read);

        // Same ID, different descriptive fields: still the same operation.
        let alias = Operation::new(10, Action::Dump).with_description("alias");
        assert!(perm.has_permission(&movie, &alias));
    }

    #[test]
    fn test_del_single_operation() {
        let (movie, _, read, download) = fixtures();
        let perm = Permission::new(1, "movie");
        perm.add_permission(&movie, &read);
        perm.add_permission(&movie, &download);

        assert!(perm.del_permission(&movie, Some(&read)));
        assert!(!perm.has_permission(&movie, &read));
        assert!(perm.has_permission(&movie, &download));
    }

    #[test]
    fn test_del_without_operation_clears_object() {
        let (movie, variety, read, download) = fixtures();
        let perm = Permission::new(1, "movie");
        perm.add_permission(&movie, &read);
        perm.add_permission(&movie, &download);
        perm.add_permission(&variety, &read);

        assert!(perm.del_permission(&movie, None));
        assert!(!perm.has_permission(&movie, &read));
        assert!(!perm.has_permission(&movie, &download));
        assert!(perm.has_permission(&variety, &read));
        assert_eq!(perm.objects(), vec![2]);
    }

    #[test]
    fn test_del_on_missing_object_fails() {
        let (movie, variety, read, _) = fixtures();
        let perm = Permission::new(1, "movie");
        perm.add_permission(&movie, &read);

        assert!(!perm.del_permission(&variety, Some(&read)));
        assert!(perm.has_permission(&movie, &read));
    }

    #[test]
    fn test_permission_serializes_matrix_snapshot() {
        let (movie, _, read, download) = fixtures();
        let perm = Permission::new(7, "movie");
        perm.add_permission(&movie, &download);
        perm.add_permission(&movie, &read);

        let json = serde_json::to_value(&perm).unwrap();
        assert_eq!(json["perm_id"], 7);
        assert_eq!(json["perm_name"], "movie");
        assert_eq!(json["perm_matrix"]["1"], serde_json::json!([10, 11]));
        assert_eq!(perm.to_string(), "(permID:7,permName:movie)");
    }
}
