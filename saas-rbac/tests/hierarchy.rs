//! Cross-module scenarios for the RBAC engine.
//!
//! Covers:
//! 1. Three-level role hierarchy and the one-level `permissions_deep` merge
//! 2. Permit/Revoke through a principal binding
//! 3. Principal matrix lifecycle
//! 4. Cycle rejection
//! 5. Concurrent grants, checks and structural edits

use saas_rbac::{
    Action, ErrorKind, Object, Operation, Permission, Principal, Rbac, RbacMatrix, Role, RoleGraph,
};
use std::collections::HashSet;
use std::sync::Arc;

/// Three roles chained low -> mid -> high, each with its own permission.
struct Hierarchy {
    high: Arc<Role>,
    mid: Arc<Role>,
    low: Arc<Role>,
    perm_tv: Arc<Permission>,
    perm_variety: Arc<Permission>,
    perm_movie: Arc<Permission>,
}

impl Hierarchy {
    fn new() -> Self {
        let tv = Object::new(1, "tv-series");
        let variety = Object::new(2, "variety");
        let movie = Object::new(3, "movie");
        let download = Operation::new(1, Action::Download);
        let read = Operation::new(2, Action::Read);

        let perm_tv = Arc::new(Permission::new(1, "tv"));
        perm_tv.add_permission(&tv, &download);
        let perm_variety = Arc::new(Permission::new(2, "variety"));
        perm_variety.add_permission(&variety, &read);
        let perm_movie = Arc::new(Permission::new(3, "movie"));
        perm_movie.add_permission(&movie, &read);

        let high = Arc::new(Role::new(1, "high"));
        let mid = Arc::new(Role::new(2, "mid"));
        let low = Arc::new(Role::new(3, "low"));
        high.grant(&perm_tv);
        mid.grant(&perm_variety);
        low.grant(&perm_movie);

        mid.add_parent(&high).unwrap();
        low.add_parent(&mid).unwrap();

        Self {
            high,
            mid,
            low,
            perm_tv,
            perm_variety,
            perm_movie,
        }
    }
}

fn ids<T>(items: &[Arc<T>], id: impl Fn(&T) -> u32) -> HashSet<u32> {
    items.iter().map(|item| id(item.as_ref())).collect()
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn test_three_level_inheritance() {
    let h = Hierarchy::new();

    assert!(h.low.is_granted(&h.perm_movie));
    assert!(!h.low.is_granted(&h.perm_variety));
    assert!(h.low.is_grant_inherited(&h.perm_variety));
    assert!(h.low.is_grant_inherited(&h.perm_tv));
    assert!(!h.high.is_grant_inherited(&h.perm_movie));

    let deep: HashSet<u32> = h.low.parent_ids_deep().into_iter().collect();
    assert_eq!(deep, HashSet::from([h.mid.id, h.high.id]));
}

#[test]
fn test_permissions_deep_merges_one_level() {
    let h = Hierarchy::new();

    let deep = ids(&h.low.permissions_deep(), |p| p.id);
    assert_eq!(deep, HashSet::from([h.perm_movie.id, h.perm_variety.id]));
    assert!(!deep.contains(&h.perm_tv.id));
}

#[test]
fn test_grant_on_ancestor_is_visible_below() {
    let h = Hierarchy::new();
    let extra = Arc::new(Permission::new(9, "extra"));

    assert!(!h.low.is_grant_inherited(&extra));
    h.high.grant(&extra);
    assert!(h.low.is_grant_inherited(&extra));

    h.high.revoke(&extra);
    assert!(!h.low.is_grant_inherited(&extra));
}

#[test]
fn test_principal_sees_inherited_state() {
    let h = Hierarchy::new();
    let rbac = Rbac::new(Principal::new("merchant-1"));
    rbac.add_role(&h.low).unwrap();

    assert!(rbac.has_role(&h.low));
    assert!(!rbac.has_role(&h.high));
    assert!(rbac.has_role_inherited(&h.high));

    let roles = ids(&rbac.roles_inherited(), |r| r.id);
    assert_eq!(roles, HashSet::from([1, 2, 3]));
    assert_eq!(rbac.roles_inherited().len(), 3);

    assert!(!rbac.has_perm(&h.perm_tv));
    assert!(rbac.has_perm_inherited(&h.perm_tv));
    assert!(rbac.is_grant_inherited(&h.low, &h.perm_tv));
    assert!(!rbac.is_granted(&h.low, &h.perm_tv));
}

// ============================================================================
// Permit / Revoke
// ============================================================================

#[test]
fn test_permit_then_revoke_role() {
    let rbac = Rbac::new(Principal::new("merchant-1"));
    let role = Arc::new(Role::new(7, "operator"));
    let perm = Arc::new(Permission::new(70, "dump"));

    rbac.permit(&role, &perm).unwrap();
    assert!(rbac.is_granted(&role, &perm));

    let err = rbac.permit(&role, &perm).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyExists);

    rbac.revoke(&role, None).unwrap();
    assert!(!rbac.has_role(&role));
    assert!(!rbac.is_granted(&role, &perm));
}

#[test]
fn test_permit_on_shared_role_reaches_other_principals() {
    let role = Arc::new(Role::new(1, "shared"));
    let alice = Rbac::new(Principal::new("alice"));
    let bob = Rbac::new(Principal::new("bob"));
    alice.add_role(&role).unwrap();
    bob.add_role(&role).unwrap();

    let perm = Arc::new(Permission::new(5, "export"));
    alice.permit(&role, &perm).unwrap();
    assert!(bob.is_granted(&role, &perm));

    alice.revoke(&role, Some(perm.as_ref())).unwrap();
    assert!(!bob.is_granted(&role, &perm));
}

// ============================================================================
// Matrix
// ============================================================================

#[test]
fn test_matrix_lifecycle() {
    let matrix = RbacMatrix::new();
    let merchant = Principal::new("merchant-1").with_name("Shop");

    assert!(matrix.add_user(&merchant));
    assert!(!matrix.add_user(&merchant));
    assert!(matrix.del_user(&merchant));
    assert!(!matrix.has_user(&merchant));
}

// ============================================================================
// Cycles
// ============================================================================

#[test]
fn test_cycle_rejected_at_every_depth() {
    let h = Hierarchy::new();

    for (child, parent) in [(&h.high, &h.mid), (&h.high, &h.low), (&h.mid, &h.low)] {
        let err = child.add_parent(parent).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CycleDetected);
    }
    assert_eq!(h.low.add_parent(&h.low).unwrap_err().kind(), ErrorKind::CycleDetected);
    assert!(h.high.parents().is_empty());
}

#[test]
fn test_added_parent_becomes_ancestor() {
    let a = Arc::new(Role::new(1, "a"));
    let b = Arc::new(Role::new(2, "b"));

    a.add_parent(&b).unwrap();
    assert!(a.has_ancestor(&b));
    assert_eq!(b.add_parent(&a).unwrap_err().kind(), ErrorKind::CycleDetected);
    assert_eq!(a.add_parent(&b).unwrap_err().kind(), ErrorKind::AlreadyExists);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_grants_and_checks() {
    let h = Hierarchy::new();
    let perms: Vec<Arc<Permission>> = (100..164)
        .map(|id| Arc::new(Permission::new(id, format!("p-{}", id))))
        .collect();

    std::thread::scope(|s| {
        for chunk in perms.chunks(16) {
            let high = &h.high;
            s.spawn(move || {
                for perm in chunk {
                    high.grant(perm);
                }
            });
        }
        for _ in 0..4 {
            let low = &h.low;
            let tv = &h.perm_tv;
            s.spawn(move || {
                for _ in 0..200 {
                    assert!(low.is_grant_inherited(tv));
                }
            });
        }
    });

    assert_eq!(h.high.permissions().len(), 65);
    assert!(perms.iter().all(|perm| h.low.is_grant_inherited(perm)));
}

#[test]
fn test_concurrent_user_enrolment_is_atomic() {
    let matrix = RbacMatrix::new();
    let merchant = Principal::new("merchant-1");

    let wins: usize = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|_| s.spawn(|| matrix.add_user(&merchant)))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap() as usize)
            .sum()
    });

    assert_eq!(wins, 1);
    assert_eq!(matrix.len(), 1);
}

#[test]
fn test_concurrent_identical_permits_succeed_once() {
    let rbac = Rbac::new(Principal::new("merchant-1"));
    let role = Arc::new(Role::new(1, "operator"));
    rbac.add_role(&role).unwrap();

    for id in 0..50 {
        let perm = Arc::new(Permission::new(id, format!("p-{}", id)));
        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| rbac.permit(&role, &perm)))
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|result| result.as_ref().err())
            .all(|err| err.kind() == ErrorKind::AlreadyExists));
    }
    assert_eq!(role.permissions().len(), 50);
}

#[test]
fn test_concurrent_opposite_links_never_form_cycle() {
    for _ in 0..50 {
        let graph = RoleGraph::new();
        graph.register_role(Role::new(1, "a")).unwrap();
        graph.register_role(Role::new(2, "b")).unwrap();

        let (ab, ba) = std::thread::scope(|s| {
            let ab = s.spawn(|| graph.add_parent(1, 2));
            let ba = s.spawn(|| graph.add_parent(2, 1));
            (ab.join().unwrap(), ba.join().unwrap())
        });

        assert!(ab.is_ok() != ba.is_ok());
        let a = graph.role(1).unwrap();
        let b = graph.role(2).unwrap();
        assert!(!(a.has_ancestor(&b) && b.has_ancestor(&a)));
    }
}
