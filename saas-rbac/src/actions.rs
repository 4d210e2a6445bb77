//! # Actions
//!
//! Defines the actions an [`Operation`](crate::permissions::Operation) can name.
//! The action is descriptive: permission checks are keyed by operation ID.

use serde::{Deserialize, Serialize};

/// Actions that can be performed on protected objects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// No action.
    #[default]
    None,

    /// Create new object instances.
    Create,

    /// Read/view object data.
    Read,

    /// Modify existing object data.
    Update,

    /// Remove object instances.
    Delete,

    /// Create, read, update and delete combined.
    Crud,

    /// Download object contents.
    Download,

    /// Upload object contents.
    Upload,

    /// Export (dump) object data in bulk.
    Dump,
}

impl Action {
    /// Get the string representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::None => "none",
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Crud => "crud",
            Action::Download => "download",
            Action::Upload => "upload",
            Action::Dump => "dump",
        }
    }

    /// Parse action from string representation.
    ///
    /// Case-insensitive, supports a few common aliases. The empty string
    /// parses as [`Action::None`].
    ///
    /// # Example
    ///
    /// ```
    /// use saas_rbac::actions::Action;
    ///
    /// assert_eq!(Action::parse("read"), Some(Action::Read));
    /// assert_eq!(Action::parse("VIEW"), Some(Action::Read));
    /// assert_eq!(Action::parse("export"), Some(Action::Dump));
    /// assert_eq!(Action::parse(""), Some(Action::None));
    /// assert_eq!(Action::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "" | "none" => Some(Action::None),
            "create" | "add" | "new" => Some(Action::Create),
            "read" | "view" | "get" => Some(Action::Read),
            "update" | "edit" | "write" | "modify" => Some(Action::Update),
            "delete" | "remove" | "destroy" => Some(Action::Delete),
            "crud" => Some(Action::Crud),
            "download" => Some(Action::Download),
            "upload" => Some(Action::Upload),
            "dump" | "export" => Some(Action::Dump),
            _ => None,
        }
    }

    /// Get all actions.
    pub fn all() -> Vec<Self> {
        vec![
            Action::None,
            Action::Create,
            Action::Read,
            Action::Update,
            Action::Delete,
            Action::Crud,
            Action::Download,
            Action::Upload,
            Action::Dump,
        ]
    }

    /// Check if this action implies another action.
    ///
    /// Every action implies itself; `Crud` additionally implies
    /// `Create`, `Read`, `Update` and `Delete`.
    ///
    /// # Example
    ///
    /// ```
    /// use saas_rbac::actions::Action;
    ///
    /// assert!(Action::Crud.implies(Action::Delete));
    /// assert!(!Action::Read.implies(Action::Update));
    /// ```
    pub fn implies(&self, other: Action) -> bool {
        if *self == other {
            return true;
        }
        match self {
            Action::Crud => matches!(
                other,
                Action::Create | Action::Read | Action::Update | Action::Delete
            ),
            _ => false,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
