//! Navigable paths: dotted addresses of domain concepts within a query.

use std::fmt;
use std::sync::Arc;

/// The dotted path of a path-addressable domain concept (attribute,
/// identifier, association) from a query root.
///
/// Paths are immutable; `append` produces a child sharing its parent via
/// `Arc`, so large fetch graphs do not duplicate prefix strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NavigablePath {
    parent: Option<Arc<NavigablePath>>,
    local_name: String,
    full_path: String,
}

impl NavigablePath {
    /// Create a root path for a query root (usually the entity name).
    pub fn root(name: impl Into<String>) -> Self {
        let local_name = name.into();
        Self {
            parent: None,
            full_path: local_name.clone(),
            local_name,
        }
    }

    /// Create a child path for a navigable under this one.
    pub fn append(&self, name: impl Into<String>) -> Self {
        let local_name = name.into();
        let full_path = format!("{}.{}", self.full_path, local_name);
        Self {
            parent: Some(Arc::new(self.clone())),
            local_name,
            full_path,
        }
    }

    /// The final path segment.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The full dotted path from the root.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    /// The owning path, if this is not a root.
    pub fn parent(&self) -> Option<&NavigablePath> {
        self.parent.as_deref()
    }

    /// Whether this path is a query root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl fmt::Display for NavigablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path)
    }
}
