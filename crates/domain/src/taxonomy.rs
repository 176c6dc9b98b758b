// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! In-memory view of the taxonomy and geography trees.
//!
//! The store is pure data plus lookups. Writes are executed by the
//! persistence layer; the rules here decide whether a write is allowed.

use crate::error::DomainError;
use crate::types::{EntityKind, Level, NodeRef, TaxonomyNode, name_key};
use std::collections::BTreeMap;

/// Both hierarchies, keyed by level and then by node identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Taxonomy {
    levels: BTreeMap<Level, BTreeMap<i64, TaxonomyNode>>,
}

impl Taxonomy {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node at the given level.
    ///
    /// Nodes must be inserted parents-first.
    ///
    /// # Errors
    ///
    /// Returns `InconsistentPath` if a root node carries a parent, or a
    /// non-root node's parent is missing or unknown.
    pub fn insert(&mut self, level: Level, node: TaxonomyNode) -> Result<(), DomainError> {
        match (level.parent(), node.parent_id) {
            (None, None) => {}
            (Some(parent_level), Some(parent_id)) if self.exists(parent_level, parent_id) => {}
            _ => return Err(DomainError::InconsistentPath { level }),
        }
        self.levels.entry(level).or_default().insert(node.id, node);
        Ok(())
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, level: Level, id: i64) -> Option<&TaxonomyNode> {
        self.levels.get(&level).and_then(|nodes| nodes.get(&id))
    }

    /// Looks up a node, failing with `NotFound`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no node with `id` exists at `level`.
    pub fn require(&self, level: Level, id: i64) -> Result<&TaxonomyNode, DomainError> {
        self.node(level, id).ok_or(DomainError::NotFound {
            entity: EntityKind::Node(level),
            id,
        })
    }

    /// Returns whether a node exists.
    #[must_use]
    pub fn exists(&self, level: Level, id: i64) -> bool {
        self.node(level, id).is_some()
    }

    /// Returns whether the store holds no nodes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.levels.values().all(BTreeMap::is_empty)
    }

    /// Returns the nodes at `level` whose parent is `parent_id`.
    ///
    /// Root levels are queried with `None`. Results are ordered by name
    /// (case-insensitive), ties broken by identifier.
    #[must_use]
    pub fn children(&self, level: Level, parent_id: Option<i64>) -> Vec<&TaxonomyNode> {
        let mut nodes: Vec<&TaxonomyNode> = self
            .levels
            .get(&level)
            .map(|nodes| {
                nodes
                    .values()
                    .filter(|node| node.parent_id == parent_id)
                    .collect()
            })
            .unwrap_or_default();
        nodes.sort_by(|a, b| {
            name_key(&a.name)
                .cmp(&name_key(&b.name))
                .then(a.id.cmp(&b.id))
        });
        nodes
    }

    /// Returns whether the node at `level` is a child of `parent_id`.
    ///
    /// Always false for root levels and unknown nodes.
    #[must_use]
    pub fn belongs_to(&self, level: Level, id: i64, parent_id: i64) -> bool {
        self.node(level, id)
            .is_some_and(|node| node.parent_id == Some(parent_id))
    }

    /// Returns the ancestor chain of a node, root-first, ending with the node.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the node or any ancestor is missing.
    pub fn path(&self, level: Level, id: i64) -> Result<Vec<NodeRef>, DomainError> {
        let mut chain: Vec<NodeRef> = Vec::new();
        let mut cursor: Option<(Level, i64)> = Some((level, id));
        while let Some((current_level, current_id)) = cursor {
            let node: &TaxonomyNode = self.require(current_level, current_id)?;
            chain.push(NodeRef {
                level: current_level,
                id: node.id,
                name: node.name.clone(),
            });
            cursor = current_level.parent().zip(node.parent_id);
        }
        chain.reverse();
        Ok(chain)
    }

    /// Checks that `name` is free among the siblings under `parent_id`.
    ///
    /// `exclude` skips the node being renamed.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank name and `DuplicateName` when a
    /// sibling already uses it.
    pub fn ensure_name_available(
        &self,
        level: Level,
        parent_id: Option<i64>,
        name: &str,
        exclude: Option<i64>,
    ) -> Result<(), DomainError> {
        let key: String = name_key(name);
        if key.is_empty() {
            return Err(DomainError::MissingField { field: "name" });
        }
        let taken: bool = self
            .children(level, parent_id)
            .iter()
            .any(|node| Some(node.id) != exclude && name_key(&node.name) == key);
        if taken {
            return Err(DomainError::DuplicateName {
                entity: EntityKind::Node(level),
                name: name.trim().to_string(),
            });
        }
        Ok(())
    }

    /// Checks that a node has no children.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown node and `ReferentialIntegrity`
    /// while child nodes exist.
    pub fn ensure_deletable(&self, level: Level, id: i64) -> Result<(), DomainError> {
        self.require(level, id)?;
        if let Some(child_level) = level.child() {
            let count: usize = self.children(child_level, Some(id)).len();
            if count > 0 {
                return Err(DomainError::ReferentialIntegrity {
                    entity: EntityKind::Node(level),
                    id,
                    referenced_by: EntityKind::Node(child_level),
                    count,
                });
            }
        }
        Ok(())
    }
}
