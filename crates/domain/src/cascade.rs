// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dependent-selector resolution for the taxonomy and geography chains.

use crate::error::DomainError;
use crate::taxonomy::Taxonomy;
use crate::types::{Level, NodeRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A partially filled selection along one or both chains.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialPath {
    selected: BTreeMap<Level, i64>,
}

impl PartialPath {
    /// Creates an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the selected identifier at a level.
    #[must_use]
    pub fn get(&self, level: Level) -> Option<i64> {
        self.selected.get(&level).copied()
    }

    /// Sets or clears the value at a level.
    pub fn set(&mut self, level: Level, id: Option<i64>) {
        match id {
            Some(id) => {
                self.selected.insert(level, id);
            }
            None => {
                self.selected.remove(&level);
            }
        }
    }

    /// Builder form of [`PartialPath::set`].
    #[must_use]
    pub fn with(mut self, level: Level, id: i64) -> Self {
        self.set(level, Some(id));
        self
    }

    /// Clears the value at a level.
    pub fn clear(&mut self, level: Level) {
        self.selected.remove(&level);
    }

    /// Returns whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

/// Outcome of a selector change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeResolution {
    /// The selection after invalid deeper values were cleared.
    pub selection: PartialPath,
    /// The level whose options are returned, if the changed level has one below it.
    pub next_level: Option<Level>,
    /// Children of the newly selected value at `next_level`.
    pub options: Vec<NodeRef>,
    /// Deeper levels whose previous value was cleared, root-first.
    pub invalidated: Vec<Level>,
}

/// Resolves the consequences of changing the value at `changed`.
///
/// Deeper values that no longer belong to their (possibly cleared) parent
/// are cleared and reported. Re-selecting the current value clears nothing.
///
/// # Arguments
///
/// * `taxonomy` - The current taxonomy and geography
/// * `selection` - The selection with the changed value already applied
/// * `changed` - The level the user just changed
///
/// # Errors
///
/// Returns `InconsistentPath` if the new value does not exist or does not
/// belong to the value selected one level up.
pub fn resolve_options(
    taxonomy: &Taxonomy,
    selection: &PartialPath,
    changed: Level,
) -> Result<CascadeResolution, DomainError> {
    let mut resolved: PartialPath = selection.clone();
    let current: Option<i64> = resolved.get(changed);

    if let Some(id) = current {
        let fits: bool = match changed.parent() {
            None => taxonomy.exists(changed, id),
            Some(parent_level) => resolved
                .get(parent_level)
                .is_some_and(|parent_id| taxonomy.belongs_to(changed, id, parent_id)),
        };
        if !fits {
            return Err(DomainError::InconsistentPath { level: changed });
        }
    }

    let mut invalidated: Vec<Level> = Vec::new();
    let mut parent_level: Level = changed;
    while let Some(level) = parent_level.child() {
        if let Some(id) = resolved.get(level) {
            let still_valid: bool = resolved
                .get(parent_level)
                .is_some_and(|parent_id| taxonomy.belongs_to(level, id, parent_id));
            if !still_valid {
                resolved.clear(level);
                invalidated.push(level);
            }
        }
        parent_level = level;
    }

    let next_level: Option<Level> = changed.child();
    let options: Vec<NodeRef> = match (next_level, current) {
        (Some(level), Some(id)) => to_refs(level, &taxonomy.children(level, Some(id))),
        _ => Vec::new(),
    };

    Ok(CascadeResolution {
        selection: resolved,
        next_level,
        options,
        invalidated,
    })
}

fn to_refs(level: Level, nodes: &[&crate::types::TaxonomyNode]) -> Vec<NodeRef> {
    nodes
        .iter()
        .map(|node| NodeRef {
            level,
            id: node.id,
            name: node.name.clone(),
        })
        .collect()
}
