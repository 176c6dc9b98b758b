// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use incident_registry_domain::{ItemCatalog, Taxonomy};
use std::collections::BTreeMap;

/// Snapshot of the reference data a command is validated against.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryContext {
    /// Taxonomy and geography trees.
    pub taxonomy: Taxonomy,
    /// Items and unit measures.
    pub catalog: ItemCatalog,
    /// Incident line entry counts keyed by `(item_id, unit_measure_id)`.
    pub unit_usage: BTreeMap<(i64, i64), usize>,
}

impl RegistryContext {
    /// Creates a context from its parts.
    #[must_use]
    pub const fn new(
        taxonomy: Taxonomy,
        catalog: ItemCatalog,
        unit_usage: BTreeMap<(i64, i64), usize>,
    ) -> Self {
        Self {
            taxonomy,
            catalog,
            unit_usage,
        }
    }

    /// Number of incident line entries recording `item_id`.
    #[must_use]
    pub fn line_items_for_item(&self, item_id: i64) -> usize {
        self.unit_usage
            .iter()
            .filter(|((item, _), _)| *item == item_id)
            .map(|(_, count)| count)
            .sum()
    }

    /// Number of incident line entries measured in `unit_measure_id`.
    #[must_use]
    pub fn line_items_for_unit(&self, unit_measure_id: i64) -> usize {
        self.unit_usage
            .iter()
            .filter(|((_, unit), _)| *unit == unit_measure_id)
            .map(|(_, count)| count)
            .sum()
    }
}
