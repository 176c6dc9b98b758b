// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Items, unit measures and the rules for curating them.

use crate::cascade::PartialPath;
use crate::error::DomainError;
use crate::taxonomy::Taxonomy;
use crate::types::{EntityKind, Level, TaxonomyPath, UnitMeasure, name_key, normalize_name};
use crate::validation::validate_taxonomy_path;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A catalog item tagged to a taxonomy path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// The identifier assigned by the database.
    /// `None` indicates the item has not been persisted yet.
    pub item_id: Option<i64>,
    /// The product name, unique per taxonomy path.
    pub product_name: String,
    /// Where the item sits in the taxonomy.
    pub path: TaxonomyPath,
    /// Unit measures in which quantities of this item may be recorded.
    pub unit_measure_ids: BTreeSet<i64>,
}

/// Unvalidated item input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    /// The product name.
    pub product_name: Option<String>,
    /// The variable.
    pub variable_id: Option<i64>,
    /// The category.
    pub category_id: Option<i64>,
    /// The subcategory.
    pub subcategory_id: Option<i64>,
    /// The second subcategory.
    pub second_subcategory_id: Option<i64>,
    /// The permitted unit measures.
    pub unit_measure_ids: Vec<i64>,
}

/// Notice that an item update removed a unit still used by incidents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMeasureWarning {
    /// The updated item.
    pub item_id: i64,
    /// The unit measure no longer permitted.
    pub unit_measure_id: i64,
    /// How many incident line entries still record this item in that unit.
    pub line_item_count: usize,
}

impl std::fmt::Display for UnitMeasureWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unit measure {} was removed from item {} but is still used by {} incident line item(s)",
            self.unit_measure_id, self.item_id, self.line_item_count
        )
    }
}

/// The item and unit-measure registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemCatalog {
    items: BTreeMap<i64, Item>,
    unit_measures: BTreeMap<i64, UnitMeasure>,
}

impl ItemCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a unit measure.
    pub fn insert_unit_measure(&mut self, unit: UnitMeasure) {
        self.unit_measures.insert(unit.id, unit);
    }

    /// Registers a persisted item under `item_id`.
    pub fn insert_item(&mut self, item_id: i64, mut item: Item) {
        item.item_id = Some(item_id);
        self.items.insert(item_id, item);
    }

    /// Looks up an item.
    #[must_use]
    pub fn item(&self, item_id: i64) -> Option<&Item> {
        self.items.get(&item_id)
    }

    /// Looks up a unit measure.
    #[must_use]
    pub fn unit_measure(&self, unit_id: i64) -> Option<&UnitMeasure> {
        self.unit_measures.get(&unit_id)
    }

    /// Unit measures ordered by name, ties by identifier.
    #[must_use]
    pub fn unit_measures(&self) -> Vec<&UnitMeasure> {
        let mut units: Vec<&UnitMeasure> = self.unit_measures.values().collect();
        units.sort_by(|a, b| name_key(&a.name).cmp(&name_key(&b.name)).then(a.id.cmp(&b.id)));
        units
    }

    /// Returns whether `unit_id` is in the permitted set of `item_id`.
    #[must_use]
    pub fn permits(&self, item_id: i64, unit_id: i64) -> bool {
        self.items
            .get(&item_id)
            .is_some_and(|item| item.unit_measure_ids.contains(&unit_id))
    }

    /// Number of items permitting a unit measure.
    #[must_use]
    pub fn items_using_unit(&self, unit_id: i64) -> usize {
        self.items
            .values()
            .filter(|item| item.unit_measure_ids.contains(&unit_id))
            .count()
    }

    /// Number of items whose path passes through a taxonomy node.
    #[must_use]
    pub fn items_on_node(&self, level: Level, id: i64) -> usize {
        self.items
            .values()
            .filter(|item| item.path.contains(level, id))
            .count()
    }

    /// Items whose path matches every taxonomy level set in `filter`.
    ///
    /// Ordered by product name, ties by identifier.
    #[must_use]
    pub fn items_matching(&self, filter: &PartialPath) -> Vec<&Item> {
        let mut items: Vec<&Item> = self
            .items
            .values()
            .filter(|item| {
                filter.get(Level::Variable).is_none_or(|id| item.path.variable_id == id)
                    && filter.get(Level::Category).is_none_or(|id| item.path.category_id == id)
                    && filter
                        .get(Level::Subcategory)
                        .is_none_or(|id| item.path.subcategory_id == Some(id))
                    && filter
                        .get(Level::SecondSubcategory)
                        .is_none_or(|id| item.path.second_subcategory_id == Some(id))
            })
            .collect();
        items.sort_by(|a, b| {
            name_key(&a.product_name)
                .cmp(&name_key(&b.product_name))
                .then(a.item_id.cmp(&b.item_id))
        });
        items
    }

    /// Finds another item with the same product name on the same path.
    #[must_use]
    pub fn find_duplicate(
        &self,
        product_name: &str,
        path: &TaxonomyPath,
        exclude: Option<i64>,
    ) -> Option<&Item> {
        let key: String = name_key(product_name);
        self.items.values().find(|item| {
            item.item_id != exclude && item.path == *path && name_key(&item.product_name) == key
        })
    }

    /// Checks that a unit measure name is free.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` for a blank name and `DuplicateName` when
    /// another unit measure already uses it.
    pub fn ensure_unit_name_available(
        &self,
        name: &str,
        exclude: Option<i64>,
    ) -> Result<(), DomainError> {
        let key: String = name_key(name);
        if key.is_empty() {
            return Err(DomainError::MissingField { field: "name" });
        }
        if self
            .unit_measures
            .values()
            .any(|unit| Some(unit.id) != exclude && name_key(&unit.name) == key)
        {
            return Err(DomainError::DuplicateName {
                entity: EntityKind::UnitMeasure,
                name: normalize_name(name),
            });
        }
        Ok(())
    }
}

/// Validates item input against the taxonomy and catalog.
///
/// # Arguments
///
/// * `taxonomy` - The taxonomy the item is tagged into
/// * `catalog` - The current catalog
/// * `draft` - The submitted values
/// * `existing_id` - The item being updated, `None` on create
///
/// # Errors
///
/// Returns the first failing rule: `NotFound` for an unknown item being
/// updated, `MissingField` for product name, variable, category or unit
/// measures, `InconsistentPath`, `NotFound` for an unknown unit measure,
/// then `DuplicateItem`.
pub fn validate_item(
    taxonomy: &Taxonomy,
    catalog: &ItemCatalog,
    draft: &ItemDraft,
    existing_id: Option<i64>,
) -> Result<Item, DomainError> {
    if let Some(id) = existing_id
        && catalog.item(id).is_none()
    {
        return Err(DomainError::NotFound {
            entity: EntityKind::Item,
            id,
        });
    }

    let product_name: String = draft
        .product_name
        .as_deref()
        .map(normalize_name)
        .filter(|name| !name.is_empty())
        .ok_or(DomainError::MissingField {
            field: "productName",
        })?;
    let variable_id: i64 = draft
        .variable_id
        .ok_or(DomainError::MissingField { field: "variable" })?;
    let category_id: i64 = draft
        .category_id
        .ok_or(DomainError::MissingField { field: "category" })?;

    let path: TaxonomyPath = validate_taxonomy_path(
        taxonomy,
        variable_id,
        category_id,
        draft.subcategory_id,
        draft.second_subcategory_id,
    )?;

    if draft.unit_measure_ids.is_empty() {
        return Err(DomainError::MissingField {
            field: "unitMeasures",
        });
    }
    let mut unit_measure_ids: BTreeSet<i64> = BTreeSet::new();
    for &unit_id in &draft.unit_measure_ids {
        if catalog.unit_measure(unit_id).is_none() {
            return Err(DomainError::NotFound {
                entity: EntityKind::UnitMeasure,
                id: unit_id,
            });
        }
        unit_measure_ids.insert(unit_id);
    }

    if catalog
        .find_duplicate(&product_name, &path, existing_id)
        .is_some()
    {
        return Err(DomainError::DuplicateItem { product_name });
    }

    Ok(Item {
        item_id: existing_id,
        product_name,
        path,
        unit_measure_ids,
    })
}

/// Lists unit measures dropped by an update that incidents still use.
///
/// # Arguments
///
/// * `previous` - The stored item
/// * `updated` - The validated replacement
/// * `usage` - Line entry counts keyed by `(item_id, unit_measure_id)`
#[must_use]
pub fn unit_measure_warnings(
    previous: &Item,
    updated: &Item,
    usage: &BTreeMap<(i64, i64), usize>,
) -> Vec<UnitMeasureWarning> {
    let Some(item_id) = previous.item_id else {
        return Vec::new();
    };
    previous
        .unit_measure_ids
        .difference(&updated.unit_measure_ids)
        .filter_map(|&unit_measure_id| {
            usage
                .get(&(item_id, unit_measure_id))
                .copied()
                .filter(|&count| count > 0)
                .map(|line_item_count| UnitMeasureWarning {
                    item_id,
                    unit_measure_id,
                    line_item_count,
                })
        })
        .collect()
}
