// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::types::{GeographyPath, TaxonomyPath};
use serde::{Deserialize, Serialize};
use time::Date;

/// Unvalidated line entry input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItemDraft {
    /// Set when editing an entry that already exists.
    pub incident_item_id: Option<i64>,
    /// The item.
    pub item_id: Option<i64>,
    /// The quantity, which must be greater than zero.
    pub quantity_used: f64,
    /// The unit measure, which must be permitted for the item.
    pub unit_measure_id: Option<i64>,
}

/// Unvalidated incident input, as submitted by a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentDraft {
    /// When the incident happened.
    pub date: Option<Date>,
    /// Short title.
    pub title: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// The province.
    pub province_id: Option<i64>,
    /// The municipality.
    pub municipality_id: Option<i64>,
    /// The variable.
    pub variable_id: Option<i64>,
    /// The category.
    pub category_id: Option<i64>,
    /// The subcategory.
    pub subcategory_id: Option<i64>,
    /// The second subcategory.
    pub second_subcategory_id: Option<i64>,
    /// People affected.
    pub number_of_people: i64,
    /// Optional monetary amount.
    pub amount: Option<f64>,
    /// Line entries, in submission order.
    pub items: Vec<LineItemDraft>,
}

/// A validated line entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncidentItem {
    /// `None` for entries not yet persisted.
    pub incident_item_id: Option<i64>,
    /// The item.
    pub item_id: i64,
    /// The quantity, greater than zero.
    pub quantity_used: f64,
    /// A unit measure permitted for the item.
    pub unit_measure_id: i64,
}

/// A validated incident.
///
/// Only [`crate::validate_incident`] can construct one, so holding an
/// `Incident` means every path and line entry was checked.
#[derive(Debug, Clone, PartialEq)]
pub struct Incident {
    date: Date,
    title: String,
    description: String,
    geography: GeographyPath,
    taxonomy: TaxonomyPath,
    number_of_people: u32,
    amount: Option<f64>,
    items: Vec<IncidentItem>,
}

impl Incident {
    #[allow(clippy::too_many_arguments)]
    pub(crate) const fn new(
        date: Date,
        title: String,
        description: String,
        geography: GeographyPath,
        taxonomy: TaxonomyPath,
        number_of_people: u32,
        amount: Option<f64>,
        items: Vec<IncidentItem>,
    ) -> Self {
        Self {
            date,
            title,
            description,
            geography,
            taxonomy,
            number_of_people,
            amount,
            items,
        }
    }

    /// When the incident happened.
    #[must_use]
    pub const fn date(&self) -> Date {
        self.date
    }

    /// The trimmed, non-empty title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The trimmed, non-empty description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Province and municipality, with the municipality under the province.
    #[must_use]
    pub const fn geography(&self) -> GeographyPath {
        self.geography
    }

    /// Variable down to the deepest selected level, each under its parent.
    #[must_use]
    pub const fn taxonomy(&self) -> TaxonomyPath {
        self.taxonomy
    }

    /// People affected.
    #[must_use]
    pub const fn number_of_people(&self) -> u32 {
        self.number_of_people
    }

    /// Monetary amount, finite and non-negative when present.
    #[must_use]
    pub const fn amount(&self) -> Option<f64> {
        self.amount
    }

    /// Line entries in their validated order.
    #[must_use]
    pub fn items(&self) -> &[IncidentItem] {
        &self.items
    }
}

/// An incident as read back from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentRecord {
    /// The identifier assigned by the database.
    pub incident_id: i64,
    /// When the incident happened.
    pub date: Date,
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Geography placement.
    pub geography: GeographyPath,
    /// Taxonomy classification.
    pub taxonomy: TaxonomyPath,
    /// People affected.
    pub number_of_people: u32,
    /// Optional monetary amount.
    pub amount: Option<f64>,
    /// Line entries ordered by position.
    pub items: Vec<IncidentItem>,
}

impl IncidentRecord {
    /// Returns the stored values as editable input.
    #[must_use]
    pub fn to_draft(&self) -> IncidentDraft {
        IncidentDraft {
            date: Some(self.date),
            title: Some(self.title.clone()),
            description: Some(self.description.clone()),
            province_id: Some(self.geography.province_id),
            municipality_id: Some(self.geography.municipality_id),
            variable_id: Some(self.taxonomy.variable_id),
            category_id: Some(self.taxonomy.category_id),
            subcategory_id: self.taxonomy.subcategory_id,
            second_subcategory_id: self.taxonomy.second_subcategory_id,
            number_of_people: i64::from(self.number_of_people),
            amount: self.amount,
            items: self
                .items
                .iter()
                .map(|line| LineItemDraft {
                    incident_item_id: line.incident_item_id,
                    item_id: Some(line.item_id),
                    quantity_used: line.quantity_used,
                    unit_measure_id: Some(line.unit_measure_id),
                })
                .collect(),
        }
    }
}
