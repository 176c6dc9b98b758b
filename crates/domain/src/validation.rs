// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Staged incident validation.
//!
//! Each stage stops at the first failure. [`validate_incident`] runs the
//! stages in order: required fields, geography path, taxonomy path, then
//! line entries.

use crate::catalog::ItemCatalog;
use crate::error::{DomainError, LineItemFault};
use crate::incident::{Incident, IncidentDraft, IncidentItem, LineItemDraft};
use crate::taxonomy::Taxonomy;
use crate::types::{GeographyPath, Level, TaxonomyPath, normalize_name};
use time::Date;

/// Required scalar fields of an incident, after the first stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RequiredFields {
    /// When the incident happened.
    pub date: Date,
    /// Trimmed title.
    pub title: String,
    /// Trimmed description.
    pub description: String,
    /// The province.
    pub province_id: i64,
    /// The municipality.
    pub municipality_id: i64,
    /// The variable.
    pub variable_id: i64,
    /// The category.
    pub category_id: i64,
    /// People affected.
    pub number_of_people: u32,
    /// Optional monetary amount.
    pub amount: Option<f64>,
}

fn required_text(value: Option<&str>, field: &'static str) -> Result<String, DomainError> {
    value
        .map(normalize_name)
        .filter(|text| !text.is_empty())
        .ok_or(DomainError::MissingField { field })
}

/// Checks presence of required fields and numeric ranges.
///
/// # Errors
///
/// Returns `MissingField` for the first absent field in form order, or
/// `InvalidField` for a negative `numberOfPeople` or a negative or
/// non-finite `amount`.
pub fn validate_required_fields(draft: &IncidentDraft) -> Result<RequiredFields, DomainError> {
    let date: Date = draft
        .date
        .ok_or(DomainError::MissingField { field: "date" })?;
    let title: String = required_text(draft.title.as_deref(), "title")?;
    let description: String = required_text(draft.description.as_deref(), "description")?;
    let province_id: i64 = draft
        .province_id
        .ok_or(DomainError::MissingField { field: "province" })?;
    let municipality_id: i64 = draft.municipality_id.ok_or(DomainError::MissingField {
        field: "municipality",
    })?;
    let variable_id: i64 = draft
        .variable_id
        .ok_or(DomainError::MissingField { field: "variable" })?;
    let category_id: i64 = draft
        .category_id
        .ok_or(DomainError::MissingField { field: "category" })?;

    let number_of_people: u32 =
        u32::try_from(draft.number_of_people).map_err(|_| DomainError::InvalidField {
            field: "numberOfPeople",
            reason: format!("{} is not a valid head count", draft.number_of_people),
        })?;

    if let Some(amount) = draft.amount
        && (!amount.is_finite() || amount < 0.0)
    {
        return Err(DomainError::InvalidField {
            field: "amount",
            reason: String::from("must be a number greater than or equal to 0"),
        });
    }

    Ok(RequiredFields {
        date,
        title,
        description,
        province_id,
        municipality_id,
        variable_id,
        category_id,
        number_of_people,
        amount: draft.amount,
    })
}

/// Checks that the municipality belongs to the province.
///
/// # Errors
///
/// Returns `InconsistentPath` at the first level that does not resolve.
pub fn validate_geography_path(
    taxonomy: &Taxonomy,
    province_id: i64,
    municipality_id: i64,
) -> Result<GeographyPath, DomainError> {
    if !taxonomy.exists(Level::Province, province_id) {
        return Err(DomainError::InconsistentPath {
            level: Level::Province,
        });
    }
    if !taxonomy.belongs_to(Level::Municipality, municipality_id, province_id) {
        return Err(DomainError::InconsistentPath {
            level: Level::Municipality,
        });
    }
    Ok(GeographyPath {
        province_id,
        municipality_id,
    })
}

/// Checks that each taxonomy level belongs to the level above it.
///
/// A second subcategory without a subcategory is inconsistent.
///
/// # Errors
///
/// Returns `InconsistentPath` at the first level that does not resolve.
pub fn validate_taxonomy_path(
    taxonomy: &Taxonomy,
    variable_id: i64,
    category_id: i64,
    subcategory_id: Option<i64>,
    second_subcategory_id: Option<i64>,
) -> Result<TaxonomyPath, DomainError> {
    if !taxonomy.exists(Level::Variable, variable_id) {
        return Err(DomainError::InconsistentPath {
            level: Level::Variable,
        });
    }
    if !taxonomy.belongs_to(Level::Category, category_id, variable_id) {
        return Err(DomainError::InconsistentPath {
            level: Level::Category,
        });
    }
    if let Some(subcategory_id) = subcategory_id
        && !taxonomy.belongs_to(Level::Subcategory, subcategory_id, category_id)
    {
        return Err(DomainError::InconsistentPath {
            level: Level::Subcategory,
        });
    }
    if let Some(second_id) = second_subcategory_id {
        let fits: bool = subcategory_id.is_some_and(|subcategory_id| {
            taxonomy.belongs_to(Level::SecondSubcategory, second_id, subcategory_id)
        });
        if !fits {
            return Err(DomainError::InconsistentPath {
                level: Level::SecondSubcategory,
            });
        }
    }
    Ok(TaxonomyPath {
        variable_id,
        category_id,
        subcategory_id,
        second_subcategory_id,
    })
}

/// Checks every line entry against the catalog, in order.
///
/// For each entry: the item is present and known, the quantity is finite
/// and greater than zero, then the unit measure is present and permitted
/// for the item.
///
/// # Errors
///
/// Returns `InvalidLineItem` for the first failing entry.
pub fn validate_line_items(
    catalog: &ItemCatalog,
    items: &[LineItemDraft],
) -> Result<Vec<IncidentItem>, DomainError> {
    items
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let fault = |reason: LineItemFault| DomainError::InvalidLineItem { index, reason };

            let item_id: i64 = line
                .item_id
                .filter(|&id| catalog.item(id).is_some())
                .ok_or_else(|| fault(LineItemFault::Item))?;
            if !line.quantity_used.is_finite() || line.quantity_used <= 0.0 {
                return Err(fault(LineItemFault::Quantity));
            }
            let unit_measure_id: i64 = line
                .unit_measure_id
                .filter(|&unit_id| catalog.permits(item_id, unit_id))
                .ok_or_else(|| fault(LineItemFault::UnitMeasure))?;

            Ok(IncidentItem {
                incident_item_id: line.incident_item_id,
                item_id,
                quantity_used: line.quantity_used,
                unit_measure_id,
            })
        })
        .collect()
}

/// Runs every validation stage and builds the incident.
///
/// # Arguments
///
/// * `taxonomy` - Taxonomy and geography reference data
/// * `catalog` - Items and their permitted unit measures
/// * `draft` - The submitted form values
///
/// # Errors
///
/// Returns the first error of the first failing stage.
pub fn validate_incident(
    taxonomy: &Taxonomy,
    catalog: &ItemCatalog,
    draft: &IncidentDraft,
) -> Result<Incident, DomainError> {
    let fields: RequiredFields = validate_required_fields(draft)?;
    let geography: GeographyPath =
        validate_geography_path(taxonomy, fields.province_id, fields.municipality_id)?;
    let path: TaxonomyPath = validate_taxonomy_path(
        taxonomy,
        fields.variable_id,
        fields.category_id,
        draft.subcategory_id,
        draft.second_subcategory_id,
    )?;
    let items: Vec<IncidentItem> = validate_line_items(catalog, &draft.items)?;

    Ok(Incident::new(
        fields.date,
        fields.title,
        fields.description,
        geography,
        path,
        fields.number_of_people,
        fields.amount,
        items,
    ))
}
