// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod cascade;
mod catalog;
mod error;
mod incident;
mod taxonomy;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use cascade::{CascadeResolution, PartialPath, resolve_options};
pub use catalog::{
    Item, ItemCatalog, ItemDraft, UnitMeasureWarning, unit_measure_warnings, validate_item,
};
pub use error::{DomainError, LineItemFault};
pub use incident::{Incident, IncidentDraft, IncidentItem, IncidentRecord, LineItemDraft};
pub use taxonomy::Taxonomy;

// Re-export public types
pub use types::{
    EntityKind, GeographyPath, Level, NodeRef, TaxonomyNode, TaxonomyPath, UnitMeasure,
    UserRole, name_key, normalize_name,
};
pub use validation::{
    RequiredFields, validate_geography_path, validate_incident, validate_line_items,
    validate_required_fields, validate_taxonomy_path,
};
