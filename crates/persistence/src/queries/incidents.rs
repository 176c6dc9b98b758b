// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Incident queries.

use diesel::SqliteConnection;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;
use incident_registry_domain::{
    EntityKind, GeographyPath, IncidentItem, IncidentRecord, TaxonomyPath,
};
use std::collections::BTreeMap;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use tracing::debug;

use crate::data_models::{IncidentPage, IncidentQuery, IncidentSort};
use crate::diesel_schema::{incident_items, incidents};
use crate::error::PersistenceError;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Formats a date the way it is stored.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn format_date(date: Date) -> Result<String, PersistenceError> {
    date.format(DATE_FORMAT)
        .map_err(|e| PersistenceError::Other(format!("Failed to format date: {e}")))
}

fn parse_date(value: &str) -> Result<Date, PersistenceError> {
    Date::parse(value, DATE_FORMAT)
        .map_err(|e| PersistenceError::InvalidStoredData(format!("date '{value}': {e}")))
}

/// Diesel Queryable struct for incident rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = incidents)]
struct IncidentRow {
    id: i64,
    incident_date: String,
    title: String,
    description: String,
    province_id: i64,
    municipality_id: i64,
    variable_id: i64,
    category_id: i64,
    subcategory_id: Option<i64>,
    second_subcategory_id: Option<i64>,
    number_of_people: i64,
    amount: Option<f64>,
}

/// Diesel Queryable struct for line entry rows.
#[derive(Queryable, Selectable)]
#[diesel(table_name = incident_items)]
struct IncidentItemRow {
    id: i64,
    incident_id: i64,
    item_id: i64,
    quantity_used: f64,
    unit_measure_id: i64,
}

impl IncidentItemRow {
    const fn into_item(self) -> IncidentItem {
        IncidentItem {
            incident_item_id: Some(self.id),
            item_id: self.item_id,
            quantity_used: self.quantity_used,
            unit_measure_id: self.unit_measure_id,
        }
    }
}

impl IncidentRow {
    fn into_record(self, items: Vec<IncidentItem>) -> Result<IncidentRecord, PersistenceError> {
        let number_of_people: u32 = u32::try_from(self.number_of_people).map_err(|e| {
            PersistenceError::InvalidStoredData(format!("incident {} head count: {e}", self.id))
        })?;
        Ok(IncidentRecord {
            incident_id: self.id,
            date: parse_date(&self.incident_date)?,
            title: self.title,
            description: self.description,
            geography: GeographyPath {
                province_id: self.province_id,
                municipality_id: self.municipality_id,
            },
            taxonomy: TaxonomyPath {
                variable_id: self.variable_id,
                category_id: self.category_id,
                subcategory_id: self.subcategory_id,
                second_subcategory_id: self.second_subcategory_id,
            },
            number_of_people,
            amount: self.amount,
            items,
        })
    }
}

/// Loads the line entries of one incident in position order.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_line_items(
    conn: &mut SqliteConnection,
    incident_id: i64,
) -> Result<Vec<IncidentItem>, PersistenceError> {
    let rows: Vec<IncidentItemRow> = incident_items::table
        .filter(incident_items::incident_id.eq(incident_id))
        .order((incident_items::position.asc(), incident_items::id.asc()))
        .select(IncidentItemRow::as_select())
        .load(conn)?;
    Ok(rows.into_iter().map(IncidentItemRow::into_item).collect())
}

/// Loads an incident with its line entries.
///
/// # Errors
///
/// Returns `NotFound` if no incident has this identifier, or an error if
/// a query fails.
pub fn get_incident(
    conn: &mut SqliteConnection,
    incident_id: i64,
) -> Result<IncidentRecord, PersistenceError> {
    let row: IncidentRow = incidents::table
        .filter(incidents::id.eq(incident_id))
        .select(IncidentRow::as_select())
        .first(conn)
        .optional()?
        .ok_or(PersistenceError::NotFound {
            entity: EntityKind::Incident,
            id: incident_id,
        })?;
    let items: Vec<IncidentItem> = load_line_items(conn, incident_id)?;
    row.into_record(items)
}

/// Returns whether an incident exists.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn incident_exists(
    conn: &mut SqliteConnection,
    incident_id: i64,
) -> Result<bool, PersistenceError> {
    let count: i64 = incidents::table
        .filter(incidents::id.eq(incident_id))
        .count()
        .get_result(conn)?;
    Ok(count > 0)
}

/// Escapes `LIKE` wildcards so the search text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped: String = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn filtered(query: &IncidentQuery) -> Result<incidents::BoxedQuery<'static, Sqlite>, PersistenceError> {
    let mut statement = incidents::table.into_boxed::<Sqlite>();

    if let Some(search) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern: String = format!("%{}%", escape_like(search));
        statement = statement.filter(
            incidents::title
                .like(pattern.clone())
                .escape('\\')
                .or(incidents::description.like(pattern).escape('\\')),
        );
    }
    if let Some(variable_id) = query.variable_id {
        statement = statement.filter(incidents::variable_id.eq(variable_id));
    }
    if let Some(province_id) = query.province_id {
        statement = statement.filter(incidents::province_id.eq(province_id));
    }
    if let Some(from) = query.date_from {
        statement = statement.filter(incidents::incident_date.ge(format_date(from)?));
    }
    if let Some(to) = query.date_to {
        statement = statement.filter(incidents::incident_date.le(format_date(to)?));
    }
    Ok(statement)
}

/// Lists incidents matching a filter, one page at a time.
///
/// Ties on the sort column are broken by identifier in the same direction.
///
/// # Errors
///
/// Returns an error if a query fails or a stored row is malformed.
pub fn list_incidents(
    conn: &mut SqliteConnection,
    query: &IncidentQuery,
) -> Result<IncidentPage, PersistenceError> {
    let total: i64 = filtered(query)?.count().get_result(conn)?;

    let statement = filtered(query)?;
    let statement = match (query.sort, query.descending) {
        (IncidentSort::Date, false) => statement
            .order(incidents::incident_date.asc())
            .then_order_by(incidents::id.asc()),
        (IncidentSort::Date, true) => statement
            .order(incidents::incident_date.desc())
            .then_order_by(incidents::id.desc()),
        (IncidentSort::Title, false) => statement
            .order(incidents::title.asc())
            .then_order_by(incidents::id.asc()),
        (IncidentSort::Title, true) => statement
            .order(incidents::title.desc())
            .then_order_by(incidents::id.desc()),
        (IncidentSort::Id, false) => statement.order(incidents::id.asc()),
        (IncidentSort::Id, true) => statement.order(incidents::id.desc()),
    };

    let rows: Vec<IncidentRow> = statement
        .select(IncidentRow::as_select())
        .limit(i64::from(query.limit()))
        .offset(query.offset())
        .load(conn)?;

    let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
    let line_rows: Vec<IncidentItemRow> = incident_items::table
        .filter(incident_items::incident_id.eq_any(&ids))
        .order((
            incident_items::incident_id.asc(),
            incident_items::position.asc(),
            incident_items::id.asc(),
        ))
        .select(IncidentItemRow::as_select())
        .load(conn)?;
    let mut lines_by_incident: BTreeMap<i64, Vec<IncidentItem>> = BTreeMap::new();
    for line in line_rows {
        lines_by_incident
            .entry(line.incident_id)
            .or_default()
            .push(line.into_item());
    }

    let incidents: Vec<IncidentRecord> = rows
        .into_iter()
        .map(|row| {
            let items: Vec<IncidentItem> = lines_by_incident.remove(&row.id).unwrap_or_default();
            row.into_record(items)
        })
        .collect::<Result<_, _>>()?;

    debug!(total, returned = incidents.len(), "Listed incidents");

    Ok(IncidentPage {
        incidents,
        total: u64::try_from(total).unwrap_or_default(),
        page: query.page.max(1),
        page_size: query.limit(),
    })
}
