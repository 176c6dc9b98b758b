// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use incident_registry_domain::{DomainError, IncidentItem, LineItemFault};
use std::collections::{BTreeMap, BTreeSet};

/// A line entry together with its position in the incident.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineItemChange {
    /// Zero-based display order.
    pub position: i64,
    /// The validated entry.
    pub line: IncidentItem,
}

/// Row operations that turn the stored line entries into the submitted ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineItemDiff {
    /// Stored entries absent from the submission.
    pub delete: Vec<i64>,
    /// Stored entries whose values or position changed.
    pub update: Vec<LineItemChange>,
    /// Submitted entries without an identifier.
    pub insert: Vec<LineItemChange>,
}

impl LineItemDiff {
    /// Returns whether the diff has no row operations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.delete.is_empty() && self.update.is_empty() && self.insert.is_empty()
    }
}

fn same_values(stored: &IncidentItem, submitted: &IncidentItem) -> bool {
    stored.item_id == submitted.item_id
        && stored.unit_measure_id == submitted.unit_measure_id
        && stored.quantity_used.to_bits() == submitted.quantity_used.to_bits()
}

/// Computes the line entry changes for an incident edit.
///
/// `existing` must be in stored position order. Entries whose values and
/// position are unchanged produce no operation.
///
/// # Arguments
///
/// * `existing` - The stored line entries, ordered by position
/// * `incoming` - The validated submitted line entries, in form order
///
/// # Errors
///
/// Returns `InvalidLineItem` with reason `Ownership` if a submitted entry
/// names an identifier the incident does not own, or names one twice.
pub fn compute_line_item_diff(
    existing: &[IncidentItem],
    incoming: &[IncidentItem],
) -> Result<LineItemDiff, DomainError> {
    let stored: BTreeMap<i64, (i64, &IncidentItem)> = (0_i64..)
        .zip(existing)
        .filter_map(|(position, line)| line.incident_item_id.map(|id| (id, (position, line))))
        .collect();

    let mut diff: LineItemDiff = LineItemDiff::default();
    let mut kept: BTreeSet<i64> = BTreeSet::new();

    for (position, (index, line)) in (0_i64..).zip(incoming.iter().enumerate()) {
        let Some(id) = line.incident_item_id else {
            diff.insert.push(LineItemChange {
                position,
                line: *line,
            });
            continue;
        };
        let Some((stored_position, stored_line)) = stored.get(&id) else {
            return Err(DomainError::InvalidLineItem {
                index,
                reason: LineItemFault::Ownership,
            });
        };
        if !kept.insert(id) {
            return Err(DomainError::InvalidLineItem {
                index,
                reason: LineItemFault::Ownership,
            });
        }
        if *stored_position != position || !same_values(stored_line, line) {
            diff.update.push(LineItemChange {
                position,
                line: *line,
            });
        }
    }

    diff.delete = stored
        .keys()
        .copied()
        .filter(|id| !kept.contains(id))
        .collect();

    Ok(diff)
}
