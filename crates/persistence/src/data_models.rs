// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use incident_registry_domain::{IncidentRecord, UserRole};
use serde::{Deserialize, Serialize};
use time::Date;

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub user_id: i64,
    pub name: String,
    pub role: UserRole,
    pub password_hash: String,
    pub created_at: String,
}

/// A stored login session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub session_id: i64,
    pub token: String,
    pub user_id: i64,
    pub created_at: String,
    /// RFC 3339 timestamp after which the token is refused.
    pub expires_at: String,
}

/// Column an incident listing is ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSort {
    /// Incident date, then identifier.
    #[default]
    Date,
    /// Title, then identifier.
    Title,
    /// Identifier (creation order).
    Id,
}

/// Filter, sort and page options for listing incidents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentQuery {
    /// Substring matched against title and description.
    pub search: Option<String>,
    /// Only incidents under this variable.
    pub variable_id: Option<i64>,
    /// Only incidents in this province.
    pub province_id: Option<i64>,
    /// Earliest incident date, inclusive.
    pub date_from: Option<Date>,
    /// Latest incident date, inclusive.
    pub date_to: Option<Date>,
    /// Sort column.
    pub sort: IncidentSort,
    /// Sort direction.
    pub descending: bool,
    /// One-based page number.
    pub page: u32,
    /// Rows per page.
    pub page_size: u32,
}

impl IncidentQuery {
    /// Largest page size a caller may request.
    pub const MAX_PAGE_SIZE: u32 = 100;

    /// Zero-based offset of the first row of the page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(self.limit())
    }

    /// Page size clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn limit(&self) -> u32 {
        self.page_size.clamp(1, Self::MAX_PAGE_SIZE)
    }
}

impl Default for IncidentQuery {
    fn default() -> Self {
        Self {
            search: None,
            variable_id: None,
            province_id: None,
            date_from: None,
            date_to: None,
            sort: IncidentSort::Date,
            descending: true,
            page: 1,
            page_size: 20,
        }
    }
}

/// One page of incidents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentPage {
    pub incidents: Vec<IncidentRecord>,
    /// Rows matching the filter across all pages.
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}
