// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Read-only queries.
//!
//! ## Module Organization
//!
//! - `taxonomy`: Taxonomy and geography nodes, and who references them
//! - `catalog`: Items, unit measures and line entry usage counts
//! - `incidents`: Single incident lookup and filtered listing
//! - `users`: User accounts

pub mod catalog;
pub mod incidents;
pub mod sessions;
pub mod taxonomy;
pub mod users;
