// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Backend initialization tests.
//!
//! Every other test module opens an in-memory database, so migrations and
//! connection setup are exercised throughout. These cover the edges.

use crate::error::PersistenceError;
use crate::{Persistence, UserData};
use incident_registry::RegistryContext;
use incident_registry_domain::{Level, UserRole};
use std::path::PathBuf;

#[test]
fn test_persistence_initialization() {
    let result: Result<Persistence, PersistenceError> = Persistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_key_enforcement_is_enabled() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_fresh_database_has_empty_context() {
    let mut persistence: Persistence = Persistence::new_in_memory().unwrap();

    let context: RegistryContext = persistence.load_context().unwrap();

    assert!(context.taxonomy.is_empty());
    assert!(context.catalog.unit_measures().is_empty());
    assert!(context.unit_usage.is_empty());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut db1: Persistence = Persistence::new_in_memory().unwrap();
    let mut db2: Persistence = Persistence::new_in_memory().unwrap();

    db1.create_user("alice", "correct-horse-1", UserRole::Admin)
        .unwrap();

    let users1: Vec<UserData> = db1.list_users().unwrap();
    let users2: Vec<UserData> = db2.list_users().unwrap();

    assert_eq!(users1.len(), 1, "db1 should have 1 user");
    assert!(users2.is_empty(), "db2 should have no users (isolated)");
}

#[test]
fn test_file_database_survives_reopen() {
    let path: PathBuf = std::env::temp_dir().join(format!(
        "incident_registry_reopen_{}.db",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    {
        let mut persistence: Persistence = Persistence::new_with_file(&path).unwrap();
        super::create_node(&mut persistence, Level::Province, "Havana", None);
    }

    let mut reopened: Persistence = Persistence::new_with_file(&path).unwrap();
    assert_eq!(reopened.list_nodes(Level::Province).unwrap().len(), 1);

    drop(reopened);
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}
