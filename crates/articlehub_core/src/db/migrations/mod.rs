//! Schema steps for the local article store.
//!
//! Step `n` (1-based) upgrades a store from schema `n - 1` to `n`.
//!
//! # Invariants
//! - Steps are append-only; a released step is never edited.
//! - A store upgrades in one transaction or not at all.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

const SCHEMA_STEPS: &[&str] = &[include_str!("0001_articles.sql")];

/// Newest schema version this build can read and write.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.len() as u32
}

/// Brings the store up to `latest_version()`.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let supported = latest_version();
    if found > supported {
        return Err(DbError::SchemaTooNew { found, supported });
    }

    let pending = &SCHEMA_STEPS[found as usize..];
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step)?;
    }
    tx.pragma_update(None, "user_version", supported)?;
    tx.commit()?;

    info!(
        "event=store_migrate module=db status=ok from={found} to={supported} steps={}",
        pending.len()
    );
    Ok(())
}
