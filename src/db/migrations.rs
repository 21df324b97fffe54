use std::cmp::Ordering;

use anyhow::{bail, Context, Result};
use rusqlite::{Connection, Transaction};

use crate::log_info;

const ENABLE_LOGS: bool = true;
const CURRENT_SCHEMA_VERSION: i32 = 2;

fn schema_version(conn: &Connection) -> Result<i32> {
    conn.pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read schema version")
}

/// Apply every schema step above the file's `user_version` in one transaction.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let found = schema_version(conn)?;
    match found.cmp(&CURRENT_SCHEMA_VERSION) {
        Ordering::Equal => return Ok(()),
        Ordering::Greater => bail!(
            "session log schema v{found} was written by a newer pomotimer (this build knows v{CURRENT_SCHEMA_VERSION})"
        ),
        Ordering::Less => {}
    }

    let tx = conn.transaction().context("failed to begin schema upgrade")?;
    for step in (found + 1)..=CURRENT_SCHEMA_VERSION {
        apply_migration(&tx, step).with_context(|| format!("schema step v{step} failed"))?;
    }
    tx.pragma_update(None, "user_version", CURRENT_SCHEMA_VERSION)
        .context("failed to record schema version")?;
    tx.commit().context("failed to commit schema upgrade")?;

    log_info!("session log schema upgraded v{found} -> v{CURRENT_SCHEMA_VERSION}");
    Ok(())
}

fn apply_migration(tx: &Transaction<'_>, version: i32) -> Result<()> {
    let sql = match version {
        1 => include_str!("schemas/schema_v1.sql"),
        2 => include_str!("schemas/schema_v2.sql"),
        _ => bail!("unknown migration target version: {version}"),
    };
    tx.execute_batch(sql)
        .with_context(|| format!("failed to execute schema_v{version}.sql"))
}
