use crate::postgres::PostgresClient;
use anyhow::{Context, Result};
use tracing::{debug, info};

/// A schema change embedded in the binary
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create_registry_tables",
    sql: include_str!("../../migrations/postgres/00001_create_registry_tables.sql"),
}];

/// Applies every pending embedded migration.
///
/// Each migration runs in its own transaction together with its
/// `schema_migrations` bookkeeping row. The table lock serializes concurrent
/// runners starting against the same database.
pub async fn run_migrations(client: &PostgresClient) -> Result<()> {
    let mut conn = client.get_connection().await?;

    conn.batch_execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
             version BIGINT PRIMARY KEY,
             name TEXT NOT NULL,
             applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
         )",
    )
    .await
    .context("Failed to create schema_migrations table")?;

    for migration in MIGRATIONS {
        let transaction = conn.transaction().await?;

        transaction
            .batch_execute("LOCK TABLE schema_migrations IN EXCLUSIVE MODE")
            .await
            .context("Failed to lock schema_migrations")?;

        let applied = transaction
            .query_opt(
                "SELECT version FROM schema_migrations WHERE version = $1",
                &[&migration.version],
            )
            .await?
            .is_some();

        if applied {
            debug!(version = migration.version, name = migration.name, "migration already applied");
            transaction.commit().await?;
            continue;
        }

        transaction
            .batch_execute(migration.sql)
            .await
            .with_context(|| format!("Migration {} ({}) failed", migration.version, migration.name))?;

        transaction
            .execute(
                "INSERT INTO schema_migrations (version, name) VALUES ($1, $2)",
                &[&migration.version, &migration.name],
            )
            .await?;

        transaction.commit().await?;

        info!(version = migration.version, name = migration.name, "applied migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versions_are_strictly_increasing() {
        let versions: Vec<i64> = MIGRATIONS.iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(versions.first(), Some(&1));
    }

    #[test]
    fn test_device_identifier_is_unique_in_schema() {
        let schema = MIGRATIONS[0].sql;
        assert!(schema.contains("CONSTRAINT devices_device_identifier_key UNIQUE (device_identifier)"));
    }
}
