use anyhow::{anyhow, Context, Result};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::domain::{Incident, IncidentId, IncidentStatus};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = pool_options(database_url)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn create_incident(
        &self,
        title: &str,
        description: &str,
        status: IncidentStatus,
    ) -> Result<Incident> {
        let row = sqlx::query(
            "INSERT INTO incidents (title, description, status) VALUES (?, ?, ?)
             RETURNING id, title, description, status",
        )
        .bind(title)
        .bind(description)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .context("failed to insert incident")?;
        incident_from_row(&row)
    }

    /// All incidents in insertion order.
    pub async fn list_incidents(&self) -> Result<Vec<Incident>> {
        let rows =
            sqlx::query("SELECT id, title, description, status FROM incidents ORDER BY id ASC")
                .fetch_all(&self.pool)
                .await
                .context("failed to list incidents")?;
        rows.iter().map(incident_from_row).collect()
    }

    pub async fn get_incident(&self, incident_id: IncidentId) -> Result<Option<Incident>> {
        let row = sqlx::query("SELECT id, title, description, status FROM incidents WHERE id = ?")
            .bind(incident_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(incident_from_row).transpose()
    }

    /// Returns `None` when no incident has this id.
    pub async fn update_incident_status(
        &self,
        incident_id: IncidentId,
        status: IncidentStatus,
    ) -> Result<Option<Incident>> {
        let row = sqlx::query(
            "UPDATE incidents SET status = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING id, title, description, status",
        )
        .bind(status.as_str())
        .bind(incident_id.0)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("failed to update status of incident {incident_id}"))?;
        row.as_ref().map(incident_from_row).transpose()
    }
}

/// An in-memory database lives only as long as one of its connections, so
/// memory pools pin a connection for the lifetime of the pool.
fn pool_options(database_url: &str) -> SqlitePoolOptions {
    let options = SqlitePoolOptions::new().max_connections(5);
    if is_memory_url(database_url) {
        options
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        options
    }
}

fn is_memory_url(database_url: &str) -> bool {
    database_url.starts_with("sqlite::memory:") || database_url.contains("mode=memory")
}

fn incident_from_row(row: &SqliteRow) -> Result<Incident> {
    let raw_status: String = row.try_get("status")?;
    let status = raw_status
        .parse::<IncidentStatus>()
        .map_err(|err| anyhow!("corrupt incident row: {err}"))?;
    Ok(Incident {
        id: IncidentId(row.try_get("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if is_memory_url(database_url) || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
