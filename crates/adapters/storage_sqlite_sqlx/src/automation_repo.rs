//! `SQLite` implementation of [`AutomationRepository`].

use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use fleethub_app::ports::AutomationRepository;
use fleethub_domain::automation::{Automation, AutomationChain, ExecutionStatus};
use fleethub_domain::error::{FleetHubError, NotFoundError};
use fleethub_domain::id::AutomationId;
use fleethub_domain::time::Timestamp;

use crate::error::StorageError;

struct Wrapper(Automation);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<Automation> {
        value.map(|w| w.0)
    }
}

fn decode_error(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> sqlx::Error {
    sqlx::Error::Decode(err.into())
}

/// A chain that no longer decodes loads as `None`, so the engine rejects
/// that one definition instead of the whole listing failing.
fn decode_chain(id: AutomationId, json: &str) -> Option<AutomationChain> {
    match serde_json::from_str(json) {
        Ok(chain) => Some(chain),
        Err(err) => {
            tracing::warn!(automation_id = %id, error = %err, "stored chain does not decode");
            None
        }
    }
}

fn parse_timestamp(value: Option<String>) -> Result<Option<Timestamp>, sqlx::Error> {
    value
        .map(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .map_err(decode_error)
        })
        .transpose()
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let name: String = row.try_get("name")?;
        let enabled: bool = row.try_get("enabled")?;
        let chain_json: Option<String> = row.try_get("chain")?;
        let last_execution_time: Option<String> = row.try_get("last_execution_time")?;
        let last_execution_status: Option<String> = row.try_get("last_execution_status")?;

        let id = AutomationId::from_str(&id).map_err(decode_error)?;
        let chain = chain_json.and_then(|json| decode_chain(id, &json));
        let last_execution_status = last_execution_status
            .map(|s| ExecutionStatus::from_str(&s).map_err(decode_error))
            .transpose()?;

        Ok(Self(Automation {
            id,
            name,
            enabled,
            chain,
            last_execution_time: parse_timestamp(last_execution_time)?,
            last_execution_status,
        }))
    }
}

fn not_found(id: AutomationId) -> FleetHubError {
    NotFoundError {
        entity: "Automation",
        id: id.to_string(),
    }
    .into()
}

/// `SQLite`-backed automation repository.
pub struct SqliteAutomationRepository {
    pool: SqlitePool,
}

impl SqliteAutomationRepository {
    /// Create a new repository backed by the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl AutomationRepository for SqliteAutomationRepository {
    async fn create(&self, automation: Automation) -> Result<Automation, FleetHubError> {
        let chain_json = automation
            .chain
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::from)?;
        let last_execution_time = automation.last_execution_time.map(|ts| ts.to_rfc3339());
        let last_execution_status = automation
            .last_execution_status
            .map(ExecutionStatus::as_str);

        sqlx::query(
            "INSERT INTO automations (id, name, enabled, chain, last_execution_time, last_execution_status) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(automation.id.to_string())
        .bind(&automation.name)
        .bind(automation.enabled)
        .bind(&chain_json)
        .bind(&last_execution_time)
        .bind(last_execution_status)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        Ok(automation)
    }

    async fn get_by_id(&self, id: AutomationId) -> Result<Option<Automation>, FleetHubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM automations WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Automation>, FleetHubError> {
        let row: Option<Wrapper> = sqlx::query_as("SELECT * FROM automations WHERE name = ?")
            .bind(name.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(Wrapper::maybe(row))
    }

    async fn get_all(&self) -> Result<Vec<Automation>, FleetHubError> {
        let rows: Vec<Wrapper> = sqlx::query_as("SELECT * FROM automations ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn get_enabled(&self) -> Result<Vec<Automation>, FleetHubError> {
        let rows: Vec<Wrapper> =
            sqlx::query_as("SELECT * FROM automations WHERE enabled = 1 ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(rows.into_iter().map(|w| w.0).collect())
    }

    async fn update(&self, automation: Automation) -> Result<Automation, FleetHubError> {
        let chain_json = automation
            .chain
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(StorageError::from)?;

        let result =
            sqlx::query("UPDATE automations SET name = ?, enabled = ?, chain = ? WHERE id = ?")
                .bind(&automation.name)
                .bind(automation.enabled)
                .bind(&chain_json)
                .bind(automation.id.to_string())
                .execute(&self.pool)
                .await
                .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(not_found(automation.id));
        }

        Ok(automation)
    }

    async fn delete(&self, id: AutomationId) -> Result<(), FleetHubError> {
        sqlx::query("DELETE FROM automations WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
        Ok(())
    }

    async fn set_last_execution_status(
        &self,
        id: AutomationId,
        status: ExecutionStatus,
        at: Timestamp,
    ) -> Result<(), FleetHubError> {
        let result = sqlx::query(
            "UPDATE automations SET last_execution_time = ?, last_execution_status = ? WHERE id = ?",
        )
        .bind(at.to_rfc3339())
        .bind(status.as_str())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;
        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
