use crate::domain::{
    CreateDeviceRepoInput, Device, DeviceRepository, DomainError, DomainResult,
    GetDeviceByIdentifierRepoInput, GetDeviceRepoInput, UpdateDeviceInfoRepoInput,
    UpdateDeviceVersionRepoInput,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::error::SqlState;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use tracing::{debug, instrument};

/// Name of the unique constraint over `devices.device_identifier`
const DEVICE_IDENTIFIER_CONSTRAINT: &str = "devices_device_identifier_key";

/// Device row for PostgreSQL storage with timestamp metadata
#[derive(Debug, Clone)]
pub struct DeviceRow {
    pub id: i64,
    pub product_id: i64,
    pub device_identifier: String,
    pub device_key: String,
    pub device_secret: String,
    pub device_name: String,
    pub device_description: String,
    pub device_version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for DeviceRow {
    fn from(row: &Row) -> Self {
        DeviceRow {
            id: row.get("id"),
            product_id: row.get("product_id"),
            device_identifier: row.get("device_identifier"),
            device_key: row.get("device_key"),
            device_secret: row.get("device_secret"),
            device_name: row.get("device_name"),
            device_description: row.get("device_description"),
            device_version: row.get("device_version"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

/// Convert database DeviceRow to domain Device
impl From<DeviceRow> for Device {
    fn from(row: DeviceRow) -> Self {
        Device {
            id: row.id,
            product_id: row.product_id,
            device_identifier: row.device_identifier,
            device_key: row.device_key,
            device_secret: row.device_secret,
            device_name: row.device_name,
            device_description: row.device_description,
            device_version: row.device_version,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

const DEVICE_COLUMNS: &str = "id, product_id, device_identifier, device_key, device_secret, \
     device_name, device_description, device_version, created_at, updated_at";

/// PostgreSQL implementation of DeviceRepository trait
#[derive(Clone)]
pub struct PostgresDeviceRepository {
    client: PostgresClient,
}

impl PostgresDeviceRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }

    /// Point lookup on a column that is unique across devices
    async fn fetch_one(
        &self,
        filter: &'static str,
        param: &(dyn ToSql + Sync),
    ) -> DomainResult<Option<Device>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!("SELECT {} FROM devices WHERE {} = $1", DEVICE_COLUMNS, filter),
                &[param],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| DeviceRow::from(&row).into()))
    }
}

#[async_trait]
impl DeviceRepository for PostgresDeviceRepository {
    #[instrument(skip(self))]
    async fn allocate_device_id(&self) -> DomainResult<i64> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_one("SELECT nextval(pg_get_serial_sequence('devices', 'id'))", &[])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.get(0))
    }

    #[instrument(skip(self, input), fields(device_id = input.id, device_identifier = %input.device_identifier, product_id = input.product_id))]
    async fn create_device(&self, input: CreateDeviceRepoInput) -> DomainResult<Device> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        let result = conn
            .execute(
                "INSERT INTO devices (id, product_id, device_identifier, device_key, device_secret,
                                      device_name, device_description, device_version, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
                &[
                    &input.id,
                    &input.product_id,
                    &input.device_identifier,
                    &input.device_key,
                    &input.device_secret,
                    &input.device_name,
                    &input.device_description,
                    &input.device_version,
                    &now,
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            if let Some(db_err) = e.as_db_error() {
                if *db_err.code() == SqlState::UNIQUE_VIOLATION
                    && db_err.constraint() == Some(DEVICE_IDENTIFIER_CONSTRAINT)
                {
                    return Err(DomainError::DeviceAlreadyExists(input.device_identifier));
                }
                if *db_err.code() == SqlState::FOREIGN_KEY_VIOLATION {
                    return Err(DomainError::ProductNotFound(input.product_id.to_string()));
                }
            }
            return Err(DomainError::RepositoryError(e.into()));
        }

        debug!(device_id = input.id, "inserted device");

        Ok(Device {
            id: input.id,
            product_id: input.product_id,
            device_identifier: input.device_identifier,
            device_key: input.device_key,
            device_secret: input.device_secret,
            device_name: input.device_name,
            device_description: input.device_description,
            device_version: input.device_version,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, input), fields(device_id = input.id))]
    async fn get_device(&self, input: GetDeviceRepoInput) -> DomainResult<Option<Device>> {
        self.fetch_one("id", &input.id).await
    }

    #[instrument(skip(self, input), fields(device_identifier = %input.device_identifier))]
    async fn get_device_by_identifier(
        &self,
        input: GetDeviceByIdentifierRepoInput,
    ) -> DomainResult<Option<Device>> {
        self.fetch_one("device_identifier", &input.device_identifier)
            .await
    }

    #[instrument(skip(self, input), fields(device_identifier = %input.device_identifier))]
    async fn update_device_version(
        &self,
        input: UpdateDeviceVersionRepoInput,
    ) -> DomainResult<Device> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE devices
                     SET device_version = $1, updated_at = $2
                     WHERE device_identifier = $3
                     RETURNING {}",
                    DEVICE_COLUMNS
                ),
                &[&input.device_version, &now, &input.device_identifier],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => Ok(DeviceRow::from(&row).into()),
            None => Err(DomainError::DeviceNotFound(input.device_identifier)),
        }
    }

    #[instrument(skip(self, input), fields(device_identifier = %input.device_identifier))]
    async fn update_device_info(&self, input: UpdateDeviceInfoRepoInput) -> DomainResult<Device> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE devices
                     SET device_name = $1, device_description = $2, updated_at = $3
                     WHERE device_identifier = $4
                     RETURNING {}",
                    DEVICE_COLUMNS
                ),
                &[
                    &input.device_name,
                    &input.device_description,
                    &now,
                    &input.device_identifier,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => Ok(DeviceRow::from(&row).into()),
            None => Err(DomainError::DeviceNotFound(input.device_identifier)),
        }
    }
}
