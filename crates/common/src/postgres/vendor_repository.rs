use crate::domain::{
    CreateVendorRepoInput, DomainError, DomainResult, GetVendorRepoInput, UpdateVendorRepoInput,
    Vendor, VendorRepository,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{debug, instrument};

/// Vendor row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct VendorRow {
    pub id: i64,
    pub vendor_key: String,
    pub vendor_name: String,
    pub vendor_description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for VendorRow {
    fn from(row: &Row) -> Self {
        VendorRow {
            id: row.get("id"),
            vendor_key: row.get("vendor_key"),
            vendor_name: row.get("vendor_name"),
            vendor_description: row.get("vendor_description"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

impl From<VendorRow> for Vendor {
    fn from(row: VendorRow) -> Self {
        Vendor {
            id: row.id,
            vendor_key: row.vendor_key,
            vendor_name: row.vendor_name,
            vendor_description: row.vendor_description,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

const VENDOR_COLUMNS: &str =
    "id, vendor_key, vendor_name, vendor_description, created_at, updated_at";

/// PostgreSQL implementation of VendorRepository trait
#[derive(Clone)]
pub struct PostgresVendorRepository {
    client: PostgresClient,
}

impl PostgresVendorRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VendorRepository for PostgresVendorRepository {
    #[instrument(skip(self))]
    async fn allocate_vendor_id(&self) -> DomainResult<i64> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_one("SELECT nextval(pg_get_serial_sequence('vendors', 'id'))", &[])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.get(0))
    }

    #[instrument(skip(self, input), fields(vendor_id = input.id))]
    async fn create_vendor(&self, input: CreateVendorRepoInput) -> DomainResult<Vendor> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        conn.execute(
            "INSERT INTO vendors (id, vendor_key, vendor_name, vendor_description, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
            &[
                &input.id,
                &input.vendor_key,
                &input.vendor_name,
                &input.vendor_description,
                &now,
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(vendor_id = input.id, "inserted vendor");

        Ok(Vendor {
            id: input.id,
            vendor_key: input.vendor_key,
            vendor_name: input.vendor_name,
            vendor_description: input.vendor_description,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, input), fields(vendor_id = input.id))]
    async fn update_vendor(&self, input: UpdateVendorRepoInput) -> DomainResult<Vendor> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE vendors
                     SET vendor_name = $1, vendor_description = $2, updated_at = $3
                     WHERE id = $4
                     RETURNING {}",
                    VENDOR_COLUMNS
                ),
                &[&input.vendor_name, &input.vendor_description, &now, &input.id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => Ok(VendorRow::from(&row).into()),
            None => Err(DomainError::VendorNotFound(input.id.to_string())),
        }
    }

    #[instrument(skip(self, input), fields(vendor_id = input.id))]
    async fn get_vendor(&self, input: GetVendorRepoInput) -> DomainResult<Option<Vendor>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!("SELECT {} FROM vendors WHERE id = $1", VENDOR_COLUMNS),
                &[&input.id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| VendorRow::from(&row).into()))
    }
}
