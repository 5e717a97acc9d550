use crate::domain::{
    CreateProductRepoInput, DomainError, DomainResult, GetProductRepoInput, Product,
    ProductRepository, UpdateProductRepoInput,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::error::SqlState;
use tokio_postgres::Row;
use tracing::{debug, instrument};

/// Product row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct ProductRow {
    pub id: i64,
    pub vendor_id: i64,
    pub product_key: String,
    pub product_name: String,
    pub product_description: String,
    pub product_config: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for ProductRow {
    fn from(row: &Row) -> Self {
        ProductRow {
            id: row.get("id"),
            vendor_id: row.get("vendor_id"),
            product_key: row.get("product_key"),
            product_name: row.get("product_name"),
            product_description: row.get("product_description"),
            product_config: row.get("product_config"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            vendor_id: row.vendor_id,
            product_key: row.product_key,
            product_name: row.product_name,
            product_description: row.product_description,
            product_config: row.product_config,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

const PRODUCT_COLUMNS: &str = "id, vendor_id, product_key, product_name, product_description, \
     product_config, created_at, updated_at";

/// PostgreSQL implementation of ProductRepository trait
#[derive(Clone)]
pub struct PostgresProductRepository {
    client: PostgresClient,
}

impl PostgresProductRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProductRepository for PostgresProductRepository {
    #[instrument(skip(self))]
    async fn allocate_product_id(&self) -> DomainResult<i64> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_one("SELECT nextval(pg_get_serial_sequence('products', 'id'))", &[])
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.get(0))
    }

    #[instrument(skip(self, input), fields(product_id = input.id, vendor_id = input.vendor_id))]
    async fn create_product(&self, input: CreateProductRepoInput) -> DomainResult<Product> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        let result = conn
            .execute(
                "INSERT INTO products (id, vendor_id, product_key, product_name, product_description, product_config, created_at, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &input.id,
                    &input.vendor_id,
                    &input.product_key,
                    &input.product_name,
                    &input.product_description,
                    &input.product_config,
                    &now,
                    &now,
                ],
            )
            .await;

        if let Err(e) = result {
            // Owning vendor is missing
            if e.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) {
                return Err(DomainError::VendorNotFound(input.vendor_id.to_string()));
            }
            return Err(DomainError::RepositoryError(e.into()));
        }

        debug!(product_id = input.id, "inserted product");

        Ok(Product {
            id: input.id,
            vendor_id: input.vendor_id,
            product_key: input.product_key,
            product_name: input.product_name,
            product_description: input.product_description,
            product_config: input.product_config,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, input), fields(product_id = input.id))]
    async fn update_product(&self, input: UpdateProductRepoInput) -> DomainResult<Product> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE products
                     SET product_name = $1, product_description = $2, product_config = $3, updated_at = $4
                     WHERE id = $5
                     RETURNING {}",
                    PRODUCT_COLUMNS
                ),
                &[
                    &input.product_name,
                    &input.product_description,
                    &input.product_config,
                    &now,
                    &input.id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => Ok(ProductRow::from(&row).into()),
            None => Err(DomainError::ProductNotFound(input.id.to_string())),
        }
    }

    #[instrument(skip(self, input), fields(product_id = input.id))]
    async fn get_product(&self, input: GetProductRepoInput) -> DomainResult<Option<Product>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS),
                &[&input.id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| ProductRow::from(&row).into()))
    }
}
