use crate::domain::{
    Application, ApplicationRepository, CreateApplicationRepoInput, DomainError, DomainResult,
    GetApplicationRepoInput, UpdateApplicationRepoInput,
};
use crate::postgres::PostgresClient;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_postgres::Row;
use tracing::{debug, instrument};

/// Application row for PostgreSQL storage
#[derive(Debug, Clone)]
pub struct ApplicationRow {
    pub id: i64,
    pub app_key: String,
    pub app_name: String,
    pub app_description: String,
    pub app_domain: String,
    pub app_token: String,
    pub report_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for ApplicationRow {
    fn from(row: &Row) -> Self {
        ApplicationRow {
            id: row.get("id"),
            app_key: row.get("app_key"),
            app_name: row.get("app_name"),
            app_description: row.get("app_description"),
            app_domain: row.get("app_domain"),
            app_token: row.get("app_token"),
            report_url: row.get("report_url"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

impl From<ApplicationRow> for Application {
    fn from(row: ApplicationRow) -> Self {
        Application {
            id: row.id,
            app_key: row.app_key,
            app_name: row.app_name,
            app_description: row.app_description,
            app_domain: row.app_domain,
            app_token: row.app_token,
            report_url: row.report_url,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        }
    }
}

const APPLICATION_COLUMNS: &str = "id, app_key, app_name, app_description, app_domain, \
     app_token, report_url, created_at, updated_at";

/// PostgreSQL implementation of ApplicationRepository trait
#[derive(Clone)]
pub struct PostgresApplicationRepository {
    client: PostgresClient,
}

impl PostgresApplicationRepository {
    pub fn new(client: PostgresClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ApplicationRepository for PostgresApplicationRepository {
    #[instrument(skip(self))]
    async fn allocate_application_id(&self) -> DomainResult<i64> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_one(
                "SELECT nextval(pg_get_serial_sequence('applications', 'id'))",
                &[],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.get(0))
    }

    #[instrument(skip(self, input), fields(application_id = input.id))]
    async fn create_application(
        &self,
        input: CreateApplicationRepoInput,
    ) -> DomainResult<Application> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        conn.execute(
            "INSERT INTO applications (id, app_key, app_name, app_description, app_domain, app_token, report_url, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            &[
                &input.id,
                &input.app_key,
                &input.app_name,
                &input.app_description,
                &input.app_domain,
                &input.app_token,
                &input.report_url,
                &now,
                &now,
            ],
        )
        .await
        .map_err(|e| DomainError::RepositoryError(e.into()))?;

        debug!(application_id = input.id, "inserted application");

        Ok(Application {
            id: input.id,
            app_key: input.app_key,
            app_name: input.app_name,
            app_description: input.app_description,
            app_domain: input.app_domain,
            app_token: input.app_token,
            report_url: input.report_url,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }

    #[instrument(skip(self, input), fields(application_id = input.id))]
    async fn update_application(
        &self,
        input: UpdateApplicationRepoInput,
    ) -> DomainResult<Application> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let now = Utc::now();

        let row = conn
            .query_opt(
                &format!(
                    "UPDATE applications
                     SET app_name = $1, app_description = $2, app_domain = $3,
                         app_token = $4, report_url = $5, updated_at = $6
                     WHERE id = $7
                     RETURNING {}",
                    APPLICATION_COLUMNS
                ),
                &[
                    &input.app_name,
                    &input.app_description,
                    &input.app_domain,
                    &input.app_token,
                    &input.report_url,
                    &now,
                    &input.id,
                ],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        match row {
            Some(row) => Ok(ApplicationRow::from(&row).into()),
            None => Err(DomainError::ApplicationNotFound(input.id.to_string())),
        }
    }

    #[instrument(skip(self, input), fields(application_id = input.id))]
    async fn get_application(
        &self,
        input: GetApplicationRepoInput,
    ) -> DomainResult<Option<Application>> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(DomainError::RepositoryError)?;

        let row = conn
            .query_opt(
                &format!(
                    "SELECT {} FROM applications WHERE id = $1",
                    APPLICATION_COLUMNS
                ),
                &[&input.id],
            )
            .await
            .map_err(|e| DomainError::RepositoryError(e.into()))?;

        Ok(row.map(|row| ApplicationRow::from(&row).into()))
    }
}
