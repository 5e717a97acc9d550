use crate::domain::{DomainResult, EntityKind, KeyedRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Application domain entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: i64,
    pub app_key: String,
    pub app_name: String,
    pub app_description: String,
    pub app_domain: String,
    pub app_token: String,
    pub report_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl KeyedRecord for Application {
    const KIND: EntityKind = EntityKind::Application;

    fn id(&self) -> i64 {
        self.id
    }

    fn key(&self) -> &str {
        &self.app_key
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateApplicationRepoInput {
    pub id: i64,
    pub app_key: String,
    pub app_name: String,
    pub app_description: String,
    pub app_domain: String,
    pub app_token: String,
    pub report_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateApplicationRepoInput {
    pub id: i64,
    pub app_name: String,
    pub app_description: String,
    pub app_domain: String,
    pub app_token: String,
    pub report_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetApplicationRepoInput {
    pub id: i64,
}

/// Repository trait for application storage operations
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn allocate_application_id(&self) -> DomainResult<i64>;

    async fn create_application(
        &self,
        input: CreateApplicationRepoInput,
    ) -> DomainResult<Application>;

    async fn update_application(
        &self,
        input: UpdateApplicationRepoInput,
    ) -> DomainResult<Application>;

    async fn get_application(
        &self,
        input: GetApplicationRepoInput,
    ) -> DomainResult<Option<Application>>;
}
