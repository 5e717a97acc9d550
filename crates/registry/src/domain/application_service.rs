use crate::domain::IdentityValidator;
use common::crypto::KeyCodec;
use common::domain::{
    Application, ApplicationRepository, CreateApplicationRepoInput, DomainResult,
    GetApplicationRepoInput, UpdateApplicationRepoInput,
};
use garde::Validate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Validate)]
pub struct SaveApplicationRequest {
    #[garde(skip)]
    pub id: Option<i64>,
    #[garde(length(min = 1))]
    pub app_name: String,
    #[garde(skip)]
    pub app_description: String,
    #[garde(skip)]
    pub app_domain: String,
    #[garde(skip)]
    pub app_token: String,
    #[garde(skip)]
    pub report_url: String,
}

/// Domain service for application bookkeeping and application key validation
pub struct ApplicationService {
    application_repository: Arc<dyn ApplicationRepository>,
    codec: Arc<KeyCodec>,
    validator: IdentityValidator,
}

impl ApplicationService {
    pub fn new(
        application_repository: Arc<dyn ApplicationRepository>,
        codec: Arc<KeyCodec>,
    ) -> Self {
        Self {
            application_repository,
            validator: IdentityValidator::new(codec.clone()),
            codec,
        }
    }

    #[instrument(skip(self, request), fields(application_id = ?request.id, app_name = %request.app_name))]
    pub async fn save_application(
        &self,
        request: SaveApplicationRequest,
    ) -> DomainResult<Application> {
        common::garde::validate_struct(&request)?;

        if let Some(id) = request.id {
            debug!(application_id = id, "updating application");
            return self
                .application_repository
                .update_application(UpdateApplicationRepoInput {
                    id,
                    app_name: request.app_name,
                    app_description: request.app_description,
                    app_domain: request.app_domain,
                    app_token: request.app_token,
                    report_url: request.report_url,
                })
                .await;
        }

        let id = self.application_repository.allocate_application_id().await?;
        let app_key = self.codec.encode(id)?;

        let application = self
            .application_repository
            .create_application(CreateApplicationRepoInput {
                id,
                app_key,
                app_name: request.app_name,
                app_description: request.app_description,
                app_domain: request.app_domain,
                app_token: request.app_token,
                report_url: request.report_url,
            })
            .await?;

        info!(application_id = application.id, "application created");
        Ok(application)
    }

    #[instrument(skip_all)]
    pub async fn validate_application(&self, app_key: &str) -> DomainResult<Application> {
        let applications = &self.application_repository;
        self.validator
            .validate(app_key, |id| {
                applications.get_application(GetApplicationRepoInput { id })
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::domain::{DomainError, MockApplicationRepository};

    fn codec() -> Arc<KeyCodec> {
        Arc::new(KeyCodec::new(&[4u8; 32]).unwrap())
    }

    fn application_from(input: CreateApplicationRepoInput) -> Application {
        Application {
            id: input.id,
            app_key: input.app_key,
            app_name: input.app_name,
            app_description: input.app_description,
            app_domain: input.app_domain,
            app_token: input.app_token,
            report_url: input.report_url,
            created_at: None,
            updated_at: None,
        }
    }

    fn request(id: Option<i64>) -> SaveApplicationRequest {
        SaveApplicationRequest {
            id,
            app_name: "Dashboard".to_string(),
            app_description: String::new(),
            app_domain: "dashboard.example.com".to_string(),
            app_token: "token".to_string(),
            report_url: "https://dashboard.example.com/report".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_application_creates_and_validates() {
        let codec = codec();
        let mut mock_repo = MockApplicationRepository::new();

        mock_repo
            .expect_allocate_application_id()
            .times(1)
            .return_once(|| Ok(2));
        mock_repo
            .expect_create_application()
            .times(1)
            .returning(|input| Ok(application_from(input)));

        let service = ApplicationService::new(Arc::new(mock_repo), codec.clone());
        let application = service.save_application(request(None)).await.unwrap();

        assert_eq!(application.id, 2);
        assert_eq!(codec.decode(&application.app_key).unwrap(), 2);
    }

    #[tokio::test]
    async fn test_validate_application_success() {
        let codec = codec();
        let app_key = codec.encode(2).unwrap();
        let stored = application_from(CreateApplicationRepoInput {
            id: 2,
            app_key: app_key.clone(),
            app_name: "Dashboard".to_string(),
            app_description: String::new(),
            app_domain: String::new(),
            app_token: String::new(),
            report_url: String::new(),
        });
        let mut mock_repo = MockApplicationRepository::new();

        mock_repo
            .expect_get_application()
            .withf(|input: &GetApplicationRepoInput| input.id == 2)
            .times(1)
            .return_once(move |_| Ok(Some(stored)));

        let service = ApplicationService::new(Arc::new(mock_repo), codec);
        let application = service.validate_application(&app_key).await.unwrap();

        assert_eq!(application.app_name, "Dashboard");
    }

    #[tokio::test]
    async fn test_save_application_update_not_found() {
        let mut mock_repo = MockApplicationRepository::new();

        mock_repo
            .expect_update_application()
            .times(1)
            .return_once(|input| Err(DomainError::ApplicationNotFound(input.id.to_string())));

        let service = ApplicationService::new(Arc::new(mock_repo), codec());
        let result = service.save_application(request(Some(40))).await;

        assert!(matches!(result, Err(DomainError::ApplicationNotFound(_))));
    }
}
