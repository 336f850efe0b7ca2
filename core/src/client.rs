use anyhow::Result;
use async_trait::async_trait;
use deckchat_common::{GenerateRequest, ServiceResponse, UpdateRequest};
use deckchat_remote::SlideServiceClient;
use tracing::info;
use url::Url;

use crate::config::{password_from_env, Config};

/// The remote generation/edit service as seen by the session.
///
/// Any `Err` is a transport failure. A response carrying an `error` field is
/// still `Ok` here; the session decides what it means.
#[async_trait]
pub trait SlideService: Send + Sync {
    async fn generate(&self, request: GenerateRequest) -> Result<ServiceResponse>;

    async fn update(&self, request: UpdateRequest) -> Result<ServiceResponse>;

    async fn load_presentation(&self, id: u64) -> Result<ServiceResponse>;

    /// Base against which relative image URLs in slides are resolved.
    fn base_url(&self) -> Option<&Url> {
        None
    }
}

/// Adapter to wrap SlideServiceClient into SlideService
pub struct HttpSlideService {
    inner: SlideServiceClient,
}

impl HttpSlideService {
    pub fn new(inner: SlideServiceClient) -> Self {
        Self { inner }
    }

    /// Build the client from `config` and log in when a username is
    /// configured and `DECKCHAT_PASSWORD` is set.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client =
            SlideServiceClient::with_timeout(&config.server_url, config.request_timeout())?;
        if let (Some(user), Some(password)) = (config.username.as_deref(), password_from_env()) {
            let who = client.login(user, &password).await?;
            info!("logged in as {who}");
        }
        Ok(Self::new(client))
    }
}

#[async_trait]
impl SlideService for HttpSlideService {
    async fn generate(&self, request: GenerateRequest) -> Result<ServiceResponse> {
        Ok(self.inner.generate(&request).await?)
    }

    async fn update(&self, request: UpdateRequest) -> Result<ServiceResponse> {
        Ok(self.inner.update(&request).await?)
    }

    async fn load_presentation(&self, id: u64) -> Result<ServiceResponse> {
        Ok(self.inner.load_presentation(id).await?.into())
    }

    fn base_url(&self) -> Option<&Url> {
        Some(self.inner.base_url())
    }
}
