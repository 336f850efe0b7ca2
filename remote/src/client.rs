use deckchat_common::{
    GenerateRequest, LoginRequest, LoginResponse, PresentationRecord, ServiceResponse,
    UpdateRequest,
};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{RemoteError, Result};

/// JSON client for the slide generation service.
///
/// Holds a cookie store so a session opened with [`login`](Self::login) is
/// carried on the generate/update calls that follow.
#[derive(Debug, Clone)]
pub struct SlideServiceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl SlideServiceClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    /// `timeout` of `None` waits on the service indefinitely.
    pub fn with_timeout(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `POST /chat`
    pub async fn generate(&self, request: &GenerateRequest) -> Result<ServiceResponse> {
        self.post_json("chat", request).await
    }

    /// `POST /update`
    pub async fn update(&self, request: &UpdateRequest) -> Result<ServiceResponse> {
        self.post_json("update", request).await
    }

    /// `GET /load-presentation/<id>`
    pub async fn load_presentation(&self, id: u64) -> Result<PresentationRecord> {
        let url = self.endpoint(&format!("load-presentation/{id}"))?;
        debug!("GET {url}");
        let resp = self.http.get(url).send().await?;
        Self::decode(resp).await
    }

    /// `POST /login`. Returns the username the service acknowledged.
    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let url = self.endpoint("login")?;
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();
        // Rejected logins come back as 4xx with a JSON error body.
        let login: LoginResponse = resp.json().await.unwrap_or_default();

        if !status.is_success() || !login.success {
            let message = login
                .error
                .unwrap_or_else(|| format!("service answered {status}"));
            warn!("login for {username} rejected: {message}");
            return Err(RemoteError::Login { message });
        }

        Ok(login.username.unwrap_or_else(|| username.to_string()))
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!("POST {url}");
        let resp = self.http.post(url).json(body).send().await?;
        Self::decode(resp).await
    }

    async fn decode<R: DeserializeOwned>(resp: reqwest::Response) -> Result<R> {
        let status = resp.status();
        if !status.is_success() {
            warn!("service answered {status} for {}", resp.url());
            return Err(RemoteError::Status {
                status: status.as_u16(),
            });
        }
        Ok(resp.json::<R>().await?)
    }
}
