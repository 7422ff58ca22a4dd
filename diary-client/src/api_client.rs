//! HTTP client for the diary server.
//!
//! Implements every collaborator trait over reqwest with JSON bodies and
//! bearer authentication. Any non-success status becomes
//! [`DiaryError::RemoteCall`] carrying the status and response body; the
//! only exception is a rejected login, which is reported as
//! [`AuthStatus::IncorrectUsernameOrPassword`].
//!
//! Ids and usernames are pushed as single percent-encoded path segments,
//! never spliced into a path string.

use crate::backend::{AuthApi, DiaryApi, EntryApi, SharingApi, UserDirectory};
use crate::config::ClientConfig;
use crate::error::{DiaryError, DiaryResult};
use crate::types::*;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// HTTP implementation of [`DiaryBackend`](crate::backend::DiaryBackend).
pub struct DiaryApiClient {
    client: Client,
    base: Url,
}

impl DiaryApiClient {
    pub fn new(config: ClientConfig) -> DiaryResult<Self> {
        config.validate()?;
        let base = Url::parse(config.base_url())
            .map_err(|e| DiaryError::Config(format!("invalid api_base_url: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(DiaryError::Config(format!(
                "api_base_url cannot carry a path: {}",
                config.api_base_url
            )));
        }
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, base })
    }

    /// Appends `segments` to the base URL, each percent-encoded as one
    /// segment. Empty, `.` and `..` segments are rejected.
    fn url(&self, segments: &[&str]) -> DiaryResult<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(DiaryError::InvalidPathSegment(bad.to_string()));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DiaryError::Config(format!("api_base_url cannot carry a path: {}", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> DiaryResult<RequestBuilder> {
        let url = self.url(segments)?;
        debug!("{method} {}", url.path());
        Ok(self.client.request(method, url))
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &str, segments: &[&str]) -> DiaryResult<T> {
        let resp = self
            .request(Method::GET, segments)?
            .bearer_auth(token)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        token: Option<&str>,
        segments: &[&str],
        body: &impl Serialize,
    ) -> DiaryResult<T> {
        let mut req = self.request(method, segments)?.json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Ok(check(req.send().await?).await?.json().await?)
    }
}

/// Maps a non-success response to `RemoteCall`.
async fn check(resp: Response) -> DiaryResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    debug!("remote call failed with {status}");
    Err(DiaryError::RemoteCall {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl AuthApi for DiaryApiClient {
    async fn register(&self, req: &RegisterRequest) -> DiaryResult<RegisterResponse> {
        self.send_json(Method::POST, None, &["api", "v1", "auth", "register"], req)
            .await
    }

    async fn login(&self, req: &LoginRequest) -> DiaryResult<LoginResponse> {
        let resp = self
            .request(Method::POST, &["api", "v1", "auth", "login"])?
            .json(req)
            .send()
            .await?;

        if resp.status() == StatusCode::UNAUTHORIZED || resp.status() == StatusCode::FORBIDDEN {
            return Ok(LoginResponse {
                auth_status: AuthStatus::IncorrectUsernameOrPassword,
                token: None,
            });
        }

        Ok(check(resp).await?.json().await?)
    }
}

#[async_trait]
impl UserDirectory for DiaryApiClient {
    async fn profile(&self, token: &str) -> DiaryResult<UserProfile> {
        self.get_json(token, &["api", "v1", "users", "me"]).await
    }

    async fn public_key(&self, token: &str, user: &str) -> DiaryResult<String> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Resp {
            public_key: String,
        }
        let data: Resp = self
            .get_json(token, &["api", "v1", "users", user, "public-key"])
            .await?;
        Ok(data.public_key)
    }
}

#[async_trait]
impl DiaryApi for DiaryApiClient {
    async fn list_diaries(&self, token: &str) -> DiaryResult<Vec<DiaryRecord>> {
        self.get_json(token, &["api", "v1", "diaries"]).await
    }
}

#[async_trait]
impl EntryApi for DiaryApiClient {
    async fn list_entries(&self, token: &str, query: &EntryQuery) -> DiaryResult<Vec<ShortDiaryEntry>> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(diary_id) = &query.diary_id {
            params.push(("diaryId", diary_id.clone()));
        }
        if let Some(date) = query.date {
            params.push(("date", date.format("%Y-%m-%d").to_string()));
        }

        let resp = self
            .request(Method::GET, &["api", "v1", "entries"])?
            .query(&params)
            .bearer_auth(token)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn get_entry(&self, token: &str, id: &str) -> DiaryResult<EncryptedDiaryEntry> {
        self.get_json(token, &["api", "v1", "entries", id]).await
    }

    async fn create_entry(
        &self,
        token: &str,
        req: &CreateDiaryEntryRequest,
    ) -> DiaryResult<EncryptedDiaryEntry> {
        self.send_json(Method::POST, Some(token), &["api", "v1", "entries"], req)
            .await
    }

    async fn update_entry(
        &self,
        token: &str,
        id: &str,
        req: &UpdateDiaryEntryRequest,
    ) -> DiaryResult<EncryptedDiaryEntry> {
        self.send_json(Method::PUT, Some(token), &["api", "v1", "entries", id], req)
            .await
    }

    async fn delete_entry(&self, token: &str, id: &str) -> DiaryResult<()> {
        let resp = self
            .request(Method::DELETE, &["api", "v1", "entries", id])?
            .bearer_auth(token)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

#[async_trait]
impl SharingApi for DiaryApiClient {
    async fn share_entry(&self, token: &str, req: &ShareEntryRequest) -> DiaryResult<ShareEntryResponse> {
        self.send_json(Method::POST, Some(token), &["api", "v1", "sharing"], req)
            .await
    }

    async fn list_sharing_tasks(&self, token: &str) -> DiaryResult<Vec<SharingTaskRecord>> {
        self.get_json(token, &["api", "v1", "sharing", "tasks"]).await
    }

    async fn accept_sharing_task(
        &self,
        token: &str,
        diary_id: &str,
        req: &AcceptSharingTaskRequest,
    ) -> DiaryResult<()> {
        let resp = self
            .request(Method::POST, &["api", "v1", "sharing", "tasks", diary_id, "accept"])?
            .bearer_auth(token)
            .json(req)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}
