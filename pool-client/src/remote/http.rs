//! HTTP implementation of the remote store contract.

use super::{Credentials, RemoteError, RemoteStore};
use async_trait::async_trait;
use pool_types::{
    encoding, CreateOrgRequest, ErrorBody, ImportConversationRequest, ImportOutcome, OrgSummary,
    SaltResponse, SyncPage,
};
use reqwest::{Response, StatusCode};
use std::time::Duration;

/// JSON-over-HTTP client for the chatpool server.
pub struct HttpRemote {
    base_url: String,
    http: reqwest::Client,
}

impl HttpRemote {
    /// Connect to a server at `base_url` (scheme + host, no trailing
    /// slash required).
    pub fn new(base_url: &str) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: Response,
    ) -> Result<T, RemoteError> {
        let status = response.status().as_u16();
        response.json::<T>().await.map_err(|e| RemoteError::UnexpectedStatus {
            status,
            body: format!("undecodable body: {e}"),
        })
    }

    /// Pull the `{"error": ...}` body off a failed response, falling back
    /// to the status reason.
    async fn error_text(response: Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
        }
    }
}

#[async_trait]
impl RemoteStore for HttpRemote {
    async fn fetch_salt(&self, slug: &str) -> Result<Vec<u8>, RemoteError> {
        let response = self
            .http
            .get(self.url(&format!("/org/{slug}/salt")))
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let body: SaltResponse = Self::parse_json(response).await?;
                encoding::from_base64(&body.salt)
                    .map_err(|e| RemoteError::Validation(format!("salt is not base64: {e}")))
            }
            StatusCode::NOT_FOUND => Err(RemoteError::OrgNotFound),
            status => Err(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
                body: Self::error_text(response).await,
            }),
        }
    }

    async fn create_org(&self, req: &CreateOrgRequest) -> Result<OrgSummary, RemoteError> {
        let response = self
            .http
            .post(self.url("/org"))
            .json(req)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::CREATED => Self::parse_json(response).await,
            StatusCode::CONFLICT => Err(RemoteError::SlugTaken),
            StatusCode::BAD_REQUEST => {
                Err(RemoteError::Validation(Self::error_text(response).await))
            }
            status => Err(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
                body: Self::error_text(response).await,
            }),
        }
    }

    async fn push_conversation(
        &self,
        creds: &Credentials,
        req: &ImportConversationRequest,
    ) -> Result<ImportOutcome, RemoteError> {
        let response = self
            .http
            .post(self.url("/conversations"))
            .bearer_auth(&creds.bearer)
            .header("X-Org-Slug", &creds.org_slug)
            .json(req)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::CREATED => {
                #[derive(serde::Deserialize)]
                struct Created {
                    id: String,
                }
                let body: Created = Self::parse_json(response).await?;
                Ok(ImportOutcome::Created(body.id))
            }
            StatusCode::OK => Ok(ImportOutcome::Deduplicated),
            StatusCode::UNAUTHORIZED => Err(RemoteError::Auth(Self::error_text(response).await)),
            StatusCode::BAD_REQUEST => {
                Err(RemoteError::Validation(Self::error_text(response).await))
            }
            status => Err(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
                body: Self::error_text(response).await,
            }),
        }
    }

    async fn fetch_page(
        &self,
        creds: &Credentials,
        after: Option<&str>,
        limit: u32,
    ) -> Result<SyncPage, RemoteError> {
        let mut request = self
            .http
            .get(self.url("/conversations"))
            .bearer_auth(&creds.bearer)
            .header("X-Org-Slug", &creds.org_slug)
            .query(&[("limit", limit.to_string())]);
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => Self::parse_json(response).await,
            StatusCode::UNAUTHORIZED => Err(RemoteError::Auth(Self::error_text(response).await)),
            status => Err(RemoteError::UnexpectedStatus {
                status: status.as_u16(),
                body: Self::error_text(response).await,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let remote = HttpRemote::new("http://localhost:8080/").unwrap();
        assert_eq!(remote.url("/org"), "http://localhost:8080/org");
    }
}
