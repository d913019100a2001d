//! Request authentication.
//!
//! Every conversation endpoint requires `Authorization: Bearer <token>`
//! and `X-Org-Slug`. The bearer token is the client's hex auth-key
//! digest; the server stores the SHA-256 of that token and compares
//! digests (see [`pool_types::auth::stored_auth_hash`]). All failure
//! modes collapse to 401 so a caller cannot probe which slugs exist with
//! bad credentials.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use pool_types::auth::stored_auth_hash;

use crate::error::ApiError;
use crate::storage::{OrgRecord, SqliteStorage};

const ORG_SLUG_HEADER: &str = "x-org-slug";

/// Authenticate a request against the org named in its headers.
pub async fn authenticate(
    storage: &SqliteStorage,
    headers: &HeaderMap,
) -> Result<OrgRecord, ApiError> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    let slug = headers.get(ORG_SLUG_HEADER).and_then(|v| v.to_str().ok());

    let (Some(bearer), Some(slug)) = (bearer, slug) else {
        return Err(ApiError::Unauthorized(
            "Missing Authorization or X-Org-Slug header".into(),
        ));
    };

    let org = storage
        .get_org_by_slug(slug)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Organization not found".into()))?;

    if stored_auth_hash(bearer) != org.auth_key_hash {
        tracing::debug!(slug, "bearer digest mismatch");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    Ok(org)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    async fn storage_with_org(bearer: &str) -> SqliteStorage {
        let storage = SqliteStorage::in_memory().await.unwrap();
        storage
            .create_org("Team", "team", &[1u8; 16], &stored_auth_hash(bearer))
            .await
            .unwrap();
        storage
    }

    fn headers(bearer: Option<&str>, slug: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(bearer) = bearer {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {bearer}")).unwrap(),
            );
        }
        if let Some(slug) = slug {
            headers.insert(ORG_SLUG_HEADER, HeaderValue::from_str(slug).unwrap());
        }
        headers
    }

    #[tokio::test]
    async fn valid_bearer_authenticates() {
        let storage = storage_with_org("the-token").await;
        let org = authenticate(&storage, &headers(Some("the-token"), Some("team")))
            .await
            .unwrap();
        assert_eq!(org.slug, "team");
    }

    #[tokio::test]
    async fn missing_headers_are_unauthorized() {
        let storage = storage_with_org("the-token").await;
        for h in [
            headers(None, Some("team")),
            headers(Some("the-token"), None),
            headers(None, None),
        ] {
            let err = authenticate(&storage, &h).await.unwrap_err();
            assert!(matches!(err, ApiError::Unauthorized(_)));
        }
    }

    #[tokio::test]
    async fn wrong_bearer_is_unauthorized() {
        let storage = storage_with_org("the-token").await;
        let err = authenticate(&storage, &headers(Some("wrong"), Some("team")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn storing_the_bearer_itself_would_not_authenticate() {
        // The scheme stores a digest of the bearer. An org row that held
        // the raw bearer (the legacy mixed scheme) must fail closed.
        let storage = SqliteStorage::in_memory().await.unwrap();
        storage
            .create_org("Team", "team", &[1u8; 16], "the-token")
            .await
            .unwrap();
        let err = authenticate(&storage, &headers(Some("the-token"), Some("team")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn unknown_org_is_unauthorized() {
        let storage = storage_with_org("the-token").await;
        let err = authenticate(&storage, &headers(Some("the-token"), Some("ghost")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }
}
