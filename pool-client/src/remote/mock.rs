//! Mock remote store for testing.
//!
//! Allows queueing pages and outcomes and capturing requests for
//! verification, without a network.

use super::{Credentials, RemoteError, RemoteStore};
use async_trait::async_trait;
use pool_types::{CreateOrgRequest, ImportConversationRequest, ImportOutcome, OrgSummary, SyncPage};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Mock remote store for testing.
#[derive(Debug, Default, Clone)]
pub struct MockRemote {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    salts: HashMap<String, Vec<u8>>,
    created_orgs: Vec<CreateOrgRequest>,
    pages: VecDeque<SyncPage>,
    page_requests: Vec<(Option<String>, u32)>,
    pushed: Vec<ImportConversationRequest>,
    push_outcomes: VecDeque<ImportOutcome>,
    expected_bearer: Option<String>,
    fail_next_fetch: Option<String>,
}

impl MockRemote {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a salt so `fetch_salt(slug)` succeeds.
    pub fn set_salt(&self, slug: &str, salt: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .salts
            .insert(slug.to_string(), salt.to_vec());
    }

    /// Queue a page to be returned by the next `fetch_page` call. When
    /// the queue runs dry an empty caught-up page is returned.
    pub fn queue_page(&self, page: SyncPage) {
        self.inner.lock().unwrap().pages.push_back(page);
    }

    /// Queue the outcome for the next `push_conversation` call.
    pub fn queue_push_outcome(&self, outcome: ImportOutcome) {
        self.inner.lock().unwrap().push_outcomes.push_back(outcome);
    }

    /// Reject any request whose bearer differs from this one.
    pub fn require_bearer(&self, bearer: &str) {
        self.inner.lock().unwrap().expected_bearer = Some(bearer.to_string());
    }

    /// Cause the next `fetch_page` to fail with a transport error.
    pub fn fail_next_fetch(&self, message: &str) {
        self.inner.lock().unwrap().fail_next_fetch = Some(message.to_string());
    }

    /// The `(after, limit)` pairs of every `fetch_page` call so far.
    pub fn page_requests(&self) -> Vec<(Option<String>, u32)> {
        self.inner.lock().unwrap().page_requests.clone()
    }

    /// Every conversation pushed so far.
    pub fn pushed(&self) -> Vec<ImportConversationRequest> {
        self.inner.lock().unwrap().pushed.clone()
    }

    /// Every org created so far.
    pub fn created_orgs(&self) -> Vec<CreateOrgRequest> {
        self.inner.lock().unwrap().created_orgs.clone()
    }

    fn check_bearer(inner: &Inner, creds: &Credentials) -> Result<(), RemoteError> {
        if let Some(expected) = &inner.expected_bearer {
            if expected != &creds.bearer {
                return Err(RemoteError::Auth("Invalid credentials".into()));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn fetch_salt(&self, slug: &str) -> Result<Vec<u8>, RemoteError> {
        self.inner
            .lock()
            .unwrap()
            .salts
            .get(slug)
            .cloned()
            .ok_or(RemoteError::OrgNotFound)
    }

    async fn create_org(&self, req: &CreateOrgRequest) -> Result<OrgSummary, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        if inner.salts.contains_key(&req.slug) {
            return Err(RemoteError::SlugTaken);
        }
        inner
            .salts
            .insert(req.slug.clone(), pool_types::encoding::from_base64(&req.salt).unwrap_or_default());
        inner.created_orgs.push(req.clone());
        Ok(OrgSummary {
            id: uuid::Uuid::new_v4().to_string(),
            name: req.name.clone(),
            slug: req.slug.clone(),
            created_at: "2025-01-01T00:00:00Z".into(),
        })
    }

    async fn push_conversation(
        &self,
        creds: &Credentials,
        req: &ImportConversationRequest,
    ) -> Result<ImportOutcome, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_bearer(&inner, creds)?;
        inner.pushed.push(req.clone());
        Ok(inner
            .push_outcomes
            .pop_front()
            .unwrap_or_else(|| ImportOutcome::Created(uuid::Uuid::new_v4().to_string())))
    }

    async fn fetch_page(
        &self,
        creds: &Credentials,
        after: Option<&str>,
        limit: u32,
    ) -> Result<SyncPage, RemoteError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(message) = inner.fail_next_fetch.take() {
            return Err(RemoteError::Transport(message));
        }
        Self::check_bearer(&inner, creds)?;
        inner
            .page_requests
            .push((after.map(str::to_string), limit));
        Ok(inner.pages.pop_front().unwrap_or(SyncPage {
            conversations: Vec::new(),
            has_more: false,
        }))
    }
}
