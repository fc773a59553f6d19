use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::portal::domain::{
    AdminResponse, IntakeForm, NewAdminResponse, NewSubmission, Submission, SubmissionId,
    SubmissionRecord, UserId,
};
use crate::portal::session::{
    AuthEvent, DirectoryError, Identity, IdentityDirectory, SessionContext, SessionToken,
};
use crate::portal::status::SubmissionStatus;
use crate::portal::store::{ListQuery, StoreError, SubmissionStore};
use crate::portal::{portal_router, FeedbackService};

pub(super) const ADMIN_TOKEN: &str = "token-admin";
pub(super) const CITIZEN_TOKEN: &str = "token-citizen";
pub(super) const ADMIN_ID: &str = "admin-1";
pub(super) const CITIZEN_ID: &str = "citizen-7";

pub(super) fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn streetlight_form(anonymous: bool) -> IntakeForm {
    IntakeForm {
        title: "Broken streetlight".to_string(),
        description: "Light out for 2 weeks".to_string(),
        category: "infrastructure".to_string(),
        is_anonymous: anonymous,
    }
}

pub(super) fn clinic_form() -> IntakeForm {
    IntakeForm {
        title: "Clinic hours".to_string(),
        description: "Weekend opening hours would help shift workers".to_string(),
        category: "health".to_string(),
        is_anonymous: false,
    }
}

#[derive(Default)]
struct MemoryTables {
    submissions: Vec<Submission>,
    responses: Vec<AdminResponse>,
    ticks: i64,
}

impl MemoryTables {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        epoch() + Duration::minutes(self.ticks)
    }
}

/// Store double with deterministic, strictly increasing timestamps. Uses the
/// default two-step `apply_triage`.
#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    tables: Arc<Mutex<MemoryTables>>,
}

impl MemoryStore {
    pub(super) fn status_of(&self, id: &SubmissionId) -> Option<SubmissionStatus> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        tables
            .submissions
            .iter()
            .find(|submission| &submission.id == id)
            .map(|submission| submission.status)
    }

    pub(super) fn response_count(&self) -> usize {
        self.tables
            .lock()
            .expect("store mutex poisoned")
            .responses
            .len()
    }
}

#[async_trait::async_trait]
impl SubmissionStore for MemoryStore {
    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let created_at = tables.next_timestamp();
        let stored = Submission {
            id: SubmissionId(format!("sub-{:04}", tables.submissions.len() + 1)),
            title: submission.title,
            description: submission.description,
            category: submission.category,
            status: submission.status,
            is_anonymous: submission.is_anonymous,
            user_id: submission.user_id,
            created_at,
        };
        tables.submissions.push(stored.clone());
        Ok(stored)
    }

    async fn get_submission_by_id(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        let Some(submission) = tables.submissions.iter().find(|row| &row.id == id) else {
            return Ok(None);
        };
        let responses = tables
            .responses
            .iter()
            .filter(|response| &response.submission_id == id)
            .cloned()
            .collect();
        Ok(Some(SubmissionRecord {
            submission: submission.clone(),
            responses,
        }))
    }

    async fn list_submissions(&self, query: ListQuery) -> Result<Vec<Submission>, StoreError> {
        let tables = self.tables.lock().expect("store mutex poisoned");
        let mut sorted: Vec<&Submission> = tables.submissions.iter().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(query.window(sorted))
    }

    async fn update_submission_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let row = tables
            .submissions
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or(StoreError::NotFound)?;
        row.status = status;
        Ok(())
    }

    async fn insert_admin_response(
        &self,
        response: NewAdminResponse,
    ) -> Result<AdminResponse, StoreError> {
        let mut tables = self.tables.lock().expect("store mutex poisoned");
        let created_at = tables.next_timestamp();
        let stored = AdminResponse {
            submission_id: response.submission_id,
            response_text: response.response_text,
            admin_id: response.admin_id,
            created_at,
        };
        tables.responses.push(stored.clone());
        Ok(stored)
    }
}

/// Accepts every write except admin responses.
#[derive(Default, Clone)]
pub(super) struct ResponseRejectingStore {
    pub(super) inner: MemoryStore,
}

#[async_trait::async_trait]
impl SubmissionStore for ResponseRejectingStore {
    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        self.inner.insert_submission(submission).await
    }

    async fn get_submission_by_id(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, StoreError> {
        self.inner.get_submission_by_id(id).await
    }

    async fn list_submissions(&self, query: ListQuery) -> Result<Vec<Submission>, StoreError> {
        self.inner.list_submissions(query).await
    }

    async fn update_submission_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        self.inner.update_submission_status(id, status).await
    }

    async fn insert_admin_response(
        &self,
        _response: NewAdminResponse,
    ) -> Result<AdminResponse, StoreError> {
        Err(StoreError::Unavailable("admin_responses offline".to_string()))
    }
}

/// Yields after every read so concurrent callers both observe the same row.
/// Status writes are recorded in the order they land.
#[derive(Default, Clone)]
pub(super) struct StaleReadStore {
    pub(super) inner: MemoryStore,
    writes: Arc<Mutex<Vec<SubmissionStatus>>>,
}

impl StaleReadStore {
    pub(super) fn status_writes(&self) -> Vec<SubmissionStatus> {
        self.writes.lock().expect("write log mutex poisoned").clone()
    }
}

#[async_trait::async_trait]
impl SubmissionStore for StaleReadStore {
    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        self.inner.insert_submission(submission).await
    }

    async fn get_submission_by_id(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, StoreError> {
        let record = self.inner.get_submission_by_id(id).await;
        tokio::task::yield_now().await;
        record
    }

    async fn list_submissions(&self, query: ListQuery) -> Result<Vec<Submission>, StoreError> {
        self.inner.list_submissions(query).await
    }

    async fn update_submission_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        self.inner.update_submission_status(id, status).await?;
        self.writes
            .lock()
            .expect("write log mutex poisoned")
            .push(status);
        Ok(())
    }

    async fn insert_admin_response(
        &self,
        response: NewAdminResponse,
    ) -> Result<AdminResponse, StoreError> {
        self.inner.insert_admin_response(response).await
    }
}

pub(super) struct UnavailableStore;

#[async_trait::async_trait]
impl SubmissionStore for UnavailableStore {
    async fn insert_submission(&self, _submission: NewSubmission) -> Result<Submission, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn get_submission_by_id(
        &self,
        _id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn list_submissions(&self, _query: ListQuery) -> Result<Vec<Submission>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn update_submission_status(
        &self,
        _id: &SubmissionId,
        _status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn insert_admin_response(
        &self,
        _response: NewAdminResponse,
    ) -> Result<AdminResponse, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) struct MemoryDirectory {
    sessions: Mutex<HashMap<SessionToken, Identity>>,
    administrators: Mutex<HashSet<UserId>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            sessions: Mutex::new(HashMap::new()),
            administrators: Mutex::new(HashSet::new()),
            events,
        }
    }
}

impl MemoryDirectory {
    /// Directory with one administrator and one citizen already signed in.
    pub(super) fn seeded() -> Self {
        let directory = Self::default();
        directory.sign_in(ADMIN_TOKEN, ADMIN_ID);
        directory.sign_in(CITIZEN_TOKEN, CITIZEN_ID);
        directory.grant_admin(ADMIN_ID);
        directory
    }

    pub(super) fn sign_in(&self, token: &str, user: &str) -> SessionContext {
        let token = SessionToken(token.to_string());
        let identity = Identity {
            user_id: UserId(user.to_string()),
        };
        self.sessions
            .lock()
            .expect("directory mutex poisoned")
            .insert(token.clone(), identity.clone());
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        SessionContext::authenticated(token, identity)
    }

    pub(super) fn grant_admin(&self, user: &str) {
        self.administrators
            .lock()
            .expect("directory mutex poisoned")
            .insert(UserId(user.to_string()));
    }

    pub(super) fn revoke_admin(&self, user: &str) {
        self.administrators
            .lock()
            .expect("directory mutex poisoned")
            .remove(&UserId(user.to_string()));
    }
}

#[async_trait::async_trait]
impl IdentityDirectory for MemoryDirectory {
    async fn current_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Identity>, DirectoryError> {
        let sessions = self.sessions.lock().expect("directory mutex poisoned");
        Ok(sessions.get(token).cloned())
    }

    async fn is_administrator(&self, identity: &Identity) -> Result<bool, DirectoryError> {
        let administrators = self.administrators.lock().expect("directory mutex poisoned");
        Ok(administrators.contains(&identity.user_id))
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), DirectoryError> {
        let removed = self
            .sessions
            .lock()
            .expect("directory mutex poisoned")
            .remove(token);
        if let Some(identity) = removed {
            let _ = self.events.send(AuthEvent::SignedOut(identity));
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

pub(super) type MemoryService = FeedbackService<MemoryStore, MemoryDirectory>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryStore>, Arc<MemoryDirectory>) {
    let store = Arc::new(MemoryStore::default());
    let directory = Arc::new(MemoryDirectory::seeded());
    let service = FeedbackService::new(store.clone(), directory.clone());
    (service, store, directory)
}

pub(super) fn admin_session() -> SessionContext {
    SessionContext::authenticated(
        SessionToken(ADMIN_TOKEN.to_string()),
        Identity {
            user_id: UserId(ADMIN_ID.to_string()),
        },
    )
}

pub(super) fn citizen_session() -> SessionContext {
    SessionContext::authenticated(
        SessionToken(CITIZEN_TOKEN.to_string()),
        Identity {
            user_id: UserId(CITIZEN_ID.to_string()),
        },
    )
}

pub(super) fn portal_router_with_service(service: MemoryService) -> axum::Router {
    portal_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
