use chrono::{DateTime, Duration, Utc};
use civic_feedback::config::PortalConfig;
use civic_feedback::portal::{
    AdminResponse, AuthEvent, DirectoryError, Identity, IdentityDirectory, ListQuery,
    NewAdminResponse, NewSubmission, SessionContext, SessionToken, StoreError, Submission,
    SubmissionId, SubmissionRecord, SubmissionStatus, SubmissionStore, TriageReceipt, TriageWrite,
    TriageWriteError, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

const AUTH_EVENT_CAPACITY: usize = 64;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Tables {
    submissions: HashMap<SubmissionId, Submission>,
    responses: Vec<AdminResponse>,
    last_stamp: Option<DateTime<Utc>>,
}

impl Tables {
    /// Wall clock, nudged forward so no two rows share a creation time.
    fn stamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_stamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_stamp = Some(stamp);
        stamp
    }

    fn record_response(&mut self, response: NewAdminResponse) -> AdminResponse {
        let stored = AdminResponse {
            submission_id: response.submission_id,
            response_text: response.response_text,
            admin_id: response.admin_id,
            created_at: self.stamp(),
        };
        self.responses.push(stored.clone());
        stored
    }
}

/// Process-local submission store. Triage writes land under a single lock.
#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemorySubmissionStore {
    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("submission store mutex poisoned".to_string()))
    }
}

#[async_trait::async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn insert_submission(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let mut tables = self.tables()?;
        let id = SubmissionId(Uuid::new_v4().to_string());
        if tables.submissions.contains_key(&id) {
            return Err(StoreError::Conflict);
        }

        let stored = Submission {
            id: id.clone(),
            title: submission.title,
            description: submission.description,
            category: submission.category,
            status: submission.status,
            is_anonymous: submission.is_anonymous,
            user_id: submission.user_id,
            created_at: tables.stamp(),
        };
        tables.submissions.insert(id, stored.clone());
        Ok(stored)
    }

    async fn get_submission_by_id(
        &self,
        id: &SubmissionId,
    ) -> Result<Option<SubmissionRecord>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.submissions.get(id).map(|submission| SubmissionRecord {
            submission: submission.clone(),
            responses: tables
                .responses
                .iter()
                .filter(|response| &response.submission_id == id)
                .cloned()
                .collect(),
        }))
    }

    async fn list_submissions(&self, query: ListQuery) -> Result<Vec<Submission>, StoreError> {
        let tables = self.tables()?;
        let mut sorted: Vec<&Submission> = tables.submissions.values().collect();
        sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(query.window(sorted))
    }

    async fn update_submission_status(
        &self,
        id: &SubmissionId,
        status: SubmissionStatus,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables()?;
        let row = tables.submissions.get_mut(id).ok_or(StoreError::NotFound)?;
        row.status = status;
        Ok(())
    }

    async fn insert_admin_response(
        &self,
        response: NewAdminResponse,
    ) -> Result<AdminResponse, StoreError> {
        let mut tables = self.tables()?;
        if !tables.submissions.contains_key(&response.submission_id) {
            return Err(StoreError::NotFound);
        }
        Ok(tables.record_response(response))
    }

    async fn apply_triage(&self, write: TriageWrite) -> Result<TriageReceipt, TriageWriteError> {
        let mut tables = self.tables().map_err(TriageWriteError::StatusUpdate)?;
        let row = tables
            .submissions
            .get_mut(&write.submission_id)
            .ok_or(TriageWriteError::StatusUpdate(StoreError::NotFound))?;
        row.status = write.status;

        let response = write
            .response
            .map(|response| tables.record_response(response));
        Ok(TriageReceipt {
            status: write.status,
            response,
        })
    }
}

/// Token-to-identity table plus role assignments, seeded from configuration.
pub(crate) struct InMemoryIdentityDirectory {
    sessions: RwLock<HashMap<SessionToken, Identity>>,
    administrators: RwLock<HashSet<UserId>>,
    events: broadcast::Sender<AuthEvent>,
}

impl Default for InMemoryIdentityDirectory {
    fn default() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            sessions: RwLock::new(HashMap::new()),
            administrators: RwLock::new(HashSet::new()),
            events,
        }
    }
}

impl InMemoryIdentityDirectory {
    pub(crate) fn from_config(config: &PortalConfig) -> Result<Self, DirectoryError> {
        let directory = Self::default();
        for user_id in &config.administrators {
            directory.grant_admin(user_id)?;
        }
        for (token, user_id) in &config.seed_sessions {
            directory.sign_in(token, user_id)?;
        }
        Ok(directory)
    }

    pub(crate) fn sign_in(&self, token: &str, user_id: &str) -> Result<SessionContext, DirectoryError> {
        let token = SessionToken(token.to_string());
        let identity = Identity {
            user_id: UserId(user_id.to_string()),
        };
        self.sessions
            .write()
            .map_err(|_| poisoned("sessions"))?
            .insert(token.clone(), identity.clone());
        // No receivers is fine.
        let _ = self.events.send(AuthEvent::SignedIn(identity.clone()));
        Ok(SessionContext::authenticated(token, identity))
    }

    pub(crate) fn grant_admin(&self, user_id: &str) -> Result<(), DirectoryError> {
        self.administrators
            .write()
            .map_err(|_| poisoned("administrators"))?
            .insert(UserId(user_id.to_string()));
        Ok(())
    }

    pub(crate) fn administrator_count(&self) -> usize {
        self.administrators
            .read()
            .map(|administrators| administrators.len())
            .unwrap_or_default()
    }
}

fn poisoned(table: &str) -> DirectoryError {
    DirectoryError::Unavailable(format!("{table} lock poisoned"))
}

#[async_trait::async_trait]
impl IdentityDirectory for InMemoryIdentityDirectory {
    async fn current_session(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Identity>, DirectoryError> {
        let sessions = self.sessions.read().map_err(|_| poisoned("sessions"))?;
        Ok(sessions.get(token).cloned())
    }

    async fn is_administrator(&self, identity: &Identity) -> Result<bool, DirectoryError> {
        let administrators = self
            .administrators
            .read()
            .map_err(|_| poisoned("administrators"))?;
        Ok(administrators.contains(&identity.user_id))
    }

    async fn sign_out(&self, token: &SessionToken) -> Result<(), DirectoryError> {
        let removed = self
            .sessions
            .write()
            .map_err(|_| poisoned("sessions"))?
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

#[cfg(test)]
mod tests {
    use super::*;
    use civic_feedback::portal::SubmissionCategory;

    fn new_submission(title: &str) -> NewSubmission {
        NewSubmission {
            title: title.to_string(),
            description: "Pothole near the school crossing".to_string(),
            category: SubmissionCategory::Infrastructure,
            status: SubmissionStatus::Pending,
            is_anonymous: false,
            user_id: Some(UserId("citizen-1".to_string())),
        }
    }

    #[tokio::test]
    async fn store_assigns_unique_ids_and_increasing_timestamps() {
        let store = InMemorySubmissionStore::default();
        let first = store
            .insert_submission(new_submission("First"))
            .await
            .expect("insert");
        let second = store
            .insert_submission(new_submission("Second"))
            .await
            .expect("insert");

        assert_ne!(first.id, second.id);
        assert!(Uuid::parse_str(first.id.as_str()).is_ok());
        assert!(second.created_at > first.created_at);

        let listed = store
            .list_submissions(ListQuery::default())
            .await
            .expect("list");
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn apply_triage_writes_status_and_response_together() {
        let store = InMemorySubmissionStore::default();
        let stored = store
            .insert_submission(new_submission("Pothole"))
            .await
            .expect("insert");

        let receipt = store
            .apply_triage(TriageWrite {
                submission_id: stored.id.clone(),
                status: SubmissionStatus::Addressed,
                response: Some(NewAdminResponse {
                    submission_id: stored.id.clone(),
                    response_text: "Patched".to_string(),
                    admin_id: UserId("admin-1".to_string()),
                }),
            })
            .await
            .expect("triage");

        assert_eq!(receipt.status, SubmissionStatus::Addressed);
        let record = store
            .get_submission_by_id(&stored.id)
            .await
            .expect("fetch")
            .expect("present");
        assert_eq!(record.submission.status, SubmissionStatus::Addressed);
        assert_eq!(record.responses.len(), 1);
        assert!(record.responses[0].created_at > stored.created_at);
    }

    #[tokio::test]
    async fn apply_triage_on_missing_row_writes_nothing() {
        let store = InMemorySubmissionStore::default();
        let missing = SubmissionId("missing".to_string());

        let result = store
            .apply_triage(TriageWrite {
                submission_id: missing.clone(),
                status: SubmissionStatus::Rejected,
                response: Some(NewAdminResponse {
                    submission_id: missing.clone(),
                    response_text: "n/a".to_string(),
                    admin_id: UserId("admin-1".to_string()),
                }),
            })
            .await;

        assert!(matches!(
            result,
            Err(TriageWriteError::StatusUpdate(StoreError::NotFound))
        ));
        assert!(matches!(
            store
                .insert_admin_response(NewAdminResponse {
                    submission_id: missing,
                    response_text: "orphan".to_string(),
                    admin_id: UserId("admin-1".to_string()),
                })
                .await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn directory_seeds_from_config_and_broadcasts_sign_out() {
        let config = PortalConfig {
            administrators: vec!["admin-1".to_string()],
            seed_sessions: vec![("tok-admin".to_string(), "admin-1".to_string())],
            ..PortalConfig::default()
        };
        let directory = InMemoryIdentityDirectory::from_config(&config).expect("seeded");
        let mut events = directory.subscribe();
        let token = SessionToken("tok-admin".to_string());

        let identity = directory
            .current_session(&token)
            .await
            .expect("lookup")
            .expect("seeded session");
        assert!(directory.is_administrator(&identity).await.expect("role"));
        assert_eq!(directory.administrator_count(), 1);

        directory.sign_out(&token).await.expect("sign out");
        assert_eq!(
            events.recv().await.expect("event"),
            AuthEvent::SignedOut(identity)
        );
        assert!(directory
            .current_session(&token)
            .await
            .expect("lookup")
            .is_none());
    }
}
