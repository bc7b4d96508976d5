use family_onboarding::workflows::onboarding::{
    EmailMessage, Notifier, NotifierError, ObjectStore, ObjectStoreError, OnboardingSession,
    RepositoryError, SessionId, SessionRepository, StoredObject,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySessionRepository {
    sessions: Arc<Mutex<HashMap<SessionId, OnboardingSession>>>,
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, id: SessionId, session: OnboardingSession) -> Result<(), RepositoryError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        if guard.contains_key(&id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(id, session);
        Ok(())
    }

    fn update(&self, id: &SessionId, session: OnboardingSession) -> Result<(), RepositoryError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        match guard.get_mut(id) {
            Some(entry) => {
                *entry = session;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<OnboardingSession>, RepositoryError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|_| RepositoryError::Unavailable("session store poisoned".to_string()))?;
        Ok(guard.get(id).cloned())
    }
}

/// Keeps uploaded archives in process memory, keyed by their folder path.
#[derive(Default, Clone)]
pub(crate) struct InMemoryObjectStore {
    objects: Arc<Mutex<BTreeMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub(crate) fn paths(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn upload(
        &self,
        bytes: &[u8],
        folder_segments: &[String],
        filename: &str,
    ) -> Result<StoredObject, ObjectStoreError> {
        let mut path = folder_segments.join("/");
        if !path.is_empty() {
            path.push('/');
        }
        path.push_str(filename);

        self.objects
            .lock()
            .map_err(|_| ObjectStoreError::Backend("object store poisoned".to_string()))?
            .insert(path.clone(), bytes.to_vec());
        info!(%path, size = bytes.len(), "archive stored in memory");

        Ok(StoredObject {
            url: format!("memory://{path}"),
            file_id: path,
        })
    }
}

/// Notifier that writes each message to the log instead of sending it.
#[derive(Default, Clone)]
pub(crate) struct LoggingNotifier {
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

impl LoggingNotifier {
    pub(crate) fn outbox(&self) -> Vec<EmailMessage> {
        self.outbox
            .lock()
            .map(|outbox| outbox.clone())
            .unwrap_or_default()
    }
}

impl Notifier for LoggingNotifier {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifierError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            attachment = message.attachment.as_ref().map(|attachment| attachment.filename.as_str()),
            "email queued"
        );
        self.outbox
            .lock()
            .map_err(|_| NotifierError::Transport("outbox poisoned".to_string()))?
            .push(message.clone());
        Ok(())
    }
}
