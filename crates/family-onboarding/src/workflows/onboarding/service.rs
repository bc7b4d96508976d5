use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::archive::AssembledArchive;
use super::delivery::{Notifier, ObjectStore};
use super::member::MemberUpdate;
use super::registry::LockOutcome;
use super::repository::{RepositoryError, SessionId, SessionRepository, SessionStatusView};
use super::session::{OnboardingSession, SessionError};
use super::submission::{SubmissionError, SubmissionOrchestrator, SubmissionReceipt};

/// Service composing the session repository and the submission orchestrator.
/// Each call loads one session, runs one interaction, and writes it back.
pub struct OnboardingService<R, S, N> {
    repository: Arc<R>,
    orchestrator: Arc<SubmissionOrchestrator<S, N>>,
}

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("session-{id:06}"))
}

impl<R, S, N> OnboardingService<R, S, N>
where
    R: SessionRepository + 'static,
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(repository: Arc<R>, orchestrator: SubmissionOrchestrator<S, N>) -> Self {
        Self {
            repository,
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn create_session(&self) -> Result<SessionStatusView, OnboardingServiceError> {
        let id = next_session_id();
        let session = OnboardingSession::new();
        let view = SessionStatusView::from_session(id.clone(), &session);
        self.repository.insert(id, session)?;
        Ok(view)
    }

    pub fn status(&self, id: &SessionId) -> Result<SessionStatusView, OnboardingServiceError> {
        let session = self.load(id)?;
        Ok(SessionStatusView::from_session(id.clone(), &session))
    }

    pub fn confirm_family(
        &self,
        id: &SessionId,
        head_name: &str,
        head_age: i32,
        member_count: usize,
    ) -> Result<SessionStatusView, OnboardingServiceError> {
        self.interact(id, |session| {
            session.confirm_family(head_name, head_age, member_count)
        })
        .map(|(view, ())| view)
    }

    pub fn select_active(
        &self,
        id: &SessionId,
        index: usize,
    ) -> Result<SessionStatusView, OnboardingServiceError> {
        self.interact(id, |session| session.select_active(index))
            .map(|(view, ())| view)
    }

    pub fn apply_update(
        &self,
        id: &SessionId,
        index: usize,
        update: MemberUpdate,
    ) -> Result<SessionStatusView, OnboardingServiceError> {
        self.interact(id, |session| session.apply(index, update).map(|_| ()))
            .map(|(view, ())| view)
    }

    pub fn lock_active(
        &self,
        id: &SessionId,
    ) -> Result<(SessionStatusView, LockOutcome), OnboardingServiceError> {
        self.interact(id, OnboardingSession::lock_active)
    }

    /// Runs the submission. The session is written back even when delivery
    /// fails so the archive stays downloadable.
    pub fn submit(&self, id: &SessionId) -> Result<SubmissionReceipt, OnboardingServiceError> {
        let mut session = self.load(id)?;
        let result = self.orchestrator.submit(&mut session);
        self.repository.update(id, session)?;
        Ok(result?)
    }

    pub fn archive(&self, id: &SessionId) -> Result<AssembledArchive, OnboardingServiceError> {
        let session = self.load(id)?;
        session
            .archive()
            .cloned()
            .ok_or(OnboardingServiceError::ArchiveUnavailable)
    }

    fn load(&self, id: &SessionId) -> Result<OnboardingSession, OnboardingServiceError> {
        Ok(self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    fn interact<T, F>(
        &self,
        id: &SessionId,
        handler: F,
    ) -> Result<(SessionStatusView, T), OnboardingServiceError>
    where
        F: FnOnce(&mut OnboardingSession) -> Result<T, SessionError>,
    {
        let mut session = self.load(id)?;
        let outcome = handler(&mut session)?;
        let view = SessionStatusView::from_session(id.clone(), &session);
        self.repository.update(id, session)?;
        Ok((view, outcome))
    }
}

/// Error raised by the onboarding service.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingServiceError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("no archive has been produced for this session yet")]
    ArchiveUnavailable,
}
