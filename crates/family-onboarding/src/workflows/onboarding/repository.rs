use serde::{Deserialize, Serialize};

use super::completeness::missing_requirements;
use super::session::OnboardingSession;
use super::submission::SubmissionReceipt;

/// Identifier wrapper for onboarding sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Storage abstraction so the service can be exercised without a backing store.
pub trait SessionRepository: Send + Sync {
    fn insert(&self, id: SessionId, session: OnboardingSession) -> Result<(), RepositoryError>;
    fn update(&self, id: &SessionId, session: OnboardingSession) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &SessionId) -> Result<Option<OnboardingSession>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("session already exists")]
    Conflict,
    #[error("session not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Per-member status exposed to API clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberStatusView {
    pub index: usize,
    pub name: String,
    pub age: i32,
    pub member_type: &'static str,
    pub locked: bool,
    pub complete: bool,
    pub missing: Vec<String>,
}

/// Sanitized session snapshot; document bytes never leave the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatusView {
    pub session_id: SessionId,
    pub phase: &'static str,
    pub head_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_index: Option<usize>,
    pub all_complete: bool,
    pub members: Vec<MemberStatusView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<SubmissionReceipt>,
}

impl SessionStatusView {
    pub fn from_session(id: SessionId, session: &OnboardingSession) -> Self {
        let registry = session.registry();
        let members = registry
            .members()
            .iter()
            .enumerate()
            .map(|(index, member)| MemberStatusView {
                index,
                name: member.name().to_string(),
                age: member.age(),
                member_type: member.kind().label(),
                locked: member.is_locked(),
                complete: member.is_complete(),
                missing: if member.is_locked() {
                    Vec::new()
                } else {
                    missing_requirements(member)
                        .iter()
                        .map(ToString::to_string)
                        .collect()
                },
            })
            .collect();

        Self {
            session_id: id,
            phase: session.phase().label(),
            head_name: registry.head_name().to_string(),
            active_index: registry.active_index(),
            all_complete: registry.all_complete(),
            members,
            archive_name: session.archive().map(|archive| archive.file_name.clone()),
            receipt: session.receipt().cloned(),
        }
    }
}
