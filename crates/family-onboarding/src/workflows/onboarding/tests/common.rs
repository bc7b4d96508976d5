use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::config::OnboardingConfig;
use crate::workflows::onboarding::delivery::{
    EmailMessage, Notifier, NotifierError, ObjectStore, ObjectStoreError, StoredObject,
};
use crate::workflows::onboarding::domain::{
    DocumentField, DocumentSlot, GuardianDocumentField, NomineeTextField, TextField,
};
use crate::workflows::onboarding::member::{MemberRecord, MemberUpdate};
use crate::workflows::onboarding::registry::FamilyRegistry;
use crate::workflows::onboarding::repository::{RepositoryError, SessionId, SessionRepository};
use crate::workflows::onboarding::session::OnboardingSession;
use crate::workflows::onboarding::{OnboardingService, SubmissionOrchestrator};

pub(super) const ADMIN_EMAIL: &str = "admin@example.com";

pub(super) fn doc(filename: &str) -> DocumentSlot {
    DocumentSlot::uploaded(filename, filename.as_bytes().to_vec())
}

pub(super) fn text(field: TextField, value: &str) -> MemberUpdate {
    MemberUpdate::SetText {
        field,
        value: value.to_string(),
    }
}

pub(super) fn adult_updates(email: &str) -> Vec<MemberUpdate> {
    vec![
        MemberUpdate::SetDocument {
            field: DocumentField::EAadhaar,
            document: doc("aadhaar.pdf"),
        },
        MemberUpdate::SetDocument {
            field: DocumentField::PanCard,
            document: doc("pan.pdf"),
        },
        MemberUpdate::SetDocument {
            field: DocumentField::BankProof,
            document: doc("cheque.jpg"),
        },
        MemberUpdate::SetAvatar {
            document: doc("photo.png"),
        },
        text(TextField::Email, email),
        text(TextField::Phone, "9845000000"),
        text(TextField::MotherName, "Lakshmi"),
        text(TextField::PlaceOfBirth, "Mysuru"),
        MemberUpdate::SetNomineeText {
            nominee: 0,
            field: NomineeTextField::Name,
            value: "Sita Kumar".to_string(),
        },
        MemberUpdate::SetNomineeText {
            nominee: 0,
            field: NomineeTextField::Relation,
            value: "Spouse".to_string(),
        },
    ]
}

pub(super) fn minor_updates() -> Vec<MemberUpdate> {
    vec![
        MemberUpdate::SetDocument {
            field: DocumentField::BirthCertificate,
            document: doc("birth.pdf"),
        },
        MemberUpdate::SetGuardianDocument {
            guardian: 0,
            field: GuardianDocumentField::Pan,
            document: doc("guardian-pan.pdf"),
        },
        MemberUpdate::SetGuardianDocument {
            guardian: 0,
            field: GuardianDocumentField::Aadhaar,
            document: doc("guardian-aadhaar.pdf"),
        },
    ]
}

pub(super) fn complete_adult(name: &str, age: i32) -> MemberRecord {
    let mut member = MemberRecord::new(name, age);
    for update in adult_updates("ravi@example.com") {
        member.apply(update).expect("adult update accepted");
    }
    member
}

pub(super) fn complete_minor(name: &str, age: i32) -> MemberRecord {
    let mut member = MemberRecord::new(name, age);
    for update in minor_updates() {
        member.apply(update).expect("minor update accepted");
    }
    member
}

/// Member 0 is the head (adult); member 1 is a minor named Anya.
pub(super) fn complete_family(registry: &mut FamilyRegistry, email: &str) {
    registry
        .confirm("Ravi Kumar", 30, 2)
        .expect("family confirmed");
    for update in adult_updates(email) {
        registry.apply(0, update).expect("head update accepted");
    }
    registry
        .apply(
            1,
            MemberUpdate::SetName {
                name: "Anya".to_string(),
            },
        )
        .expect("name accepted");
    registry
        .apply(1, MemberUpdate::SetAge { age: 9 })
        .expect("age accepted");
    for update in minor_updates() {
        registry.apply(1, update).expect("minor update accepted");
    }
}

pub(super) fn complete_session(email: &str) -> OnboardingSession {
    let mut session = OnboardingSession::new();
    session
        .confirm_family("Ravi Kumar", 30, 1)
        .expect("family confirmed");
    for update in adult_updates(email) {
        session.apply(0, update).expect("update accepted");
    }
    session
}

pub(super) fn onboarding_config() -> OnboardingConfig {
    OnboardingConfig {
        admin_email: ADMIN_EMAIL.to_string(),
        storage_root: vec!["Onboarding".to_string()],
        brand: "SSS Distributors".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct StoredUpload {
    pub(super) folders: Vec<String>,
    pub(super) filename: String,
    pub(super) len: usize,
}

#[derive(Default)]
pub(super) struct RecordingStore {
    uploads: Mutex<Vec<StoredUpload>>,
}

impl RecordingStore {
    pub(super) fn uploads(&self) -> Vec<StoredUpload> {
        self.uploads.lock().expect("store mutex poisoned").clone()
    }
}

impl ObjectStore for RecordingStore {
    fn upload(
        &self,
        bytes: &[u8],
        folder_segments: &[String],
        filename: &str,
    ) -> Result<StoredObject, ObjectStoreError> {
        let mut uploads = self.uploads.lock().expect("store mutex poisoned");
        uploads.push(StoredUpload {
            folders: folder_segments.to_vec(),
            filename: filename.to_string(),
            len: bytes.len(),
        });
        let file_id = format!("file-{}", uploads.len());
        Ok(StoredObject {
            url: format!("https://storage.test/{file_id}"),
            file_id,
        })
    }
}

/// Drives each upload on a runtime it owns, the way the Drive store does.
#[derive(Default)]
pub(super) struct RuntimeBackedStore {
    uploads: Mutex<Vec<String>>,
}

impl RuntimeBackedStore {
    pub(super) fn uploads(&self) -> Vec<String> {
        self.uploads.lock().expect("store mutex poisoned").clone()
    }
}

impl ObjectStore for RuntimeBackedStore {
    fn upload(
        &self,
        _bytes: &[u8],
        _folder_segments: &[String],
        filename: &str,
    ) -> Result<StoredObject, ObjectStoreError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .map_err(|err| ObjectStoreError::Runtime(err.to_string()))?;
        let file_id = runtime.block_on(async { format!("owned-runtime-{filename}") });
        self.uploads
            .lock()
            .expect("store mutex poisoned")
            .push(filename.to_string());
        Ok(StoredObject {
            url: format!("https://storage.test/{file_id}"),
            file_id,
        })
    }
}

pub(super) struct FailingStore;

impl ObjectStore for FailingStore {
    fn upload(
        &self,
        _bytes: &[u8],
        _folder_segments: &[String],
        _filename: &str,
    ) -> Result<StoredObject, ObjectStoreError> {
        Err(ObjectStoreError::Backend("quota exceeded".to_string()))
    }
}

/// Records every message; addresses listed in `reject` fail instead.
#[derive(Default)]
pub(super) struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
    reject: Vec<String>,
}

impl RecordingNotifier {
    pub(super) fn rejecting(address: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            reject: vec![address.to_string()],
        }
    }

    pub(super) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("notifier mutex poisoned").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifierError> {
        if self.reject.iter().any(|address| address == &message.to) {
            return Err(NotifierError::Rejected {
                recipient: message.to.clone(),
                reason: "mailbox unavailable".to_string(),
            });
        }
        self.sent
            .lock()
            .expect("notifier mutex poisoned")
            .push(message.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) sessions: Arc<Mutex<HashMap<SessionId, OnboardingSession>>>,
}

impl SessionRepository for MemoryRepository {
    fn insert(&self, id: SessionId, session: OnboardingSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        if guard.contains_key(&id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(id, session);
        Ok(())
    }

    fn update(&self, id: &SessionId, session: OnboardingSession) -> Result<(), RepositoryError> {
        let mut guard = self.sessions.lock().expect("repository mutex poisoned");
        guard.insert(id.clone(), session);
        Ok(())
    }

    fn fetch(&self, id: &SessionId) -> Result<Option<OnboardingSession>, RepositoryError> {
        let guard = self.sessions.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

pub(super) struct UnavailableRepository;

impl SessionRepository for UnavailableRepository {
    fn insert(&self, _id: SessionId, _session: OnboardingSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _id: &SessionId, _session: OnboardingSession) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &SessionId) -> Result<Option<OnboardingSession>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) type TestService = OnboardingService<MemoryRepository, RecordingStore, RecordingNotifier>;

pub(super) fn build_service() -> (
    TestService,
    Arc<MemoryRepository>,
    Arc<RecordingStore>,
    Arc<RecordingNotifier>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let store = Arc::new(RecordingStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let orchestrator =
        SubmissionOrchestrator::new(store.clone(), notifier.clone(), onboarding_config());
    let service = OnboardingService::new(repository.clone(), orchestrator);
    (service, repository, store, notifier)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
