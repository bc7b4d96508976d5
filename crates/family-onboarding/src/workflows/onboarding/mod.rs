//! Household onboarding: per-member form state, completeness tracking, archive
//! assembly, and delivery of the finished submission.

pub mod archive;
pub mod completeness;
pub mod delivery;
pub mod domain;
pub mod member;
pub mod registry;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod submission;

#[cfg(test)]
mod tests;

pub use archive::{sanitize, ArchiveAssembler, ArchiveError, AssembledArchive};
pub use completeness::{evaluate, missing_requirements, Requirement};
pub use delivery::{
    EmailAttachment, EmailMessage, GoogleDriveObjectStore, Notifier, NotifierError, ObjectStore,
    ObjectStoreError, StoredObject,
};
pub use domain::{
    is_minor, AdultDocuments, DocumentField, DocumentSlot, GuardianDocumentField, GuardianEntry,
    MemberDocuments, MemberKind, MinorDocuments, NomineeEntry, NomineeTextField, TextField,
    UploadedDocument,
};
pub use member::{MemberRecord, MemberUpdate, UpdateError};
pub use registry::{FamilyRegistry, LockOutcome, RegistryError, ValidationError};
pub use repository::{
    MemberStatusView, RepositoryError, SessionId, SessionRepository, SessionStatusView,
};
pub use router::onboarding_router;
pub use service::{OnboardingService, OnboardingServiceError};
pub use session::{OnboardingSession, SessionError, SubmissionPhase};
pub use submission::{
    DeliveryOutcome, SubmissionError, SubmissionOrchestrator, SubmissionReceipt,
};
