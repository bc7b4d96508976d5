use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::archive::{head_folder, manifest, ArchiveAssembler, ArchiveError, AssembledArchive};
use super::delivery::{EmailAttachment, EmailMessage, Notifier, ObjectStore};
use super::domain::MemberDocuments;
use super::registry::{FamilyRegistry, ValidationError};
use super::session::{OnboardingSession, SubmissionPhase};
use crate::config::OnboardingConfig;

/// Result of one outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered {
        #[serde(skip_serializing_if = "Option::is_none")]
        reference: Option<String>,
    },
    Failed {
        reason: String,
    },
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered { .. })
    }

    pub fn reference(&self) -> Option<&str> {
        match self {
            DeliveryOutcome::Delivered { reference } => reference.as_deref(),
            DeliveryOutcome::Failed { .. } => None,
        }
    }
}

/// What the user is told after a submission. The archive itself stays on the
/// session for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub archive_name: String,
    pub entry_count: usize,
    pub upload: DeliveryOutcome,
    pub admin_notice: DeliveryOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_notice: Option<DeliveryOutcome>,
    pub submitted_at: DateTime<Utc>,
}

impl SubmissionReceipt {
    pub fn fully_delivered(&self) -> bool {
        self.upload.is_delivered()
            && self.admin_notice.is_delivered()
            && self
                .applicant_notice
                .as_ref()
                .map_or(true, DeliveryOutcome::is_delivered)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("family size has not been confirmed")]
    FamilyNotConfirmed,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("unable to assemble archive: {0}")]
    Assembly(#[from] ArchiveError),
    #[error("submission already delivered")]
    AlreadySubmitted,
    #[error("submission cannot start while {}", .0.label())]
    InvalidPhase(SubmissionPhase),
}

/// Runs validation, archive assembly, and delivery for a session.
pub struct SubmissionOrchestrator<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
    assembler: ArchiveAssembler,
    config: OnboardingConfig,
}

impl<S, N> SubmissionOrchestrator<S, N>
where
    S: ObjectStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>, config: OnboardingConfig) -> Self {
        Self {
            store,
            notifier,
            assembler: ArchiveAssembler::default(),
            config,
        }
    }

    pub fn with_assembler(mut self, assembler: ArchiveAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn config(&self) -> &OnboardingConfig {
        &self.config
    }

    /// Submits a complete family. Validation and assembly failures leave the
    /// session collecting; delivery failures are recorded on the receipt.
    pub fn submit(
        &self,
        session: &mut OnboardingSession,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        match session.phase() {
            SubmissionPhase::Collecting | SubmissionPhase::DeliveryFailed => {}
            SubmissionPhase::Done => return Err(SubmissionError::AlreadySubmitted),
            other => return Err(SubmissionError::InvalidPhase(other)),
        }

        let registry = session.registry();
        if registry.is_empty() {
            return Err(SubmissionError::FamilyNotConfirmed);
        }
        if let Some(incomplete) = registry.first_incomplete() {
            return Err(incomplete.into());
        }

        let resubmission = session.phase() == SubmissionPhase::DeliveryFailed;
        session.set_phase(SubmissionPhase::Assembling);
        let archive = match self.assembler.assemble(session.registry()) {
            Ok(archive) => archive,
            Err(err) => {
                warn!(error = %err, "archive assembly failed");
                session.set_phase(SubmissionPhase::Collecting);
                return Err(err.into());
            }
        };

        session.set_phase(SubmissionPhase::Delivering);
        let receipt = self.deliver(session.registry(), &archive);
        info!(
            archive = %receipt.archive_name,
            resubmission,
            delivered = receipt.fully_delivered(),
            "onboarding submission processed"
        );

        session.set_phase(if receipt.fully_delivered() {
            SubmissionPhase::Done
        } else {
            SubmissionPhase::DeliveryFailed
        });
        session.store_archive(archive);
        session.store_receipt(receipt.clone());
        Ok(receipt)
    }

    fn deliver(&self, registry: &FamilyRegistry, archive: &AssembledArchive) -> SubmissionReceipt {
        let mut folders = self.config.storage_root.clone();
        folders.push(head_folder(registry.head_name()));

        let upload = match self
            .store
            .upload(&archive.bytes, &folders, &archive.file_name)
        {
            Ok(stored) => {
                info!(url = %stored.url, "archive uploaded");
                DeliveryOutcome::Delivered {
                    reference: Some(stored.url),
                }
            }
            Err(err) => {
                warn!(error = %err, "archive upload failed");
                DeliveryOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        };

        let admin_notice = self.notify(&self.admin_message(registry, archive, upload.reference()));
        let applicant_notice = applicant_email(registry)
            .map(|address| self.notify(&self.applicant_message(registry, address)));

        SubmissionReceipt {
            archive_name: archive.file_name.clone(),
            entry_count: archive.entries.len(),
            upload,
            admin_notice,
            applicant_notice,
            submitted_at: Utc::now(),
        }
    }

    fn notify(&self, message: &EmailMessage) -> DeliveryOutcome {
        match self.notifier.send(message) {
            Ok(()) => {
                info!(to = %message.to, "notification sent");
                DeliveryOutcome::Delivered { reference: None }
            }
            Err(err) => {
                warn!(to = %message.to, error = %err, "notification failed");
                DeliveryOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn admin_message(
        &self,
        registry: &FamilyRegistry,
        archive: &AssembledArchive,
        stored_url: Option<&str>,
    ) -> EmailMessage {
        let mut body = format!(
            "A new onboarding submission was received for the family of {}.\n\nMembers:\n{}",
            registry.head_name(),
            manifest::family_overview(registry.members())
        );
        match stored_url {
            Some(url) => body.push_str(&format!("\nArchive stored at: {url}\n")),
            None => body.push_str("\nArchive upload failed; the attached copy is the only one.\n"),
        }

        EmailMessage {
            to: self.config.admin_email.clone(),
            subject: format!("New onboarding submission: {}", registry.head_name()),
            body,
            attachment: Some(EmailAttachment {
                filename: archive.file_name.clone(),
                bytes: archive.bytes.clone(),
            }),
        }
    }

    fn applicant_message(&self, registry: &FamilyRegistry, address: &str) -> EmailMessage {
        let body = format!(
            "Dear {},\n\nWe have received the onboarding documents for your family ({} member(s)). \
             Our team will review them and contact you if anything else is needed.\n\nRegards,\n{}\n",
            registry.head_name(),
            registry.len(),
            self.config.brand
        );

        EmailMessage {
            to: address.to_string(),
            subject: "Your onboarding documents were received".to_string(),
            body,
            attachment: None,
        }
    }
}

/// First non-empty email supplied by an adult, in member order.
fn applicant_email(registry: &FamilyRegistry) -> Option<&str> {
    registry
        .members()
        .iter()
        .find_map(|member| match member.documents() {
            MemberDocuments::Adult(adult) if !adult.email.trim().is_empty() => {
                Some(adult.email.trim())
            }
            _ => None,
        })
}
