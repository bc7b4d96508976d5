use serde::{Deserialize, Serialize};

use super::archive::AssembledArchive;
use super::member::{MemberRecord, MemberUpdate};
use super::registry::{FamilyRegistry, LockOutcome, RegistryError};
use super::submission::SubmissionReceipt;

/// Where a session sits in the collect → assemble → deliver flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPhase {
    Collecting,
    Assembling,
    Delivering,
    Done,
    DeliveryFailed,
}

impl SubmissionPhase {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionPhase::Collecting => "collecting",
            SubmissionPhase::Assembling => "assembling",
            SubmissionPhase::Delivering => "delivering",
            SubmissionPhase::Done => "done",
            SubmissionPhase::DeliveryFailed => "delivery_failed",
        }
    }

    pub const fn accepts_edits(self) -> bool {
        matches!(self, SubmissionPhase::Collecting)
    }
}

/// One household's onboarding state. Each interaction handler receives the
/// session explicitly and runs to completion before the next one.
#[derive(Debug, Clone)]
pub struct OnboardingSession {
    registry: FamilyRegistry,
    phase: SubmissionPhase,
    archive: Option<AssembledArchive>,
    receipt: Option<SubmissionReceipt>,
}

impl Default for OnboardingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingSession {
    pub fn new() -> Self {
        Self {
            registry: FamilyRegistry::new(),
            phase: SubmissionPhase::Collecting,
            archive: None,
            receipt: None,
        }
    }

    pub fn registry(&self) -> &FamilyRegistry {
        &self.registry
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.phase
    }

    /// Archive produced by the last submission, kept for download whatever the
    /// delivery outcome.
    pub fn archive(&self) -> Option<&AssembledArchive> {
        self.archive.as_ref()
    }

    pub fn receipt(&self) -> Option<&SubmissionReceipt> {
        self.receipt.as_ref()
    }

    pub fn confirm_family(
        &mut self,
        head_name: &str,
        head_age: i32,
        count: usize,
    ) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.registry.confirm(head_name, head_age, count)?;
        Ok(())
    }

    pub fn select_active(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_editable()?;
        self.registry.select_active(index)?;
        Ok(())
    }

    pub fn apply(
        &mut self,
        index: usize,
        update: MemberUpdate,
    ) -> Result<&MemberRecord, SessionError> {
        self.ensure_editable()?;
        Ok(self.registry.apply(index, update)?)
    }

    pub fn lock_active(&mut self) -> Result<LockOutcome, SessionError> {
        self.ensure_editable()?;
        Ok(self.registry.lock_active()?)
    }

    fn ensure_editable(&self) -> Result<(), SessionError> {
        if self.phase.accepts_edits() {
            Ok(())
        } else {
            Err(SessionError::Closed { phase: self.phase })
        }
    }

    pub(crate) fn set_phase(&mut self, phase: SubmissionPhase) {
        self.phase = phase;
    }

    pub(crate) fn store_archive(&mut self, archive: AssembledArchive) {
        self.archive = Some(archive);
    }

    pub(crate) fn store_receipt(&mut self, receipt: SubmissionReceipt) {
        self.receipt = Some(receipt);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("session no longer accepts changes ({})", .phase.label())]
    Closed { phase: SubmissionPhase },
}
