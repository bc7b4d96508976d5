use std::fmt;

use tracing::debug;

use super::completeness::{self, Requirement};
use super::member::{MemberRecord, MemberUpdate, UpdateError};

/// Ordered family members plus the head who started the onboarding.
///
/// The head is not a separate entity: when a head name is given, member 0 is
/// pre-filled with the head's name and age and carries the head's documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyRegistry {
    head_name: String,
    head_age: i32,
    members: Vec<MemberRecord>,
    active_index: usize,
}

/// Where the registry points after a successful lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockOutcome {
    Advanced { next_index: usize },
    ReadyForSubmission,
}

impl FamilyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head_name(&self) -> &str {
        &self.head_name
    }

    pub fn head_age(&self) -> i32 {
        self.head_age
    }

    pub fn members(&self) -> &[MemberRecord] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn member(&self, index: usize) -> Result<&MemberRecord, RegistryError> {
        self.members.get(index).ok_or(RegistryError::OutOfRange {
            index,
            len: self.members.len(),
        })
    }

    /// Index of the member currently being edited, if the family was confirmed.
    pub fn active_index(&self) -> Option<usize> {
        (self.active_index < self.members.len()).then_some(self.active_index)
    }

    pub fn active(&self) -> Option<&MemberRecord> {
        self.members.get(self.active_index)
    }

    /// Replaces the member list with `count` blank records. Nothing from the
    /// previous list survives.
    pub fn confirm(
        &mut self,
        head_name: &str,
        head_age: i32,
        count: usize,
    ) -> Result<(), RegistryError> {
        if count == 0 {
            return Err(RegistryError::InvalidFamilySize);
        }

        let head_name = head_name.trim().to_string();
        let mut members = vec![MemberRecord::blank(); count];
        if !head_name.is_empty() {
            members[0] = MemberRecord::new(head_name.clone(), head_age);
        }

        debug!(count, head = %head_name, "family size confirmed");
        self.head_name = head_name;
        self.head_age = head_age;
        self.members = members;
        self.active_index = 0;
        Ok(())
    }

    pub fn select_active(&mut self, index: usize) -> Result<(), RegistryError> {
        self.member(index)?;
        self.active_index = index;
        Ok(())
    }

    /// Applies an edit to the member at `index`.
    pub fn apply(
        &mut self,
        index: usize,
        update: MemberUpdate,
    ) -> Result<&MemberRecord, RegistryError> {
        let len = self.members.len();
        let member = self
            .members
            .get_mut(index)
            .ok_or(RegistryError::OutOfRange { index, len })?;
        member
            .apply(update)
            .map_err(|source| RegistryError::Update { index, source })?;
        Ok(&*member)
    }

    pub fn apply_active(&mut self, update: MemberUpdate) -> Result<&MemberRecord, RegistryError> {
        self.apply(self.active_index, update)
    }

    /// Locks the active member once it evaluates complete, then moves on to the
    /// next unlocked member (wrapping around).
    pub fn lock_active(&mut self) -> Result<LockOutcome, RegistryError> {
        let index = self.active_index;
        let member = self.member(index)?;

        if !member.is_locked() {
            let missing = completeness::missing_requirements(member);
            if !missing.is_empty() {
                return Err(ValidationError::new(index, member.name(), missing).into());
            }
            self.members[index].lock();
            debug!(index, "member locked");
        }

        let len = self.members.len();
        let next = (1..len)
            .map(|offset| (index + offset) % len)
            .find(|candidate| !self.members[*candidate].is_locked());

        Ok(match next {
            Some(next_index) => {
                self.active_index = next_index;
                LockOutcome::Advanced { next_index }
            }
            None => LockOutcome::ReadyForSubmission,
        })
    }

    /// True when the family is confirmed and every member is complete.
    pub fn all_complete(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(MemberRecord::is_complete)
    }

    pub fn all_locked(&self) -> bool {
        !self.members.is_empty() && self.members.iter().all(MemberRecord::is_locked)
    }

    pub fn locked_count(&self) -> usize {
        self.members.iter().filter(|member| member.is_locked()).count()
    }

    /// First member that would block submission, with its unmet requirements.
    pub fn first_incomplete(&self) -> Option<ValidationError> {
        self.members
            .iter()
            .enumerate()
            .find(|(_, member)| !member.is_complete())
            .map(|(index, member)| {
                ValidationError::new(
                    index,
                    member.name(),
                    completeness::missing_requirements(member),
                )
            })
    }
}

/// Missing data that blocks a lock or a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub member_index: usize,
    pub member_name: String,
    pub missing: Vec<Requirement>,
}

impl ValidationError {
    pub fn new(member_index: usize, member_name: &str, missing: Vec<Requirement>) -> Self {
        Self {
            member_index,
            member_name: member_name.to_string(),
            missing,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = self.member_index + 1;
        if self.member_name.is_empty() {
            write!(f, "member {position} is incomplete")?;
        } else {
            write!(f, "member {position} ({}) is incomplete", self.member_name)?;
        }
        if self.missing.is_empty() {
            Ok(())
        } else {
            write!(f, ": missing {}", completeness::describe(&self.missing))
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("member index {index} is out of range for a family of {len}")]
    OutOfRange { index: usize, len: usize },
    #[error("family must have at least one member")]
    InvalidFamilySize,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("member {} update rejected: {source}", .index + 1)]
    Update { index: usize, source: UpdateError },
}
