use serde::{Deserialize, Serialize};

use super::completeness;
use super::domain::{
    AdultDocuments, DocumentField, DocumentSlot, GuardianDocumentField, GuardianEntry,
    MemberDocuments, MemberKind, MinorDocuments, NomineeEntry, NomineeTextField, TextField,
    MAX_GUARDIANS, MAX_NOMINEES,
};

/// One person being onboarded. `is_complete` is derived from the fields and is
/// refreshed on every accepted update; a locked record accepts no updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberRecord {
    name: String,
    age: i32,
    avatar_photo: DocumentSlot,
    is_locked: bool,
    is_complete: bool,
    documents: MemberDocuments,
}

impl Default for MemberRecord {
    fn default() -> Self {
        Self::blank()
    }
}

impl MemberRecord {
    pub fn blank() -> Self {
        Self::new("", 0)
    }

    pub fn new(name: impl Into<String>, age: i32) -> Self {
        let mut record = Self {
            name: name.into(),
            age,
            avatar_photo: DocumentSlot::empty(),
            is_locked: false,
            is_complete: false,
            documents: MemberDocuments::blank_for(age),
        };
        record.refresh();
        record
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn kind(&self) -> MemberKind {
        self.documents.kind()
    }

    pub fn avatar_photo(&self) -> &DocumentSlot {
        &self.avatar_photo
    }

    pub fn documents(&self) -> &MemberDocuments {
        &self.documents
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    /// Applies one user edit and recomputes completeness.
    pub fn apply(&mut self, update: MemberUpdate) -> Result<(), UpdateError> {
        if self.is_locked {
            return Err(UpdateError::MemberLocked);
        }

        match update {
            MemberUpdate::SetName { name } => self.name = name,
            MemberUpdate::SetAge { age } => self.set_age(age),
            MemberUpdate::SetAvatar { document } => self.avatar_photo = document,
            MemberUpdate::SetDocument { field, document } => {
                *self.document_slot_mut(field)? = document;
            }
            MemberUpdate::SetText { field, value } => {
                let adult = self.adult_mut("set_text")?;
                let target = match field {
                    TextField::Email => &mut adult.email,
                    TextField::Phone => &mut adult.phone,
                    TextField::MotherName => &mut adult.mother_name,
                    TextField::PlaceOfBirth => &mut adult.place_of_birth,
                };
                *target = value;
            }
            MemberUpdate::ResizeGuardians { count } => {
                check_capacity("guardians", count, MAX_GUARDIANS)?;
                let minor = self.minor_mut("resize_guardians")?;
                minor.guardians.resize_with(count, GuardianEntry::default);
            }
            MemberUpdate::ResizeNominees { count } => {
                check_capacity("nominees", count, MAX_NOMINEES)?;
                let adult = self.adult_mut("resize_nominees")?;
                adult.nominees.resize_with(count, NomineeEntry::default);
            }
            MemberUpdate::SetGuardianDocument {
                guardian,
                field,
                document,
            } => {
                let minor = self.minor_mut("set_guardian_document")?;
                let len = minor.guardians.len();
                let entry = minor
                    .guardians
                    .get_mut(guardian)
                    .ok_or(UpdateError::PositionOutOfRange {
                        group: "guardians",
                        position: guardian,
                        len,
                    })?;
                let slot = match field {
                    GuardianDocumentField::Pan => &mut entry.pan_document,
                    GuardianDocumentField::Aadhaar => &mut entry.aadhaar_document,
                    GuardianDocumentField::Bank => &mut entry.bank_document,
                };
                *slot = document;
            }
            MemberUpdate::SetNomineeText {
                nominee,
                field,
                value,
            } => {
                let entry = self.nominee_mut("set_nominee_text", nominee)?;
                let target = match field {
                    NomineeTextField::Name => &mut entry.name,
                    NomineeTextField::Relation => &mut entry.relation,
                    NomineeTextField::Occupation => &mut entry.occupation,
                    NomineeTextField::Income => &mut entry.income,
                };
                *target = value;
            }
            MemberUpdate::SetNomineeDocument { nominee, document } => {
                let entry = self.nominee_mut("set_nominee_document", nominee)?;
                entry.pan_document = document;
            }
        }

        self.refresh();
        Ok(())
    }

    /// Freezes the record. Callers check completeness first.
    pub(crate) fn lock(&mut self) {
        self.is_locked = true;
    }

    fn refresh(&mut self) {
        if !self.is_locked {
            self.is_complete = completeness::evaluate(self);
        }
    }

    fn set_age(&mut self, age: i32) {
        let next = MemberKind::for_age(age);
        if next != self.kind() {
            self.documents = MemberDocuments::blank_for(age);
        }
        self.age = age;
    }

    fn document_slot_mut(&mut self, field: DocumentField) -> Result<&mut DocumentSlot, UpdateError> {
        let kind = self.kind();
        match (&mut self.documents, field) {
            (MemberDocuments::Adult(adult), DocumentField::EAadhaar) => Ok(&mut adult.e_aadhaar),
            (MemberDocuments::Adult(adult), DocumentField::PanCard) => Ok(&mut adult.pan_card),
            (MemberDocuments::Adult(adult), DocumentField::BankProof) => Ok(&mut adult.bank_proof),
            (MemberDocuments::Minor(minor), DocumentField::BirthCertificate) => {
                Ok(&mut minor.birth_certificate)
            }
            (MemberDocuments::Minor(minor), DocumentField::MinorPan) => Ok(&mut minor.minor_pan),
            _ => Err(UpdateError::NotApplicable {
                update: field.key(),
                kind,
            }),
        }
    }

    fn minor_mut(&mut self, update: &'static str) -> Result<&mut MinorDocuments, UpdateError> {
        match &mut self.documents {
            MemberDocuments::Minor(minor) => Ok(minor),
            MemberDocuments::Adult(_) => Err(UpdateError::NotApplicable {
                update,
                kind: MemberKind::Adult,
            }),
        }
    }

    fn adult_mut(&mut self, update: &'static str) -> Result<&mut AdultDocuments, UpdateError> {
        match &mut self.documents {
            MemberDocuments::Adult(adult) => Ok(adult),
            MemberDocuments::Minor(_) => Err(UpdateError::NotApplicable {
                update,
                kind: MemberKind::Minor,
            }),
        }
    }

    fn nominee_mut(
        &mut self,
        update: &'static str,
        position: usize,
    ) -> Result<&mut NomineeEntry, UpdateError> {
        let adult = self.adult_mut(update)?;
        let len = adult.nominees.len();
        adult
            .nominees
            .get_mut(position)
            .ok_or(UpdateError::PositionOutOfRange {
                group: "nominees",
                position,
                len,
            })
    }
}

fn check_capacity(group: &'static str, requested: usize, max: usize) -> Result<(), UpdateError> {
    if requested > max {
        return Err(UpdateError::GroupCapacity {
            group,
            requested,
            max,
        });
    }
    Ok(())
}

/// A single user edit to one member. Positions inside guardian/nominee lists are zero-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MemberUpdate {
    SetName {
        name: String,
    },
    SetAge {
        age: i32,
    },
    SetAvatar {
        #[serde(default)]
        document: DocumentSlot,
    },
    SetDocument {
        field: DocumentField,
        #[serde(default)]
        document: DocumentSlot,
    },
    SetText {
        field: TextField,
        value: String,
    },
    ResizeGuardians {
        count: usize,
    },
    ResizeNominees {
        count: usize,
    },
    SetGuardianDocument {
        guardian: usize,
        field: GuardianDocumentField,
        #[serde(default)]
        document: DocumentSlot,
    },
    SetNomineeText {
        nominee: usize,
        field: NomineeTextField,
        value: String,
    },
    SetNomineeDocument {
        nominee: usize,
        #[serde(default)]
        document: DocumentSlot,
    },
}

/// Reasons a member update is refused. The record is left untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UpdateError {
    #[error("member is locked and no longer accepts changes")]
    MemberLocked,
    #[error("{update} does not apply to a {} member", .kind.label())]
    NotApplicable { update: &'static str, kind: MemberKind },
    #[error("{group} cannot hold {requested} entries (maximum {max})")]
    GroupCapacity {
        group: &'static str,
        requested: usize,
        max: usize,
    },
    #[error("{group} entry {position} does not exist (have {len})")]
    PositionOutOfRange {
        group: &'static str,
        position: usize,
        len: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crossing_the_adult_boundary_swaps_document_shape() {
        let mut member = MemberRecord::new("Asha", 17);
        member
            .apply(MemberUpdate::SetDocument {
                field: DocumentField::BirthCertificate,
                document: DocumentSlot::uploaded("birth.pdf", vec![1]),
            })
            .expect("minor accepts birth certificate");

        member
            .apply(MemberUpdate::SetAge { age: 18 })
            .expect("age update");
        assert_eq!(member.kind(), MemberKind::Adult);

        member
            .apply(MemberUpdate::SetAge { age: 16 })
            .expect("age update");
        assert_eq!(
            member.documents(),
            &MemberDocuments::Minor(MinorDocuments::blank()),
            "previous minor uploads are not restored"
        );
    }

    #[test]
    fn age_change_within_same_kind_keeps_documents() {
        let mut member = MemberRecord::new("Asha", 30);
        member
            .apply(MemberUpdate::SetText {
                field: TextField::Email,
                value: "asha@example.com".to_string(),
            })
            .expect("adult accepts email");
        member
            .apply(MemberUpdate::SetAge { age: 31 })
            .expect("age update");

        match member.documents() {
            MemberDocuments::Adult(adult) => assert_eq!(adult.email, "asha@example.com"),
            other => panic!("expected adult documents, got {other:?}"),
        }
    }

    #[test]
    fn adult_fields_are_rejected_for_minors() {
        let mut member = MemberRecord::new("Kiran", 9);
        let err = member
            .apply(MemberUpdate::SetDocument {
                field: DocumentField::PanCard,
                document: DocumentSlot::uploaded("pan.pdf", vec![1]),
            })
            .expect_err("minors have no PAN card slot");
        assert_eq!(
            err,
            UpdateError::NotApplicable {
                update: "pan_card",
                kind: MemberKind::Minor
            }
        );
    }

    #[test]
    fn group_resizes_are_bounded() {
        let mut member = MemberRecord::new("Kiran", 9);
        member
            .apply(MemberUpdate::ResizeGuardians { count: 2 })
            .expect("two guardians allowed");
        let err = member
            .apply(MemberUpdate::ResizeGuardians { count: 3 })
            .expect_err("third guardian refused");
        assert!(matches!(err, UpdateError::GroupCapacity { max: 2, .. }));

        let mut adult = MemberRecord::new("Ravi", 40);
        adult
            .apply(MemberUpdate::ResizeNominees { count: 3 })
            .expect("three nominees allowed");
        assert!(adult
            .apply(MemberUpdate::ResizeNominees { count: 4 })
            .is_err());
    }

    #[test]
    fn nested_positions_are_checked() {
        let mut member = MemberRecord::new("Ravi", 40);
        let err = member
            .apply(MemberUpdate::SetNomineeText {
                nominee: 1,
                field: NomineeTextField::Name,
                value: "Meera".to_string(),
            })
            .expect_err("only one nominee exists");
        assert_eq!(
            err,
            UpdateError::PositionOutOfRange {
                group: "nominees",
                position: 1,
                len: 1
            }
        );
    }

    #[test]
    fn locked_members_refuse_updates() {
        let mut member = MemberRecord::new("Ravi", 40);
        member.lock();
        let before = member.clone();

        let err = member
            .apply(MemberUpdate::SetName {
                name: "Changed".to_string(),
            })
            .expect_err("locked");
        assert_eq!(err, UpdateError::MemberLocked);
        assert_eq!(member, before);
    }

    #[test]
    fn updates_deserialize_from_tagged_json() {
        let update: MemberUpdate = serde_json::from_value(serde_json::json!({
            "op": "set_guardian_document",
            "guardian": 0,
            "field": "aadhaar",
            "document": { "filename": "aadhaar.pdf", "content_base64": "aGVsbG8=" }
        }))
        .expect("valid update");

        match update {
            MemberUpdate::SetGuardianDocument {
                guardian, document, ..
            } => {
                assert_eq!(guardian, 0);
                assert_eq!(document.bytes(), Some(&b"hello"[..]));
            }
            other => panic!("unexpected update {other:?}"),
        }

        let cleared: MemberUpdate = serde_json::from_value(serde_json::json!({
            "op": "set_avatar",
            "document": null
        }))
        .expect("null clears the slot");
        assert_eq!(
            cleared,
            MemberUpdate::SetAvatar {
                document: DocumentSlot::empty()
            }
        );
    }
}
