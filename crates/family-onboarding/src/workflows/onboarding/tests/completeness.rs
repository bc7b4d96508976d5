use super::common::*;

use crate::workflows::onboarding::completeness::{evaluate, missing_requirements, Requirement};
use crate::workflows::onboarding::domain::{
    DocumentField, DocumentSlot, GuardianDocumentField, MemberKind, NomineeTextField, TextField,
};
use crate::workflows::onboarding::member::{MemberRecord, MemberUpdate};

#[test]
fn age_boundary_is_inclusive_on_adult_side() {
    assert_eq!(MemberRecord::new("A", 17).kind(), MemberKind::Minor);
    assert_eq!(MemberRecord::new("A", 18).kind(), MemberKind::Adult);
    assert_eq!(MemberRecord::new("A", 0).kind(), MemberKind::Minor);
}

#[test]
fn complete_adult_and_minor_evaluate_true() {
    let adult = complete_adult("Ravi Kumar", 30);
    assert!(evaluate(&adult));
    assert!(adult.is_complete());

    let minor = complete_minor("Anya", 9);
    assert!(evaluate(&minor));
    assert!(minor.is_complete());
}

#[test]
fn removing_any_single_adult_requirement_makes_member_incomplete() {
    let removals = vec![
        (
            MemberUpdate::SetDocument {
                field: DocumentField::EAadhaar,
                document: DocumentSlot::empty(),
            },
            Requirement::EAadhaar,
        ),
        (
            MemberUpdate::SetDocument {
                field: DocumentField::PanCard,
                document: DocumentSlot::empty(),
            },
            Requirement::PanCard,
        ),
        (
            MemberUpdate::SetDocument {
                field: DocumentField::BankProof,
                document: DocumentSlot::empty(),
            },
            Requirement::BankProof,
        ),
        (
            MemberUpdate::SetAvatar {
                document: DocumentSlot::empty(),
            },
            Requirement::Photo,
        ),
        (text(TextField::Email, ""), Requirement::Email),
        (text(TextField::Phone, "   "), Requirement::Phone),
        (text(TextField::MotherName, ""), Requirement::MotherName),
        (text(TextField::PlaceOfBirth, ""), Requirement::PlaceOfBirth),
        (
            MemberUpdate::SetNomineeText {
                nominee: 0,
                field: NomineeTextField::Name,
                value: String::new(),
            },
            Requirement::NomineeName { nominee: 1 },
        ),
        (
            MemberUpdate::SetNomineeText {
                nominee: 0,
                field: NomineeTextField::Relation,
                value: String::new(),
            },
            Requirement::NomineeRelation { nominee: 1 },
        ),
        (
            MemberUpdate::ResizeNominees { count: 0 },
            Requirement::Nominee,
        ),
        (
            MemberUpdate::SetName {
                name: String::new(),
            },
            Requirement::Name,
        ),
    ];

    for (update, expected) in removals {
        let mut member = complete_adult("Ravi Kumar", 30);
        member.apply(update.clone()).expect("update accepted");
        assert!(!member.is_complete(), "{update:?} should break completeness");
        assert_eq!(missing_requirements(&member), vec![expected]);
    }
}

#[test]
fn optional_adult_fields_do_not_gate_completion() {
    let mut member = complete_adult("Ravi Kumar", 30);
    member
        .apply(MemberUpdate::ResizeNominees { count: 2 })
        .expect("second nominee");
    assert!(!member.is_complete(), "new nominee lacks name and relation");

    for (field, value) in [
        (NomineeTextField::Name, "Dev"),
        (NomineeTextField::Relation, "Son"),
    ] {
        member
            .apply(MemberUpdate::SetNomineeText {
                nominee: 1,
                field,
                value: value.to_string(),
            })
            .expect("nominee text");
    }
    assert!(member.is_complete(), "nominee PAN, occupation, income are optional");
}

#[test]
fn minor_with_no_guardians_is_never_complete() {
    let mut member = complete_minor("Anya", 9);
    member
        .apply(MemberUpdate::ResizeGuardians { count: 0 })
        .expect("guardians cleared");
    member
        .apply(MemberUpdate::SetDocument {
            field: DocumentField::MinorPan,
            document: doc("minor-pan.pdf"),
        })
        .expect("minor pan");
    member
        .apply(MemberUpdate::SetAvatar {
            document: doc("photo.png"),
        })
        .expect("photo");

    assert!(!member.is_complete());
    assert_eq!(missing_requirements(&member), vec![Requirement::Guardian]);
}

#[test]
fn every_guardian_needs_pan_and_aadhaar() {
    let mut member = complete_minor("Anya", 9);
    member
        .apply(MemberUpdate::ResizeGuardians { count: 2 })
        .expect("second guardian");
    member
        .apply(MemberUpdate::SetGuardianDocument {
            guardian: 1,
            field: GuardianDocumentField::Pan,
            document: doc("second-pan.pdf"),
        })
        .expect("second guardian pan");

    assert_eq!(
        missing_requirements(&member),
        vec![Requirement::GuardianAadhaar { guardian: 2 }]
    );
}

#[test]
fn negative_age_is_reported_without_document_rules() {
    let member = MemberRecord::new("Ghost", -1);
    assert_eq!(
        missing_requirements(&member),
        vec![Requirement::NonNegativeAge]
    );
    assert!(!member.is_complete());
}

#[test]
fn widget_without_bytes_does_not_count_as_uploaded() {
    let slot = DocumentSlot::from_widget(Some("birth.pdf".to_string()), None);
    assert!(!slot.is_present());

    let mut member = complete_minor("Anya", 9);
    member
        .apply(MemberUpdate::SetDocument {
            field: DocumentField::BirthCertificate,
            document: slot,
        })
        .expect("slot replaced");
    assert_eq!(
        missing_requirements(&member),
        vec![Requirement::BirthCertificate]
    );
}
