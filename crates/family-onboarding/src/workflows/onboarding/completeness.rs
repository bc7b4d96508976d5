//! Required-field policy for a single member.
//!
//! Minors need a birth certificate and at least one guardian whose PAN and
//! Aadhaar are on file. Adults need e-Aadhaar, PAN, bank proof, a photo, four
//! contact fields, and at least one nominee with a name and relation. Nothing
//! else gates completion.

use std::fmt;

use super::domain::{AdultDocuments, MemberDocuments, MinorDocuments};
use super::member::MemberRecord;

/// One unmet requirement. Group positions are one-based to match what the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Name,
    NonNegativeAge,
    BirthCertificate,
    Guardian,
    GuardianPan { guardian: usize },
    GuardianAadhaar { guardian: usize },
    EAadhaar,
    PanCard,
    BankProof,
    Photo,
    Email,
    Phone,
    MotherName,
    PlaceOfBirth,
    Nominee,
    NomineeName { nominee: usize },
    NomineeRelation { nominee: usize },
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Name => write!(f, "name"),
            Requirement::NonNegativeAge => write!(f, "age"),
            Requirement::BirthCertificate => write!(f, "birth certificate"),
            Requirement::Guardian => write!(f, "at least one guardian"),
            Requirement::GuardianPan { guardian } => write!(f, "guardian {guardian} PAN"),
            Requirement::GuardianAadhaar { guardian } => {
                write!(f, "guardian {guardian} Aadhaar")
            }
            Requirement::EAadhaar => write!(f, "e-Aadhaar"),
            Requirement::PanCard => write!(f, "PAN card"),
            Requirement::BankProof => write!(f, "cancelled cheque/bank statement"),
            Requirement::Photo => write!(f, "passport size photo"),
            Requirement::Email => write!(f, "email"),
            Requirement::Phone => write!(f, "phone"),
            Requirement::MotherName => write!(f, "mother's name"),
            Requirement::PlaceOfBirth => write!(f, "place of birth"),
            Requirement::Nominee => write!(f, "at least one nominee"),
            Requirement::NomineeName { nominee } => write!(f, "nominee {nominee} name"),
            Requirement::NomineeRelation { nominee } => write!(f, "nominee {nominee} relation"),
        }
    }
}

/// True iff the member satisfies every requirement for its age group.
pub fn evaluate(member: &MemberRecord) -> bool {
    missing_requirements(member).is_empty()
}

/// Every unmet requirement, in the order the form presents them.
pub fn missing_requirements(member: &MemberRecord) -> Vec<Requirement> {
    let mut missing = Vec::new();

    if member.name().trim().is_empty() {
        missing.push(Requirement::Name);
    }
    if member.age() < 0 {
        missing.push(Requirement::NonNegativeAge);
        return missing;
    }

    match member.documents() {
        MemberDocuments::Minor(minor) => minor_requirements(minor, &mut missing),
        MemberDocuments::Adult(adult) => {
            adult_requirements(adult, member.avatar_photo().is_present(), &mut missing)
        }
    }

    missing
}

fn minor_requirements(minor: &MinorDocuments, missing: &mut Vec<Requirement>) {
    if !minor.birth_certificate.is_present() {
        missing.push(Requirement::BirthCertificate);
    }
    if minor.guardians.is_empty() {
        missing.push(Requirement::Guardian);
    }
    for (index, guardian) in minor.guardians.iter().enumerate() {
        let position = index + 1;
        if !guardian.pan_document.is_present() {
            missing.push(Requirement::GuardianPan { guardian: position });
        }
        if !guardian.aadhaar_document.is_present() {
            missing.push(Requirement::GuardianAadhaar { guardian: position });
        }
    }
}

fn adult_requirements(adult: &AdultDocuments, has_photo: bool, missing: &mut Vec<Requirement>) {
    let documents = [
        (adult.e_aadhaar.is_present(), Requirement::EAadhaar),
        (adult.pan_card.is_present(), Requirement::PanCard),
        (adult.bank_proof.is_present(), Requirement::BankProof),
        (has_photo, Requirement::Photo),
    ];
    let text = [
        (&adult.email, Requirement::Email),
        (&adult.phone, Requirement::Phone),
        (&adult.mother_name, Requirement::MotherName),
        (&adult.place_of_birth, Requirement::PlaceOfBirth),
    ];

    missing.extend(
        documents
            .into_iter()
            .filter(|(present, _)| !present)
            .map(|(_, requirement)| requirement),
    );
    missing.extend(
        text.into_iter()
            .filter(|(value, _)| value.trim().is_empty())
            .map(|(_, requirement)| requirement),
    );

    if adult.nominees.is_empty() {
        missing.push(Requirement::Nominee);
    }
    for (index, nominee) in adult.nominees.iter().enumerate() {
        let position = index + 1;
        if nominee.name.trim().is_empty() {
            missing.push(Requirement::NomineeName { nominee: position });
        }
        if nominee.relation.trim().is_empty() {
            missing.push(Requirement::NomineeRelation { nominee: position });
        }
    }
}

/// Joins requirements for user-facing messages.
pub fn describe(missing: &[Requirement]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
