use std::fmt::{self, Write as _};

use crate::workflows::onboarding::domain::{
    AdultDocuments, DocumentSlot, MemberDocuments, MinorDocuments,
};
use crate::workflows::onboarding::member::MemberRecord;

/// Name of the generated summary written first into every member folder.
pub const MANIFEST_FILE_NAME: &str = "details.txt";

/// Plain-text summary of one member, rendered fresh on each assembly.
#[derive(Debug, Clone, Copy)]
pub struct MemberManifest<'a> {
    member: &'a MemberRecord,
}

impl<'a> MemberManifest<'a> {
    pub fn new(member: &'a MemberRecord) -> Self {
        Self { member }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for MemberManifest<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let member = self.member;
        writeln!(f, "Name: {}", member.name())?;
        writeln!(f, "Age: {}", member.age())?;
        writeln!(f, "Type: {}", member.kind().label())?;

        match member.documents() {
            MemberDocuments::Minor(minor) => write_minor(f, minor),
            MemberDocuments::Adult(adult) => write_adult(f, adult, member.avatar_photo()),
        }
    }
}

fn write_minor(f: &mut fmt::Formatter<'_>, minor: &MinorDocuments) -> fmt::Result {
    writeln!(f, "Number of Guardians: {}", minor.guardians.len())?;
    for (index, guardian) in minor.guardians.iter().enumerate() {
        writeln!(f, "  Guardian {}:", index + 1)?;
        status_line(f, "    Guardian PAN", &guardian.pan_document)?;
        status_line(f, "    Guardian Aadhaar", &guardian.aadhaar_document)?;
        status_line(
            f,
            "    Guardian Bank Statement/Cheque",
            &guardian.bank_document,
        )?;
    }
    status_line(f, "Birth Certificate", &minor.birth_certificate)?;
    status_line(f, "Minor PAN Card", &minor.minor_pan)
}

fn write_adult(
    f: &mut fmt::Formatter<'_>,
    adult: &AdultDocuments,
    photo: &DocumentSlot,
) -> fmt::Result {
    status_line(f, "E-Aadhaar", &adult.e_aadhaar)?;
    status_line(f, "PAN Card", &adult.pan_card)?;
    status_line(f, "Cancelled Cheque/Bank Statement", &adult.bank_proof)?;
    status_line(f, "Passport Size Photo", photo)?;
    writeln!(f, "Email: {}", adult.email)?;
    writeln!(f, "Phone: {}", adult.phone)?;
    writeln!(f, "Mother Name: {}", adult.mother_name)?;
    writeln!(f, "Place of Birth: {}", adult.place_of_birth)?;
    writeln!(f, "Number of Nominees: {}", adult.nominees.len())?;
    for (index, nominee) in adult.nominees.iter().enumerate() {
        writeln!(f, "  Nominee {}:", index + 1)?;
        writeln!(f, "    Name: {}", nominee.name)?;
        writeln!(f, "    Relation: {}", nominee.relation)?;
        status_line(f, "    PAN Card", &nominee.pan_document)?;
        writeln!(f, "    Occupation: {}", nominee.occupation)?;
        writeln!(f, "    Income: {}", nominee.income)?;
    }
    Ok(())
}

fn status_line(f: &mut fmt::Formatter<'_>, label: &str, slot: &DocumentSlot) -> fmt::Result {
    writeln!(f, "{label}: {}", slot.status_label())
}

/// Short family overview used in notification bodies.
pub fn family_overview(members: &[MemberRecord]) -> String {
    let mut overview = String::new();
    for (index, member) in members.iter().enumerate() {
        // Writing into a String cannot fail.
        let _ = writeln!(
            overview,
            "{}. {} (age {}, {})",
            index + 1,
            member.name(),
            member.age(),
            member.kind().label()
        );
    }
    overview
}
