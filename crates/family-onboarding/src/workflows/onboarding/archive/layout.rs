use std::collections::BTreeSet;

use tracing::warn;

use super::manifest::MANIFEST_FILE_NAME;
use super::sanitize;
use crate::workflows::onboarding::domain::{
    base_name, DocumentField, DocumentSlot, GuardianDocumentField, MemberDocuments,
};
use crate::workflows::onboarding::member::MemberRecord;

/// Folder used when the head name sanitizes to nothing.
const FALLBACK_HEAD_FOLDER: &str = "Family";

pub(crate) fn head_folder(head_name: &str) -> String {
    let folder = sanitize(head_name.trim());
    if folder.is_empty() {
        FALLBACK_HEAD_FOLDER.to_string()
    } else {
        folder
    }
}

/// One folder name per member, in member order. A name already taken by an
/// earlier member gets its one-based position appended.
pub(super) fn member_folders(members: &[MemberRecord]) -> Vec<String> {
    let mut taken = BTreeSet::new();
    members
        .iter()
        .enumerate()
        .map(|(index, member)| {
            let position = index + 1;
            let base = match sanitize(member.name().trim()) {
                name if name.is_empty() => format!("Member_{position}"),
                name => name,
            };

            let mut folder = base.clone();
            let mut suffix = position;
            while taken.contains(&folder) {
                folder = format!("{base}_{suffix}");
                suffix += 1;
            }
            if folder != base {
                warn!(
                    member = position,
                    folder = %base,
                    renamed = %folder,
                    "member folder collides with an earlier member"
                );
            }
            taken.insert(folder.clone());
            folder
        })
        .collect()
}

/// Uploaded documents of one member in archive order, paired with the file
/// name each gets inside the member folder. Synthesized nested names are
/// reserved before any uploaded name is placed, so an upload that happens to
/// be called `guardian_1_pan.pdf` is the one that gets prefixed.
pub(super) fn document_entries(member: &MemberRecord) -> Vec<(String, &[u8])> {
    let mut entries = MemberEntries::default();

    match member.documents() {
        MemberDocuments::Adult(adult) => {
            for (index, nominee) in adult.nominees.iter().enumerate() {
                entries.nested("nominee", index + 1, "pan", &nominee.pan_document);
            }
            entries.top_level(DocumentField::EAadhaar.key(), &adult.e_aadhaar);
            entries.top_level(DocumentField::PanCard.key(), &adult.pan_card);
            entries.top_level(DocumentField::BankProof.key(), &adult.bank_proof);
            entries.top_level("photo", member.avatar_photo());
        }
        MemberDocuments::Minor(minor) => {
            for (index, guardian) in minor.guardians.iter().enumerate() {
                for (field, slot) in [
                    (GuardianDocumentField::Pan, &guardian.pan_document),
                    (GuardianDocumentField::Aadhaar, &guardian.aadhaar_document),
                    (GuardianDocumentField::Bank, &guardian.bank_document),
                ] {
                    entries.nested("guardian", index + 1, field.key(), slot);
                }
            }
            entries.top_level(
                DocumentField::BirthCertificate.key(),
                &minor.birth_certificate,
            );
            entries.top_level(DocumentField::MinorPan.key(), &minor.minor_pan);
            entries.top_level("photo", member.avatar_photo());
        }
    }

    entries.into_files()
}

struct MemberEntries<'a> {
    taken: BTreeSet<String>,
    files: Vec<(String, &'a [u8])>,
    nested: Vec<(String, &'a [u8])>,
}

impl Default for MemberEntries<'_> {
    fn default() -> Self {
        Self {
            taken: BTreeSet::from([MANIFEST_FILE_NAME.to_string()]),
            files: Vec::new(),
            nested: Vec::new(),
        }
    }
}

impl<'a> MemberEntries<'a> {
    fn top_level(&mut self, key: &str, slot: &'a DocumentSlot) {
        let (Some(filename), Some(bytes)) = (slot.filename(), slot.bytes()) else {
            return;
        };
        let original = base_name(filename).trim();
        let name = if matches!(original, "" | "." | "..") {
            key.to_string()
        } else if self.taken.contains(original) {
            format!("{key}_{original}")
        } else {
            original.to_string()
        };
        let name = self.claim(name);
        self.files.push((name, bytes));
    }

    fn nested(&mut self, group: &str, position: usize, field: &str, slot: &'a DocumentSlot) {
        let Some(bytes) = slot.bytes() else {
            return;
        };
        let name = match slot.extension() {
            Some(ext) => format!("{group}_{position}_{field}.{ext}"),
            None => format!("{group}_{position}_{field}"),
        };
        let name = self.claim(name);
        self.nested.push((name, bytes));
    }

    fn claim(&mut self, name: String) -> String {
        let mut unique = name.clone();
        let mut counter = 2;
        while self.taken.contains(&unique) {
            unique = format!("{counter}_{name}");
            counter += 1;
        }
        self.taken.insert(unique.clone());
        unique
    }

    /// Top-level documents first, then nested ones.
    fn into_files(mut self) -> Vec<(String, &'a [u8])> {
        self.files.append(&mut self.nested);
        self.files
    }
}
