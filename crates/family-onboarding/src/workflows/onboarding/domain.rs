use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Age at which a member moves from the minor to the adult document set.
pub const ADULT_AGE: i32 = 18;
/// Upper bound on guardians recorded for a minor.
pub const MAX_GUARDIANS: usize = 2;
/// Upper bound on nominees recorded for an adult.
pub const MAX_NOMINEES: usize = 3;

pub fn is_minor(age: i32) -> bool {
    age < ADULT_AGE
}

/// Which of the two document shapes a member carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Minor,
    Adult,
}

impl MemberKind {
    pub fn for_age(age: i32) -> Self {
        if is_minor(age) {
            MemberKind::Minor
        } else {
            MemberKind::Adult
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            MemberKind::Minor => "Minor",
            MemberKind::Adult => "Adult",
        }
    }
}

/// File payload received from the upload widget.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedDocument {
    pub filename: String,
    #[serde(
        rename = "content_base64",
        serialize_with = "encode_base64",
        deserialize_with = "decode_base64"
    )]
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadedDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedDocument")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn encode_base64<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&STANDARD.encode(bytes))
}

fn decode_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    STANDARD
        .decode(raw.trim())
        .map_err(serde::de::Error::custom)
}

/// A single uploaded artifact. Name and bytes are present together or not at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<UploadedDocument>", into = "Option<UploadedDocument>")]
pub struct DocumentSlot {
    upload: Option<UploadedDocument>,
}

impl DocumentSlot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn uploaded(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let mut slot = Self::default();
        slot.set(filename, bytes);
        slot
    }

    /// Build a slot from what an upload widget reports. The slot only counts as
    /// present once the widget has produced both a name and readable bytes.
    pub fn from_widget(filename: Option<String>, bytes: Option<Vec<u8>>) -> Self {
        match (filename, bytes) {
            (Some(filename), Some(bytes)) => Self::uploaded(filename, bytes),
            _ => Self::default(),
        }
    }

    pub fn set(&mut self, filename: impl Into<String>, bytes: Vec<u8>) {
        let filename = filename.into();
        self.upload = if filename.trim().is_empty() {
            None
        } else {
            Some(UploadedDocument { filename, bytes })
        };
    }

    pub fn clear(&mut self) {
        self.upload = None;
    }

    pub fn is_present(&self) -> bool {
        self.upload.is_some()
    }

    pub fn filename(&self) -> Option<&str> {
        self.upload.as_ref().map(|upload| upload.filename.as_str())
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.upload.as_ref().map(|upload| upload.bytes.as_slice())
    }

    /// Extension of the uploaded file name, without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        let name = base_name(self.filename()?);
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
            _ => None,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.upload.is_some() {
            "Uploaded"
        } else {
            "Not uploaded"
        }
    }
}

impl From<Option<UploadedDocument>> for DocumentSlot {
    fn from(value: Option<UploadedDocument>) -> Self {
        match value {
            Some(upload) => Self::uploaded(upload.filename, upload.bytes),
            None => Self::default(),
        }
    }
}

impl From<DocumentSlot> for Option<UploadedDocument> {
    fn from(value: DocumentSlot) -> Self {
        value.upload
    }
}

/// Final path component of an uploaded file name, across both separator styles.
pub fn base_name(filename: &str) -> &str {
    filename
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(filename)
}

/// Beneficiary designated by an adult member.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NomineeEntry {
    pub name: String,
    pub relation: String,
    pub occupation: String,
    pub income: String,
    pub pan_document: DocumentSlot,
}

/// Legal guardian documents attached to a minor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianEntry {
    pub pan_document: DocumentSlot,
    pub aadhaar_document: DocumentSlot,
    pub bank_document: DocumentSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinorDocuments {
    pub birth_certificate: DocumentSlot,
    pub minor_pan: DocumentSlot,
    pub guardians: Vec<GuardianEntry>,
}

impl MinorDocuments {
    pub fn blank() -> Self {
        Self {
            birth_certificate: DocumentSlot::empty(),
            minor_pan: DocumentSlot::empty(),
            guardians: vec![GuardianEntry::default()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdultDocuments {
    pub e_aadhaar: DocumentSlot,
    pub pan_card: DocumentSlot,
    pub bank_proof: DocumentSlot,
    pub email: String,
    pub phone: String,
    pub mother_name: String,
    pub place_of_birth: String,
    pub nominees: Vec<NomineeEntry>,
}

impl AdultDocuments {
    pub fn blank() -> Self {
        Self {
            e_aadhaar: DocumentSlot::empty(),
            pan_card: DocumentSlot::empty(),
            bank_proof: DocumentSlot::empty(),
            email: String::new(),
            phone: String::new(),
            mother_name: String::new(),
            place_of_birth: String::new(),
            nominees: vec![NomineeEntry::default()],
        }
    }
}

/// Age-conditioned document bag; the variant always matches the member's age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MemberDocuments {
    Minor(MinorDocuments),
    Adult(AdultDocuments),
}

impl MemberDocuments {
    pub fn blank_for(age: i32) -> Self {
        match MemberKind::for_age(age) {
            MemberKind::Minor => MemberDocuments::Minor(MinorDocuments::blank()),
            MemberKind::Adult => MemberDocuments::Adult(AdultDocuments::blank()),
        }
    }

    pub fn kind(&self) -> MemberKind {
        match self {
            MemberDocuments::Minor(_) => MemberKind::Minor,
            MemberDocuments::Adult(_) => MemberKind::Adult,
        }
    }
}

/// Top-level document slots a member update can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentField {
    EAadhaar,
    PanCard,
    BankProof,
    BirthCertificate,
    MinorPan,
}

impl DocumentField {
    pub const fn applies_to(self) -> MemberKind {
        match self {
            DocumentField::EAadhaar | DocumentField::PanCard | DocumentField::BankProof => {
                MemberKind::Adult
            }
            DocumentField::BirthCertificate | DocumentField::MinorPan => MemberKind::Minor,
        }
    }

    /// Stable key used when an archive entry name needs disambiguating.
    pub const fn key(self) -> &'static str {
        match self {
            DocumentField::EAadhaar => "e_aadhaar",
            DocumentField::PanCard => "pan_card",
            DocumentField::BankProof => "bank_proof",
            DocumentField::BirthCertificate => "birth_certificate",
            DocumentField::MinorPan => "minor_pan",
        }
    }
}

/// Free-text fields collected for adults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Email,
    Phone,
    MotherName,
    PlaceOfBirth,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardianDocumentField {
    Pan,
    Aadhaar,
    Bank,
}

impl GuardianDocumentField {
    pub const fn key(self) -> &'static str {
        match self {
            GuardianDocumentField::Pan => "pan",
            GuardianDocumentField::Aadhaar => "aadhaar",
            GuardianDocumentField::Bank => "bank",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NomineeTextField {
    Name,
    Relation,
    Occupation,
    Income,
}
