//! Deterministic zip packaging of a family registry.
//!
//! Layout is `<Head>/<Member>/details.txt` followed by the member's uploads in
//! a fixed field order. Entry timestamps are pinned so identical registries
//! always produce identical bytes.

mod layout;
pub mod manifest;

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Cursor, Write};

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::registry::FamilyRegistry;
pub(crate) use layout::head_folder;
pub use manifest::{MemberManifest, MANIFEST_FILE_NAME};

/// Replaces every character outside `[A-Za-z0-9_]` with `_`, one for one.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Download name for a family's archive.
pub fn archive_file_name(head_name: &str) -> String {
    format!("{}_onboarding.zip", head_folder(head_name))
}

/// In-memory archive plus the manifest text generated for each member.
#[derive(Clone, PartialEq, Eq)]
pub struct AssembledArchive {
    pub file_name: String,
    pub bytes: Vec<u8>,
    /// Manifest text keyed by member index.
    pub manifests: BTreeMap<usize, String>,
    /// Entry paths in the order they were written.
    pub entries: Vec<String>,
}

impl fmt::Debug for AssembledArchive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssembledArchive")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("no family members to archive")]
    EmptyFamily,
    #[error("unable to write archive entry: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("unable to write archive entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Serializes a registry into a zip archive without touching the filesystem.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveAssembler {
    compression: CompressionMethod,
}

impl Default for ArchiveAssembler {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl ArchiveAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(compression: CompressionMethod) -> Self {
        Self { compression }
    }

    pub fn assemble(&self, registry: &FamilyRegistry) -> Result<AssembledArchive, ArchiveError> {
        if registry.is_empty() {
            return Err(ArchiveError::EmptyFamily);
        }

        let options = SimpleFileOptions::default()
            .compression_method(self.compression)
            .last_modified_time(zip::DateTime::default())
            .unix_permissions(0o644);

        let head = head_folder(registry.head_name());
        let folders = layout::member_folders(registry.members());
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut manifests = BTreeMap::new();
        let mut entries = Vec::new();

        for (index, (member, folder)) in registry.members().iter().zip(&folders).enumerate() {
            let manifest = MemberManifest::new(member).render();
            let path = format!("{head}/{folder}/{MANIFEST_FILE_NAME}");
            writer.start_file(path.as_str(), options)?;
            writer.write_all(manifest.as_bytes())?;
            entries.push(path);

            for (name, bytes) in layout::document_entries(member) {
                let path = format!("{head}/{folder}/{name}");
                writer.start_file(path.as_str(), options)?;
                writer.write_all(bytes)?;
                entries.push(path);
            }

            manifests.insert(index, manifest);
        }

        let bytes = writer.finish()?.into_inner();
        debug!(
            entries = entries.len(),
            size = bytes.len(),
            "onboarding archive assembled"
        );

        Ok(AssembledArchive {
            file_name: archive_file_name(registry.head_name()),
            bytes,
            manifests,
            entries,
        })
    }
}
