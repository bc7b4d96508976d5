use std::io::Cursor;

use google_drive3::{api::File, api::Scope, DriveHub};
use tokio::runtime::Runtime;
use tracing::debug;

use super::{ObjectStore, ObjectStoreError, StoredObject};

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const ARCHIVE_MIME_TYPE: &str = "application/zip";

/// Google Drive backed object store. Calls run on an owned tokio runtime so
/// the submission flow stays synchronous; callers inside an async context
/// must reach it through `spawn_blocking`.
pub struct GoogleDriveObjectStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    hub: DriveHub<C>,
    runtime: Runtime,
    root_folder_id: String,
}

impl<C> GoogleDriveObjectStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    /// `root_folder_id` is the Drive folder the first path segment is created under
    /// (`"root"` for My Drive).
    pub fn new(hub: DriveHub<C>, runtime: Runtime, root_folder_id: impl Into<String>) -> Self {
        Self {
            hub,
            runtime,
            root_folder_id: root_folder_id.into(),
        }
    }

    pub fn with_runtime(
        hub: DriveHub<C>,
        root_folder_id: impl Into<String>,
    ) -> Result<Self, ObjectStoreError> {
        let runtime = Runtime::new().map_err(|err| ObjectStoreError::Runtime(err.to_string()))?;
        Ok(Self::new(hub, runtime, root_folder_id))
    }

    fn map_error<E: std::fmt::Display>(err: E) -> ObjectStoreError {
        ObjectStoreError::Backend(err.to_string())
    }

}

/// Folder lookups the store needs to resolve a path segment by segment.
trait FolderDirectory {
    fn find_folder(&self, name: &str, parent_id: &str) -> Result<Option<String>, ObjectStoreError>;
    fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, ObjectStoreError>;
}

/// Walks `segments` from `root_id`, reusing a folder whose name matches exactly
/// and creating it otherwise. Returns the id of the last folder.
fn ensure_folder_path<D: FolderDirectory + ?Sized>(
    directory: &D,
    root_id: &str,
    segments: &[String],
) -> Result<String, ObjectStoreError> {
    let mut parent = root_id.to_string();
    for segment in segments {
        parent = match directory.find_folder(segment, &parent)? {
            Some(existing) => existing,
            None => {
                debug!(folder = %segment, "creating drive folder");
                directory.create_folder(segment, &parent)?
            }
        };
    }
    Ok(parent)
}

impl<C> FolderDirectory for GoogleDriveObjectStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn find_folder(&self, name: &str, parent_id: &str) -> Result<Option<String>, ObjectStoreError> {
        let query = format!(
            "name = '{}' and mimeType = '{FOLDER_MIME_TYPE}' and '{parent_id}' in parents and trashed = false",
            escape_query_literal(name)
        );
        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .list()
                .q(&query)
                .param("fields", "files(id,name)")
                .page_size(10)
                .include_items_from_all_drives(true)
                .supports_all_drives(true)
                .add_scope(Scope::Full)
                .doit()
                .await
        });

        let (_, file_list) = result.map_err(Self::map_error)?;
        Ok(file_list
            .files
            .unwrap_or_default()
            .into_iter()
            .find(|file| file.name.as_deref() == Some(name))
            .and_then(|file| file.id))
    }

    fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, ObjectStoreError> {
        let metadata = File {
            name: Some(name.to_string()),
            mime_type: Some(FOLDER_MIME_TYPE.to_string()),
            parents: Some(vec![parent_id.to_string()]),
            ..File::default()
        };

        let folder_mime: mime::Mime = FOLDER_MIME_TYPE.parse().map_err(Self::map_error)?;
        let cursor = Cursor::new(Vec::new());

        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .create(metadata)
                .param("fields", "id")
                .supports_all_drives(true)
                .add_scope(Scope::Full)
                .upload(cursor, folder_mime)
                .await
        });

        let (_, folder) = result.map_err(Self::map_error)?;
        folder
            .id
            .ok_or_else(|| ObjectStoreError::Backend(format!("folder '{name}' created without id")))
    }
}

impl<C> std::fmt::Debug for GoogleDriveObjectStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDriveObjectStore")
            .field("root_folder_id", &self.root_folder_id)
            .finish_non_exhaustive()
    }
}

impl<C> ObjectStore for GoogleDriveObjectStore<C>
where
    C: google_drive3::common::Connector + Send + Sync + 'static,
{
    fn upload(
        &self,
        bytes: &[u8],
        folder_segments: &[String],
        filename: &str,
    ) -> Result<StoredObject, ObjectStoreError> {
        let parent_id = ensure_folder_path(self, &self.root_folder_id, folder_segments)?;
        let metadata = File {
            name: Some(filename.to_string()),
            parents: Some(vec![parent_id]),
            ..File::default()
        };
        let mime_type: mime::Mime = ARCHIVE_MIME_TYPE.parse().map_err(Self::map_error)?;
        let cursor = Cursor::new(bytes.to_vec());

        let result = self.runtime.block_on(async {
            self.hub
                .files()
                .create(metadata)
                .param("fields", "id,webViewLink")
                .supports_all_drives(true)
                .add_scope(Scope::Full)
                .upload(cursor, mime_type)
                .await
        });

        let (_, file) = result.map_err(Self::map_error)?;
        let file_id = file
            .id
            .ok_or_else(|| ObjectStoreError::Backend(format!("'{filename}' stored without id")))?;
        let url = file
            .web_view_link
            .unwrap_or_else(|| format!("https://drive.google.com/file/d/{file_id}/view"));
        Ok(StoredObject { file_id, url })
    }
}

/// Escapes a value for use inside a single-quoted Drive query literal.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

#[cfg(test)]
mod tests {
    use super::{ensure_folder_path, escape_query_literal, FolderDirectory, ObjectStoreError};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDirectory {
        // (id, name, parent id)
        folders: Mutex<Vec<(String, String, String)>>,
        created: Mutex<Vec<String>>,
    }

    impl FakeDirectory {
        fn with_folder(self, id: &str, name: &str, parent_id: &str) -> Self {
            self.folders
                .lock()
                .unwrap()
                .push((id.to_string(), name.to_string(), parent_id.to_string()));
            self
        }

        fn created(&self) -> Vec<String> {
            self.created.lock().unwrap().clone()
        }
    }

    impl FolderDirectory for FakeDirectory {
        fn find_folder(
            &self,
            name: &str,
            parent_id: &str,
        ) -> Result<Option<String>, ObjectStoreError> {
            Ok(self
                .folders
                .lock()
                .unwrap()
                .iter()
                .find(|(_, folder, parent)| folder == name && parent == parent_id)
                .map(|(id, _, _)| id.clone()))
        }

        fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, ObjectStoreError> {
            let mut folders = self.folders.lock().unwrap();
            let id = format!("folder-{}", folders.len() + 1);
            folders.push((id.clone(), name.to_string(), parent_id.to_string()));
            self.created.lock().unwrap().push(name.to_string());
            Ok(id)
        }
    }

    struct OfflineDirectory;

    impl FolderDirectory for OfflineDirectory {
        fn find_folder(&self, _: &str, _: &str) -> Result<Option<String>, ObjectStoreError> {
            Err(ObjectStoreError::Backend("drive offline".to_string()))
        }

        fn create_folder(&self, _: &str, _: &str) -> Result<String, ObjectStoreError> {
            panic!("create must not run after a failed lookup");
        }
    }

    fn segments(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn existing_folders_are_reused_and_missing_ones_created() {
        let directory = FakeDirectory::default()
            .with_folder("onboarding", "Onboarding", "root")
            .with_folder("ravi-elsewhere", "Ravi Kumar", "another-parent");

        let leaf = ensure_folder_path(
            &directory,
            "root",
            &segments(&["Onboarding", "Ravi Kumar", "2024-06"]),
        )
        .expect("path resolves");

        assert_eq!(directory.created(), vec!["Ravi Kumar", "2024-06"]);
        assert_eq!(leaf, "folder-4");

        let again = ensure_folder_path(
            &directory,
            "root",
            &segments(&["Onboarding", "Ravi Kumar", "2024-06"]),
        )
        .expect("path resolves");
        assert_eq!(again, leaf);
        assert_eq!(directory.created().len(), 2);
    }

    #[test]
    fn empty_path_resolves_to_root() {
        let directory = FakeDirectory::default();
        let leaf = ensure_folder_path(&directory, "root", &[]).expect("root");
        assert_eq!(leaf, "root");
        assert!(directory.created().is_empty());
    }

    #[test]
    fn lookup_failure_stops_the_walk() {
        let err = ensure_folder_path(&OfflineDirectory, "root", &segments(&["Onboarding"]))
            .expect_err("lookup fails");
        assert!(matches!(err, ObjectStoreError::Backend(reason) if reason == "drive offline"));
    }

    #[test]
    fn query_literals_escape_quotes_and_backslashes() {
        assert_eq!(escape_query_literal("O'Brien"), "O\\'Brien");
        assert_eq!(escape_query_literal("a\\b"), "a\\\\b");
    }
}
