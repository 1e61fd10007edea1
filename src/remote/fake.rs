use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use super::{FolderDescriptor, RemoteFileStore, UploadFile, UploadReceipt};
use crate::error::AppError;
use crate::models::file_entry::{FileEntry, Listing};
use crate::store_path::StorePath;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    List(String),
    Upload { name: String, path: String },
    DownloadUrl(String),
    DeleteFile(String),
    CreateFolder { name: String, parent: String },
    RenameFolder { old_name: String, new_name: String, parent: String },
    DeleteFolder(String),
}

impl StoreCall {
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::List(_) | Self::DownloadUrl(_))
    }
}

#[derive(Default)]
struct FakeState {
    objects: BTreeMap<String, FileEntry>,
    folders: BTreeSet<String>,
    calls: Vec<StoreCall>,
    failing_uploads: HashSet<String>,
    list_gates: HashMap<String, Arc<Notify>>,
    next_id: u64,
}

/// In-memory document store that behaves like the REST backend: folders are
/// derived from object prefixes plus explicitly created empty folders.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<FakeState>,
    pub fail_lists: AtomicBool,
    pub fail_mutations: AtomicBool,
}

fn parent_of(path: &str) -> String {
    StorePath::new(path)
        .parent()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default()
}

fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from {
        return Some(to.to_string());
    }
    path.strip_prefix(&format!("{from}/"))
        .map(|rest| format!("{to}/{rest}"))
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: StoreCall) {
        self.lock().calls.push(call);
    }

    fn check_mutation(&self) -> Result<(), AppError> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(AppError::Network("connection reset".to_string()));
        }
        Ok(())
    }

    pub fn with_file(self, path: &str, size: u64) -> Self {
        self.insert_file(path, size);
        self
    }

    pub fn with_folder(self, path: &str) -> Self {
        self.lock().folders.insert(StorePath::new(path).as_str().to_string());
        self
    }

    pub fn insert_file(&self, path: &str, size: u64) {
        let path = StorePath::new(path);
        let Some(name) = path.name().map(str::to_string) else {
            return;
        };
        let mut state = self.lock();
        state.next_id += 1;
        let entry = FileEntry::new(state.next_id.to_string(), name, size, Utc::now());
        state.objects.insert(path.as_str().to_string(), entry);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn mutation_calls(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.lock().objects.contains_key(path)
    }

    pub fn fail_upload_of(&self, name: &str) {
        self.lock().failing_uploads.insert(name.to_string());
    }

    /// Makes the next `list` of `path` wait until the returned handle is notified.
    pub fn hold_list(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.lock()
            .list_gates
            .insert(StorePath::new(path).as_str().to_string(), Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl RemoteFileStore for FakeStore {
    async fn list(&self, path: &StorePath) -> Result<Listing, AppError> {
        self.record(StoreCall::List(path.as_str().to_string()));
        let gate = self.lock().list_gates.remove(path.as_str());
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(AppError::Network("listing timed out".to_string()));
        }

        let state = self.lock();
        let here = path.as_str();
        let files = state
            .objects
            .iter()
            .filter(|(key, _)| parent_of(key) == here)
            .map(|(_, entry)| entry.clone())
            .collect();

        let mut folders = BTreeSet::new();
        let known = state
            .objects
            .keys()
            .map(|key| parent_of(key))
            .chain(state.folders.iter().cloned());
        for folder in known {
            let folder = StorePath::new(&folder);
            if folder.depth() > path.depth() && folder.is_within(path) {
                if let Some(child) = folder.prefix(path.depth() + 1).name() {
                    folders.insert(child.to_string());
                }
            }
        }

        Ok(Listing {
            files,
            folders: folders.into_iter().collect(),
        })
    }

    async fn upload(&self, file: &UploadFile, path: &StorePath) -> Result<UploadReceipt, AppError> {
        self.record(StoreCall::Upload {
            name: file.name.clone(),
            path: path.as_str().to_string(),
        });
        self.check_mutation()?;
        if self.lock().failing_uploads.contains(&file.name) {
            return Err(AppError::Network(format!("upload of {} interrupted", file.name)));
        }
        let object_path = path.file_path(&file.name);
        self.insert_file(&object_path, file.size());
        Ok(UploadReceipt {
            url: format!("memory://{object_path}"),
            path: object_path,
        })
    }

    async fn download_url(&self, file_path: &str) -> Result<String, AppError> {
        self.record(StoreCall::DownloadUrl(file_path.to_string()));
        if !self.contains_file(file_path) {
            return Err(AppError::NotFound(format!("File not found: {file_path}")));
        }
        Ok(format!("memory://{file_path}?token=short-lived"))
    }

    async fn delete_file(&self, file_path: &str) -> Result<(), AppError> {
        self.record(StoreCall::DeleteFile(file_path.to_string()));
        self.check_mutation()?;
        match self.lock().objects.remove(file_path) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("File not found: {file_path}"))),
        }
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: &StorePath,
    ) -> Result<FolderDescriptor, AppError> {
        self.record(StoreCall::CreateFolder {
            name: name.to_string(),
            parent: parent.as_str().to_string(),
        });
        self.check_mutation()?;
        let existing = self.list_names(parent);
        if existing.contains(name) {
            return Err(AppError::Validation("Folder already exists".to_string()));
        }
        let path = parent.join(name);
        self.lock().folders.insert(path.as_str().to_string());
        Ok(FolderDescriptor {
            name: name.to_string(),
            path: path.as_str().to_string(),
        })
    }

    async fn rename_folder(
        &self,
        old_name: &str,
        new_name: &str,
        parent: &StorePath,
    ) -> Result<(), AppError> {
        self.record(StoreCall::RenameFolder {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            parent: parent.as_str().to_string(),
        });
        self.check_mutation()?;
        let existing = self.list_names(parent);
        if !existing.contains(old_name) {
            return Err(AppError::NotFound(format!("Folder not found: {old_name}")));
        }
        if existing.contains(new_name) {
            return Err(AppError::Validation("Folder already exists".to_string()));
        }

        let from = parent.join(old_name).as_str().to_string();
        let to = parent.join(new_name).as_str().to_string();
        let mut state = self.lock();
        state.objects = std::mem::take(&mut state.objects)
            .into_iter()
            .map(|(key, entry)| (rebase(&key, &from, &to).unwrap_or(key), entry))
            .collect();
        state.folders = std::mem::take(&mut state.folders)
            .into_iter()
            .map(|key| rebase(&key, &from, &to).unwrap_or(key))
            .collect();
        Ok(())
    }

    async fn delete_folder(&self, folder_path: &str) -> Result<(), AppError> {
        self.record(StoreCall::DeleteFolder(folder_path.to_string()));
        self.check_mutation()?;
        let mut state = self.lock();
        state.objects.retain(|key, _| rebase(key, folder_path, "").is_none());
        state.folders.retain(|key| rebase(key, folder_path, "").is_none());
        Ok(())
    }
}

impl FakeStore {
    fn list_names(&self, parent: &StorePath) -> HashSet<String> {
        let state = self.lock();
        state
            .objects
            .keys()
            .map(|key| parent_of(key))
            .chain(state.folders.iter().cloned())
            .filter_map(|folder| {
                let folder = StorePath::new(&folder);
                if folder.depth() > parent.depth() && folder.is_within(parent) {
                    folder.prefix(parent.depth() + 1).name().map(str::to_string)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn infers_folders_from_prefixes() {
        let store = FakeStore::new()
            .with_file("legal/contratos/a.pdf", 1)
            .with_file("legal/acta.pdf", 1)
            .with_folder("fotos");

        let root = store.list(&StorePath::root()).await.unwrap();
        assert_eq!(root.folders, vec!["fotos", "legal"]);
        assert!(root.files.is_empty());

        let legal = store.list(&StorePath::new("legal")).await.unwrap();
        assert_eq!(legal.folders, vec!["contratos"]);
        assert_eq!(legal.files.len(), 1);
        assert_eq!(legal.files[0].name, "acta.pdf");
    }

    #[tokio::test]
    async fn rename_moves_nested_objects() {
        let store = FakeStore::new().with_file("docs/2024/a.pdf", 1);
        store
            .rename_folder("docs", "archivo", &StorePath::root())
            .await
            .unwrap();
        assert!(store.contains_file("archivo/2024/a.pdf"));
        assert!(!store.contains_file("docs/2024/a.pdf"));
    }

    #[tokio::test]
    async fn duplicate_folder_is_rejected() {
        let store = FakeStore::new().with_folder("docs");
        let err = store.create_folder("docs", &StorePath::root()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_folder_removes_subtree_only() {
        let store = FakeStore::new()
            .with_file("docs/a.pdf", 1)
            .with_file("docsx/b.pdf", 1);
        store.delete_folder("docs").await.unwrap();
        assert!(!store.contains_file("docs/a.pdf"));
        assert!(store.contains_file("docsx/b.pdf"));
    }
}
