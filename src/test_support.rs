use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::data::MemorySettings;
use crate::error::AppError;
use crate::remote::download::DownloadHandler;
use crate::remote::fake::FakeStore;
use crate::services::confirm_service::Confirm;
use crate::services::notification_service::NotificationQueue;
use crate::services::permission_service::{Role, SessionPermissions};
use crate::state::{AppState, BrowsingState};

#[derive(Default)]
pub struct RecordingDownloads {
    pub saved: Mutex<Vec<(String, String)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl DownloadHandler for RecordingDownloads {
    async fn save(&self, file_name: &str, url: &str) -> Result<PathBuf, AppError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Io(std::io::Error::other("disk full")));
        }
        self.saved
            .lock()
            .unwrap()
            .push((file_name.to_string(), url.to_string()));
        Ok(PathBuf::from("/tmp").join(file_name))
    }
}

pub struct ScriptedConfirm {
    pub answer: AtomicBool,
    pub prompts: Mutex<Vec<String>>,
    gate: Mutex<Option<Arc<Notify>>>,
}

impl ScriptedConfirm {
    /// Keeps the next prompt open until the returned handle is notified.
    pub fn hold(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }
}

#[async_trait]
impl Confirm for ScriptedConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let gate = self.gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.answer.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub store: Arc<FakeStore>,
    pub settings: Arc<MemorySettings>,
    pub confirm: Arc<ScriptedConfirm>,
    pub downloads: Arc<RecordingDownloads>,
    pub permissions: Arc<SessionPermissions>,
}

pub fn harness(store: FakeStore, role: Role) -> Harness {
    let store = Arc::new(store);
    let settings = Arc::new(MemorySettings::default());
    let confirm = Arc::new(ScriptedConfirm {
        answer: AtomicBool::new(true),
        prompts: Mutex::new(Vec::new()),
        gate: Mutex::new(None),
    });
    let downloads = Arc::new(RecordingDownloads::default());
    let permissions = Arc::new(SessionPermissions::new(Some(role)));

    let state = Arc::new(AppState {
        store: store.clone(),
        settings: settings.clone(),
        permissions: permissions.clone(),
        confirm: confirm.clone(),
        downloads: downloads.clone(),
        notifications: NotificationQueue::default(),
        browsing: Mutex::new(BrowsingState::default()),
        listing_generation: AtomicU64::new(0),
    });

    Harness {
        state,
        store,
        settings,
        confirm,
        downloads,
        permissions,
    }
}
