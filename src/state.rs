use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::data::SettingsStore;
use crate::models::file_entry::Listing;
use crate::models::view::ViewQuery;
use crate::remote::download::DownloadHandler;
use crate::remote::RemoteFileStore;
use crate::services::confirm_service::Confirm;
use crate::services::notification_service::NotificationQueue;
use crate::services::permission_service::PermissionCheck;
use crate::store_path::StorePath;

/// The single in-progress folder rename, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RenameState {
    #[default]
    Idle,
    Editing { folder_name: String, draft: String },
}

#[derive(Debug, Default)]
pub struct BrowsingState {
    pub current_path: StorePath,
    pub listing: Listing,
    /// Location the displayed listing belongs to; `None` until the first load lands.
    pub listed_path: Option<StorePath>,
    pub loading: bool,
    pub rename: RenameState,
    pub new_folder_draft: String,
    pub query: ViewQuery,
}

pub struct AppState {
    pub store: Arc<dyn RemoteFileStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub permissions: Arc<dyn PermissionCheck>,
    pub confirm: Arc<dyn Confirm>,
    pub downloads: Arc<dyn DownloadHandler>,
    pub notifications: NotificationQueue,
    pub browsing: Mutex<BrowsingState>,
    pub listing_generation: AtomicU64,
}

impl AppState {
    pub fn browsing(&self) -> MutexGuard<'_, BrowsingState> {
        self.browsing
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current_path(&self) -> StorePath {
        self.browsing().current_path.clone()
    }

    /// Claims a new listing ticket for the current path. Only the most recently
    /// issued ticket may write its result back.
    pub fn begin_listing(&self) -> (StorePath, u64) {
        let mut browsing = self.browsing();
        browsing.loading = true;
        let generation = self.listing_generation.fetch_add(1, Ordering::SeqCst) + 1;
        (browsing.current_path.clone(), generation)
    }

    pub fn is_current_listing(&self, generation: u64) -> bool {
        self.listing_generation.load(Ordering::SeqCst) == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemorySettings;
    use crate::remote::fake::FakeStore;
    use crate::services::confirm_service::FixedAnswer;
    use crate::services::permission_service::{Role, SessionPermissions};
    use crate::test_support::RecordingDownloads;

    fn test_state() -> AppState {
        AppState {
            store: Arc::new(FakeStore::new()),
            settings: Arc::new(MemorySettings::default()),
            permissions: Arc::new(SessionPermissions::new(Some(Role::Admin))),
            confirm: Arc::new(FixedAnswer(true)),
            downloads: Arc::new(RecordingDownloads::default()),
            notifications: NotificationQueue::default(),
            browsing: Mutex::new(BrowsingState::default()),
            listing_generation: AtomicU64::new(0),
        }
    }

    #[test]
    fn listing_tickets_supersede_each_other() {
        let state = test_state();
        let (_, first) = state.begin_listing();
        let (_, second) = state.begin_listing();

        assert!(!state.is_current_listing(first));
        assert!(state.is_current_listing(second));
        assert!(state.browsing().loading);
    }

    #[test]
    fn ticket_carries_current_path() {
        let state = test_state();
        state.browsing().current_path = StorePath::new("legal/actas");
        let (path, _) = state.begin_listing();
        assert_eq!(path.as_str(), "legal/actas");
    }
}
