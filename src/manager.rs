use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use crate::data::SettingsStore;
use crate::models::file_entry::MimeCategory;
use crate::models::notification::Notification;
use crate::models::view::{ListingView, SortKey, TypeFilter, ViewQuery};
use crate::remote::download::DownloadHandler;
use crate::remote::{RemoteFileStore, UploadFile};
use crate::services::confirm_service::Confirm;
use crate::services::file_service::{self, BatchReport};
use crate::services::notification_service::NotificationQueue;
use crate::services::permission_service::PermissionCheck;
use crate::services::{folder_service, listing_service, navigation_service};
use crate::state::{AppState, BrowsingState, RenameState};
use crate::store_path::{Breadcrumb, StorePath};

/// External collaborators the file manager is wired to.
pub struct Ports {
    pub store: Arc<dyn RemoteFileStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub permissions: Arc<dyn PermissionCheck>,
    pub confirm: Arc<dyn Confirm>,
    pub downloads: Arc<dyn DownloadHandler>,
}

/// The document repository browser. Cheap to clone; clones share state.
///
/// Every operation reports its outcome through the notification queue, so
/// none of them return errors.
#[derive(Clone)]
pub struct FileManager {
    state: Arc<AppState>,
}

impl FileManager {
    /// Builds the manager and navigates to the remembered location.
    pub async fn open(ports: Ports) -> Self {
        Self::open_with_queue(ports, NotificationQueue::default()).await
    }

    pub async fn open_with_queue(ports: Ports, notifications: NotificationQueue) -> Self {
        let state = Arc::new(AppState {
            store: ports.store,
            settings: ports.settings,
            permissions: ports.permissions,
            confirm: ports.confirm,
            downloads: ports.downloads,
            notifications,
            browsing: Mutex::new(BrowsingState::default()),
            listing_generation: AtomicU64::new(0),
        });
        navigation_service::restore_last_path(&state).await;
        Self { state }
    }

    // Navigation

    pub async fn navigate_to(&self, path: &str) {
        navigation_service::navigate_to(&self.state, path).await;
    }

    pub async fn navigate_into_folder(&self, folder_name: &str) {
        navigation_service::navigate_into_folder(&self.state, folder_name).await;
    }

    pub async fn navigate_to_breadcrumb(&self, depth: usize) {
        navigation_service::navigate_to_breadcrumb(&self.state, depth).await;
    }

    pub async fn navigate_to_breadcrumb_path(&self, prefix: &str) {
        navigation_service::navigate_to_breadcrumb_path(&self.state, prefix).await;
    }

    pub async fn navigate_up(&self) {
        navigation_service::navigate_up(&self.state).await;
    }

    pub async fn reload(&self) {
        navigation_service::reload(&self.state).await;
    }

    // Folders

    pub fn set_new_folder_draft(&self, text: &str) {
        folder_service::set_new_folder_draft(&self.state, text);
    }

    pub async fn create_folder(&self, name: &str) {
        folder_service::create_folder(&self.state, name).await;
    }

    /// Creates a folder from the current draft.
    pub async fn create_folder_from_draft(&self) {
        let draft = self.new_folder_draft();
        folder_service::create_folder(&self.state, &draft).await;
    }

    pub fn start_rename(&self, folder_name: &str) {
        folder_service::start_rename(&self.state, folder_name);
    }

    pub fn update_rename_draft(&self, text: &str) {
        folder_service::update_rename_draft(&self.state, text);
    }

    pub async fn commit_rename(&self) {
        folder_service::commit_rename(&self.state).await;
    }

    pub fn cancel_rename(&self) {
        folder_service::cancel_rename(&self.state);
    }

    pub async fn delete_folder(&self, folder_name: &str) {
        folder_service::delete_folder(&self.state, folder_name).await;
    }

    // Files

    pub async fn upload_batch(&self, files: &[UploadFile]) -> BatchReport {
        file_service::upload_batch(&self.state, files).await
    }

    pub async fn download_file(&self, name: &str) {
        file_service::download_file(&self.state, name).await;
    }

    pub async fn delete_file(&self, name: &str) {
        file_service::delete_file(&self.state, name).await;
    }

    // View

    pub fn set_search_term(&self, term: &str) {
        listing_service::set_search_term(&self.state, term);
    }

    pub fn set_type_filter(&self, filter: TypeFilter) {
        listing_service::set_type_filter(&self.state, filter);
    }

    pub fn set_sort(&self, key: SortKey) {
        listing_service::set_sort(&self.state, key);
    }

    pub fn view(&self) -> ListingView {
        listing_service::current_view(&self.state)
    }

    pub fn query(&self) -> ViewQuery {
        self.state.browsing().query.clone()
    }

    pub fn category_counts(&self) -> BTreeMap<MimeCategory, usize> {
        listing_service::category_counts(&self.state.browsing().listing.files)
    }

    // Read-only state

    pub fn current_path(&self) -> StorePath {
        self.state.current_path()
    }

    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        self.state.current_path().breadcrumbs()
    }

    pub fn rename_state(&self) -> RenameState {
        self.state.browsing().rename.clone()
    }

    pub fn new_folder_draft(&self) -> String {
        self.state.browsing().new_folder_draft.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.browsing().loading
    }

    // Notifications

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.notifications.snapshot()
    }

    pub fn subscribe_notifications(&self) -> watch::Receiver<Vec<Notification>> {
        self.state.notifications.subscribe()
    }

    pub fn dismiss_notification(&self, id: &str) {
        self.state.notifications.remove(id);
    }

    /// Cancels pending notification timers. The manager stays usable.
    pub fn shutdown(&self) {
        self.state.notifications.shutdown();
    }
}
