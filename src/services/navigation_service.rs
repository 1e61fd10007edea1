use crate::models::file_entry::Listing;
use crate::state::{AppState, RenameState};
use crate::store_path::StorePath;

/// Settings key holding the last browsed location.
pub const LAST_PATH_KEY: &str = "formatos.last_path";

pub fn read_last_path(state: &AppState) -> StorePath {
    match state.settings.get(LAST_PATH_KEY) {
        Ok(Some(path)) => StorePath::new(&path),
        Ok(None) => StorePath::root(),
        Err(err) => {
            tracing::warn!(error = %err, "could not read last path; starting at root");
            StorePath::root()
        }
    }
}

fn persist_last_path(state: &AppState, path: &StorePath) {
    if let Err(err) = state.settings.set(LAST_PATH_KEY, path.as_str()) {
        tracing::warn!(error = %err, path = %path, "could not persist last path");
    }
}

/// Lists the current path and stores the result if no newer listing was
/// issued in the meantime. Failures are reported, never returned.
pub async fn reload(state: &AppState) {
    let (path, generation) = state.begin_listing();
    let result = state.store.list(&path).await;

    let mut browsing = state.browsing();
    if !state.is_current_listing(generation) {
        tracing::debug!(path = %path, generation, "discarding stale listing");
        return;
    }
    browsing.loading = false;

    match result {
        Ok(listing) => {
            tracing::debug!(
                path = %path,
                files = listing.files.len(),
                folders = listing.folders.len(),
                "listing loaded"
            );
            browsing.listing = listing;
            browsing.listed_path = Some(path);
            browsing.rename = RenameState::Idle;
        }
        Err(err) => {
            tracing::warn!(path = %path, error = %err, "listing failed");
            // Keep the last good listing when it is for the same location.
            if browsing.listed_path.as_ref() != Some(&path) {
                browsing.listing = Listing::default();
                browsing.listed_path = Some(path);
            }
            drop(browsing);
            state
                .notifications
                .error(format!("Could not load folder: {}", err.user_message()));
        }
    }
}

pub async fn navigate_to(state: &AppState, path: &str) {
    let target = StorePath::new(path);
    {
        let mut browsing = state.browsing();
        browsing.current_path = target.clone();
        browsing.rename = RenameState::Idle;
    }
    tracing::info!(path = %target, "navigate");
    persist_last_path(state, &target);
    reload(state).await;
}

pub async fn navigate_into_folder(state: &AppState, folder_name: &str) {
    let target = state.current_path().join(folder_name);
    navigate_to(state, target.as_str()).await;
}

/// Navigates to the first `depth` segments of the current path.
pub async fn navigate_to_breadcrumb(state: &AppState, depth: usize) {
    let target = state.current_path().prefix(depth);
    navigate_to(state, target.as_str()).await;
}

/// Breadcrumb click by path. Only prefixes of the current location are accepted.
pub async fn navigate_to_breadcrumb_path(state: &AppState, prefix: &str) {
    let target = StorePath::new(prefix);
    if !state.current_path().is_within(&target) {
        tracing::debug!(path = %target, "ignoring breadcrumb outside current path");
        return;
    }
    navigate_to(state, target.as_str()).await;
}

pub async fn navigate_up(state: &AppState) {
    if let Some(parent) = state.current_path().parent() {
        navigate_to(state, parent.as_str()).await;
    }
}

/// Startup: go to the remembered location (root when none) exactly once.
pub async fn restore_last_path(state: &AppState) {
    let last = read_last_path(state);
    navigate_to(state, last.as_str()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SettingsStore;
    use crate::remote::fake::{FakeStore, StoreCall};
    use crate::services::permission_service::Role;
    use crate::test_support::{harness, Harness};
    use std::sync::atomic::Ordering;

    fn store() -> FakeStore {
        FakeStore::new()
            .with_file("legal/contratos/2024/a.pdf", 10)
            .with_file("legal/acta.pdf", 20)
            .with_file("fotos/b.jpg", 30)
    }

    #[tokio::test]
    async fn navigate_normalizes_and_persists() {
        let Harness { state, settings, .. } = harness(store(), Role::Admin);

        navigate_to(&state, "/legal//contratos/").await;

        assert_eq!(state.current_path().as_str(), "legal/contratos");
        assert_eq!(
            settings.get(LAST_PATH_KEY).unwrap().as_deref(),
            Some("legal/contratos")
        );
        assert_eq!(state.browsing().listing.folders, vec!["2024"]);
    }

    #[tokio::test]
    async fn folder_click_joins_current_path() {
        let Harness { state, .. } = harness(store(), Role::Viewer);

        navigate_into_folder(&state, "legal").await;
        assert_eq!(state.current_path().as_str(), "legal");
        navigate_into_folder(&state, "contratos").await;
        assert_eq!(state.current_path().as_str(), "legal/contratos");
    }

    #[tokio::test]
    async fn breadcrumb_navigates_to_prefix() {
        let Harness { state, .. } = harness(store(), Role::Viewer);
        let full = StorePath::new("legal/contratos/2024");

        for k in 0..=full.depth() {
            navigate_to(&state, full.as_str()).await;
            navigate_to_breadcrumb(&state, k).await;
            assert_eq!(
                state.current_path().as_str(),
                full.segments()[..k].join("/")
            );
        }
    }

    #[tokio::test]
    async fn navigate_up_stops_at_root() {
        let Harness { state, store, .. } = harness(store(), Role::Viewer);
        navigate_to(&state, "legal").await;
        navigate_up(&state).await;
        assert!(state.current_path().is_root());

        store.clear_calls();
        navigate_up(&state).await;
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn navigating_twice_is_idempotent() {
        let Harness { state, .. } = harness(store(), Role::Viewer);
        navigate_to(&state, "legal").await;
        let once = state.browsing().listing.clone();
        navigate_to(&state, "legal").await;
        assert_eq!(state.browsing().listing, once);
    }

    #[tokio::test]
    async fn restore_reads_persisted_path_once() {
        let Harness {
            state,
            settings,
            store,
            ..
        } = harness(store(), Role::Viewer);
        settings.set(LAST_PATH_KEY, "fotos").unwrap();

        restore_last_path(&state).await;

        assert_eq!(state.current_path().as_str(), "fotos");
        assert_eq!(store.calls(), vec![StoreCall::List("fotos".to_string())]);
        assert_eq!(state.browsing().listing.files[0].name, "b.jpg");
    }

    #[tokio::test]
    async fn restore_defaults_to_root() {
        let Harness { state, .. } = harness(store(), Role::Viewer);
        restore_last_path(&state).await;
        assert!(state.current_path().is_root());
        assert_eq!(state.browsing().listing.folders, vec!["fotos", "legal"]);
    }

    #[tokio::test]
    async fn stale_listing_is_discarded() {
        let Harness { state, store, .. } = harness(store(), Role::Viewer);
        let gate = store.hold_list("legal");

        let slow = navigate_to(&state, "legal");
        let fast = async {
            tokio::task::yield_now().await;
            navigate_to(&state, "fotos").await;
            gate.notify_one();
        };
        tokio::join!(slow, fast);

        assert_eq!(state.current_path().as_str(), "fotos");
        let browsing = state.browsing();
        assert_eq!(browsing.listed_path, Some(StorePath::new("fotos")));
        assert_eq!(browsing.listing.files.len(), 1);
        assert_eq!(browsing.listing.files[0].name, "b.jpg");
        assert!(!browsing.loading);
    }

    #[tokio::test]
    async fn failed_reload_keeps_listing_for_same_path() {
        let Harness { state, store, .. } = harness(store(), Role::Viewer);
        navigate_to(&state, "legal").await;
        let before = state.browsing().listing.clone();

        store.fail_lists.store(true, Ordering::SeqCst);
        reload(&state).await;

        assert_eq!(state.browsing().listing, before);
        assert_eq!(state.notifications.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn failed_navigation_shows_empty_listing() {
        let Harness { state, store, .. } = harness(store(), Role::Viewer);
        navigate_to(&state, "legal").await;

        store.fail_lists.store(true, Ordering::SeqCst);
        navigate_to(&state, "fotos").await;

        assert_eq!(state.current_path().as_str(), "fotos");
        assert_eq!(state.browsing().listing, Listing::default());
        let notes = state.notifications.snapshot();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].message.starts_with("Could not load folder"));
    }

    #[tokio::test]
    async fn breadcrumb_path_must_be_a_prefix() {
        let Harness { state, store, .. } = harness(store(), Role::Viewer);
        navigate_to(&state, "legal/contratos/2024").await;

        store.clear_calls();
        navigate_to_breadcrumb_path(&state, "fotos").await;
        assert!(store.calls().is_empty());

        navigate_to_breadcrumb_path(&state, "/legal/").await;
        assert_eq!(state.current_path().as_str(), "legal");
    }
}
