use crate::error::AppError;
use crate::remote::UploadFile;
use crate::services::navigation_service::reload;
use crate::services::permission_service;
use crate::state::AppState;

/// Outcome of a sequential batch upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub requested: usize,
    pub uploaded: usize,
    pub failed: Option<String>,
}

/// Uploads `files` one after another into the current path. The first failure
/// stops the batch; files uploaded before it stay in the store.
pub async fn upload_batch(state: &AppState, files: &[UploadFile]) -> BatchReport {
    let mut report = BatchReport {
        requested: files.len(),
        uploaded: 0,
        failed: None,
    };

    if let Err(err) = permission_service::enforce(state.permissions.as_ref(), "upload files") {
        state
            .notifications
            .error(format!("Could not upload files: {}", err.user_message()));
        return report;
    }
    if files.is_empty() {
        return report;
    }

    let target = state.current_path();
    let mut failure = None;
    for file in files {
        match state.store.upload(file, &target).await {
            Ok(receipt) => {
                tracing::info!(file = %file.name, path = %receipt.path, "file uploaded");
                report.uploaded += 1;
            }
            Err(err) => {
                tracing::warn!(file = %file.name, error = %err, "upload failed; aborting batch");
                failure = Some((file.name.clone(), err));
                break;
            }
        }
    }

    match failure {
        None => {
            let message = if report.uploaded == 1 {
                format!("'{}' uploaded", files[0].name)
            } else {
                format!("{} files uploaded", report.uploaded)
            };
            state.notifications.success(message);
        }
        Some((name, err)) => {
            state.notifications.error(format!(
                "Upload of '{name}' failed: {} ({} of {} files uploaded)",
                err.user_message(),
                report.uploaded,
                report.requested
            ));
            report.failed = Some(name);
        }
    }

    if report.uploaded > 0 {
        reload(state).await;
    }
    report
}

async fn try_download(state: &AppState, name: &str) -> Result<std::path::PathBuf, AppError> {
    let file_path = state.current_path().file_path(name);
    let url = state.store.download_url(&file_path).await?;
    state.downloads.save(name, &url).await
}

pub async fn download_file(state: &AppState, name: &str) {
    match try_download(state, name).await {
        Ok(saved) => {
            state
                .notifications
                .success(format!("'{name}' saved to {}", saved.display()));
        }
        Err(err) => {
            tracing::warn!(file = name, error = %err, "download failed");
            state
                .notifications
                .error(format!("Could not download '{name}': {}", err.user_message()));
        }
    }
}

pub async fn delete_file(state: &AppState, name: &str) {
    if let Err(err) = permission_service::enforce(state.permissions.as_ref(), "delete file") {
        state
            .notifications
            .error(format!("Could not delete '{name}': {}", err.user_message()));
        return;
    }

    let target = state.current_path().join(name);
    if !state.confirm.confirm(&format!("Delete file '{target}'?")).await {
        return;
    }

    let file_path = target.as_str().to_string();
    match state.store.delete_file(&file_path).await {
        Ok(()) => {
            tracing::info!(file = %file_path, "file deleted");
            state.notifications.success(format!("'{name}' deleted"));
            reload(state).await;
        }
        Err(err) => {
            tracing::warn!(file = %file_path, error = %err, "delete failed");
            state
                .notifications
                .error(format!("Could not delete '{name}': {}", err.user_message()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::notification::NotificationKind;
    use crate::remote::fake::{FakeStore, StoreCall};
    use crate::services::navigation_service::navigate_to;
    use crate::services::permission_service::Role;
    use crate::test_support::{harness, Harness};
    use std::sync::atomic::Ordering;

    fn files(names: &[&str]) -> Vec<UploadFile> {
        names
            .iter()
            .map(|name| UploadFile::new(*name, name.as_bytes().to_vec()))
            .collect()
    }

    async fn admin_in(path: &str) -> Harness {
        let h = harness(FakeStore::new().with_file("docs/a.pdf", 5), Role::Admin);
        navigate_to(&h.state, path).await;
        h.store.clear_calls();
        h
    }

    #[tokio::test]
    async fn non_admin_upload_makes_no_calls() {
        let h = harness(FakeStore::new(), Role::Staff);
        let report = upload_batch(&h.state, &files(&["f.pdf"])).await;

        assert_eq!(report.uploaded, 0);
        assert!(h.store.calls().is_empty());
        let notes = h.state.notifications.snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert!(notes[0].message.contains("permission"));
    }

    #[tokio::test]
    async fn uploads_sequentially_into_current_path() {
        let h = admin_in("docs").await;
        let report = upload_batch(&h.state, &files(&["b.pdf", "c.jpg"])).await;

        assert_eq!(report.uploaded, 2);
        assert_eq!(
            h.store.mutation_calls(),
            vec![
                StoreCall::Upload { name: "b.pdf".to_string(), path: "docs".to_string() },
                StoreCall::Upload { name: "c.jpg".to_string(), path: "docs".to_string() },
            ]
        );
        assert_eq!(h.state.browsing().listing.files.len(), 3);
        let notes = h.state.notifications.snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].message, "2 files uploaded");
    }

    #[tokio::test]
    async fn failure_aborts_rest_and_keeps_earlier_uploads() {
        let h = admin_in("docs").await;
        h.store.fail_upload_of("bad.pdf");

        let report = upload_batch(&h.state, &files(&["ok.pdf", "bad.pdf", "never.pdf"])).await;

        assert_eq!(report.uploaded, 1);
        assert_eq!(report.failed.as_deref(), Some("bad.pdf"));
        assert_eq!(h.store.mutation_calls().len(), 2);
        assert!(h.store.contains_file("docs/ok.pdf"));
        assert!(!h.store.contains_file("docs/never.pdf"));

        let notes = h.state.notifications.snapshot();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::Error);
        assert!(notes[0].message.contains("1 of 3"));
    }

    #[tokio::test]
    async fn download_resolves_url_and_saves() {
        let h = admin_in("docs").await;
        download_file(&h.state, "a.pdf").await;

        let saved = h.downloads.saved.lock().unwrap().clone();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].0, "a.pdf");
        assert!(saved[0].1.starts_with("memory://docs/a.pdf"));
        assert_eq!(
            h.state.notifications.snapshot()[0].kind,
            NotificationKind::Success
        );
    }

    #[tokio::test]
    async fn download_of_missing_file_notifies() {
        let h = admin_in("docs").await;
        download_file(&h.state, "ghost.pdf").await;

        assert!(h.downloads.saved.lock().unwrap().is_empty());
        let notes = h.state.notifications.snapshot();
        assert_eq!(notes[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn download_save_failure_notifies() {
        let h = admin_in("docs").await;
        h.downloads.fail.store(true, Ordering::SeqCst);
        download_file(&h.state, "a.pdf").await;
        assert_eq!(
            h.state.notifications.snapshot()[0].kind,
            NotificationKind::Error
        );
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let h = admin_in("docs").await;
        h.confirm.answer.store(false, Ordering::SeqCst);
        delete_file(&h.state, "a.pdf").await;
        assert!(h.store.contains_file("docs/a.pdf"));

        h.confirm.answer.store(true, Ordering::SeqCst);
        delete_file(&h.state, "a.pdf").await;
        assert!(!h.store.contains_file("docs/a.pdf"));
        assert!(h.state.browsing().listing.files.is_empty());
    }

    #[tokio::test]
    async fn delete_failure_keeps_listing() {
        let h = admin_in("docs").await;
        h.store.fail_mutations.store(true, Ordering::SeqCst);
        delete_file(&h.state, "a.pdf").await;

        assert_eq!(h.state.browsing().listing.files.len(), 1);
        assert_eq!(
            h.state.notifications.snapshot()[0].kind,
            NotificationKind::Error
        );
    }

    #[tokio::test]
    async fn delete_file_keeps_target_when_navigating_during_prompt() {
        let h = harness(
            FakeStore::new()
                .with_file("a/acta.pdf", 1)
                .with_file("b/acta.pdf", 1),
            Role::Admin,
        );
        navigate_to(&h.state, "a").await;
        h.store.clear_calls();
        let gate = h.confirm.hold();

        let delete = delete_file(&h.state, "acta.pdf");
        let navigate = async {
            tokio::task::yield_now().await;
            navigate_to(&h.state, "b").await;
            gate.notify_one();
        };
        tokio::join!(delete, navigate);

        assert_eq!(
            h.store.mutation_calls(),
            vec![StoreCall::DeleteFile("a/acta.pdf".to_string())]
        );
        assert!(h.store.contains_file("b/acta.pdf"));
        assert_eq!(
            h.confirm.prompts.lock().unwrap()[0],
            "Delete file '/a/acta.pdf'?"
        );
    }
}
