use crate::error::AppError;
use crate::services::navigation_service::reload;
use crate::services::permission_service;
use crate::state::{AppState, RenameState};

fn validate_folder_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Folder name cannot be empty".to_string()));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(AppError::Validation(
            "Folder name cannot contain slashes".to_string(),
        ));
    }
    if trimmed == "." || trimmed == ".." {
        return Err(AppError::Validation(format!("'{trimmed}' is not a valid folder name")));
    }
    Ok(trimmed.to_string())
}

fn report_failure(state: &AppState, action: &str, err: &AppError) {
    tracing::warn!(action, error = %err, "folder operation failed");
    state
        .notifications
        .error(format!("Could not {action}: {}", err.user_message()));
}

pub fn set_new_folder_draft(state: &AppState, text: &str) {
    state.browsing().new_folder_draft = text.to_string();
}

async fn try_create_folder(state: &AppState, name: &str) -> Result<String, AppError> {
    permission_service::enforce(state.permissions.as_ref(), "create folder")?;
    let name = validate_folder_name(name)?;
    let parent = state.current_path();
    state.store.create_folder(&name, &parent).await?;
    tracing::info!(folder = %name, parent = %parent, "folder created");
    Ok(name)
}

pub async fn create_folder(state: &AppState, name: &str) {
    match try_create_folder(state, name).await {
        Ok(name) => {
            state.browsing().new_folder_draft.clear();
            state
                .notifications
                .success(format!("Folder '{name}' created"));
            reload(state).await;
        }
        Err(err) => report_failure(state, "create folder", &err),
    }
}

/// Opens a rename session for `folder_name`, replacing any session in progress.
pub fn start_rename(state: &AppState, folder_name: &str) {
    let mut browsing = state.browsing();
    if let RenameState::Editing { folder_name: previous, .. } = &browsing.rename {
        tracing::debug!(%previous, "discarding uncommitted rename");
    }
    browsing.rename = RenameState::Editing {
        folder_name: folder_name.to_string(),
        draft: folder_name.to_string(),
    };
}

pub fn update_rename_draft(state: &AppState, text: &str) {
    if let RenameState::Editing { draft, .. } = &mut state.browsing().rename {
        *draft = text.to_string();
    }
}

pub fn cancel_rename(state: &AppState) {
    state.browsing().rename = RenameState::Idle;
}

pub async fn commit_rename(state: &AppState) {
    // Claim the session before any await so a new rename can start meanwhile.
    let (old_name, draft) = {
        let mut browsing = state.browsing();
        let RenameState::Editing { folder_name, draft } = &browsing.rename else {
            return;
        };
        if draft.trim().is_empty() {
            return;
        }
        let claimed = (folder_name.clone(), draft.trim().to_string());
        browsing.rename = RenameState::Idle;
        claimed
    };

    if draft == old_name {
        return;
    }

    let result = async {
        permission_service::enforce(state.permissions.as_ref(), "rename folder")?;
        let new_name = validate_folder_name(&draft)?;
        let parent = state.current_path();
        state
            .store
            .rename_folder(&old_name, &new_name, &parent)
            .await?;
        tracing::info!(from = %old_name, to = %new_name, parent = %parent, "folder renamed");
        Ok::<_, AppError>(new_name)
    }
    .await;

    match result {
        Ok(new_name) => {
            state
                .notifications
                .success(format!("Folder renamed to '{new_name}'"));
            reload(state).await;
        }
        Err(err) => report_failure(state, "rename folder", &err),
    }
}

pub async fn delete_folder(state: &AppState, folder_name: &str) {
    if let Err(err) = permission_service::enforce(state.permissions.as_ref(), "delete folder") {
        report_failure(state, "delete folder", &err);
        return;
    }

    // The target is fixed before the prompt; navigation while it is open must not retarget it.
    let folder_path = state.current_path().join(folder_name);
    let prompt = format!("Delete folder '{folder_path}' and everything in it?");
    if !state.confirm.confirm(&prompt).await {
        tracing::debug!(folder = %folder_path, "folder delete declined");
        return;
    }

    match state.store.delete_folder(folder_path.as_str()).await {
        Ok(()) => {
            tracing::info!(folder = %folder_path, "folder deleted");
            state
                .notifications
                .success(format!("Folder '{folder_name}' deleted"));
            reload(state).await;
        }
        Err(err) => report_failure(state, "delete folder", &err),
    }
}
