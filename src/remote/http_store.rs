use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{multipart, StatusCode};
use serde::Deserialize;
use serde_json::json;

use super::{FolderDescriptor, RemoteFileStore, UploadFile, UploadReceipt};
use crate::error::AppError;
use crate::models::file_entry::{FileEntry, Listing};
use crate::store_path::StorePath;

const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteFile {
    id: serde_json::Value, // numeric or string
    name: String,
    #[serde(default, alias = "sizeBytes")]
    size: u64,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl RemoteFile {
    fn id_str(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => self.name.clone(),
            other => other.to_string(),
        }
    }

    fn into_entry(self) -> FileEntry {
        let id = self.id_str();
        FileEntry::new(id, self.name, self.size, self.created_at.unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    files: Vec<RemoteFile>,
    #[serde(default)]
    folders: Vec<String>,
}

impl ListResponse {
    fn into_listing(self) -> Listing {
        Listing {
            files: self.files.into_iter().map(RemoteFile::into_entry).collect(),
            folders: self.folders,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DownloadUrlResponse {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(alias = "message")]
    error: String,
}

/// Maps a non-success response to the error taxonomy, keeping the backend's
/// own message when the body carries one.
fn error_from_response(status: StatusCode, body: &str) -> AppError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() || trimmed.starts_with('<') {
                format!("request failed with status {}", status.as_u16())
            } else {
                trimmed.chars().take(300).collect()
            }
        });

    match status {
        StatusCode::NOT_FOUND => AppError::NotFound(message),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AppError::PermissionDenied(message),
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            AppError::Validation(message)
        }
        _ => AppError::Network(message),
    }
}

pub struct HttpFileStore {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpFileStore {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn encoded(path: &str) -> String {
        urlencoding::encode(path).into_owned()
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(%method, path, %request_id, "file store request");
        let mut builder = self
            .client
            .request(method, self.url(path))
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .header(REQUEST_ID_HEADER, request_id);
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AppError> {
        let resp = builder.send().await?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let err = error_from_response(status, &body);
        tracing::warn!(status = status.as_u16(), error = %err, "file store rejected request");
        Err(err)
    }
}

#[async_trait]
impl RemoteFileStore for HttpFileStore {
    async fn list(&self, path: &StorePath) -> Result<Listing, AppError> {
        let builder = self
            .request(reqwest::Method::GET, "/files")
            .query(&[("path", path.as_str())]);
        let body: ListResponse = self.send(builder).await?.json().await?;
        Ok(body.into_listing())
    }

    async fn upload(&self, file: &UploadFile, path: &StorePath) -> Result<UploadReceipt, AppError> {
        let mime = mime_guess::from_path(&file.name).first_or_octet_stream();
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(mime.as_ref())?;
        let form = multipart::Form::new()
            .part("file", part)
            .text("path", path.as_str().to_string());

        let builder = self
            .request(reqwest::Method::POST, "/files/upload")
            .multipart(form);
        Ok(self.send(builder).await?.json().await?)
    }

    async fn download_url(&self, file_path: &str) -> Result<String, AppError> {
        let route = format!("/files/download-url/{}", Self::encoded(file_path));
        let builder = self.request(reqwest::Method::GET, &route);
        let body: DownloadUrlResponse = self.send(builder).await?.json().await?;
        Ok(body.url)
    }

    async fn delete_file(&self, file_path: &str) -> Result<(), AppError> {
        let route = format!("/files/{}", Self::encoded(file_path));
        self.send(self.request(reqwest::Method::DELETE, &route))
            .await?;
        Ok(())
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: &StorePath,
    ) -> Result<FolderDescriptor, AppError> {
        let builder = self
            .request(reqwest::Method::POST, "/files/folder")
            .json(&json!({ "name": name, "parentPath": parent.as_str() }));
        let body = self.send(builder).await?.text().await?;
        // Descriptor shape varies between backend versions; only the name matters here.
        Ok(serde_json::from_str(&body).unwrap_or_else(|_| FolderDescriptor {
            name: name.to_string(),
            path: parent.join(name).as_str().to_string(),
        }))
    }

    async fn rename_folder(
        &self,
        old_name: &str,
        new_name: &str,
        parent: &StorePath,
    ) -> Result<(), AppError> {
        let builder = self
            .request(reqwest::Method::PUT, "/files/folder/rename")
            .json(&json!({
                "oldName": old_name,
                "newName": new_name,
                "parentPath": parent.as_str(),
            }));
        self.send(builder).await?;
        Ok(())
    }

    async fn delete_folder(&self, folder_path: &str) -> Result<(), AppError> {
        let route = format!("/files/folder/{}", Self::encoded(folder_path));
        self.send(self.request(reqwest::Method::DELETE, &route))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_listing_with_mixed_id_types() {
        let body = r#"{
            "files": [
                {"id": 7, "name": "acta.pdf", "size": 2048, "createdAt": "2024-03-01T10:00:00Z"},
                {"id": "abc", "name": "foto.JPG", "sizeBytes": 10}
            ],
            "folders": ["contratos", "fotos"]
        }"#;
        let listing = serde_json::from_str::<ListResponse>(body)
            .unwrap()
            .into_listing();

        assert_eq!(listing.folders, vec!["contratos", "fotos"]);
        assert_eq!(listing.files[0].id, "7");
        assert_eq!(listing.files[0].size_bytes, 2048);
        assert_eq!(listing.files[1].id, "abc");
        assert_eq!(listing.files[1].size_bytes, 10);
        assert_eq!(
            listing.files[1].mime_category,
            crate::models::file_entry::MimeCategory::Image
        );
        assert_eq!(listing.files[1].created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn missing_arrays_default_to_empty() {
        let listing = serde_json::from_str::<ListResponse>("{}")
            .unwrap()
            .into_listing();
        assert_eq!(listing, Listing::default());
    }

    #[test]
    fn error_bodies_keep_backend_message() {
        let err = error_from_response(StatusCode::CONFLICT, r#"{"error":"Folder already exists"}"#);
        assert!(matches!(err, AppError::Validation(ref m) if m == "Folder already exists"));

        let err = error_from_response(StatusCode::NOT_FOUND, r#"{"message":"No such file"}"#);
        assert!(matches!(err, AppError::NotFound(ref m) if m == "No such file"));
    }

    #[test]
    fn error_status_mapping() {
        assert!(matches!(
            error_from_response(StatusCode::FORBIDDEN, ""),
            AppError::PermissionDenied(_)
        ));
        assert!(matches!(
            error_from_response(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            AppError::Network(ref m) if m == "request failed with status 502"
        ));
        assert!(matches!(
            error_from_response(StatusCode::INTERNAL_SERVER_ERROR, "boom"),
            AppError::Network(ref m) if m == "boom"
        ));
    }

    #[test]
    fn paths_are_encoded_as_one_segment() {
        assert_eq!(HttpFileStore::encoded("legal/acta 1.pdf"), "legal%2Facta%201.pdf");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let store =
            HttpFileStore::new("http://localhost:3000/api/", None, Duration::from_secs(5)).unwrap();
        assert_eq!(store.url("/files"), "http://localhost:3000/api/files");
    }
}
