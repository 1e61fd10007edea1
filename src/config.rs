use std::env;
use std::path::PathBuf;
use std::time::Duration;

use directories::{ProjectDirs, UserDirs};

use crate::error::AppError;
use crate::services::permission_service::Role;

pub const DB_FILE_NAME: &str = "formatos.db";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_url: String,
    pub api_token: Option<String>,
    pub role: Role,
    pub data_dir: PathBuf,
    pub download_dir: PathBuf,
    pub timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = var("FORMATOS_API_URL")
            .ok_or_else(|| AppError::Config("missing FORMATOS_API_URL".into()))?;
        if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "invalid FORMATOS_API_URL '{api_url}': expected an http(s) URL"
            )));
        }

        let api_token = var("FORMATOS_API_TOKEN");

        let role = match var("FORMATOS_ROLE") {
            Some(value) => Role::parse(&value)?,
            None => Role::Viewer,
        };

        let data_dir = match var("FORMATOS_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };

        let download_dir = var("FORMATOS_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .or_else(|| UserDirs::new().and_then(|dirs| dirs.download_dir().map(PathBuf::from)))
            .unwrap_or_else(|| data_dir.join("downloads"));

        let timeout_secs = match var("FORMATOS_TIMEOUT_SECS") {
            Some(value) => value
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::Config(format!("invalid FORMATOS_TIMEOUT_SECS: {value}"))
                })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_url,
            api_token,
            role,
            data_dir,
            download_dir,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

fn default_data_dir() -> Result<PathBuf, AppError> {
    ProjectDirs::from("org", "formatos", "Formatos")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            AppError::Config("could not resolve a data directory; set FORMATOS_DATA_DIR".into())
        })
}
