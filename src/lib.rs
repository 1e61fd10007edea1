pub mod config;
pub mod data;
pub mod error;
pub mod manager;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod store_path;

#[cfg(test)]
mod test_support;

pub use config::AppConfig;
pub use error::AppError;
pub use manager::{FileManager, Ports};
pub use remote::{RemoteFileStore, UploadFile, MAX_UPLOAD_BYTES};
pub use store_path::StorePath;
