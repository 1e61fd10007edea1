pub mod confirm_service;
pub mod file_service;
pub mod folder_service;
pub mod listing_service;
pub mod navigation_service;
pub mod notification_service;
pub mod permission_service;
