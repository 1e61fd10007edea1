pub mod file_entry;
pub mod notification;
pub mod view;
