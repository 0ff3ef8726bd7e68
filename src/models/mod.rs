pub mod classify_types;
pub mod file_types;
pub mod notification_types;
pub mod preview_types;
pub mod session_types;
