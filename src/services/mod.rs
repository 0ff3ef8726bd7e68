pub mod classifier;
pub mod events;
pub mod fs_service;
pub mod notifier;
pub mod preview;
pub mod selection;
pub mod session;
pub mod thumbnail_service;
pub mod validator;
pub mod workbench;
