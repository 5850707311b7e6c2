pub mod key_tools;
pub mod profile_store;
pub mod rotation_log;
