pub mod logs;
pub mod profile_stores;
pub mod ssh_config;
pub mod tools;
