pub mod config;
#[cfg(not(target_arch = "wasm32"))]
pub mod file;
pub mod manager;
pub mod memory;
pub mod migration;
pub mod remote;
pub mod traits;
