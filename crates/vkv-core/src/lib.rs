//! Core building blocks shared by the vkv validation layer: configuration,
//! errors and the handle-keyed state map backing the object store.

pub mod config;
pub mod error;
pub mod state_map;

pub use error::CoreError;
pub use state_map::StateMap;
