//! Shared utilities for the vkv validation layer crates.

pub mod logging;
