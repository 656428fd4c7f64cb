//! Shared domain types for polychat.
//!
//! Provider identity, dispatch rounds and their per-provider results, the
//! proxy's wire shapes, configuration, and the error enums used across the
//! workspace.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod provider;
pub mod proxy;
