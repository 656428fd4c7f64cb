//! Business logic and trait definitions for polychat.
//!
//! This crate defines the "ports" the infrastructure layer implements
//! (`UpstreamProvider`, `ProviderClient`, `SessionStore`) and the dispatch
//! logic built on them. It depends only on `polychat-types` -- never on
//! `polychat-infra` or any HTTP crate.

pub mod dispatch;
pub mod provider;
pub mod session;
