//! HTTP surface of the provider proxy.

pub mod error;
pub mod handlers;
pub mod router;
