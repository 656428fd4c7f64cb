//! HTTP request handlers.

pub mod proxy;
pub mod status;
