//! Clients the dispatch coordinator uses to reach providers.

pub mod http;
