//! Provider abstractions for polychat.
//!
//! - `UpstreamProvider`: RPITIT trait for concrete provider backends
//! - `BoxUpstreamProvider`: object-safe wrapper for dynamic dispatch
//! - `ProviderRegistry`: id-indexed backends, used by the proxy routes
//! - `ProviderClient`: what the dispatch coordinator calls
//! - `normalize`: shared reply/error normalization helpers

pub mod box_provider;
pub mod client;
pub mod normalize;
pub mod registry;
pub mod upstream;
