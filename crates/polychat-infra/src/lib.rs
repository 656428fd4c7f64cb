//! Infrastructure layer for polychat.
//!
//! Contains implementations of the traits defined in `polychat-core`:
//! upstream provider clients (OpenAI, Gemini, Perplexity), the HTTP client
//! for a running proxy, the in-process session store, plus config and
//! credential loading.

pub mod client;
pub mod config;
pub mod llm;
pub mod secret;
pub mod session;
