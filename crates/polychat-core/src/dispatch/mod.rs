//! Dispatch of one user message to every configured provider.
//!
//! - `DispatchCoordinator`: fan-out, join barrier, attempt accounting
//! - `UsageGate`: free-tier counter over an injected session store
//! - `PresentationState`: ordered, render-ready view of the current round

pub mod coordinator;
pub mod gate;
pub mod presentation;
