//! Observability for polychat: subscriber setup and span conventions.

pub mod genai_attrs;
pub mod tracing_setup;
