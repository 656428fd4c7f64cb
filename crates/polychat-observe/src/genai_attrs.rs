//! OpenTelemetry GenAI Semantic Convention names for provider calls.
//!
//! Span naming convention: `"{operation} {provider}"` (e.g. `"chat gemini"`).
//! Field names on the span follow the `gen_ai.*` attribute keys below.

/// The name of the operation being performed.
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the GenAI provider (e.g. "openai").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

// --- Operation name values ---

/// A proxied chat completion.
pub const OP_CHAT: &str = "chat";

/// A connectivity probe (`POST /api/test`).
pub const OP_PROBE: &str = "probe";

/// One dispatch round across every provider.
pub const OP_DISPATCH: &str = "dispatch";

/// Span for one call to an upstream provider.
///
/// The `gen_ai.*` fields mirror [`GEN_AI_OPERATION_NAME`] and
/// [`GEN_AI_PROVIDER_NAME`]; `otel.name` gives exporters the
/// `"{operation} {provider}"` span name.
pub fn provider_span(operation: &'static str, provider: &str) -> tracing::Span {
    tracing::info_span!(
        "gen_ai",
        otel.name = %span_name(operation, provider),
        gen_ai.operation.name = operation,
        gen_ai.provider.name = provider,
    )
}

/// Span for a whole dispatch round.
pub fn dispatch_span(providers: usize) -> tracing::Span {
    tracing::info_span!(
        "dispatch",
        otel.name = OP_DISPATCH,
        gen_ai.operation.name = OP_DISPATCH,
        providers = providers,
    )
}

pub fn span_name(operation: &str, provider: &str) -> String {
    format!("{operation} {provider}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_name_follows_convention() {
        assert_eq!(span_name(OP_CHAT, "gemini"), "chat gemini");
    }

    #[test]
    fn attribute_keys_are_dotted_gen_ai_names() {
        for key in [GEN_AI_OPERATION_NAME, GEN_AI_PROVIDER_NAME] {
            assert!(key.starts_with("gen_ai."));
        }
    }

    #[test]
    fn spans_can_be_built_without_subscriber() {
        let span = provider_span(OP_PROBE, "openai");
        let _guard = span.enter();
        let _ = dispatch_span(3);
    }
}
