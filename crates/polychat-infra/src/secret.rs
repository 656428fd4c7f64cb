//! Provider credential resolution.
//!
//! Credentials come only from the proxy's environment
//! (`OPENAI_API_KEY`, `GEMINI_API_KEY`, `PERPLEXITY_API_KEY`). A variable
//! that is unset, empty, or not valid Unicode counts as missing. Keys are
//! wrapped in [`SecretString`] as soon as they are read.

use std::collections::BTreeMap;

use secrecy::SecretString;

use polychat_types::provider::ProviderId;

/// Resolved credentials, one optional key per provider.
#[derive(Default, Clone)]
pub struct Credentials {
    keys: BTreeMap<ProviderId, SecretString>,
}

impl Credentials {
    /// Read every provider's key from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve keys through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let keys = ProviderId::ALL
            .into_iter()
            .filter_map(|id| {
                let value = lookup(&id.api_key_env())?;
                let value = value.trim();
                (!value.is_empty()).then(|| (id, SecretString::from(value.to_string())))
            })
            .collect();
        Self { keys }
    }

    pub fn get(&self, id: ProviderId) -> Option<SecretString> {
        self.keys.get(&id).cloned()
    }

    pub fn is_present(&self, id: ProviderId) -> bool {
        self.keys.contains_key(&id)
    }

    /// Providers with no usable key, in display order.
    pub fn missing(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| !self.is_present(*id))
            .collect()
    }
}

// Debug lists which providers have keys, never the keys.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.keys.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_keys_resolved_by_env_name() {
        let creds = Credentials::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("PERPLEXITY_API_KEY", "pplx-2"),
        ]));
        assert_eq!(creds.get(ProviderId::OpenAi).unwrap().expose_secret(), "sk-1");
        assert!(creds.is_present(ProviderId::Perplexity));
        assert!(!creds.is_present(ProviderId::Gemini));
        assert_eq!(creds.missing(), vec![ProviderId::Gemini]);
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let creds = Credentials::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")]));
        assert!(creds.get(ProviderId::Gemini).is_none());
        assert_eq!(creds.missing().len(), 3);
    }

    #[test]
    fn test_debug_does_not_leak_keys() {
        let creds = Credentials::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret")]));
        let debug = format!("{creds:?}");
        assert!(debug.contains("OpenAi"));
        assert!(!debug.contains("sk-secret"));
    }
}
