//! Runtime configuration for the lookup service

use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_USER_AGENT: &str = "Pokedex-Lookup/1.0";
pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/placeholder.png";

/// What happens to a cache entry whose fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Failed results stay cached for the lifetime of the resolver
    #[default]
    CacheFailures,
    /// Failed results are dropped from the table once settled,
    /// so the next lookup for the key fetches again
    EvictFailures,
}

/// Configuration for `PokemonLookup`
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// Base URL of the catalog API, without trailing slash
    pub api_base_url: String,
    pub user_agent: String,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    pub failure_policy: FailurePolicy,
    /// Image locator used when an entry has no sprite
    pub placeholder_image: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(30),
            failure_policy: FailurePolicy::default(),
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
        }
    }
}

impl LookupConfig {
    /// Config pointing at a different catalog, e.g. a mock server
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            api_base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }
}
