//! PokeAPI client for looking up Pokemon by name
//!
//! Uses async reqwest for non-blocking HTTP requests.

use crate::config::LookupConfig;
use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};

/// Pokemon response from `/pokemon/{name}`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Sprites {
    pub front_default: Option<String>,
    #[serde(default)]
    pub back_default: Option<String>,
    #[serde(default)]
    pub front_shiny: Option<String>,
    #[serde(default)]
    pub back_shiny: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TypeSlot {
    pub slot: u8,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

impl Pokemon {
    /// Front sprite URL, if the catalog has one
    pub fn image_url(&self) -> Option<&str> {
        self.sprites.front_default.as_deref()
    }

    /// Type names ordered by slot
    pub fn type_names(&self) -> Vec<&str> {
        let mut slots: Vec<&TypeSlot> = self.types.iter().collect();
        slots.sort_by_key(|t| t.slot);
        slots.iter().map(|t| t.kind.name.as_str()).collect()
    }
}

/// Client for the PokeAPI catalog
#[derive(Debug, Clone)]
pub struct PokeApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl PokeApiClient {
    pub fn new(config: &LookupConfig) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a Pokemon by exact (already normalized) name.
    ///
    /// A 404 from the catalog becomes `ApiError::NotFound`.
    pub async fn fetch_pokemon_by_name(&self, name: &str) -> ApiResult<Pokemon> {
        let url = format!("{}/pokemon/{}", self.base_url, urlencoding::encode(name));

        log::debug!("Fetching Pokemon from PokeAPI: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.bytes().await?;
            Ok(serde_json::from_slice::<Pokemon>(&body)?)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Err(ApiError::NotFound(name.to_string()))
        } else {
            Err(ApiError::HttpStatus(status))
        }
    }
}

#[cfg(test)]
#[path = "pokeapi_tests.rs"]
mod tests;
