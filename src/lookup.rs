//! Lookup service combining the Pokemon and image resolvers

use crate::config::LookupConfig;
use crate::error::ApiResult;
use crate::images::{ImageLoader, LoadedImage};
use crate::normalize::{normalize, LookupKey};
use crate::pokeapi::{PokeApiClient, Pokemon};
use crate::resolver::{FetchFuture, LookupHandle, MemoResolver, ResolverStats};
use futures::FutureExt;

/// Memoized Pokemon and image lookups.
///
/// Create one per process (or per test) and share it by reference or `Arc`.
pub struct PokemonLookup {
    pokemon: MemoResolver<LookupKey, Pokemon>,
    images: MemoResolver<String, LoadedImage>,
    placeholder_image: String,
}

impl PokemonLookup {
    /// Build the lookup service. Must be called inside a Tokio runtime.
    pub fn new(config: LookupConfig) -> ApiResult<Self> {
        let client = PokeApiClient::new(&config)?;
        let loader = ImageLoader::new(&config)?;

        log::info!(
            "Pokemon lookup using {} ({:?})",
            client.base_url(),
            config.failure_policy
        );

        let pokemon = MemoResolver::new(
            "pokemon",
            config.failure_policy,
            move |key: &LookupKey| -> FetchFuture<Pokemon> {
                let client = client.clone();
                let name = key.to_string();
                async move { client.fetch_pokemon_by_name(&name).await }.boxed()
            },
        )?;

        let images = MemoResolver::new(
            "image",
            config.failure_policy,
            move |src: &String| -> FetchFuture<LoadedImage> {
                let loader = loader.clone();
                let src = src.clone();
                async move { loader.load(&src).await }.boxed()
            },
        )?;

        Ok(Self {
            pokemon,
            images,
            placeholder_image: config.placeholder_image,
        })
    }

    /// Look up a Pokemon by user-supplied name
    pub fn resolve(&self, raw_name: &str) -> LookupHandle<Pokemon> {
        self.resolve_key(normalize(raw_name))
    }

    pub fn resolve_key(&self, key: LookupKey) -> LookupHandle<Pokemon> {
        self.pokemon.resolve(key)
    }

    /// Load an image by its raw locator (not normalized)
    pub fn resolve_image(&self, src: &str) -> LookupHandle<LoadedImage> {
        self.images.resolve(src.to_string())
    }

    /// Sprite locator for a Pokemon, or the placeholder if it has none
    pub fn image_locator<'a>(&'a self, pokemon: &'a Pokemon) -> &'a str {
        pokemon.image_url().unwrap_or(&self.placeholder_image)
    }

    /// Forget a cached Pokemon lookup so the next `resolve` fetches again
    pub fn invalidate(&self, raw_name: &str) -> bool {
        self.pokemon.invalidate(&normalize(raw_name))
    }

    pub fn invalidate_image(&self, src: &str) -> bool {
        self.images.invalidate(&src.to_string())
    }

    pub fn pokemon_stats(&self) -> ResolverStats {
        self.pokemon.stats()
    }

    pub fn image_stats(&self) -> ResolverStats {
        self.images.stats()
    }
}
