//! Pokedex Lookup - memoized Pokemon search
//!
//! Resolves Pokemon by name against PokeAPI. Identical lookups share one
//! in-flight request and one cached result.

pub mod card;
pub mod config;
pub mod error;
pub mod images;
pub mod lookup;
pub mod normalize;
pub mod pokeapi;
pub mod resolver;
pub mod search;

// Re-export commonly used items
pub use card::{peek_card, render_card, CardView, ImageView};
pub use config::{FailurePolicy, LookupConfig};
pub use error::{ApiError, ApiResult, FailureKind};
pub use images::{ImageLoader, LoadedImage};
pub use lookup::PokemonLookup;
pub use normalize::{normalize, LookupKey};
pub use pokeapi::{PokeApiClient, Pokemon};
pub use resolver::{EntryState, LookupHandle, MemoResolver, Resolution, ResolverStats};
pub use search::{clean_query, is_active_search, popular_nav, POPULAR_SEARCHES};
