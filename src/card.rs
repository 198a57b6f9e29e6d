//! Card view for a single search
//!
//! Maps the outcome of a lookup to what gets shown: an empty prompt, a loading
//! placeholder, the Pokemon with its image, a not-found notice, or a generic
//! error.

use crate::error::{ApiError, FailureKind};
use crate::images::LoadedImage;
use crate::lookup::PokemonLookup;
use crate::pokeapi::Pokemon;
use crate::resolver::Resolution;
use crate::search::clean_query;
use futures::FutureExt;
use std::fmt;

/// Image part of a found card
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageView {
    /// Image is still downloading
    Loading { src: String },
    /// Image decoded successfully
    Loaded { src: String, width: u32, height: u32 },
    /// Image could not be loaded; show the bare locator instead
    Fallback { src: String },
    /// Image loading was skipped
    Skipped { src: String },
}

/// Rendered state of a search
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardView {
    /// No query entered
    Empty,
    /// Lookup still in flight
    Loading {
        query: String,
    },
    Found {
        name: String,
        types: Vec<String>,
        image: ImageView,
    },
    NotFound {
        query: String,
    },
    Failed,
}

impl CardView {
    /// True while the Pokemon or its image is still being fetched
    pub fn is_loading(&self) -> bool {
        matches!(
            self,
            CardView::Loading { .. }
                | CardView::Found {
                    image: ImageView::Loading { .. },
                    ..
                }
        )
    }
}

impl fmt::Display for ImageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageView::Loading { src } => write!(f, "{} (loading...)", src),
            ImageView::Loaded { src, width, height } => {
                write!(f, "{} ({}x{})", src, width, height)
            }
            ImageView::Fallback { src } => write!(f, "{} (not loaded)", src),
            ImageView::Skipped { src } => write!(f, "{}", src),
        }
    }
}

impl fmt::Display for CardView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardView::Empty => write!(f, "Search..."),
            CardView::Loading { query } => write!(f, "Loading {}...", query),
            CardView::Found { name, types, image } => {
                writeln!(f, "{}", name)?;
                if !types.is_empty() {
                    writeln!(f, "  types: {}", types.join(", "))?;
                }
                write!(f, "  image: {}", image)
            }
            CardView::NotFound { query } => write!(f, "Pokemon `{}` not found", query),
            CardView::Failed => write!(f, "Error. Please try again"),
        }
    }
}

fn failure_card(query: &str, e: &ApiError) -> CardView {
    match e.kind() {
        FailureKind::NotFound => CardView::NotFound {
            query: query.to_string(),
        },
        FailureKind::Transient => {
            log::error!("Lookup for {:?} failed: {}", query, e);
            CardView::Failed
        }
    }
}

fn image_view(src: String, result: Resolution<LoadedImage>) -> ImageView {
    match result {
        Ok(img) => ImageView::Loaded {
            src,
            width: img.width,
            height: img.height,
        },
        Err(e) => {
            log::warn!("Image {} unavailable: {}", src, e);
            ImageView::Fallback { src }
        }
    }
}

fn found_card(pokemon: &Pokemon, image: ImageView) -> CardView {
    CardView::Found {
        name: pokemon.name.clone(),
        types: pokemon.type_names().into_iter().map(String::from).collect(),
        image,
    }
}

/// Look up `raw_query` and build its card, waiting for the lookup to settle.
///
/// An empty query short-circuits to `CardView::Empty` without a lookup.
pub async fn render_card(lookup: &PokemonLookup, raw_query: &str, load_images: bool) -> CardView {
    let query = clean_query(raw_query);
    if query.is_empty() {
        return CardView::Empty;
    }

    let pokemon = match lookup.resolve(query).await {
        Ok(pokemon) => pokemon,
        Err(e) => return failure_card(query, &e),
    };

    let src = lookup.image_locator(&pokemon).to_string();
    let image = if load_images {
        let result = lookup.resolve_image(&src).await;
        image_view(src, result)
    } else {
        ImageView::Skipped { src }
    };

    found_card(&pokemon, image)
}

/// Build the card for `raw_query` without waiting.
///
/// Starts the lookups if needed; anything not settled yet shows as loading.
pub fn peek_card(lookup: &PokemonLookup, raw_query: &str, load_images: bool) -> CardView {
    let query = clean_query(raw_query);
    if query.is_empty() {
        return CardView::Empty;
    }

    let pokemon = match lookup.resolve(query).now_or_never() {
        None => {
            return CardView::Loading {
                query: query.to_string(),
            }
        }
        Some(Ok(pokemon)) => pokemon,
        Some(Err(e)) => return failure_card(query, &e),
    };

    let src = lookup.image_locator(&pokemon).to_string();
    let image = if load_images {
        match lookup.resolve_image(&src).now_or_never() {
            Some(result) => image_view(src, result),
            None => ImageView::Loading { src },
        }
    } else {
        ImageView::Skipped { src }
    };

    found_card(&pokemon, image)
}
