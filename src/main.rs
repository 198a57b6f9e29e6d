//! Pokedex Lookup - command line search
//!
//! Looks up the given names concurrently, or reads queries from stdin with
//! `--interactive`. Repeated queries are served from the in-memory cache.

use clap::Parser;
use pokedex_lookup::{
    peek_card, popular_nav, render_card, FailurePolicy, LookupConfig, PokemonLookup,
    POPULAR_SEARCHES,
};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Look up Pokemon by name
#[derive(Parser, Debug)]
#[command(name = "pokedex_lookup")]
#[command(version, about, long_about = None)]
struct Args {
    /// Names to look up (defaults to the popular searches)
    names: Vec<String>,

    /// Read queries line by line from stdin
    #[arg(short, long, default_value_t = false)]
    interactive: bool,

    /// Base URL of the PokeAPI catalog
    #[arg(long, default_value_t = pokedex_lookup::config::DEFAULT_API_BASE_URL.to_string())]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Skip downloading sprite images
    #[arg(long, default_value_t = false)]
    no_images: bool,

    /// Drop failed lookups from the cache so they can be retried
    #[arg(long, default_value_t = false)]
    evict_failures: bool,
}

impl Args {
    fn config(&self) -> LookupConfig {
        LookupConfig {
            request_timeout: Duration::from_secs(self.timeout_secs),
            failure_policy: if self.evict_failures {
                FailurePolicy::EvictFailures
            } else {
                FailurePolicy::CacheFailures
            },
            ..LookupConfig::with_base_url(&self.api_url)
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logger. Set RUST_LOG environment variable to control log level.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::info!("Starting pokedex_lookup...");

    let lookup = match PokemonLookup::new(args.config()) {
        Ok(lookup) => lookup,
        Err(e) => {
            log::error!("Failed to set up lookup: {}", e);
            std::process::exit(1);
        }
    };

    if args.interactive {
        run_interactive(&lookup, !args.no_images).await;
    } else {
        let names: Vec<String> = if args.names.is_empty() {
            POPULAR_SEARCHES.iter().map(|s| s.to_string()).collect()
        } else {
            args.names.clone()
        };
        run_batch(&lookup, &names, !args.no_images).await;
    }

    let pokemon = lookup.pokemon_stats();
    let images = lookup.image_stats();
    log::info!(
        "Pokemon cache: {} entries, {} hits, {} fetches; image cache: {} entries, {} hits, {} fetches",
        pokemon.entries,
        pokemon.hits,
        pokemon.misses,
        images.entries,
        images.hits,
        images.misses
    );
}

/// Look up all names at once; duplicates share one request
async fn run_batch(lookup: &PokemonLookup, names: &[String], load_images: bool) {
    let cards = futures::future::join_all(
        names
            .iter()
            .map(|name| render_card(lookup, name, load_images)),
    )
    .await;

    for (name, card) in names.iter().zip(cards) {
        println!("> {}", name);
        println!("{}\n", card);
    }
}

/// Read queries from stdin until EOF
async fn run_interactive(lookup: &PokemonLookup, load_images: bool) {
    println!("{}", popular_nav(""));
    println!("Search for pokemon (Ctrl-D to quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        };

        println!("{}", popular_nav(&line));

        let preview = peek_card(lookup, &line, load_images);
        if preview.is_loading() {
            println!("{}", preview);
        }
        println!("{}\n", render_card(lookup, &line, load_images).await);
    }
}
