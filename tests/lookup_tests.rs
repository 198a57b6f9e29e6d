//! End-to-end lookup tests against a mock PokeAPI.

use pokedex_lookup::{
    peek_card, render_card, CardView, EntryState, FailureKind, FailurePolicy, ImageView,
    LookupConfig, PokemonLookup,
};
use std::io::Cursor;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn pokemon_json(server: &MockServer, id: u32, name: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "sprites": { "front_default": format!("{}/sprites/{}.png", server.uri(), id) },
        "types": [ { "slot": 1, "type": { "name": "normal", "url": "https://pokeapi.co/api/v2/type/1/" } } ]
    })
}

fn png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::new(96, 96);
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

async fn mount_pokemon(server: &MockServer, id: u32, name: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/pokemon/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(pokemon_json(server, id, name)))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_not_found(server: &MockServer, name: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/pokemon/{name}")))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn lookup_for(server: &MockServer) -> PokemonLookup {
    PokemonLookup::new(LookupConfig::with_base_url(&server.uri())).unwrap()
}

#[tokio::test]
async fn concurrent_name_variants_share_one_request() {
    let server = MockServer::start().await;
    mount_pokemon(&server, 25, "pikachu", 1).await;
    let lookup = lookup_for(&server);

    let a = lookup.resolve("Pikachu");
    let b = lookup.resolve(" pikachu ");
    assert!(a.ptr_eq(&b));

    let (a, b) = futures::join!(a, b);
    assert_eq!(a.unwrap().name, "pikachu");
    assert_eq!(b.unwrap().name, "pikachu");

    let stats = lookup.pokemon_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn not_found_is_cached() {
    let server = MockServer::start().await;
    mount_not_found(&server, "doesnotexist", 1).await;
    let lookup = lookup_for(&server);

    let first = lookup.resolve("doesnotexist").await.unwrap_err();
    assert_eq!(first.kind(), FailureKind::NotFound);

    let second = lookup.resolve("DoesNotExist").await.unwrap_err();
    assert_eq!(second.kind(), FailureKind::NotFound);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn empty_query_never_reaches_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);

    assert_eq!(render_card(&lookup, "", true).await, CardView::Empty);
    assert_eq!(render_card(&lookup, "   ", true).await, CardView::Empty);
    assert_eq!(lookup.pokemon_stats().entries, 0);
}

#[tokio::test]
async fn failure_on_one_key_leaves_other_intact() {
    let server = MockServer::start().await;
    mount_pokemon(&server, 25, "pikachu", 1).await;
    Mock::given(method("GET"))
        .and(path("/pokemon/ditto"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);

    let (pikachu, ditto) = futures::join!(lookup.resolve("pikachu"), lookup.resolve("ditto"));
    assert_eq!(pikachu.unwrap().id, 25);
    assert_eq!(ditto.unwrap_err().kind(), FailureKind::Transient);

    assert_eq!(lookup.resolve("pikachu").state(), EntryState::Fulfilled);
    assert_eq!(lookup.resolve("ditto").state(), EntryState::Failed);
}

#[tokio::test]
async fn invalidate_retries_failed_lookup() {
    let server = MockServer::start().await;
    mount_not_found(&server, "missingno", 2).await;
    let lookup = lookup_for(&server);

    assert!(lookup.resolve("missingno").await.is_err());
    assert!(lookup.invalidate(" MissingNo"));
    assert!(lookup.resolve("missingno").await.is_err());
}

#[tokio::test]
async fn evict_failures_policy_retries_on_next_resolve() {
    let server = MockServer::start().await;
    mount_not_found(&server, "missingno", 2).await;
    let config = LookupConfig {
        failure_policy: FailurePolicy::EvictFailures,
        ..LookupConfig::with_base_url(&server.uri())
    };
    let lookup = PokemonLookup::new(config).unwrap();

    assert!(lookup.resolve("missingno").await.is_err());
    assert!(lookup.resolve("missingno").await.is_err());
}

#[tokio::test]
async fn render_card_found_with_image() {
    let server = MockServer::start().await;
    mount_pokemon(&server, 132, "ditto", 1).await;
    Mock::given(method("GET"))
        .and(path("/sprites/132.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .expect(1)
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);

    let card = render_card(&lookup, " Ditto ", true).await;
    let again = render_card(&lookup, "DITTO", true).await;
    assert_eq!(card, again);

    match card {
        CardView::Found { name, types, image } => {
            assert_eq!(name, "ditto");
            assert_eq!(types, vec!["normal".to_string()]);
            assert_eq!(
                image,
                ImageView::Loaded {
                    src: format!("{}/sprites/132.png", server.uri()),
                    width: 96,
                    height: 96,
                }
            );
        }
        other => panic!("Expected CardView::Found, got: {other:?}"),
    }

    assert_eq!(lookup.image_stats().misses, 1);
}

#[tokio::test]
async fn render_card_falls_back_when_image_fails() {
    let server = MockServer::start().await;
    mount_pokemon(&server, 6, "charizard", 1).await;
    Mock::given(method("GET"))
        .and(path("/sprites/6.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);

    let card = render_card(&lookup, "charizard", true).await;
    let src = format!("{}/sprites/6.png", server.uri());
    match card {
        CardView::Found { image, .. } => assert_eq!(image, ImageView::Fallback { src: src.clone() }),
        other => panic!("Expected CardView::Found, got: {other:?}"),
    }

    // Image failure is cached under its raw locator
    assert_eq!(lookup.resolve_image(&src).state(), EntryState::Failed);
}

#[tokio::test]
async fn render_card_uses_placeholder_without_sprite() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/unown"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "id": 201, "name": "unown", "sprites": {} })),
        )
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);

    let card = render_card(&lookup, "unown", true).await;
    match card {
        CardView::Found { image, .. } => assert_eq!(
            image,
            ImageView::Fallback {
                src: "/placeholder.png".to_string()
            }
        ),
        other => panic!("Expected CardView::Found, got: {other:?}"),
    }
}

#[tokio::test]
async fn render_card_skips_images_when_disabled() {
    let server = MockServer::start().await;
    mount_pokemon(&server, 25, "pikachu", 1).await;
    let lookup = lookup_for(&server);

    let card = render_card(&lookup, "pikachu", false).await;
    match card {
        CardView::Found { image, .. } => assert_eq!(
            image,
            ImageView::Skipped {
                src: format!("{}/sprites/25.png", server.uri())
            }
        ),
        other => panic!("Expected CardView::Found, got: {other:?}"),
    }
    assert_eq!(lookup.image_stats().entries, 0);
}

#[tokio::test]
async fn render_card_not_found_and_error_messages() {
    let server = MockServer::start().await;
    mount_not_found(&server, "doesnotexist", 1).await;
    Mock::given(method("GET"))
        .and(path("/pokemon/eevee"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);

    let not_found = render_card(&lookup, " Doesnotexist ", true).await;
    assert_eq!(
        not_found,
        CardView::NotFound {
            query: "Doesnotexist".to_string()
        }
    );
    assert_eq!(not_found.to_string(), "Pokemon `Doesnotexist` not found");

    let failed = render_card(&lookup, "eevee", true).await;
    assert_eq!(failed, CardView::Failed);
    assert_eq!(failed.to_string(), "Error. Please try again");
}

#[tokio::test]
async fn peek_card_shows_loading_until_lookup_settles() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pokemon/pikachu"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(pokemon_json(&server, 25, "pikachu"))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);

    let preview = peek_card(&lookup, " Pikachu ", false);
    assert_eq!(
        preview,
        CardView::Loading {
            query: "Pikachu".to_string()
        }
    );
    assert!(preview.is_loading());
    assert_eq!(lookup.pokemon_stats().pending, 1);

    let card = render_card(&lookup, "Pikachu", false).await;
    assert!(matches!(card, CardView::Found { .. }), "got: {card:?}");

    let settled = peek_card(&lookup, "pikachu", false);
    assert_eq!(settled, card);
    assert!(!settled.is_loading());
}

#[tokio::test]
async fn peek_card_shows_image_loading_separately() {
    let server = MockServer::start().await;
    mount_pokemon(&server, 132, "ditto", 1).await;
    Mock::given(method("GET"))
        .and(path("/sprites/132.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(png_bytes())
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);
    let src = format!("{}/sprites/132.png", server.uri());

    render_card(&lookup, "ditto", false).await;

    match peek_card(&lookup, "ditto", true) {
        CardView::Found { image, .. } => {
            assert_eq!(image, ImageView::Loading { src: src.clone() })
        }
        other => panic!("Expected CardView::Found, got: {other:?}"),
    }

    let card = render_card(&lookup, "ditto", true).await;
    assert!(!card.is_loading());
    assert_eq!(peek_card(&lookup, "ditto", true), card);
}

#[tokio::test]
async fn peek_card_reports_settled_failures() {
    let server = MockServer::start().await;
    mount_not_found(&server, "doesnotexist", 1).await;
    let lookup = lookup_for(&server);

    assert!(lookup.resolve("doesnotexist").await.is_err());

    assert_eq!(
        peek_card(&lookup, "Doesnotexist", true),
        CardView::NotFound {
            query: "Doesnotexist".to_string()
        }
    );
    assert_eq!(peek_card(&lookup, "", true), CardView::Empty);
}

#[tokio::test]
async fn image_locators_are_not_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sprites/A.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sprites/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(png_bytes()))
        .expect(2)
        .mount(&server)
        .await;
    let lookup = lookup_for(&server);

    let upper = format!("{}/sprites/A.png", server.uri());
    let lower = format!("{}/sprites/a.png", server.uri());
    let padded = format!(" {} ", lower);

    let a = lookup.resolve_image(&upper);
    let b = lookup.resolve_image(&lower);
    let c = lookup.resolve_image(&padded);
    assert!(!a.ptr_eq(&b));
    assert!(!b.ptr_eq(&c));
    assert!(!a.ptr_eq(&c));

    let (a, b, c) = futures::join!(a, b, c);
    assert_eq!(a.unwrap().src, upper);
    assert_eq!(b.unwrap().src, lower);
    assert_eq!(c.unwrap().src, padded);

    let stats = lookup.image_stats();
    assert_eq!(stats.entries, 3);
    assert_eq!(stats.misses, 3);

    // Only the exact locator is dropped
    assert!(lookup.invalidate_image(&upper));
    assert!(!lookup.invalidate_image(&upper));
    assert_eq!(lookup.image_stats().entries, 2);

    assert!(lookup.resolve_image(&upper).await.is_ok());
    assert!(lookup.resolve_image(&lower).await.is_ok());
    assert_eq!(lookup.image_stats().misses, 4);
}

#[test]
fn lookup_requires_runtime() {
    let result = PokemonLookup::new(LookupConfig::default());
    assert!(result.is_err());
}
