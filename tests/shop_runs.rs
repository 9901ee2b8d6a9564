//! Whole-shop behaviour: pagination termination, fixture parsing, legacy mode
//! and fault containment between shops.

mod helpers;

use std::io::Write;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer};

use catalog_scraper::{ParseMode, RunKind, SaveMode};
use helpers::{
    catalog_page, html, options, orchestrator, page_template, profile, selectors,
    ScriptedGateway,
};

#[tokio::test]
async fn test_pagination_stops_at_empty_page_three() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .and(query_param_is_missing("page"))
        .respond_with(html(catalog_page(&[1, 2])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "2"))
        .respond_with(html(catalog_page(&[3, 4])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "3"))
        .respond_with(html(catalog_page(&[])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("page", "4"))
        .respond_with(html(catalog_page(&[5])))
        .expect(0)
        .mount(&server)
        .await;

    let gateway = Arc::new(ScriptedGateway::default());
    let orchestrator = orchestrator(gateway, options(SaveMode::Streaming, true));
    let parser = orchestrator
        .parser_for(profile(
            "alpha",
            format!("{}/catalog/", server.uri()),
            page_template(),
        ))
        .unwrap();

    let listings = parser.parse_basic_products(1).await;
    let names: Vec<&str> = listings.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Item 1", "Item 2", "Item 3", "Item 4"]);
    // MockServer verifies the `expect` counts on drop
}

#[tokio::test]
async fn test_single_page_fixture_yields_only_valid_nodes() {
    let mut fixture = tempfile::Builder::new().suffix(".html").tempfile().unwrap();
    fixture
        .write_all(
            br#"<html><body><div class="catalog">
                <div class="item"><a class="link" href="/p/1"><span class="title">Chair</span></a></div>
                <div class="item"><a class="link" href="/p/2"><span class="title">Table</span></a></div>
                <div class="item"><a class="link" href="/p/3"><span class="title">Lamp</span></a></div>
                <div class="item"><a class="link" href="/p/4"></a></div>
            </div></body></html>"#,
        )
        .unwrap();

    let gateway = Arc::new(ScriptedGateway::default());
    let orchestrator = orchestrator(gateway, options(SaveMode::Streaming, true));
    let parser = orchestrator
        .parser_for(profile(
            "alpha",
            fixture.path().display().to_string(),
            None,
        ))
        .unwrap();

    let listings = parser.parse_basic_products(1).await;
    assert_eq!(listings.len(), 3);
    assert!(listings
        .iter()
        .all(|l| !l.name.is_empty() && !l.product_url.is_empty()));
}

#[tokio::test]
async fn test_one_shop_failing_does_not_stop_the_next() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/good/"))
        .respond_with(html(catalog_page(&[1, 2])))
        .mount(&server)
        .await;

    let gateway = Arc::new(ScriptedGateway {
        panic_on_shop: Some("exploding".to_string()),
        ..Default::default()
    });
    let orchestrator = orchestrator(gateway.clone(), options(SaveMode::Streaming, true));

    let mut broken = profile("broken", format!("{}/good/", server.uri()), None);
    broken.selectors.product_container = String::new();
    let shops = vec![
        broken,
        profile("exploding", format!("{}/good/", server.uri()), None),
        profile("good", format!("{}/good/", server.uri()), None),
    ];

    let results = orchestrator.run_all(shops).await;
    assert_eq!(results.len(), 3);

    assert_eq!(results[0].shop_name, "broken");
    assert!(!results[0].success);
    assert!(results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("product_container"));

    assert_eq!(results[1].shop_name, "exploding");
    assert!(!results[1].success);
    assert!(results[1].error.as_deref().unwrap().contains("panicked"));

    assert_eq!(results[2].shop_name, "good");
    assert!(results[2].success);
    assert_eq!(results[2].counts.saved, 2);
    assert_eq!(gateway.saved_urls().len(), 2);
}

#[tokio::test]
async fn test_transient_shop_failure_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(html(catalog_page(&[1])))
        .mount(&server)
        .await;

    let gateway = Arc::new(ScriptedGateway::default());
    gateway.fail_shop_lookups.store(1, Ordering::SeqCst);
    let mut options = options(SaveMode::Streaming, true);
    options.shop_retries = 1;
    let orchestrator = orchestrator(gateway.clone(), options);
    let parser = orchestrator
        .parser_for(profile("alpha", format!("{}/catalog/", server.uri()), None))
        .unwrap();

    let results = orchestrator.run_shop(&parser).await;
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].counts.saved, 1);
}

#[tokio::test]
async fn test_shop_setup_failure_without_retries_is_reported() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.fail_shop_lookups.store(5, Ordering::SeqCst);
    let orchestrator = orchestrator(gateway, options(SaveMode::Streaming, true));
    let parser = orchestrator
        .parser_for(profile("alpha", "https://shop.invalid/catalog/".into(), None))
        .unwrap();

    let results = orchestrator.run_shop(&parser).await;
    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert!(results[0]
        .error
        .as_deref()
        .unwrap()
        .contains("store unavailable"));
}

#[tokio::test]
async fn test_legacy_mode_dedups_on_name_and_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/legacy/"))
        .respond_with(html(
            r#"<html><body><div class="catalog">
                <div class="item"><a class="link" href="/p/1"><span class="title">Chair</span></a><span class="price">1 234 ₽</span></div>
                <div class="item"><a class="link" href="/p/1b"><span class="title">Chair</span></a><span class="price">1234РУБ</span></div>
                <div class="item"><a class="link" href="/p/2"><span class="title">Chair</span></a><span class="price">999 ₽</span></div>
            </div></body></html>"#
                .to_string(),
        ))
        .mount(&server)
        .await;

    let gateway = Arc::new(ScriptedGateway::default());
    let orchestrator = orchestrator(gateway.clone(), options(SaveMode::Streaming, false));
    let mut legacy = profile("legacy", format!("{}/legacy/", server.uri()), None);
    legacy.mode = ParseMode::LegacySinglePhase;
    legacy.selectors = selectors();
    let parser = orchestrator.parser_for(legacy).unwrap();

    let results = orchestrator.run_shop(&parser).await;
    assert_eq!(results.len(), 1);
    let result = &results[0];
    assert_eq!(result.kind, RunKind::Legacy);
    assert_eq!(result.counts.parsed, 3);
    assert_eq!(result.counts.saved, 2);
    assert_eq!(result.counts.skipped, 1);

    let again = orchestrator.run_legacy(&parser).await;
    assert_eq!(again.counts.saved, 0);
    assert_eq!(again.counts.skipped, 3);
}
