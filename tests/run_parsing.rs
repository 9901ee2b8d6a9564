//! End-to-end runs through `run_parsing` with a profile file, a file-backed
//! database and image downloads.

mod helpers;

use clap::Parser;
use sqlx::SqlitePool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use catalog_scraper::storage::query_run_history;
use catalog_scraper::{run_parsing, Config, SaveMode};
use helpers::{html, product_page};

async fn mount_shop(server: &MockServer) {
    let catalog = format!(
        r#"<html><body><div class="catalog">
            <div class="item"><a class="link" href="/p/1"><span class="title">Chair</span></a><img src="/img/1.jpg"></div>
            <div class="item"><a class="link" href="/p/2"><span class="title">Table</span></a></div>
        </div><a class="next" href="{}/catalog/end">next</a></body></html>"#,
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/catalog/"))
        .respond_with(html(catalog))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalog/end"))
        .respond_with(html("<html><body><div class=\"catalog\"></div></body></html>".into()))
        .mount(server)
        .await;
    for id in [1, 2] {
        Mock::given(method("GET"))
            .and(path(format!("/p/{}", id)))
            .respond_with(html(product_page("Pine")))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
        .mount(server)
        .await;
}

fn write_profiles(dir: &std::path::Path, server: &MockServer) -> std::path::PathBuf {
    let profiles = serde_json::json!([
        {
            "name": "mock-shop",
            "shop_url": server.uri(),
            "base_urls": [
                {"url": format!("{}/catalog/", server.uri()),
                 "pagination": {"kind": "next_link", "selector": "a.next"}}
            ],
            "selectors": {
                "product_container": ".catalog .item",
                "name": ".title",
                "product_link": "a.link",
                "image": "img",
                "detail": {
                    "material": ".material",
                    "variants": [{"axis": "size", "selector": ".sizes li"}]
                }
            }
        },
        {
            "name": "other-shop",
            "base_urls": [{"url": format!("{}/nowhere/", server.uri())}],
            "selectors": {"product_container": ".x", "name": ".y", "product_link": "a"}
        }
    ]);
    let path = dir.join("shops.json");
    std::fs::write(&path, serde_json::to_string_pretty(&profiles).unwrap()).unwrap();
    path
}

#[tokio::test]
async fn test_run_parsing_end_to_end() {
    let server = MockServer::start().await;
    mount_shop(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let shops_file = write_profiles(dir.path(), &server);
    let db_path = dir.path().join("catalog.db");
    let image_dir = dir.path().join("images");

    let config = Config {
        db_path: db_path.clone(),
        shops_file: Some(shops_file.clone()),
        shops: vec!["mock-shop".into()],
        image_dir: Some(image_dir.clone()),
        shop_retries: 0,
        ..Default::default()
    };

    let report = run_parsing(config.clone()).await.unwrap();
    assert!(report.all_succeeded());
    let totals = report.totals();
    assert_eq!(totals.parsed, 2);
    assert_eq!(totals.saved, 2);
    assert_eq!(totals.detailed, 2);

    let pool = SqlitePool::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .unwrap();
    let detailed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM products WHERE parsing_status = 'DetailedParsed' AND material = 'Pine'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(detailed, 2);

    let image_path: Option<String> =
        sqlx::query_scalar("SELECT image_path FROM products WHERE name = 'Chair'")
            .fetch_one(&pool)
            .await
            .unwrap();
    let image_path = image_path.expect("image stored");
    assert!(image_path.starts_with(&image_dir.display().to_string()));
    assert!(std::path::Path::new(&image_path).exists());

    let second = run_parsing(config).await.unwrap();
    assert_eq!(second.totals().saved, 0);
    assert_eq!(second.totals().skipped, 2);

    let history = query_run_history(&pool, None).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().all(|run| run.shop_name == "mock-shop"));
}

#[tokio::test]
async fn test_unknown_shop_filter_is_an_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        db_path: dir.path().join("catalog.db"),
        shops_file: Some(write_profiles(dir.path(), &server)),
        shops: vec!["does-not-exist".into()],
        ..Default::default()
    };
    let err = run_parsing(config).await.unwrap_err();
    assert!(err.to_string().contains("No shop profiles"));
}

#[tokio::test]
async fn test_failed_shop_is_reported_not_raised() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut profiles: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(write_profiles(dir.path(), &server)).unwrap(),
    )
    .unwrap();
    profiles[1]["base_urls"] = serde_json::json!([]);
    let shops_file = dir.path().join("broken.json");
    std::fs::write(&shops_file, profiles.to_string()).unwrap();

    let config = Config {
        db_path: dir.path().join("catalog.db"),
        shops_file: Some(shops_file),
        shops: vec!["other-shop".into()],
        save_mode: SaveMode::Batch,
        ..Default::default()
    };
    let report = run_parsing(config).await.unwrap();
    assert!(!report.all_succeeded());
    assert_eq!(report.failed_shops(), vec!["other-shop"]);
}

#[test]
fn test_cli_flags_map_to_config() {
    let config = Config::try_parse_from([
        "catalog_scraper",
        "--db-path",
        "/tmp/x.db",
        "--save-mode",
        "batch",
        "--skip-details",
        "--shop",
        "a",
        "--shop",
        "b",
        "--max-pages",
        "3",
        "--request-delay-ms",
        "250",
    ])
    .unwrap();
    assert_eq!(config.db_path, std::path::PathBuf::from("/tmp/x.db"));
    assert_eq!(config.save_mode, SaveMode::Batch);
    assert!(config.skip_details);
    assert_eq!(config.shops, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(config.max_pages, 3);
    assert_eq!(config.request_delay_ms, 250);
}

#[test]
fn test_cli_rejects_unknown_save_mode() {
    assert!(Config::try_parse_from(["catalog_scraper", "--save-mode", "sometimes"]).is_err());
}
