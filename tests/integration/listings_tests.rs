use crate::common::{create_test_config, mount_page, mount_status};
use avitolog::{AvitologError, Currency, Listing, Pipeline};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::MockServer;

fn card(id: u32, title: &str, price: &str) -> String {
    format!(
        r#"<div data-marker="item" data-item-id="{id}">
            <a href="/item/phone_{id}"><h3 itemprop="name">{title}</h3></a>
            <span data-marker="item-price">{price}</span>
            <div class="geo-georeferences">Москва</div>
        </div>"#
    )
}

fn results_page(cards: &[String]) -> String {
    format!(
        r#"<html><body><div data-marker="catalog-serp">{}</div></body></html>"#,
        cards.concat()
    )
}

const PHONE_1_DETAIL: &str = r#"
<html><body>
    <h1>Другой заголовок</h1>
    <span class="price-value">99 999 ₽</span>
    <div data-marker="item-description">Как новый, полный комплект.</div>
    <div class="gallery-img-wrapper"><img src="/img/phone_1_a.jpg"></div>
    <div class="gallery-img-wrapper"><img data-src="/img/phone_1_b.jpg"></div>
    <div data-marker="item-date">12 марта 2023</div>
    <ul class="item-params-list">
        <li>Производитель: Apple</li>
        <li>Память: 128 ГБ</li>
    </ul>
</body></html>
"#;

#[tokio::test]
async fn test_listings_are_limited_and_enriched() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let cards = [
        card(1, "iPhone 13", "50 000 ₽"),
        card(2, "Pixel 7", "30 000 ₽"),
        card(3, "Galaxy S22", "40 000 ₽"),
    ];
    mount_page(&mock_server, "/moskva/telefony", &results_page(&cards), 1).await;
    mount_page(&mock_server, "/item/phone_1", PHONE_1_DETAIL, 1).await;
    mount_status(&mock_server, "/item/phone_2", 500, 1).await;
    mount_status(&mock_server, "/item/phone_3", 200, 0).await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let category_url = format!("{}/moskva/telefony", base);
    let listings = pipeline
        .discover_listings(&category_url, 2, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(listings.len(), 2);

    let first = &listings[0];
    assert_eq!(first.id, "1");
    assert_eq!(first.title, "iPhone 13");
    assert_eq!(first.url, format!("{}/item/phone_1", base));
    assert_eq!(first.category_url, category_url);
    assert_eq!(first.price.value, 50000.0);
    assert_eq!(first.description, "Как новый, полный комплект.");
    assert_eq!(
        first.image_urls,
        vec![
            format!("{}/img/phone_1_a.jpg", base),
            format!("{}/img/phone_1_b.jpg", base),
        ]
    );
    assert_eq!(first.location, "Москва");
    assert_eq!(first.attributes["Производитель"], "Apple");
    assert_eq!(
        first.published_at.map(|d| d.date_naive().to_string()),
        Some("2023-03-12".to_string())
    );

    // A failed detail page keeps the summary
    let second = &listings[1];
    assert_eq!(second.id, "2");
    assert_eq!(second.title, "Pixel 7");
    assert_eq!(second.price.value, 30000.0);
    assert!(second.description.is_empty());
    assert!(second.published_at.is_none());
}

#[tokio::test]
async fn test_page_wide_fallback_when_no_container() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let page = r#"
        <html><body>
            <div><a href="/item/lamp_21">Лампа настольная</a><span class="price">1 200 ₽</span></div>
            <div><a href="/moskva/mebel">Мебель</a></div>
        </body></html>
    "#;
    mount_page(&mock_server, "/moskva/osveshchenie", page, 1).await;
    mount_page(&mock_server, "/item/lamp_21", "<html><body></body></html>", 1).await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let listings = pipeline
        .discover_listings(
            &format!("{}/moskva/osveshchenie", base),
            0,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].id, "21");
    assert_eq!(listings[0].title, "Лампа настольная");
    assert_eq!(listings[0].price.value, 1200.0);
    assert_eq!(listings[0].price.currency, Currency::Rub);
}

#[tokio::test]
async fn test_catalog_items_and_nested_catalogs() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let catalog = r#"
        <html><body>
            <div class="items-items">
                <div data-item-id="8"><a href="/item/galaxy_8">Galaxy</a></div>
            </div>
            <div class="catalog-card"><a href="/brands/apple">Apple</a></div>
            <a href="/favorites">Избранное</a>
        </body></html>
    "#;
    let nested = results_page(&[card(7, "iPhone 15", "90 000 ₽"), card(9, "iPhone 14", "70 000 ₽")]);

    mount_page(&mock_server, "/catalog/phones", catalog, 1).await;
    mount_page(
        &mock_server,
        "/item/galaxy_8",
        r#"<html><body><h1>Galaxy S24</h1><span class="price-value">80 000 ₽</span></body></html>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/brands/apple", &nested, 1).await;
    mount_page(&mock_server, "/item/phone_7", "<html><body></body></html>", 1).await;
    mount_status(&mock_server, "/item/phone_9", 200, 0).await;
    mount_status(&mock_server, "/favorites", 200, 0).await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let catalog_url = format!("{}/catalog/phones", base);
    let listings = pipeline
        .discover_listings(&catalog_url, 0, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(listings.len(), 2);

    assert_eq!(listings[0].id, "8");
    assert_eq!(listings[0].title, "Galaxy S24");
    assert_eq!(listings[0].price.value, 80000.0);
    assert_eq!(listings[0].category_url, catalog_url);

    // Nested catalogs contribute at most one listing each
    assert_eq!(listings[1].id, "7");
    assert_eq!(listings[1].title, "iPhone 15");
    assert_eq!(listings[1].category_url, format!("{}/brands/apple", base));
}

#[tokio::test]
async fn test_catalog_respects_limit() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let catalog = r#"
        <html><body><div class="catalog-items">
            <div class="catalog-item"><a href="/item/a_1">A</a></div>
            <div class="catalog-item"><a href="/item/b_2">B</a></div>
            <div class="catalog-item"><a href="/item/c_3">C</a></div>
        </div></body></html>
    "#;
    mount_page(&mock_server, "/catalog/misc", catalog, 1).await;
    mount_page(&mock_server, "/item/a_1", "<h1>A</h1>", 1).await;
    mount_status(&mock_server, "/item/b_2", 404, 1).await;
    mount_status(&mock_server, "/item/c_3", 200, 0).await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let listings = pipeline
        .discover_listings(&format!("{}/catalog/misc", base), 2, &CancellationToken::new())
        .await
        .unwrap();

    // The failed item still has an id, so its bare summary is kept
    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].title, "A");
    assert_eq!(listings[1].id, "2");
    assert!(listings[1].title.is_empty());
}

const TWO_ITEM_CATALOG: &str = r#"
    <html><body><div class="catalog-items">
        <div class="catalog-item"><a href="/item/a_1">A</a></div>
        <div class="catalog-item"><a href="/item/b_2">B</a></div>
    </div></body></html>
"#;

#[tokio::test]
async fn test_catalog_delay_applies_between_urls_only() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(&mock_server, "/catalog/pair", TWO_ITEM_CATALOG, 1).await;
    mount_page(&mock_server, "/item/a_1", "<h1>A</h1>", 1).await;
    mount_page(&mock_server, "/item/b_2", "<h1>B</h1>", 1).await;

    let mut config = create_test_config(&base);
    config.fetch.catalog_delay_ms = 250;

    let pipeline = Pipeline::new(config).unwrap();
    let started = Instant::now();
    let listings = pipeline
        .discover_listings(&format!("{}/catalog/pair", base), 0, &CancellationToken::new())
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(listings.len(), 2);
    // One pause between the two items, none after the last
    assert!(elapsed >= Duration::from_millis(250), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(500), "elapsed {:?}", elapsed);
}

#[tokio::test]
async fn test_cancel_during_catalog_delay() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(&mock_server, "/catalog/pair", TWO_ITEM_CATALOG, 1).await;
    mount_page(&mock_server, "/item/a_1", "<h1>A</h1>", 1).await;
    mount_status(&mock_server, "/item/b_2", 200, 0).await;

    let mut config = create_test_config(&base);
    config.fetch.catalog_delay_ms = 60_000;

    let pipeline = Pipeline::new(config).unwrap();
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        })
    };

    let started = Instant::now();
    let result = pipeline
        .discover_listings(&format!("{}/catalog/pair", base), 0, &cancel)
        .await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(AvitologError::Canceled)));
    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(pipeline.requests_made(), 2);
}

#[tokio::test]
async fn test_enrich_listing_directly() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_page(&mock_server, "/item/phone_1", PHONE_1_DETAIL, 1).await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let listing = pipeline
        .enrich_listing(
            Listing::from_url(format!("{}/item/phone_1", base)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(listing.id, "1");
    assert_eq!(listing.title, "Другой заголовок");
    assert_eq!(listing.price.value, 99999.0);
    assert_eq!(listing.attributes.len(), 2);
}

#[tokio::test]
async fn test_enrich_listing_without_url() {
    let pipeline = Pipeline::new(create_test_config("https://www.avito.ru")).unwrap();
    let result = pipeline
        .enrich_listing(Listing::default(), &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(AvitologError::MissingUrl)));
    assert_eq!(pipeline.requests_made(), 0);
}
