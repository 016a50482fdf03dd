use crate::common::{create_test_config, html, mount_status, DEFAULT_AGENT, ROTATION};
use avitolog::{AvitologError, FetchCause, Listing, Pipeline};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_rate_limit_retry_rotates_user_agent() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    // First attempt uses the default identity and is throttled
    Mock::given(method("GET"))
        .and(path("/item/bike_5"))
        .and(header("user-agent", DEFAULT_AGENT))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Retry 1 picks rotation[1 % 3]
    Mock::given(method("GET"))
        .and(path("/item/bike_5"))
        .and(header("user-agent", ROTATION[1]))
        .respond_with(html("<html><body><h1>Велосипед</h1></body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let listing = pipeline
        .enrich_listing(
            Listing::from_url(format!("{}/item/bike_5", base)),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(listing.title, "Велосипед");
    assert_eq!(pipeline.requests_made(), 2);
}

#[tokio::test]
async fn test_rate_limit_retries_exhausted() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let mut config = create_test_config(&base);
    config.fetch.max_retries = 2;

    Mock::given(method("GET"))
        .and(path("/item/bike_5"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(config).unwrap();
    let result = pipeline
        .enrich_listing(
            Listing::from_url(format!("{}/item/bike_5", base)),
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(AvitologError::RateLimitExceeded { url, attempts }) => {
            assert_eq!(url, format!("{}/item/bike_5", base));
            assert_eq!(attempts, 3);
        }
        other => panic!("expected rate limit exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_other_statuses_are_not_retried() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_status(&mock_server, "/item/gone_1", 404, 1).await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let result = pipeline
        .enrich_listing(
            Listing::from_url(format!("{}/item/gone_1", base)),
            &CancellationToken::new(),
        )
        .await;

    match result {
        Err(AvitologError::Fetch { cause, .. }) => assert_eq!(cause, FetchCause::Status(404)),
        other => panic!("expected fetch error, got {:?}", other),
    }
    assert_eq!(pipeline.requests_made(), 1);
}

#[tokio::test]
async fn test_cancel_aborts_in_flight_request() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/moskva/telefony"))
        .respond_with(html("<html></html>").set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel.cancel();
        })
    };

    let started = Instant::now();
    let result = pipeline
        .discover_listings(&format!("{}/moskva/telefony", base), 0, &cancel)
        .await;
    canceller.await.unwrap();

    assert!(result.unwrap_err().is_canceled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancel_aborts_rate_limit_backoff() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let mut config = create_test_config(&base);
    config.fetch.rate_limit_pause_ms = 60_000;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let pipeline = Pipeline::new(config).unwrap();
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        })
    };

    let started = Instant::now();
    let result = pipeline.discover_categories(&cancel).await;
    canceller.await.unwrap();

    assert!(result.unwrap_err().is_canceled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_cancellation_propagates_through_enrichment() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    let page = r#"<div data-marker="catalog-serp">
        <div data-marker="item"><a href="/item/a_1">A</a></div>
        <div data-marker="item"><a href="/item/b_2">B</a></div>
    </div>"#;
    Mock::given(method("GET"))
        .and(path("/moskva/list"))
        .respond_with(html(page))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/a_1"))
        .respond_with(html("<h1>A</h1>").set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;
    mount_status(&mock_server, "/item/b_2", 200, 0).await;

    let pipeline = Pipeline::new(create_test_config(&base)).unwrap();
    let cancel = CancellationToken::new();

    let canceller = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            cancel.cancel();
        })
    };

    // A canceled enrichment is not swallowed like an ordinary failure
    let result = pipeline
        .discover_listings(&format!("{}/moskva/list", base), 0, &cancel)
        .await;
    canceller.await.unwrap();

    assert!(matches!(result, Err(AvitologError::Canceled)));
}

#[tokio::test]
async fn test_concurrent_calls_share_request_spacing() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .respond_with(html("<h1>Объявление</h1>"))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&base);
    config.fetch.min_interval_ms = 200;

    let pipeline = Pipeline::new(config).unwrap();
    let other = pipeline.clone();
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let (first, second) = tokio::join!(
        pipeline.enrich_listing(Listing::from_url(format!("{}/item/a_1", base)), &cancel),
        other.enrich_listing(Listing::from_url(format!("{}/item/b_2", base)), &cancel),
    );

    assert!(first.is_ok());
    assert!(second.is_ok());
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(pipeline.requests_made(), 2);
}
