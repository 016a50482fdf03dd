use avitolog::config::{Config, UserAgentConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DEFAULT_AGENT: &str = "TestBot-default";
pub const ROTATION: [&str; 3] = ["TestBot-0", "TestBot-1", "TestBot-2"];

/// Creates a test configuration pointed at the mock server with near-zero delays
pub fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.fetch.min_interval_ms = 0;
    config.fetch.jitter_ms = 0;
    config.fetch.timeout_secs = 5;
    config.fetch.connect_timeout_secs = 5;
    config.fetch.max_retries = 3;
    config.fetch.backoff_base_ms = 10;
    config.fetch.rate_limit_pause_ms = 0;
    config.fetch.catalog_delay_ms = 0;
    config.user_agent = UserAgentConfig {
        default: DEFAULT_AGENT.to_string(),
        rotation: ROTATION.iter().map(|ua| ua.to_string()).collect(),
    };
    config
}

pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body.to_string())
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Serves `body` at `page_path`, expecting exactly `hits` requests
pub async fn mount_page(server: &MockServer, page_path: &str, body: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .expect(hits)
        .mount(server)
        .await;
}

/// Answers `page_path` with `status`, expecting exactly `hits` requests
pub async fn mount_status(server: &MockServer, page_path: &str, status: u16, hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status))
        .expect(hits)
        .mount(server)
        .await;
}
