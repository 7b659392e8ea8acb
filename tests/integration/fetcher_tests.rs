//! HTTP fetcher tests against a mock server

use gallery_archive::config::UserAgentConfig;
use gallery_archive::crawler::{FetchError, HttpFetcher, PageFetcher, SessionCookies};
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestArchiver".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: None,
        contact_email: Some("test@example.com".to_string()),
    }
}

fn guest_fetcher() -> HttpFetcher {
    HttpFetcher::new(&test_user_agent(), SessionCookies::default()).unwrap()
}

fn url_of(server: &MockServer, page_path: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), page_path)).unwrap()
}

async fn mount_status(server: &MockServer, page_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_returns_body_bytes() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, b'P', b'N', b'G']))
        .mount(&mock_server)
        .await;

    let content = guest_fetcher()
        .fetch(&url_of(&mock_server, "/media/1.png"))
        .await
        .unwrap();

    assert_eq!(content, vec![0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_server_errors_are_transient() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, "/busy", 503).await;
    mount_status(&mock_server, "/slow-down", 429).await;

    let fetcher = guest_fetcher();
    for page_path in ["/busy", "/slow-down"] {
        let error = fetcher
            .fetch(&url_of(&mock_server, page_path))
            .await
            .unwrap_err();
        assert!(error.is_transient(), "{} should be transient", page_path);
    }
}

#[tokio::test]
async fn test_client_errors_are_permanent() {
    let mock_server = MockServer::start().await;
    mount_status(&mock_server, "/missing", 404).await;
    mount_status(&mock_server, "/forbidden", 403).await;

    let fetcher = guest_fetcher();
    for page_path in ["/missing", "/forbidden"] {
        let error = fetcher
            .fetch(&url_of(&mock_server, page_path))
            .await
            .unwrap_err();
        assert!(matches!(error, FetchError::Permanent { .. }));
    }
}

#[tokio::test]
async fn test_unreachable_host_is_transient() {
    // Nothing listens on a port that was just released
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let url = Url::parse(&format!("http://127.0.0.1:{}/gone", port)).unwrap();

    let error = guest_fetcher().fetch(&url).await.unwrap_err();

    assert!(error.is_transient());
}

#[tokio::test]
async fn test_identifies_with_user_agent_and_cookies() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/view/1/"))
        .and(header(
            "user-agent",
            "TestArchiver/1.0.0 (test@example.com)",
        ))
        .and(header("cookie", "a=first; b=second"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&mock_server)
        .await;

    let cookies = SessionCookies {
        a: Some("first".to_string()),
        b: Some("second".to_string()),
    };
    let fetcher = HttpFetcher::new(&test_user_agent(), cookies).unwrap();

    let content = fetcher
        .fetch(&url_of(&mock_server, "/view/1/"))
        .await
        .unwrap();

    assert_eq!(content, b"ok");
}
