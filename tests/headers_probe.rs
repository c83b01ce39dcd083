// tests/headers_probe.rs

use scano::core::config::ScanConfig;
use scano::core::models::{ProbeOutcome, SecurityHeader};
use scano::core::scanner::headers_scanner::{build_client, run_headers_scan};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn client() -> reqwest::Client {
    build_client(&ScanConfig::default()).unwrap()
}

#[tokio::test]
async fn collects_security_headers_from_the_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("strict-transport-security", "max-age=63072000")
                .insert_header("x-frame-options", "DENY")
                .insert_header("server", "nginx/1.25.3")
                .set_body_string("<html></html>"),
        )
        .mount(&mock_server)
        .await;

    let url = Url::parse(&mock_server.uri()).unwrap();
    let probe = run_headers_scan(&client(), &url).await;

    let summary = probe.summary.as_available().expect("request should succeed");
    assert_eq!(summary.status, 200);
    assert!(probe.headers.is_present(SecurityHeader::StrictTransportSecurity));
    assert!(probe.headers.is_present(SecurityHeader::XFrameOptions));
    assert!(!probe.headers.is_present(SecurityHeader::ContentSecurityPolicy));
    assert_eq!(probe.headers.present_count(), 2);
    assert_eq!(probe.headers.value(SecurityHeader::XFrameOptions), Some("DENY"));
    assert_eq!(probe.raw_headers.get("server").map(String::as_str), Some("nginx/1.25.3"));
}

#[tokio::test]
async fn follows_redirects_within_the_same_host() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).insert_header("referrer-policy", "no-referrer"))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/old", mock_server.uri())).unwrap();
    let probe = run_headers_scan(&client(), &url).await;

    let summary = probe.summary.as_available().expect("redirect should be followed");
    assert_eq!(summary.status, 200);
    assert!(summary.final_url.ends_with("/new"));
    assert!(probe.headers.is_present(SecurityHeader::ReferrerPolicy));
}

async fn requests_to(mock_server: &MockServer, wanted: &str) -> usize {
    mock_server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == wanted)
        .count()
}

#[tokio::test]
async fn refuses_redirects_to_names_resolving_to_loopback() {
    let mock_server = MockServer::start().await;
    let port = mock_server.address().port();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("http://localhost:{port}/admin").as_str()),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/admin"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-frame-options", "DENY"))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&mock_server.uri()).unwrap();
    let probe = run_headers_scan(&client(), &url).await;

    match probe.summary {
        ProbeOutcome::Unavailable { reason } => assert!(reason.contains("reserved address"), "{reason}"),
        ProbeOutcome::Available(summary) => panic!("redirect was followed to {}", summary.final_url),
    }
    assert_eq!(probe.headers.present_count(), 0);
    assert_eq!(requests_to(&mock_server, "/").await, 1);
    assert_eq!(requests_to(&mock_server, "/admin").await, 0);
}

#[tokio::test]
async fn refuses_redirects_to_literal_private_addresses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "http://169.254.169.254/latest/meta-data"))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&mock_server.uri()).unwrap();
    let probe = run_headers_scan(&client(), &url).await;

    match probe.summary {
        ProbeOutcome::Unavailable { reason } => assert!(reason.contains("169.254.169.254"), "{reason}"),
        ProbeOutcome::Available(summary) => panic!("redirect was followed to {}", summary.final_url),
    }
}

#[tokio::test]
async fn hostnames_resolving_to_loopback_are_never_fetched() {
    let mock_server = MockServer::start().await;
    let port = mock_server.address().port();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("http://localhost:{port}/")).unwrap();
    let probe = run_headers_scan(&client(), &url).await;

    match probe.summary {
        ProbeOutcome::Unavailable { reason } => assert!(reason.contains("reserved address"), "{reason}"),
        ProbeOutcome::Available(summary) => panic!("fetched {}", summary.final_url),
    }
    assert_eq!(requests_to(&mock_server, "/").await, 0);
}

#[tokio::test]
async fn stops_after_the_redirect_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/loop"))
        .mount(&mock_server)
        .await;

    let mut config = ScanConfig::default();
    config.http.max_redirects = 3;
    let client = build_client(&config).unwrap();
    let url = Url::parse(&format!("{}/loop", mock_server.uri())).unwrap();
    let probe = run_headers_scan(&client, &url).await;

    assert!(!probe.summary.is_available());
}
