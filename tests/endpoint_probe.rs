// tests/endpoint_probe.rs

use scano::core::config::ScanConfig;
use scano::core::models::ProbeOutcome;
use scano::core::scanner::endpoint_scanner::{build_probe_client, probed_path_count, run_endpoint_scan};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn client() -> reqwest::Client {
    build_probe_client(&ScanConfig::default()).unwrap()
}

#[tokio::test]
async fn reports_an_exposed_git_directory() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.git/HEAD"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ref: refs/heads/main\n"))
        .mount(&mock_server)
        .await;

    let base = Url::parse(&mock_server.uri()).unwrap();
    let findings = run_endpoint_scan(&client(), &base).await;

    let ProbeOutcome::Available(findings) = findings else {
        panic!("probe should reach the mock server");
    };
    assert_eq!(findings.probed, probed_path_count());
    assert_eq!(findings.exposed, vec!["/.git/HEAD".to_string()]);
}

#[tokio::test]
async fn catch_all_pages_are_not_exposures() {
    let mock_server = MockServer::start().await;

    // Every path answers 200 with the same HTML page.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Welcome!</body></html>"))
        .mount(&mock_server)
        .await;

    let base = Url::parse(&mock_server.uri()).unwrap();
    let findings = run_endpoint_scan(&client(), &base).await;

    let ProbeOutcome::Available(findings) = findings else {
        panic!("probe should reach the mock server");
    };
    assert!(findings.exposed.is_empty());
}

#[tokio::test]
async fn redirects_are_not_followed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/.env"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/login"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("APP_KEY=leaked\n"))
        .mount(&mock_server)
        .await;

    let base = Url::parse(&mock_server.uri()).unwrap();
    let findings = run_endpoint_scan(&client(), &base).await;

    assert!(findings.as_available().is_some_and(|f| f.exposed.is_empty()));
}

#[tokio::test]
async fn loopback_hostnames_are_refused_before_connecting() {
    let mock_server = MockServer::start().await;
    let port = mock_server.address().port();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ref: refs/heads/main\n"))
        .mount(&mock_server)
        .await;

    let base = Url::parse(&format!("http://localhost:{port}/")).unwrap();
    let outcome = run_endpoint_scan(&client(), &base).await;

    match outcome {
        ProbeOutcome::Unavailable { reason } => assert!(reason.contains("reserved address"), "{reason}"),
        ProbeOutcome::Available(findings) => panic!("paths were requested: {findings:?}"),
    }
    assert!(mock_server.received_requests().await.unwrap_or_default().is_empty());
}
