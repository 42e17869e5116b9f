//! End-to-end tests over a real socket.

use api_guard::GuardConfig;

mod common;
use common::start_server;

#[tokio::test]
async fn test_served_guard_chain() {
    let (addr, shutdown, handle) = start_server(GuardConfig::default()).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .get(format!("http://{}/health", addr))
        .send()
        .await
        .expect("server unreachable");
    assert_eq!(res.status(), 200);

    // Peer address identifies the client when no forwarding header is sent
    let res = client
        .get(format!("http://{}/api/foo", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-ratelimit-remaining"], "29");
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["client"], "127.0.0.1");

    let res = client
        .post(format!("http://{}/api/purchaseNFT", addr))
        .header("origin", "https://evil.example")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert_eq!(res.headers()["x-frame-options"], "DENY");

    shutdown.trigger();
    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("server did not shut down")
        .unwrap();
}

#[tokio::test]
async fn test_development_origin_allowed_only_in_development() {
    let mut config = GuardConfig::default();
    config.csrf.development = true;
    config.csrf.app_url = Some("https://app.example.com".into());
    let (addr, shutdown, _handle) = start_server(config).await;
    let client = reqwest::Client::builder().no_proxy().build().unwrap();

    let res = client
        .post(format!("http://{}/api/prepareStaking", addr))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-ratelimit-limit"], "20");
    shutdown.trigger();

    // Same origin against a production configuration
    let mut config = GuardConfig::default();
    config.csrf.app_url = Some("https://app.example.com".into());
    let (addr, shutdown, _handle) = start_server(config).await;

    let res = client
        .post(format!("http://{}/api/prepareStaking", addr))
        .header("origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert_eq!(res.headers()["x-content-type-options"], "nosniff");

    shutdown.trigger();
}
