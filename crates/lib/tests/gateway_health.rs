//! Integration test: start the gateway on a free port, GET /, assert health JSON.
//! Does not require a generation service or LINE. The server task is left running when the test ends.

use replier::config::Config;
use replier::gateway;
use std::time::Duration;

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

#[tokio::test]
async fn gateway_health_http_responds_with_running() {
    let port = free_port();

    let mut config = Config::default();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();
    config.channels.line.channel_access_token = Some("access".to_string());
    config.channels.line.channel_secret = Some("secret".to_string());

    let gateway_handle = tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let url = format!("http://127.0.0.1:{}/", port);
    let client = reqwest::Client::new();
    let mut last_err = None;
    for _ in 0..100 {
        match client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                let json: serde_json::Value = resp.json().await.expect("parse JSON");
                assert_eq!(json.get("runtime").and_then(|v| v.as_str()), Some("running"));
                assert_eq!(json.get("port").and_then(|v| v.as_u64()), Some(port as u64));
                assert_eq!(
                    json.get("responders"),
                    Some(&serde_json::json!(["faq", "news", "generative"]))
                );
                assert_eq!(json.get("policy").and_then(|v| v.as_str()), Some("alwaysAnswer"));
                return;
            }
            Ok(_) => {}
            Err(e) => last_err = Some(e),
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    gateway_handle.abort();
    panic!(
        "GET {} did not return 200 with health JSON within 5s; last error: {:?}",
        url, last_err
    );
}

#[tokio::test]
async fn gateway_refuses_to_start_without_line_credentials() {
    if std::env::var("LINE_CHANNEL_ACCESS_TOKEN").is_ok() {
        return;
    }
    let mut config = Config::default();
    config.gateway.port = free_port();
    let result = tokio::time::timeout(Duration::from_secs(5), gateway::run_gateway(config))
        .await
        .expect("run_gateway should fail fast");
    let err = result.expect_err("missing credentials must be fatal");
    assert!(err.to_string().contains("LINE channel access token"));
}
