//! Integration test: signed LINE webhook in, one reply per text message out.
//! LINE's reply API and the generation service are both mocked with wiremock.

use base64::Engine;
use hmac::{Hmac, Mac};
use replier::config::{Config, FaqEntry, NewsEntry};
use replier::gateway;
use serde_json::{json, Value};
use sha2::Sha256;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "channel-secret";

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

fn sign(body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).expect("hmac key");
    mac.update(body.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

fn text_event(reply_token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": reply_token,
        "source": { "type": "user", "userId": "U0001" },
        "message": { "type": "text", "id": reply_token, "text": text }
    })
}

async fn start_gateway(mock: &MockServer) -> String {
    let port = free_port();
    let mut config = Config::default();
    config.gateway.port = port;
    config.gateway.bind = "127.0.0.1".to_string();
    config.channels.line.channel_access_token = Some("access".to_string());
    config.channels.line.channel_secret = Some(SECRET.to_string());
    config.channels.line.api_base = Some(mock.uri());
    config.generation.endpoint = format!("{}/api/generate", mock.uri());
    config.generation.timeout_secs = 5;
    config.responders.faq = vec![FaqEntry {
        question: "你好".to_string(),
        answer: "您好！有什麼可以幫您？".to_string(),
    }];
    config.responders.news = vec![NewsEntry {
        keywords: vec!["新聞".to_string()],
        reply: "今日頭條".to_string(),
    }];
    tokio::spawn(async move {
        let _ = gateway::run_gateway(config).await;
    });

    let base = format!("http://127.0.0.1:{}", port);
    let client = reqwest::Client::new();
    for _ in 0..100 {
        if let Ok(resp) = client.get(format!("{}/", base)).send().await {
            if resp.status().is_success() {
                return base;
            }
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("gateway did not come up on {}", base);
}

/// Reply API bodies received so far, keyed by replyToken.
async fn replies(mock: &MockServer) -> Vec<(String, String)> {
    mock.received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/v2/bot/message/reply")
        .filter_map(|r| {
            let body: Value = serde_json::from_slice(&r.body).ok()?;
            let token = body["replyToken"].as_str()?.to_string();
            let text = body["messages"][0]["text"].as_str()?.to_string();
            Some((token, text))
        })
        .collect()
}

async fn wait_for_replies(mock: &MockServer, n: usize) -> Vec<(String, String)> {
    for _ in 0..100 {
        let got = replies(mock).await;
        if got.len() >= n {
            return got;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    replies(mock).await
}

#[tokio::test]
async fn each_text_message_gets_exactly_one_reply() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "<think>\n天氣查詢\n</think>\n台北今天晴天" })),
        )
        .expect(1)
        .mount(&mock)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock)
        .await;

    let base = start_gateway(&mock).await;
    let body = json!({
        "destination": "U0000",
        "events": [
            text_event("t-faq", "你好"),
            text_event("t-news", "最新新聞"),
            text_event("t-gen", "今天天氣如何"),
            { "type": "follow", "replyToken": "t-follow" }
        ]
    })
    .to_string();

    let resp = reqwest::Client::new()
        .post(format!("{}/callback", base))
        .header("X-Line-Signature", sign(&body))
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(resp.text().await.expect("body"), "OK");

    let mut got = wait_for_replies(&mock, 3).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    got.sort();
    assert_eq!(
        got,
        vec![
            ("t-faq".to_string(), "您好！有什麼可以幫您？".to_string()),
            ("t-gen".to_string(), "台北今天晴天".to_string()),
            ("t-news".to_string(), "今日頭條".to_string()),
        ]
    );
    assert_eq!(replies(&mock).await.len(), 3);
}

#[tokio::test]
async fn bad_signature_is_rejected_without_reply() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock)
        .await;

    let base = start_gateway(&mock).await;
    let body = json!({ "events": [text_event("t-1", "你好")] }).to_string();

    let resp = reqwest::Client::new()
        .post(format!("{}/callback", base))
        .header("X-Line-Signature", "AAAA")
        .body(body)
        .send()
        .await
        .expect("post webhook");
    assert_eq!(resp.status().as_u16(), 400);

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(replies(&mock).await.is_empty());
}
