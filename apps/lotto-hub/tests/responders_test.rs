mod common;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use lotto_common::ValueSet;
use tokio::time;
use tokio_tungstenite::tungstenite;

fn text(s: &str) -> tungstenite::Message {
    tungstenite::Message::Text(s.to_string().into())
}

// ---------------------------------------------------------------------------
// /ws/random
// ---------------------------------------------------------------------------

#[tokio::test]
async fn random_answers_each_message() {
    let state = common::test_state();
    let addr = common::start_ws_server(&state).await;
    let mut ws = common::connect(addr, "/ws/random").await;

    for _ in 0..3 {
        ws.send(text("next")).await.expect("send");
        let reply = common::next_text(&mut ws).await;
        let values: ValueSet = serde_json::from_str(&reply).expect("value set");
        assert!(values.values().iter().all(|v| *v < 10));
    }

    // Not part of the hub.
    assert!(state.hub.registry().is_empty());
}

#[tokio::test]
async fn random_sends_nothing_unprompted() {
    let state = common::test_state();
    let addr = common::start_ws_server(&state).await;
    let mut ws = common::connect(addr, "/ws/random").await;

    assert!(time::timeout(Duration::from_millis(200), ws.next()).await.is_err());
}

// ---------------------------------------------------------------------------
// /ws/crawl
// ---------------------------------------------------------------------------

#[tokio::test]
async fn crawl_returns_scraped_text() {
    let state = common::test_state_with_scraper(common::StubScraper {
        reply: Some("Draw 1140".to_string()),
    });
    let addr = common::start_ws_server(&state).await;
    let mut ws = common::connect(addr, "/ws/crawl").await;

    ws.send(text("crawl")).await.expect("send");
    assert_eq!(common::next_text(&mut ws).await, "Draw 1140");
}

#[tokio::test]
async fn crawl_failure_returns_empty_string() {
    let state = common::test_state_with_scraper(common::StubScraper { reply: None });
    let addr = common::start_ws_server(&state).await;
    let mut ws = common::connect(addr, "/ws/crawl").await;

    ws.send(text("crawl")).await.expect("send");
    assert_eq!(common::next_text(&mut ws).await, "");
}

#[tokio::test]
async fn crawl_ignores_other_messages() {
    let state = common::test_state();
    let addr = common::start_ws_server(&state).await;
    let mut ws = common::connect(addr, "/ws/crawl").await;

    ws.send(text("hello")).await.expect("send");
    ws.send(text("CRAWL")).await.expect("send");
    ws.send(text("crawl")).await.expect("send");

    // Only the exact trigger gets a reply.
    assert_eq!(common::next_text(&mut ws).await, "stub page text");
    assert!(time::timeout(Duration::from_millis(200), ws.next()).await.is_err());
}
