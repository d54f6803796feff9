//! End-to-end chat behavior against a stubbed backend.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use studybuddy::api::{BackendClient, CONNECTION_ERROR, MISSING_ANSWER};
use studybuddy::config::Config;
use studybuddy::events::Sender;
use studybuddy::ui::chat::ChatView;

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.server_url = format!("{}/", server.uri());
    config
}

fn view_for(server: &MockServer) -> ChatView {
    ChatView::new(BackendClient::new(&config_for(server)), false)
}

/// Poll until the transcript reaches `len` messages or give up.
async fn wait_for_messages(view: &mut ChatView, len: usize) {
    for _ in 0..300 {
        view.poll_replies();
        if view.messages().len() >= len {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "transcript stuck at {} messages, wanted {}",
        view.messages().len(),
        len
    );
}

#[tokio::test]
async fn answer_appends_exactly_one_bot_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_json(json!({"prompt": "X"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": "Hi",
            "total_chunks": 4,
            "sample_chunks": "C"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = view_for(&server);
    view.submit("X".to_string());
    assert!(view.is_pending());

    wait_for_messages(&mut view, 2).await;
    let bot = &view.messages()[1];
    assert_eq!(bot.sender, Sender::Bot);
    assert_eq!(bot.text, "Hi");
    assert_eq!(bot.chunks, "C");
    assert_eq!(bot.total_chunks, Some(4));
    assert!(!view.is_pending());
}

#[tokio::test]
async fn missing_answer_field_falls_back_but_keeps_chunks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"sample_chunks": "C"})),
        )
        .mount(&server)
        .await;

    let mut view = view_for(&server);
    view.submit("X".to_string());
    wait_for_messages(&mut view, 2).await;

    let bot = &view.messages()[1];
    assert_eq!(bot.text, MISSING_ANSWER);
    assert_eq!(bot.chunks, "C");
}

#[tokio::test]
async fn connection_failure_appends_the_error_message() {
    // Port 9 (discard) is not listening; the request fails outright.
    let mut config = Config::default();
    config.server_url = "http://127.0.0.1:9/".to_string();
    let mut view = ChatView::new(BackendClient::new(&config), false);

    view.submit("X".to_string());
    wait_for_messages(&mut view, 2).await;

    let bot = &view.messages()[1];
    assert_eq!(bot.text, CONNECTION_ERROR);
    assert!(bot.chunks.is_empty());
    assert!(!view.is_pending());
}

#[tokio::test]
async fn non_json_body_counts_as_a_connection_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let mut view = view_for(&server);
    view.submit("X".to_string());
    wait_for_messages(&mut view, 2).await;

    assert_eq!(view.messages()[1].text, CONNECTION_ERROR);
}

#[tokio::test]
async fn http_error_with_json_body_is_a_missing_answer_not_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "boom"})),
        )
        .mount(&server)
        .await;

    let mut view = view_for(&server);
    view.submit("X".to_string());
    wait_for_messages(&mut view, 2).await;

    assert_eq!(view.messages()[1].text, MISSING_ANSWER);
}

#[tokio::test]
async fn whitespace_submit_issues_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "never"})))
        .expect(0)
        .mount(&server)
        .await;

    let mut view = view_for(&server);
    view.submit("   ".to_string());
    tokio::time::sleep(Duration::from_millis(50)).await;
    view.poll_replies();

    assert!(view.messages().is_empty());
    assert!(!view.is_pending());
    server.verify().await;
}

#[tokio::test]
async fn overlapping_submissions_stay_append_only() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "ok"})))
        .expect(2)
        .mount(&server)
        .await;

    let mut view = view_for(&server);
    view.submit("first".to_string());
    view.submit("second".to_string());

    // Both user messages are in the transcript before either reply lands.
    assert_eq!(view.messages().len(), 2);
    assert!(view.messages().iter().all(|m| m.sender == Sender::User));

    wait_for_messages(&mut view, 4).await;
    let senders: Vec<Sender> = view.messages().iter().map(|m| m.sender).collect();
    assert_eq!(
        senders,
        vec![Sender::User, Sender::User, Sender::Bot, Sender::Bot]
    );
    assert_eq!(view.messages()[0].text, "first");
    assert_eq!(view.messages()[1].text, "second");
}
