//! Tests for agentbridge-discord: the REST client's wire contract

use agentbridge_core::MessageId;
use agentbridge_discord::*;
use httpmock::prelude::*;
use serde_json::json;

fn message_json(id: &str, author_id: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "channel_id": "77",
        "content": content,
        "timestamp": "2024-05-01T12:00:00.000000+00:00",
        "author": {"id": author_id, "username": format!("user{author_id}"), "global_name": null}
    })
}

fn client_for(server: &MockServer) -> DiscordClient {
    DiscordClient::new("tok", "77").with_base_url(server.base_url())
}

// ===========================================================================
// list
// ===========================================================================

#[tokio::test]
async fn list_sends_auth_and_limit() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/channels/77/messages")
                .query_param("limit", "10")
                .header("Authorization", "Bot tok");
            then.status(200).json_body(json!([
                message_json("1002", "42", "second"),
                message_json("1001", "42", "first"),
            ]));
        })
        .await;

    let page = client_for(&server).list(10, None).await.unwrap();
    mock.assert_async().await;
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id.as_str(), "1002");
    assert_eq!(page[1].content, "first");
}

#[tokio::test]
async fn list_passes_after_cursor() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/channels/77/messages")
                .query_param("limit", "50")
                .query_param("after", "1001");
            then.status(200).json_body(json!([]));
        })
        .await;

    let page = client_for(&server)
        .list(50, Some(&MessageId::new("1001")))
        .await
        .unwrap();
    mock.assert_async().await;
    assert!(page.is_empty());
}

#[tokio::test]
async fn list_clamps_limit_to_discord_cap() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).query_param("limit", "100");
            then.status(200).json_body(json!([]));
        })
        .await;

    client_for(&server).list(500, None).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn list_error_keeps_status_and_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(403).body(r#"{"message": "Missing Access", "code": 50001}"#);
        })
        .await;

    let err = client_for(&server).list(10, None).await.unwrap_err();
    assert_eq!(err.status(), Some(403));
    assert!(err.body().contains("Missing Access"));
}

#[tokio::test]
async fn list_garbage_is_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET);
            then.status(200).body("not json");
        })
        .await;

    let err = client_for(&server).list(10, None).await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidResponse(_)));
    assert_eq!(err.status(), None);
}

// ===========================================================================
// create
// ===========================================================================

#[tokio::test]
async fn create_posts_plain_content() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/channels/77/messages")
                .header("Authorization", "Bot tok")
                .json_body(json!({"content": "hello"}));
            then.status(200).json_body(message_json("2001", "7", "hello"));
        })
        .await;

    let created = client_for(&server).create("hello", None).await.unwrap();
    mock.assert_async().await;
    assert_eq!(created.id.as_str(), "2001");
}

#[tokio::test]
async fn create_reply_carries_message_reference() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/channels/77/messages")
                .json_body(json!({"content": "done", "message_reference": {"message_id": "555"}}));
            then.status(200).json_body(message_json("2002", "7", "done"));
        })
        .await;

    client_for(&server)
        .create("done", Some(&MessageId::new("555")))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn create_failure_is_request_failed() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST);
            then.status(429).body("slow down");
        })
        .await;

    let err = client_for(&server).create("hi", None).await.unwrap_err();
    assert_eq!(err.status(), Some(429));
    assert_eq!(err.body(), "slow down");
}

// ===========================================================================
// delete
// ===========================================================================

#[tokio::test]
async fn delete_targets_message_path() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/channels/77/messages/3003");
            then.status(204);
        })
        .await;

    client_for(&server)
        .delete(&MessageId::new("3003"))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn delete_not_found_is_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(DELETE);
            then.status(404).body("Unknown Message");
        })
        .await;

    let err = client_for(&server)
        .delete(&MessageId::new("1"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

// ===========================================================================
// construction
// ===========================================================================

#[test]
fn from_config_uses_channel_and_base() {
    let mut config = agentbridge_core::BridgeConfig::new("tok", "88");
    config.api_base = "http://localhost:1".into();
    let client = DiscordClient::from_config(&config);
    assert_eq!(client.channel_id(), "88");
    assert_eq!(client.name(), "discord");
}
