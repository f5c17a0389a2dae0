use chat_core::ChatMessage;
use futures::StreamExt;
use relay_llm::{ChatPayload, ChatTransport, DeltaStream, HttpTransport, RelayError};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn collect_deltas(mut stream: DeltaStream) -> Vec<String> {
    let mut out = Vec::new();
    while let Some(item) = stream.next().await {
        out.push(item.expect("delta"));
    }
    out
}

fn payload() -> ChatPayload {
    ChatPayload::new(
        "gpt-4o",
        &[ChatMessage::system("S"), ChatMessage::user("hi")],
    )
}

async fn transport_for(server: &MockServer) -> HttpTransport {
    HttpTransport::new(Some(format!("{}/v1/chat", server.uri())))
}

#[tokio::test]
async fn streams_sse_deltas() {
    let server = MockServer::start().await;
    let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Hi\"}}]}\n\ndata: [DONE]\n\n";

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let stream = tokio_test::assert_ok!(transport_for(&server).await.open(&payload()).await);
    assert_eq!(collect_deltas(stream).await, vec!["Hi".to_string()]);
}

#[tokio::test]
async fn single_json_body_yields_one_delta() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Whole reply"}}]
        })))
        .mount(&server)
        .await;

    let stream = transport_for(&server).await.open(&payload()).await.unwrap();
    assert_eq!(collect_deltas(stream).await, vec!["Whole reply".to_string()]);
}

#[tokio::test]
async fn plain_text_body_is_passed_through() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(b"just text".to_vec(), "text/plain"),
        )
        .mount(&server)
        .await;

    let stream = transport_for(&server).await.open(&payload()).await.unwrap();
    assert_eq!(collect_deltas(stream).await.concat(), "just text");
}

#[tokio::test]
async fn non_success_status_is_a_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    match transport_for(&server).await.open(&payload()).await {
        Err(RelayError::Transport { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        Err(other) => panic!("expected transport error, got {other:?}"),
        Ok(_) => panic!("expected transport error, got a stream"),
    }
}

#[tokio::test]
async fn sends_bearer_token_and_payload_fields() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat"))
        .and(header("authorization", "Bearer secret"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "conversationId": "conv-9",
            "max_tokens": 2048,
            "stream": true,
            "messages": [
                {"role": "system", "content": "S"},
                {"role": "user", "content": "hi"}
            ]
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"data: {\"text\":\"ok\"}\n\n".to_vec(), "text/event-stream"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport_for(&server)
        .await
        .with_api_key(Some("secret".to_string()));
    let request = payload()
        .with_conversation_id(Some("conv-9".to_string()))
        .with_max_tokens(Some(2048));

    let stream = transport.open(&request).await.unwrap();
    assert_eq!(collect_deltas(stream).await, vec!["ok".to_string()]);
}

#[tokio::test]
async fn missing_endpoint_never_touches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = HttpTransport::new(None).open(&payload()).await;
    assert!(matches!(result, Err(RelayError::Configuration(_))));
}
