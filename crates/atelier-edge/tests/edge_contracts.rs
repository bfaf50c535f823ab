#[path = "harness.rs"]
mod harness;

use harness::{edge_client, EdgeProcess};
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LLM_STREAM_PATH: &str = "/v1beta/models/gemini-1.5-flash:streamGenerateContent";

async fn mount_session(server: &MockServer, user_id: &str) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": user_id,
            "email": "pat@example.com"
        })))
        .mount(server)
        .await;
}

async fn mount_no_session(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(401))
        .mount(server)
        .await;
}

async fn mount_role(server: &MockServer, role: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/admin_users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "role": role }])))
        .mount(server)
        .await;
}

fn location(resp: &reqwest::Response) -> &str {
    resp.headers()
        .get("location")
        .expect("location header")
        .to_str()
        .expect("location str")
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn public_routes_pass_without_session() {
    let process = EdgeProcess::spawn().await;
    let client = edge_client();

    for route in ["/health", "/about", "/services/web"] {
        let resp = client
            .get(format!("{}{route}", process.base_url))
            .send()
            .await
            .expect("response");
        assert_eq!(resp.status(), StatusCode::OK, "route {route}");
    }
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admin_without_session_redirects_to_sign_in() {
    let process = EdgeProcess::spawn().await;
    let client = edge_client();

    let resp = client
        .get(format!("{}/admin/clients", process.base_url))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/admin/login");
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admin_sign_in_and_diagnostics_pass_without_session() {
    let process = EdgeProcess::spawn().await;
    let client = edge_client();

    let resp = client
        .get(format!("{}/admin/login", process.base_url))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/admin/diagnostics", process.base_url))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["status"], "ok");
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admin_with_unrecognized_role_is_sent_to_unauthorized() {
    let process = EdgeProcess::spawn().await;
    mount_session(&process.auth_server, "user-1").await;
    mount_role(&process.data_server, "viewer").await;
    let client = edge_client();

    let resp = client
        .get(format!("{}/admin/clients", process.base_url))
        .header("cookie", "sb-access-token=tok")
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/unauthorized");
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn admin_with_editor_role_forwards() {
    let process = EdgeProcess::spawn().await;
    mount_session(&process.auth_server, "user-1").await;
    mount_role(&process.data_server, "editor").await;
    let client = edge_client();

    let resp = client
        .get(format!("{}/admin/clients", process.base_url))
        .header("cookie", "sb-access-token=tok")
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["page"], "/admin/clients");
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn role_lookup_outage_fails_closed() {
    let process = EdgeProcess::spawn().await;
    mount_session(&process.auth_server, "user-1").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/admin_users"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&process.data_server)
        .await;
    let client = edge_client();

    let resp = client
        .get(format!("{}/admin/clients", process.base_url))
        .header("cookie", "sb-access-token=tok")
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/admin/login?error=role");
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn client_area_accepts_any_session() {
    let process = EdgeProcess::spawn().await;
    mount_session(&process.auth_server, "client-7").await;
    let client = edge_client();

    let resp = client
        .get(format!("{}/client/portal", process.base_url))
        .header("cookie", "sb-access-token=tok")
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn client_area_without_session_redirects_to_sign_in() {
    let process = EdgeProcess::spawn().await;
    mount_no_session(&process.auth_server).await;
    let client = edge_client();

    let resp = client
        .get(format!("{}/client/portal", process.base_url))
        .header("cookie", "sb-access-token=stale")
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), "/login");
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_rejects_an_empty_message_list() {
    let process = EdgeProcess::spawn().await;
    let client = edge_client();

    let resp = client
        .post(format!("{}/api/chat", process.base_url))
        .json(&json!({ "messages": [] }))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.text().await.expect("body"), "Messages required");
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_streams_deltas_in_order_then_done() {
    let process = EdgeProcess::spawn().await;
    let sse_body = format!(
        "data: {}\n\ndata: {}\n\n",
        json!({ "candidates": [{ "content": { "parts": [{ "text": "Most projects " }] } }] }),
        json!({ "candidates": [{ "content": { "parts": [{ "text": "start at $2,500." }] } }] }),
    );
    Mock::given(method("POST"))
        .and(path(LLM_STREAM_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sse_body)
                .insert_header("content-type", "text/event-stream"),
        )
        .mount(&process.llm_server)
        .await;
    let client = edge_client();

    let resp = client
        .post(format!("{}/api/chat", process.base_url))
        .json(&json!({
            "messages": [{ "role": "user", "content": "what do you charge?" }],
            "sessionId": "sess-1"
        }))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);

    let body = resp.text().await.expect("body");
    let first = body
        .find(r#"{"choices":[{"delta":{"content":"Most projects "}}]}"#)
        .expect("first delta present");
    let second = body
        .find(r#"{"choices":[{"delta":{"content":"start at $2,500."}}]}"#)
        .expect("second delta present");
    assert!(first < second, "chunk order must match upstream order");

    let done = body.rfind("data: [DONE]").expect("terminal sentinel");
    assert!(second < done, "sentinel must come last");
    assert_eq!(body.matches("data: [DONE]").count(), 1);
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chat_upstream_rejection_is_a_plain_500() {
    let process = EdgeProcess::spawn().await;
    Mock::given(method("POST"))
        .and(path(LLM_STREAM_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&process.llm_server)
        .await;
    let client = edge_client();

    let resp = client
        .post(format!("{}/api/chat", process.base_url))
        .json(&json!({
            "messages": [{ "role": "user", "content": "hello" }]
        }))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = resp.text().await.expect("body");
    assert!(
        !body.contains("503"),
        "upstream detail must stay in server logs, body={body}"
    );
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn history_requires_a_session_id() {
    let process = EdgeProcess::spawn().await;
    let client = edge_client();

    let resp = client
        .get(format!("{}/api/chat/history", process.base_url))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn history_for_unknown_session_is_empty_not_an_error() {
    let process = EdgeProcess::spawn().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/chat_messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&process.data_server)
        .await;
    let client = edge_client();

    let resp = client
        .get(format!(
            "{}/api/chat/history?sessionId=sess-unknown",
            process.base_url
        ))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["messages"], json!([]));
}

#[serial_test::serial]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn history_returns_stored_turns_in_order() {
    let process = EdgeProcess::spawn().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/chat_messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "role": "user", "content": "hi", "created_at": "2026-08-01T10:00:00Z" },
            { "role": "assistant", "content": "hello", "created_at": "2026-08-01T10:00:02Z" }
        ])))
        .mount(&process.data_server)
        .await;
    let client = edge_client();

    let resp = client
        .get(format!(
            "{}/api/chat/history?sessionId=sess-1",
            process.base_url
        ))
        .send()
        .await
        .expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("json body");
    let messages = body["messages"].as_array().expect("messages array");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "hi");
    assert_eq!(messages[1]["role"], "assistant");
}
