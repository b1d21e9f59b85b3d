mod common;

use serde_json::json;
use wayfinder_common::LatLng;
use wayfinder_planner::{BackendResponse, PlannerBackend, TripRequest, WebhookClient};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> TripRequest {
    TripRequest::new("museum then dinner", LatLng::new(12.97, 77.59))
}

async fn client_for(server: &MockServer) -> WebhookClient {
    WebhookClient::new(&format!("{}/webhook/plan-trip", server.uri())).expect("client")
}

#[tokio::test]
async fn posts_trip_request_and_decodes_json() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let payload = json!({ "itinerary": [{ "step": 1, "place": "Museum" }], "time_of_day": "Evening" });
    Mock::given(method("POST"))
        .and(path("/webhook/plan-trip"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "user_prompt": "museum then dinner",
            "user_location": { "lat": 12.97, "lng": 77.59 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(payload.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let got = client_for(&server).await.plan(&request()).await;
    assert_eq!(got, BackendResponse::Direct(payload));
}

#[tokio::test]
async fn empty_body_is_an_empty_object() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let got = client_for(&server).await.plan(&request()).await;
    assert_eq!(got, BackendResponse::Direct(json!({})));
}

#[tokio::test]
async fn non_json_body_comes_back_as_raw_text() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/json")
                .set_body_string("Workflow was started"),
        )
        .mount(&server)
        .await;

    match client_for(&server).await.plan(&request()).await {
        BackendResponse::RawText { raw, parse_error } => {
            assert_eq!(raw, "Workflow was started");
            assert!(!parse_error.is_empty());
        }
        other => panic!("expected raw text, got {other:?}"),
    }
}

#[tokio::test]
async fn error_status_bodies_are_decoded_like_any_other() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "code": 404,
            "message": "webhook not registered"
        })))
        .mount(&server)
        .await;

    let got = client_for(&server).await.plan(&request()).await;
    assert!(matches!(got, BackendResponse::Direct(ref v) if v["code"] == 404));
}

#[tokio::test]
async fn workflow_envelope_is_unwrapped() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let body = json!({ "locations": [{ "lat": 1.0, "lng": 2.0 }] });
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "response": { "body": body.clone() } }])),
        )
        .mount(&server)
        .await;

    let got = client_for(&server).await.plan(&request()).await;
    assert_eq!(got, BackendResponse::Wrapped(body));
}

#[tokio::test]
async fn error_field_in_body_is_an_error() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "model overloaded" })))
        .mount(&server)
        .await;

    let got = client_for(&server).await.plan(&request()).await;
    assert_eq!(got, BackendResponse::Error("model overloaded".into()));
}

#[tokio::test]
async fn refused_connection_is_an_error_value() {
    common::init_test_tracing();
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = WebhookClient::new(&format!("http://{addr}/plan")).unwrap();
    match client.plan(&request()).await {
        BackendResponse::Error(message) => assert!(!message.is_empty()),
        other => panic!("expected transport error, got {other:?}"),
    }
}
