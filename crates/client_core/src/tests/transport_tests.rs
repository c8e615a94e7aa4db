use super::*;
use axum::{
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
}

async fn spawn_api_server() -> (String, Captured) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let captured = Captured::default();

    let app = Router::new()
        .route(
            "/incidents",
            get(|| async {
                Json(json!([
                    { "id": 1, "title": "t", "description": "d", "status": "open" }
                ]))
            })
            .post({
                let captured = captured.clone();
                move |Json(body): Json<Value>| async move {
                    captured.bodies.lock().await.push(body.clone());
                    (StatusCode::CREATED, Json(body))
                }
            }),
        )
        .route(
            "/incidents/:id",
            put(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "code": "not_found", "message": "Incident not found" })),
                )
            }),
        )
        .route("/garbage", get(|| async { "<html>not json</html>" }));

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), captured)
}

#[tokio::test]
async fn get_returns_parsed_json() {
    let (base_url, _captured) = spawn_api_server().await;
    let transport = HttpTransport::new(&base_url).expect("transport");

    let value = transport
        .request(Method::Get, "/incidents", None)
        .await
        .expect("list");
    assert_eq!(value[0]["title"], "t");
}

#[tokio::test]
async fn post_sends_json_body() {
    let (base_url, captured) = spawn_api_server().await;
    let transport = HttpTransport::new(&base_url).expect("transport");
    let body = json!({ "title": "Server down", "description": "prod outage", "status": "open" });

    let echoed = transport
        .request(Method::Post, "/incidents", Some(body.clone()))
        .await
        .expect("create");

    assert_eq!(echoed, body);
    assert_eq!(*captured.bodies.lock().await, vec![body]);
}

#[tokio::test]
async fn non_success_status_names_the_operation() {
    let (base_url, _captured) = spawn_api_server().await;
    let transport = HttpTransport::new(&format!("{base_url}/")).expect("transport");

    let err = transport
        .request(Method::Put, "/incidents/9", Some(json!({ "status": "closed" })))
        .await
        .expect_err("must fail");
    match &err {
        TransportError::Status { operation, status } => {
            assert_eq!(operation, "PUT /incidents/9");
            assert_eq!(*status, 404);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unparsable_body_is_malformed() {
    let (base_url, _captured) = spawn_api_server().await;
    let transport = HttpTransport::new(&base_url).expect("transport");

    let err = transport
        .request(Method::Get, "/garbage", None)
        .await
        .expect_err("must fail");
    assert!(matches!(err, TransportError::Malformed { .. }));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let transport = HttpTransport::new(&format!("http://{addr}")).expect("transport");
    let err = transport
        .request(Method::Get, "/incidents", None)
        .await
        .expect_err("must fail");
    assert!(matches!(err, TransportError::Network { .. }));
    assert_eq!(err.operation(), "GET /incidents");
}

#[test]
fn endpoint_keeps_base_path_prefix() {
    let transport = HttpTransport::new("http://localhost:5000/api/").expect("transport");
    assert_eq!(
        transport.endpoint("/incidents/3").expect("url").as_str(),
        "http://localhost:5000/api/incidents/3"
    );
}

#[test]
fn rejects_invalid_base_url() {
    assert!(HttpTransport::new("not a url").is_err());
}
